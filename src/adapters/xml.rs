//! `correioslog` document submitted when a posting list is closed.

use crate::domain::model::format_decimal;
use crate::domain::posting_list::PostingList;
use crate::domain::shipping_label::ShippingLabel;
use crate::utils::error::{CorreiosError, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::Decimal;

pub const FILE_TYPE: &str = "Postagem";
pub const FILE_VERSION: &str = "2.3";

/// Splits text so that no section contains the `]]>` terminator.
fn cdata_sections(value: &str) -> Vec<String> {
    let parts: Vec<&str> = value.split("]]>").collect();
    let last = parts.len() - 1;
    parts
        .iter()
        .enumerate()
        .map(|(index, part)| {
            let mut section = String::new();
            if index > 0 {
                section.push('>');
            }
            section.push_str(part);
            if index < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

/// Event writer shared by the SOAP envelopes and the posting list document.
/// Empty values are written as self-closing elements.
pub(crate) struct XmlDocument {
    writer: Writer<Vec<u8>>,
}

impl XmlDocument {
    pub(crate) fn new(encoding: &str) -> Result<Self> {
        let mut document = Self {
            writer: Writer::new(Vec::new()),
        };
        document.write(Event::Decl(BytesDecl::new("1.0", Some(encoding), None)))?;
        Ok(document)
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(CorreiosError::xml_write)
    }

    pub(crate) fn open(&mut self, tag: &str) -> Result<()> {
        self.write(Event::Start(BytesStart::new(tag)))
    }

    pub(crate) fn open_with(&mut self, tag: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let start = BytesStart::new(tag).with_attributes(attributes.iter().copied());
        self.write(Event::Start(start))
    }

    pub(crate) fn empty(&mut self, tag: &str) -> Result<()> {
        self.write(Event::Empty(BytesStart::new(tag)))
    }

    pub(crate) fn close(&mut self, tag: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(tag)))
    }

    pub(crate) fn text(&mut self, tag: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return self.empty(tag);
        }
        self.open(tag)?;
        self.write(Event::Text(BytesText::new(value)))?;
        self.close(tag)
    }

    pub(crate) fn cdata(&mut self, tag: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return self.empty(tag);
        }
        self.open(tag)?;
        for section in cdata_sections(value) {
            self.write(Event::CData(BytesCData::new(section)))?;
        }
        self.close(tag)
    }

    pub(crate) fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(CorreiosError::xml_write)
    }
}

/// Serializes open posting lists; closed lists are refused.
#[derive(Debug, Default)]
pub struct PostingListSerializer;

impl PostingListSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn serialize(&self, posting_list: &PostingList) -> Result<String> {
        if posting_list.closed() {
            return Err(CorreiosError::posting_list(format!(
                "posting list {} is already closed",
                posting_list.custom_id
            )));
        }

        let (card, sender) = match (posting_list.posting_card(), posting_list.sender()) {
            (Some(card), Some(sender)) => (card, sender),
            _ => {
                return Err(CorreiosError::posting_list(format!(
                    "posting list {} has no shipping labels",
                    posting_list.custom_id
                )))
            }
        };

        let mut doc = XmlDocument::new("ISO-8859-1")?;
        doc.open("correioslog")?;
        doc.text("tipo_arquivo", FILE_TYPE)?;
        doc.text("versao_arquivo", FILE_VERSION)?;

        doc.open("plp")?;
        doc.text("id_plp", "")?;
        doc.text("valor_global", "")?;
        doc.text("mcu_unidade_postagem", "")?;
        doc.text("nome_unidade_postagem", "")?;
        doc.text("cartao_postagem", &card.number)?;
        doc.close("plp")?;

        doc.open("remetente")?;
        doc.text("numero_contrato", &card.contract.number)?;
        doc.text("numero_diretoria", &card.contract.regional_direction_code())?;
        doc.text("codigo_administrativo", &card.administrative_code)?;
        doc.cdata("nome_remetente", &sender.name)?;
        doc.cdata("logradouro_remetente", &sender.street)?;
        doc.cdata("numero_remetente", &sender.number)?;
        doc.cdata("complemento_remetente", &sender.complement)?;
        doc.cdata("bairro_remetente", &sender.neighborhood)?;
        doc.cdata("cep_remetente", sender.zip_code.code())?;
        doc.cdata("cidade_remetente", &sender.city)?;
        doc.text("uf_remetente", &sender.state)?;
        doc.cdata("telefone_remetente", sender.phone.short())?;
        doc.cdata("fax_remetente", "")?;
        doc.cdata("email_remetente", &sender.email)?;
        doc.cdata("celular_remetente", sender.cellphone.short())?;
        doc.text("ciencia_conteudo_proibido", "S")?;
        doc.close("remetente")?;

        doc.text("forma_pagamento", "")?;

        for label in posting_list.shipping_labels() {
            Self::write_postal_object(&mut doc, label)?;
        }

        doc.close("correioslog")?;
        doc.finish()
    }

    fn write_postal_object(doc: &mut XmlDocument, label: &ShippingLabel) -> Result<()> {
        let package = &label.package;
        let receiver = &label.receiver;

        doc.open("objeto_postal")?;
        doc.text("numero_etiqueta", &label.tracking_code.code())?;
        doc.text("sscc", "")?;
        doc.text("codigo_objeto_cliente", "")?;
        doc.text("codigo_servico_postagem", &label.service.code_display())?;
        doc.text("cubagem", &format_decimal(Decimal::ZERO))?;
        doc.text("peso", &format!("{}", package.posting_weight().ceil() as u64))?;
        doc.text("rt1", "")?;
        doc.cdata("rt2", &label.text)?;
        doc.text("restricao_anac", "S")?;

        doc.open("destinatario")?;
        doc.cdata("nome_destinatario", &receiver.name)?;
        doc.cdata("telefone_destinatario", receiver.phone.short())?;
        doc.cdata("celular_destinatario", receiver.cellphone.short())?;
        doc.cdata("email_destinatario", &receiver.email)?;
        doc.cdata("logradouro_destinatario", &receiver.street)?;
        doc.cdata("complemento_destinatario", &receiver.complement)?;
        doc.cdata("numero_end_destinatario", &receiver.number)?;
        doc.text("cpf_cnpj_destinatario", "")?;
        doc.close("destinatario")?;

        doc.open("nacional")?;
        doc.cdata("bairro_destinatario", &receiver.neighborhood)?;
        doc.cdata("cidade_destinatario", &receiver.city)?;
        doc.text("uf_destinatario", &receiver.state)?;
        doc.cdata("cep_destinatario", receiver.zip_code.code())?;
        doc.text("codigo_usuario_postal", "")?;
        doc.text("centro_custo_cliente", "")?;
        doc.text("numero_nota_fiscal", &label.invoice_number)?;
        doc.text("serie_nota_fiscal", &label.invoice_series)?;
        doc.text("valor_nota_fiscal", "")?;
        doc.text("natureza_nota_fiscal", &label.invoice_type)?;
        doc.cdata("descricao_objeto", &label.order)?;
        doc.text("valor_a_cobrar", &format_decimal(label.billing))?;
        doc.close("nacional")?;

        doc.open("servico_adicional")?;
        for extra_service in label.extra_services() {
            doc.text(
                "codigo_servico_adicional",
                &format!("{:03}", extra_service.number),
            )?;
        }
        if label.has_declared_value() {
            doc.text("valor_declarado", &format_decimal(label.value()))?;
        }
        doc.close("servico_adicional")?;

        doc.open("dimensao_objeto")?;
        doc.text(
            "tipo_objeto",
            &format!("{:03}", package.package_type().posting_code()),
        )?;
        doc.text("dimensao_altura", &package.height().to_string())?;
        doc.text("dimensao_largura", &package.width().to_string())?;
        doc.text("dimensao_comprimento", &package.length().to_string())?;
        doc.text("dimensao_diametro", &package.diameter().to_string())?;
        doc.close("dimensao_objeto")?;

        doc.text("data_postagem_sara", "")?;
        doc.text("status_processamento", "0")?;
        doc.text("numero_comprovante_postagem", "")?;
        doc.text("valor_cobrado", "")?;
        doc.close("objeto_postal")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_cdata_elements() {
        let mut doc = XmlDocument::new("UTF-8").unwrap();
        doc.open("objeto").unwrap();
        doc.text("nome", "A & B <c>").unwrap();
        doc.text("vazio", "").unwrap();
        doc.cdata("texto", "x]]>y").unwrap();
        doc.close("objeto").unwrap();

        assert_eq!(
            doc.finish().unwrap(),
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                "<objeto><nome>A &amp; B &lt;c&gt;</nome><vazio/>",
                "<texto><![CDATA[x]]]]><![CDATA[>y]]></texto></objeto>"
            )
        );
    }

    #[test]
    fn test_empty_list_is_refused() {
        let list = PostingList::new(1);
        assert!(matches!(
            PostingListSerializer::new().serialize(&list),
            Err(CorreiosError::PostingList { .. })
        ));
    }
}
