use crate::adapters::xml::XmlDocument;
use crate::domain::model::{
    format_decimal, parse_decimal, ClosePostingListRequest, FreightRequest, FreightResponse,
    TrackingObject,
};
use crate::domain::ports::{ConfigProvider, PostalGateway};
use crate::domain::posting_card::{Contract, PostingCard, User};
use crate::domain::services::Service;
use crate::domain::tax_number::{TaxNumber, TaxNumberKind};
use crate::domain::tracking::TrackingEvent;
use crate::utils::error::{CorreiosError, Result};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Client;
use rust_decimal::Decimal;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SIGEP_NAMESPACE: &str = "http://cliente.bean.master.sigep.bsb.correios.com.br/";
const TRACKING_NAMESPACE: &str = "http://resource.webservice.correios.com.br/";
const FREIGHT_NAMESPACE: &str = "http://tempuri.org/";

type Fields = Vec<(&'static str, String)>;

fn envelope(namespace: &str, operation: &str, fields: &[(&str, String)]) -> Result<String> {
    let operation_tag = format!("ns:{}", operation);
    let mut doc = XmlDocument::new("UTF-8")?;
    doc.open_with(
        "soapenv:Envelope",
        &[
            ("xmlns:soapenv", SOAP_ENVELOPE_NAMESPACE),
            ("xmlns:ns", namespace),
        ],
    )?;
    doc.empty("soapenv:Header")?;
    doc.open("soapenv:Body")?;
    doc.open(&operation_tag)?;
    for (name, value) in fields {
        doc.text(name, value)?;
    }
    doc.close(&operation_tag)?;
    doc.close("soapenv:Body")?;
    doc.close("soapenv:Envelope")?;
    doc.finish()
}

fn malformed(operation: &str, error: impl Display) -> CorreiosError {
    CorreiosError::InvalidResponse {
        operation: operation.to_string(),
        message: format!("malformed XML: {}", error),
    }
}

/// Element of a parsed response. Names are local: namespace prefixes are dropped.
#[derive(Debug, Default)]
pub(crate) struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn named(start: &BytesStart<'_>) -> Self {
        Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Self::default()
        }
    }

    /// Parses a whole document under an unnamed root element.
    pub(crate) fn parse(xml: &str, operation: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack = vec![XmlElement::default()];
        loop {
            match reader.read_event().map_err(|e| malformed(operation, e))? {
                Event::Start(start) => stack.push(XmlElement::named(&start)),
                Event::Empty(start) => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlElement::named(&start));
                    }
                }
                Event::End(_) => {
                    let element = match stack.pop() {
                        Some(element) if !stack.is_empty() => element,
                        _ => return Err(malformed(operation, "unbalanced end tag")),
                    };
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| malformed(operation, e))?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    let data = data.into_inner();
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        match (stack.pop(), stack.is_empty()) {
            (Some(root), true) => Ok(root),
            _ => Err(malformed(operation, "unexpected end of document")),
        }
    }

    pub(crate) fn text(&self) -> &str {
        self.text.trim()
    }

    pub(crate) fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub(crate) fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    pub(crate) fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(XmlElement::text)
    }

    /// Child text, or an empty string when the child is absent.
    fn child_string(&self, name: &str) -> String {
        self.child_text(name).unwrap_or_default().to_string()
    }

    fn child_parsed<T: FromStr>(&self, name: &str) -> Option<T> {
        self.child_text(name)?.parse().ok()
    }

    fn required_child_text(&self, name: &str, operation: &str) -> Result<&str> {
        self.child_text(name)
            .ok_or_else(|| CorreiosError::InvalidResponse {
                operation: operation.to_string(),
                message: format!("missing <{}>", name),
            })
    }

    /// First descendant called `name`, in document order.
    pub(crate) fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|child| {
            if child.name == name {
                Some(child)
            } else {
                child.find(name)
            }
        })
    }

    /// Every outermost descendant called `name`.
    pub(crate) fn find_all(&self, name: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        for child in &self.children {
            if child.name == name {
                found.push(child);
            } else {
                child.collect(name, found);
            }
        }
    }

    fn required(&self, name: &str, operation: &str) -> Result<&XmlElement> {
        self.find(name).ok_or_else(|| CorreiosError::InvalidResponse {
            operation: operation.to_string(),
            message: format!("missing <{}>", name),
        })
    }
}

pub struct SoapGateway {
    client: Client,
    username: String,
    password: String,
    sigep_url: String,
    tracking_url: String,
    freight_url: String,
}

impl SoapGateway {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            username: config.username().to_string(),
            password: config.password().to_string(),
            sigep_url: config.sigep_url().to_string(),
            tracking_url: config.tracking_url().to_string(),
            freight_url: config.freight_url().to_string(),
        })
    }

    fn credentials(&self) -> Fields {
        vec![
            ("usuario", self.username.clone()),
            ("senha", self.password.clone()),
        ]
    }

    async fn call(
        &self,
        url: &str,
        namespace: &str,
        operation: &str,
        fields: &[(&str, String)],
    ) -> Result<XmlElement> {
        tracing::debug!("📡 SOAP {} -> {}", operation, url);

        let response = self
            .client
            .post(url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", format!("{}{}", namespace, operation))
            .body(envelope(namespace, operation, fields)?)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        tracing::debug!("📡 SOAP {} response status: {}", operation, status);

        let document = XmlElement::parse(&text, operation);
        if let Some(fault) = document
            .as_ref()
            .ok()
            .and_then(|doc| doc.find("faultstring"))
        {
            tracing::warn!("⚠️ SOAP {} fault: {}", operation, fault.text());
            return Err(CorreiosError::SoapFault {
                message: fault.text().to_string(),
            });
        }
        if !status.is_success() {
            return Err(CorreiosError::InvalidResponse {
                operation: operation.to_string(),
                message: format!("HTTP status {}", status),
            });
        }

        document
    }

    fn parse_user(doc: &XmlElement) -> Result<User> {
        let operation = "buscaCliente";
        let customer = doc.required("return", operation)?;

        let federal_tax_number = TaxNumber::new(
            TaxNumberKind::Federal,
            customer.required_child_text("cnpj", operation)?,
        )?;
        let state_tax_number = customer
            .child_text("inscricaoEstadual")
            .and_then(|raw| TaxNumber::new(TaxNumberKind::State, raw).ok());

        let mut contracts = Vec::new();
        let mut posting_cards = Vec::new();
        for block in customer.children("contratos") {
            let contract_pk = block.required("contratoPK", operation)?;
            let mut contract = Contract::new(
                contract_pk.required_child_text("numero", operation)?,
                block.child_parsed("codigoCliente").unwrap_or(0),
                block.child_parsed("codigoDiretoria").unwrap_or(0),
            )?;
            contract.regional_direction_name = block.child_string("descricaoDiretoriaRegional");

            for card in block.children("cartoesPostagem") {
                posting_cards.push(PostingCard::new(
                    card.required_child_text("numero", operation)?,
                    card.required_child_text("codigoAdministrativo", operation)?,
                    contract.clone(),
                )?);
            }
            contracts.push(contract);
        }

        Ok(User {
            name: customer.child_string("nome"),
            federal_tax_number,
            state_tax_number,
            status_number: customer.child_parsed("statusCodigo").unwrap_or(0),
            contracts,
            posting_cards,
        })
    }

    fn parse_tracking_objects(doc: &XmlElement) -> Result<Vec<TrackingObject>> {
        let mut objects = Vec::new();
        for object in doc.find_all("objeto") {
            let mut events = Vec::new();
            for event in object.children("evento") {
                let date = event.child_text("data").unwrap_or_default();
                let time = event.child_text("hora").unwrap_or_default();
                let timestamp =
                    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%d/%m/%Y %H:%M")
                        .map_err(|e| CorreiosError::InvalidResponse {
                            operation: "buscaEventosLista".to_string(),
                            message: format!("invalid event date '{} {}': {}", date, time, e),
                        })?;

                events.push(TrackingEvent {
                    timestamp,
                    event_type: event.child_string("tipo"),
                    status: event.child_parsed("status").unwrap_or(0),
                    description: event.child_string("descricao"),
                    comment: event
                        .child_text("detalhe")
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                    location: event.child_string("local"),
                    location_zip_code: event
                        .child_text("codigo")
                        .filter(|c| !c.is_empty())
                        .map(str::to_string),
                    city: event.child_string("cidade"),
                    state: event.child_string("uf"),
                });
            }

            objects.push(TrackingObject {
                code: object.child_string("numero"),
                initials: object.child_string("sigla"),
                name: object.child_string("nome"),
                category: object.child_string("categoria"),
                error: object
                    .child_text("erro")
                    .filter(|e| !e.is_empty())
                    .map(str::to_string),
                events,
            });
        }
        Ok(objects)
    }

    fn parse_freights(doc: &XmlElement) -> Result<Vec<FreightResponse>> {
        let flag = |block: &XmlElement, name: &str| {
            block
                .child_text(name)
                .map(|v| v.eq_ignore_ascii_case("S"))
                .unwrap_or(false)
        };
        let amount = |block: &XmlElement, name: &str| -> Result<Decimal> {
            match block.child_text(name) {
                Some(raw) if !raw.is_empty() => parse_decimal(raw),
                _ => Ok(Decimal::ZERO),
            }
        };

        doc.find_all("cServico")
            .into_iter()
            .map(|block| {
                Ok(FreightResponse {
                    service_code: block.child_string("Codigo"),
                    total: amount(block, "Valor")?,
                    value: amount(block, "ValorSemAdicionais")?,
                    declared_value: amount(block, "ValorValorDeclarado")?,
                    delivery_time: block.child_parsed("PrazoEntrega").unwrap_or(0),
                    home_delivery: flag(block, "EntregaDomiciliar"),
                    saturday_delivery: flag(block, "EntregaSabado"),
                    error_code: block.child_string("Erro"),
                    error_message: block.child_string("MsgErro"),
                })
            })
            .collect()
    }
}

#[async_trait]
impl PostalGateway for SoapGateway {
    async fn get_user(&self, contract_number: &str, posting_card_number: &str) -> Result<User> {
        let mut fields: Fields = vec![
            ("idContrato", contract_number.to_string()),
            ("idCartaoPostagem", posting_card_number.to_string()),
        ];
        fields.extend(self.credentials());
        let doc = self
            .call(&self.sigep_url, SIGEP_NAMESPACE, "buscaCliente", &fields)
            .await?;
        Self::parse_user(&doc)
    }

    async fn request_tracking_codes(
        &self,
        customer_tax_number: &str,
        service: &Service,
        quantity: u32,
    ) -> Result<String> {
        let mut fields: Fields = vec![
            ("tipoDestinatario", "C".to_string()),
            ("identificador", customer_tax_number.to_string()),
            ("idServico", service.id.to_string()),
            ("qtdEtiquetas", quantity.to_string()),
        ];
        fields.extend(self.credentials());
        let doc = self
            .call(&self.sigep_url, SIGEP_NAMESPACE, "solicitaEtiquetas", &fields)
            .await?;
        Ok(doc.required("return", "solicitaEtiquetas")?.text().to_string())
    }

    async fn close_posting_list(&self, request: &ClosePostingListRequest) -> Result<u64> {
        let operation = "fechaPlpVariosServicos";
        let mut fields: Fields = vec![
            ("xml", request.xml.clone()),
            ("idPlpCliente", request.custom_id.to_string()),
            ("cartaoPostagem", request.posting_card.clone()),
        ];
        fields.extend(
            request
                .tracking_codes
                .iter()
                .map(|code| ("listaEtiquetas", code.clone())),
        );
        fields.extend(self.credentials());

        let doc = self
            .call(&self.sigep_url, SIGEP_NAMESPACE, operation, &fields)
            .await?;
        let raw = doc.required("return", operation)?.text();
        raw.parse().map_err(|_| CorreiosError::InvalidResponse {
            operation: operation.to_string(),
            message: format!("invalid posting list number '{}'", raw),
        })
    }

    async fn get_tracking_events(&self, tracking_codes: &[String]) -> Result<Vec<TrackingObject>> {
        let mut fields = self.credentials();
        fields.extend([
            ("tipo", "L".to_string()),
            ("resultado", "T".to_string()),
            ("lingua", "101".to_string()),
        ]);
        fields.extend(tracking_codes.iter().map(|code| ("objetos", code.clone())));

        let doc = self
            .call(&self.tracking_url, TRACKING_NAMESPACE, "buscaEventosLista", &fields)
            .await?;
        Self::parse_tracking_objects(&doc)
    }

    async fn calculate_freights(&self, request: &FreightRequest) -> Result<Vec<FreightResponse>> {
        let package = &request.package;
        let yes_no = |flag: bool| (if flag { "S" } else { "N" }).to_string();
        let fields: Fields = vec![
            ("nCdEmpresa", String::new()),
            ("sDsSenha", String::new()),
            ("nCdServico", request.service_codes()),
            ("sCepOrigem", request.from.code().to_string()),
            ("sCepDestino", request.to.code().to_string()),
            ("nVlPeso", request.weight_kg()),
            ("nCdFormato", package.package_type().freight_code().to_string()),
            ("nVlComprimento", package.length().to_string()),
            ("nVlAltura", package.height().to_string()),
            ("nVlLargura", package.width().to_string()),
            ("nVlDiametro", package.diameter().to_string()),
            ("sCdMaoPropria", yes_no(request.own_hands())),
            ("nVlValorDeclarado", format_decimal(request.value)),
            ("sCdAvisoRecebimento", yes_no(request.receipt_notice())),
        ];

        let doc = self
            .call(&self.freight_url, FREIGHT_NAMESPACE, "CalcPrecoPrazo", &fields)
            .await?;
        Self::parse_freights(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> XmlElement {
        XmlElement::parse(xml, "test").unwrap()
    }

    #[test]
    fn test_parse_ignores_namespaces() {
        let doc = parse("<ns2:return>DL74668653 BR,DL74668663 BR</ns2:return>");
        assert_eq!(doc.find("return").unwrap().text(), "DL74668653 BR,DL74668663 BR");
        assert_eq!(parse("<a>x &amp; y</a>").find("a").unwrap().text(), "x & y");
        assert!(parse("<a>x</a>").find("b").is_none());
    }

    #[test]
    fn test_parse_decodes_character_references_and_cdata() {
        let doc = parse("<r><cidade>S&#xE3;o Paulo</cidade><uf>S&#80;</uf><obs><![CDATA[a < b]]></obs></r>");
        let root = doc.find("r").unwrap();
        assert_eq!(root.child_text("cidade"), Some("São Paulo"));
        assert_eq!(root.child_text("uf"), Some("SP"));
        assert_eq!(root.child_text("obs"), Some("a < b"));
    }

    #[test]
    fn test_self_closing_element_stays_in_its_block() {
        let doc = parse("<r><evento><detalhe/><tipo>PO</tipo></evento><detalhe>outside</detalhe></r>");
        let event = doc.find("evento").unwrap();
        assert_eq!(event.child_text("detalhe"), Some(""));
        assert_eq!(event.child_text("tipo"), Some("PO"));
        assert_eq!(doc.find("detalhe").unwrap().text(), "");
        assert_eq!(doc.find_all("detalhe").len(), 2);
    }

    #[test]
    fn test_malformed_response_is_rejected() {
        assert!(matches!(
            XmlElement::parse("<a><b>x</a>", "buscaCliente"),
            Err(CorreiosError::InvalidResponse { operation, .. }) if operation == "buscaCliente"
        ));
        assert!(XmlElement::parse("<a><b>x</b>", "buscaCliente").is_err());
    }

    #[test]
    fn test_envelope() {
        let xml = envelope(
            SIGEP_NAMESPACE,
            "buscaCliente",
            &[("idContrato", "1 & 2".to_string()), ("vazio", String::new())],
        )
        .unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope"#));
        assert!(xml.contains(
            "<ns:buscaCliente><idContrato>1 &amp; 2</idContrato><vazio/></ns:buscaCliente>"
        ));
        assert!(xml.contains(&format!(r#"xmlns:ns="{}""#, SIGEP_NAMESPACE)));
    }

    #[test]
    fn test_parse_tracking_objects() {
        let xml = r#"<return><versao>2.0</versao><qtd>1</qtd><objeto>
            <numero>DL746686536BR</numero><sigla>DL</sigla><nome>ENCOMENDA E-SEDEX</nome>
            <categoria>E-SEDEX</categoria>
            <evento><tipo>BDE</tipo><status>01</status><data>18/03/2016</data><hora>14:20</hora>
              <descricao>Objeto entregue ao destinat&#225;rio</descricao><detalhe/><local>CDD VILA MARIANA</local>
              <codigo>04101970</codigo><cidade>SAO PAULO</cidade><uf>SP</uf></evento>
            <evento><tipo>PO</tipo><status>01</status><data>16/03/2016</data><hora>09:05</hora>
              <descricao>Objeto postado</descricao><local>AGF CURITIBA</local>
              <codigo>80010970</codigo><cidade>CURITIBA</cidade><uf>PR</uf>
              <detalhe>Postado depois do horario limite</detalhe></evento>
            </objeto></return>"#;

        let objects = SoapGateway::parse_tracking_objects(&parse(xml)).unwrap();
        assert_eq!(objects.len(), 1);
        let object = &objects[0];
        assert_eq!(object.code, "DL746686536BR");
        assert_eq!(object.category, "E-SEDEX");
        assert_eq!(object.events.len(), 2);
        assert_eq!(object.events[0].event_type, "BDE");
        assert_eq!(object.events[0].status, 1);
        assert_eq!(object.events[0].description, "Objeto entregue ao destinatário");
        assert!(object.events[0].comment.is_none());
        assert_eq!(
            object.events[1].comment.as_deref(),
            Some("Postado depois do horario limite")
        );
        assert_eq!(object.events[1].city, "CURITIBA");
        assert_eq!(
            object.events[0].location_zip_code.as_deref(),
            Some("04101970")
        );
    }

    #[test]
    fn test_parse_user() {
        let xml = r#"<ns2:buscaClienteResponse><return>
            <cnpj>34028316000103</cnpj>
            <contratos>
              <cartoesPostagem>
                <codigoAdministrativo>08082650</codigoAdministrativo>
                <numero>0057018901</numero>
                <servicos><codigo>04162</codigo><id>124849</id></servicos>
              </cartoesPostagem>
              <codigoCliente>279311</codigoCliente>
              <codigoDiretoria>10</codigoDiretoria>
              <contratoPK><numero>9912208555</numero></contratoPK>
              <statusCodigo>A</statusCodigo>
            </contratos>
            <inscricaoEstadual>ISENTO</inscricaoEstadual>
            <nome>EMPRESA BRASILEIRA DE CORREIOS E TELEGRAFOS</nome>
            <statusCodigo>1</statusCodigo>
            </return></ns2:buscaClienteResponse>"#;

        let user = SoapGateway::parse_user(&parse(xml)).unwrap();
        assert_eq!(user.name, "EMPRESA BRASILEIRA DE CORREIOS E TELEGRAFOS");
        assert_eq!(user.federal_tax_number.number(), "34028316000103");
        assert!(user.state_tax_number.is_none());
        assert_eq!(user.status_number, 1);
        assert_eq!(user.contracts[0].number, "9912208555");
        assert_eq!(user.contracts[0].customer_code, 279311);
        assert_eq!(user.posting_cards[0].number, "0057018901");
        assert_eq!(user.posting_cards[0].contract.regional_direction, 10);
    }

    #[test]
    fn test_parse_freights() {
        let xml = r#"<CalcPrecoPrazoResult><Servicos>
            <cServico><Codigo>4162</Codigo><Valor>21,80</Valor><PrazoEntrega>1</PrazoEntrega>
              <ValorSemAdicionais>19,30</ValorSemAdicionais><ValorValorDeclarado>0,00</ValorValorDeclarado>
              <EntregaDomiciliar>S</EntregaDomiciliar><EntregaSabado>N</EntregaSabado>
              <Erro>0</Erro><MsgErro></MsgErro></cServico>
            <cServico><Codigo>4669</Codigo><Valor>0,00</Valor><PrazoEntrega>0</PrazoEntrega>
              <Erro>-888</Erro><MsgErro>Erro ao calcular tarifa</MsgErro></cServico>
            </Servicos></CalcPrecoPrazoResult>"#;

        let freights = SoapGateway::parse_freights(&parse(xml)).unwrap();
        assert_eq!(freights.len(), 2);
        assert_eq!(freights[0].total, Decimal::new(2180, 2));
        assert_eq!(freights[0].delivery_time, 1);
        assert!(freights[0].home_delivery);
        assert!(!freights[0].saturday_delivery);
        assert!(!freights[0].is_error());
        assert!(freights[1].is_error());
        assert_eq!(freights[1].error_message, "Erro ao calcular tarifa");
    }
}
