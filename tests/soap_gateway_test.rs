use correios::domain::address::ZipCode;
use correios::domain::model::FreightRequest;
use correios::domain::package::Dimensions;
use correios::domain::services::{Service, SERVICE_PAC, SERVICE_SEDEX};
use correios::{ClientConfig, Correios, CorreiosError, Package, PackageType, SoapGateway, TrackingCode};
use httpmock::prelude::*;
use rust_decimal::Decimal;

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::from_toml_str(&format!(
        r#"
[client]
username = "sigep"
password = "n5f9t8"
sigep_url = "{}"
tracking_url = "{}"
freight_url = "{}"
timeout_seconds = 5
"#,
        server.url("/sigep"),
        server.url("/rastro"),
        server.url("/frete")
    ))
    .unwrap()
}

fn client_for(server: &MockServer) -> Correios<SoapGateway> {
    Correios::new(SoapGateway::new(&config_for(server)).unwrap())
}

fn soap_response(body: &str) -> String {
    format!(
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{}</soap:Body></soap:Envelope>"#,
        body
    )
}

#[tokio::test]
async fn test_get_user() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/sigep")
            .body_contains("<ns:buscaCliente>")
            .body_contains("<idContrato>9912208555</idContrato>")
            .body_contains("<usuario>sigep</usuario>");
        then.status(200)
            .header("Content-Type", "text/xml")
            .body(soap_response(
                r#"<ns2:buscaClienteResponse xmlns:ns2="http://cliente.bean.master.sigep.bsb.correios.com.br/"><return>
                <cnpj>34028316000103</cnpj>
                <contratos>
                  <cartoesPostagem>
                    <codigoAdministrativo>08082650</codigoAdministrativo>
                    <numero>0057018901</numero>
                  </cartoesPostagem>
                  <codigoCliente>279311</codigoCliente>
                  <codigoDiretoria>10</codigoDiretoria>
                  <contratoPK><numero>9912208555</numero></contratoPK>
                  <descricaoDiretoriaRegional>DR - PARANÁ</descricaoDiretoriaRegional>
                </contratos>
                <nome>OLIST LTDA</nome>
                <statusCodigo>1</statusCodigo>
                </return></ns2:buscaClienteResponse>"#,
            ));
    });

    let user = client_for(&server)
        .get_user("9912208555", "0057018901")
        .await
        .unwrap();

    mock.assert();
    assert_eq!(user.name, "OLIST LTDA");
    assert_eq!(user.contracts.len(), 1);
    assert_eq!(user.contracts[0].regional_direction_name, "DR - PARANÁ");
    assert!(user.find_posting_card("0057018901").is_some());
}

#[tokio::test]
async fn test_request_tracking_codes() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/sigep")
            .body_contains("<ns:solicitaEtiquetas>")
            .body_contains("<idServico>124849</idServico>")
            .body_contains("<qtdEtiquetas>2</qtdEtiquetas>");
        then.status(200).body(soap_response(
            "<ns2:solicitaEtiquetasResponse><return>DL74668653 BR,DL74668654 BR</return></ns2:solicitaEtiquetasResponse>",
        ));
    });

    let client = client_for(&server);
    let user = correios::domain::posting_card::User {
        name: "OLIST LTDA".to_string(),
        federal_tax_number: correios::domain::tax_number::TaxNumber::new(
            correios::domain::tax_number::TaxNumberKind::Federal,
            "34028316000103",
        )
        .unwrap(),
        state_tax_number: None,
        status_number: 1,
        contracts: Vec::new(),
        posting_cards: Vec::new(),
    };
    let codes = client
        .request_tracking_codes(&user, Service::get(SERVICE_SEDEX).unwrap(), 2)
        .await
        .unwrap();

    mock.assert();
    let codes: Vec<String> = codes.iter().map(TrackingCode::code).collect();
    assert_eq!(codes, vec!["DL746686536BR", "DL746686540BR"]);
}

#[tokio::test]
async fn test_tracking_events() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rastro")
            .body_contains("<ns:buscaEventosLista>")
            .body_contains("<objetos>DL746686536BR</objetos>")
            .body_contains("<lingua>101</lingua>");
        then.status(200).body(soap_response(
            r#"<ns2:buscaEventosListaResponse><return><versao>2.0</versao><qtd>1</qtd>
            <objeto><numero>DL746686536BR</numero><sigla>DL</sigla><nome>ENCOMENDA E-SEDEX</nome>
            <categoria>E-SEDEX</categoria>
            <evento><tipo>PO</tipo><status>01</status><data>16/03/2016</data><hora>09:05</hora>
              <descricao>Objeto postado</descricao><local>AGF CURITIBA</local>
              <codigo>80010970</codigo><cidade>CURITIBA</cidade><uf>PR</uf></evento>
            </objeto></return></ns2:buscaEventosListaResponse>"#,
        ));
    });

    let mut codes = vec![TrackingCode::new("DL746686536BR").unwrap()];
    client_for(&server)
        .get_tracking_code_events(&mut codes)
        .await
        .unwrap();

    mock.assert();
    assert_eq!(codes[0].name.as_deref(), Some("ENCOMENDA E-SEDEX"));
    assert_eq!(codes[0].events().len(), 1);
    assert_eq!(codes[0].events()[0].description, "Objeto postado");
    assert_eq!(
        codes[0].events()[0].timestamp.format("%Y-%m-%d %H:%M").to_string(),
        "2016-03-16 09:05"
    );
}

#[tokio::test]
async fn test_calculate_freights() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/frete")
            .body_contains("<nCdServico>04162,04669</nCdServico>")
            .body_contains("<nVlPeso>0,500</nVlPeso>")
            .body_contains("<nCdFormato>1</nCdFormato>")
            .body_contains("<nVlValorDeclarado>0,00</nVlValorDeclarado>");
        then.status(200).body(soap_response(
            r#"<CalcPrecoPrazoResponse><CalcPrecoPrazoResult><Servicos>
            <cServico><Codigo>4162</Codigo><Valor>21,80</Valor><PrazoEntrega>1</PrazoEntrega>
              <EntregaDomiciliar>S</EntregaDomiciliar><EntregaSabado>S</EntregaSabado><Erro>0</Erro><MsgErro/></cServico>
            <cServico><Codigo>4669</Codigo><Valor>16,50</Valor><PrazoEntrega>5</PrazoEntrega>
              <EntregaDomiciliar>S</EntregaDomiciliar><EntregaSabado>N</EntregaSabado><Erro>0</Erro><MsgErro/></cServico>
            </Servicos></CalcPrecoPrazoResult></CalcPrecoPrazoResponse>"#,
        ));
    });

    let package = Package::new(
        PackageType::Box,
        Dimensions::boxed(11.0, 2.0, 16.0),
        500.0,
        None,
        (1, 1),
    )
    .unwrap();
    let request = FreightRequest::new(
        vec![
            Service::get(SERVICE_SEDEX).unwrap(),
            Service::get(SERVICE_PAC).unwrap(),
        ],
        ZipCode::new("82520-080").unwrap(),
        ZipCode::new("01310-100").unwrap(),
        package,
    );

    let freights = client_for(&server).calculate_freights(&request).await.unwrap();

    mock.assert();
    assert_eq!(freights.len(), 2);
    assert_eq!(freights[0].total, Decimal::new(2180, 2));
    assert!(freights[0].saturday_delivery);
    assert_eq!(freights[1].delivery_time, 5);
    assert!(!freights[1].is_error());
}

#[tokio::test]
async fn test_soap_fault_is_reported() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/sigep");
        then.status(500).body(soap_response(
            "<soap:Fault><faultcode>soap:Server</faultcode><faultstring>Usuário não autorizado</faultstring></soap:Fault>",
        ));
    });

    let result = client_for(&server).get_user("9912208555", "0057018901").await;

    match result {
        Err(CorreiosError::SoapFault { message }) => {
            assert_eq!(message, "Usuário não autorizado")
        }
        other => panic!("expected a SOAP fault, got {:?}", other),
    }
}

#[test]
fn test_tracking_limit_never_reaches_the_server() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/rastro");
        then.status(200);
    });

    let client = client_for(&server);
    let mut codes = TrackingCode::create_range(
        &TrackingCode::create("DL", 1, "BR").unwrap(),
        &TrackingCode::create("DL", 51, "BR").unwrap(),
    )
    .unwrap();

    let result = tokio_test::block_on(client.get_tracking_code_events(&mut codes));

    assert!(matches!(
        result,
        Err(CorreiosError::TrackingCodesLimitExceeded { count: 51, .. })
    ));
    mock.assert_hits(0);
}
