use anyhow::Context;
use clap::Parser;
use correios::adapters::shipments::read_shipments;
use correios::config::{ClientConfig, Command};
use correios::domain::address::ZipCode;
use correios::domain::model::FreightRequest;
use correios::domain::package::Dimensions;
use correios::domain::services::{ExtraService, Service};
use correios::utils::error::ErrorCategory;
use correios::utils::logger::{init_logger, LogFormat};
use correios::utils::validation::Validate;
use correios::{
    CliConfig, Correios, CorreiosError, Package, PackageType, PostingList, PostingListSerializer,
    SoapGateway, TrackingCode,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let log_format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    if let Err(e) = init_logger(log_format, cli.verbose) {
        eprintln!("⚠️ {}", e);
    }
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = cli.validate() {
        tracing::error!("❌ Invalid arguments: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    if let Err(e) = run(cli.command).await {
        let category = e.downcast_ref::<CorreiosError>().map(CorreiosError::category);
        tracing::error!("❌ {:#} (category: {:?})", e, category);
        eprintln!("❌ {:#}", e);
        if let Some(suggestion) = e
            .downcast_ref::<CorreiosError>()
            .map(CorreiosError::recovery_suggestion)
        {
            eprintln!("💡 {}", suggestion);
        }

        let exit_code = match category {
            Some(ErrorCategory::Input) => 1,
            Some(ErrorCategory::Configuration) => 2,
            Some(ErrorCategory::Transport) => 3,
            Some(ErrorCategory::Io) | None => 4,
        };
        std::process::exit(exit_code);
    }
}

fn load_config(path: &str) -> anyhow::Result<ClientConfig> {
    tracing::info!("📁 Loading configuration from: {}", path);
    let config = ClientConfig::from_file(path)
        .with_context(|| format!("failed to load config file '{}'", path))?;
    config.validate()?;
    Ok(config)
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Digit { code } => {
            let code = TrackingCode::new(&code)?;
            println!("{}  {}  digit {}", code.code(), code.splitted(), code.digit());
        }

        Command::Range { start, end } => {
            let start = TrackingCode::new(&start)?;
            let end = TrackingCode::new(&end)?;
            for code in TrackingCode::create_range(&start, &end)? {
                println!("{}", code.code());
            }
        }

        Command::BuildList {
            config,
            shipments,
            output,
            custom_id,
            close,
            json,
        } => {
            let config = load_config(&config)?;
            let posting_card = config.posting_card()?;
            let sender = config.sender()?.clone();
            let limits = config.package_limits();

            let records = read_shipments(&shipments)
                .with_context(|| format!("failed to read shipments from '{}'", shipments))?;
            let mut posting_list = PostingList::new(custom_id);
            for (row, record) in records.into_iter().enumerate() {
                let label = record
                    .into_label(&posting_card, &sender, &limits)
                    .with_context(|| format!("shipment row {}", row + 1))?;
                posting_list.add_shipping_label(label)?;
            }

            let xml = PostingListSerializer::new().serialize(&posting_list)?;
            std::fs::write(&output, xml.as_bytes())
                .with_context(|| format!("failed to write '{}'", output))?;
            tracing::info!(
                "✅ Posting list {} with {} labels written to {}",
                custom_id,
                posting_list.len(),
                output
            );

            if json {
                let labels: Vec<serde_json::Value> = posting_list
                    .shipping_labels()
                    .iter()
                    .map(|label| {
                        serde_json::json!({
                            "tracking_code": label.tracking_code.code(),
                            "service": label.service.display_name,
                            "weight": label.package.weight_display(),
                            "sequence": label.package.sequence_display(),
                            "datamatrix": label.datamatrix_payload(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&labels)?);
            } else {
                for label in posting_list.shipping_labels() {
                    println!(
                        "{}  {}  {}  {}",
                        label.tracking_code.splitted(),
                        label.service.display_name,
                        label.package.weight_display(),
                        label.package.sequence_display()
                    );
                }
            }

            if close {
                let client = Correios::new(SoapGateway::new(&config)?);
                let number = client.close_posting_list(&mut posting_list).await?;
                println!("✅ Posting list closed as {}", number);
            }
        }

        Command::Track { config, codes } => {
            let config = load_config(&config)?;
            let mut codes = codes
                .iter()
                .map(|code| TrackingCode::new(code))
                .collect::<correios::Result<Vec<_>>>()?;

            let client = Correios::new(SoapGateway::new(&config)?);
            client.get_tracking_code_events(&mut codes).await?;

            let report: Vec<serde_json::Value> = codes
                .iter()
                .map(|code| {
                    serde_json::json!({
                        "code": code.code(),
                        "category": code.category,
                        "name": code.name,
                        "events": code.events(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Command::Freight {
            config,
            from,
            to,
            services,
            package_type,
            width,
            height,
            length,
            diameter,
            weight,
            value,
            extra_services,
        } => {
            let config = load_config(&config)?;
            let services = services
                .iter()
                .map(|id| Service::resolve(id))
                .collect::<correios::Result<Vec<_>>>()?;
            let package_type: PackageType = package_type.parse()?;
            let package = Package::with_limits(
                package_type,
                Dimensions {
                    width,
                    height,
                    length,
                    diameter,
                },
                weight,
                None,
                (1, 1),
                config.package_limits(),
            )?;

            let mut request =
                FreightRequest::new(services, ZipCode::new(&from)?, ZipCode::new(&to)?, package);
            if let Some(value) = value {
                request = request.with_value(value);
            }
            for id in &extra_services {
                request = request.with_extra_service(ExtraService::resolve(id)?);
            }

            let client = Correios::new(SoapGateway::new(&config)?);
            for freight in client.calculate_freights(&request).await? {
                if freight.is_error() {
                    println!(
                        "{}  error {}: {}",
                        freight.service_code, freight.error_code, freight.error_message
                    );
                } else {
                    println!(
                        "{}  R$ {}  {} day(s)",
                        freight.service_code,
                        correios::domain::model::format_decimal(freight.total),
                        freight.delivery_time
                    );
                }
            }
        }
    }

    Ok(())
}
