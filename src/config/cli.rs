use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, Validate};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Parser)]
#[command(name = "correios")]
#[command(about = "Command line client for the Correios business APIs")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the check digit and full form of a tracking code
    Digit {
        /// Code with or without check digit, e.g. DL74668653BR
        code: String,
    },

    /// Expand a contiguous range of tracking codes
    Range { start: String, end: String },

    /// Build a posting list from a shipments CSV and write its XML document
    BuildList {
        #[arg(short, long, default_value = "correios.toml")]
        config: String,

        /// Shipments CSV file, one package per row
        #[arg(short, long)]
        shipments: String,

        #[arg(short, long, default_value = "posting-list.xml")]
        output: String,

        /// Client side posting list id
        #[arg(long, default_value_t = 1)]
        custom_id: u64,

        /// Submit the list to the postal service after writing it
        #[arg(long)]
        close: bool,

        /// Print the label summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch tracking events (at most 50 codes per call)
    Track {
        #[arg(short, long, default_value = "correios.toml")]
        config: String,

        #[arg(required = true)]
        codes: Vec<String>,
    },

    /// Quote freight prices and delivery times
    Freight {
        #[arg(short, long, default_value = "correios.toml")]
        config: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        /// Service codes or ids
        #[arg(long, value_delimiter = ',', default_value = "04162,04669")]
        services: Vec<String>,

        #[arg(long, default_value = "box")]
        package_type: String,

        #[arg(long, default_value_t = 0.0)]
        width: f64,

        #[arg(long, default_value_t = 0.0)]
        height: f64,

        #[arg(long, default_value_t = 0.0)]
        length: f64,

        #[arg(long, default_value_t = 0.0)]
        diameter: f64,

        /// Weight in grams
        #[arg(long)]
        weight: f64,

        /// Declared value
        #[arg(long)]
        value: Option<Decimal>,

        /// Extra services (numbers or mnemonics)
        #[arg(long, value_delimiter = ',')]
        extra_services: Vec<String>,
    },
}

impl Command {
    pub fn config_path(&self) -> Option<&str> {
        match self {
            Command::BuildList { config, .. }
            | Command::Track { config, .. }
            | Command::Freight { config, .. } => Some(config),
            Command::Digit { .. } | Command::Range { .. } => None,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(config) = self.command.config_path() {
            validate_file_extension("config", config, &["toml"])?;
        }
        if let Command::BuildList {
            shipments, output, ..
        } = &self.command
        {
            validate_file_extension("shipments", shipments, &["csv"])?;
            validate_file_extension("output", output, &["xml"])?;
        }
        Ok(())
    }
}
