use crate::core::ConfigProvider;
use crate::domain::address::Address;
use crate::domain::package::PackageLimits;
use crate::domain::posting_card::{Contract, PostingCard};
use crate::utils::error::{CorreiosError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_required_field,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const MAX_DIMENSION_CM: f64 = 200.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Production,
    Test,
}

impl Environment {
    pub fn sigep_url(self) -> &'static str {
        match self {
            Environment::Production => {
                "https://apps.correios.com.br/SigepMasterJPA/AtendeClienteService/AtendeCliente"
            }
            Environment::Test => {
                "https://apphom.correios.com.br/SigepMasterJPA/AtendeClienteService/AtendeCliente"
            }
        }
    }

    pub fn tracking_url(self) -> &'static str {
        "https://webservice.correios.com.br/service/rastro"
    }

    pub fn freight_url(self) -> &'static str {
        "http://ws.correios.com.br/calculador/CalcPrecoPrazo.asmx"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    #[serde(default)]
    pub environment: Environment,
    pub username: String,
    pub password: String,
    pub sigep_url: Option<String>,
    pub tracking_url: Option<String>,
    pub freight_url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingCardSection {
    pub number: String,
    pub administrative_code: String,
    pub contract: Contract,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client: ClientSection,
    pub posting_card: Option<PostingCardSection>,
    pub sender: Option<Address>,
    pub package_limits: Option<PackageLimits>,
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CorreiosError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unset variables are kept as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CorreiosError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("client.username", &self.client.username)?;
        validate_non_empty_string("client.password", &self.client.password)?;
        for (field, value) in [
            ("client.username", &self.client.username),
            ("client.password", &self.client.password),
        ] {
            if value.starts_with("${") {
                return Err(CorreiosError::ConfigValidationError {
                    field: field.to_string(),
                    message: format!("environment variable {} is not set", value),
                });
            }
        }

        validate_url("client.sigep_url", self.sigep_url())?;
        validate_url("client.tracking_url", self.tracking_url())?;
        validate_url("client.freight_url", self.freight_url())?;
        if let Some(timeout) = self.client.timeout_seconds {
            validate_positive_number("client.timeout_seconds", timeout, 1)?;
        }

        if self.posting_card.is_some() {
            self.posting_card()?;
        }

        if let Some(limits) = &self.package_limits {
            // each maximum must sit between its minimum and two metres
            for (field, min, max) in [
                ("package_limits.max_width", limits.min_width, limits.max_width),
                ("package_limits.max_height", limits.min_height, limits.max_height),
                ("package_limits.max_length", limits.min_length, limits.max_length),
                ("package_limits.max_diameter", limits.min_diameter, limits.max_diameter),
                (
                    "package_limits.max_cylinder_length",
                    limits.min_cylinder_length,
                    limits.max_cylinder_length,
                ),
            ] {
                validate_range(field, max, min, MAX_DIMENSION_CM)?;
            }
            validate_range(
                "package_limits.max_size",
                limits.max_size,
                1.0,
                3.0 * MAX_DIMENSION_CM,
            )?;
        }

        Ok(())
    }

    pub fn environment(&self) -> Environment {
        self.client.environment
    }

    pub fn posting_card(&self) -> Result<PostingCard> {
        let section = validate_required_field("posting_card", &self.posting_card)?;
        let contract = &section.contract;
        let mut validated = Contract::new(
            &contract.number,
            contract.customer_code,
            contract.regional_direction,
        )?;
        validated.regional_direction_name = contract.regional_direction_name.clone();
        PostingCard::new(&section.number, &section.administrative_code, validated)
    }

    pub fn sender(&self) -> Result<&Address> {
        validate_required_field("sender", &self.sender)
    }

    pub fn package_limits(&self) -> PackageLimits {
        self.package_limits.unwrap_or_default()
    }
}

impl ConfigProvider for ClientConfig {
    fn username(&self) -> &str {
        &self.client.username
    }

    fn password(&self) -> &str {
        &self.client.password
    }

    fn sigep_url(&self) -> &str {
        self.client
            .sigep_url
            .as_deref()
            .unwrap_or_else(|| self.client.environment.sigep_url())
    }

    fn tracking_url(&self) -> &str {
        self.client
            .tracking_url
            .as_deref()
            .unwrap_or_else(|| self.client.environment.tracking_url())
    }

    fn freight_url(&self) -> &str {
        self.client
            .freight_url
            .as_deref()
            .unwrap_or_else(|| self.client.environment.freight_url())
    }

    fn timeout_seconds(&self) -> u64 {
        self.client.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_CONFIG: &str = r#"
[client]
environment = "test"
username = "sigep"
password = "n5f9t8"
timeout_seconds = 10

[posting_card]
number = "57018901"
administrative_code = "8082650"

[posting_card.contract]
number = "9912208555"
customer_code = 279311
regional_direction = 10

[sender]
name = "Olist Ltda."
street = "Rua Fernando de Noronha"
number = "123"
city = "Curitiba"
state = "PR"
zip_code = "82520-080"
phone = "41 3333-4444"

[package_limits]
max_cylinder_size = 91.0
"#;

    #[test]
    fn test_parse_full_config() {
        let config = ClientConfig::from_toml_str(FULL_CONFIG).unwrap();

        assert_eq!(config.environment(), Environment::Test);
        assert!(config.sigep_url().starts_with("https://apphom.correios.com.br"));
        assert_eq!(config.timeout_seconds(), 10);

        let card = config.posting_card().unwrap();
        assert_eq!(card.number, "0057018901");
        assert_eq!(card.administrative_code, "08082650");
        assert_eq!(card.contract.regional_direction_code(), "10");

        assert_eq!(config.sender().unwrap().zip_code.code(), "82520080");

        let limits = config.package_limits();
        assert_eq!(limits.max_cylinder_size, 91.0);
        assert_eq!(limits.max_size, PackageLimits::DEFAULT.max_size);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
[client]
username = "user"
password = "secret"
sigep_url = "http://localhost:8080/sigep"
"#,
        )
        .unwrap();

        assert_eq!(config.environment(), Environment::Production);
        assert_eq!(config.sigep_url(), "http://localhost:8080/sigep");
        assert_eq!(
            config.tracking_url(),
            "https://webservice.correios.com.br/service/rastro"
        );
        assert_eq!(config.timeout_seconds(), DEFAULT_TIMEOUT_SECONDS);
        assert_eq!(config.package_limits(), PackageLimits::DEFAULT);
        assert!(matches!(
            config.posting_card(),
            Err(CorreiosError::MissingConfigError { field }) if field == "posting_card"
        ));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("CORREIOS_TEST_PASSWORD", "from-env");

        let config = ClientConfig::from_toml_str(
            r#"
[client]
username = "user"
password = "${CORREIOS_TEST_PASSWORD}"
"#,
        )
        .unwrap();
        assert_eq!(config.password(), "from-env");

        std::env::remove_var("CORREIOS_TEST_PASSWORD");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let config = ClientConfig::from_toml_str(
            r#"
[client]
username = "${CORREIOS_UNSET_USERNAME_FOR_TEST}"
password = "secret"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(CorreiosError::ConfigValidationError { field, .. }) if field == "client.username"
        ));
    }

    #[test]
    fn test_config_validation() {
        let config = ClientConfig::from_toml_str(
            r#"
[client]
username = "user"
password = "secret"
freight_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let bad_zip = FULL_CONFIG.replace("82520-080", "8252");
        assert!(ClientConfig::from_toml_str(&bad_zip).is_err());
    }

    #[test]
    fn test_package_limits_validation() {
        let inverted = FULL_CONFIG.replace(
            "max_cylinder_size = 91.0",
            "max_cylinder_size = 91.0\nmin_width = 50.0\nmax_width = 40.0",
        );
        let config = ClientConfig::from_toml_str(&inverted).unwrap();
        assert!(matches!(
            config.validate(),
            Err(CorreiosError::InvalidConfigValueError { field, .. }) if field == "package_limits.max_width"
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(FULL_CONFIG.as_bytes()).unwrap();

        let config = ClientConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.username(), "sigep");
    }
}
