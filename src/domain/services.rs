use crate::utils::error::{CorreiosError, Result};
use rust_decimal::Decimal;
use std::fmt;

pub const SERVICE_PAC: u32 = 4669;
pub const SERVICE_SEDEX: u32 = 4162;
pub const SERVICE_SEDEX10: u32 = 40789;
pub const SERVICE_SEDEX12: u32 = 40790;
pub const SERVICE_E_SEDEX: u32 = 81019;
pub const SERVICE_PAC_MINI: u32 = 4227;

pub const EXTRA_SERVICE_AR: u32 = 1;
pub const EXTRA_SERVICE_MP: u32 = 2;
pub const EXTRA_SERVICE_VD_SEDEX: u32 = 19;
pub const EXTRA_SERVICE_RR: u32 = 25;
pub const EXTRA_SERVICE_VD_PAC: u32 = 64;

/// A posting service offered under a contract (PAC, SEDEX, ...).
#[derive(Debug, PartialEq, Eq)]
pub struct Service {
    pub id: u32,
    pub code: u32,
    pub display_name: &'static str,
    pub description: &'static str,
    /// Grams.
    pub max_weight: Option<u32>,
    min_declared_value_cents: i64,
    max_declared_value_cents: i64,
    default_extra_services: &'static [u32],
}

static SERVICES: &[Service] = &[
    Service {
        id: 124884,
        code: SERVICE_PAC,
        display_name: "PAC",
        description: "PAC CONTRATO AGENCIA",
        max_weight: Some(30_000),
        min_declared_value_cents: 18_50,
        max_declared_value_cents: 3_000_00,
        default_extra_services: &[EXTRA_SERVICE_RR],
    },
    Service {
        id: 124849,
        code: SERVICE_SEDEX,
        display_name: "SEDEX",
        description: "SEDEX CONTRATO AGENCIA",
        max_weight: Some(30_000),
        min_declared_value_cents: 18_50,
        max_declared_value_cents: 10_000_00,
        default_extra_services: &[EXTRA_SERVICE_RR],
    },
    Service {
        id: 104707,
        code: SERVICE_SEDEX10,
        display_name: "SEDEX 10",
        description: "SEDEX 10 A FATURAR",
        max_weight: Some(10_000),
        min_declared_value_cents: 18_50,
        max_declared_value_cents: 10_000_00,
        default_extra_services: &[EXTRA_SERVICE_RR],
    },
    Service {
        id: 115218,
        code: SERVICE_SEDEX12,
        display_name: "SEDEX 12",
        description: "SEDEX 12 A FATURAR",
        max_weight: Some(10_000),
        min_declared_value_cents: 18_50,
        max_declared_value_cents: 10_000_00,
        default_extra_services: &[EXTRA_SERVICE_RR],
    },
    Service {
        id: 104672,
        code: SERVICE_E_SEDEX,
        display_name: "E-SEDEX",
        description: "E-SEDEX STANDARD",
        max_weight: Some(15_000),
        min_declared_value_cents: 18_50,
        max_declared_value_cents: 10_000_00,
        default_extra_services: &[EXTRA_SERVICE_RR],
    },
    Service {
        id: 159982,
        code: SERVICE_PAC_MINI,
        display_name: "PAC Mini",
        description: "PAC MINI CONTRATO AGENCIA",
        max_weight: Some(300),
        min_declared_value_cents: 12_00,
        max_declared_value_cents: 100_00,
        default_extra_services: &[EXTRA_SERVICE_RR],
    },
];

impl Service {
    pub fn get(code: u32) -> Result<&'static Service> {
        SERVICES
            .iter()
            .find(|s| s.code == code)
            .ok_or_else(|| CorreiosError::UnknownService(format!("{:05}", code)))
    }

    /// Accepts the zero-padded code used on the wire (`"04162"`) or the id.
    pub fn resolve(id: &str) -> Result<&'static Service> {
        let value: u32 = id
            .trim()
            .parse()
            .map_err(|_| CorreiosError::UnknownService(id.to_string()))?;
        SERVICES
            .iter()
            .find(|s| s.code == value || s.id == value)
            .ok_or_else(|| CorreiosError::UnknownService(id.to_string()))
    }

    pub fn all() -> &'static [Service] {
        SERVICES
    }

    /// Five-digit code, as sent in requests and printed on labels.
    pub fn code_display(&self) -> String {
        format!("{:05}", self.code)
    }

    pub fn min_declared_value(&self) -> Decimal {
        Decimal::new(self.min_declared_value_cents, 2)
    }

    pub fn max_declared_value(&self) -> Decimal {
        Decimal::new(self.max_declared_value_cents, 2)
    }

    pub fn default_extra_services(&self) -> Result<Vec<&'static ExtraService>> {
        self.default_extra_services
            .iter()
            .map(|&number| ExtraService::get(number))
            .collect()
    }

    pub fn validate_declared_value(&self, value: Decimal) -> Result<()> {
        let min = self.min_declared_value();
        let max = self.max_declared_value();
        if value < min || value > max {
            return Err(CorreiosError::InvalidDeclaredValue { value, min, max });
        }
        Ok(())
    }

    /// The declared-value extra service matching this service's family.
    pub fn declared_value_extra_service(&self) -> Result<&'static ExtraService> {
        match self.code {
            SERVICE_PAC | SERVICE_PAC_MINI => ExtraService::get(EXTRA_SERVICE_VD_PAC),
            _ => ExtraService::get(EXTRA_SERVICE_VD_SEDEX),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({:05})", self.display_name, self.code)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ExtraService {
    pub number: u32,
    pub code: &'static str,
    pub name: &'static str,
}

static EXTRA_SERVICES: &[ExtraService] = &[
    ExtraService { number: EXTRA_SERVICE_AR, code: "AR", name: "Aviso de Recebimento" },
    ExtraService { number: EXTRA_SERVICE_MP, code: "MP", name: "Mão Própria Nacional" },
    ExtraService { number: EXTRA_SERVICE_VD_SEDEX, code: "VD", name: "Valor Declarado (Encomendas)" },
    ExtraService { number: EXTRA_SERVICE_RR, code: "RR", name: "Registro Nacional" },
    ExtraService { number: EXTRA_SERVICE_VD_PAC, code: "VD", name: "Valor Declarado (PAC)" },
];

impl ExtraService {
    pub fn get(number: u32) -> Result<&'static ExtraService> {
        EXTRA_SERVICES
            .iter()
            .find(|es| es.number == number)
            .ok_or_else(|| CorreiosError::UnknownExtraService(number.to_string()))
    }

    /// Resolves a numeric identifier (`"25"`) or a mnemonic (`"AR"`).
    /// `"VD"` resolves to the first declared-value entry; labels swap it for
    /// their service's own (see [`Service::declared_value_extra_service`]).
    pub fn resolve(id: &str) -> Result<&'static ExtraService> {
        let id = id.trim();
        if let Ok(number) = id.parse::<u32>() {
            return Self::get(number);
        }
        EXTRA_SERVICES
            .iter()
            .find(|es| es.code.eq_ignore_ascii_case(id))
            .ok_or_else(|| CorreiosError::UnknownExtraService(id.to_string()))
    }

    pub fn is_declared_value(&self) -> bool {
        self.code == "VD"
    }
}

impl fmt::Display for ExtraService {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({:02})", self.code, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_lookup() {
        let sedex = Service::get(SERVICE_SEDEX).unwrap();
        assert_eq!(sedex.code_display(), "04162");
        assert_eq!(Service::resolve("04162").unwrap(), sedex);
        assert_eq!(Service::resolve("124849").unwrap(), sedex);
        assert!(matches!(
            Service::get(12345),
            Err(CorreiosError::UnknownService(code)) if code == "12345"
        ));
        assert!(Service::resolve("sedex").is_err());
    }

    #[test]
    fn test_declared_value_bounds() {
        let pac = Service::get(SERVICE_PAC).unwrap();
        assert!(pac.validate_declared_value(Decimal::new(18_50, 2)).is_ok());
        assert!(pac.validate_declared_value(Decimal::new(3_000_00, 2)).is_ok());
        assert!(pac.validate_declared_value(Decimal::new(18_49, 2)).is_err());
        assert!(matches!(
            pac.validate_declared_value(Decimal::new(3_000_01, 2)),
            Err(CorreiosError::InvalidDeclaredValue { .. })
        ));
    }

    #[test]
    fn test_extra_service_resolution() {
        assert_eq!(ExtraService::resolve("25").unwrap().code, "RR");
        assert_eq!(ExtraService::resolve("ar").unwrap().number, EXTRA_SERVICE_AR);
        assert!(ExtraService::resolve("VD").unwrap().is_declared_value());
        assert!(ExtraService::resolve("99").is_err());
        assert!(ExtraService::resolve("XX").is_err());
    }

    #[test]
    fn test_default_extra_services() {
        let sedex = Service::get(SERVICE_SEDEX).unwrap();
        let defaults = sedex.default_extra_services().unwrap();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].number, EXTRA_SERVICE_RR);
    }

    #[test]
    fn test_declared_value_extra_service_per_family() {
        let pac = Service::get(SERVICE_PAC).unwrap();
        let sedex = Service::get(SERVICE_SEDEX).unwrap();
        assert_eq!(pac.declared_value_extra_service().unwrap().number, EXTRA_SERVICE_VD_PAC);
        assert_eq!(sedex.declared_value_extra_service().unwrap().number, EXTRA_SERVICE_VD_SEDEX);
    }
}
