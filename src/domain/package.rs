//! Physical package measurements and the rules the postal service applies to them.
//!
//! Lengths are centimetres, weights are grams.

use crate::domain::services::{Service, SERVICE_PAC, SERVICE_SEDEX};
use crate::utils::error::{CorreiosError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const IATA_COEFICIENT: f64 = 6.0;
pub const VOLUMETRIC_WEIGHT_THRESHOLD: u64 = 10_000;

/// Rate applied over the part of the declared value above the service threshold.
pub fn insurance_percentual_cost() -> Decimal {
    Decimal::new(7, 3)
}

fn insurance_value_threshold(service_code: u32) -> Option<Decimal> {
    match service_code {
        SERVICE_PAC => Some(Decimal::new(50_00, 2)),
        SERVICE_SEDEX => Some(Decimal::new(75_00, 2)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    Envelope,
    Box,
    Cylinder,
}

impl PackageType {
    /// Code used by the posting (PLP) service.
    pub fn posting_code(self) -> u8 {
        match self {
            PackageType::Envelope => 1,
            PackageType::Box => 2,
            PackageType::Cylinder => 3,
        }
    }

    /// Code used by the freight calculation service.
    pub fn freight_code(self) -> u8 {
        match self {
            PackageType::Box => 1,
            PackageType::Cylinder => 2,
            PackageType::Envelope => 3,
        }
    }

    pub fn from_posting_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PackageType::Envelope),
            2 => Some(PackageType::Box),
            3 => Some(PackageType::Cylinder),
            _ => None,
        }
    }
}

impl FromStr for PackageType {
    type Err = CorreiosError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "envelope" => Ok(PackageType::Envelope),
            "box" => Ok(PackageType::Box),
            "cylinder" => Ok(PackageType::Cylinder),
            other => Err(CorreiosError::InvalidPackageDimensions {
                message: format!("unknown package type '{}'", other),
            }),
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            PackageType::Envelope => "envelope",
            PackageType::Box => "box",
            PackageType::Cylinder => "cylinder",
        };
        write!(f, "{}", name)
    }
}

/// Dimension bounds. The defaults are the values published by the postal
/// service; `max_cylinder_size` is kept as published.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageLimits {
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub min_length: f64,
    pub max_length: f64,
    pub min_diameter: f64,
    pub max_diameter: f64,
    pub min_cylinder_length: f64,
    pub max_cylinder_length: f64,
    /// Box: width + height + length.
    pub max_size: f64,
    /// Cylinder: length + 2 * diameter.
    pub max_cylinder_size: f64,
}

impl PackageLimits {
    pub const DEFAULT: PackageLimits = PackageLimits {
        min_width: 11.0,
        max_width: 105.0,
        min_height: 2.0,
        max_height: 105.0,
        min_length: 16.0,
        max_length: 105.0,
        min_diameter: 16.0,
        max_diameter: 91.0,
        min_cylinder_length: 18.0,
        max_cylinder_length: 105.0,
        max_size: 200.0,
        max_cylinder_size: 28.0,
    };

    /// Validates raw measurements without building a [`Package`].
    pub fn validate(
        &self,
        package_type: PackageType,
        dimensions: &Dimensions,
        weight: f64,
        service: Option<&Service>,
    ) -> Result<()> {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(CorreiosError::InvalidMinPackageWeight { weight });
        }
        if let Some(max) = service.and_then(|s| s.max_weight) {
            if weight > f64::from(max) {
                return Err(CorreiosError::InvalidMaxPackageWeight { weight, max });
            }
        }

        let Dimensions {
            width,
            height,
            length,
            diameter,
        } = *dimensions;

        match package_type {
            PackageType::Envelope => {
                if width != 0.0 || height != 0.0 || length != 0.0 || diameter != 0.0 {
                    return Err(CorreiosError::InvalidPackageDimensions {
                        message: "envelope packages have no dimensions".to_string(),
                    });
                }
            }
            PackageType::Box => {
                if diameter != 0.0 {
                    return Err(CorreiosError::InvalidPackageDimensions {
                        message: "box packages have no diameter".to_string(),
                    });
                }
                check_dimension("width", width, self.min_width, self.max_width)?;
                check_dimension("height", height, self.min_height, self.max_height)?;
                check_dimension("length", length, self.min_length, self.max_length)?;

                let size = width + height + length;
                if size > self.max_size {
                    return Err(CorreiosError::InvalidMaxPackageDimensions {
                        dimension: "width + height + length",
                        value: size,
                        max: self.max_size,
                    });
                }
            }
            PackageType::Cylinder => {
                if width != 0.0 || height != 0.0 {
                    return Err(CorreiosError::InvalidPackageDimensions {
                        message: "cylinder packages have no width or height".to_string(),
                    });
                }
                check_dimension(
                    "length",
                    length,
                    self.min_cylinder_length,
                    self.max_cylinder_length,
                )?;
                check_dimension("diameter", diameter, self.min_diameter, self.max_diameter)?;

                let size = length + 2.0 * diameter;
                if size > self.max_cylinder_size {
                    return Err(CorreiosError::InvalidMaxPackageDimensions {
                        dimension: "length + 2 * diameter",
                        value: size,
                        max: self.max_cylinder_size,
                    });
                }
            }
        }

        Ok(())
    }

    fn minimums(&self, package_type: PackageType) -> Dimensions {
        match package_type {
            PackageType::Envelope => Dimensions::default(),
            PackageType::Box => Dimensions {
                width: self.min_width,
                height: self.min_height,
                length: self.min_length,
                diameter: 0.0,
            },
            PackageType::Cylinder => Dimensions {
                width: 0.0,
                height: 0.0,
                length: self.min_cylinder_length,
                diameter: self.min_diameter,
            },
        }
    }
}

impl Default for PackageLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

fn check_dimension(dimension: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value < min {
        return Err(CorreiosError::InvalidMinPackageDimensions {
            dimension,
            value,
            min,
        });
    }
    if value > max {
        return Err(CorreiosError::InvalidMaxPackageDimensions {
            dimension,
            value,
            max,
        });
    }
    Ok(())
}

/// Raw measurements in centimetres; unused dimensions stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub length: f64,
    pub diameter: f64,
}

impl Dimensions {
    pub fn boxed(width: f64, height: f64, length: f64) -> Self {
        Self {
            width,
            height,
            length,
            diameter: 0.0,
        }
    }

    pub fn cylinder(length: f64, diameter: f64) -> Self {
        Self {
            length,
            diameter,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    package_type: PackageType,
    real: Dimensions,
    real_weight: f64,
    service: Option<&'static Service>,
    sequence: (u32, u32),
    limits: PackageLimits,
}

impl Package {
    pub fn new(
        package_type: PackageType,
        dimensions: Dimensions,
        weight: f64,
        service: Option<&'static Service>,
        sequence: (u32, u32),
    ) -> Result<Self> {
        Self::with_limits(
            package_type,
            dimensions,
            weight,
            service,
            sequence,
            PackageLimits::DEFAULT,
        )
    }

    pub fn with_limits(
        package_type: PackageType,
        dimensions: Dimensions,
        weight: f64,
        service: Option<&'static Service>,
        sequence: (u32, u32),
        limits: PackageLimits,
    ) -> Result<Self> {
        limits.validate(package_type, &dimensions, weight, service)?;

        let (index, total) = sequence;
        if index == 0 || index > total {
            return Err(CorreiosError::InvalidPackageSequence { index, total });
        }

        Ok(Self {
            package_type,
            real: dimensions,
            real_weight: weight,
            service,
            sequence,
            limits,
        })
    }

    /// Validates against the default limits.
    pub fn validate(
        package_type: PackageType,
        dimensions: &Dimensions,
        weight: f64,
        service: Option<&Service>,
    ) -> Result<()> {
        PackageLimits::DEFAULT.validate(package_type, dimensions, weight, service)
    }

    fn update(&mut self, dimensions: Dimensions, weight: f64) -> Result<()> {
        self.limits
            .validate(self.package_type, &dimensions, weight, self.service)?;
        self.real = dimensions;
        self.real_weight = weight;
        Ok(())
    }

    pub fn set_width(&mut self, width: f64) -> Result<()> {
        self.update(Dimensions { width, ..self.real }, self.real_weight)
    }

    pub fn set_height(&mut self, height: f64) -> Result<()> {
        self.update(Dimensions { height, ..self.real }, self.real_weight)
    }

    pub fn set_length(&mut self, length: f64) -> Result<()> {
        self.update(Dimensions { length, ..self.real }, self.real_weight)
    }

    pub fn set_diameter(&mut self, diameter: f64) -> Result<()> {
        self.update(Dimensions { diameter, ..self.real }, self.real_weight)
    }

    pub fn set_weight(&mut self, weight: f64) -> Result<()> {
        self.update(self.real, weight)
    }

    pub fn package_type(&self) -> PackageType {
        self.package_type
    }

    pub fn service(&self) -> Option<&'static Service> {
        self.service
    }

    pub fn sequence(&self) -> (u32, u32) {
        self.sequence
    }

    pub fn real_dimensions(&self) -> Dimensions {
        self.real
    }

    pub fn real_weight(&self) -> f64 {
        self.real_weight
    }

    fn rounded(real: f64, min: f64) -> u32 {
        real.ceil().max(min) as u32
    }

    pub fn width(&self) -> u32 {
        let min = self.limits.minimums(self.package_type);
        Self::rounded(self.real.width, min.width)
    }

    pub fn height(&self) -> u32 {
        let min = self.limits.minimums(self.package_type);
        Self::rounded(self.real.height, min.height)
    }

    pub fn length(&self) -> u32 {
        let min = self.limits.minimums(self.package_type);
        Self::rounded(self.real.length, min.length)
    }

    pub fn diameter(&self) -> u32 {
        let min = self.limits.minimums(self.package_type);
        Self::rounded(self.real.diameter, min.diameter)
    }

    pub fn weight(&self) -> u32 {
        self.real_weight.ceil() as u32
    }

    pub fn volumetric_weight(&self) -> u64 {
        let volume =
            u64::from(self.width()) * u64::from(self.height()) * u64::from(self.length());
        (volume as f64 / IATA_COEFICIENT).ceil() as u64
    }

    /// Weight charged by the carrier: the real weight unless the package is
    /// bulky enough for the volumetric weight to apply.
    pub fn posting_weight(&self) -> f64 {
        let volumetric_weight = self.volumetric_weight();
        if volumetric_weight <= VOLUMETRIC_WEIGHT_THRESHOLD {
            return self.real_weight;
        }
        (volumetric_weight as f64).max(self.real_weight).ceil()
    }

    pub fn weight_display(&self) -> String {
        format!("{}g", self.weight())
    }

    pub fn sequence_display(&self) -> String {
        format!("{}/{}", self.sequence.0, self.sequence.1)
    }

    /// Insurance cost for `quantity` items of `per_unit_value` each.
    pub fn calculate_insurance(
        per_unit_value: Decimal,
        quantity: u32,
        service: Option<&Service>,
    ) -> Decimal {
        let threshold = service
            .and_then(|s| insurance_value_threshold(s.code))
            .unwrap_or(per_unit_value);

        let value = if per_unit_value > threshold {
            (per_unit_value - threshold) * insurance_percentual_cost()
        } else {
            Decimal::ZERO
        };

        (value * Decimal::from(quantity))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}
