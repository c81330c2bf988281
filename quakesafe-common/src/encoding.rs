//! Categorical encoding of building descriptions
//!
//! The structural classifier was trained on small ordinal risk buckets, not on
//! the free-text city and material names users type. This module maps those
//! names onto the buckets and assembles the fixed-order feature vector.
//!
//! **Matching rule:** the user's input must be a substring of a canonical
//! label (so "花蓮" matches "花蓮縣"). Tiers are scanned highest risk first
//! and the first hit wins. Unmatched input falls back to the axis default.
//!
//! Bucket values and scan order are part of the trained model's contract and
//! must not change without retraining.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Form field names accepted by the submit endpoint
pub mod fields {
    pub const CITY: &str = "City";
    pub const FAULT: &str = "Fault";
    pub const SOIL_LIQUEFACTION: &str = "Soil_Liquefaction";
    pub const LAND_SUBSIDENCE: &str = "Land_Subsidence";
    pub const MATERIAL: &str = "Material";
    pub const FLOOR: &str = "Floor";
}

/// One risk bucket and the canonical labels that map onto it
#[derive(Debug, Clone, Copy)]
pub struct RiskTier {
    /// Ordinal value fed to the classifier
    pub bucket: u8,
    /// Canonical full names for this bucket
    pub labels: &'static [&'static str],
}

impl RiskTier {
    /// True if `input` is contained in any canonical label of this tier
    pub fn matches(&self, input: &str) -> bool {
        self.labels.iter().any(|label| label.contains(input))
    }
}

/// An ordered set of tiers plus the fallback bucket
#[derive(Debug, Clone, Copy)]
pub struct RiskAxis {
    /// Axis name, used for logging only
    pub name: &'static str,
    /// Tiers in scan order (highest risk first)
    pub tiers: &'static [RiskTier],
    /// Bucket returned when no tier matches
    pub default_bucket: u8,
}

impl RiskAxis {
    /// Map free text onto this axis
    ///
    /// Empty input always returns the default bucket.
    pub fn classify(&self, input: &str) -> u8 {
        if input.is_empty() {
            return self.default_bucket;
        }

        match self.tiers.iter().find(|tier| tier.matches(input)) {
            Some(tier) => tier.bucket,
            None => {
                tracing::debug!(axis = self.name, input, "No tier matched, using default");
                self.default_bucket
            }
        }
    }
}

/// City axis: 5 is the most seismically exposed
pub const CITY_AXIS: RiskAxis = RiskAxis {
    name: "city",
    tiers: &[
        RiskTier {
            bucket: 5,
            labels: &["花蓮縣"],
        },
        RiskTier {
            bucket: 4,
            labels: &["台東縣", "臺東縣"],
        },
        RiskTier {
            bucket: 3,
            labels: &["台中市", "台南市", "南投縣", "臺中市", "臺南市"],
        },
        RiskTier {
            bucket: 2,
            labels: &["台北市", "桃園市", "新竹市", "新竹縣", "彰化縣", "臺北市"],
        },
        RiskTier {
            bucket: 1,
            labels: &[
                "新北市", "高雄市", "基隆市", "嘉義市", "苗栗縣", "雲林縣", "嘉義縣", "屏東縣",
                "宜蘭縣",
            ],
        },
    ],
    default_bucket: 2,
};

/// Construction material axis: 0 is the weakest material
pub const MATERIAL_AXIS: RiskAxis = RiskAxis {
    name: "material",
    tiers: &[
        RiskTier {
            bucket: 0,
            labels: &["沙拉油桶、報紙、紙袋混充", "豆腐渣"],
        },
        RiskTier {
            bucket: 1,
            labels: &["鐵皮", "無筋磚砌體（無地基）", "土"],
        },
        RiskTier {
            bucket: 2,
            labels: &["洗石", "檜木", "木材", "石塊", "磚木"],
        },
        RiskTier {
            bucket: 3,
            labels: &["紅磚", "磚瓦", "磚", "大理石"],
        },
        RiskTier {
            bucket: 4,
            labels: &["鋼筋混凝土", "混泥土", "水泥", "鋼筋混凝土+鐵皮", "鋼筋混土"],
        },
    ],
    default_bucket: 3,
};

/// Risk bucket for a city name, in `1..=5`
pub fn city_risk(city: &str) -> u8 {
    CITY_AXIS.classify(city)
}

/// Risk bucket for a construction material, in `0..=4`
pub fn material_risk(material: &str) -> u8 {
    MATERIAL_AXIS.classify(material)
}

/// Building description as submitted by the user, after type conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingForm {
    pub city: String,
    pub fault: u8,
    pub soil_liquefaction: u8,
    pub land_subsidence: u8,
    pub material: String,
    pub floor: f64,
}

impl BuildingForm {
    /// Parse the six required fields from raw form values
    ///
    /// Flags must be integers 0 or 1; the floor count must be a finite number.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self> {
        let city = required(form, fields::CITY)?.to_string();
        let material = required(form, fields::MATERIAL)?.to_string();

        Ok(Self {
            city,
            fault: parse_flag(form, fields::FAULT)?,
            soil_liquefaction: parse_flag(form, fields::SOIL_LIQUEFACTION)?,
            land_subsidence: parse_flag(form, fields::LAND_SUBSIDENCE)?,
            material,
            floor: parse_floor(form)?,
        })
    }

    /// Encode into the classifier's feature vector
    pub fn encode(&self) -> BuildingFeatureVector {
        let vector = BuildingFeatureVector {
            city_risk: city_risk(&self.city),
            fault_zone: self.fault,
            soil_liquefaction: self.soil_liquefaction,
            land_subsidence: self.land_subsidence,
            material_risk: material_risk(&self.material),
            floors: self.floor,
        };

        tracing::debug!(
            city = %self.city,
            material = %self.material,
            row = ?vector.as_row(),
            "Encoded building form"
        );

        vector
    }
}

fn required<'a>(form: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    form.get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::InvalidInput(format!("Missing form field: {}", name)))
}

fn parse_flag(form: &HashMap<String, String>, name: &str) -> Result<u8> {
    let raw = required(form, name)?;
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("{} must be an integer, got {:?}", name, raw)))?;

    match value {
        0 | 1 => Ok(value as u8),
        _ => Err(Error::InvalidInput(format!(
            "{} must be 0 or 1, got {}",
            name, value
        ))),
    }
}

fn parse_floor(form: &HashMap<String, String>) -> Result<f64> {
    let raw = required(form, fields::FLOOR)?;
    let floor: f64 = raw.trim().parse().map_err(|_| {
        Error::InvalidInput(format!("{} must be a number, got {:?}", fields::FLOOR, raw))
    })?;

    if !floor.is_finite() {
        return Err(Error::InvalidInput(format!(
            "{} must be a finite number",
            fields::FLOOR
        )));
    }
    Ok(floor)
}

/// Fixed-order input of the structural classifier
///
/// Field order matches the training schema:
/// `(city_risk, fault_zone, soil_liquefaction, land_subsidence, material_risk, floors)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingFeatureVector {
    pub city_risk: u8,
    pub fault_zone: u8,
    pub soil_liquefaction: u8,
    pub land_subsidence: u8,
    pub material_risk: u8,
    pub floors: f64,
}

impl BuildingFeatureVector {
    /// Number of features the classifier expects
    pub const LEN: usize = 6;

    /// Numeric row in training order
    pub fn as_row(&self) -> [f64; Self::LEN] {
        [
            f64::from(self.city_risk),
            f64::from(self.fault_zone),
            f64::from(self.soil_liquefaction),
            f64::from(self.land_subsidence),
            f64::from(self.material_risk),
            self.floors,
        ]
    }
}
