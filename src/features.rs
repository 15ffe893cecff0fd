//! Feature alignment for inbound housing records.
//!
//! The fitted scaler and model expect a fixed 13-column layout: the 8 continuous
//! housing attributes followed by the one-hot expansion of `ocean_proximity` in
//! declared enumeration order. Every inbound record is validated against that
//! schema and mapped onto it before any transform runs.

use crate::error::{HousingError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Names of the continuous input fields, in canonical order.
pub const CONTINUOUS_FIELDS: [&str; 8] = [
    "longitude",
    "latitude",
    "housing_median_age",
    "total_rooms",
    "total_bedrooms",
    "population",
    "households",
    "median_income",
];

/// Name of the categorical input field.
pub const CATEGORICAL_FIELD: &str = "ocean_proximity";

/// Number of slots in a canonical vector.
pub const FEATURE_COUNT: usize = CONTINUOUS_FIELDS.len() + OceanProximity::ALL.len();

/// Canonical column names, matching the layout the artifacts were fitted on.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "longitude",
    "latitude",
    "housing_median_age",
    "total_rooms",
    "total_bedrooms",
    "population",
    "households",
    "median_income",
    "ocean_proximity_<1H OCEAN",
    "ocean_proximity_INLAND",
    "ocean_proximity_ISLAND",
    "ocean_proximity_NEAR BAY",
    "ocean_proximity_NEAR OCEAN",
];

/// A record aligned to the canonical column layout.
pub type CanonicalVector = [f64; FEATURE_COUNT];

/// Distance-to-ocean category of a housing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OceanProximity {
    #[serde(rename = "<1H OCEAN")]
    LessThanOneHour,
    #[serde(rename = "INLAND")]
    Inland,
    #[serde(rename = "ISLAND")]
    Island,
    #[serde(rename = "NEAR BAY")]
    NearBay,
    #[serde(rename = "NEAR OCEAN")]
    NearOcean,
}

impl OceanProximity {
    /// All members in one-hot expansion order.
    pub const ALL: [OceanProximity; 5] = [
        OceanProximity::LessThanOneHour,
        OceanProximity::Inland,
        OceanProximity::Island,
        OceanProximity::NearBay,
        OceanProximity::NearOcean,
    ];

    /// Label as it appears in inbound records.
    pub fn as_str(&self) -> &'static str {
        match self {
            OceanProximity::LessThanOneHour => "<1H OCEAN",
            OceanProximity::Inland => "INLAND",
            OceanProximity::Island => "ISLAND",
            OceanProximity::NearBay => "NEAR BAY",
            OceanProximity::NearOcean => "NEAR OCEAN",
        }
    }

    /// Position of this member within the one-hot block.
    pub fn slot(&self) -> usize {
        match self {
            OceanProximity::LessThanOneHour => 0,
            OceanProximity::Inland => 1,
            OceanProximity::Island => 2,
            OceanProximity::NearBay => 3,
            OceanProximity::NearOcean => 4,
        }
    }
}

impl fmt::Display for OceanProximity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OceanProximity {
    type Err = HousingError;

    fn from_str(s: &str) -> Result<Self> {
        OceanProximity::ALL
            .iter()
            .copied()
            .find(|member| member.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = OceanProximity::ALL.iter().map(|m| m.as_str()).collect();
                HousingError::Validation(format!(
                    "{}: '{}' is not one of {:?}",
                    CATEGORICAL_FIELD, s, allowed
                ))
            })
    }
}

/// A validated housing record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRecord {
    pub longitude: f64,
    pub latitude: f64,
    pub housing_median_age: f64,
    pub total_rooms: f64,
    pub total_bedrooms: f64,
    pub population: f64,
    pub households: f64,
    pub median_income: f64,
    pub ocean_proximity: OceanProximity,
}

impl FeatureRecord {
    /// Validate an arbitrary JSON value against the record schema.
    ///
    /// Fields not in the schema are ignored. The error message names the first
    /// offending field.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            HousingError::Validation(format!("record must be a JSON object, got {}", kind_of(value)))
        })?;

        let mut continuous = [0.0; 8];
        for (slot, field) in continuous.iter_mut().zip(CONTINUOUS_FIELDS) {
            *slot = continuous_field(object, field)?;
        }

        let ocean_proximity = match object.get(CATEGORICAL_FIELD) {
            None | Some(Value::Null) => {
                return Err(HousingError::Validation(format!(
                    "{}: field required",
                    CATEGORICAL_FIELD
                )))
            }
            Some(Value::String(label)) => label.parse()?,
            Some(other) => {
                return Err(HousingError::Validation(format!(
                    "{}: expected a string, got {}",
                    CATEGORICAL_FIELD,
                    kind_of(other)
                )))
            }
        };

        let [longitude, latitude, housing_median_age, total_rooms, total_bedrooms, population, households, median_income] =
            continuous;

        Ok(Self {
            longitude,
            latitude,
            housing_median_age,
            total_rooms,
            total_bedrooms,
            population,
            households,
            median_income,
            ocean_proximity,
        })
    }

    /// Continuous attributes in canonical order.
    pub fn continuous(&self) -> [f64; 8] {
        [
            self.longitude,
            self.latitude,
            self.housing_median_age,
            self.total_rooms,
            self.total_bedrooms,
            self.population,
            self.households,
            self.median_income,
        ]
    }
}

fn continuous_field(object: &Map<String, Value>, field: &str) -> Result<f64> {
    let value = match object.get(field) {
        None | Some(Value::Null) => {
            return Err(HousingError::Validation(format!("{}: field required", field)))
        }
        Some(value) => value,
    };

    let number = value.as_f64().ok_or_else(|| {
        HousingError::Validation(format!("{}: expected a number, got {}", field, kind_of(value)))
    })?;

    if !number.is_finite() {
        return Err(HousingError::Validation(format!("{}: must be finite", field)));
    }

    Ok(number)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Map a validated record onto the canonical column layout.
///
/// Every one-hot slot is written; members other than the record's category are 0.
pub fn align(record: &FeatureRecord) -> CanonicalVector {
    let mut vector = [0.0; FEATURE_COUNT];
    let continuous = record.continuous();
    vector[..continuous.len()].copy_from_slice(&continuous);
    vector[continuous.len() + record.ocean_proximity.slot()] = 1.0;
    vector
}

/// Validate and align a raw JSON record in one step.
pub fn align_value(value: &Value) -> Result<CanonicalVector> {
    FeatureRecord::from_json(value).map(|record| align(&record))
}
