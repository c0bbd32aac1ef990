//! Encoding of raw form values into the feature row the classifier expects.
//!
//! Categorical answers are binary-encoded, numeric answers pass through
//! unchanged. The order of [`FeatureRow::to_vec`] is [`FEATURE_NAMES`].

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ChdError, Result};
use crate::records::{FEATURE_COUNT, FEATURE_NAMES};

pub const SEX_CHOICES: &[&str] = &["Male", "Female"];
pub const SMOKING_CHOICES: &[&str] = &["Smoker", "Non-Smoker"];
pub const DIABETES_CHOICES: &[&str] = &["Yes", "No"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmokingStatus {
    Smoker,
    NonSmoker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diabetes {
    Yes,
    No,
}

impl Sex {
    pub fn code(self) -> u8 {
        match self {
            Sex::Male => 1,
            Sex::Female => 0,
        }
    }
}

impl SmokingStatus {
    pub fn code(self) -> u8 {
        match self {
            SmokingStatus::Smoker => 1,
            SmokingStatus::NonSmoker => 0,
        }
    }
}

impl Diabetes {
    pub fn code(self) -> u8 {
        match self {
            Diabetes::Yes => 1,
            Diabetes::No => 0,
        }
    }
}

impl FromStr for Sex {
    type Err = ChdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Male" => Ok(Sex::Male),
            "Female" => Ok(Sex::Female),
            _ => Err(invalid_category("sex", s, SEX_CHOICES)),
        }
    }
}

impl FromStr for SmokingStatus {
    type Err = ChdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Smoker" => Ok(SmokingStatus::Smoker),
            "Non-Smoker" => Ok(SmokingStatus::NonSmoker),
            _ => Err(invalid_category("is_smoking", s, SMOKING_CHOICES)),
        }
    }
}

impl FromStr for Diabetes {
    type Err = ChdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Yes" => Ok(Diabetes::Yes),
            "No" => Ok(Diabetes::No),
            _ => Err(invalid_category("diabetes", s, DIABETES_CHOICES)),
        }
    }
}

fn invalid_category(
    field: &'static str,
    value: &str,
    expected: &'static [&'static str],
) -> ChdError {
    ChdError::InvalidCategory {
        field,
        value: value.to_string(),
        expected,
    }
}

/// One patient's inputs in the trained column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub age: u32,
    pub sex: u8,
    pub is_smoking: u8,
    pub diabetes: u8,
    #[serde(rename = "totChol")]
    pub tot_chol: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "heartRate")]
    pub heart_rate: f64,
}

impl FeatureRow {
    pub fn to_vec(&self) -> Vec<f64> {
        let values: [f64; FEATURE_COUNT] = [
            f64::from(self.age),
            f64::from(self.sex),
            f64::from(self.is_smoking),
            f64::from(self.diabetes),
            self.tot_chol,
            self.bmi,
            self.heart_rate,
        ];
        values.to_vec()
    }

    pub fn feature_names() -> &'static [&'static str] {
        &FEATURE_NAMES
    }
}

impl fmt::Display for FeatureRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {}, {}, {})",
            self.age,
            self.sex,
            self.is_smoking,
            self.diabetes,
            self.tot_chol,
            self.bmi,
            self.heart_rate
        )
    }
}

/// Encode form values. Unrecognised categorical strings fall through to 0.
pub fn encode(
    age: u32,
    sex: &str,
    is_smoking: &str,
    diabetes: &str,
    tot_chol: f64,
    bmi: f64,
    heart_rate: f64,
) -> FeatureRow {
    FeatureRow {
        age,
        sex: lenient_code(sex.parse::<Sex>().map(Sex::code)),
        is_smoking: lenient_code(is_smoking.parse::<SmokingStatus>().map(SmokingStatus::code)),
        diabetes: lenient_code(diabetes.parse::<Diabetes>().map(Diabetes::code)),
        tot_chol,
        bmi,
        heart_rate,
    }
}

fn lenient_code(parsed: Result<u8>) -> u8 {
    parsed.unwrap_or_else(|e| {
        warn!("{}, encoding as 0", e);
        0
    })
}

/// Encode form values, rejecting categorical strings outside their domain.
pub fn encode_strict(
    age: u32,
    sex: &str,
    is_smoking: &str,
    diabetes: &str,
    tot_chol: f64,
    bmi: f64,
    heart_rate: f64,
) -> Result<FeatureRow> {
    Ok(FeatureRow {
        age,
        sex: sex.parse::<Sex>()?.code(),
        is_smoking: is_smoking.parse::<SmokingStatus>()?.code(),
        diabetes: diabetes.parse::<Diabetes>()?.code(),
        tot_chol,
        bmi,
        heart_rate,
    })
}

/// How out-of-domain categorical answers are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingPolicy {
    #[default]
    Lenient,
    Strict,
}

impl EncodingPolicy {
    #[allow(clippy::too_many_arguments)]
    pub fn encode(
        self,
        age: u32,
        sex: &str,
        is_smoking: &str,
        diabetes: &str,
        tot_chol: f64,
        bmi: f64,
        heart_rate: f64,
    ) -> Result<FeatureRow> {
        match self {
            EncodingPolicy::Lenient => Ok(encode(
                age, sex, is_smoking, diabetes, tot_chol, bmi, heart_rate,
            )),
            EncodingPolicy::Strict => {
                encode_strict(age, sex, is_smoking, diabetes, tot_chol, bmi, heart_rate)
            }
        }
    }
}
