//! Patient form: the raw answers, their defaults, and range checks.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::encoder::{EncodingPolicy, FeatureRow, DIABETES_CHOICES, SEX_CHOICES, SMOKING_CHOICES};
use crate::error::{ChdError, Result};

pub const MIN_AGE: u32 = 1;
pub const MAX_AGE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientForm {
    pub age: u32,
    pub sex: String,
    pub is_smoking: String,
    pub diabetes: String,
    pub tot_chol: f64,
    pub bmi: f64,
    pub heart_rate: f64,
}

impl Default for PatientForm {
    fn default() -> Self {
        PatientForm {
            age: 30,
            sex: SEX_CHOICES[0].to_string(),
            is_smoking: SMOKING_CHOICES[0].to_string(),
            diabetes: DIABETES_CHOICES[0].to_string(),
            tot_chol: 200.0,
            bmi: 25.0,
            heart_rate: 75.0,
        }
    }
}

impl PatientForm {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(ChdError::InvalidField {
                field: "age",
                reason: format!("{} is outside {}..={}", self.age, MIN_AGE, MAX_AGE),
            });
        }
        check_non_negative("totChol", self.tot_chol)?;
        check_non_negative("BMI", self.bmi)?;
        check_non_negative("heartRate", self.heart_rate)?;
        Ok(())
    }

    pub fn encode(&self, policy: EncodingPolicy) -> Result<FeatureRow> {
        policy.encode(
            self.age,
            &self.sex,
            &self.is_smoking,
            &self.diabetes,
            self.tot_chol,
            self.bmi,
            self.heart_rate,
        )
    }

    /// Ask for every field on `output`, reading answers from `input`.
    ///
    /// An empty answer keeps the default. Invalid answers are reported and
    /// asked again; end of input is an error.
    pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Self> {
        let defaults = PatientForm::default();
        writeln!(output, "Enter patient information:")?;

        let age = ask(input, output, "Age", &defaults.age.to_string(), None, |s| {
            let age: u32 = s
                .parse()
                .map_err(|_| format!("{s:?} is not a whole number"))?;
            if (MIN_AGE..=MAX_AGE).contains(&age) {
                Ok(age)
            } else {
                Err(format!("must be between {MIN_AGE} and {MAX_AGE}"))
            }
        })?;
        let sex = ask_choice(input, output, "Gender", SEX_CHOICES)?;
        let is_smoking = ask_choice(input, output, "Smoking status", SMOKING_CHOICES)?;
        let diabetes = ask_choice(input, output, "Diabetes status", DIABETES_CHOICES)?;
        let tot_chol = ask_float(input, output, "Total Cholesterol", defaults.tot_chol)?;
        let bmi = ask_float(input, output, "BMI", defaults.bmi)?;
        let heart_rate = ask_float(input, output, "Heart Rate", defaults.heart_rate)?;

        Ok(PatientForm {
            age,
            sex,
            is_smoking,
            diabetes,
            tot_chol,
            bmi,
            heart_rate,
        })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ChdError::InvalidField {
            field,
            reason: format!("{value} must be a number >= 0"),
        })
    }
}

fn ask<R, W, T, F>(
    input: &mut R,
    output: &mut W,
    label: &str,
    default: &str,
    choices: Option<&[&str]>,
    parse: F,
) -> Result<T>
where
    R: BufRead,
    W: Write,
    F: Fn(&str) -> std::result::Result<T, String>,
{
    loop {
        match choices {
            Some(choices) => write!(output, "{} ({}) [{}]: ", label, choices.join("/"), default)?,
            None => write!(output, "{} [{}]: ", label, default)?,
        }
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(ChdError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("no answer for {label}"),
            )));
        }
        let answer = match line.trim() {
            "" => default,
            other => other,
        };
        match parse(answer) {
            Ok(value) => return Ok(value),
            Err(reason) => writeln!(output, "  invalid {}: {}", label, reason)?,
        }
    }
}

fn ask_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    choices: &[&str],
) -> Result<String> {
    ask(input, output, label, choices[0], Some(choices), |s| {
        choices
            .iter()
            .find(|c| **c == s)
            .map(|c| c.to_string())
            .ok_or_else(|| format!("{s:?} is not one of {}", choices.join(", ")))
    })
}

fn ask_float<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    default: f64,
) -> Result<f64> {
    ask(input, output, label, &format!("{default:.1}"), None, |s| {
        let value: f64 = s.parse().map_err(|_| format!("{s:?} is not a number"))?;
        if value.is_finite() && value >= 0.0 {
            Ok(value)
        } else {
            Err("must be >= 0".to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_defaults_are_valid() {
        let form = PatientForm::default();
        assert!(form.validate().is_ok());
        let row = form.encode(EncodingPolicy::Strict).unwrap();
        assert_eq!(row.to_vec(), vec![30.0, 1.0, 1.0, 1.0, 200.0, 25.0, 75.0]);
    }

    #[test]
    fn test_age_range() {
        for age in [MIN_AGE, MAX_AGE] {
            let form = PatientForm {
                age,
                ..PatientForm::default()
            };
            assert!(form.validate().is_ok());
        }
        for age in [0, 101] {
            let form = PatientForm {
                age,
                ..PatientForm::default()
            };
            assert!(matches!(
                form.validate(),
                Err(ChdError::InvalidField { field: "age", .. })
            ));
        }
    }

    #[test]
    fn test_negative_and_nan_rejected() {
        let form = PatientForm {
            bmi: -0.5,
            ..PatientForm::default()
        };
        assert!(matches!(
            form.validate(),
            Err(ChdError::InvalidField { field: "BMI", .. })
        ));
        let form = PatientForm {
            heart_rate: f64::NAN,
            ..PatientForm::default()
        };
        assert!(form.validate().is_err());
        let form = PatientForm {
            tot_chol: 0.0,
            ..PatientForm::default()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_prompt_accepts_defaults() {
        let mut input = Cursor::new("\n\n\n\n\n\n\n");
        let mut output = Vec::new();
        let form = PatientForm::prompt(&mut input, &mut output).unwrap();
        assert_eq!(form, PatientForm::default());
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Gender (Male/Female) [Male]: "));
        assert!(shown.contains("Heart Rate [75.0]: "));
    }

    #[test]
    fn test_prompt_reasks_invalid_answers() {
        let mut input = Cursor::new("150\n64\nOther\nFemale\nNon-Smoker\nNo\n-3\n230\n27.4\n80\n");
        let mut output = Vec::new();
        let form = PatientForm::prompt(&mut input, &mut output).unwrap();
        assert_eq!(form.age, 64);
        assert_eq!(form.sex, "Female");
        assert_eq!(form.is_smoking, "Non-Smoker");
        assert_eq!(form.diabetes, "No");
        assert_eq!(form.tot_chol, 230.0);
        assert_eq!(form.bmi, 27.4);
        assert_eq!(form.heart_rate, 80.0);
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("invalid Age"));
        assert!(shown.contains("invalid Gender"));
        assert!(shown.contains("invalid Total Cholesterol"));
    }

    #[test]
    fn test_prompt_eof_is_error() {
        let mut input = Cursor::new("45\n");
        let mut output = Vec::new();
        assert!(PatientForm::prompt(&mut input, &mut output).is_err());
    }
}
