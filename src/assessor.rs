use log::debug;
use serde::Serialize;

use crate::display::{DisplaySettings, DisplayVariant};
use crate::encoder::{EncodingPolicy, FeatureRow};
use crate::error::{ChdError, Result};
use crate::form::PatientForm;
use crate::predictor::{Label, Predictor};

/// Outcome of one form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub row: FeatureRow,
    pub label: Label,
}

impl Assessment {
    pub fn display(&self, settings: &DisplaySettings) -> DisplayVariant {
        DisplayVariant::for_label(self.label, settings)
    }
}

/// Handle built once at startup and borrowed for every request.
pub struct Assessor<P> {
    predictor: P,
    policy: EncodingPolicy,
}

impl<P: Predictor> Assessor<P> {
    pub fn new(predictor: P, policy: EncodingPolicy) -> Self {
        Assessor { predictor, policy }
    }

    pub fn policy(&self) -> EncodingPolicy {
        self.policy
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn assess(&self, form: &PatientForm) -> Result<Assessment> {
        form.validate()?;
        let row = form.encode(self.policy)?;
        let label = self.predict_row(&row)?;
        Ok(Assessment { row, label })
    }

    pub fn predict_row(&self, row: &FeatureRow) -> Result<Label> {
        let label = self.predictor.predict(row)?;
        debug!("{} -> {}", row, label);
        Ok(label)
    }

    pub fn assess_batch(&self, forms: &[PatientForm]) -> Result<Vec<Assessment>> {
        let rows = forms
            .iter()
            .map(|form| {
                form.validate()?;
                form.encode(self.policy)
            })
            .collect::<Result<Vec<FeatureRow>>>()?;
        let labels = self.predictor.predict_batch(&rows)?;
        if labels.len() != rows.len() {
            return Err(ChdError::Inference(format!(
                "predictor returned {} labels for {} rows",
                labels.len(),
                rows.len()
            )));
        }
        Ok(rows
            .into_iter()
            .zip(labels)
            .map(|(row, label)| Assessment { row, label })
            .collect())
    }
}
