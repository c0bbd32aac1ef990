use std::fmt;

use serde::{Deserialize, Serialize};

use crate::predictor::Label;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub no_disease_image: String,
    pub disease_image: String,
    pub image_width: u32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            no_disease_image: "no_disease.png".to_string(),
            disease_image: "disease.png".to_string(),
            image_width: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Error,
    Success,
}

/// What the form surface shows for a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayVariant {
    pub tone: Tone,
    pub message: &'static str,
    pub image: String,
    pub image_width: u32,
    pub caption: &'static str,
}

impl DisplayVariant {
    pub fn for_label(label: Label, settings: &DisplaySettings) -> Self {
        match label {
            Label::NoDisease => DisplayVariant {
                tone: Tone::Error,
                message: "Coronary Heart Disease: No",
                image: settings.no_disease_image.clone(),
                image_width: settings.image_width,
                caption: "No Coronary Heart Disease",
            },
            Label::DiseasePresent => DisplayVariant {
                tone: Tone::Success,
                message: "Coronary Heart Disease: Yes",
                image: settings.disease_image.clone(),
                image_width: settings.image_width,
                caption: "Coronary Heart Disease Present",
            },
        }
    }
}

impl fmt::Display for DisplayVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.tone {
            Tone::Error => "[x]",
            Tone::Success => "[+]",
        };
        writeln!(f, "Prediction:")?;
        writeln!(f, "{} {}", marker, self.message)?;
        write!(
            f,
            "    image: {} (width {}) - {}",
            self.image, self.image_width, self.caption
        )
    }
}
