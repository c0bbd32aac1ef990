//! Coronary Heart Disease prediction.
//!
//! Six patient answers are encoded into the fixed feature row a pre-trained
//! classifier was fit on; the classifier's 0/1 output selects what the form
//! shows.

pub mod assessor;
pub mod batch;
pub mod config;
pub mod display;
pub mod encoder;
pub mod error;
pub mod form;
pub mod predictor;
pub mod records;

pub use assessor::{Assessment, Assessor};
pub use config::Config;
pub use display::{DisplaySettings, DisplayVariant};
pub use encoder::{encode, encode_strict, EncodingPolicy, FeatureRow};
pub use error::{ChdError, Result};
pub use form::PatientForm;
pub use predictor::{Label, Predictor, SmartcoreModel};
pub use records::{FEATURE_COUNT, FEATURE_NAMES};
