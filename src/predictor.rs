//! Pre-trained binary classifier behind a single `predict` operation.

use std::fmt;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::LogisticRegression;
use smartcore::tree::decision_tree_classifier::DecisionTreeClassifier;

use crate::encoder::FeatureRow;
use crate::error::{ChdError, Result};
use crate::records::{FEATURE_COUNT, FEATURE_NAMES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Label {
    NoDisease,
    DiseasePresent,
}

impl Label {
    pub fn as_i32(self) -> i32 {
        match self {
            Label::NoDisease => 0,
            Label::DiseasePresent => 1,
        }
    }

    pub fn is_positive(self) -> bool {
        self == Label::DiseasePresent
    }
}

impl TryFrom<i32> for Label {
    type Error = ChdError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Label::NoDisease),
            1 => Ok(Label::DiseasePresent),
            other => Err(ChdError::UnexpectedLabel(other)),
        }
    }
}

impl From<Label> for i32 {
    fn from(label: Label) -> i32 {
        label.as_i32()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i32())
    }
}

/// Anything that maps a feature row to a 0/1 label.
pub trait Predictor {
    fn predict(&self, row: &FeatureRow) -> Result<Label>;

    fn predict_batch(&self, rows: &[FeatureRow]) -> Result<Vec<Label>> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn predict(&self, row: &FeatureRow) -> Result<Label> {
        (**self).predict(row)
    }

    fn predict_batch(&self, rows: &[FeatureRow]) -> Result<Vec<Label>> {
        (**self).predict_batch(rows)
    }
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, row: &FeatureRow) -> Result<Label> {
        (**self).predict(row)
    }

    fn predict_batch(&self, rows: &[FeatureRow]) -> Result<Vec<Label>> {
        (**self).predict_batch(rows)
    }
}

pub type LogisticModel = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;
pub type TreeModel = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Serialized smartcore classifiers an artifact may hold.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "model", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LogisticModel),
    DecisionTree(TreeModel),
}

impl Classifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::LogisticRegression(_) => "logistic_regression",
            Classifier::DecisionTree(_) => "decision_tree",
        }
    }

    fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>> {
        let raw = match self {
            Classifier::LogisticRegression(model) => model.predict(x),
            Classifier::DecisionTree(model) => model.predict(x),
        };
        raw.map_err(|e| ChdError::Inference(e.to_string()))
    }
}

/// On-disk model file: the classifier plus the column order it was fit on.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub name: String,
    pub feature_names: Vec<String>,
    pub classifier: Classifier,
}

impl ModelArtifact {
    pub fn new(name: impl Into<String>, classifier: Classifier) -> Self {
        ModelArtifact {
            name: name.into(),
            feature_names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            classifier,
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string(self).map_err(|e| ChdError::ModelFormat {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json)?;
        info!("Saved model {:?} to {}", self.name, path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ChdError::ModelIo {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact =
            serde_json::from_slice(&bytes).map_err(|e| ChdError::ModelFormat {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        artifact.check_schema()?;
        Ok(artifact)
    }

    fn check_schema(&self) -> Result<()> {
        if self.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES) {
            Ok(())
        } else {
            Err(ChdError::SchemaMismatch {
                expected: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
                found: self.feature_names.clone(),
            })
        }
    }
}

/// Row-major matrix with one row per patient, in trained column order.
pub fn rows_to_matrix(rows: &[FeatureRow]) -> DenseMatrix<f64> {
    let mut values: Vec<f64> = Vec::with_capacity(rows.len() * FEATURE_COUNT);
    for row in rows {
        values.extend_from_slice(&row.to_vec());
    }
    DenseMatrix::new(rows.len(), FEATURE_COUNT, values, false)
}

/// A loaded artifact. Immutable after load.
#[derive(Debug)]
pub struct SmartcoreModel {
    artifact: ModelArtifact,
}

impl SmartcoreModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let artifact = ModelArtifact::load(path)?;
        info!(
            "Loaded {} model {:?} from {}",
            artifact.classifier.kind(),
            artifact.name,
            path.display()
        );
        Ok(SmartcoreModel { artifact })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        artifact.check_schema()?;
        Ok(SmartcoreModel { artifact })
    }

    pub fn name(&self) -> &str {
        &self.artifact.name
    }

    pub fn kind(&self) -> &'static str {
        self.artifact.classifier.kind()
    }
}

impl Predictor for SmartcoreModel {
    fn predict(&self, row: &FeatureRow) -> Result<Label> {
        let labels = self.predict_batch(std::slice::from_ref(row))?;
        labels
            .into_iter()
            .next()
            .ok_or_else(|| ChdError::Inference("model returned no prediction".to_string()))
    }

    fn predict_batch(&self, rows: &[FeatureRow]) -> Result<Vec<Label>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = rows_to_matrix(rows);
        let raw = self.artifact.classifier.predict(&x)?;
        if raw.len() != rows.len() {
            return Err(ChdError::Inference(format!(
                "model returned {} predictions for {} rows",
                raw.len(),
                rows.len()
            )));
        }
        debug!("Predicted {} rows with {}", rows.len(), self.kind());
        raw.into_iter().map(Label::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use smartcore::tree::decision_tree_classifier::DecisionTreeClassifierParameters;

    fn fixture_rows() -> (Vec<FeatureRow>, Vec<i32>) {
        let rows = vec![
            encode(62, "Male", "Smoker", "Yes", 290.0, 31.5, 92.0),
            encode(58, "Male", "Smoker", "No", 265.0, 29.0, 85.0),
            encode(29, "Female", "Non-Smoker", "No", 170.0, 21.0, 64.0),
            encode(35, "Female", "Non-Smoker", "Yes", 185.0, 23.5, 70.0),
        ];
        (rows, vec![1, 1, 0, 0])
    }

    fn fixture_model() -> SmartcoreModel {
        let (rows, y) = fixture_rows();
        let tree = TreeModel::fit(
            &rows_to_matrix(&rows),
            &y,
            DecisionTreeClassifierParameters::default(),
        )
        .unwrap();
        SmartcoreModel::from_artifact(ModelArtifact::new(
            "fixture",
            Classifier::DecisionTree(tree),
        ))
        .unwrap()
    }

    #[test]
    fn test_label_conversion() {
        assert_eq!(Label::try_from(0).unwrap(), Label::NoDisease);
        assert_eq!(Label::try_from(1).unwrap(), Label::DiseasePresent);
        assert!(matches!(
            Label::try_from(2),
            Err(ChdError::UnexpectedLabel(2))
        ));
        assert_eq!(i32::from(Label::DiseasePresent), 1);
    }

    #[test]
    fn test_rows_to_matrix_shape() {
        use smartcore::linalg::basic::arrays::Array;
        let (rows, _) = fixture_rows();
        let x = rows_to_matrix(&rows);
        assert_eq!(x.shape(), (4, FEATURE_COUNT));
        assert_eq!(*x.get((2, 0)), 29.0);
        assert_eq!(*x.get((0, 4)), 290.0);
    }

    #[test]
    fn test_predict_training_rows() {
        let model = fixture_model();
        let (rows, y) = fixture_rows();
        for (row, expected) in rows.iter().zip(y) {
            assert_eq!(model.predict(row).unwrap().as_i32(), expected);
        }
    }

    #[test]
    fn test_batch_matches_single() {
        let model = fixture_model();
        let (rows, _) = fixture_rows();
        let batch = model.predict_batch(&rows).unwrap();
        let single: Vec<Label> = rows.iter().map(|r| model.predict(r).unwrap()).collect();
        assert_eq!(batch, single);
        assert!(model.predict_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let (rows, y) = fixture_rows();
        let tree = TreeModel::fit(
            &rows_to_matrix(&rows),
            &y,
            DecisionTreeClassifierParameters::default(),
        )
        .unwrap();
        let mut artifact = ModelArtifact::new("swapped", Classifier::DecisionTree(tree));
        artifact.feature_names.swap(1, 2);
        assert!(matches!(
            SmartcoreModel::from_artifact(artifact),
            Err(ChdError::SchemaMismatch { .. })
        ));
    }
}
