use polars::prelude::{DataType, Field, Schema};

/// Column order the classifier was trained on.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "sex",
    "is_smoking",
    "diabetes",
    "totChol",
    "BMI",
    "heartRate",
];

pub const FEATURE_COUNT: usize = 7;

pub struct PatientRecord {}

impl PatientRecord {
    /// Schema of a raw patient file: categoricals as text, as typed into the form.
    pub fn raw_schema() -> Schema {
        Schema::from_iter(vec![
            Field::new("age", DataType::Int64),
            Field::new("sex", DataType::Utf8),
            Field::new("is_smoking", DataType::Utf8),
            Field::new("diabetes", DataType::Utf8),
            Field::new("totChol", DataType::Float64),
            Field::new("BMI", DataType::Float64),
            Field::new("heartRate", DataType::Float64),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_schema_follows_feature_order() {
        let schema = PatientRecord::raw_schema();
        let names: Vec<&str> = schema.iter_names().map(|n| n.as_str()).collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
    }
}
