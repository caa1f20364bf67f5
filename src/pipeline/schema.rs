//! Request body normalization.
//!
//! A body is either one JSON object or an array of objects. Both shapes are
//! resolved here into a single ordered `Vec<FeatureRecord>`; extra keys are
//! dropped, and the first record lacking any required feature fails the whole
//! request.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::{FeatureRecord, FEATURE_COUNT, FEATURE_NAMES};

enum Payload {
    Single(Value),
    Batch(Vec<Value>),
}

impl Payload {
    fn from_value(value: Value) -> Result<Self, ValidationError> {
        if is_empty(&value) {
            return Err(ValidationError::NoData);
        }
        Ok(match value {
            Value::Array(items) => Payload::Batch(items),
            other => Payload::Single(other),
        })
    }

    fn into_items(self) -> Vec<Value> {
        match self {
            Payload::Single(item) => vec![item],
            Payload::Batch(items) => items,
        }
    }
}

/// Empty containers and falsy scalars carry no data.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Parses a raw request body. Anything that is not JSON counts as no data.
pub fn parse_body(body: &[u8]) -> Result<Value, ValidationError> {
    serde_json::from_slice(body).map_err(|_| ValidationError::NoData)
}

/// Normalizes a parsed body into feature records, preserving input order.
pub fn normalize(raw: Value) -> Result<Vec<FeatureRecord>, ValidationError> {
    let items = Payload::from_value(raw)?.into_items();

    // Key presence is checked for every record before any value is coerced.
    let projected = items
        .iter()
        .map(project)
        .collect::<Result<Vec<_>, _>>()?;

    projected
        .into_iter()
        .enumerate()
        .map(|(index, fields)| to_record(index, fields))
        .collect()
}

fn project(item: &Value) -> Result<[&Value; FEATURE_COUNT], ValidationError> {
    let map: &Map<String, Value> = item.as_object().ok_or(ValidationError::MissingFeatures)?;

    let mut fields = [&Value::Null; FEATURE_COUNT];
    for (slot, name) in fields.iter_mut().zip(FEATURE_NAMES) {
        *slot = map.get(name).ok_or(ValidationError::MissingFeatures)?;
    }
    Ok(fields)
}

fn to_record(index: usize, fields: [&Value; FEATURE_COUNT]) -> Result<FeatureRecord, ValidationError> {
    let mut values = [0.0; FEATURE_COUNT];
    for (col, (value, feature)) in fields.iter().zip(FEATURE_NAMES).enumerate() {
        values[col] = coerce(value).ok_or(ValidationError::InvalidFeatureValue { index, feature })?;
    }
    Ok(FeatureRecord::new(values))
}

fn coerce(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "Pregnancies": 2, "Glucose": 148, "BloodPressure": 72, "SkinThickness": 35,
            "Insulin": 0, "BMI": 33.6, "DiabetesPedigreeFunction": 0.627, "Age": 50
        })
    }

    #[test]
    fn single_object_becomes_one_record() {
        let records = normalize(sample()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].values(),
            &[2.0, 148.0, 72.0, 35.0, 0.0, 33.6, 0.627, 50.0]
        );
    }

    #[test]
    fn array_preserves_order() {
        let mut second = sample();
        second["Age"] = json!(21);
        let mut third = sample();
        third["Age"] = json!(66);

        let records = normalize(json!([sample(), second, third])).unwrap();
        let ages: Vec<Option<f64>> = records.iter().map(|r| r.get("Age")).collect();
        assert_eq!(ages, vec![Some(50.0), Some(21.0), Some(66.0)]);
    }

    #[test]
    fn extra_fields_are_dropped() {
        let mut body = sample();
        body["PatientId"] = json!("abc-123");
        body["Notes"] = json!({"free": "text"});
        let records = normalize(body).unwrap();
        assert_eq!(records[0], normalize(sample()).unwrap()[0]);
    }

    #[test]
    fn missing_feature_fails_whole_batch() {
        let mut broken = sample();
        broken.as_object_mut().unwrap().remove("BMI");
        let err = normalize(json!([sample(), broken, sample()])).unwrap_err();
        assert_eq!(err, ValidationError::MissingFeatures);
    }

    #[test]
    fn missing_key_wins_over_bad_value() {
        let mut bad_value = sample();
        bad_value["Glucose"] = json!("high");
        let mut missing = sample();
        missing.as_object_mut().unwrap().remove("Age");
        let err = normalize(json!([bad_value, missing])).unwrap_err();
        assert_eq!(err, ValidationError::MissingFeatures);
    }

    #[test]
    fn non_object_elements_lack_every_feature() {
        assert_eq!(normalize(json!([sample(), 5])).unwrap_err(), ValidationError::MissingFeatures);
        assert_eq!(normalize(json!("hello")).unwrap_err(), ValidationError::MissingFeatures);
    }

    #[test]
    fn empty_payloads_are_no_data() {
        for body in [json!({}), json!([]), json!(null), json!(false), json!(0), json!("")] {
            assert_eq!(normalize(body).unwrap_err(), ValidationError::NoData);
        }
    }

    #[test]
    fn non_json_body_is_no_data() {
        assert_eq!(parse_body(b"").unwrap_err(), ValidationError::NoData);
        assert_eq!(parse_body(b"Glucose=148").unwrap_err(), ValidationError::NoData);
        assert!(parse_body(b"{\"a\": 1}").is_ok());
    }

    #[test]
    fn numeric_strings_and_bools_coerce() {
        let mut body = sample();
        body["Glucose"] = json!(" 120 ");
        body["Pregnancies"] = json!(true);
        let record = normalize(body).unwrap()[0];
        assert_eq!(record.get("Glucose"), Some(120.0));
        assert_eq!(record.get("Pregnancies"), Some(1.0));
        assert_eq!(record.get("Cholesterol"), None);
    }

    #[test]
    fn non_numeric_value_names_feature_and_record() {
        let mut bad = sample();
        bad["Insulin"] = json!(null);
        let err = normalize(json!([sample(), bad])).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidFeatureValue { index: 1, feature: "Insulin" }
        );

        let mut nan = sample();
        nan["BMI"] = json!("NaN");
        assert!(matches!(
            normalize(nan).unwrap_err(),
            ValidationError::InvalidFeatureValue { feature: "BMI", .. }
        ));
    }
}
