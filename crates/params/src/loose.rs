//! Specs from loosely typed sources (TOML config tables, JSON argument files).
//!
//! These sources can hold shapes a spec cannot: nested tables, nested
//! arrays, nulls, datetimes. Those are reported as invalid specs naming the
//! offending key.

use simsweep_types::{ParameterSpec, Scalar, SpecError, SpecValue};

fn unsupported(key: &str, kind: &str) -> SpecError {
    SpecError::UnsupportedValue {
        key: key.to_string(),
        kind: kind.to_string(),
    }
}

fn toml_scalar(key: &str, value: &toml::Value) -> Result<Scalar, SpecError> {
    match value {
        toml::Value::String(s) => Ok(Scalar::Text(s.clone())),
        toml::Value::Integer(i) => Ok(Scalar::Int(*i)),
        toml::Value::Float(x) => Ok(Scalar::Float(*x)),
        toml::Value::Boolean(b) => Ok(Scalar::Bool(*b)),
        other => Err(unsupported(key, other.type_str())),
    }
}

/// Build a spec from a TOML table such as `[model].args`.
pub fn spec_from_toml(table: &toml::Table) -> Result<ParameterSpec, SpecError> {
    let mut spec = ParameterSpec::new();
    for (key, value) in table {
        let entry = match value {
            toml::Value::Array(items) => SpecValue::List(
                items
                    .iter()
                    .map(|item| toml_scalar(key, item))
                    .collect::<Result<_, _>>()?,
            ),
            other => SpecValue::Scalar(toml_scalar(key, other)?),
        };
        spec.insert(key.as_str(), entry);
    }
    spec.validate()?;
    Ok(spec)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn json_scalar(key: &str, value: &serde_json::Value) -> Result<Scalar, SpecError> {
    match value {
        serde_json::Value::String(s) => Ok(Scalar::Text(s.clone())),
        serde_json::Value::Bool(b) => Ok(Scalar::Bool(*b)),
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(Scalar::Int)
            .or_else(|| n.as_f64().map(Scalar::Float))
            .ok_or_else(|| unsupported(key, "number")),
        other => Err(unsupported(key, json_kind(other))),
    }
}

/// Build a spec from a JSON object (`{"gain": ["2", "1"], "len": "2"}`).
///
/// Key order follows the document.
pub fn spec_from_json(value: &serde_json::Value) -> Result<ParameterSpec, SpecError> {
    let object = value
        .as_object()
        .ok_or_else(|| unsupported("<root>", json_kind(value)))?;
    let mut spec = ParameterSpec::new();
    for (key, value) in object {
        let entry = match value {
            serde_json::Value::Array(items) => SpecValue::List(
                items
                    .iter()
                    .map(|item| json_scalar(key, item))
                    .collect::<Result<_, _>>()?,
            ),
            other => SpecValue::Scalar(json_scalar(key, other)?),
        };
        spec.insert(key.as_str(), entry);
    }
    spec.validate()?;
    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_table() {
        let table: toml::Table = toml::from_str(
            r#"
            "DUnit/DelayLength" = "2"
            "oGain/Gain" = ["2", "1"]
            steps = 10
            "#,
        )
        .unwrap();
        let spec = spec_from_toml(&table).unwrap();
        assert_eq!(spec.get("oGain/Gain"), Some(&SpecValue::list(["2", "1"])));
        assert_eq!(spec.get("steps"), Some(&SpecValue::from(10i64)));
    }

    #[test]
    fn test_toml_nested_values_rejected() {
        let table: toml::Table = toml::from_str("a = { b = 1 }").unwrap();
        assert_eq!(
            spec_from_toml(&table).unwrap_err(),
            SpecError::UnsupportedValue {
                key: "a".into(),
                kind: "table".into()
            }
        );

        let table: toml::Table = toml::from_str("a = [[1, 2], [3]]").unwrap();
        assert!(matches!(
            spec_from_toml(&table),
            Err(SpecError::UnsupportedValue { .. })
        ));

        let table: toml::Table = toml::from_str("a = []").unwrap();
        assert_eq!(
            spec_from_toml(&table).unwrap_err(),
            SpecError::EmptySequence { key: "a".into() }
        );
    }

    #[test]
    fn test_json_object() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"len": "2", "gain": [2, 1.5], "on": true}"#).unwrap();
        let spec = spec_from_json(&value).unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(
            spec.get("gain"),
            Some(&SpecValue::List(vec![Scalar::Int(2), Scalar::Float(1.5)]))
        );
    }

    #[test]
    fn test_json_invalid_shapes() {
        let value: serde_json::Value = serde_json::from_str(r#"{"x": null}"#).unwrap();
        assert_eq!(
            spec_from_json(&value).unwrap_err(),
            SpecError::UnsupportedValue {
                key: "x".into(),
                kind: "null".into()
            }
        );

        let value: serde_json::Value = serde_json::from_str("[1, 2]").unwrap();
        assert!(spec_from_json(&value).is_err());
    }
}
