//! Parameter values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single resolved parameter value.
///
/// Values sourced from the command line are always [`Scalar::Text`]; values
/// from configuration files keep their native type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Short name of the value's type, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Text(_) => "text",
        }
    }

    /// Borrow the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value.into())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

/// A parameter spec entry: one fixed value or an ordered list of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl SpecValue {
    /// Build a candidate list from anything convertible to scalars.
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        SpecValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Whether this entry participates in Cartesian expansion.
    pub fn is_varying(&self) -> bool {
        matches!(self, SpecValue::List(_))
    }

    /// Number of candidate values (1 for a scalar).
    pub fn len(&self) -> usize {
        match self {
            SpecValue::Scalar(_) => 1,
            SpecValue::List(values) => values.len(),
        }
    }

    /// True for an empty candidate list, which is never a valid spec value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! spec_value_from_scalar {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SpecValue {
                fn from(value: $ty) -> Self {
                    SpecValue::Scalar(value.into())
                }
            }
        )*
    };
}

spec_value_from_scalar!(bool, i32, i64, f64, &str, String);

impl From<Scalar> for SpecValue {
    fn from(value: Scalar) -> Self {
        SpecValue::Scalar(value)
    }
}

impl fmt::Display for SpecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecValue::Scalar(s) => write!(f, "{}", s),
            SpecValue::List(values) => {
                f.write_str("[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_json_shape() {
        let value = SpecValue::list(["2", "1"]);
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"["2","1"]"#);

        let parsed: SpecValue = serde_json::from_str("3.5").unwrap();
        assert_eq!(parsed, SpecValue::Scalar(Scalar::Float(3.5)));

        let parsed: SpecValue = serde_json::from_str("[1, true, \"x\"]").unwrap();
        assert_eq!(
            parsed,
            SpecValue::List(vec![
                Scalar::Int(1),
                Scalar::Bool(true),
                Scalar::Text("x".into())
            ])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(SpecValue::list([1, 2]).to_string(), "[1, 2]");
        assert_eq!(SpecValue::from("normal").to_string(), "normal");
    }
}
