use std::collections::BTreeMap;
use std::fmt;

/// Generic data tree the traversal layer walks.
///
/// A closed union instead of runtime type reflection: calling code converts
/// application data into this shape (or a deserializer produces it
/// directly), and the traversal algorithm stays identical regardless of
/// where the data came from.
///
/// `Record` preserves declaration order, like a struct; `Map` iterates in
/// key order. Traversal treats both as string-keyed aggregates.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Record(Vec<(String, Value)>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Build a struct-like value from ordered `(field, value)` pairs.
    #[must_use]
    pub fn record<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// True for leaves the traversal dispatches to extractors.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::String(_))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(values: Vec<V>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Record(fields) => {
                write!(f, "{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_scalars() {
        assert_eq!(Value::from(42_i64), Value::Int(42));
        assert_eq!(Value::from(3.5_f64), Value::Float(3.5));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_owned()));
    }

    #[test]
    fn from_vec() {
        assert_eq!(
            Value::from(vec!["a", "b"]),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn record_preserves_order() {
        let record = Value::record([("z", Value::Int(1)), ("a", Value::Int(2))]);
        match record {
            Value::Record(fields) => {
                assert_eq!(fields[0].0, "z");
                assert_eq!(fields[1].0, "a");
            }
            other => panic!("expected Record, got {other:?}"),
        }
    }

    #[test]
    fn scalar_classification() {
        assert!(Value::Int(1).is_scalar());
        assert!(Value::from("x").is_scalar());
        assert!(!Value::Bool(true).is_scalar());
        assert!(!Value::Null.is_scalar());
        assert!(!Value::List(vec![]).is_scalar());
    }

    #[cfg(feature = "json")]
    #[test]
    fn from_json_value() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"a": "x", "b": {"c": 7}, "d": [1.5, null, true]}"#).unwrap();
        let value = Value::from(json);

        let Value::Map(map) = &value else {
            panic!("expected Map, got {value:?}");
        };
        assert_eq!(map["a"], Value::String("x".to_owned()));
        assert_eq!(
            map["d"],
            Value::List(vec![Value::Float(1.5), Value::Null, Value::Bool(true)])
        );
        let Value::Map(inner) = &map["b"] else {
            panic!("expected nested Map");
        };
        assert_eq!(inner["c"], Value::Int(7));
    }

    #[test]
    fn display_nested() {
        let value = Value::record([
            ("a", Value::from("x")),
            ("b", Value::from(vec![1_i64, 2_i64])),
        ]);
        assert_eq!(value.to_string(), r#"{a: "x", b: [1, 2]}"#);
    }
}
