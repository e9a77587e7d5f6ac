//! Response normalizer for view-function results.
//!
//! View calls come back in many shapes for the same logical value: a bare
//! scalar, `[x]`, `[[x, y]]`, `["x,y"]`, `{"validators": [...]}`, Move options
//! (`{"vec": [x]}`) and so on. Every shape is coerced here into one canonical
//! typed value. Nothing in this module fails: a payload nobody recognizes
//! becomes the shape's zero value (`false`, `0`, `[]`).
//!
//! Matchers are tried in priority order:
//! named field > nested array > singleton unwrap > comma string > passthrough.

use serde_json::Value;

/// Maximum unwrap depth (guards against pathological nesting)
const MAX_DEPTH: usize = 6;

/// Expected shape of a view result
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Bool,
    Number,
    /// List of addresses. `field` names the collection when the node wraps it
    /// in an object.
    AddressList { field: Option<&'static str> },
    /// Fixed-arity tuple; elements are left raw for the caller to coerce
    Tuple(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Normalized {
    Bool(bool),
    Number(u64),
    Addresses(Vec<String>),
    Tuple(Vec<Value>),
}

impl Shape {
    pub fn zero(&self) -> Normalized {
        match self {
            Shape::Bool => Normalized::Bool(false),
            Shape::Number => Normalized::Number(0),
            Shape::AddressList { .. } => Normalized::Addresses(Vec::new()),
            Shape::Tuple(n) => Normalized::Tuple(vec![Value::Null; *n]),
        }
    }
}

type Matcher = fn(&Value, &Shape, usize) -> Option<Normalized>;

const MATCHERS: [(&str, Matcher); 5] = [
    ("named_field", match_named_field),
    ("nested_array", match_nested_array),
    ("singleton", match_singleton),
    ("comma_string", match_comma_string),
    ("passthrough", match_passthrough),
];

/// Coerce `raw` into `shape`, falling back to the zero value.
pub fn normalize(raw: &Value, shape: &Shape) -> Normalized {
    normalize_at(raw, shape, 0).unwrap_or_else(|| {
        log::debug!("[normalize] no matcher for {shape:?}, using zero value");
        shape.zero()
    })
}

fn normalize_at(raw: &Value, shape: &Shape, depth: usize) -> Option<Normalized> {
    if depth >= MAX_DEPTH {
        return None;
    }
    MATCHERS.iter().find_map(|(name, matcher)| {
        let hit = matcher(raw, shape, depth);
        if hit.is_some() {
            log::trace!("[normalize] {name} matched {shape:?} at depth {depth}");
        }
        hit
    })
}

fn match_named_field(raw: &Value, shape: &Shape, depth: usize) -> Option<Normalized> {
    let obj = raw.as_object()?;
    let field = match shape {
        Shape::AddressList { field: Some(f) } => obj.get(*f),
        _ => None,
    };
    // Move `Option<T>` serializes as {"vec": [..]}; plain wrappers use "value"
    let inner = field.or_else(|| obj.get("vec")).or_else(|| obj.get("value"))?;
    normalize_at(inner, shape, depth + 1)
}

fn match_nested_array(raw: &Value, shape: &Shape, depth: usize) -> Option<Normalized> {
    let arr = raw.as_array()?;
    match shape {
        Shape::Tuple(n) => {
            // [[a, b, c]] wraps the tuple; [[..], [..]] with arity 2 *is* the tuple
            if arr.len() == *n {
                return None;
            }
            let inner = arr.iter().find(|v| v.as_array().map(|a| a.len()) == Some(*n))?;
            normalize_at(inner, shape, depth + 1)
        }
        _ => {
            let inner = arr.iter().find(|v| v.is_array())?;
            normalize_at(inner, shape, depth + 1)
        }
    }
}

fn match_singleton(raw: &Value, shape: &Shape, depth: usize) -> Option<Normalized> {
    let arr = raw.as_array()?;
    if arr.len() != 1 {
        return None;
    }
    if let Shape::Tuple(1) = shape {
        return None;
    }
    normalize_at(&arr[0], shape, depth + 1)
}

fn match_comma_string(raw: &Value, shape: &Shape, _depth: usize) -> Option<Normalized> {
    if !matches!(shape, Shape::AddressList { .. }) {
        return None;
    }
    let s = raw.as_str()?;
    Some(Normalized::Addresses(split_list(s)))
}

fn match_passthrough(raw: &Value, shape: &Shape, _depth: usize) -> Option<Normalized> {
    match shape {
        Shape::Bool => decode_bool(raw).map(Normalized::Bool),
        Shape::Number => decode_u64(raw).map(Normalized::Number),
        Shape::AddressList { .. } => {
            let arr = raw.as_array()?;
            let strings: Vec<&str> = arr.iter().filter_map(|v| v.as_str()).collect();
            if strings.len() != arr.len() {
                return None;
            }
            Some(Normalized::Addresses(
                strings.into_iter().flat_map(split_list).collect(),
            ))
        }
        Shape::Tuple(n) => {
            let arr = raw.as_array()?;
            let mut items: Vec<Value> = arr.iter().take(*n).cloned().collect();
            items.resize(*n, Value::Null);
            Some(Normalized::Tuple(items))
        }
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.to_string())
        .collect()
}

fn decode_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        _ => None,
    }
}

fn decode_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn as_bool(raw: &Value) -> bool {
    matches!(normalize(raw, &Shape::Bool), Normalized::Bool(true))
}

pub fn as_u64(raw: &Value) -> u64 {
    match normalize(raw, &Shape::Number) {
        Normalized::Number(n) => n,
        _ => 0,
    }
}

pub fn as_address_list(raw: &Value) -> Vec<String> {
    as_address_list_field(raw, None)
}

pub fn as_address_list_field(raw: &Value, field: Option<&'static str>) -> Vec<String> {
    match normalize(raw, &Shape::AddressList { field }) {
        Normalized::Addresses(list) => list,
        _ => Vec::new(),
    }
}

pub fn as_tuple(raw: &Value, arity: usize) -> Vec<Value> {
    match normalize(raw, &Shape::Tuple(arity)) {
        Normalized::Tuple(items) => items,
        _ => vec![Value::Null; arity],
    }
}

pub fn as_u64_tuple(raw: &Value, arity: usize) -> Vec<u64> {
    as_tuple(raw, arity).iter().map(as_u64).collect()
}

/// Numeric list, e.g. the epochs half of a vouch tuple
pub fn as_u64_list(raw: &Value) -> Vec<u64> {
    match raw {
        Value::Array(arr) if arr.len() == 1 && arr[0].is_array() => as_u64_list(&arr[0]),
        Value::Array(arr) => arr.iter().map(as_u64).collect(),
        Value::String(s) => split_list(s)
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect(),
        Value::Object(obj) => obj.get("vec").map(as_u64_list).unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Move `Option<u64>`: `{"vec": []}` is none, `{"vec": ["5"]}` is some.
/// A bare number is taken as present.
pub fn as_option_u64(raw: &Value) -> Option<u64> {
    match raw {
        Value::Array(arr) if arr.len() == 1 => as_option_u64(&arr[0]),
        Value::Object(obj) => match obj.get("vec")? {
            Value::Array(inner) => inner.first().and_then(decode_u64),
            other => decode_u64(other),
        },
        other => decode_u64(other),
    }
}

/// `(addresses, epochs)` pair returned by the vouch views
pub fn as_list_pair(raw: &Value) -> (Vec<String>, Vec<u64>) {
    let items = as_tuple(raw, 2);
    (as_address_list(&items[0]), as_u64_list(&items[1]))
}

/// Canonical address form: trimmed, lowercase, `0x`-prefixed
pub fn normalize_address(address: &str) -> String {
    let lower = address.trim().to_lowercase();
    let bare = lower.strip_prefix("0x").unwrap_or(&lower);
    format!("0x{bare}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validator_list_shapes() {
        let expected = vec!["0xA".to_string(), "0xB".to_string()];
        assert_eq!(as_address_list(&json!([["0xA", "0xB"]])), expected);
        assert_eq!(as_address_list(&json!(["0xA,0xB"])), expected);
        assert_eq!(as_address_list(&json!("0xA, 0xB")), expected);
        assert_eq!(as_address_list(&json!(["0xA", "0xB"])), expected);
    }

    #[test]
    fn test_nested_array_ignores_scalar_siblings() {
        let raw = json!(["ignored", ["0xA", "0xB"], 7]);
        assert_eq!(as_address_list(&raw), vec!["0xA", "0xB"]);
    }

    #[test]
    fn test_named_field_wins() {
        let raw = json!([{"validators": ["0xC"], "other": ["0xD"]}]);
        assert_eq!(as_address_list_field(&raw, Some("validators")), vec!["0xC"]);
    }

    #[test]
    fn test_round_trip_shapes_converge() {
        let canonical = vec!["0x1".to_string(), "0x2".to_string()];
        let shapes = [
            json!(["0x1", "0x2"]),
            json!([["0x1", "0x2"]]),
            json!([[["0x1", "0x2"]]]),
            json!(["0x1,0x2"]),
            json!("0x1,0x2"),
            json!({"vec": ["0x1", "0x2"]}),
        ];
        for raw in shapes.iter() {
            assert_eq!(as_address_list(raw), canonical, "shape {raw}");
            // Normalizing the canonical form again is a no-op
            let again = as_address_list(&json!(as_address_list(raw)));
            assert_eq!(again, canonical);
        }

        for raw in [json!(42), json!("42"), json!(["42"]), json!([["42"]])] {
            assert_eq!(as_u64(&raw), 42, "shape {raw}");
        }

        for raw in [json!(true), json!("true"), json!([true]), json!([[true]])] {
            assert!(as_bool(&raw), "shape {raw}");
        }
    }

    #[test]
    fn test_zero_values_on_mismatch() {
        assert!(!as_bool(&json!({"unexpected": 1})));
        assert_eq!(as_u64(&json!("not-a-number")), 0);
        assert_eq!(as_u64(&Value::Null), 0);
        assert!(as_address_list(&json!(42)).is_empty());
        assert!(as_address_list(&json!([1, 2])).is_empty());
        assert_eq!(as_u64_tuple(&json!(null), 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_tuples() {
        assert_eq!(as_u64_tuple(&json!(["1", "2", "3"]), 3), vec![1, 2, 3]);
        assert_eq!(as_u64_tuple(&json!([["1", "2", "3"]]), 3), vec![1, 2, 3]);
        assert_eq!(as_u64_tuple(&json!(["1"]), 2), vec![1, 0]);
        assert_eq!(as_tuple(&json!([true, "9", "4"]), 3)[0], json!(true));
    }

    #[test]
    fn test_list_pair() {
        let (addrs, epochs) = as_list_pair(&json!([["0xA", "0xB"], ["10", "12"]]));
        assert_eq!(addrs, vec!["0xA", "0xB"]);
        assert_eq!(epochs, vec![10, 12]);

        let (addrs, epochs) = as_list_pair(&json!([[["0xA"], ["7"]]]));
        assert_eq!(addrs, vec!["0xA"]);
        assert_eq!(epochs, vec![7]);
    }

    #[test]
    fn test_option_u64() {
        assert_eq!(as_option_u64(&json!([{"vec": []}])), None);
        assert_eq!(as_option_u64(&json!([{"vec": ["5"]}])), Some(5));
        assert_eq!(as_option_u64(&json!("9")), Some(9));
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address(" 0xAbC "), "0xabc");
        assert_eq!(normalize_address("ABC"), "0xabc");
    }
}
