//! Conversion of arbitrary key/value maps into flat string tags.
//!
//! Annotation backends (span tags, metric tags, error report tags) only
//! accept short strings. [`map_to_tags`] summarizes every [`Value`] shape
//! into one deterministic string:
//!
//! | value | tag |
//! |---|---|
//! | `Null` / `Undefined` | `"null"` / `"undefined"` |
//! | bool, number | its literal form; decimal, or exponent form below `1e-6` and from `1e21` on |
//! | string up to 44 chars | unchanged |
//! | longer string | first 40 chars followed by `...[<length>]` |
//! | array | elements stringified, sorted and joined with `,`; more than 20 elements keep the first 20 followed by `...[<length>]` |
//! | object | `Object:<TypeName>` |
//!
//! The conversion never fails and never allocates more than the output
//! requires beyond one intermediate vector for arrays.
use crate::Value;
use std::collections::HashMap;
use std::hash::Hash;

/// Strings up to this many characters are kept verbatim.
pub const MAX_STRING_LENGTH: usize = 44;

/// Number of characters kept from a string longer than [`MAX_STRING_LENGTH`].
pub const TRUNCATED_STRING_LENGTH: usize = 40;

/// Arrays with more elements than this are truncated after sorting.
pub const MAX_ARRAY_LENGTH: usize = 20;

// Magnitudes outside [EXPONENT_BELOW, EXPONENT_ABOVE) are written in exponent form.
const EXPONENT_ABOVE: f64 = 1e21;
const EXPONENT_BELOW: f64 = 1e-6;

/// Maps every value of `fields` to its tag string, keeping the keys.
///
/// ```
/// use o11y::{tags::map_to_tags, Value};
///
/// let tags = map_to_tags([
///     ("short_string", Value::from("myString")),
///     ("number", Value::from(22)),
///     ("null", Value::Null),
/// ]);
///
/// assert_eq!(tags["short_string"], "myString");
/// assert_eq!(tags["number"], "22");
/// assert_eq!(tags["null"], "null");
/// ```
pub fn map_to_tags<I, K, V>(fields: I) -> HashMap<K, String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Eq + Hash,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(key, value)| (key, to_tag(&value.into())))
        .collect()
}

/// Converts a single value into its tag string.
pub fn to_tag(value: &Value) -> String {
    match value {
        Value::Array(values) => array_tag(values),
        Value::Object(type_name) => object_tag(type_name),
        primitive => primitive_tag(primitive),
    }
}

fn primitive_tag(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::I64(n) => n.to_string(),
        Value::F64(n) => float_tag(*n),
        Value::String(s) => string_tag(s),
        Value::Array(_) => object_tag("Array"),
        Value::Object(type_name) => object_tag(type_name),
    }
}

fn float_tag(n: f64) -> String {
    if n.is_infinite() {
        if n.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        // Covers -0.0.
        "0".to_string()
    } else if n.abs() >= EXPONENT_ABOVE || n.abs() < EXPONENT_BELOW {
        exponent_tag(n)
    } else {
        // f64's Display never uses exponents and prints integral values without a fraction.
        n.to_string()
    }
}

/// Shortest round-trip digits in exponent form with an explicit `+` on
/// positive exponents, e.g. `1e+21` and `1.5e-7`.
fn exponent_tag(n: f64) -> String {
    let formatted = format!("{n:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}

fn string_tag(s: &str) -> String {
    let length = s.chars().count();
    if length <= MAX_STRING_LENGTH {
        return s.to_string();
    }
    let kept: String = s.chars().take(TRUNCATED_STRING_LENGTH).collect();
    format!("{kept}...[{length}]")
}

fn object_tag(type_name: &str) -> String {
    format!("Object:{type_name}")
}

fn array_tag(values: &[Value]) -> String {
    let mut elements: Vec<String> = values.iter().map(primitive_tag).collect();
    elements.sort_unstable();

    if elements.len() <= MAX_ARRAY_LENGTH {
        return elements.join(",");
    }
    elements.truncate(MAX_ARRAY_LENGTH);
    format!("{}...[{}]", elements.join(","), values.len())
}
