//! Transformation descriptors.
//!
//! A descriptor is the normalized form of the options a caller passes when
//! asking for a variant. Normalization makes construction order irrelevant:
//!
//! - option names are trimmed and must not be blank
//! - options whose value is `null` are dropped (unset)
//! - string values are trimmed
//! - integral floating-point numbers become integers (`100.0` is `100`)
//! - nested objects are normalized recursively; arrays keep their order
//!
//! The canonical serialization is compact JSON with object keys in
//! byte-wise sorted order, written by hand so it never depends on how
//! `serde_json` maps happen to be ordered in a given build.

use crate::DescriptorDigest;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::{BTreeMap, BTreeSet};
use verso_error::{DescriptorError, DescriptorErrorKind};

/// Options exactly as the caller supplied them, before normalization.
///
/// Anything yielding `(name, value)` pairs collects into `RawOptions`, so a
/// `HashMap`, a `BTreeMap`, a `Vec` of pairs and a JSON object all work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawOptions(Vec<(String, Value)>);

impl RawOptions {
    /// No options at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an option.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.push((name.into(), value.into()));
    }

    /// Options from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not an object.
    pub fn from_json(value: Value) -> Result<Self, DescriptorError> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(DescriptorError::new(DescriptorErrorKind::InvalidValue {
                option: "<root>".to_string(),
                reason: format!("expected an object, got {}", other),
            })),
        }
    }

    /// Whether no options were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawOptions
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Which option names a descriptor may carry.
///
/// Lenient policies pass unknown names through untouched (transformer
/// specific options such as custom filter strings need that). Strict
/// policies reject any name not listed in `known`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionPolicy {
    /// Reject names outside `known`
    #[serde(default)]
    pub strict: bool,
    /// Names accepted in strict mode
    #[serde(default)]
    pub known: BTreeSet<String>,
}

impl OptionPolicy {
    /// Accept every option name.
    pub fn lenient() -> Self {
        Self::default()
    }

    /// Accept only the listed option names.
    pub fn strict<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            strict: true,
            known: known.into_iter().map(Into::into).collect(),
        }
    }

    fn check(&self, name: &str) -> Result<(), DescriptorError> {
        if self.strict && !self.known.contains(name) {
            return Err(DescriptorError::new(DescriptorErrorKind::UnknownOption(
                name.to_string(),
            )));
        }
        Ok(())
    }
}

/// A normalized transformation request plus its digest.
///
/// Two descriptors are equal exactly when their canonical serializations
/// are byte-identical.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use verso_core::{Descriptor, OptionPolicy, RawOptions};
///
/// let raw = RawOptions::from_json(json!({"resize": "100x100", "format": "webp"})).unwrap();
/// let descriptor = Descriptor::normalize(raw, &OptionPolicy::lenient()).unwrap();
/// assert_eq!(descriptor.canonical(), r#"{"format":"webp","resize":"100x100"}"#);
///
/// let built = Descriptor::builder().format("webp").resize(100, 100).build_lenient().unwrap();
/// assert_eq!(built.digest(), descriptor.digest());
/// ```
#[derive(Debug, Clone, Getters)]
pub struct Descriptor {
    options: BTreeMap<String, Value>,
    canonical: String,
    digest: DescriptorDigest,
}

impl PartialEq for Descriptor {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Descriptor {}

impl std::hash::Hash for Descriptor {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl Descriptor {
    /// Normalize raw options under `policy`.
    ///
    /// # Errors
    ///
    /// Returns a [`DescriptorError`] if an option name is blank or unknown
    /// under a strict policy, or if an option name or a nested object key
    /// appears twice after trimming.
    pub fn normalize(raw: RawOptions, policy: &OptionPolicy) -> Result<Self, DescriptorError> {
        let mut options = BTreeMap::new();
        for (name, value) in raw.0 {
            let name = name.trim();
            if name.is_empty() {
                return Err(DescriptorError::new(DescriptorErrorKind::BlankOption));
            }
            policy.check(name)?;
            let Some(value) = normalize_value(name, value)? else {
                continue;
            };
            if options.insert(name.to_string(), value).is_some() {
                return Err(DescriptorError::new(DescriptorErrorKind::InvalidValue {
                    option: name.to_string(),
                    reason: "given more than once".to_string(),
                }));
            }
        }

        let mut canonical = String::new();
        write_object(&mut canonical, options.iter());
        let digest = DescriptorDigest::of_canonical(&canonical);

        Ok(Self {
            options,
            canonical,
            digest,
        })
    }

    /// The identity descriptor `{}`.
    pub fn empty() -> Self {
        let canonical = "{}".to_string();
        let digest = DescriptorDigest::of_canonical(&canonical);
        Self {
            options: BTreeMap::new(),
            canonical,
            digest,
        }
    }

    /// Start a typed descriptor.
    pub fn builder() -> DescriptorBuilder {
        DescriptorBuilder::default()
    }

    /// Whether this is the identity descriptor.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Look up a normalized option.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Look up a string option.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }
}

/// Typed construction path for common options.
///
/// Produces exactly the descriptor the equivalent raw map would.
#[derive(Debug, Clone, Default)]
pub struct DescriptorBuilder {
    raw: RawOptions,
}

impl DescriptorBuilder {
    /// Resize to fit within `width`x`height`.
    pub fn resize(mut self, width: u32, height: u32) -> Self {
        self.raw.insert("resize", format!("{}x{}", width, height));
        self
    }

    /// Convert to `format` (e.g. `webp`, `mp4`).
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.raw.insert("format", format.into());
        self
    }

    /// Any other option, passed through to the transformer.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.raw.insert(name, value);
        self
    }

    /// Normalize under `policy`.
    ///
    /// # Errors
    ///
    /// See [`Descriptor::normalize`].
    pub fn build(self, policy: &OptionPolicy) -> Result<Descriptor, DescriptorError> {
        Descriptor::normalize(self.raw, policy)
    }

    /// Normalize under a lenient policy.
    ///
    /// # Errors
    ///
    /// See [`Descriptor::normalize`].
    pub fn build_lenient(self) -> Result<Descriptor, DescriptorError> {
        self.build(&OptionPolicy::lenient())
    }
}

fn normalize_value(option: &str, value: Value) -> Result<Option<Value>, DescriptorError> {
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(Value::String(s.trim().to_string())),
        Value::Number(n) => Some(Value::Number(normalize_number(n))),
        Value::Array(items) => {
            let mut normalized = Vec::with_capacity(items.len());
            for item in items {
                normalized.push(normalize_value(option, item)?.unwrap_or(Value::Null));
            }
            Some(Value::Array(normalized))
        }
        Value::Object(map) => {
            let mut normalized = Map::new();
            for (key, value) in map {
                let Some(value) = normalize_value(option, value)? else {
                    continue;
                };
                let key = key.trim();
                if normalized.insert(key.to_string(), value).is_some() {
                    return Err(DescriptorError::new(DescriptorErrorKind::InvalidValue {
                        option: option.to_string(),
                        reason: format!("key '{}' given more than once", key),
                    }));
                }
            }
            Some(Value::Object(normalized))
        }
        other => Some(other),
    })
}

fn normalize_number(n: Number) -> Number {
    if n.is_f64()
        && let Some(f) = n.as_f64()
        && f.fract() == 0.0
        && f >= i64::MIN as f64
        && f < i64::MAX as f64
    {
        return Number::from(f as i64);
    }
    n
}

fn write_object<'a>(out: &mut String, entries: impl Iterator<Item = (&'a String, &'a Value)>) {
    let mut sorted: Vec<_> = entries.collect();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    out.push('{');
    for (i, (key, value)) in sorted.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(out, key);
        out.push(':');
        write_value(out, value);
    }
    out.push('}');
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Object(map) => write_object(out, map.iter()),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::String(s) => write_string(out, s),
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push_str(&Value::String(s.to_string()).to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lenient(value: Value) -> Descriptor {
        Descriptor::normalize(RawOptions::from_json(value).unwrap(), &OptionPolicy::lenient())
            .unwrap()
    }

    #[test]
    fn nested_objects_are_sorted() {
        let d = lenient(json!({"filter": {"b": 1, "a": [2.0, " x "]}}));
        assert_eq!(d.canonical(), r#"{"filter":{"a":[2,"x"],"b":1}}"#);
    }

    #[test]
    fn null_options_are_unset() {
        let d = lenient(json!({"resize": null}));
        assert!(d.is_empty());
        assert_eq!(d.digest(), Descriptor::empty().digest());
    }

    #[test]
    fn fractional_numbers_survive() {
        let d = lenient(json!({"quality": 0.85}));
        assert_eq!(d.canonical(), r#"{"quality":0.85}"#);
    }

    #[test]
    fn trimmed_duplicate_names_are_rejected() {
        let raw: RawOptions = vec![("resize", "1x1"), (" resize ", "2x2")]
            .into_iter()
            .collect();
        let err = Descriptor::normalize(raw, &OptionPolicy::lenient()).unwrap_err();
        assert!(matches!(err.kind(), DescriptorErrorKind::InvalidValue { .. }));
    }

    #[test]
    fn non_object_json_is_rejected() {
        assert!(RawOptions::from_json(json!(["resize"])).is_err());
    }
}
