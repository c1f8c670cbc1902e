//! Commands that inspect options and configuration without touching a store.

use super::commands::OutputFormat;
use serde_json::Value;
use verso::{
    Descriptor, DescriptorError, DescriptorErrorKind, OptionPolicy, RawOptions,
    VersoConfig, VersoResult,
};

/// Parse `NAME=VALUE` arguments.
///
/// Values that parse as JSON (`80`, `true`, `[1,2]`) keep their type;
/// anything else is a string.
pub fn parse_options(args: &[String]) -> VersoResult<RawOptions> {
    let mut raw = RawOptions::new();
    for arg in args {
        let (name, value) = arg.split_once('=').ok_or_else(|| {
            DescriptorError::new(DescriptorErrorKind::InvalidValue {
                option: arg.clone(),
                reason: "expected NAME=VALUE".to_string(),
            })
        })?;
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_string()));
        raw.insert(name, value);
    }
    Ok(raw)
}

/// Print the canonical form and digest of `options`.
pub fn show_digest(
    config: &VersoConfig,
    options: &[String],
    strict: bool,
    format: OutputFormat,
) -> VersoResult<()> {
    let policy = if strict {
        config.descriptor.policy()
    } else {
        OptionPolicy::lenient()
    };
    let descriptor = Descriptor::normalize(parse_options(options)?, &policy)?;

    match format {
        OutputFormat::Human => {
            println!("Canonical: {}", descriptor.canonical());
            println!("Digest:    {}", descriptor.digest());
        }
        OutputFormat::Json => {
            let out = serde_json::json!({
                "canonical": descriptor.canonical(),
                "digest": descriptor.digest(),
            });
            println!("{}", to_pretty(&out)?);
        }
    }
    Ok(())
}

/// Print the merged configuration as JSON.
pub fn show_config(config: &VersoConfig) -> VersoResult<()> {
    println!("{}", to_pretty(config)?);
    Ok(())
}

fn to_pretty(value: &impl serde::Serialize) -> VersoResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn values_keep_json_types() {
        let raw = parse_options(&args(&["quality=80", "resize=100x100", "strip=true"])).unwrap();
        let expected = RawOptions::from_json(json!({
            "quality": 80,
            "resize": "100x100",
            "strip": true,
        }))
        .unwrap();

        let policy = OptionPolicy::lenient();
        assert_eq!(
            Descriptor::normalize(raw, &policy).unwrap(),
            Descriptor::normalize(expected, &policy).unwrap()
        );
    }

    #[test]
    fn unrepresentable_output_is_a_json_error() {
        let mut keyed = std::collections::HashMap::new();
        keyed.insert(vec![1u8], "byte-string keys");

        let err = to_pretty(&keyed).unwrap_err();
        assert!(matches!(err.kind(), verso::VersoErrorKind::Json(_)));
    }

    #[test]
    fn missing_equals_is_rejected() {
        assert!(parse_options(&args(&["resize"])).is_err());
    }

    #[test]
    fn value_may_contain_equals() {
        let raw = parse_options(&args(&["ffmpeg_opts=-vf scale=320:-1"])).unwrap();
        let descriptor = Descriptor::normalize(raw, &OptionPolicy::lenient()).unwrap();
        assert_eq!(descriptor.get_str("ffmpeg_opts"), Some("-vf scale=320:-1"));
    }
}
