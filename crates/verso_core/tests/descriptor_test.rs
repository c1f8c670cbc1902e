use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use verso_core::{Descriptor, OptionPolicy, RawOptions};
use verso_error::DescriptorErrorKind;

#[test]
fn construction_path_does_not_affect_digest() {
    let from_json = Descriptor::normalize(
        RawOptions::from_json(json!({"resize": "100x100"})).unwrap(),
        &OptionPolicy::lenient(),
    )
    .unwrap();

    let mut map = HashMap::new();
    map.insert("resize".to_string(), json!("100x100"));
    let from_map =
        Descriptor::normalize(map.into_iter().collect(), &OptionPolicy::lenient()).unwrap();

    let from_builder = Descriptor::builder().resize(100, 100).build_lenient().unwrap();

    assert_eq!(from_json.digest(), from_map.digest());
    assert_eq!(from_json.digest(), from_builder.digest());
}

#[test]
fn option_order_does_not_affect_digest() {
    let a: RawOptions = vec![("format", "mp4"), ("resize", "640x360"), ("ffmpeg_opts", "-an")]
        .into_iter()
        .collect();
    let b: RawOptions = vec![("ffmpeg_opts", "-an"), ("resize", "640x360"), ("format", "mp4")]
        .into_iter()
        .collect();

    let a = Descriptor::normalize(a, &OptionPolicy::lenient()).unwrap();
    let b = Descriptor::normalize(b, &OptionPolicy::lenient()).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.digest(), b.digest());
}

#[test]
fn digest_is_stable_across_runs() {
    // Pinned value: changing canonicalization or hashing would orphan every
    // stored variant, so this must only ever change deliberately.
    let d = Descriptor::builder().resize(100, 100).build_lenient().unwrap();
    assert_eq!(d.canonical(), r#"{"resize":"100x100"}"#);
    assert_eq!(
        d.digest().as_str(),
        "dfff6b8c09a7d1f5983f4bc16891221241bcec2c3639c063369c585652a74f5c"
    );
}

#[test]
fn value_normalization_collapses_equivalent_values() {
    let a = Descriptor::normalize(
        RawOptions::from_json(json!({"width": 100.0, "format": " webp "})).unwrap(),
        &OptionPolicy::lenient(),
    )
    .unwrap();
    let b = Descriptor::normalize(
        RawOptions::from_json(json!({"width": 100, "format": "webp"})).unwrap(),
        &OptionPolicy::lenient(),
    )
    .unwrap();
    assert_eq!(a.digest(), b.digest());
}

#[test]
fn empty_descriptor_is_distinct() {
    let empty = Descriptor::normalize(RawOptions::new(), &OptionPolicy::lenient()).unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.canonical(), "{}");
    assert_eq!(empty, Descriptor::empty());

    let resized = Descriptor::builder().resize(1, 1).build_lenient().unwrap();
    assert_ne!(empty.digest(), resized.digest());

    let blank_string = Descriptor::builder().option("format", "").build_lenient().unwrap();
    assert_ne!(empty.digest(), blank_string.digest());
}

#[test]
fn strict_policy_rejects_unknown_options() {
    let policy = OptionPolicy::strict(["resize", "format"]);

    let ok = Descriptor::builder().resize(10, 10).build(&policy);
    assert!(ok.is_ok());

    let err = Descriptor::builder()
        .resize(10, 10)
        .option("ffmpeg_opts", "-vf reverse")
        .build(&policy)
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &DescriptorErrorKind::UnknownOption("ffmpeg_opts".to_string())
    );
}

#[test]
fn lenient_policy_passes_opaque_options_through() {
    let mut raw = BTreeMap::new();
    raw.insert("ffmpeg_opts".to_string(), json!("-vf setpts=2.0*PTS"));
    let d = Descriptor::normalize(raw.into_iter().collect(), &OptionPolicy::lenient()).unwrap();
    assert_eq!(d.get_str("ffmpeg_opts"), Some("-vf setpts=2.0*PTS"));
}

#[test]
fn blank_option_names_are_rejected() {
    let raw: RawOptions = vec![("  ", "x")].into_iter().collect();
    let err = Descriptor::normalize(raw, &OptionPolicy::lenient()).unwrap_err();
    assert_eq!(err.kind(), &DescriptorErrorKind::BlankOption);
}

#[test]
fn nested_keys_colliding_after_trim_are_rejected() {
    let raw = RawOptions::from_json(json!({"crop": {" x": 1, "x": 2}})).unwrap();
    let err = Descriptor::normalize(raw, &OptionPolicy::lenient()).unwrap_err();
    match err.kind() {
        DescriptorErrorKind::InvalidValue { option, reason } => {
            assert_eq!(option, "crop");
            assert!(reason.contains("'x'"));
        }
        other => panic!("expected invalid value, got {other}"),
    }

    let padded = RawOptions::from_json(json!({"crop": {" x ": 1, "y": 2}})).unwrap();
    let plain = RawOptions::from_json(json!({"crop": {"x": 1, "y": 2}})).unwrap();
    let policy = OptionPolicy::lenient();
    assert_eq!(
        Descriptor::normalize(padded, &policy).unwrap().digest(),
        Descriptor::normalize(plain, &policy).unwrap().digest()
    );
}
