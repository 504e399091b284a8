// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_markers_are_permanent() {
    let rules = FailureRules::default();

    assert!(rules.is_permanent("could not locate required auxiliary data", "scene"));
    assert!(rules.is_permanent("get_aux: unable to locate required auxiliary data", "scene"));
    assert!(rules.is_permanent("no coverage of input by auxiliary data", "scene"));
    assert!(rules.is_permanent("upload: permission denied", "scene"));
}

#[test]
fn other_messages_are_transient() {
    let rules = FailureRules::default();

    assert!(!rules.is_permanent("connection reset", "S1A_IW_GRDH_20240101"));
    assert!(!rules.is_permanent("timeout waiting for host", "S1A_IW_GRDH_20240101"));
}

#[test]
fn unsupported_format_matches_scene_name() {
    let rules = FailureRules::default();

    assert!(rules.is_permanent("anything", "S1A_IW_RAW_20240101"));
    assert!(!rules.is_permanent("anything", "S1A_IW_GRDH_20240101"));
}

#[test]
fn markers_are_configurable() {
    let rules: FailureRules = toml::from_str(
        r#"
        permanent_markers = ["disk quota exceeded"]
        unsupported_formats = []
        "#,
    )
    .unwrap();

    assert!(rules.is_permanent("write failed: disk quota exceeded", "scene"));
    // the built-in defaults are replaced, not merged
    assert!(!rules.is_permanent("permission denied", "scene"));
    assert!(!rules.is_permanent("anything", "S1A_IW_RAW_20240101"));
}

#[test]
fn omitted_fields_keep_the_defaults() {
    let rules: FailureRules = toml::from_str("").unwrap();
    assert_eq!(rules, FailureRules::default());
}
