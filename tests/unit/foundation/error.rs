use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FxError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FxError::compile("x")
            .to_string()
            .contains("program compile error:")
    );
    assert!(
        FxError::allocation("x")
            .to_string()
            .contains("allocation error:")
    );
    assert!(FxError::serde("x").to_string().contains("serialization error:"));
    assert!(FxError::WorkerTimeout(7).to_string().contains("request 7"));
}

#[test]
fn only_compile_and_allocation_are_fatal() {
    assert!(FxError::compile("x").is_fatal_to_layer());
    assert!(FxError::allocation("x").is_fatal_to_layer());
    assert!(!FxError::validation("x").is_fatal_to_layer());
    assert!(!FxError::WorkerTimeout(1).is_fatal_to_layer());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FxError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(FxError::from(e), FxError::Serde(_)));
}
