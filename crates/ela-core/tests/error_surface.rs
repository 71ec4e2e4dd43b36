use ela_core::errors::{ElaError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("dim", "5")
        .with_context("reason", "example")
}

#[test]
fn invalid_bounds_surface() {
    let err = ElaError::InvalidBounds(sample_info("bounds_order", "lower >= upper"));
    assert_eq!(err.info().code, "bounds_order");
    assert!(err.info().context.contains_key("dim"));
}

#[test]
fn insufficient_sample_surface() {
    let err = ElaError::InsufficientSample(sample_info("fdc_proportion", "too few rows"));
    assert_eq!(err.info().code, "fdc_proportion");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn optimization_diverged_surface() {
    let err = ElaError::OptimizationDiverged(sample_info("local_search", "all runs diverged"));
    assert_eq!(err.info().code, "local_search");
}

#[test]
fn invalid_parameter_shorthand_records_context() {
    let err = ElaError::invalid_parameter("sample_method", "method", "grid", "unknown method");
    let info = err.info();
    assert_eq!(info.context.get("parameter").map(String::as_str), Some("method"));
    assert_eq!(info.context.get("value").map(String::as_str), Some("grid"));
}

#[test]
fn display_includes_context_and_hint() {
    let info = ErrorInfo::new("E001", "problem")
        .with_context("index", "2")
        .with_hint("widen the box");
    let rendered = ElaError::InvalidBounds(info).to_string();
    assert!(rendered.starts_with("invalid bounds: problem (code: E001)"));
    assert!(rendered.contains("index=2"));
    assert!(rendered.contains("hint: widen the box"));
}

#[test]
fn errors_round_trip_json() {
    let err = ElaError::Serde(sample_info("S001", "schema mismatch"));
    let json = serde_json::to_string(&err).expect("serialize");
    let decoded: ElaError = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(decoded, err);
}
