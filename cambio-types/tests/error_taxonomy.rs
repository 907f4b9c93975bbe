use cambio_types::{CambioError, Entity, ErrorKind, FailureReport, RetryPolicy};

fn e(id: &str) -> Entity {
    Entity::new(id).expect("valid test entity")
}

#[test]
fn only_transient_and_opted_in_rate_limits_are_retryable() {
    for kind in ErrorKind::ALL {
        let expected_without = kind == ErrorKind::TransientNetwork;
        let expected_with = matches!(kind, ErrorKind::TransientNetwork | ErrorKind::RateLimited);
        assert_eq!(kind.is_retryable(false), expected_without, "{kind}");
        assert_eq!(kind.is_retryable(true), expected_with, "{kind}");
    }
}

#[test]
fn retry_allowance_respects_attempt_cap() {
    let policy = RetryPolicy::default().with_backoff(true).with_max_attempts(3);
    assert!(policy.allows_retry(ErrorKind::RateLimited, 1));
    assert!(policy.allows_retry(ErrorKind::RateLimited, 2));
    assert!(!policy.allows_retry(ErrorKind::RateLimited, 3));
    assert!(!policy.allows_retry(ErrorKind::InvalidCredential, 1));
}

#[test]
fn error_kind_serde_uses_variant_names() {
    let json = serde_json::to_string(&ErrorKind::InvalidCredential).unwrap();
    assert_eq!(json, "\"InvalidCredential\"");
    let back: ErrorKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ErrorKind::InvalidCredential);
}

#[test]
fn failure_report_groups_by_kind_in_first_seen_order() {
    let mut report = FailureReport::new();
    report.record(ErrorKind::InvalidCredential, e("AAA"));
    report.record(ErrorKind::NoData, e("BBB"));
    report.record(ErrorKind::InvalidCredential, e("CCC"));

    assert_eq!(report.entries().len(), 2);
    assert_eq!(report.entity_count(), 3);
    let first = &report.entries()[0];
    assert_eq!(first.kind, ErrorKind::InvalidCredential);
    assert_eq!(first.entities, vec![e("AAA"), e("CCC")]);
    assert_eq!(report.kind_of(&e("BBB")), Some(ErrorKind::NoData));
    assert!(!report.contains(&e("ZZZ")));
}

#[test]
fn summary_lines_are_one_per_kind() {
    let mut report = FailureReport::new();
    for id in ["A1", "A2", "A3", "A4", "A5"] {
        report.record(ErrorKind::InvalidCredential, e(id));
    }
    let lines = report.summary_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("invalid_credential (5 entities)"));
}

#[test]
fn entity_deserialization_validates() {
    let ok: Entity = serde_json::from_str("\"msft\"").unwrap();
    assert_eq!(ok.as_str(), "MSFT");
    assert!(serde_json::from_str::<Entity>("\"\"").is_err());
}

#[test]
fn connector_errors_name_the_provider() {
    let err = CambioError::connector("fmp", "unexpected redirect");
    assert_eq!(err.to_string(), "fmp failed: unexpected redirect");
    assert!(!err.is_configuration());
    assert!(CambioError::Config("missing key".into()).is_configuration());
}
