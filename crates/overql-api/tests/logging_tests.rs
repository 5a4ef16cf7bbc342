// Global subscriber installation; kept in its own test binary

use overql::logging::{LogConfig, LogFormat};
use overql::Error;

#[test]
fn test_init_to_file_then_reject_second_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("overql.log");

    let guard = LogConfig::debug()
        .with_file(&path)
        .with_format(LogFormat::Compact)
        .init()
        .unwrap();
    assert!(guard.is_some());

    tracing::info!(target: "overql", "logging initialized");

    let second = LogConfig::info().init();
    assert!(matches!(second, Err(Error::InvalidStateTransition(_))));

    drop(guard);
}
