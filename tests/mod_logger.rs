use nexus_column::logger::{METRICS_TARGET, configure_logging, configure_logging_with_dev};

// One test owns the global logger for this binary.
#[test]
fn rolling_files_receive_app_and_metrics_lines() {
    let dir = tempfile::tempdir().unwrap();
    configure_logging(Some(dir.path()), Some("debug"), Some(2)).unwrap();
    log::info!("application line");
    log::warn!(target: METRICS_TARGET, "metrics line");

    let app = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    let metrics = std::fs::read_to_string(dir.path().join("metrics.log")).unwrap();
    assert!(app.contains("application line"));
    assert!(!app.contains("metrics line"));
    assert!(metrics.contains("metrics line"));

    // Reconfiguring swaps the handle instead of failing.
    let dev_dir = tempfile::tempdir().unwrap();
    configure_logging_with_dev(Some(dev_dir.path()), Some("info"), None, true).unwrap();
    nexus_column::dev6!("{{\"bench\":\"marker\"}}");
    let dev = std::fs::read_to_string(dev_dir.path().join("dev6.log")).unwrap();
    assert!(dev.contains("marker"));
}
