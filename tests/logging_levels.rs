use screengrab::logging::{cleanup_old_logs, filter_directive, LogLevel};

#[test]
fn parses_every_level_case_insensitively() {
    let cases = [
        ("off", LogLevel::Off),
        ("ERROR", LogLevel::Error),
        ("Warn", LogLevel::Warn),
        ("warning", LogLevel::Warn),
        ("info", LogLevel::Info),
        ("Debug", LogLevel::Debug),
        ("trace", LogLevel::Trace),
    ];
    for (raw, expected) in cases {
        assert_eq!(raw.parse::<LogLevel>(), Ok(expected), "{}", raw);
    }
    assert!("verbose".parse::<LogLevel>().is_err());
}

#[test]
fn default_level_matches_settings_default() {
    let settings = screengrab::CaptureSettings::default();
    assert_eq!(settings.log_level.parse::<LogLevel>(), Ok(LogLevel::default()));
}

#[test]
fn directive_is_scoped_to_the_crate() {
    assert_eq!(filter_directive(LogLevel::Info), "screengrab=info");
    assert_eq!(filter_directive(LogLevel::Trace), "screengrab=trace");
}

#[test]
fn cleanup_keeps_fresh_logs() {
    let dir = std::env::temp_dir().join(format!("screengrab_logs_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("screengrab.log.2026-01-01"), "x").unwrap();
    std::fs::write(dir.join("notes.txt"), "x").unwrap();

    assert_eq!(cleanup_old_logs(&dir, 14).unwrap(), 0);
    assert!(dir.join("screengrab.log.2026-01-01").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn off_maps_to_an_off_filter() {
    use tracing::level_filters::LevelFilter;
    assert_eq!(LogLevel::Off.as_filter(), LevelFilter::OFF);
    assert_eq!(LogLevel::Warn.as_filter(), LevelFilter::WARN);
}
