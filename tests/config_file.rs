use std::io::Write;

use printer_sim::ConfigError;
use printer_sim::config::{load_config, load_config_or_default};

#[test]
fn test_load_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[server]
port = 8080
static_dir = "public"

[simulation]
printer_name = "Voron"
tick_interval_ms = 250
homing_delay_ms = 2000
"#
    )
    .unwrap();

    let config = load_config(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.static_dir.as_deref(), Some(std::path::Path::new("public")));
    assert_eq!(config.simulation.printer_name.as_deref(), Some("Voron"));
    assert_eq!(config.simulation.tick_interval().as_millis(), 250);
    assert_eq!(config.simulation.homing_delay().as_millis(), 2000);
    assert_eq!(config.simulation.aux_sensor_temp, 44.0);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let path = path.to_str().unwrap();

    assert!(matches!(load_config(path), Err(ConfigError::Io(_))));
    let config = load_config_or_default(path).unwrap();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.simulation.homing_delay_ms, 5000);
}

#[test]
fn test_invalid_values_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nport = 0").unwrap();
    assert!(matches!(
        load_config(file.path().to_str().unwrap()),
        Err(ConfigError::Invalid(_))
    ));
}
