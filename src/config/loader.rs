//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::schema::{BridgeConfig, BrokerConfig, Mapping};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Map file layouts accepted for `.json` configs: a bare list of mappings or
/// an object carrying broker settings next to the mappings.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonLayout {
    Mappings(Vec<Mapping>),
    Full {
        #[serde(default)]
        broker: BrokerConfig,
        #[serde(default)]
        mappings: Vec<Mapping>,
    },
}

/// Load and validate configuration from a TOML (or `.json`) file.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let config = if is_json {
        parse_json(&content)?
    } else {
        parse_toml(&content)?
    };

    tracing::debug!(
        path = %path.display(),
        mappings = config.mappings.len(),
        "Configuration file parsed"
    );
    Ok(config)
}

/// Parse and validate a TOML configuration document.
pub fn parse_toml(content: &str) -> Result<BridgeConfig, ConfigError> {
    let config: BridgeConfig = toml::from_str(content)?;
    finish(config)
}

/// `car_length` assumed for JSON map entries that leave it out.
pub const JSON_DEFAULT_CAR_LENGTH: f64 = 4.5;

/// Parse and validate a JSON map document.
///
/// Map file entries without `car_length` get [`JSON_DEFAULT_CAR_LENGTH`],
/// so speed tracking is on unless an entry turns it off.
pub fn parse_json(content: &str) -> Result<BridgeConfig, ConfigError> {
    let mut document: Value = serde_json::from_str(content)?;
    fill_json_defaults(&mut document);

    let config = match serde_json::from_value::<JsonLayout>(document)? {
        JsonLayout::Mappings(mappings) => BridgeConfig {
            mappings,
            ..BridgeConfig::default()
        },
        JsonLayout::Full { broker, mappings } => BridgeConfig {
            broker,
            mappings,
            ..BridgeConfig::default()
        },
    };
    finish(config)
}

fn fill_json_defaults(document: &mut Value) {
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(fields) => match fields.get_mut("mappings") {
            Some(Value::Array(entries)) => entries,
            _ => return,
        },
        _ => return,
    };

    for entry in entries.iter_mut().filter_map(Value::as_object_mut) {
        entry
            .entry("car_length")
            .or_insert_with(|| Value::from(JSON_DEFAULT_CAR_LENGTH));
    }
}

fn finish(mut config: BridgeConfig) -> Result<BridgeConfig, ConfigError> {
    name_unnamed(&mut config.mappings);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Give every mapping without a trigger name a positional `SensorN` name.
fn name_unnamed(mappings: &mut [Mapping]) {
    for (i, mapping) in mappings.iter_mut().enumerate() {
        if mapping.trigger_name.trim().is_empty() {
            mapping.trigger_name = format!("Sensor{}", i + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SpeedUnits;
    use std::io::Write;

    const SAMPLE: &str = r#"
        [broker]
        address = "mqtt.local"
        port = 1884

        [udp]
        enabled = false

        [[mappings]]
        trigger_name = "Gate1"
        topic_pattern = "Advantech/+/data"
        trigger_value = "1"
        timeout = 2.5
        udp_ip = "192.168.1.50"
        udp_port = 5005
        udp_message = "GATE1 {speed}"
        car_length = 4.5
        speed_units = "km/h"

        [[mappings]]
        topic_pattern = "doors/#"
        udp_ip = "192.168.1.51"
        udp_port = 5006
    "#;

    #[test]
    fn test_parse_toml() {
        let config = parse_toml(SAMPLE).unwrap();
        assert_eq!(config.broker.address, "mqtt.local");
        assert_eq!(config.broker.port, 1884);
        assert!(!config.udp.enabled);
        assert_eq!(config.mappings.len(), 2);

        let gate = &config.mappings[0];
        assert_eq!(gate.trigger_value, "1");
        assert_eq!(gate.timeout, 2.5);
        assert_eq!(gate.speed_units, SpeedUnits::Kmh);

        assert_eq!(config.mappings[1].trigger_name, "Sensor2");
    }

    #[test]
    fn test_parse_json_object_layout() {
        let json = r#"{
            "broker": {"address": "10.0.0.2", "port": 1883, "auto_connect": false},
            "mappings": [
                {"trigger_name": "Lane", "topic": "lane/1", "trigger_value": "1",
                 "timeout": 1.0, "udp_ip": "10.0.0.9", "udp_port": 4000,
                 "udp_message": "{payload}", "udp_delay": 0.5, "car_length": 0.0,
                 "speed_units": "mph"}
            ]
        }"#;

        let config = parse_json(json).unwrap();
        assert!(!config.broker.auto_connect);
        assert_eq!(config.mappings[0].topic_pattern, "lane/1");
        assert_eq!(config.mappings[0].udp_delay, 0.5);
    }

    #[test]
    fn test_parse_json_list_layout() {
        let json = r#"[{"topic": "a/b", "udp_ip": "127.0.0.1", "udp_port": 9000}]"#;
        let config = parse_json(json).unwrap();
        assert_eq!(config.broker.address, "localhost");
        assert_eq!(config.mappings[0].trigger_name, "Sensor1");
        assert_eq!(config.mappings[0].timeout, 1.0);
    }

    #[test]
    fn test_json_entries_track_speed_by_default() {
        let json = r#"[{"topic": "lane/1", "udp_ip": "127.0.0.1", "udp_port": 9000, "udp_message": "{speed}"}]"#;
        let mapping = &parse_json(json).unwrap().mappings[0];
        assert_eq!(mapping.car_length, JSON_DEFAULT_CAR_LENGTH);
        assert!(mapping.tracks_speed());

        let json = r#"{"mappings": [
            {"topic": "a", "udp_ip": "127.0.0.1", "udp_port": 1},
            {"topic": "b", "udp_ip": "127.0.0.1", "udp_port": 2, "car_length": 0.0}
        ]}"#;
        let config = parse_json(json).unwrap();
        assert_eq!(config.mappings[0].car_length, 4.5);
        assert!(!config.mappings[1].tracks_speed());
    }

    #[test]
    fn test_toml_entries_do_not_track_speed_by_default() {
        let config = parse_toml(SAMPLE).unwrap();
        assert_eq!(config.mappings[1].car_length, 0.0);
    }

    #[test]
    fn test_validation_failure_is_reported() {
        let toml = r#"
            [[mappings]]
            trigger_name = "A"
            topic_pattern = "x"
            udp_ip = "127.0.0.1"
            udp_port = 1

            [[mappings]]
            trigger_name = "A"
            topic_pattern = "y"
            udp_ip = "127.0.0.1"
            udp_port = 2
        "#;

        let err = parse_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(err.to_string(), "Validation failed: duplicate trigger name 'A'");
    }

    #[test]
    fn test_load_config_by_extension() {
        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        toml_file.write_all(SAMPLE.as_bytes()).unwrap();
        assert_eq!(load_config(toml_file.path()).unwrap().mappings.len(), 2);

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        json_file
            .write_all(br#"[{"topic": "t", "udp_ip": "127.0.0.1", "udp_port": 1}]"#)
            .unwrap();
        assert_eq!(load_config(json_file.path()).unwrap().mappings.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/bridge.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
