use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
  #[error("invalid value {value:?} for {key}: {reason}")]
  Invalid {
    key: &'static str,
    value: String,
    reason: String,
  },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServiceConfig {
  pub capture_interval_ms: u64,
  pub quality: u8,
  pub max_screenshots: usize,
  pub enable_mock: bool,
  pub host: String,
  pub port: u16,
  pub log_level: String,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      capture_interval_ms: 3000,
      quality: 85,
      max_screenshots: 50,
      enable_mock: false,
      host: "0.0.0.0".to_string(),
      port: 8000,
      log_level: "info".to_string(),
    }
  }
}

impl ServiceConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Builds a config from an arbitrary key lookup. Missing or empty keys keep
  /// their defaults.
  pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut config = Self::default();

    if let Some(raw) = get("CAPTURE_INTERVAL") {
      config.capture_interval_ms = parse_at_least("CAPTURE_INTERVAL", &raw, 1)?;
    }
    if let Some(raw) = get("SCREENSHOT_QUALITY") {
      let quality: u64 = parse_at_least("SCREENSHOT_QUALITY", &raw, 1)?;
      if quality > 100 {
        return Err(invalid("SCREENSHOT_QUALITY", &raw, "must be between 1 and 100"));
      }
      config.quality = quality as u8;
    }
    if let Some(raw) = get("MAX_SCREENSHOTS") {
      config.max_screenshots = parse_at_least("MAX_SCREENSHOTS", &raw, 1)? as usize;
    }
    if let Some(raw) = get("ENABLE_MOCK") {
      config.enable_mock = raw.eq_ignore_ascii_case("true");
    }
    if let Some(raw) = get("HOST") {
      config.host = raw;
    }
    if let Some(raw) = get("PORT") {
      config.port = raw
        .parse()
        .map_err(|err: std::num::ParseIntError| invalid("PORT", &raw, &err.to_string()))?;
    }
    if let Some(raw) = get("LOG_LEVEL") {
      config.log_level = raw;
    }

    Ok(config)
  }

  pub fn capture_interval(&self) -> Duration {
    Duration::from_millis(self.capture_interval_ms)
  }

  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }
}

fn parse_at_least(key: &'static str, raw: &str, min: u64) -> Result<u64, ConfigError> {
  let value: u64 = raw
    .parse()
    .map_err(|err: std::num::ParseIntError| invalid(key, raw, &err.to_string()))?;
  if value < min {
    return Err(invalid(key, raw, &format!("must be at least {min}")));
  }
  Ok(value)
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
  ConfigError::Invalid {
    key,
    value: value.to_string(),
    reason: reason.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn config_from(pairs: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
    let map: HashMap<String, String> = pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    ServiceConfig::from_lookup(|key| map.get(key).cloned())
  }

  #[test]
  fn defaults_when_nothing_set() {
    let config = config_from(&[]).expect("empty env should parse");
    assert_eq!(config, ServiceConfig::default());
    assert_eq!(config.capture_interval(), Duration::from_millis(3000));
    assert_eq!(config.bind_addr(), "0.0.0.0:8000");
  }

  #[test]
  fn reads_every_key() {
    let config = config_from(&[
      ("CAPTURE_INTERVAL", "250"),
      ("SCREENSHOT_QUALITY", "60"),
      ("MAX_SCREENSHOTS", "5"),
      ("ENABLE_MOCK", "TRUE"),
      ("HOST", "127.0.0.1"),
      ("PORT", "9100"),
      ("LOG_LEVEL", "debug"),
    ])
    .expect("valid env should parse");

    assert_eq!(config.capture_interval_ms, 250);
    assert_eq!(config.quality, 60);
    assert_eq!(config.max_screenshots, 5);
    assert!(config.enable_mock);
    assert_eq!(config.bind_addr(), "127.0.0.1:9100");
    assert_eq!(config.log_level, "debug");
  }

  #[test]
  fn mock_flag_only_accepts_true() {
    assert!(!config_from(&[("ENABLE_MOCK", "1")]).unwrap().enable_mock);
    assert!(!config_from(&[("ENABLE_MOCK", "yes")]).unwrap().enable_mock);
    assert!(config_from(&[("ENABLE_MOCK", "True")]).unwrap().enable_mock);
  }

  #[test]
  fn empty_values_keep_defaults() {
    let config = config_from(&[("PORT", ""), ("SCREENSHOT_QUALITY", "  ")]).unwrap();
    assert_eq!(config.port, 8000);
    assert_eq!(config.quality, 85);
  }

  #[test]
  fn rejects_out_of_range_quality() {
    let err = config_from(&[("SCREENSHOT_QUALITY", "101")]).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "SCREENSHOT_QUALITY", .. }));
    assert!(config_from(&[("SCREENSHOT_QUALITY", "0")]).is_err());
  }

  #[test]
  fn rejects_zero_capacity_and_interval() {
    assert!(config_from(&[("MAX_SCREENSHOTS", "0")]).is_err());
    assert!(config_from(&[("CAPTURE_INTERVAL", "0")]).is_err());
  }

  #[test]
  fn rejects_non_numeric() {
    let err = config_from(&[("PORT", "eighty")]).unwrap_err();
    assert!(err.to_string().contains("PORT"));
    assert!(config_from(&[("CAPTURE_INTERVAL", "3s")]).is_err());
  }
}
