//! Daemon settings read from `shellyeve.toml`.
//!
//! The file is optional and every field falls back to a default: a single
//! Plug S, readings every two seconds. `SHELLYEVE_INTERVAL_MS`,
//! `SHELLYEVE_LOG` and `RUST_LOG` win over the file.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use shellyeve_adapter_virtual::{DeviceProfile, OutletLayout};

/// Everything `shellyeved` reads at startup.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated readings settings.
    pub simulation: SimulationConfig,
    /// Virtual devices to expose.
    pub devices: Vec<DeviceConfig>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Simulation configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Milliseconds between two simulated readings.
    pub interval_ms: u64,
    /// Steps between two simulated relay toggles; `0` disables toggling.
    pub toggle_every: u32,
}

/// One virtual device.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Device id (e.g. `A4CF12F45`).
    pub id: String,
    /// Shelly model.
    pub profile: DeviceProfile,
    /// Accessory name; defaults to `"<type> <id> #<relay>"`.
    #[serde(default)]
    pub name: Option<String>,
    /// Outlets to expose; defaults to one per relay.
    #[serde(default)]
    pub outlets: Option<Vec<OutletConfig>>,
}

/// One outlet accessory on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OutletConfig {
    pub relay: u8,
    #[serde(default)]
    pub power_meter: Option<u8>,
}

impl Config {
    /// Load configuration from `shellyeve.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("shellyeve.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SHELLYEVE_INTERVAL_MS") {
            if let Ok(interval_ms) = val.parse() {
                self.simulation.interval_ms = interval_ms;
            }
        }
        if let Ok(val) = std::env::var("SHELLYEVE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.interval_ms == 0 {
            return Err(ConfigError::Validation("interval_ms must be non-zero".to_string()));
        }
        let mut ids = HashSet::new();
        for device in &self.devices {
            if device.id.trim().is_empty() {
                return Err(ConfigError::Validation("device id must not be empty".to_string()));
            }
            if !ids.insert(device.id.as_str()) {
                return Err(ConfigError::Validation(format!("device {} is listed twice", device.id)));
            }
            device.validate()?;
        }
        Ok(())
    }

    /// Delay between two simulated readings.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.simulation.interval_ms)
    }
}

impl DeviceConfig {
    /// Outlets to build, falling back to the profile's layout.
    #[must_use]
    pub fn outlets(&self) -> Vec<OutletConfig> {
        match &self.outlets {
            Some(outlets) => outlets.clone(),
            None => self
                .profile
                .default_outlets()
                .into_iter()
                .map(|OutletLayout { relay, power_meter }| OutletConfig { relay, power_meter })
                .collect(),
        }
    }

    /// Accessory name for the outlet on `relay`, if a name is configured.
    #[must_use]
    pub fn accessory_name(&self, relay: u8) -> Option<String> {
        let name = self.name.as_ref()?;
        if self.outlets().len() > 1 {
            Some(format!("{name} #{relay}"))
        } else {
            Some(name.clone())
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ConfigError::Validation(format!("device {} has an empty name", self.id)));
        }
        let mut relays = HashSet::new();
        for outlet in self.outlets() {
            if outlet.relay >= self.profile.relay_count() {
                return Err(ConfigError::Validation(format!(
                    "device {} ({}) has no relay {}",
                    self.id, self.profile, outlet.relay
                )));
            }
            if outlet
                .power_meter
                .is_some_and(|meter| meter >= self.profile.power_meter_count())
            {
                return Err(ConfigError::Validation(format!(
                    "device {} ({}) has no power meter {}",
                    self.id,
                    self.profile,
                    outlet.power_meter.unwrap_or_default()
                )));
            }
            if !relays.insert(outlet.relay) {
                return Err(ConfigError::Validation(format!(
                    "device {} lists relay {} twice",
                    self.id, outlet.relay
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            simulation: SimulationConfig::default(),
            devices: default_devices(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "shellyeved=info,shellyeve_app=info,shellyeve_adapter_virtual=info".to_string(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2_000,
            toggle_every: 15,
        }
    }
}

fn default_devices() -> Vec<DeviceConfig> {
    vec![DeviceConfig {
        id: "A4CF12F45".to_string(),
        profile: DeviceProfile::PlugS,
        name: None,
        outlets: None,
    }]
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file is not valid TOML for [`Config`].
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// The file exists but could not be read.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// The settings parse but describe an impossible setup.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.simulation.interval_ms, 2_000);
        assert_eq!(config.interval(), Duration::from_secs(2));
        assert_eq!(config.simulation.toggle_every, 15);
        assert_eq!(config.devices.len(), 1);
        assert_eq!(config.devices[0].profile, DeviceProfile::PlugS);
        assert!(config.logging.filter.contains("shellyeved=info"));
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [logging]
            filter = 'debug'

            [simulation]
            interval_ms = 500
            toggle_every = 0

            [[devices]]
            id = 'B0A7321'
            profile = '2.5'
            name = 'Kitchen'

            [[devices.outlets]]
            relay = 1
            power_meter = 1

            [[devices]]
            id = 'C1'
            profile = 'em'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.simulation.interval_ms, 500);
        assert_eq!(config.simulation.toggle_every, 0);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].profile, DeviceProfile::TwoFive);
        assert_eq!(
            config.devices[0].outlets(),
            vec![OutletConfig {
                relay: 1,
                power_meter: Some(1)
            }]
        );
        assert_eq!(config.devices[0].accessory_name(1).as_deref(), Some("Kitchen"));
        assert!(config.devices[1].outlets().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_default_outlets_to_profile_layout() {
        let device = DeviceConfig {
            id: "B1".to_string(),
            profile: DeviceProfile::TwoFive,
            name: Some("Hall".to_string()),
            outlets: None,
        };
        assert_eq!(device.outlets().len(), 2);
        assert_eq!(device.accessory_name(1).as_deref(), Some("Hall #1"));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.simulation.interval_ms, 2_000);
    }

    #[test]
    fn should_reject_zero_interval() {
        let mut config = Config::default();
        config.simulation.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_duplicate_device_ids() {
        let mut config = Config::default();
        config.devices = vec![default_devices()[0].clone(), default_devices()[0].clone()];
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_relay_the_profile_lacks() {
        let toml = "
            [[devices]]
            id = 'A1'
            profile = 'plug-s'
            outlets = [{ relay = 1 }]
        ";
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid configuration: device A1 (plug-s) has no relay 1");
    }

    #[test]
    fn should_reject_power_meter_the_profile_lacks() {
        let toml = "
            [[devices]]
            id = 'A1'
            profile = '1pm'
            outlets = [{ relay = 0, power_meter = 1 }]
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_unknown_profile() {
        let toml = "
            [[devices]]
            id = 'A1'
            profile = 'dimmer'
        ";
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
