//! Chain selection settings
//!
//! Loaded from a JSON file or built from command-line flags. Either the
//! explicit `network` name or one of the `testnet`/`regtest` switches picks
//! the network, and main is the default. A name that disagrees with a set
//! switch is rejected. Command-line values replace file values through
//! [`ChainConfig::apply_overrides`].

use crate::chainparams::ChainParams;
use crate::network::NetworkType;
use crate::registry::ChainRegistry;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

fn flag_name(network: NetworkType) -> &'static str {
    match network {
        NetworkType::Test => "testnet",
        other => other.as_str(),
    }
}

/// Which network to run on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Network name (`main`, `test` or `regtest`)
    pub network: Option<String>,
    /// Use the public test network
    pub testnet: bool,
    /// Use the regression test network
    pub regtest: bool,
}

impl ChainConfig {
    /// Parse settings from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        debug!("Loaded chain config from {}", path.display());
        Self::from_json_str(&contents)
    }

    /// Resolve the network name these settings ask for
    pub fn network_name(&self) -> Result<String> {
        if self.testnet && self.regtest {
            return Err(Error::InvalidConfig(
                "Invalid combination of -regtest and -testnet.".to_string(),
            ));
        }
        let switched = if self.regtest {
            Some(NetworkType::Regtest)
        } else if self.testnet {
            Some(NetworkType::Test)
        } else {
            None
        };

        match (&self.network, switched) {
            (Some(name), Some(network)) if name != network.as_str() => {
                let reason = format!("network {} conflicts with -{}", name, flag_name(network));
                Err(Error::InvalidConfig(reason))
            }
            (Some(name), _) => Ok(name.clone()),
            (None, Some(network)) => Ok(network.as_str().to_string()),
            (None, None) => Ok(NetworkType::Main.as_str().to_string()),
        }
    }

    /// Replace file settings with command-line ones
    ///
    /// An explicit name clears both switches; a set switch clears the name and
    /// the other switch. With nothing given the settings are left as loaded.
    pub fn apply_overrides(&mut self, network: Option<String>, testnet: bool, regtest: bool) {
        if network.is_some() {
            self.network = network;
            self.testnet = false;
            self.regtest = false;
        } else if testnet || regtest {
            self.network = None;
            self.testnet = testnet;
            self.regtest = regtest;
        }
    }

    /// Resolve and parse the requested network
    pub fn network_type(&self) -> Result<NetworkType> {
        self.network_name()?.parse()
    }

    /// Select the requested network in `registry`
    pub fn select_in<'a>(&self, registry: &'a ChainRegistry) -> Result<&'a ChainParams> {
        registry.select(&self.network_name()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_to_main() {
        let config = ChainConfig::default();
        assert_eq!(config.network_name().unwrap(), "main");
    }

    #[test]
    fn test_flags() {
        let config = ChainConfig {
            testnet: true,
            ..Default::default()
        };
        assert_eq!(config.network_type().unwrap(), NetworkType::Test);

        let config = ChainConfig {
            regtest: true,
            ..Default::default()
        };
        assert_eq!(config.network_type().unwrap(), NetworkType::Regtest);
    }

    #[test]
    fn test_conflicting_flags() {
        let config = ChainConfig {
            testnet: true,
            regtest: true,
            ..Default::default()
        };
        let err = config.network_name().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("-regtest and -testnet"));
    }

    #[test]
    fn test_unknown_network_name() {
        let config = ChainConfig::from_json_str(r#"{"network": "signet"}"#).unwrap();
        assert_eq!(config.network_name().unwrap(), "signet");
        assert!(matches!(config.network_type(), Err(Error::InvalidNetwork(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"regtest": true}}"#).unwrap();

        let config = ChainConfig::from_file(file.path()).unwrap();
        assert!(config.regtest);
        assert_eq!(config.network, None);

        let registry = ChainRegistry::new().unwrap();
        let params = config.select_in(&registry).unwrap();
        assert_eq!(params.network, NetworkType::Regtest);
    }

    #[test]
    fn test_name_disagreeing_with_switch() {
        let json = r#"{"network": "test", "regtest": true}"#;
        let config = ChainConfig::from_json_str(json).unwrap();
        let err = config.network_name().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("-regtest"));

        let json = r#"{"network": "test", "testnet": true}"#;
        let agreeing = ChainConfig::from_json_str(json).unwrap();
        assert_eq!(agreeing.network_type().unwrap(), NetworkType::Test);
    }

    #[test]
    fn test_command_line_switch_replaces_file_network() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"network": "test"}}"#).unwrap();

        let mut config = ChainConfig::from_file(file.path()).unwrap();
        config.apply_overrides(None, false, true);
        assert_eq!(config.network, None);
        assert_eq!(config.network_type().unwrap(), NetworkType::Regtest);
    }

    #[test]
    fn test_command_line_name_replaces_file_switch() {
        let mut config = ChainConfig::from_json_str(r#"{"testnet": true}"#).unwrap();
        config.apply_overrides(Some("regtest".to_string()), false, false);
        assert!(!config.testnet);
        assert_eq!(config.network_type().unwrap(), NetworkType::Regtest);

        let mut untouched = ChainConfig::from_json_str(r#"{"testnet": true}"#).unwrap();
        untouched.apply_overrides(None, false, false);
        assert_eq!(untouched.network_type().unwrap(), NetworkType::Test);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ChainConfig::from_file(dir.path().join("absent.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_malformed_json() {
        let result = ChainConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
