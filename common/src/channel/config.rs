// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::channel::{ChannelError, Result};

/// Connection settings of a ThingSpeak channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelConfig {
    pub host: String,
    pub channel_id: u64,
    pub read_api_key: Option<String>,
    pub write_api_key: Option<String>,
}

/// A partially filled config, as found in a file or the environment.
#[derive(Deserialize, Default, Debug, PartialEq)]
struct PartialConfig {
    host: Option<String>,
    channel_id: Option<u64>,
    read_api_key: Option<String>,
    write_api_key: Option<String>,
}

impl PartialConfig {
    /// Reads the `THINGSPEAK_*` variables through `var`. Empty values count as unset.
    fn from_env_with(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| var(name).filter(|value| !value.trim().is_empty());

        let channel_id = match var(ChannelConfig::ENV_CHANNEL_ID) {
            Some(id) => Some(id.trim().parse::<u64>().map_err(|_| {
                ChannelError::Config(format!(
                    "{} is not a channel id: {id:?}",
                    ChannelConfig::ENV_CHANNEL_ID
                ))
            })?),
            None => None,
        };

        Ok(Self {
            host: var(ChannelConfig::ENV_HOST),
            channel_id,
            read_api_key: var(ChannelConfig::ENV_READ_API_KEY),
            write_api_key: var(ChannelConfig::ENV_WRITE_API_KEY),
        })
    }

    /// Values set in `other` win.
    fn merge(self, other: Self) -> Self {
        Self {
            host: other.host.or(self.host),
            channel_id: other.channel_id.or(self.channel_id),
            read_api_key: other.read_api_key.or(self.read_api_key),
            write_api_key: other.write_api_key.or(self.write_api_key),
        }
    }

    fn into_config(self) -> Option<ChannelConfig> {
        Some(ChannelConfig {
            host: self.host.unwrap_or_else(ChannelConfig::default_host),
            channel_id: self.channel_id?,
            read_api_key: self.read_api_key.filter(|key| !key.is_empty()),
            write_api_key: self.write_api_key.filter(|key| !key.is_empty()),
        })
    }
}

impl ChannelConfig {
    pub const DEFAULT_HOST: &'static str = "https://api.thingspeak.com";

    pub const ENV_HOST: &'static str = "THINGSPEAK_HOST";
    pub const ENV_CHANNEL_ID: &'static str = "THINGSPEAK_CHANNEL_ID";
    pub const ENV_READ_API_KEY: &'static str = "THINGSPEAK_READ_API_KEY";
    pub const ENV_WRITE_API_KEY: &'static str = "THINGSPEAK_WRITE_API_KEY";

    pub fn new(channel_id: u64) -> Self {
        Self {
            host: Self::default_host(),
            channel_id,
            read_api_key: None,
            write_api_key: None,
        }
    }

    fn default_host() -> String {
        Self::DEFAULT_HOST.into()
    }

    /// Location of the config file, e.g. `~/.config/energy-monitor/config.json` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "energy-monitor")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the config from the default file and the `THINGSPEAK_*` environment variables.
    ///
    /// Environment variables override the file. Returns `Ok(None)` if neither names a channel.
    pub fn load() -> Result<Option<Self>> {
        let file = match Self::default_path() {
            Some(path) if path.exists() => {
                log::debug!("Reading channel config from {}", path.display());
                Self::read_partial(&path)?
            }
            _ => PartialConfig::default(),
        };

        let env = PartialConfig::from_env_with(|name| std::env::var(name).ok())?;

        Ok(file.merge(env).into_config())
    }

    /// Reads a complete config from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::read_partial(path)?.into_config().ok_or_else(|| {
            ChannelError::Config(format!("{} has no channel_id", path.display()))
        })
    }

    fn read_partial(path: &Path) -> Result<PartialConfig> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Base URL of all read endpoints of the channel.
    pub fn channel_url(&self) -> String {
        format!("{}/channels/{}", self.host.trim_end_matches('/'), self.channel_id)
    }

    /// URL of the write endpoint.
    pub fn update_url(&self) -> String {
        format!("{}/update", self.host.trim_end_matches('/'))
    }
}

#[cfg(test)]
fn env_from(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |name| {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.to_string())
    }
}

#[test]
fn test_env_config() {
    let env = PartialConfig::from_env_with(env_from(&[
        ("THINGSPEAK_CHANNEL_ID", "2716801"),
        ("THINGSPEAK_READ_API_KEY", "READKEY"),
    ]))
    .unwrap();

    let config = PartialConfig::default().merge(env).into_config().unwrap();

    assert_eq!(config.host, ChannelConfig::DEFAULT_HOST);
    assert_eq!(config.channel_id, 2716801);
    assert_eq!(config.read_api_key.as_deref(), Some("READKEY"));
    assert_eq!(config.write_api_key, None);
    assert_eq!(config.channel_url(), "https://api.thingspeak.com/channels/2716801");
    assert_eq!(config.update_url(), "https://api.thingspeak.com/update");
}

#[test]
fn test_env_overrides_file() {
    let file: PartialConfig = serde_json::from_str(
        r#"{ "host": "http://localhost:8080/", "channel_id": 1, "read_api_key": "FILEKEY" }"#,
    )
    .unwrap();
    let env = PartialConfig::from_env_with(env_from(&[
        ("THINGSPEAK_CHANNEL_ID", "2"),
        ("THINGSPEAK_WRITE_API_KEY", "WRITEKEY"),
    ]))
    .unwrap();

    let config = file.merge(env).into_config().unwrap();

    assert_eq!(config.channel_id, 2);
    assert_eq!(config.read_api_key.as_deref(), Some("FILEKEY"));
    assert_eq!(config.write_api_key.as_deref(), Some("WRITEKEY"));
    assert_eq!(config.channel_url(), "http://localhost:8080/channels/2");
}

#[test]
fn test_missing_channel_id() {
    let env = PartialConfig::from_env_with(env_from(&[("THINGSPEAK_READ_API_KEY", "READKEY")]))
        .unwrap();

    assert_eq!(PartialConfig::default().merge(env).into_config(), None);
}

#[test]
fn test_invalid_channel_id() {
    let result = PartialConfig::from_env_with(env_from(&[("THINGSPEAK_CHANNEL_ID", "abc")]));

    assert!(matches!(result, Err(ChannelError::Config(_))));
}

#[test]
fn test_empty_keys_are_dropped() {
    let env = PartialConfig::from_env_with(env_from(&[
        ("THINGSPEAK_CHANNEL_ID", "7"),
        ("THINGSPEAK_READ_API_KEY", ""),
    ]))
    .unwrap();

    let config = PartialConfig::default().merge(env).into_config().unwrap();
    assert_eq!(config.read_api_key, None);
}

#[test]
fn test_from_file() {
    let path = std::env::temp_dir().join(format!("energy-monitor-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "channel_id": 2716801, "write_api_key": "WRITEKEY" }"#).unwrap();

    let config = ChannelConfig::from_file(&path);
    std::fs::remove_file(&path).unwrap();

    let config = config.unwrap();
    assert_eq!(config.host, ChannelConfig::DEFAULT_HOST);
    assert_eq!(config.channel_id, 2716801);
    assert_eq!(config.read_api_key, None);
    assert_eq!(config.write_api_key.as_deref(), Some("WRITEKEY"));
}

#[test]
fn test_empty_channel_id_is_unset() {
    let env = PartialConfig::from_env_with(env_from(&[
        ("THINGSPEAK_CHANNEL_ID", ""),
        ("THINGSPEAK_HOST", " "),
    ]))
    .unwrap();

    assert_eq!(env, PartialConfig::default());
    assert_eq!(PartialConfig::default().merge(env).into_config(), None);
}

#[test]
fn test_empty_env_key_keeps_file_key() {
    let file: PartialConfig =
        serde_json::from_str(r#"{ "channel_id": 1, "read_api_key": "FILEKEY" }"#).unwrap();
    let env = PartialConfig::from_env_with(env_from(&[("THINGSPEAK_READ_API_KEY", "")])).unwrap();

    let config = file.merge(env).into_config().unwrap();
    assert_eq!(config.read_api_key.as_deref(), Some("FILEKEY"));
}
