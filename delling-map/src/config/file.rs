use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use subst::VariableMap;
use tracing::warn;
use url::Url;

use crate::datasets::{
    DatasetLocator, DatasetRegistry, MEDIA_ROOT_DEFAULT, MediaConfig, USER_MEDIA_DIR_DEFAULT,
};
use crate::srv::{ShipsProxy, SrvConfig};
use crate::{DellingError, DellingResult};

pub const UPSTREAM_URL_DEFAULT: &str = "http://127.0.0.1:8100";
pub const UPSTREAM_TIMEOUT_DEFAULT: Duration = Duration::from_secs(2);
/// The viewer polls the live-position endpoint, so a slow upstream must never hold it longer.
pub const UPSTREAM_TIMEOUT_MAX: Duration = Duration::from_secs(2);

pub type UnrecognizedValues = HashMap<String, serde_yaml::Value>;
pub type UnrecognizedKeys = HashSet<String>;

pub type ConfigFileResult<T> = Result<T, ConfigFileError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("Unable to load config file {1}: {0}")]
    ConfigLoadError(#[source] std::io::Error, PathBuf),

    #[error("Unable to parse config file {1}: {0}")]
    ConfigParseError(#[source] subst::yaml::Error, PathBuf),
}

/// Everything the HTTP handlers need, built once at start-up.
#[derive(Clone, Debug)]
pub struct ServerState {
    pub datasets: DatasetRegistry,
    pub ships: ShipsProxy,
}

#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub srv: SrvConfig,

    /// Mount point of the removable media, `/media/usb` by default
    pub removable_media_root: Option<PathBuf>,

    /// User name for the per-user mount point, e.g. `/media/<user>/usb`
    pub media_user: Option<String>,

    /// Directory holding the per-user mount points, `/media` by default
    pub user_media_dir: Option<PathBuf>,

    /// Base URL of the live-position service, `http://127.0.0.1:8100` by default
    pub upstream_live_position_url: Option<String>,

    /// How long to wait for the live-position service, at most (and by default) `2s`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "humantime_serde"
    )]
    pub upstream_timeout: Option<Duration>,

    #[serde(flatten, skip_serializing)]
    pub unrecognized: UnrecognizedValues,
}

impl Config {
    /// Validate the config, and report the keys that were not recognized.
    pub fn finalize(&mut self) -> DellingResult<UnrecognizedKeys> {
        let res: UnrecognizedKeys = self.unrecognized.keys().cloned().collect();
        for key in &res {
            warn!("Ignoring unrecognized configuration key '{key}'. Please check your configuration file for typos.");
        }

        self.upstream_url()?;

        if let Some(timeout) = self.upstream_timeout {
            if timeout > UPSTREAM_TIMEOUT_MAX {
                warn!(
                    "upstream_timeout of {timeout:?} is too long, using {UPSTREAM_TIMEOUT_MAX:?}"
                );
                self.upstream_timeout = Some(UPSTREAM_TIMEOUT_MAX);
            }
        }

        Ok(res)
    }

    pub fn upstream_url(&self) -> DellingResult<Url> {
        let url = self
            .upstream_live_position_url
            .as_deref()
            .unwrap_or(UPSTREAM_URL_DEFAULT);
        Url::parse(url).map_err(|e| DellingError::InvalidUpstreamUrl(e, url.to_string()))
    }

    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        self.upstream_timeout.unwrap_or(UPSTREAM_TIMEOUT_DEFAULT)
    }

    #[must_use]
    pub fn media_config(&self) -> MediaConfig {
        MediaConfig {
            root: self
                .removable_media_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(MEDIA_ROOT_DEFAULT)),
            user: self.media_user.clone(),
            user_media_dir: self
                .user_media_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(USER_MEDIA_DIR_DEFAULT)),
        }
    }

    /// Build the shared server state from a finalized config.
    pub fn resolve(&self) -> DellingResult<ServerState> {
        Ok(ServerState {
            datasets: DatasetRegistry::new(DatasetLocator::new(self.media_config())),
            ships: ShipsProxy::new(&self.upstream_url()?, self.upstream_timeout())?,
        })
    }
}

/// Read a YAML config file, substituting `${VAR}` references from `env`.
pub fn read_config<'a, M>(file_name: &Path, env: &'a M) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    let mut file =
        File::open(file_name).map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ConfigFileError::ConfigLoadError(e, file_name.into()))?;
    parse_config(&contents, env, file_name)
}

pub fn parse_config<'a, M>(contents: &str, env: &'a M, file_name: &Path) -> ConfigFileResult<Config>
where
    M: VariableMap<'a>,
    M::Value: AsRef<str>,
{
    subst::yaml::from_str(contents, env)
        .map_err(|e| ConfigFileError::ConfigParseError(e, file_name.into()))
}
