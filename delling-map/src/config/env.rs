//! Environment variable access that can be faked in tests.
//!
//! - [`OsEnv`]: reads the process environment
//! - [`FauxEnv`]: a fixed set of variables for tests

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::env::var_os;
use std::ffi::OsString;

use subst::VariableMap;
use tracing::warn;

/// Live-position upstream base URL.
pub const UPSTREAM_URL_ENV: &str = "AIS_URL";
/// Removable-media mount root.
pub const MEDIA_ROOT_ENV: &str = "USB_MOUNT";
/// Name of the current user, used for the per-user mount root.
pub const USER_ENV: &str = "USER";

/// Environment access, also used as the variable source for config file substitution.
pub trait Env<'a>: VariableMap<'a> {
    fn var_os(&self, key: &str) -> Option<OsString>;

    /// Get a variable as UTF-8. Invalid unicode is logged and treated as unset.
    #[must_use]
    fn get_env_str(&self, key: &str) -> Option<String> {
        let value = self.var_os(key)?;
        match value.into_string() {
            Ok(v) => Some(v),
            Err(v) => {
                let v = v.to_string_lossy();
                warn!("Environment variable {key} has invalid unicode. Lossy representation: {v}");
                None
            }
        }
    }

    /// A variable is set, but the config file never referenced it.
    #[must_use]
    fn has_unused_var(&self, key: &str) -> bool;
}

/// The process environment. Remembers which variables the config file substituted.
#[derive(Debug, Default)]
pub struct OsEnv(RefCell<HashSet<String>>);

impl Env<'_> for OsEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        var_os(key)
    }

    fn has_unused_var(&self, key: &str) -> bool {
        !self.0.borrow().contains(key) && var_os(key).is_some()
    }
}

impl<'a> VariableMap<'a> for OsEnv {
    type Value = String;

    fn get(&'a self, key: &str) -> Option<Self::Value> {
        self.0.borrow_mut().insert(key.to_string());
        std::env::var(key).ok()
    }
}

#[derive(Debug, Default)]
pub struct FauxEnv(pub HashMap<&'static str, OsString>);

impl FauxEnv {
    #[must_use]
    pub fn with(vars: &[(&'static str, &str)]) -> Self {
        Self(vars.iter().map(|(k, v)| (*k, OsString::from(v))).collect())
    }
}

impl<'a> VariableMap<'a> for FauxEnv {
    type Value = String;

    fn get(&'a self, key: &str) -> Option<Self::Value> {
        self.0.get(key).map(|s| s.to_string_lossy().to_string())
    }
}

impl Env<'_> for FauxEnv {
    fn var_os(&self, key: &str) -> Option<OsString> {
        self.0.get(key).map(Into::into)
    }

    fn has_unused_var(&self, key: &str) -> bool {
        self.var_os(key).is_some()
    }
}
