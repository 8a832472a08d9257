use crate::error::LaunchError;
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PREFIX_PATH_VAR: &str = "AMENT_PREFIX_PATH";

/// Argument values supplied from outside the launch description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchOverrides {
    values: BTreeMap<String, String>,
}

impl LaunchOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parses `name:=value` tokens. The value is kept verbatim and may be empty.
    pub fn parse<I, S>(tokens: I) -> Result<Self, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = LaunchOverrides::new();
        for token in tokens {
            let token = token.as_ref();
            match token.split_once(":=") {
                Some((name, value)) if !name.is_empty() => overrides.set(name, value),
                _ => return Err(LaunchError::InvalidOverride(token.to_string())),
            }
        }
        Ok(overrides)
    }

    /// Reads a JSON object mapping argument names to string values.
    pub fn from_json_file(path: &Path) -> Result<Self, LaunchError> {
        let file_error = |reason: String| LaunchError::OverridesFile(path.to_path_buf(), reason);
        let text = fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let values: BTreeMap<String, String> =
            serde_json::from_str(&text).map_err(|e| file_error(e.to_string()))?;
        Ok(LaunchOverrides { values })
    }

    /// Entries of `other` replace entries of `self`.
    pub fn merge(mut self, other: LaunchOverrides) -> Self {
        self.values.extend(other.values);
        self
    }
}

pub const DEFAULT_SIGINT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SIGTERM_TIMEOUT: Duration = Duration::from_secs(5);

/// Where executables are looked up, where log output is written, and how
/// long a node gets to stop on shutdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchSettings {
    pub prefixes: Vec<PathBuf>,
    pub log_dir: PathBuf,
    /// Wait after SIGINT before escalating to SIGTERM.
    pub sigint_timeout: Duration,
    /// Wait after SIGTERM before escalating to SIGKILL.
    pub sigterm_timeout: Duration,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        LaunchSettings {
            prefixes: Vec::new(),
            log_dir: default_log_dir(),
            sigint_timeout: DEFAULT_SIGINT_TIMEOUT,
            sigterm_timeout: DEFAULT_SIGTERM_TIMEOUT,
        }
    }
}

impl LaunchSettings {
    /// Explicit prefixes come first, followed by the entries of
    /// `AMENT_PREFIX_PATH`.
    pub fn from_env(prefixes: Vec<PathBuf>, log_dir: Option<PathBuf>) -> Self {
        Self::from_prefix_path(prefixes, log_dir, env::var_os(PREFIX_PATH_VAR))
    }

    /// Same as [`LaunchSettings::from_env`] with the value of
    /// `AMENT_PREFIX_PATH` given explicitly. Empty entries are skipped.
    pub fn from_prefix_path(
        prefixes: Vec<PathBuf>,
        log_dir: Option<PathBuf>,
        prefix_path: Option<OsString>,
    ) -> Self {
        let mut settings = LaunchSettings {
            prefixes,
            log_dir: log_dir.unwrap_or_else(default_log_dir),
            ..LaunchSettings::default()
        };
        if let Some(paths) = prefix_path {
            settings
                .prefixes
                .extend(env::split_paths(&paths).filter(|p| !p.as_os_str().is_empty()));
        }
        settings
    }
}

fn default_log_dir() -> PathBuf {
    env::temp_dir().join("line_laser_launch")
}
