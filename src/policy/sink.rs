//! Persistence boundary for policy rules.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolgateError};

use super::PolicyRule;

/// Storage abstraction for persistent policy rules. Format and medium are
/// the host's decision; the store only calls through this seam.
pub trait RuleSink: Send + Sync {
    fn load(&self) -> Result<Vec<PolicyRule>>;
    fn save(&self, rules: &[PolicyRule]) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// File-backed rule sink using a single TOML file.
#[derive(Debug, Clone)]
pub struct FileRuleSink {
    path: PathBuf,
}

impl FileRuleSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default location: `~/.toolgate/rules.toml`.
    pub fn new_default() -> Self {
        Self {
            path: default_toolgate_dir().join("rules.toml"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl RuleSink for FileRuleSink {
    fn load(&self) -> Result<Vec<PolicyRule>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let file: RuleFile =
            toml::from_str(&raw).map_err(|err| ToolgateError::sink(err.to_string()))?;
        Ok(file.rules)
    }

    fn save(&self, rules: &[PolicyRule]) -> Result<()> {
        Self::ensure_parent(&self.path)?;
        let file = RuleFile {
            version: 1,
            saved_at: Utc::now(),
            rules: rules.to_vec(),
        };
        let serialized =
            toml::to_string(&file).map_err(|err| ToolgateError::sink(err.to_string()))?;
        fs::write(&self.path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleFile {
    version: u32,
    saved_at: DateTime<Utc>,
    rules: Vec<PolicyRule>,
}

fn default_toolgate_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".toolgate"))
        .unwrap_or_else(|| PathBuf::from(".toolgate"))
}
