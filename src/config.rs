use crate::passages::TextMode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Session lengths offered to the user.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(try_from = "u64", into = "u64")]
pub enum SessionDuration {
    #[value(name = "15")]
    #[strum(serialize = "15s")]
    Fifteen,
    #[value(name = "30")]
    #[strum(serialize = "30s")]
    Thirty,
    #[default]
    #[value(name = "60")]
    #[strum(serialize = "60s")]
    Sixty,
    #[value(name = "120")]
    #[strum(serialize = "120s")]
    OneTwenty,
}

impl SessionDuration {
    pub const ALL: [SessionDuration; 4] = [
        SessionDuration::Fifteen,
        SessionDuration::Thirty,
        SessionDuration::Sixty,
        SessionDuration::OneTwenty,
    ];

    pub fn secs(self) -> u64 {
        match self {
            SessionDuration::Fifteen => 15,
            SessionDuration::Thirty => 30,
            SessionDuration::Sixty => 60,
            SessionDuration::OneTwenty => 120,
        }
    }

    /// The next longer duration, wrapping around to the shortest.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|d| *d == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl From<SessionDuration> for u64 {
    fn from(d: SessionDuration) -> Self {
        d.secs()
    }
}

impl TryFrom<u64> for SessionDuration {
    type Error = String;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|d| d.secs() == secs)
            .ok_or_else(|| format!("unsupported session duration: {secs}s"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub duration: SessionDuration,
    pub text_mode: TextMode,
    pub custom_text: Option<String>,
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typemaster") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typemaster_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable config falls back to the defaults.
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed config {:?}: {}", self.path, e);
            Config::default()
        })
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
