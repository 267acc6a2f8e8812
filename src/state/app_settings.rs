use groupstage_core::auth::DEFAULT_AUTH_URL;
use groupstage_core::{Access, StandingsMode};
use log::{LevelFilter, warn};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_ROOT: &str = "tournament";

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: LevelFilter,
    /// Realtime database base URL. Unset means the scoreboard runs local-only.
    pub database_url: Option<String>,
    pub api_key: Option<String>,
    pub auth_url: String,
    pub root: String,
    pub mode: StandingsMode,
    pub data_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: LevelFilter::Info,
            database_url: None,
            api_key: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            root: DEFAULT_ROOT.to_string(),
            mode: StandingsMode::Manual,
            data_dir: None,
        }
    }
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any `GROUPSTAGE_*` source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let log_level = match get("GROUPSTAGE_LOG") {
            Some(raw) => LevelFilter::from_str(&raw).unwrap_or_else(|_| {
                warn!("unknown GROUPSTAGE_LOG value {raw:?}; using info");
                LevelFilter::Info
            }),
            None => defaults.log_level,
        };
        let database_url = get("GROUPSTAGE_DATABASE_URL");
        // Fixtures only exist in the database, so a local-only run keeps stats by hand.
        let default_mode = if database_url.is_some() {
            StandingsMode::Matches
        } else {
            StandingsMode::Manual
        };
        let mode = match get("GROUPSTAGE_MODE") {
            Some(raw) => match StandingsMode::from_setting(&raw) {
                Some(StandingsMode::Matches) if database_url.is_none() => {
                    warn!("GROUPSTAGE_MODE=matches needs GROUPSTAGE_DATABASE_URL; using manual");
                    StandingsMode::Manual
                }
                Some(mode) => mode,
                None => {
                    warn!("unknown GROUPSTAGE_MODE value {raw:?}; using {}", default_mode.label());
                    default_mode
                }
            },
            None => default_mode,
        };

        Self {
            log_level,
            database_url,
            api_key: get("GROUPSTAGE_API_KEY"),
            auth_url: get("GROUPSTAGE_AUTH_URL").unwrap_or(defaults.auth_url),
            root: get("GROUPSTAGE_ROOT").unwrap_or(defaults.root),
            mode,
            data_dir: get("GROUPSTAGE_DATA_DIR").map(PathBuf::from),
            ..defaults
        }
    }

    pub fn remote_enabled(&self) -> bool {
        self.database_url.is_some()
    }

    pub fn access(&self) -> Access {
        if self.remote_enabled() {
            Access::Remote {
                auth_ready: self.api_key.is_some(),
                admin: None,
            }
        } else {
            Access::LocalOnly
        }
    }
}
