use crate::game::life::DEFAULT_INITIAL_LIFE;
use crate::game::parsing::ParseOptions;
use ini::Ini;
use log::{info, warn};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

pub const CONFIG_PATH: &str = "stepcore.ini";
const OPTIONS_SECTION: &str = "Options";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::Error => "Error",
            Self::Warn => "Warn",
            Self::Info => "Info",
            Self::Debug => "Debug",
            Self::Trace => "Trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("'{other}' is not a valid LogLevel setting")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub log_level: LogLevel,
    /// Reject measures whose row count does not divide 192 instead of warning.
    pub strict_subdivisions: bool,
    pub initial_life: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            strict_subdivisions: false,
            initial_life: DEFAULT_INITIAL_LIFE,
        }
    }
}

impl Config {
    /// Reads every known key from `[Options]`, keeping the default for any
    /// key that is missing or malformed.
    pub fn from_ini(conf: &Ini) -> Self {
        let default = Self::default();
        let get = |key: &str| conf.section(Some(OPTIONS_SECTION)).and_then(|s| s.get(key));

        let log_level = get("LogLevel")
            .and_then(|v| match LogLevel::from_str(v) {
                Ok(level) => Some(level),
                Err(e) => {
                    warn!("{e}; using {}", default.log_level);
                    None
                }
            })
            .unwrap_or(default.log_level);
        let strict_subdivisions = get("StrictSubdivisions")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .map_or(default.strict_subdivisions, |v| v != 0);
        let initial_life = get("InitialLife")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .map_or(default.initial_life, |v| v.clamp(0.0, 1.0));

        Self { log_level, strict_subdivisions, initial_life }
    }

    pub fn to_ini(&self) -> Ini {
        let mut conf = Ini::new();
        // Keys in alphabetical order
        conf.with_section(Some(OPTIONS_SECTION))
            .set("InitialLife", self.initial_life.to_string())
            .set("LogLevel", self.log_level.as_str())
            .set("StrictSubdivisions", if self.strict_subdivisions { "1" } else { "0" });
        conf
    }

    #[inline(always)]
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions { strict_subdivisions: self.strict_subdivisions }
    }
}

// Global, mutable configuration instance.
static CONFIG: LazyLock<Mutex<Config>> = LazyLock::new(|| Mutex::new(Config::default()));

#[inline(always)]
fn lock() -> MutexGuard<'static, Config> {
    CONFIG.lock().unwrap_or_else(PoisonError::into_inner)
}

// --- File I/O ---

fn create_default_config_file(path: &Path) -> Result<(), std::io::Error> {
    info!("'{}' not found, creating with default values.", path.display());
    Config::default().to_ini().write_to_file(path)
}

/// Reads `path` into a [`Config`] without touching the global instance.
pub fn read(path: &Path) -> Result<Config, ini::Error> {
    Ini::load_from_file(path).map(|conf| Config::from_ini(&conf))
}

/// Loads `path` into the global config, creating it with defaults when absent.
/// A file that cannot be read falls back to defaults.
pub fn load(path: &Path) {
    if !path.exists()
        && let Err(e) = create_default_config_file(path)
    {
        warn!("Failed to create default config file: {e}");
    }

    match read(path) {
        Ok(cfg) => {
            *lock() = cfg;
            info!("Configuration loaded from '{}'.", path.display());
        }
        Err(e) => {
            warn!("Failed to load '{}': {e}. Using default values.", path.display());
            *lock() = Config::default();
        }
    }
}

pub fn get() -> Config {
    *lock()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parsing() {
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" Warning ".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!("OFF".parse::<LogLevel>(), Ok(LogLevel::Off));
        assert_eq!(LogLevel::Trace.as_level_filter(), log::LevelFilter::Trace);
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_PATH);
        load(&path);
        assert!(path.exists());
        assert_eq!(read(&path).unwrap(), Config::default());
    }

    #[test]
    fn reads_options_and_ignores_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.ini");
        std::fs::write(
            &path,
            "[Options]\nLogLevel=Debug\nStrictSubdivisions=1\nInitialLife=nope\nUnknown=3\n",
        )
        .unwrap();
        let cfg = read(&path).unwrap();
        assert_eq!(cfg.log_level, LogLevel::Debug);
        assert!(cfg.strict_subdivisions);
        assert_eq!(cfg.initial_life, DEFAULT_INITIAL_LIFE);
        assert!(cfg.parse_options().strict_subdivisions);
    }

    #[test]
    fn initial_life_is_clamped() {
        let mut conf = Ini::new();
        conf.with_section(Some(OPTIONS_SECTION)).set("InitialLife", "4.5");
        assert_eq!(Config::from_ini(&conf).initial_life, 1.0);
    }

    #[test]
    fn written_file_reads_back() {
        let cfg = Config { log_level: LogLevel::Info, strict_subdivisions: true, initial_life: 0.25 };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ini");
        cfg.to_ini().write_to_file(&path).unwrap();
        assert_eq!(read(&path).unwrap(), cfg);
    }
}
