use std::path::PathBuf;
use serde::Deserialize;

/// All configuration for the Fyyur server.
///
/// Precedence (lowest to highest): defaults → config file → env var → CLI arg.
/// CLI arg merging is done by the caller after `Config::load()`.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // Database
    pub db_url: String,

    // Server
    pub port: u16,
    pub static_dir: PathBuf,

    // Logging
    pub log_level: String,
    pub utc: bool,
}

/// Config file layout (~/.fyyur/config.toml). All fields optional; they layer
/// on top of compiled-in defaults.
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    db_url: Option<String>,
    port: Option<u16>,
    static_dir: Option<PathBuf>,
    log_level: Option<String>,
    utc: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: "sqlite:fyyur.db?mode=rwc".to_string(),
            port: 5000,
            static_dir: PathBuf::from("static"),
            log_level: "info".to_string(),
            utc: false,
        }
    }
}

impl Config {
    /// Config directory: ~/.fyyur/
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fyyur")
    }

    /// Config file path: ~/.fyyur/config.toml
    pub fn file_path() -> PathBuf {
        Self::dir().join("config.toml")
    }

    /// Load config: defaults → config file → env vars.
    /// CLI args should be merged by the caller afterward.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Layer 2: config file
        if let Ok(contents) = std::fs::read_to_string(Self::file_path()) {
            config.apply_toml(&contents);
        }

        // Layer 3: environment variables
        config.apply_env(|key| std::env::var(key).ok());

        config
    }

    // --- Private helpers ---

    fn apply_toml(&mut self, contents: &str) {
        if let Ok(file) = toml::from_str::<FileConfig>(contents) {
            self.apply_file(file);
        }
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(v) = file.db_url { self.db_url = v; }
        if let Some(v) = file.port { self.port = v; }
        if let Some(v) = file.static_dir { self.static_dir = v; }
        if let Some(v) = file.log_level { self.log_level = v; }
        if let Some(v) = file.utc { self.utc = v; }
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("FYYUR_DB_URL") { self.db_url = v; }
        if let Some(v) = var("FYYUR_PORT") {
            if let Ok(p) = v.parse() { self.port = p; }
        }
        if let Some(v) = var("FYYUR_STATIC_DIR") { self.static_dir = PathBuf::from(v); }
        if let Some(v) = var("FYYUR_LOG_LEVEL") { self.log_level = v; }
        if let Some(v) = var("FYYUR_UTC") {
            self.utc = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }
}
