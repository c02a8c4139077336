use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

/// Configuration section owned by this server.
pub const SETTINGS_SECTION: &str = "languageServerExample";

/// Default cap on diagnostics published per document
pub const DEFAULT_MAX_NUMBER_OF_PROBLEMS: usize = 1000;

/// Id used when dynamically registering for configuration changes
pub const CONFIGURATION_REGISTRATION_ID: &str = "languageServerExample/didChangeConfiguration";

const APP_DIR: &str = "lsp-sample";
const LOG_FILE_NAME: &str = "lsp-sample.log";

/// Settings read from the `languageServerExample` section
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExampleSettings {
    pub max_number_of_problems: usize,
}

impl Default for ExampleSettings {
    fn default() -> Self {
        Self {
            max_number_of_problems: DEFAULT_MAX_NUMBER_OF_PROBLEMS,
        }
    }
}

impl ExampleSettings {
    /// Parse a full `workspace/didChangeConfiguration` payload.
    ///
    /// Only `languageServerExample.maxNumberOfProblems` is read; anything
    /// missing or of the wrong shape falls back to the defaults.
    pub fn from_payload(settings: &Value) -> Self {
        settings
            .get(SETTINGS_SECTION)
            .map(Self::from_section)
            .unwrap_or_default()
    }

    /// Parse the section value returned by a `workspace/configuration` pull.
    pub fn from_section(section: &Value) -> Self {
        Self::deserialize(section).unwrap_or_default()
    }
}

/// Returns the path to the data directory for lsp-sample.
/// Uses $XDG_DATA_HOME/lsp-sample if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/lsp-sample,
/// or ./lsp-sample if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join(LOG_FILE_NAME)
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join(APP_DIR)
}
