//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Application name
pub const APP_NAME: &str = "Jarvis API Client";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name given to requests that have not been named yet
pub const DEFAULT_REQUEST_NAME: &str = "New Request";

/// Collection created by quick-save when none exist
pub const DEFAULT_COLLECTION_NAME: &str = "Default Collection";

/// Store record keys
pub const KEY_COLLECTIONS: &str = "jarvis-collections";
pub const KEY_HISTORY: &str = "jarvis-history";
pub const KEY_ENVIRONMENTS: &str = "jarvis-environments";

/// Maximum number of history entries kept unless configured otherwise
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Request timeout applied by the HTTP executor
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Data directory under the user's home
pub const DATA_DIR_NAME: &str = ".jarvis";

/// Environment variable overriding the data directory
pub const HOME_ENV_VAR: &str = "JARVIS_HOME";

pub const CONFIG_FILE: &str = "config.json";
pub const LOG_FILE: &str = "jarvis.log";
