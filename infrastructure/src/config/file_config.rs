//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.

use std::path::PathBuf;
use std::time::Duration;

use docschat_domain::AgentProfile;
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Assistant backend connection settings
    pub backend: FileBackendConfig,
    /// Default agent selection and display metadata
    pub agent: FileAgentConfig,
    /// Conversation logging settings
    pub logging: FileLoggingConfig,
}

/// `[backend]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Base URL of the portal backend hosting the assistant plugin.
    pub base_url: String,
    /// Connection setup timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Watchdog interval between stream events, in seconds.
    pub idle_timeout_secs: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7007".to_string(),
            connect_timeout_secs: 10,
            idle_timeout_secs: 120,
        }
    }
}

impl FileBackendConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// `[agent]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Agent used when none is given on the command line.
    pub default: String,
    /// Empty-conversation title.
    pub description: Option<String>,
    /// Markdown greeting shown before the first message.
    pub welcome_message: Option<String>,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            default: "docs-assistant".to_string(),
            description: None,
            welcome_message: None,
        }
    }
}

impl FileAgentConfig {
    /// Convert the display fields into a domain profile.
    pub fn profile(&self) -> AgentProfile {
        AgentProfile {
            description: self.description.clone(),
            welcome_message: self.welcome_message.clone(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for conversation JSONL logs; unset disables them.
    pub conversation_dir: Option<PathBuf>,
}
