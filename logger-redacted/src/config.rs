// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default level for the engine's own crates when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of the human readable format
    pub json: bool,
    /// Pass every formatted line through the [`crate::PiiRedactor`]
    pub redaction_enabled: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            redaction_enabled: true,
        }
    }
}

impl LoggerConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub fn default_directive(&self) -> String {
        let level = &self.level;
        format!(
            "user_auth_server={level},auth_identity={level},auth_gateway={level},\
             tower_http=info,sqlx=warn,hyper=info"
        )
    }
}
