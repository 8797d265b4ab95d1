use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::config::Config;

/// Role tag embedded in issued tokens. Each role is unlocked by its own
/// shared password.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Dashboard access.
    Admin,
    /// Check-in kiosk access.
    Scan,
}

impl Role {
    pub fn password(self, config: &Config) -> Option<&str> {
        match self {
            Role::Admin => config.admin_password.as_deref(),
            Role::Scan => config.scan_password.as_deref(),
        }
    }

    /// Cookie mirroring the token for browser session persistence.
    pub fn cookie_name(self) -> &'static str {
        match self {
            Role::Admin => "adminToken",
            Role::Scan => "scanToken",
        }
    }
}
