//! Register session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one register session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterConfig {
    /// Origin id stamped on every sync event this session broadcasts.
    pub origin_id: String,

    /// Whether a successful invoice print pops the cash drawer.
    pub open_drawer_after_invoice: bool,

    /// How long an alert stays visible before auto-dismissal.
    #[serde(with = "duration_secs")]
    pub alert_ttl: Duration,

    /// How long a sync-touched catalog entry keeps its highlight.
    #[serde(with = "duration_secs")]
    pub freshness_ttl: Duration,
}

impl Default for RegisterConfig {
    fn default() -> Self {
        RegisterConfig {
            origin_id: "register-1".to_string(),
            open_drawer_after_invoice: true,
            alert_ttl: Duration::from_secs(5),
            freshness_ttl: Duration::from_secs(3),
        }
    }
}

/// Serializes Durations as whole seconds for config files.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
