//! Task configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::BoundWaitError;

/// Per-task settings.
///
/// JSON shape: `{"timeout_ms": 5000, "interrupt_on_cancel": true}`; missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Deadline for the remote call, measured from when the guard is armed.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,

    /// Let `cancel()` settle a task that is already waiting on its call.
    /// When false, cancellation is only observed on entry to `run`.
    pub interrupt_on_cancel: bool,
}

impl TaskConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_json(s: &str) -> Result<Self, BoundWaitError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BoundWaitError> {
        if self.timeout.is_zero() {
            return Err(BoundWaitError::ZeroTimeout);
        }
        Ok(())
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            interrupt_on_cancel: true,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_timeout_is_five_seconds() {
        let config = TaskConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.interrupt_on_cancel);
    }

    #[test]
    fn parses_partial_json() {
        let config = TaskConfig::from_json(r#"{"timeout_ms": 200}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(200));
        assert!(config.interrupt_on_cancel);
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = TaskConfig::from_json(r#"{"timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, BoundWaitError::ZeroTimeout));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = TaskConfig::from_json(r#"{"timeout_ms": "soon"}"#).unwrap_err();
        assert!(matches!(err, BoundWaitError::Config(_)));
    }

    #[test]
    fn json_roundtrip_uses_millis() {
        let config = TaskConfig::default().with_timeout(Duration::from_millis(1500));
        let v = serde_json::to_value(&config).unwrap();
        assert_eq!(v["timeout_ms"], 1500);
    }
}
