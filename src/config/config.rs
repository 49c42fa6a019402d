//! # Zoom Configuration
//!
//! Timing parameters of the frame-store protocol. The defaults are the timings
//! the hardware is driven with; [`ZoomConfig::immediate`] drops every delay for
//! simulation and tests.
//!
//! | Parameter           | Default | Description                                   |
//! |---------------------|---------|-----------------------------------------------|
//! | `poll_interval`     | 100 ms  | Wait between two reads of the done flag        |
//! | `max_poll_attempts` | 50      | Done-flag reads before giving up (5 s budget) |
//! | `pulse_delay`       | 10 ms   | Settle time after a reset and enable pulse     |
//! | `refresh_delay`     | 100 ms  | Settle time after committing a frame           |
//!
//! ```rust
//! use regional_zoom::config::ZoomConfig;
//!
//! let config = ZoomConfig::default();
//! assert!(config.validate().is_ok());
//! assert_eq!(config.poll_budget().as_millis(), 5000);
//! ```

use std::time::Duration;

/// Longest delay `validate` accepts for any single wait.
pub const MAX_DELAY: Duration = Duration::from_secs(10);

/// Timing of the frame-store protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoomConfig {
    /// Wait between two reads of the done flag.
    pub poll_interval: Duration,

    /// Number of done-flag reads before a pass is declared timed out.
    /// Must be greater than 0.
    pub max_poll_attempts: u32,

    /// Settle time after a hard reset and after the enable pulse.
    pub pulse_delay: Duration,

    /// Settle time after a frame commit.
    pub refresh_delay: Duration,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_poll_attempts: 50,
            pulse_delay: Duration::from_millis(10),
            refresh_delay: Duration::from_millis(100),
        }
    }
}

impl ZoomConfig {
    /// Same polling budget as the default, but without any waiting.
    pub fn immediate() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            pulse_delay: Duration::ZERO,
            refresh_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Total time a pass may take before it times out.
    pub fn poll_budget(&self) -> Duration {
        self.poll_interval * self.max_poll_attempts
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_poll_attempts == 0 {
            return Err("Poll attempts must be greater than 0".to_string());
        }
        for (name, delay) in [
            ("Poll interval", self.poll_interval),
            ("Pulse delay", self.pulse_delay),
            ("Refresh delay", self.refresh_delay),
        ] {
            if delay > MAX_DELAY {
                return Err(format!(
                    "{} must not exceed {}s",
                    name,
                    MAX_DELAY.as_secs()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ZoomConfig::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.max_poll_attempts, 50);
        assert_eq!(config.pulse_delay, Duration::from_millis(10));
        assert_eq!(config.refresh_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_immediate_keeps_attempts() {
        let config = ZoomConfig::immediate();
        assert_eq!(config.max_poll_attempts, 50);
        assert_eq!(config.poll_budget(), Duration::ZERO);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ZoomConfig::default();
        assert!(config.validate().is_ok());

        config.max_poll_attempts = 0;
        assert!(config.validate().is_err());
        config.max_poll_attempts = 50;

        config.refresh_delay = Duration::from_secs(11);
        assert_eq!(
            config.validate().unwrap_err(),
            "Refresh delay must not exceed 10s"
        );
    }
}
