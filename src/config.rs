use crate::domain::terminal::{GatewayRules, StageTimings};
use crate::error::{PilotError, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub gateway: GatewayRules,
    /// Multiplier applied to every terminal stage delay.
    delay_scale: f64,
    stage_timings: StageTimings,
    pub poll_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway: GatewayRules::default(),
            delay_scale: 1.0,
            stage_timings: StageTimings::default(),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str, default: String| match lookup(key) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            Some(_) => {
                tracing::warn!(key, "Empty value, using default");
                default
            }
            None => default,
        };

        let gateway = GatewayRules {
            avs_zip: text("PAYPILOT_AVS_ZIP", defaults.gateway.avs_zip),
            cvv_prefix: text("PAYPILOT_CVV_PREFIX", defaults.gateway.cvv_prefix),
            approved_prefix: text("PAYPILOT_APPROVED_PREFIX", defaults.gateway.approved_prefix),
        };

        let delay_scale = match lookup("PAYPILOT_DELAY_SCALE") {
            Some(raw) => {
                let scale: f64 = raw.trim().parse().map_err(|_| {
                    PilotError::ConfigError(format!("PAYPILOT_DELAY_SCALE must be a number, got '{raw}'"))
                })?;
                if !scale.is_finite() || scale < 0.0 {
                    return Err(PilotError::ConfigError(format!(
                        "PAYPILOT_DELAY_SCALE must be zero or positive, got {scale}"
                    )));
                }
                scale
            }
            None => defaults.delay_scale,
        };
        let stage_timings = StageTimings::default().scaled(delay_scale).map_err(|_| {
            PilotError::ConfigError(format!(
                "PAYPILOT_DELAY_SCALE {delay_scale} makes the stage delays too long"
            ))
        })?;

        let poll_interval = match lookup("PAYPILOT_POLL_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    PilotError::ConfigError(format!(
                        "PAYPILOT_POLL_INTERVAL_SECS must be a whole number, got '{raw}'"
                    ))
                })?;
                if secs == 0 {
                    return Err(PilotError::ConfigError(
                        "PAYPILOT_POLL_INTERVAL_SECS must be at least 1".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => defaults.poll_interval,
        };

        Ok(Self {
            gateway,
            delay_scale,
            stage_timings,
            poll_interval,
        })
    }

    pub fn delay_scale(&self) -> f64 {
        self.delay_scale
    }

    /// The default stage delays scaled by `delay_scale`.
    pub fn stage_timings(&self) -> StageTimings {
        self.stage_timings
    }
}
