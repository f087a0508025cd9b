use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub target: TargetConfig,
    pub run: RunConfig,
    pub report: ReportConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub host: String,
    pub port: u16,
}

/// Burst parameters. The three timing knobs are independently named on
/// purpose: connection count, inter-launch delay, and dial timeout must
/// never be inferred from positional order.
#[derive(Debug, Deserialize, Clone)]
pub struct RunConfig {
    /// Number of concurrent connection attempts (the fan-out).
    pub connections: u32,
    /// Pause between consecutive worker launches, in milliseconds.
    pub launch_delay_ms: u64,
    /// Per-attempt TCP handshake timeout, in milliseconds. One global
    /// value applied uniformly to every attempt in the run.
    pub dial_timeout_ms: u64,
    /// One-shot closure timer: open connections are force-closed this
    /// long after the burst starts, even if some attempts are still
    /// dialing. Zero closes immediately.
    pub close_after_ms: u64,
    /// Skip the interactive confirmation prompt.
    #[serde(default)]
    pub assume_yes: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Seconds between progress snapshots printed during the run.
    /// Zero disables progress printing.
    pub progress_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("connection count must be greater than zero")]
    ZeroConnections,
    #[error("target port must be greater than zero")]
    ZeroPort,
    #[error("target host must not be empty")]
    EmptyHost,
    #[error("dial timeout must be greater than zero")]
    ZeroDialTimeout,
}

impl Config {
    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a meaningful run.
    /// Called before any worker launches; failures here are fatal.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.connections == 0 {
            return Err(ConfigError::ZeroConnections);
        }
        if self.target.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.target.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.run.dial_timeout_ms == 0 {
            return Err(ConfigError::ZeroDialTimeout);
        }
        Ok(())
    }
}

impl RunConfig {
    pub fn launch_delay(&self) -> Duration {
        Duration::from_millis(self.launch_delay_ms)
    }

    pub fn dial_timeout(&self) -> Duration {
        Duration::from_millis(self.dial_timeout_ms)
    }

    pub fn close_after(&self) -> Duration {
        Duration::from_millis(self.close_after_ms)
    }
}
