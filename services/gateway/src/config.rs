//! Gateway configuration, loaded from a YAML file.
//!
//! Every field has a default so the gateway runs with no config at all;
//! a partial file overrides whole sections.

use anyhow::Context;
use parlor_engine::{DuelConfig, RoundTiming};
use serde::Deserialize;
use std::{fmt, net::SocketAddr, str::FromStr};
use tracing::Level;

#[derive(Clone, Debug, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Enables the /admin routes when set. Requests must carry it as a
    /// bearer token.
    #[serde(default)]
    pub admin_token: Option<String>,
    #[serde(default = "default_lucky7_timing")]
    pub lucky7: TimingConfig,
    #[serde(default = "default_coin_toss_timing")]
    pub coin_toss: TimingConfig,
    #[serde(default = "default_duel_timing")]
    pub duel: DuelTimingConfig,
    /// Entries per game in the recent-results feed sent on join. Zero
    /// disables the feed.
    #[serde(default = "default_recent_results_limit")]
    pub recent_results_limit: usize,
}

/// Round durations for one shared-table game.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct TimingConfig {
    pub countdown_secs: u32,
    pub freeze_cutoff_secs: u32,
    pub intermission_secs: u32,
}

impl TimingConfig {
    pub fn to_timing(self) -> RoundTiming {
        RoundTiming {
            countdown_secs: self.countdown_secs,
            freeze_cutoff_secs: self.freeze_cutoff_secs,
            intermission_secs: self.intermission_secs,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct DuelTimingConfig {
    pub start_delay_secs: u32,
    pub choice_timeout_secs: u32,
}

impl DuelTimingConfig {
    pub fn to_config(self) -> DuelConfig {
        DuelConfig {
            start_delay_secs: self.start_delay_secs,
            choice_timeout_secs: self.choice_timeout_secs,
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:9130".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_lucky7_timing() -> TimingConfig {
    TimingConfig {
        countdown_secs: 60,
        freeze_cutoff_secs: 10,
        intermission_secs: 6,
    }
}

fn default_coin_toss_timing() -> TimingConfig {
    TimingConfig {
        countdown_secs: 30,
        freeze_cutoff_secs: 10,
        intermission_secs: 6,
    }
}

fn default_duel_timing() -> DuelTimingConfig {
    DuelTimingConfig {
        start_delay_secs: 3,
        choice_timeout_secs: 60,
    }
}

fn default_recent_results_limit() -> usize {
    10
}

impl Default for GatewayConfig {
    fn default() -> GatewayConfig {
        GatewayConfig {
            listen_addr: default_listen_addr(),
            log_level: default_log_level(),
            admin_token: None,
            lucky7: default_lucky7_timing(),
            coin_toss: default_coin_toss_timing(),
            duel: default_duel_timing(),
            recent_results_limit: default_recent_results_limit(),
        }
    }
}

impl GatewayConfig {
    pub fn load(path: &str) -> anyhow::Result<GatewayConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("could not read config file {path}"))?;
        serde_yaml::from_str(&contents).context("could not parse config file")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.listen_addr
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid listen_addr {:?}", self.listen_addr))?;
        Level::from_str(&self.log_level)
            .with_context(|| format!("invalid log_level {:?}", self.log_level))?;
        self.lucky7
            .to_timing()
            .validate()
            .map_err(|err| anyhow::anyhow!("lucky7: {err}"))?;
        self.coin_toss
            .to_timing()
            .validate()
            .map_err(|err| anyhow::anyhow!("coin_toss: {err}"))?;
        self.duel
            .to_config()
            .validate()
            .map_err(|err| anyhow::anyhow!("duel: {err}"))?;
        if let Some(token) = &self.admin_token {
            if token.len() < 16 {
                anyhow::bail!("admin_token must be at least 16 characters");
            }
        }
        Ok(())
    }

    /// Debug view safe for logs and the dry-run report.
    pub fn redacted_debug(&self) -> impl fmt::Debug + '_ {
        RedactedConfig(self)
    }
}

struct RedactedConfig<'a>(&'a GatewayConfig);

impl fmt::Debug for RedactedConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.0;
        f.debug_struct("GatewayConfig")
            .field("listen_addr", &cfg.listen_addr)
            .field("log_level", &cfg.log_level)
            .field(
                "admin_token",
                &cfg.admin_token.as_ref().map(|_| "<redacted>"),
            )
            .field("lucky7", &cfg.lucky7)
            .field("coin_toss", &cfg.coin_toss)
            .field("duel", &cfg.duel)
            .field("recent_results_limit", &cfg.recent_results_limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GatewayConfig::default();
        config.validate().unwrap();
        assert_eq!(config.lucky7.countdown_secs, 60);
        assert_eq!(config.coin_toss.countdown_secs, 30);
        assert_eq!(config.duel.choice_timeout_secs, 60);
        assert_eq!(config.log_level, "info");
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn yaml_overrides_whole_sections() {
        let yaml = r#"
listen_addr: "127.0.0.1:8080"
admin_token: "a-long-enough-admin-token"
coin_toss:
  countdown_secs: 20
  freeze_cutoff_secs: 5
  intermission_secs: 4
"#;
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.coin_toss.countdown_secs, 20);
        // Untouched sections keep their defaults.
        assert_eq!(config.lucky7.countdown_secs, 60);
    }

    #[test]
    fn degenerate_timings_are_rejected() {
        let mut config = GatewayConfig::default();
        config.lucky7.freeze_cutoff_secs = 60;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.listen_addr = "not an addr".to_string();
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.admin_token = Some("short".to_string());
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn redacted_debug_hides_the_token() {
        let mut config = GatewayConfig::default();
        config.admin_token = Some("a-long-enough-admin-token".to_string());
        let printed = format!("{:?}", config.redacted_debug());
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("a-long-enough-admin-token"));
    }
}
