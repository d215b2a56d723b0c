//! # Configuration
//!
//! Environment-driven configuration (spec §6 "Configuration (environment)"),
//! loaded the way the teacher wires the `config` crate: `.env` first via
//! `dotenvy`, then `config::Environment` as the single source of truth.

use std::time::Duration;

use crate::types::Operator;

/// Per-operator dispatch deadlines plus worker/transport settings.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub time_addition: Duration,
    pub time_subtraction: Duration,
    pub time_multiplications: Duration,
    pub time_divisions: Duration,
    /// Bind address for the gRPC dispatch service.
    pub grpc_addr: String,
    /// Postgres DSN for the persistence adapter.
    pub database_url: String,
}

impl OrchestratorConfig {
    /// Deadline for a given operator (spec §4.B "lookup(⊕) from configuration").
    pub fn deadline_for(&self, op: Operator) -> Duration {
        match op {
            Operator::Add => self.time_addition,
            Operator::Sub => self.time_subtraction,
            Operator::Mul => self.time_multiplications,
            Operator::Div => self.time_divisions,
        }
    }

    /// Load from the environment, applying spec §6's defaults (`"2s"` per
    /// operator) when a variable is unset or fails to parse.
    ///
    /// Loads `.env` via `dotenvy` first, then reads through `config::Config`
    /// so the same environment-source plumbing the teacher uses for its
    /// `TaskerConfig` is available for future non-env sources (file, etc.)
    /// without changing callers.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let source = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .unwrap_or_else(|_| config::Config::default());

        let duration_from = |key: &str, default: &str| -> Duration {
            source
                .get_string(key)
                .ok()
                .and_then(|v| humantime::parse_duration(&v).ok())
                .unwrap_or_else(|| humantime::parse_duration(default).unwrap())
        };
        let string_from = |key: &str, default: &str| -> String {
            source.get_string(key).unwrap_or_else(|_| default.to_string())
        };

        Self {
            time_addition: duration_from("TIME_ADDITION", "2s"),
            time_subtraction: duration_from("TIME_SUBTRACTION", "2s"),
            time_multiplications: duration_from("TIME_MULTIPLICATIONS", "2s"),
            time_divisions: duration_from("TIME_DIVISIONS", "2s"),
            grpc_addr: string_from("ORCHESTRATOR_GRPC_ADDR", "0.0.0.0:50051"),
            database_url: string_from("ORCHESTRATOR_DATABASE_URL", "postgres://localhost/tasker"),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            time_addition: Duration::from_secs(2),
            time_subtraction: Duration::from_secs(2),
            time_multiplications: Duration::from_secs(2),
            time_divisions: Duration::from_secs(2),
            grpc_addr: "0.0.0.0:50051".to_string(),
            database_url: "postgres://localhost/tasker".to_string(),
        }
    }
}

/// Worker-side configuration (spec §6 `COMPUTING_POWER`).
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Number of concurrent fetch/compute/submit loops to run.
    pub computing_power: usize,
    /// How long to sleep between `FetchTask` polls when none are available.
    pub poll_interval: Duration,
    /// Dispatch service address to connect to.
    pub orchestrator_addr: String,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let computing_power = std::env::var("COMPUTING_POWER")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);
        let poll_interval = std::env::var("DISPATCH_POLL_INTERVAL")
            .ok()
            .and_then(|v| humantime::parse_duration(&v).ok())
            .unwrap_or_else(|| Duration::from_millis(200));
        let orchestrator_addr = std::env::var("ORCHESTRATOR_GRPC_ADDR")
            .unwrap_or_else(|_| "http://127.0.0.1:50051".to_string());
        Self {
            computing_power,
            poll_interval,
            orchestrator_addr,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            computing_power: 10,
            poll_interval: Duration::from_millis(200),
            orchestrator_addr: "http://127.0.0.1:50051".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_deadlines_are_two_seconds() {
        let cfg = OrchestratorConfig::default();
        assert_eq!(cfg.deadline_for(Operator::Add), Duration::from_secs(2));
        assert_eq!(cfg.deadline_for(Operator::Div), Duration::from_secs(2));
    }

    #[test]
    fn default_worker_config_matches_spec_defaults() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.computing_power, 10);
    }
}
