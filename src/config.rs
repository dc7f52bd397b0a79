//! Settings read from the environment (and `.env`, if present).

use std::env;
use std::str::FromStr;

use log::warn;

use crate::ledger::{BENCHMARK_ROUNDS, GENESIS_DIFFICULTY, MAX_DIFFICULTY};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface both listeners bind to.
    pub host: String,
    /// HTTP API port.
    pub port: u16,
    /// TCP session port.
    pub session_port: u16,
    pub genesis_difficulty: u32,
    pub benchmark_rounds: u64,
    /// Where the client connects.
    pub server_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            session_port: 6789,
            genesis_difficulty: GENESIS_DIFFICULTY,
            benchmark_rounds: BENCHMARK_ROUNDS,
            server_addr: "127.0.0.1:6789".to_string(),
        }
    }
}

impl Config {
    /// Read the process environment. Binaries load `.env` with `dotenvy`
    /// before calling this.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; missing or unparseable values
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let mut config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            session_port: parse_or(&lookup, "SESSION_PORT", defaults.session_port),
            genesis_difficulty: parse_or(&lookup, "GENESIS_DIFFICULTY", defaults.genesis_difficulty),
            benchmark_rounds: parse_or(&lookup, "BENCHMARK_ROUNDS", defaults.benchmark_rounds),
            server_addr: lookup("LEDGER_SERVER").unwrap_or(defaults.server_addr),
        };
        if !(1..=MAX_DIFFICULTY).contains(&config.genesis_difficulty) {
            warn!(
                "GENESIS_DIFFICULTY={} out of range 1..={MAX_DIFFICULTY}, using {GENESIS_DIFFICULTY}",
                config.genesis_difficulty
            );
            config.genesis_difficulty = GENESIS_DIFFICULTY;
        }
        config
    }

    pub fn session_addr(&self) -> String {
        format!("{}:{}", self.host, self.session_port)
    }
}

fn parse_or<T: FromStr>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring unparseable {key}={raw:?}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::Config;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.genesis_difficulty, 2);
        assert_eq!(config.benchmark_rounds, 2_000_000);
        assert_eq!(config.session_addr(), "127.0.0.1:6789");
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("SESSION_PORT", " 7000 "),
            ("GENESIS_DIFFICULTY", "3"),
            ("BENCHMARK_ROUNDS", "10"),
            ("LEDGER_SERVER", "ledger.local:7000"),
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.session_addr(), "0.0.0.0:7000");
        assert_eq!(config.genesis_difficulty, 3);
        assert_eq!(config.benchmark_rounds, 10);
        assert_eq!(config.server_addr, "ledger.local:7000");
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config_from(&[("PORT", "http"), ("GENESIS_DIFFICULTY", "0")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.genesis_difficulty, 2);
    }
}
