//! Environment-variable configuration, prefix `SPECTRE_`.
//!
//! The global section loads through `envconfig`'s derive. Per-domain
//! sections are read by hand with `SPECTRE_DOMAINS_{id}_*` keys — the
//! domain id is only known once `DOMAINS` itself has been parsed, so no
//! `#[derive(Envconfig)]` struct can name its own prefix statically.

use std::collections::HashMap;

use envconfig::Envconfig;

use crate::error::RelayError;

#[derive(Envconfig, Debug, Clone)]
pub struct GlobalConfig {
    #[envconfig(from = "SPECTRE_PROVER_URL")]
    pub prover_url: String,

    #[envconfig(from = "SPECTRE_OBSERVABILITY_LOG_LEVEL", default = "debug")]
    pub log_level: String,

    #[envconfig(from = "SPECTRE_OBSERVABILITY_LOG_FILE", default = "out.log")]
    pub log_file: String,

    #[envconfig(from = "SPECTRE_OBSERVABILITY_HEALTH_PORT", default = "9001")]
    pub health_port: u16,

    #[envconfig(from = "SPECTRE_DOMAINS")]
    pub domains: String,

    #[envconfig(from = "SPECTRE_STORE_PATH", default = "./spectre-store")]
    pub store_path: String,
}

/// One entry of the `DOMAINS` list: `id:type`, e.g. `1:evm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainEntry {
    pub id: u8,
    pub chain_type: String,
}

impl GlobalConfig {
    pub fn parse_domains(&self) -> Result<Vec<DomainEntry>, RelayError> {
        self.domains
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|entry| {
                let (id, chain_type) = entry.split_once(':').ok_or_else(|| {
                    RelayError::Configuration(format!("malformed DOMAINS entry: {entry}"))
                })?;
                let id = id.parse::<u8>().map_err(|_| {
                    RelayError::Configuration(format!("invalid domain id in DOMAINS: {entry}"))
                })?;
                Ok(DomainEntry {
                    id,
                    chain_type: chain_type.to_string(),
                })
            })
            .collect()
    }
}

/// Per-domain configuration, mirroring `SPECTRE_DOMAINS_{id}_*` env vars.
#[derive(Debug, Clone)]
pub struct DomainConfig {
    pub id: u8,
    pub endpoint: String,
    pub key: String,
    pub beacon_endpoint: String,
    pub router: String,
    pub spectre: String,
    pub spec: String,
    pub max_gas_price: u64,
    pub gas_multiplier: u64,
    pub gas_increase_percentage: u64,
    pub retry_interval_secs: u64,
    pub committee_period_length: u64,
    pub starting_period: u64,
    pub force_period: bool,
    pub finality_threshold: u64,
    pub slots_per_epoch: u64,
    pub target_domains: Vec<u8>,
}

fn env_var(domain_id: u8, key: &str) -> String {
    format!("SPECTRE_DOMAINS_{domain_id}_{key}")
}

fn required(domain_id: u8, key: &str) -> Result<String, RelayError> {
    let var = env_var(domain_id, key);
    std::env::var(&var).map_err(|_| RelayError::Configuration(format!("missing required env var {var}")))
}

fn with_default(domain_id: u8, key: &str, default: &str) -> String {
    std::env::var(env_var(domain_id, key)).unwrap_or_else(|_| default.to_string())
}

fn parse_default<T: std::str::FromStr>(domain_id: u8, key: &str, default: T) -> Result<T, RelayError> {
    match std::env::var(env_var(domain_id, key)) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| RelayError::Configuration(format!("invalid value for {}", env_var(domain_id, key)))),
        Err(_) => Ok(default),
    }
}

impl DomainConfig {
    pub fn load(domain_id: u8) -> Result<Self, RelayError> {
        let target_domains = with_default(domain_id, "TARGET_DOMAINS", "");
        let target_domains = target_domains
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u8>()
                    .map_err(|_| RelayError::Configuration(format!("invalid TARGET_DOMAINS entry: {s}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: domain_id,
            endpoint: required(domain_id, "ENDPOINT")?,
            key: required(domain_id, "KEY")?,
            beacon_endpoint: required(domain_id, "BEACON_ENDPOINT")?,
            router: required(domain_id, "ROUTER")?,
            spectre: required(domain_id, "SPECTRE")?,
            spec: with_default(domain_id, "SPEC", "mainnet"),
            max_gas_price: parse_default(domain_id, "MAX_GAS_PRICE", 500_000_000_000u64)?,
            gas_multiplier: parse_default(domain_id, "GAS_MULTIPLIER", 1u64)?,
            gas_increase_percentage: parse_default(domain_id, "GAS_INCREASE_PERCENTAGE", 15u64)?,
            retry_interval_secs: parse_default(domain_id, "RETRY_INTERVAL", 12u64)?,
            committee_period_length: parse_default(domain_id, "COMMITTEE_PERIOD_LENGTH", 256u64)?,
            starting_period: required(domain_id, "STARTING_PERIOD")?.parse().map_err(|_| {
                RelayError::Configuration(format!("invalid STARTING_PERIOD for domain {domain_id}"))
            })?,
            force_period: parse_default(domain_id, "FORCE_PERIOD", false)?,
            finality_threshold: parse_default(domain_id, "FINALITY_THRESHOLD", 342u64)?,
            slots_per_epoch: parse_default(domain_id, "SLOTS_PER_EPOCH", 32u64)?,
            target_domains,
        })
    }
}

/// The fully resolved configuration: global settings plus one
/// `DomainConfig` per entry in `DOMAINS`.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub global: GlobalConfig,
    pub domains: HashMap<u8, DomainConfig>,
}

impl RelayConfig {
    pub fn load() -> Result<Self, RelayError> {
        let global = GlobalConfig::init_from_env()
            .map_err(|e| RelayError::Configuration(e.to_string()))?;
        let entries = global.parse_domains()?;
        let mut domains = HashMap::new();
        for entry in entries {
            domains.insert(entry.id, DomainConfig::load(entry.id)?);
        }
        Ok(Self { global, domains })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_domains_splits_id_and_type() {
        let cfg = GlobalConfig {
            prover_url: "http://localhost".into(),
            log_level: "debug".into(),
            log_file: "out.log".into(),
            health_port: 9001,
            domains: "1:evm, 2:evm".into(),
            store_path: "./store".into(),
        };
        let parsed = cfg.parse_domains().unwrap();
        assert_eq!(
            parsed,
            vec![
                DomainEntry { id: 1, chain_type: "evm".into() },
                DomainEntry { id: 2, chain_type: "evm".into() },
            ]
        );
    }

    #[test]
    fn parse_domains_rejects_malformed_entry() {
        let cfg = GlobalConfig {
            prover_url: "http://localhost".into(),
            log_level: "debug".into(),
            log_file: "out.log".into(),
            health_port: 9001,
            domains: "not-an-entry".into(),
            store_path: "./store".into(),
        };
        assert!(cfg.parse_domains().is_err());
    }
}
