//! Orchestrator — §4.11: builds one pipeline per configured domain,
//! wiring them to a shared message bus and prover client, and owns the
//! shutdown sequence.

use std::sync::Arc;
use std::time::Duration;

use spectre_client::{HttpBeaconAdapter, JsonRpcProverClient, RouterLogFetcher};
use spectre_core::types::beacon::SpecTag;
use tokio_util::sync::CancellationToken;

use crate::bus::MessageBus;
use crate::collector::{DomainCollector, RouterDepositCollector};
use crate::config::RelayConfig;
use crate::executor::{Executor, TransactorConfig};
use crate::handlers::{RotateHandler, StepHandler};
use crate::health::HealthState;
use crate::listener::Listener;
use crate::store::{PeriodStore, SledPeriodStore};
use crate::transactor::LoggingTransactor;

pub struct Orchestrator {
    config: RelayConfig,
    store: Arc<dyn PeriodStore>,
    prover: Arc<JsonRpcProverClient>,
    health: HealthState,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(config: RelayConfig) -> Result<Self, crate::error::RelayError> {
        let store = Arc::new(SledPeriodStore::open(&config.global.store_path)?);
        let prover = Arc::new(JsonRpcProverClient::new(config.global.prover_url.clone()));
        let domain_ids: Vec<u8> = config.domains.keys().copied().collect();
        let health = HealthState::new(&domain_ids);
        Ok(Self {
            config,
            store,
            prover,
            health,
            cancel: CancellationToken::new(),
        })
    }

    pub fn health_state(&self) -> HealthState {
        self.health.clone()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Spawn one Listener task and one Executor task per configured
    /// domain, returning their join handles. Runs until `cancel()` is
    /// called on the returned token (or on `self`).
    pub async fn run(&self) -> Result<(), crate::error::RelayError> {
        let domain_ids: Vec<u8> = self.config.domains.keys().copied().collect();
        let (bus, mut receivers) = MessageBus::new(&domain_ids);
        let mut tasks = Vec::new();

        for (&domain_id, domain_config) in &self.config.domains {
            let beacon = Arc::new(HttpBeaconAdapter::new(domain_config.beacon_endpoint.clone()));
            let spec: SpecTag = domain_config.spec.parse().map_err(|_| {
                crate::error::RelayError::Configuration(format!("invalid SPEC for domain {domain_id}"))
            })?;

            let configured: Vec<u8> = if domain_config.target_domains.is_empty() {
                domain_ids.clone()
            } else {
                domain_config.target_domains.clone()
            };
            let destination_domains: Vec<u8> = configured
                .into_iter()
                .filter(|d| *d != domain_id && domain_ids.contains(d))
                .collect();

            let collectors: Vec<Box<dyn DomainCollector>> = vec![Box::new(RouterDepositCollector::new(
                RouterLogFetcher::new(domain_config.endpoint.clone(), domain_config.router.clone()),
            ))];

            let rotate = RotateHandler::new(
                domain_id,
                destination_domains.clone(),
                spec,
                domain_config.slots_per_epoch,
                domain_config.committee_period_length,
                domain_config.starting_period,
                domain_config.force_period,
                self.store.as_ref(),
            )
            .await?;

            let step = StepHandler::new(
                domain_id,
                destination_domains,
                spec,
                domain_config.slots_per_epoch,
                collectors,
            );

            let listener = Listener {
                domain_id,
                retry_interval: Duration::from_secs(domain_config.retry_interval_secs),
                slots_per_epoch: domain_config.slots_per_epoch,
            };

            let bus_clone = bus.clone();
            let store_clone = self.store.clone();
            let prover_clone = self.prover.clone();
            let health_clone = self.health.clone();
            let cancel_clone = self.cancel.clone();

            health_clone.mark_alive(domain_id);
            tasks.push(tokio::spawn(async move {
                listener
                    .run(
                        beacon.as_ref(),
                        prover_clone.as_ref(),
                        store_clone.as_ref(),
                        &bus_clone,
                        &rotate,
                        &step,
                        &cancel_clone,
                    )
                    .await;
                health_clone.mark_dead(domain_id);
            }));

            let receiver = receivers.remove(&domain_id).expect("bus created one receiver per domain");
            let transactor_config = TransactorConfig {
                max_gas_price: domain_config.max_gas_price,
                gas_multiplier: domain_config.gas_multiplier,
                gas_increase_percentage: domain_config.gas_increase_percentage,
            };
            let executor = Executor {
                destination_domain: domain_id,
                transactor: Box::new(LoggingTransactor::new(transactor_config)),
            };
            let executor_cancel = self.cancel.clone();
            tasks.push(tokio::spawn(async move {
                executor.run(receiver, executor_cancel).await;
            }));
        }

        for task in tasks {
            let _ = task.await;
        }
        Ok(())
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}
