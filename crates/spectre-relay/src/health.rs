//! `GET /healthz` — 200 while every configured listener task is alive,
//! per spec.md §7's user-visible behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

#[derive(Clone, Default)]
pub struct HealthState {
    liveness: Arc<HashMap<u8, AtomicBool>>,
}

impl HealthState {
    pub fn new(domain_ids: &[u8]) -> Self {
        Self {
            liveness: Arc::new(domain_ids.iter().map(|&id| (id, AtomicBool::new(false))).collect()),
        }
    }

    pub fn mark_alive(&self, domain_id: u8) {
        if let Some(flag) = self.liveness.get(&domain_id) {
            flag.store(true, Ordering::Release);
        }
    }

    pub fn mark_dead(&self, domain_id: u8) {
        if let Some(flag) = self.liveness.get(&domain_id) {
            flag.store(false, Ordering::Release);
        }
    }

    fn all_alive(&self) -> bool {
        self.liveness.values().all(|flag| flag.load(Ordering::Acquire))
    }
}

async fn healthz(State(state): State<HealthState>) -> StatusCode {
    if state.all_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/healthz", get(healthz)).with_state(state)
}

pub async fn serve(port: u16, state: HealthState, cancel: tokio_util::sync::CancellationToken) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "health endpoint listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_unhealthy_until_all_domains_mark_alive() {
        let state = HealthState::new(&[1, 2]);
        assert!(!state.all_alive());
        state.mark_alive(1);
        assert!(!state.all_alive());
        state.mark_alive(2);
        assert!(state.all_alive());
        state.mark_dead(1);
        assert!(!state.all_alive());
    }
}
