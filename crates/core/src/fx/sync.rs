//! Rate sync scheduling: staleness gate, single-flight fetch, reconcile.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};

use super::fx_errors::SyncError;
use super::fx_model::{CurrencyRate, RateRequest};
use super::fx_traits::{CurrencyRepositoryTrait, RateProvider};
use super::reconciler::RateReconciler;
use crate::config::RatesConfig;
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};
use crate::utils::{is_fresh, Clock, SystemClock};

type SyncResult = std::result::Result<Arc<Vec<CurrencyRate>>, SyncError>;
type InFlight = Shared<BoxFuture<'static, SyncResult>>;

/// What a `refresh` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// Rates were fresh; the store contents were returned without a fetch.
    Fresh(Vec<CurrencyRate>),
    /// Rates were fetched and reconciled (possibly by a call this one joined).
    Synced(Vec<CurrencyRate>),
}

impl SyncOutcome {
    pub fn rates(&self) -> &[CurrencyRate] {
        match self {
            SyncOutcome::Fresh(rates) | SyncOutcome::Synced(rates) => rates,
        }
    }

    pub fn into_rates(self) -> Vec<CurrencyRate> {
        match self {
            SyncOutcome::Fresh(rates) | SyncOutcome::Synced(rates) => rates,
        }
    }

    pub fn fetched(&self) -> bool {
        matches!(self, SyncOutcome::Synced(_))
    }
}

#[derive(Default)]
struct SyncState {
    last_sync_at: Option<DateTime<Utc>>,
    in_flight: Option<InFlight>,
}

/// Decides when to hit the remote provider and drives the reconciler.
///
/// At most one fetch is in flight at a time: a `refresh` that arrives while a
/// fetch is running joins it and gets the same result, whether it was forced
/// or not. Clones share that state.
#[derive(Clone)]
pub struct RateSyncService {
    provider: Arc<dyn RateProvider>,
    reconciler: RateReconciler,
    clock: Arc<dyn Clock>,
    event_sink: Arc<dyn DomainEventSink>,
    request: Arc<RateRequest>,
    ttl: Duration,
    state: Arc<Mutex<SyncState>>,
}

impl RateSyncService {
    pub fn new(
        config: &RatesConfig,
        provider: Arc<dyn RateProvider>,
        repository: Arc<dyn CurrencyRepositoryTrait>,
    ) -> Self {
        Self {
            provider,
            reconciler: RateReconciler::new(repository),
            clock: Arc::new(SystemClock),
            event_sink: Arc::new(NoOpDomainEventSink),
            request: Arc::new(RateRequest {
                api_key: config.api_key.clone(),
                currency_codes: config.currencies.clone(),
                base_currency: config.base_currency.clone(),
            }),
            ttl: config.ttl,
            state: Arc::new(Mutex::new(SyncState::default())),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the domain event sink for this service.
    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn base_currency(&self) -> &str {
        &self.request.base_currency
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.state().last_sync_at
    }

    pub fn is_syncing(&self) -> bool {
        self.state().in_flight.is_some()
    }

    pub fn repository(&self) -> &Arc<dyn CurrencyRepositoryTrait> {
        self.reconciler.repository()
    }

    /// Current store contents for the configured base.
    pub fn stored_rates(&self) -> Result<Vec<CurrencyRate>> {
        self.repository().list_by_base(self.base_currency())
    }

    /// True when `refresh(force)` would start or join a fetch.
    pub fn needs_fetch(&self, force: bool) -> bool {
        let state = self.state();
        force
            || state.in_flight.is_some()
            || !is_fresh(state.last_sync_at, self.clock.now(), self.ttl)
    }

    /// Seeds `last_sync_at` from the newest stored record so a restart inside
    /// the freshness window does not refetch.
    pub fn restore_last_sync(&self) -> Result<Option<DateTime<Utc>>> {
        let stored = self.repository().latest_update(self.base_currency())?;
        let mut state = self.state();
        state.last_sync_at = match (state.last_sync_at, stored) {
            (Some(known), Some(stored)) => Some(known.max(stored)),
            (known, stored) => known.or(stored),
        };
        Ok(state.last_sync_at)
    }

    /// Fetches and reconciles unless rates are still fresh.
    ///
    /// On failure the store and `last_sync_at` are left as they were. There is
    /// no retry; call again to retry.
    pub async fn refresh(&self, force: bool) -> std::result::Result<SyncOutcome, SyncError> {
        self.refresh_with(force, || {}).await
    }

    /// Like [`refresh`](Self::refresh), calling `on_fetch` once, before
    /// waiting, when this call starts or joins a remote fetch.
    pub async fn refresh_with(
        &self,
        force: bool,
        on_fetch: impl FnOnce(),
    ) -> std::result::Result<SyncOutcome, SyncError> {
        let in_flight = {
            let mut state = self.state();
            if let Some(running) = state.in_flight.clone() {
                log::debug!("Joining in-flight rate sync");
                running
            } else if !force && is_fresh(state.last_sync_at, self.clock.now(), self.ttl) {
                drop(state);
                log::debug!("Rates are fresh; serving stored rates");
                let rates = self
                    .stored_rates()
                    .map_err(|e| SyncError::Store(e.to_string()))?;
                return Ok(SyncOutcome::Fresh(rates));
            } else {
                let running = self.clone().run().boxed().shared();
                state.in_flight = Some(running.clone());
                running
            }
        };
        on_fetch();

        let rates = in_flight.await?;
        Ok(SyncOutcome::Synced(rates.as_ref().clone()))
    }

    async fn fetch_and_reconcile(&self) -> SyncResult {
        log::info!(
            "Fetching {} rates against {} from {}",
            self.request.currency_codes.len(),
            self.request.base_currency,
            self.provider.id()
        );
        let snapshot = self.provider.latest_rates(&self.request).await?;

        let rates = self
            .reconciler
            .apply(&snapshot, self.base_currency(), self.clock.now())
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;
        Ok(Arc::new(rates))
    }

    async fn run(self) -> SyncResult {
        let result = self.fetch_and_reconcile().await;
        {
            let mut state = self.state();
            state.in_flight = None;
            if result.is_ok() {
                state.last_sync_at = Some(self.clock.now());
            }
        }

        let base = self.base_currency().to_string();
        match &result {
            Ok(rates) => {
                log::info!("Rate sync for {} stored {} records", base, rates.len());
                self.event_sink.emit(DomainEvent::rates_synced(
                    base,
                    rates.iter().map(|r| r.code.clone()).collect(),
                ));
            }
            Err(e) => {
                log::error!("Rate sync for {} failed: {}", base, e);
                self.event_sink
                    .emit(DomainEvent::rates_sync_failed(base, e.to_string()));
            }
        }
        result
    }
}
