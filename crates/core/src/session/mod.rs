//! Screen-facing facade over the rate graph and the sync service.
//!
//! A [`CurrencySession`] owns the graph for one screen: the currency
//! collection, its filter inputs and every view derived from them. It is
//! `!Send`; background sync runs on the [`WorkerPool`] and comes back as
//! [`SessionEvent`]s that the owner applies with [`CurrencySession::process_pending`]
//! or [`CurrencySession::next_update`].

use std::cell::Cell;
use std::sync::Arc;

use crate::config::RatesConfig;
use crate::constants::POPULAR_CURRENCIES;
use crate::errors::Result;
use crate::fx::{
    CurrencyConverter, CurrencyCriteria, CurrencyFilters, CurrencyRate, CurrencyRepositoryTrait,
    CurrencySortOrder, FxError, RateProvider, RateSyncService, SyncError, SyncOutcome,
};
use crate::reactive::{DerivedView, Dispatcher, Observable, WorkerPool};

/// Result of one background refresh, delivered to the owning context.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The background refresh started or joined a remote fetch.
    FetchStarted,
    Refreshed(SyncOutcome),
    Failed(SyncError),
}

pub struct CurrencySession {
    sync: RateSyncService,
    pool: WorkerPool,
    dispatcher: Dispatcher<SessionEvent>,
    pending: Cell<usize>,
    currencies: Observable<Arc<[CurrencyRate]>>,
    filters: CurrencyFilters,
    filtered: DerivedView<Arc<[CurrencyRate]>>,
    popular: DerivedView<Arc<[CurrencyRate]>>,
    base: DerivedView<Option<CurrencyRate>>,
    loading: Observable<bool>,
    errors: Observable<Option<SyncError>>,
}

impl CurrencySession {
    /// Builds a session seeded with the current store contents.
    pub fn new(sync: RateSyncService, pool: WorkerPool) -> Result<Self> {
        let stored = sync.stored_rates()?;
        let currencies: Observable<Arc<[CurrencyRate]>> = Observable::new(Arc::from(stored));
        let filters = CurrencyFilters::new();
        let filtered = filters.pipeline(&currencies)?;

        let popular = DerivedView::map(&currencies, |rates: Arc<[CurrencyRate]>| {
            let picked: Vec<CurrencyRate> = POPULAR_CURRENCIES
                .iter()
                .filter_map(|code| rates.iter().find(|r| r.code == *code).cloned())
                .collect();
            Arc::from(picked)
        });

        let base_code = sync.base_currency().to_string();
        let base = DerivedView::map(&currencies, move |rates: Arc<[CurrencyRate]>| {
            rates.iter().find(|r| r.code == base_code).cloned()
        });

        Ok(Self {
            sync,
            pool,
            dispatcher: Dispatcher::new(),
            pending: Cell::new(0),
            currencies,
            filters,
            filtered,
            popular,
            base,
            loading: Observable::new(false),
            errors: Observable::new(None),
        })
    }

    /// Wires a session from configuration on the current tokio runtime and
    /// restores the last sync time from the store.
    pub fn open(
        config: &RatesConfig,
        provider: Arc<dyn RateProvider>,
        repository: Arc<dyn CurrencyRepositoryTrait>,
    ) -> Result<Self> {
        let sync = RateSyncService::new(config, provider, repository);
        if let Some(at) = sync.restore_last_sync()? {
            log::debug!("Last rate sync for {} was at {}", sync.base_currency(), at);
        }
        let pool = WorkerPool::new(config.worker_count)?;
        Self::new(sync, pool)
    }

    pub fn sync_service(&self) -> &RateSyncService {
        &self.sync
    }

    pub fn filtered_currencies(&self) -> &DerivedView<Arc<[CurrencyRate]>> {
        &self.filtered
    }

    pub fn all_currencies(&self) -> &Observable<Arc<[CurrencyRate]>> {
        &self.currencies
    }

    pub fn popular_currencies(&self) -> &DerivedView<Arc<[CurrencyRate]>> {
        &self.popular
    }

    pub fn base_currency(&self) -> &DerivedView<Option<CurrencyRate>> {
        &self.base
    }

    pub fn is_loading(&self) -> &Observable<bool> {
        &self.loading
    }

    /// Last sync failure, cleared by the next successful fetch.
    pub fn errors(&self) -> &Observable<Option<SyncError>> {
        &self.errors
    }

    pub fn criteria(&self) -> CurrencyCriteria {
        self.filters.criteria()
    }

    pub fn set_code_filter(&self, code: Option<String>) {
        self.filters.set_code(code);
    }

    pub fn set_min_rate(&self, min: Option<f64>) {
        self.filters.set_min_rate(min);
    }

    pub fn set_max_rate(&self, max: Option<f64>) {
        self.filters.set_max_rate(max);
    }

    pub fn set_search_query(&self, query: Option<String>) {
        self.filters.set_search(query);
    }

    pub fn set_sort_order(&self, order: CurrencySortOrder) {
        self.filters.set_sort_order(order);
    }

    pub fn reset_filters(&self) {
        self.filters.reset();
    }

    /// Starts a refresh on the worker pool and returns immediately.
    ///
    /// `loading` turns true before this returns when a fetch looks due, and
    /// again on [`SessionEvent::FetchStarted`] if the rates went stale before
    /// the background task decided. A fresh cache just republishes the stored
    /// rates.
    pub fn refresh(&self, force: bool) {
        if self.sync.needs_fetch(force) && !self.loading.get() {
            self.loading.set(true);
        }
        self.pending.set(self.pending.get() + 1);

        let sync = self.sync.clone();
        let sender = self.dispatcher.sender();
        self.pool.spawn(async move {
            let started = sender.clone();
            let fetching = move || {
                started.send(SessionEvent::FetchStarted);
            };
            let event = match sync.refresh_with(force, fetching).await {
                Ok(outcome) => SessionEvent::Refreshed(outcome),
                Err(e) => SessionEvent::Failed(e),
            };
            sender.send(event);
        });
    }

    /// Applies every event that has already arrived. Returns how many
    /// refresh results were among them.
    pub fn process_pending(&mut self) -> usize {
        let mut finished = 0;
        while let Some(event) = self.dispatcher.try_next() {
            if self.apply(event) {
                finished += 1;
            }
        }
        finished
    }

    /// Waits for the next refresh result and applies it.
    ///
    /// Returns `None` straight away when no refresh is outstanding.
    pub async fn next_update(&mut self) -> Option<SessionEvent> {
        if self.pending.get() == 0 {
            return None;
        }
        while let Some(event) = self.dispatcher.next().await {
            if self.apply(event.clone()) {
                return Some(event);
            }
        }
        None
    }

    /// Returns true when `event` finished a refresh.
    fn apply(&self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::FetchStarted => {
                if !self.loading.get() {
                    self.loading.set(true);
                }
                return false;
            }
            SessionEvent::Refreshed(outcome) => {
                if outcome.fetched() && self.errors.with(Option::is_some) {
                    self.errors.set(None);
                }
                self.currencies.set(Arc::from(outcome.into_rates()));
            }
            SessionEvent::Failed(e) => {
                log::warn!("Showing rate sync failure: {}", e);
                self.errors.set(Some(e));
            }
        }
        self.pending.set(self.pending.get().saturating_sub(1));
        if self.pending.get() == 0 && self.loading.get() {
            self.loading.set(false);
        }
        true
    }

    /// A view tracking the record for `code`; `None` while it is not stored.
    pub fn currency_by_code(&self, code: &str) -> DerivedView<Option<CurrencyRate>> {
        let code = code.to_string();
        DerivedView::map(&self.currencies, move |rates: Arc<[CurrencyRate]>| {
            rates
                .iter()
                .find(|r| r.code.eq_ignore_ascii_case(&code))
                .cloned()
        })
    }

    /// Converts between two codes using the rates currently shown.
    pub fn convert(&self, amount: f64, from_code: &str, to_code: &str) -> Result<f64> {
        self.currencies.with(|rates| -> Result<f64> {
            let find = |code: &str| {
                rates
                    .iter()
                    .find(|r| r.code.eq_ignore_ascii_case(code))
                    .ok_or_else(|| FxError::UnknownCurrency(code.to_string()))
            };
            let from = find(from_code)?;
            let to = find(to_code)?;
            Ok(CurrencyConverter::convert(amount, from, to)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::fx::fx_test_support::StubProvider;
    use crate::fx::{InMemoryCurrencyRepository, RateSnapshot};
    use crate::utils::ManualClock;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn snapshot() -> RateSnapshot {
        RateSnapshot::new("RUB")
            .with_rate("USD", 0.012)
            .with_rate("EUR", 0.0106)
            .with_rate("JPY", 1.6)
    }

    fn session(
        responses: Vec<std::result::Result<RateSnapshot, SyncError>>,
    ) -> (CurrencySession, Arc<StubProvider>) {
        let provider = StubProvider::new(responses);
        let config = RatesConfig::default();
        let session = CurrencySession::open(
            &config,
            provider.clone(),
            Arc::new(InMemoryCurrencyRepository::new()),
        )
        .unwrap();
        (session, provider)
    }

    #[tokio::test]
    async fn test_refresh_sets_loading_then_publishes_rates() {
        let (mut session, _provider) = session(vec![Ok(snapshot())]);
        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&states);
        let _sub = session.is_loading().subscribe(move |v| sink.borrow_mut().push(*v));

        session.refresh(false);
        assert!(session.is_loading().get());

        let event = session.next_update().await.unwrap();
        assert!(matches!(event, SessionEvent::Refreshed(ref o) if o.fetched()));
        assert_eq!(*states.borrow(), vec![false, true, false]);

        let codes: Vec<_> = session
            .filtered_currencies()
            .get()
            .iter()
            .map(|r| r.code.clone())
            .collect();
        assert_eq!(codes, vec!["EUR", "JPY", "RUB", "USD"]);

        let popular: Vec<_> = session
            .popular_currencies()
            .get()
            .iter()
            .map(|r| r.code.clone())
            .collect();
        assert_eq!(popular, vec!["RUB", "USD", "EUR"]);
        assert_eq!(session.base_currency().get().unwrap().rate, 1.0);
    }

    #[tokio::test]
    async fn test_fresh_refresh_does_not_show_loading() {
        let (mut session, provider) = session(vec![Ok(snapshot())]);
        session.refresh(false);
        session.next_update().await.unwrap();

        session.refresh(false);
        assert!(!session.is_loading().get());
        let event = session.next_update().await.unwrap();
        assert!(matches!(event, SessionEvent::Refreshed(SyncOutcome::Fresh(_))));
        assert_eq!(provider.calls(), 1);
        assert!(session.next_update().await.is_none());
    }

    #[tokio::test]
    async fn test_loading_follows_fetch_when_rates_expire_before_task_runs() {
        let provider = StubProvider::new(vec![Ok(snapshot()), Ok(snapshot())]);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let sync = RateSyncService::new(
            &RatesConfig::default(),
            provider.clone(),
            Arc::new(InMemoryCurrencyRepository::new()),
        )
        .with_clock(clock.clone());
        let mut session = CurrencySession::new(sync, WorkerPool::new(1).unwrap()).unwrap();
        session.refresh(false);
        session.next_update().await.unwrap();

        let states = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&states);
        let _sub = session.is_loading().subscribe(move |v| sink.borrow_mut().push(*v));

        // Still fresh when requested; stale by the time the task decides.
        session.refresh(false);
        assert!(!session.is_loading().get());
        clock.advance(chrono::Duration::seconds(61));

        let event = session.next_update().await.unwrap();
        assert!(matches!(event, SessionEvent::Refreshed(ref o) if o.fetched()));
        assert_eq!(provider.calls(), 2);
        assert_eq!(*states.borrow(), vec![false, true, false]);
    }

    #[tokio::test]
    async fn test_failure_is_published_and_rates_kept() {
        let (mut session, _provider) = session(vec![
            Ok(snapshot()),
            Err(SyncError::RemoteProtocol("HTTP 429".to_string())),
        ]);
        session.refresh(false);
        session.next_update().await.unwrap();
        let before = session.all_currencies().get();

        session.refresh(true);
        session.next_update().await.unwrap();
        assert_eq!(
            session.errors().get(),
            Some(SyncError::RemoteProtocol("HTTP 429".to_string()))
        );
        assert!(!session.is_loading().get());
        assert_eq!(session.all_currencies().get(), before);
    }

    #[tokio::test]
    async fn test_lookup_and_convert_follow_the_collection() {
        let (mut session, _provider) = session(vec![Ok(snapshot())]);
        let usd = session.currency_by_code("usd");
        assert_eq!(usd.get(), None);
        assert!(matches!(
            session.convert(1.0, "USD", "EUR"),
            Err(Error::Fx(FxError::UnknownCurrency(_)))
        ));

        session.refresh(false);
        session.next_update().await.unwrap();
        assert_eq!(usd.get().map(|r| r.rate), Some(0.012));

        let eur = session.convert(100.0, "USD", "EUR").unwrap();
        assert!((eur - 88.333).abs() < 1e-3);
        assert!((session.convert(10.0, "EUR", "RUB").unwrap() - 943.396).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_filters_apply_to_synced_rates() {
        let (mut session, _provider) = session(vec![Ok(snapshot())]);
        session.set_max_rate(Some(0.05));
        session.set_sort_order(CurrencySortOrder::RateDesc);
        session.refresh(false);
        session.next_update().await.unwrap();

        let codes: Vec<_> = session
            .filtered_currencies()
            .get()
            .iter()
            .map(|r| r.code.clone())
            .collect();
        assert_eq!(codes, vec!["USD", "EUR"]);

        session.reset_filters();
        assert_eq!(session.criteria(), CurrencyCriteria::default());
        assert_eq!(session.filtered_currencies().get().len(), 4);
    }
}
