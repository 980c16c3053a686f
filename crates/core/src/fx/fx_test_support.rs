use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{RateProvider, RateRequest, RateSnapshot, SyncError};

/// Provider that replays canned responses, then empty snapshots.
pub(crate) struct StubProvider {
    calls: AtomicUsize,
    responses: Mutex<VecDeque<Result<RateSnapshot, SyncError>>>,
    delay: Duration,
}

impl StubProvider {
    pub(crate) fn new(responses: Vec<Result<RateSnapshot, SyncError>>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            responses: Mutex::new(responses.into()),
            delay: Duration::from_millis(20),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateProvider for StubProvider {
    fn id(&self) -> &'static str {
        "STUB"
    }

    async fn latest_rates(&self, request: &RateRequest) -> Result<RateSnapshot, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(RateSnapshot::new(request.base_currency.clone())))
    }
}
