use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::warn;

use crate::domain::{DeadLetterQueue, Error};

/// Dead-letter queue that turns every rejected operation into a `warn` event.
#[derive(Default, Debug)]
pub struct TracingDlq {
    reported: AtomicUsize,
}

impl TracingDlq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reported(&self) -> usize {
        self.reported.load(Ordering::Relaxed)
    }
}

impl DeadLetterQueue for TracingDlq {
    fn report(&self, error: &Error) {
        self.reported.fetch_add(1, Ordering::Relaxed);

        match error {
            Error::Account { account_id, source } => {
                let balance = source.balance();
                warn!(
                    account = %account_id,
                    available = balance.available,
                    blocked = balance.blocked,
                    "DLQ report: {}",
                    source
                );
            }
            other => warn!("DLQ report: {}", other),
        }
    }
}
