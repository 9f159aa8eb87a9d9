//! Host-side loop that feeds a record source into an [`OutputProcessor`].

use crate::processor::{Completion, OutputProcessor, StreamFlags};
use crate::record::Record;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Drives `start → process × N → done` over an iterator of records.
#[derive(Debug, Clone, Default)]
pub struct StreamDriver {
    flags: StreamFlags,
    completion: Completion,
}

impl StreamDriver {
    /// Driver for a historical (non-live) replay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the stream as live; `done` is then never called.
    #[must_use]
    pub fn live(mut self, live: bool) -> Self {
        self.flags.live = live;
        self
    }

    /// Handle shared with the processor; completing it stops delivery.
    #[must_use]
    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    /// Run the processor over `records`.
    ///
    /// Records are delivered one at a time, in order. A source error is passed
    /// to [`OutputProcessor::error`] and the loop moves on. Delivery stops
    /// early once the completion handle fires.
    ///
    /// Returns the number of records delivered.
    ///
    /// # Errors
    ///
    /// Returns an error only if [`OutputProcessor::start`] fails; in that
    /// case no record is delivered and `done` is not called.
    pub async fn run<P, I>(&self, processor: &mut P, records: I) -> Result<u64>
    where
        P: OutputProcessor + ?Sized,
        I: IntoIterator<Item = Result<Record>>,
    {
        processor
            .start()
            .await
            .with_context(|| format!("start {}", processor.name()))?;

        let mut delivered = 0u64;
        for item in records {
            if self.completion.is_complete() {
                debug!(delivered, "completion requested, stopping delivery");
                break;
            }
            match item {
                Ok(record) => {
                    processor.process(&record, self.flags, &self.completion).await;
                    delivered += 1;
                }
                Err(e) => processor.error(&e).await,
            }
        }

        if self.flags.live {
            info!(delivered, "live stream ended without done");
        } else {
            processor.done().await;
        }
        Ok(delivered)
    }
}
