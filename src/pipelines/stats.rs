use std::time::{Duration, Instant};

/// Statistics for a batched encoder run.
#[derive(Debug, Clone)]
pub struct EncoderStats {
    /// Wall-clock time from the first batch to the last pooled row.
    pub total_time: Duration,
    /// Number of texts embedded.
    pub items_processed: usize,
    /// Number of batches the corpus was split into.
    pub batches: usize,
}

impl EncoderStats {
    /// Create a new stats tracker (call at start of operation).
    pub(crate) fn start() -> EncoderStatsBuilder {
        EncoderStatsBuilder {
            start_time: Instant::now(),
        }
    }

    /// Texts per second over the whole run, 0.0 for an empty run.
    pub fn items_per_second(&self) -> f64 {
        let secs = self.total_time.as_secs_f64();
        if secs > 0.0 {
            self.items_processed as f64 / secs
        } else {
            0.0
        }
    }
}

/// Tracks timing from creation to `finish`.
pub(crate) struct EncoderStatsBuilder {
    start_time: Instant,
}

impl EncoderStatsBuilder {
    /// Finalize stats with the number of items and batches processed.
    pub fn finish(self, items_processed: usize, batches: usize) -> EncoderStats {
        EncoderStats {
            total_time: self.start_time.elapsed(),
            items_processed,
            batches,
        }
    }

    #[cfg(test)]
    pub(crate) fn started_at(start_time: Instant) -> Self {
        Self { start_time }
    }
}
