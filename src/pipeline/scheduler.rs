//! Refill scheduler — decides when to fetch a page or backfill.
//!
//! Pure policy over observed depths; the controller performs the I/O.
//! Evaluated after every change to buffer depth or any bucket removal.

/// Refill policy and the monotonic page index.
///
/// Page indices are strictly increasing, one page per trigger. An index
/// handed out is consumed even if the fetch later fails: the failed
/// page is not retried and the next trigger moves past it.
#[derive(Debug)]
pub struct RefillScheduler {
    low_buffer_threshold: usize,
    capacity: usize,
    next_page: u64,
}

impl RefillScheduler {
    pub fn new(low_buffer_threshold: usize, capacity: usize) -> Self {
        Self {
            low_buffer_threshold,
            capacity,
            next_page: 0,
        }
    }

    /// Capacity backfill check: buckets below capacity and buffer
    /// non-empty. The caller then classifies exactly one message from
    /// the buffer head.
    pub fn should_backfill(&self, buffer_len: usize, total_bucketed: usize) -> bool {
        total_bucketed < self.capacity && buffer_len > 0
    }

    /// Low-buffer refill check: buffer below threshold and source not
    /// exhausted. Returns the page to fetch and advances the index;
    /// the index is consumed here, whether or not the fetch succeeds.
    pub fn next_fetch(&mut self, buffer_len: usize, exhausted: bool) -> Option<u64> {
        (buffer_len < self.low_buffer_threshold && !exhausted).then(|| {
            let page = self.next_page;
            self.next_page += 1;
            page
        })
    }

    /// Next page index that would be issued (for observability).
    pub fn next_page(&self) -> u64 {
        self.next_page
    }

    /// Rewind to page 0. Part of a full pipeline reset.
    pub fn reset(&mut self) {
        self.next_page = 0;
    }
}
