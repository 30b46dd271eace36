//! Decode-time statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters updated while decoding. Memory usage is read from
/// the store's ledger at snapshot time.
#[derive(Debug, Default)]
pub(crate) struct StatsCell {
    processed_packets: AtomicU64,
    malformed_packets: AtomicU64,
    records: AtomicU64,
    data_templates: AtomicU64,
    option_templates: AtomicU64,
    missing_template_errors: AtomicU64,
    expired_objects: AtomicU64,
}

impl StatsCell {
    pub(crate) fn inc_processed_packets(&self) {
        self.processed_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_malformed_packets(&self) {
        self.malformed_packets.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_records(&self) {
        self.records.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_data_templates(&self) {
        self.data_templates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_option_templates(&self) {
        self.option_templates.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_missing_template_errors(&self) {
        self.missing_template_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_expired_objects(&self) {
        self.expired_objects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, memory_usage: usize) -> Stats {
        Stats {
            processed_packets: self.processed_packets.load(Ordering::Relaxed),
            malformed_packets: self.malformed_packets.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
            data_templates: self.data_templates.load(Ordering::Relaxed),
            option_templates: self.option_templates.load(Ordering::Relaxed),
            missing_template_errors: self.missing_template_errors.load(Ordering::Relaxed),
            expired_objects: self.expired_objects.load(Ordering::Relaxed),
            memory_usage,
        }
    }
}

/// A point-in-time snapshot of the decoder's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Decode calls, including ones that failed.
    pub processed_packets: u64,
    /// Decode calls that failed.
    pub malformed_packets: u64,
    /// Data flowsets seen.
    pub records: u64,
    /// Template flowsets seen.
    pub data_templates: u64,
    /// Options template flowsets seen.
    pub option_templates: u64,
    /// Data flowsets dropped because no template was cached for them.
    pub missing_template_errors: u64,
    /// Cached templates and option records removed by expiry.
    pub expired_objects: u64,
    /// Bytes currently held by the template and option caches.
    pub memory_usage: usize,
}
