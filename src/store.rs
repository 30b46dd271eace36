//! Per-exporter cache of templates, option records and sampling rates.
//!
//! The store owns everything that outlives a single decode call. Memory
//! held by cached entries is accounted against a configurable ceiling;
//! when an insert would cross it, entries older than the expiry time are
//! swept once and the insert retried before giving up.

use std::collections::HashMap;
use std::hash::Hash;
use std::mem;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::error::Error;
use crate::fields::FieldId;
use crate::packet::Record;
use crate::stats::StatsCell;
use crate::template::{DeviceId, StreamKey, Template};

/// Tracks bytes live in the store and rejects allocations past the limit.
#[derive(Debug)]
pub(crate) struct MemoryLedger {
    used: AtomicUsize,
    limit: AtomicUsize,
}

impl MemoryLedger {
    fn new(limit: usize) -> Self {
        MemoryLedger {
            used: AtomicUsize::new(0),
            limit: AtomicUsize::new(limit),
        }
    }

    fn allocate(&self, bytes: usize) -> Result<(), Error> {
        let limit = self.limit.load(Ordering::Relaxed);
        self.used
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                used.checked_add(bytes).filter(|&total| total <= limit)
            })
            .map(|_| ())
            .map_err(|_| Error::OutOfMemory)
    }

    fn release(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::Relaxed);
    }

    fn set_limit(&self, bytes: usize) {
        self.limit.store(bytes, Ordering::Relaxed);
    }

    fn used(&self) -> usize {
        self.used.load(Ordering::Relaxed)
    }
}

/// The most recent option values seen from one device.
#[derive(Debug, Clone)]
pub(crate) struct OptionRecord {
    fields: Vec<(FieldId, Vec<u8>)>,
    timestamp: u32,
}

impl OptionRecord {
    pub(crate) fn from_record(record: &Record, timestamp: u32) -> Self {
        OptionRecord {
            fields: record.fields().to_vec(),
            timestamp,
        }
    }

    fn get(&self, field: FieldId) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, value)| value.as_slice())
    }

    fn cost(&self) -> usize {
        mem::size_of::<Self>()
            + self
                .fields
                .iter()
                .map(|(_, value)| mem::size_of::<(FieldId, Vec<u8>)>() + value.len())
                .sum::<usize>()
    }
}

/// Entries subject to expiry sweeps and ledger accounting.
trait Cached {
    fn timestamp(&self) -> u32;
    fn cost(&self) -> usize;
}

impl Cached for Template {
    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn cost(&self) -> usize {
        Template::cost(self)
    }
}

impl Cached for OptionRecord {
    fn timestamp(&self) -> u32 {
        self.timestamp
    }

    fn cost(&self) -> usize {
        OptionRecord::cost(self)
    }
}

/// Evicts every entry whose timestamp is at or before `now - expiry`,
/// releasing its bytes. Returns the number evicted; zero tells the caller
/// that no headroom was freed.
fn sweep_expired<K, V>(
    map: &mut HashMap<K, V>,
    ledger: &MemoryLedger,
    stats: &StatsCell,
    now: u32,
    expiry: u32,
) -> usize
where
    K: Eq + Hash,
    V: Cached,
{
    let cutoff = now.saturating_sub(expiry);
    let before = map.len();
    map.retain(|_, entry| {
        if entry.timestamp() <= cutoff {
            ledger.release(entry.cost());
            stats.inc_expired_objects();
            false
        } else {
            true
        }
    });
    before - map.len()
}

#[derive(Debug, Default)]
struct SamplingRates {
    by_device: HashMap<(DeviceId, u32), u32>,
    by_exporter: HashMap<(SocketAddr, u32), u32>,
}

#[derive(Debug)]
pub(crate) struct Store {
    ledger: MemoryLedger,
    templates: Mutex<HashMap<StreamKey, Template>>,
    options: Mutex<HashMap<DeviceId, OptionRecord>>,
    sampling: Mutex<SamplingRates>,
    template_expiry: AtomicU32,
    options_expiry: AtomicU32,
}

impl Store {
    pub(crate) fn new(max_memory: usize, template_expiry: u32, options_expiry: u32) -> Self {
        Store {
            ledger: MemoryLedger::new(max_memory),
            templates: Mutex::new(HashMap::new()),
            options: Mutex::new(HashMap::new()),
            sampling: Mutex::new(SamplingRates::default()),
            template_expiry: AtomicU32::new(template_expiry),
            options_expiry: AtomicU32::new(options_expiry),
        }
    }

    pub(crate) fn template_expiry(&self) -> u32 {
        self.template_expiry.load(Ordering::Relaxed)
    }

    fn options_expiry(&self) -> u32 {
        self.options_expiry.load(Ordering::Relaxed)
    }

    pub(crate) fn set_memory_limit(&self, bytes: usize) {
        self.ledger.set_limit(bytes);
    }

    pub(crate) fn set_template_expiry(&self, secs: u32) {
        self.template_expiry.store(secs, Ordering::Relaxed);
    }

    pub(crate) fn set_options_expiry(&self, secs: u32) {
        self.options_expiry.store(secs, Ordering::Relaxed);
    }

    pub(crate) fn memory_usage(&self) -> usize {
        self.ledger.used()
    }

    /// Installs or refreshes a template. A template with an older header
    /// timestamp than the cached one is discarded: the cache already
    /// holds newer information, which still counts as success.
    pub(crate) fn save_template(
        &self,
        key: StreamKey,
        template: Template,
        stats: &StatsCell,
    ) -> Result<(), Error> {
        if template.total_length == 0 {
            return Err(Error::Malformed);
        }

        let mut templates = self.templates.lock();
        if let Some(existing) = templates.get(&key) {
            if existing.timestamp > template.timestamp {
                return Ok(());
            }
        }

        let cost = template.cost();
        if self.ledger.allocate(cost).is_err() {
            let evicted = sweep_expired(
                &mut templates,
                &self.ledger,
                stats,
                template.timestamp,
                self.template_expiry(),
            );
            debug!(
                "template cache full, expiry sweep evicted {} entries",
                evicted
            );
            if evicted == 0 {
                return Err(Error::OutOfMemory);
            }
            self.ledger.allocate(cost)?;
        }

        if let Some(replaced) = templates.insert(key, template) {
            self.ledger.release(replaced.cost());
        }
        Ok(())
    }

    /// Finds the template for a data flowset. A missing entry counts a
    /// missing-template error; an entry older than the expiry time is
    /// removed and reported as `Outdated`. The template is returned by
    /// value so no lock is held while records are decoded.
    pub(crate) fn lookup_template(
        &self,
        key: StreamKey,
        header_timestamp: u32,
        stats: &StatsCell,
    ) -> Result<Template, Error> {
        let mut templates = self.templates.lock();
        let Some(template) = templates.get(&key) else {
            stats.inc_missing_template_errors();
            return Err(Error::NotFound);
        };

        let age = header_timestamp.saturating_sub(template.timestamp);
        if age > self.template_expiry() {
            let expired = templates.remove(&key).expect("entry just looked up");
            self.ledger.release(expired.cost());
            stats.inc_expired_objects();
            return Err(Error::Outdated);
        }

        Ok(template.clone())
    }

    /// Replaces the device's option record; the last record wins.
    pub(crate) fn save_option(
        &self,
        device: DeviceId,
        record: OptionRecord,
        stats: &StatsCell,
    ) -> Result<(), Error> {
        let mut options = self.options.lock();

        let cost = record.cost();
        if self.ledger.allocate(cost).is_err() {
            let evicted = sweep_expired(
                &mut options,
                &self.ledger,
                stats,
                record.timestamp,
                self.options_expiry(),
            );
            debug!(
                "option cache full, expiry sweep evicted {} entries",
                evicted
            );
            if evicted == 0 {
                return Err(Error::OutOfMemory);
            }
            self.ledger.allocate(cost)?;
        }

        if let Some(replaced) = options.insert(device, record) {
            self.ledger.release(replaced.cost());
        }
        Ok(())
    }

    /// Reads one field from the device's current option record.
    pub(crate) fn get_option(&self, device: DeviceId, field: FieldId) -> Option<Vec<u8>> {
        let options = self.options.lock();
        options.get(&device)?.get(field).map(<[u8]>::to_vec)
    }

    /// Records a sampling rate under both the exact device key and the
    /// exporter-address fallback key. Updates overwrite.
    pub(crate) fn save_sampling_rate(&self, device: DeviceId, sampler_id: u32, rate: u32) {
        let mut sampling = self.sampling.lock();
        sampling.by_device.insert((device, sampler_id), rate);
        sampling
            .by_exporter
            .insert((device.exporter, sampler_id), rate);
    }

    pub(crate) fn sampling_rate_by_device(&self, device: DeviceId, sampler_id: u32) -> Option<u32> {
        self.sampling
            .lock()
            .by_device
            .get(&(device, sampler_id))
            .copied()
    }

    pub(crate) fn sampling_rate_by_exporter(
        &self,
        exporter: SocketAddr,
        sampler_id: u32,
    ) -> Option<u32> {
        self.sampling
            .lock()
            .by_exporter
            .get(&(exporter, sampler_id))
            .copied()
    }

    #[cfg(test)]
    fn template_count(&self) -> usize {
        self.templates.lock().len()
    }
}
