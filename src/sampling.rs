//! Sampling-rate extraction and resolution.
//!
//! Exporters describe their packet samplers through options records
//! carrying `FLOW_SAMPLER_ID` and `FLOW_SAMPLER_RANDOM_INTERVAL`. Both
//! values appear on the wire at widths from 1 to 4 bytes depending on the
//! template; they are normalised to `u32` so the same sampler id hashes
//! to the same key regardless of encoded width.

use crate::fields::{self, FieldId};
use crate::packet::Record;
use crate::store::Store;
use crate::template::DeviceId;

/// Outcome of a sampling-rate query for one data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingResolution {
    /// Matched on exporter address, source id and sampler id.
    Device(u32),
    /// Matched on exporter address and sampler id, ignoring source id.
    /// Used when the exporter varies its source id between option and
    /// data packets.
    Exporter(u32),
    /// The record carries no usable `FLOW_SAMPLER_ID` field.
    SamplerIdNotFound,
    /// No options record has provided a rate for this sampler yet.
    RateNotFound,
}

/// Reads a 1- to 4-byte network-order unsigned integer.
fn read_narrow_u32(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || bytes.len() > 4 {
        return None;
    }
    Some(bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
}

/// Extracts the sampler id and rate from an options record and stores the
/// rate under both sampler keys. Records without both fields, or with
/// fields wider than 4 bytes, are ignored.
pub(crate) fn save_sampling_info(store: &Store, device: DeviceId, record: &Record) {
    let Some(rate) = record
        .get(FieldId::data(fields::FLOW_SAMPLER_RANDOM_INTERVAL))
        .and_then(read_narrow_u32)
    else {
        return;
    };
    let Some(sampler_id) = record
        .get(FieldId::data(fields::FLOW_SAMPLER_ID))
        .and_then(read_narrow_u32)
    else {
        return;
    };

    store.save_sampling_rate(device, sampler_id, rate);
}

/// Finds the sampling rate applicable to one data record: first under the
/// exact device key, then under the exporter-address fallback.
pub(crate) fn resolve(store: &Store, device: DeviceId, record: &Record) -> SamplingResolution {
    let Some(sampler_id) = record
        .get(FieldId::data(fields::FLOW_SAMPLER_ID))
        .and_then(read_narrow_u32)
    else {
        return SamplingResolution::SamplerIdNotFound;
    };

    if let Some(rate) = store.sampling_rate_by_device(device, sampler_id) {
        return SamplingResolution::Device(rate);
    }
    if let Some(rate) = store.sampling_rate_by_exporter(device.exporter, sampler_id) {
        return SamplingResolution::Exporter(rate);
    }
    SamplingResolution::RateNotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn device(source_id: u32) -> DeviceId {
        DeviceId {
            exporter: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 2055),
            source_id,
        }
    }

    fn options_record(sampler_id: &[u8], rate: &[u8]) -> Record {
        let mut record = Record::default();
        record.push(FieldId::data(fields::FLOW_SAMPLER_ID), sampler_id.to_vec());
        record.push(
            FieldId::data(fields::FLOW_SAMPLER_RANDOM_INTERVAL),
            rate.to_vec(),
        );
        record
    }

    #[test]
    fn narrow_widths_decode_to_same_value() {
        assert_eq!(read_narrow_u32(&[1]), Some(1));
        assert_eq!(read_narrow_u32(&[0, 1]), Some(1));
        assert_eq!(read_narrow_u32(&[0, 0, 0, 1]), Some(1));
        assert_eq!(read_narrow_u32(&[0x12, 0x34]), Some(0x1234));
        assert_eq!(read_narrow_u32(&[]), None);
        assert_eq!(read_narrow_u32(&[0, 0, 0, 0, 1]), None);
    }

    #[test]
    fn rate_saved_under_any_sampler_id_width() {
        let store = Store::new(1 << 20, 900, 900);

        // Sampler 1 at three different encoded widths; each save
        // overwrites the same key.
        save_sampling_info(&store, device(1), &options_record(&[1], &[0, 0, 0, 100]));
        save_sampling_info(&store, device(1), &options_record(&[0, 1], &[0, 0, 1, 44]));

        assert_eq!(store.sampling_rate_by_device(device(1), 1), Some(300));
    }

    #[test]
    fn record_without_sampler_fields_is_ignored() {
        let store = Store::new(1 << 20, 900, 900);
        let mut record = Record::default();
        record.push(FieldId::data(fields::FLOW_SAMPLER_ID), vec![1]);
        save_sampling_info(&store, device(1), &record);
        assert_eq!(store.sampling_rate_by_device(device(1), 1), None);
    }

    #[test]
    fn oversized_sampler_id_is_ignored() {
        let store = Store::new(1 << 20, 900, 900);
        let record = options_record(&[0, 0, 0, 0, 1], &[0, 0, 0, 100]);
        save_sampling_info(&store, device(1), &record);
        assert_eq!(store.sampling_rate_by_device(device(1), 1), None);
    }

    #[test]
    fn resolution_prefers_exact_device_key() {
        let store = Store::new(1 << 20, 900, 900);
        save_sampling_info(&store, device(1), &options_record(&[0, 1], &[0, 0, 0, 100]));

        let probe = options_record(&[0, 1], &[]);
        assert_eq!(
            resolve(&store, device(1), &probe),
            SamplingResolution::Device(100)
        );
        // Different source id falls back to the exporter key.
        assert_eq!(
            resolve(&store, device(9), &probe),
            SamplingResolution::Exporter(100)
        );
    }

    #[test]
    fn unknown_sampler_reports_rate_not_found() {
        let store = Store::new(1 << 20, 900, 900);
        let probe = options_record(&[0, 7], &[]);
        assert_eq!(
            resolve(&store, device(1), &probe),
            SamplingResolution::RateNotFound
        );
    }

    #[test]
    fn record_without_sampler_id_reports_missing_id() {
        let store = Store::new(1 << 20, 900, 900);
        let record = Record::default();
        assert_eq!(
            resolve(&store, device(1), &record),
            SamplingResolution::SamplerIdNotFound
        );
    }
}
