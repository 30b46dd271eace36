//! The packet state machine.
//!
//! One [`Decoder`] holds the per-exporter store and the statistics
//! counters. Decoding is synchronous and CPU-only; a single decoder may
//! be shared by any number of threads, each feeding its own packets.

use std::net::SocketAddr;

use tracing::{debug, warn};

use crate::config::DecoderConfig;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::fields::FieldId;
use crate::packet::{DecodedPacket, Flowset, Record};
use crate::sampling;
use crate::stats::{Stats, StatsCell};
use crate::store::{OptionRecord, Store};
use crate::template::{StreamKey, Template};

const NETFLOW_V9_VERSION: u16 = 9;
const TEMPLATE_FLOWSET_ID: u16 = 0;
const OPTIONS_TEMPLATE_FLOWSET_ID: u16 = 1;
/// Flowset ids 0-255 are reserved; data flowsets carry their template id.
const MIN_DATA_FLOWSET_ID: u16 = 256;
const FLOWSET_HEADER_SIZE: usize = 4;
/// A template field spec is a `(type, length)` pair of u16s.
const FIELD_SPEC_SIZE: usize = 4;

/// Decodes NetFlow v9 packets, maintaining per-exporter template and
/// option state across calls.
#[derive(Debug)]
pub struct Decoder {
    store: Store,
    stats: StatsCell,
    store_sampling_rates: bool,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Decoder {
            store: Store::new(
                config.max_memory,
                config.template_expiry,
                config.options_expiry,
            ),
            stats: StatsCell::default(),
            store_sampling_rates: config.store_sampling_rates,
        }
    }

    /// Decodes one NetFlow v9 packet received from `exporter`.
    ///
    /// Failures local to one flowset (a missing or expired template, an
    /// under-filled data flowset) do not fail the packet; they are
    /// recorded in the statistics and the packet still decodes with
    /// partial content. Failures that corrupt the read position fail the
    /// whole packet and count one malformed packet.
    pub fn decode<'a>(
        &'a self,
        data: &[u8],
        exporter: SocketAddr,
    ) -> Result<DecodedPacket<'a>, Error> {
        self.stats.inc_processed_packets();
        match self.decode_packet(data, exporter) {
            Ok(packet) => Ok(packet),
            Err(error) => {
                self.stats.inc_malformed_packets();
                warn!("failed to decode packet from {}: {}", exporter, error);
                Err(error)
            }
        }
    }

    /// A snapshot of the decoder's counters.
    pub fn stats(&self) -> Stats {
        self.stats.snapshot(self.store.memory_usage())
    }

    /// Adjusts the byte ceiling for cached templates and option records.
    pub fn set_memory_limit(&self, bytes: usize) {
        self.store.set_memory_limit(bytes);
    }

    /// Adjusts the template expiry time, in seconds of header time.
    pub fn set_template_expiry(&self, secs: u32) {
        self.store.set_template_expiry(secs);
    }

    /// Adjusts the option-record expiry time, in seconds of header time.
    pub fn set_options_expiry(&self, secs: u32) {
        self.store.set_options_expiry(secs);
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    fn decode_packet<'a>(
        &'a self,
        data: &[u8],
        exporter: SocketAddr,
    ) -> Result<DecodedPacket<'a>, Error> {
        let mut cursor = Cursor::new(data);

        let version = cursor.read_u16().ok_or(Error::Malformed)?;
        let count = cursor.read_u16().ok_or(Error::Malformed)?;
        let uptime = cursor.read_u32().ok_or(Error::Malformed)?;
        let timestamp = cursor.read_u32().ok_or(Error::Malformed)?;
        let sequence = cursor.read_u32().ok_or(Error::Malformed)?;
        let source_id = cursor.read_u32().ok_or(Error::Malformed)?;

        if version != NETFLOW_V9_VERSION {
            return Err(Error::Malformed);
        }

        debug!(
            "decoding NetFlow v9 packet: count={}, source_id={}, exporter={}",
            count, source_id, exporter
        );

        let mut packet = DecodedPacket {
            decoder: self,
            exporter,
            source_id,
            sequence,
            timestamp,
            uptime,
            flowsets: Vec::new(),
        };

        // The header's count field covers records, not flowsets; it
        // bounds the loop while the cursor bounds the walk.
        for _ in 0..count {
            if cursor.is_empty() {
                break;
            }
            self.decode_flowset(&mut cursor, &mut packet)?;
        }

        Ok(packet)
    }

    fn decode_flowset<'a>(
        &'a self,
        cursor: &mut Cursor<'_>,
        packet: &mut DecodedPacket<'a>,
    ) -> Result<(), Error> {
        let flowset_id = cursor.read_u16().ok_or(Error::Malformed)?;
        let length = cursor.read_u16().ok_or(Error::Malformed)? as usize;

        // Each flowset carries at least its own 4-byte header, and its
        // body must fit inside the packet.
        if length < FLOWSET_HEADER_SIZE {
            return Err(Error::Malformed);
        }
        let mut body = cursor
            .split(length - FLOWSET_HEADER_SIZE)
            .ok_or(Error::Malformed)?;

        match flowset_id {
            TEMPLATE_FLOWSET_ID => {
                self.stats.inc_data_templates();
                self.decode_template_flowset(&mut body, packet)
            }
            OPTIONS_TEMPLATE_FLOWSET_ID => {
                self.stats.inc_option_templates();
                self.decode_options_template_flowset(&mut body, packet)
            }
            id if id >= MIN_DATA_FLOWSET_ID => {
                self.stats.inc_records();
                self.decode_data_flowset(&mut body, id, packet)
            }
            id => {
                warn!("flowset id {} is in the reserved range", id);
                Err(Error::Malformed)
            }
        }
    }

    /// A template flowset body is a concatenation of one or more
    /// template definitions.
    fn decode_template_flowset<'a>(
        &'a self,
        body: &mut Cursor<'_>,
        packet: &mut DecodedPacket<'a>,
    ) -> Result<(), Error> {
        while !body.is_empty() {
            let template_id = body.read_u16().ok_or(Error::Malformed)?;
            let field_count = body.read_u16().ok_or(Error::Malformed)?;

            if template_id < MIN_DATA_FLOWSET_ID {
                return Err(Error::Malformed);
            }

            let mut template = Template::new(packet.timestamp, false);
            for _ in 0..field_count {
                if body.is_empty() {
                    break;
                }
                let (field_type, length) = read_field_spec(body)?;
                template.push_field(FieldId::data(field_type), length);
            }

            let key = StreamKey {
                device: packet.device(),
                template_id,
            };
            self.store.save_template(key, template.clone(), &self.stats)?;
            debug!(
                "registered template {} with {} fields for source_id={}",
                template_id,
                template.fields.len(),
                packet.source_id
            );
            packet.flowsets.push(Flowset::Template(template));
        }
        Ok(())
    }

    /// An options template body declares its scope and option sections by
    /// byte count; scope fields are flagged with the scope bit. Bytes
    /// after the declared sections are padding.
    fn decode_options_template_flowset<'a>(
        &'a self,
        body: &mut Cursor<'_>,
        packet: &mut DecodedPacket<'a>,
    ) -> Result<(), Error> {
        let template_id = body.read_u16().ok_or(Error::Malformed)?;
        let scope_length = body.read_u16().ok_or(Error::Malformed)? as usize;
        let option_length = body.read_u16().ok_or(Error::Malformed)? as usize;

        let mut template = Template::new(packet.timestamp, true);

        let mut remaining = scope_length;
        while remaining > 0 && !body.is_empty() {
            if remaining < FIELD_SPEC_SIZE {
                return Err(Error::Malformed);
            }
            let (field_type, length) = read_field_spec(body)?;
            template.push_field(FieldId::scope(field_type), length);
            remaining -= FIELD_SPEC_SIZE;
        }
        if remaining != 0 {
            return Err(Error::Malformed);
        }

        let mut remaining = option_length;
        while remaining > 0 && !body.is_empty() {
            if remaining < FIELD_SPEC_SIZE {
                return Err(Error::Malformed);
            }
            let (field_type, length) = read_field_spec(body)?;
            template.push_field(FieldId::data(field_type), length);
            remaining -= FIELD_SPEC_SIZE;
        }
        if remaining != 0 {
            return Err(Error::Malformed);
        }

        let key = StreamKey {
            device: packet.device(),
            template_id,
        };
        self.store.save_template(key, template.clone(), &self.stats)?;
        debug!(
            "registered options template {} ({} fields) for source_id={}",
            template_id,
            template.fields.len(),
            packet.source_id
        );
        packet.flowsets.push(Flowset::OptionsTemplate(template));

        body.skip_remaining();
        Ok(())
    }

    fn decode_data_flowset<'a>(
        &'a self,
        body: &mut Cursor<'_>,
        template_id: u16,
        packet: &mut DecodedPacket<'a>,
    ) -> Result<(), Error> {
        let key = StreamKey {
            device: packet.device(),
            template_id,
        };

        let template = match self.store.lookup_template(key, packet.timestamp, &self.stats) {
            Ok(template) => template,
            Err(Error::NotFound) | Err(Error::Outdated) => {
                debug!(
                    "no usable template {} for source_id={}, dropping flowset body",
                    template_id, packet.source_id
                );
                body.skip_remaining();
                packet.flowsets.push(Flowset::Data {
                    records: Vec::new(),
                });
                return Ok(());
            }
            Err(error) => return Err(error),
        };

        let mut records = Vec::new();
        while !body.is_empty() {
            if template.fields.is_empty() || template.total_length > body.remaining() {
                // Trailing bytes shorter than one record are padding.
                body.skip_remaining();
                break;
            }

            let mut record = Record::default();
            for field in &template.fields {
                if field.length == 0 {
                    break;
                }
                let value = body
                    .read_exact(field.length as usize)
                    .ok_or(Error::Malformed)?;
                record.push(field.field, value.to_vec());
            }

            if template.is_options {
                let option = OptionRecord::from_record(&record, packet.timestamp);
                self.store.save_option(packet.device(), option, &self.stats)?;
                if self.store_sampling_rates {
                    sampling::save_sampling_info(&self.store, packet.device(), &record);
                }
            }

            records.push(record);
        }

        packet.flowsets.push(Flowset::Data { records });
        Ok(())
    }
}

fn read_field_spec(body: &mut Cursor<'_>) -> Result<(u16, u16), Error> {
    let field_type = body.read_u16().ok_or(Error::Malformed)?;
    let length = body.read_u16().ok_or(Error::Malformed)?;
    if length == 0 {
        return Err(Error::Malformed);
    }
    Ok((field_type, length))
}
