//! The read-only result of one decode call.

use std::net::SocketAddr;

use crate::decoder::Decoder;
use crate::error::Error;
use crate::fields::FieldId;
use crate::sampling::{self, SamplingResolution};
use crate::template::{DeviceId, Template};

/// What one flowset of a packet contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowsetKind {
    Template,
    OptionsTemplate,
    Data,
}

/// One flowset, in wire order, of a decoded packet.
#[derive(Debug, Clone)]
pub enum Flowset {
    /// A template definition, as just saved into the store.
    Template(Template),
    /// An options template definition.
    OptionsTemplate(Template),
    /// A batch of data records. Empty when the matching template was
    /// missing or expired.
    Data { records: Vec<Record> },
}

impl Flowset {
    pub fn kind(&self) -> FlowsetKind {
        match self {
            Flowset::Template(_) => FlowsetKind::Template,
            Flowset::OptionsTemplate(_) => FlowsetKind::OptionsTemplate,
            Flowset::Data { .. } => FlowsetKind::Data,
        }
    }
}

/// One data record: field values in template order, bytes exactly as they
/// appeared on the wire (network order).
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Vec<(FieldId, Vec<u8>)>,
}

impl Record {
    /// The value of `field`, or `None` if the record's template did not
    /// list it.
    pub fn get(&self, field: FieldId) -> Option<&[u8]> {
        self.fields
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, value)| value.as_slice())
    }

    /// All fields in template order.
    pub fn fields(&self) -> &[(FieldId, Vec<u8>)] {
        &self.fields
    }

    pub(crate) fn push(&mut self, field: FieldId, value: Vec<u8>) {
        self.fields.push((field, value));
    }
}

/// A decoded NetFlow v9 packet.
///
/// The packet borrows the [`Decoder`] it came from: option and
/// sampling-rate queries read the decoder's store, so the decoder must
/// outlive every packet it produced. Field accessors return views into
/// the packet's own buffers, valid for the packet's lifetime.
#[derive(Debug)]
pub struct DecodedPacket<'a> {
    pub(crate) decoder: &'a Decoder,
    pub(crate) exporter: SocketAddr,
    pub(crate) source_id: u32,
    pub(crate) sequence: u32,
    pub(crate) timestamp: u32,
    pub(crate) uptime: u32,
    pub(crate) flowsets: Vec<Flowset>,
}

impl<'a> DecodedPacket<'a> {
    /// Flowsets decoded from this packet, in wire order.
    pub fn flowsets(&self) -> &[Flowset] {
        &self.flowsets
    }

    pub fn num_flowsets(&self) -> usize {
        self.flowsets.len()
    }

    pub fn flowset_kind(&self, flowset: usize) -> Result<FlowsetKind, Error> {
        self.flowsets
            .get(flowset)
            .map(Flowset::kind)
            .ok_or(Error::InvalidArgument)
    }

    /// Records in the given flowset; zero for template flowsets.
    pub fn num_records(&self, flowset: usize) -> Result<usize, Error> {
        match self.flowsets.get(flowset) {
            Some(Flowset::Data { records }) => Ok(records.len()),
            Some(_) => Ok(0),
            None => Err(Error::InvalidArgument),
        }
    }

    /// The raw value of `field` in the given data record.
    pub fn field(&self, flowset: usize, record: usize, field: FieldId) -> Result<&[u8], Error> {
        self.data_record(flowset, record)?
            .get(field)
            .ok_or(Error::NotFound)
    }

    /// All fields of the given data record, in template order. The views
    /// stay valid until the packet is dropped.
    pub fn fields(&self, flowset: usize, record: usize) -> Result<&[(FieldId, Vec<u8>)], Error> {
        Ok(self.data_record(flowset, record)?.fields())
    }

    /// Reads one field from the *current* option record cached for this
    /// packet's device.
    pub fn option(&self, field: FieldId) -> Result<Vec<u8>, Error> {
        self.decoder
            .store()
            .get_option(self.device(), field)
            .ok_or(Error::NotFound)
    }

    /// Resolves the sampling rate applicable to the given data record.
    pub fn sampling_rate(
        &self,
        flowset: usize,
        record: usize,
    ) -> Result<SamplingResolution, Error> {
        let record = self.data_record(flowset, record)?;
        Ok(sampling::resolve(
            self.decoder.store(),
            self.device(),
            record,
        ))
    }

    /// Unix timestamp from the packet header.
    pub fn timestamp(&self) -> u32 {
        self.timestamp
    }

    /// System uptime in milliseconds from the packet header.
    pub fn uptime(&self) -> u32 {
        self.uptime
    }

    /// Source id from the packet header.
    pub fn source_id(&self) -> u32 {
        self.source_id
    }

    /// Sequence number from the packet header.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// The exporter address this packet was decoded with.
    pub fn exporter(&self) -> SocketAddr {
        self.exporter
    }

    pub(crate) fn device(&self) -> DeviceId {
        DeviceId {
            exporter: self.exporter,
            source_id: self.source_id,
        }
    }

    fn data_record(&self, flowset: usize, record: usize) -> Result<&Record, Error> {
        match self.flowsets.get(flowset) {
            Some(Flowset::Data { records }) => {
                records.get(record).ok_or(Error::InvalidArgument)
            }
            _ => Err(Error::InvalidArgument),
        }
    }
}
