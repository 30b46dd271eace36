//! Templates and the keys that locate them.
//!
//! Collector devices must use the combination of the exporter's source
//! address and the source id field from the packet header to associate a
//! NetFlow export packet with a unique NetFlow instance on a particular
//! device. Templates are further keyed by their 16-bit template id.

use std::mem;
use std::net::SocketAddr;

use crate::fields::FieldId;

/// One `(field, byte length)` entry of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateField {
    pub field: FieldId,
    pub length: u16,
}

/// A decoding recipe for data records sharing one template id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    /// Fields in wire order.
    pub fields: Vec<TemplateField>,
    /// Sum of the per-field byte lengths.
    pub total_length: usize,
    /// Header timestamp of the packet that last refreshed this template.
    pub timestamp: u32,
    /// Whether this template was defined by an options template flowset.
    pub is_options: bool,
}

impl Template {
    pub(crate) fn new(timestamp: u32, is_options: bool) -> Self {
        Template {
            fields: Vec::new(),
            total_length: 0,
            timestamp,
            is_options,
        }
    }

    pub(crate) fn push_field(&mut self, field: FieldId, length: u16) {
        self.fields.push(TemplateField { field, length });
        self.total_length += length as usize;
    }

    /// Bytes charged against the memory ledger for caching this template.
    pub(crate) fn cost(&self) -> usize {
        mem::size_of::<Self>() + self.fields.len() * mem::size_of::<TemplateField>()
    }
}

/// One NetFlow instance on one exporter device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    pub exporter: SocketAddr,
    pub source_id: u32,
}

/// Locates one template: device identity plus template id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub device: DeviceId,
    pub template_id: u16,
}
