//! NetFlow v9 field identifiers.
//!
//! A [`FieldId`] is a 32-bit value. The low 16 bits carry the
//! IANA-registered NetFlow v9 field type; bit 31 distinguishes scope
//! fields (used inside options templates) from data fields. The decoder
//! never interprets field values, with the single exception of
//! [`FLOW_SAMPLER_ID`] and [`FLOW_SAMPLER_RANDOM_INTERVAL`], which feed
//! the sampling-rate store.

/// Marks a field identifier as an options-template scope field.
const SCOPE_BIT: u32 = 1 << 31;

/// Identifies one field inside a template or record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId(u32);

impl FieldId {
    /// A regular data field with the given IANA field type.
    pub const fn data(field_type: u16) -> Self {
        FieldId(field_type as u32)
    }

    /// A scope field with the given scope field type.
    pub const fn scope(field_type: u16) -> Self {
        FieldId(SCOPE_BIT | field_type as u32)
    }

    /// Whether this identifier names an options-template scope field.
    pub const fn is_scope(self) -> bool {
        self.0 & SCOPE_BIT != 0
    }

    /// The 16-bit field type, without the scope marker.
    pub const fn field_type(self) -> u16 {
        self.0 as u16
    }
}

impl From<FieldId> for u32 {
    fn from(id: FieldId) -> u32 {
        id.0
    }
}

// Well-known field types, per the IANA NetFlow v9 registry. The decoder
// treats all of them as opaque; they are provided so callers can name the
// fields they extract.
pub const IN_BYTES: u16 = 1;
pub const IN_PKTS: u16 = 2;
pub const FLOWS: u16 = 3;
pub const PROTOCOL: u16 = 4;
pub const TOS: u16 = 5;
pub const TCP_FLAGS: u16 = 6;
pub const L4_SRC_PORT: u16 = 7;
pub const IPV4_SRC_ADDR: u16 = 8;
pub const SRC_MASK: u16 = 9;
pub const INPUT_SNMP: u16 = 10;
pub const L4_DST_PORT: u16 = 11;
pub const IPV4_DST_ADDR: u16 = 12;
pub const DST_MASK: u16 = 13;
pub const OUTPUT_SNMP: u16 = 14;
pub const IPV4_NEXT_HOP: u16 = 15;
pub const SRC_AS: u16 = 16;
pub const DST_AS: u16 = 17;
pub const LAST_SWITCHED: u16 = 21;
pub const FIRST_SWITCHED: u16 = 22;
pub const OUT_BYTES: u16 = 23;
pub const OUT_PKTS: u16 = 24;
pub const IPV6_SRC_ADDR: u16 = 27;
pub const IPV6_DST_ADDR: u16 = 28;
pub const ICMP_TYPE: u16 = 32;
pub const SAMPLING_INTERVAL: u16 = 34;
pub const SAMPLING_ALGORITHM: u16 = 35;
pub const FLOW_ACTIVE_TIMEOUT: u16 = 36;
pub const FLOW_INACTIVE_TIMEOUT: u16 = 37;
pub const ENGINE_TYPE: u16 = 38;
pub const ENGINE_ID: u16 = 39;
pub const FLOW_SAMPLER_ID: u16 = 48;
pub const FLOW_SAMPLER_MODE: u16 = 49;
pub const FLOW_SAMPLER_RANDOM_INTERVAL: u16 = 50;
pub const SRC_MAC: u16 = 56;
pub const DST_MAC: u16 = 57;
pub const SRC_VLAN: u16 = 58;
pub const DST_VLAN: u16 = 59;
pub const IP_PROTOCOL_VERSION: u16 = 60;
pub const DIRECTION: u16 = 61;
pub const IPV6_NEXT_HOP: u16 = 62;

// Scope field types used inside options templates.
pub const SCOPE_SYSTEM: u16 = 1;
pub const SCOPE_INTERFACE: u16 = 2;
pub const SCOPE_LINE_CARD: u16 = 3;
pub const SCOPE_CACHE: u16 = 4;
pub const SCOPE_TEMPLATE: u16 = 5;
