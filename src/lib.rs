//! Decoder for NetFlow v9 export packets (RFC 3954).
//!
//! NetFlow v9 is template-based: exporters interleave template
//! definitions, options templates, data records and option records in one
//! packet stream, and data records can only be decoded with the matching
//! template from that specific exporter. This crate implements the
//! stateful side of the protocol: a byte-accurate packet decoder backed
//! by a per-exporter cache of templates and option values with a memory
//! ceiling and time-based expiry, plus an options-driven sampling-rate
//! resolver.
//!
//! The crate does not own sockets. Any transport that produces a
//! `(bytes, exporter address)` pair can feed [`Decoder::decode`]; each
//! call must correspond to exactly one NetFlow packet.
//!
//! ```
//! use std::net::SocketAddr;
//! use netflow9::{Decoder, DecoderConfig};
//!
//! let decoder = Decoder::new(DecoderConfig::default());
//! let exporter: SocketAddr = "10.0.0.1:2055".parse().unwrap();
//!
//! // A header-only packet: version 9, zero records.
//! let mut packet = Vec::new();
//! packet.extend_from_slice(&9u16.to_be_bytes());
//! packet.extend_from_slice(&0u16.to_be_bytes());
//! packet.extend_from_slice(&[0u8; 16]);
//!
//! let decoded = decoder.decode(&packet, exporter).unwrap();
//! assert_eq!(decoded.num_flowsets(), 0);
//! ```

mod config;
mod cursor;
mod decoder;
mod error;
pub mod fields;
mod packet;
mod sampling;
mod stats;
mod store;
mod template;

pub use config::DecoderConfig;
pub use decoder::Decoder;
pub use error::Error;
pub use fields::FieldId;
pub use packet::{DecodedPacket, Flowset, FlowsetKind, Record};
pub use sampling::SamplingResolution;
pub use stats::Stats;
pub use template::{DeviceId, StreamKey, Template, TemplateField};
