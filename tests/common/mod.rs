//! Builds NetFlow v9 packets for tests.

/// Assembles one NetFlow v9 packet: a header followed by template,
/// options-template and data flowsets in the order they were added.
/// Data flowsets and options templates are padded to 4-byte alignment,
/// the way real exporters emit them.
pub struct PacketBuilder {
    version: u16,
    uptime: u32,
    timestamp: u32,
    sequence: u32,
    source_id: u32,
    flowsets: Vec<Vec<u8>>,
}

impl PacketBuilder {
    pub fn new() -> Self {
        PacketBuilder {
            version: 9,
            uptime: 0,
            timestamp: 0,
            sequence: 0,
            source_id: 0,
            flowsets: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn version(mut self, version: u16) -> Self {
        self.version = version;
        self
    }

    pub fn timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn source_id(mut self, source_id: u32) -> Self {
        self.source_id = source_id;
        self
    }

    /// Adds a template flowset defining one template from
    /// `(field type, field length)` pairs.
    pub fn data_template(self, template_id: u16, fields: &[(u16, u16)]) -> Self {
        let mut body = Vec::new();
        body.extend_from_slice(&template_id.to_be_bytes());
        body.extend_from_slice(&(fields.len() as u16).to_be_bytes());
        for &(field_type, length) in fields {
            body.extend_from_slice(&field_type.to_be_bytes());
            body.extend_from_slice(&length.to_be_bytes());
        }
        self.flowset(0, body, false)
    }

    /// Adds an options template flowset with the given scope and option
    /// field specs.
    pub fn options_template(
        self,
        template_id: u16,
        scope: &[(u16, u16)],
        options: &[(u16, u16)],
    ) -> Self {
        let mut body = Vec::new();
        body.extend_from_slice(&template_id.to_be_bytes());
        body.extend_from_slice(&((scope.len() * 4) as u16).to_be_bytes());
        body.extend_from_slice(&((options.len() * 4) as u16).to_be_bytes());
        for &(field_type, length) in scope.iter().chain(options) {
            body.extend_from_slice(&field_type.to_be_bytes());
            body.extend_from_slice(&length.to_be_bytes());
        }
        self.flowset(1, body, true)
    }

    /// Adds a data flowset whose body is the concatenation of `values`.
    pub fn data_flowset(self, template_id: u16, values: &[&[u8]]) -> Self {
        let mut body = Vec::new();
        for value in values {
            body.extend_from_slice(value);
        }
        self.flowset(template_id, body, true)
    }

    fn flowset(mut self, flowset_id: u16, mut body: Vec<u8>, pad: bool) -> Self {
        if pad && body.len() % 4 != 0 {
            body.resize(body.len() + 4 - body.len() % 4, 0);
        }
        let mut bytes = Vec::with_capacity(4 + body.len());
        bytes.extend_from_slice(&flowset_id.to_be_bytes());
        bytes.extend_from_slice(&((4 + body.len()) as u16).to_be_bytes());
        bytes.extend_from_slice(&body);
        self.flowsets.push(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut packet = Vec::new();
        packet.extend_from_slice(&self.version.to_be_bytes());
        packet.extend_from_slice(&(self.flowsets.len() as u16).to_be_bytes());
        packet.extend_from_slice(&self.uptime.to_be_bytes());
        packet.extend_from_slice(&self.timestamp.to_be_bytes());
        packet.extend_from_slice(&self.sequence.to_be_bytes());
        packet.extend_from_slice(&self.source_id.to_be_bytes());
        for flowset in &self.flowsets {
            packet.extend_from_slice(flowset);
        }
        packet
    }
}
