//! Configuration for the decoder.

use serde::{Deserialize, Serialize};

/// Configuration for a [`Decoder`](crate::Decoder).
///
/// All limits can also be adjusted on a live decoder through its control
/// setters; the values here are the starting point.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderConfig {
    /// The ceiling, in bytes, for memory held by cached templates and
    /// option records.
    #[serde(default = "default_max_memory")]
    pub max_memory: usize,

    /// Seconds of header time after which a cached template expires.
    #[serde(default = "default_template_expiry")]
    pub template_expiry: u32,

    /// Seconds of header time after which a cached option record may be
    /// evicted when the memory ceiling is hit.
    #[serde(default = "default_options_expiry")]
    pub options_expiry: u32,

    /// Whether to extract sampling rates from options data records and
    /// answer sampling-rate queries.
    #[serde(default)]
    pub store_sampling_rates: bool,
}

const fn default_max_memory() -> usize {
    16 * 1024 * 1024
}

const fn default_template_expiry() -> u32 {
    15 * 60
}

const fn default_options_expiry() -> u32 {
    15 * 60
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_memory: default_max_memory(),
            template_expiry: default_template_expiry(),
            options_expiry: default_options_expiry(),
            store_sampling_rates: false,
        }
    }
}

impl DecoderConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_memory == 0 {
            errors.push("max_memory must be greater than 0".to_string());
        }
        if self.template_expiry == 0 {
            errors.push("template_expiry must be greater than 0".to_string());
        }
        if self.options_expiry == 0 {
            errors.push("options_expiry must be greater than 0".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
