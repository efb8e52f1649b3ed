use serde::{Deserialize, Serialize};
use streamforged_container::{ReaderOptions, DEFAULT_MAX_PAYLOAD_SIZE};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub reader: ReaderConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReaderConfig {
    /// Largest record payload loaded into memory, in bytes
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: u64,
}

fn default_max_payload_size() -> u64 {
    DEFAULT_MAX_PAYLOAD_SIZE
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_payload_size: default_max_payload_size(),
        }
    }
}

impl ReaderConfig {
    pub fn options(&self) -> ReaderOptions {
        ReaderOptions {
            max_payload_size: self.max_payload_size,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct OutputConfig {
    /// Print JSON instead of text where supported
    #[serde(default)]
    pub json: bool,

    /// Default cap on listed records (unlimited if unset)
    #[serde(default)]
    pub record_limit: Option<usize>,
}
