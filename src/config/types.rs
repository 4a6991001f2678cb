use serde::{Deserialize, Serialize};

pub use stickerforge_core::config::{
    ConversionConfig, DisplayAttributesMode, ScratchConfig, ToolsConfig,
};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub scratch: ScratchConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,
}
