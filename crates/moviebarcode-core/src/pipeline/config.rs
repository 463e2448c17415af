use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color::KMeansParams;
use crate::consts::{BORDER_DARKNESS_THRESHOLD, DEFAULT_OUTPUT_HEIGHT, DEFAULT_OUTPUT_WIDTH};
use crate::error::{BarcodeError, Result};
use crate::sampler::SamplerSettings;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeConfig {
    /// Source video.
    pub input: PathBuf,
    /// Destination image; the extension selects the format.
    pub output: PathBuf,
    pub output_width: u32,
    pub output_height: u32,
    /// First-channel value below which a pixel counts as letterbox.
    pub border_threshold: u8,
    pub kmeans: KMeansParams,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("./"),
            output: PathBuf::from("./"),
            output_width: DEFAULT_OUTPUT_WIDTH,
            output_height: DEFAULT_OUTPUT_HEIGHT,
            border_threshold: BORDER_DARKNESS_THRESHOLD,
            kmeans: KMeansParams::default(),
        }
    }
}

impl BarcodeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.output_width == 0 || self.output_height == 0 {
            return Err(BarcodeError::Config(format!(
                "output size must be non-zero (got {}x{})",
                self.output_width, self.output_height
            )));
        }
        self.kmeans.validate()
    }

    pub fn sampler_settings(&self) -> SamplerSettings {
        SamplerSettings {
            output_width: self.output_width as usize,
            border_threshold: self.border_threshold,
            kmeans: self.kmeans.clone(),
        }
    }
}
