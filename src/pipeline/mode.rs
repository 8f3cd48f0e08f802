//! Vocal path selection

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::HitmixError;

/// Which vocal chain a run uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VocalMode {
    /// Source vocal, untouched
    Raw,
    /// Source vocal through the enhancer
    #[default]
    Enhanced,
    /// Enhanced vocal through the external voice converter, optionally blended
    Rvc,
}

impl VocalMode {
    pub const ALL: [VocalMode; 3] = [VocalMode::Raw, VocalMode::Enhanced, VocalMode::Rvc];

    pub fn as_str(&self) -> &'static str {
        match self {
            VocalMode::Raw => "raw",
            VocalMode::Enhanced => "enhanced",
            VocalMode::Rvc => "rvc",
        }
    }

    /// Parse a configured mode, falling back to `Raw` with a warning
    pub fn parse_or_raw(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!("Unrecognized vocal_mode '{}'; using raw vocals", value);
            VocalMode::Raw
        })
    }
}

impl fmt::Display for VocalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VocalMode {
    type Err = HitmixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(VocalMode::Raw),
            "enhanced" => Ok(VocalMode::Enhanced),
            "rvc" => Ok(VocalMode::Rvc),
            other => Err(HitmixError::invalid_config(
                "vocal_mode",
                format!("'{}' is not one of raw, enhanced, rvc", other),
            )),
        }
    }
}
