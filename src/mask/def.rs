use serde::{Deserialize, Serialize};

use crate::foundation::core::ChannelWeights;
use crate::foundation::error::{ScrimError, ScrimResult};

/// Authoring-time description of a mask's scalar configuration.
///
/// The image source is set separately through
/// [`MaskEngine::set_source`](crate::MaskEngine::set_source), since sprite and
/// texture payloads are live resources, not data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskDef {
    /// How a sampled color becomes a scalar mask value.
    #[serde(default)]
    pub channels: ChannelsDef,
    /// Flip the mask value inside the mask rect.
    #[serde(default)]
    pub invert_inside: bool,
    /// Treat the region outside the mask rect as visible.
    #[serde(default)]
    pub invert_outside: bool,
    /// Minimum mask value for a point to hit-test as inside, in `[0, 1]`.
    ///
    /// Zero disables mask sampling for hit tests (rect containment only).
    #[serde(default)]
    pub raycast_threshold: f64,
}

impl Default for MaskDef {
    fn default() -> Self {
        Self {
            channels: ChannelsDef::default(),
            invert_inside: false,
            invert_outside: false,
            raycast_threshold: 0.0,
        }
    }
}

impl MaskDef {
    /// Validate ranges before applying the def to a mask.
    pub fn validate(&self) -> ScrimResult<()> {
        if !self.raycast_threshold.is_finite()
            || self.raycast_threshold < 0.0
            || self.raycast_threshold > 1.0
        {
            return Err(ScrimError::validation(
                "raycast_threshold must be within [0, 1]",
            ));
        }
        if let ChannelsDef::Custom(w) = self.channels
            && w.iter().any(|c| !c.is_finite())
        {
            return Err(ScrimError::validation(
                "custom channel weights must be finite",
            ));
        }
        Ok(())
    }

    pub(crate) fn weights(&self) -> ChannelWeights {
        self.channels.weights()
    }
}

/// Channel-weight selection for deriving the scalar mask value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelsDef {
    /// Alpha channel alone.
    #[default]
    Alpha,
    /// Mean of the color channels.
    Gray,
    /// Red channel alone.
    Red,
    /// Green channel alone.
    Green,
    /// Blue channel alone.
    Blue,
    /// Arbitrary RGBA weights.
    Custom([f32; 4]),
}

impl ChannelsDef {
    pub(crate) fn weights(self) -> ChannelWeights {
        match self {
            Self::Alpha => ChannelWeights::ALPHA,
            Self::Gray => ChannelWeights::GRAY,
            Self::Red => ChannelWeights::RED,
            Self::Green => ChannelWeights::GREEN,
            Self::Blue => ChannelWeights::BLUE,
            Self::Custom([r, g, b, a]) => ChannelWeights::new(r, g, b, a),
        }
    }
}
