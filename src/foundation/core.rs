pub use kurbo::{Affine, Point, Rect, Vec2};

/// Identifier of a scene-graph node, assigned by the host.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(pub u64);

/// Identity handle of a host material resource.
///
/// Materials are keyed by identity, never by value: two materials with
/// identical property values but different ids get independent replacements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialId(pub u64);

/// Four-sided border widths, in the units of the rect they apply to.
///
/// Local rect space is y-up: `left`/`bottom` inset the min corner,
/// `right`/`top` inset the max corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Borders {
    /// Inset from the min-x edge.
    pub left: f64,
    /// Inset from the max-y edge.
    pub top: f64,
    /// Inset from the max-x edge.
    pub right: f64,
    /// Inset from the min-y edge.
    pub bottom: f64,
}

impl Borders {
    /// Borders with the same width on every side.
    pub fn uniform(v: f64) -> Self {
        Self {
            left: v,
            top: v,
            right: v,
            bottom: v,
        }
    }

    /// Sum of the horizontal borders.
    pub fn horizontal(self) -> f64 {
        self.left + self.right
    }

    /// Sum of the vertical borders.
    pub fn vertical(self) -> f64 {
        self.top + self.bottom
    }

    /// Return `true` when every side is zero.
    pub fn is_zero(self) -> bool {
        self.left == 0.0 && self.top == 0.0 && self.right == 0.0 && self.bottom == 0.0
    }

    pub(crate) fn scaled(self, k: f64) -> Self {
        Self {
            left: self.left * k,
            top: self.top * k,
            right: self.right * k,
            bottom: self.bottom * k,
        }
    }
}

/// How the mask image maps onto the mask rect.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BorderMode {
    /// The whole image stretches over the full mask rect.
    #[default]
    Simple,
    /// 9-slice: border sections stretch along their axis, the center stretches both ways.
    Sliced,
    /// 9-slice with a repeating center; border sections do not repeat.
    Tiled,
}

/// Weights applied to a sampled mask color to derive the scalar mask value.
///
/// The weighted sum is intentionally unnormalized: callers choose weights that
/// sum sensibly for their source (pure alpha, luma-style gray, a single color
/// channel, or anything custom).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChannelWeights {
    /// Red weight.
    pub r: f32,
    /// Green weight.
    pub g: f32,
    /// Blue weight.
    pub b: f32,
    /// Alpha weight.
    pub a: f32,
}

impl ChannelWeights {
    /// Mask value comes from the alpha channel alone.
    pub const ALPHA: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Mask value is the mean of the color channels.
    pub const GRAY: Self = Self::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0, 0.0);
    /// Mask value comes from the red channel alone.
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 0.0);
    /// Mask value comes from the green channel alone.
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 0.0);
    /// Mask value comes from the blue channel alone.
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 0.0);

    /// Construct weights from individual components.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Weighted sum of a straight-alpha RGBA color.
    pub fn dot(self, rgba: [f32; 4]) -> f32 {
        self.r * rgba[0] + self.g * rgba[1] + self.b * rgba[2] + self.a * rgba[3]
    }

    /// Components as an array, in RGBA order.
    pub fn as_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for ChannelWeights {
    fn default() -> Self {
        Self::ALPHA
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
