use std::sync::Arc;

use crate::foundation::core::{Borders, Rect};
use crate::foundation::error::{ScrimError, ScrimResult};

/// Stable identity of a host texture resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub u64);

/// Decoded 2D texture with CPU-side pixels in straight-alpha RGBA8.
///
/// The UV origin is the bottom-left corner and `v` increases upward, matching
/// local rect space. A texture may be marked non-readable to model GPU-only
/// resources whose pixels were discarded after upload; such textures still
/// render, but cannot be sampled for hit testing.
#[derive(Clone, Debug)]
pub struct Texture2d {
    id: TextureId,
    width: u32,
    height: u32,
    rgba8: Arc<Vec<u8>>,
    readable: bool,
}

impl Texture2d {
    /// Construct from raw straight-alpha RGBA8 bytes in row-major order.
    pub fn from_rgba8(id: TextureId, width: u32, height: u32, rgba8: Vec<u8>) -> ScrimResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba8.len() != expected {
            return Err(ScrimError::validation(format!(
                "texture pixel buffer is {} bytes, expected {expected}",
                rgba8.len()
            )));
        }
        Ok(Self {
            id,
            width,
            height,
            rgba8: Arc::new(rgba8),
            readable: true,
        })
    }

    /// Construct from a decoded [`image`] buffer.
    pub fn from_image(id: TextureId, img: &image::RgbaImage) -> Self {
        Self {
            id,
            width: img.width(),
            height: img.height(),
            rgba8: Arc::new(img.as_raw().clone()),
            readable: true,
        }
    }

    /// Mark the texture as not CPU-readable (GPU-only pixels).
    pub fn non_readable(mut self) -> Self {
        self.readable = false;
        self
    }

    /// Host-assigned identity.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether pixels can be read back on the CPU.
    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Bilinearly sample at normalized `(u, v)`, clamping to the edge.
    ///
    /// Returns straight-alpha RGBA in `[0, 1]` per component.
    pub fn sample_bilinear(&self, u: f64, v: f64) -> Result<[f32; 4], SampleError> {
        if !self.readable {
            return Err(SampleError::NonReadable);
        }
        if self.width == 0 || self.height == 0 {
            return Ok([0.0; 4]);
        }

        // v is y-up; pixel rows are stored top-down.
        let fx = u * f64::from(self.width) - 0.5;
        let fy = (1.0 - v) * f64::from(self.height) - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = (fx - x0) as f32;
        let ty = (fy - y0) as f32;
        let x0 = x0 as i64;
        let y0 = y0 as i64;

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let mut out = [0.0f32; 4];
        for i in 0..4 {
            let top = c00[i] + (c10[i] - c00[i]) * tx;
            let bot = c01[i] + (c11[i] - c01[i]) * tx;
            out[i] = top + (bot - top) * ty;
        }
        Ok(out)
    }

    fn texel(&self, x: i64, y: i64) -> [f32; 4] {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        let i = (y * self.width as usize + x) * 4;
        let px = &self.rgba8[i..i + 4];
        [
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
            f32::from(px[3]) / 255.0,
        ]
    }
}

/// Texture reference carried in mask parameters.
#[derive(Clone, Debug, Default)]
pub enum TextureHandle {
    /// No image: the mask is a solid-fill rectangle, full opacity inside.
    #[default]
    None,
    /// A samplable 2D image.
    Image(Arc<Texture2d>),
    /// A render-target texture: usable by the GPU, not samplable on the CPU.
    RenderTarget(TextureId),
}

impl TextureHandle {
    /// Return `true` for the solid-fill (no image) case.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Stable identity used for fingerprints and diagnostics keys.
    pub(crate) fn identity(&self) -> u64 {
        match self {
            Self::None => 0,
            Self::Image(t) => 0x8000_0000_0000_0000 | t.id().0,
            Self::RenderTarget(id) => 0x4000_0000_0000_0000 | id.0,
        }
    }
}

/// Why a CPU-side mask sample could not be produced.
///
/// Both conditions are reported, never fatal: hit-test callers fall back to
/// treating the point as inside.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleError {
    /// The backing pixels cannot be read on the calling thread/context.
    #[error("mask texture is not CPU-readable")]
    NonReadable,
    /// The active texture is a render target, not a samplable 2D image.
    #[error("mask texture kind cannot be sampled (render target)")]
    UnsupportedKind,
}

/// How a sprite was packed into its texture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpritePacking {
    /// Full rectangular placement; border slicing is valid.
    #[default]
    Rect,
    /// Tightly packed (mesh-trimmed); incompatible with sliced/tiled borders.
    Tight,
}

/// Sprite resource description: a texture sub-rect plus 9-slice metadata.
#[derive(Clone, Debug)]
pub struct Sprite {
    /// Backing texture.
    pub texture: Arc<Texture2d>,
    /// Placement of the sprite within its texture, in pixels, bottom-left
    /// origin (matching UV space).
    pub rect_px: Rect,
    /// 9-slice border widths, in pixels.
    pub border_px: Borders,
    /// Sprite pixels per local unit.
    pub pixels_per_unit: f64,
    /// Packing mode of the sprite in its atlas.
    pub packing: SpritePacking,
}

impl Sprite {
    /// Sprite covering the whole of `texture` with no border.
    pub fn covering(texture: Arc<Texture2d>, pixels_per_unit: f64) -> Self {
        let rect_px = Rect::new(
            0.0,
            0.0,
            f64::from(texture.width()),
            f64::from(texture.height()),
        );
        Self {
            texture,
            rect_px,
            border_px: Borders::default(),
            pixels_per_unit,
            packing: SpritePacking::Rect,
        }
    }
}
