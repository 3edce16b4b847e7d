use xxhash_rust::xxh3::Xxh3;

use crate::foundation::core::{Affine, BorderMode, ChannelWeights, MaterialId, Point, Rect, Vec2};
use crate::foundation::math::{inset, remap, slice_axis};
use crate::host::material::MaterialDevice;
use crate::host::texture::{SampleError, TextureHandle};

/// Shader property and keyword names written by the parameter binding.
pub mod shader_props {
    /// The mask texture sampler.
    pub const MASK_TEX: &str = "_MaskTex";
    /// Mask rect in local space, as (xMin, yMin, xMax, yMax).
    pub const MASK_RECT: &str = "_MaskRect";
    /// Mask UV rect, as (xMin, yMin, xMax, yMax).
    pub const MASK_UV_RECT: &str = "_MaskUvRect";
    /// Border rect in local space; bound for sliced/tiled modes only.
    pub const MASK_BORDER_RECT: &str = "_MaskBorderRect";
    /// Border UV rect; bound for sliced/tiled modes only.
    pub const MASK_UV_BORDER_RECT: &str = "_MaskUvBorderRect";
    /// Tile repeat counts, as (x, y, 0, 0); bound for sliced/tiled modes only.
    pub const MASK_TILE_REPEAT: &str = "_MaskTileRepeat";
    /// Channel weights color.
    pub const MASK_CHANNEL_WEIGHTS: &str = "_MaskChannelWeights";
    /// World-to-mask-local transform matrix.
    pub const MASK_WORLD_TO_MASK: &str = "_MaskWorldToLocal";
    /// 1.0 when the mask value is flipped inside the rect.
    pub const MASK_INVERT_INSIDE: &str = "_MaskInvertInside";
    /// 1.0 when the region outside the rect is visible.
    pub const MASK_INVERT_OUTSIDE: &str = "_MaskInvertOutside";
    /// Feature keyword for simple (whole-image) mapping.
    pub const KEYWORD_SIMPLE: &str = "MASK_SIMPLE";
    /// Feature keyword for 9-slice mapping.
    pub const KEYWORD_SLICED: &str = "MASK_SLICED";
    /// Feature keyword for tiled 9-slice mapping.
    pub const KEYWORD_TILED: &str = "MASK_TILED";
}

/// Fully-resolved per-frame shader inputs for one mask.
///
/// Produced by the mask's geometry recompute; consumed when binding
/// replacement materials and when sampling for hit tests. The border fields
/// are meaningful only when `mode` is not [`BorderMode::Simple`].
#[derive(Clone, Debug)]
pub struct MaskParameters {
    /// Masked rectangle in the mask node's local space.
    pub mask_rect: Rect,
    /// UV rect the mask image occupies in its texture.
    pub mask_uv: Rect,
    /// Inner (center) rectangle after border application, local space.
    pub border_rect: Rect,
    /// UV rect of the image's center section.
    pub border_uv: Rect,
    /// Center tile repeat counts per axis (tiled mode).
    pub tile_repeat: Vec2,
    /// Channel weights for deriving the scalar mask value.
    pub weights: ChannelWeights,
    /// World-to-mask-local transform.
    pub world_to_mask: Affine,
    /// Flip the mask value inside the rect.
    pub invert_inside: bool,
    /// Treat the region outside the rect as visible.
    pub invert_outside: bool,
    /// Active mask texture.
    pub texture: TextureHandle,
    /// Border mode the parameters were computed for.
    pub mode: BorderMode,
}

impl Default for MaskParameters {
    fn default() -> Self {
        Self {
            mask_rect: Rect::ZERO,
            mask_uv: Rect::new(0.0, 0.0, 1.0, 1.0),
            border_rect: Rect::ZERO,
            border_uv: Rect::new(0.0, 0.0, 1.0, 1.0),
            tile_repeat: Vec2::new(1.0, 1.0),
            weights: ChannelWeights::ALPHA,
            world_to_mask: Affine::IDENTITY,
            invert_inside: false,
            invert_outside: false,
            texture: TextureHandle::None,
            mode: BorderMode::Simple,
        }
    }
}

/// Stable fingerprint of a bound parameter set; used to elide redundant
/// re-binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ParamFingerprint {
    hi: u64,
    lo: u64,
}

impl MaskParameters {
    /// Fingerprint every field that `apply` writes.
    pub(crate) fn fingerprint(&self) -> ParamFingerprint {
        let mut h = StableHasher::new();
        h.write_rect(self.mask_rect);
        h.write_rect(self.mask_uv);
        h.write_rect(self.border_rect);
        h.write_rect(self.border_uv);
        h.write_f64(self.tile_repeat.x);
        h.write_f64(self.tile_repeat.y);
        for w in self.weights.as_array() {
            h.write_f32(w);
        }
        for c in self.world_to_mask.as_coeffs() {
            h.write_f64(c);
        }
        h.write_bool(self.invert_inside);
        h.write_bool(self.invert_outside);
        h.write_u64(self.texture.identity());
        h.write_u8(match self.mode {
            BorderMode::Simple => 0,
            BorderMode::Sliced => 1,
            BorderMode::Tiled => 2,
        });
        h.finish()
    }

    /// Write the parameters onto `material` as named shader properties and
    /// toggle the three mutually exclusive mode keywords.
    ///
    /// Callers elide repeat applications via [`MaskParameters::fingerprint`];
    /// the write itself is unconditionally full.
    pub(crate) fn apply(&self, device: &mut dyn MaterialDevice, material: MaterialId) {
        use shader_props as p;

        device.set_texture(material, p::MASK_TEX, &self.texture);
        device.set_vector(material, p::MASK_RECT, rect4(self.mask_rect));
        device.set_vector(material, p::MASK_UV_RECT, rect4(self.mask_uv));
        device.set_color(material, p::MASK_CHANNEL_WEIGHTS, self.weights.as_array());
        device.set_matrix(material, p::MASK_WORLD_TO_MASK, mat4(self.world_to_mask));
        device.set_float(
            material,
            p::MASK_INVERT_INSIDE,
            f32::from(u8::from(self.invert_inside)),
        );
        device.set_float(
            material,
            p::MASK_INVERT_OUTSIDE,
            f32::from(u8::from(self.invert_outside)),
        );

        if self.mode != BorderMode::Simple {
            device.set_vector(material, p::MASK_BORDER_RECT, rect4(self.border_rect));
            device.set_vector(material, p::MASK_UV_BORDER_RECT, rect4(self.border_uv));
            device.set_vector(
                material,
                p::MASK_TILE_REPEAT,
                [self.tile_repeat.x as f32, self.tile_repeat.y as f32, 0.0, 0.0],
            );
        }

        device.set_keyword(material, p::KEYWORD_SIMPLE, self.mode == BorderMode::Simple);
        device.set_keyword(material, p::KEYWORD_SLICED, self.mode == BorderMode::Sliced);
        device.set_keyword(material, p::KEYWORD_TILED, self.mode == BorderMode::Tiled);
    }

    /// Map a local-space point into mask-texture UV using the mode-appropriate
    /// mapping.
    pub fn local_to_uv(&self, local: Point) -> Point {
        match self.mode {
            BorderMode::Simple => remap(local, self.mask_rect, self.mask_uv),
            BorderMode::Sliced => Point::new(
                slice_axis(local.x, self.x_controls(), self.u_controls()),
                slice_axis(local.y, self.y_controls(), self.v_controls()),
            ),
            BorderMode::Tiled => Point::new(
                inset(
                    local.x,
                    self.x_controls(),
                    self.u_controls(),
                    self.tile_repeat.x,
                ),
                inset(
                    local.y,
                    self.y_controls(),
                    self.v_controls(),
                    self.tile_repeat.y,
                ),
            ),
        }
    }

    /// Sample the mask value at a local-space point.
    ///
    /// Solid-fill masks (no texture) sample as full opacity. The value is the
    /// unnormalized weighted channel sum; invert flags are *not* applied here.
    pub fn sample(&self, local: Point) -> Result<f32, SampleError> {
        let tex = match &self.texture {
            TextureHandle::None => return Ok(self.weights.dot([1.0, 1.0, 1.0, 1.0])),
            TextureHandle::RenderTarget(_) => return Err(SampleError::UnsupportedKind),
            TextureHandle::Image(t) => t,
        };
        let uv = self.local_to_uv(local);
        let rgba = tex.sample_bilinear(uv.x, uv.y)?;
        Ok(self.weights.dot(rgba))
    }

    fn x_controls(&self) -> [f64; 4] {
        [
            self.mask_rect.x0,
            self.border_rect.x0,
            self.border_rect.x1,
            self.mask_rect.x1,
        ]
    }

    fn y_controls(&self) -> [f64; 4] {
        [
            self.mask_rect.y0,
            self.border_rect.y0,
            self.border_rect.y1,
            self.mask_rect.y1,
        ]
    }

    fn u_controls(&self) -> [f64; 4] {
        [
            self.mask_uv.x0,
            self.border_uv.x0,
            self.border_uv.x1,
            self.mask_uv.x1,
        ]
    }

    fn v_controls(&self) -> [f64; 4] {
        [
            self.mask_uv.y0,
            self.border_uv.y0,
            self.border_uv.y1,
            self.mask_uv.y1,
        ]
    }
}

fn rect4(r: Rect) -> [f32; 4] {
    [r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32]
}

/// Expand a 2D affine into a column-major 4x4 matrix.
fn mat4(a: Affine) -> [f32; 16] {
    let [sa, sb, sc, sd, se, sf] = a.as_coeffs();
    #[rustfmt::skip]
    let m = [
        sa as f32, sb as f32, 0.0, 0.0,
        sc as f32, sd as f32, 0.0, 0.0,
        0.0,       0.0,       1.0, 0.0,
        se as f32, sf as f32, 0.0, 1.0,
    ];
    m
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self { inner: Xxh3::new() }
    }

    fn write_u8(&mut self, v: u8) {
        self.inner.update(&[v]);
    }

    fn write_bool(&mut self, v: bool) {
        self.write_u8(u8::from(v));
    }

    fn write_u64(&mut self, v: u64) {
        self.inner.update(&v.to_le_bytes());
    }

    fn write_f32(&mut self, v: f32) {
        self.inner.update(&v.to_bits().to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    fn write_rect(&mut self, r: Rect) {
        self.write_f64(r.x0);
        self.write_f64(r.y0);
        self.write_f64(r.x1);
        self.write_f64(r.y1);
    }

    fn finish(self) -> ParamFingerprint {
        let v = self.inner.digest128();
        ParamFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mask/params.rs"]
mod tests;
