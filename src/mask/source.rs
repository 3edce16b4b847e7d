use crate::diagnostics::DiagFlags;
use crate::foundation::core::{BorderMode, Borders, NodeId, Rect, Vec2};
use crate::foundation::math::{SPAN_EPS, div_rect};
use crate::host::scene::{NodeImage, SceneGraph};
use crate::host::texture::{Sprite, SpritePacking, TextureHandle};

/// Where a mask takes its image from.
///
/// Exactly one arm is active at a time; switching arms marks the mask dirty.
#[derive(Clone, Debug, Default)]
pub enum MaskSource {
    /// The masking node's own renderable image; solid fill when it has none.
    #[default]
    Graphic,
    /// An explicit sprite resource.
    Sprite {
        /// Sprite to sample.
        sprite: Sprite,
        /// Border mode applied to the sprite.
        mode: BorderMode,
        /// Multiplier on the sprite's pixels-per-unit.
        ppu_multiplier: f64,
    },
    /// An explicit texture and a normalized UV sub-rectangle.
    Texture {
        /// Texture to sample.
        texture: TextureHandle,
        /// Normalized UV sub-rectangle within the texture.
        uv: Rect,
    },
}

/// Fully-resolved source description handed to the geometry pass.
#[derive(Clone, Debug)]
pub(crate) struct SourceParams {
    pub(crate) texture: TextureHandle,
    /// Normalized UV rect of the source image within its texture.
    pub(crate) uv: Rect,
    pub(crate) mode: BorderMode,
    /// 9-slice border in source pixels; zero for `Simple`.
    pub(crate) border_px: Borders,
    /// Pixel placement of the sprite in its texture, when sprite-backed.
    pub(crate) sprite_rect_px: Option<Rect>,
    /// Texture dimensions in pixels; zero when there is no samplable image.
    pub(crate) tex_size: Vec2,
    /// Source pixels per local unit (canvas-reference scaled).
    pub(crate) pixels_per_unit: f64,
    pub(crate) preserve_aspect: bool,
}

impl SourceParams {
    /// Solid-fill rectangle: no image, full opacity, whole-rect UV.
    pub(crate) fn solid() -> Self {
        Self {
            texture: TextureHandle::None,
            uv: Rect::new(0.0, 0.0, 1.0, 1.0),
            mode: BorderMode::Simple,
            border_px: Borders::default(),
            sprite_rect_px: None,
            tex_size: Vec2::ZERO,
            pixels_per_unit: 1.0,
            preserve_aspect: false,
        }
    }
}

/// Deduction outcome, including non-fatal degradations observed on the way.
#[derive(Debug)]
pub(crate) struct DeducedSource {
    pub(crate) params: SourceParams,
    pub(crate) flags: DiagFlags,
}

impl DeducedSource {
    fn clean(params: SourceParams) -> Self {
        Self {
            params,
            flags: DiagFlags::default(),
        }
    }

    fn degraded(flags: DiagFlags) -> Self {
        Self {
            params: SourceParams::solid(),
            flags,
        }
    }
}

/// Resolve a [`MaskSource`] into concrete source parameters.
///
/// Total over the three source arms. Configuration problems (tight packing
/// with a sliced/tiled mode, unsupported image kinds) degrade to the solid
/// fill and report a flag instead of failing.
pub(crate) fn deduce_source_params(
    source: &MaskSource,
    scene: &dyn SceneGraph,
    node: NodeId,
    canvas_ref_ppu: f64,
) -> DeducedSource {
    match source {
        MaskSource::Graphic => match scene.node_image(node) {
            None => DeducedSource::clean(SourceParams::solid()),
            Some(NodeImage::Texture(texture)) => {
                DeducedSource::clean(from_texture(texture, Rect::new(0.0, 0.0, 1.0, 1.0)))
            }
            Some(NodeImage::Sprite {
                sprite,
                mode,
                preserve_aspect,
            }) => from_sprite(&sprite, mode, 1.0, preserve_aspect, canvas_ref_ppu),
            Some(NodeImage::Unsupported) => {
                DeducedSource::degraded(DiagFlags::UNSUPPORTED_IMAGE_MODE)
            }
        },
        MaskSource::Sprite {
            sprite,
            mode,
            ppu_multiplier,
        } => from_sprite(sprite, *mode, *ppu_multiplier, false, canvas_ref_ppu),
        MaskSource::Texture { texture, uv } => {
            DeducedSource::clean(from_texture(texture.clone(), *uv))
        }
    }
}

fn from_texture(texture: TextureHandle, uv: Rect) -> SourceParams {
    let tex_size = match &texture {
        TextureHandle::Image(t) => Vec2::new(f64::from(t.width()), f64::from(t.height())),
        _ => Vec2::ZERO,
    };
    SourceParams {
        texture,
        uv,
        mode: BorderMode::Simple,
        border_px: Borders::default(),
        sprite_rect_px: None,
        tex_size,
        pixels_per_unit: 1.0,
        preserve_aspect: false,
    }
}

fn from_sprite(
    sprite: &Sprite,
    mode: BorderMode,
    ppu_multiplier: f64,
    preserve_aspect: bool,
    canvas_ref_ppu: f64,
) -> DeducedSource {
    if mode != BorderMode::Simple && sprite.packing == SpritePacking::Tight {
        return DeducedSource::degraded(DiagFlags::TIGHT_PACKED_SPRITE);
    }

    let tex = &sprite.texture;
    let tex_size = Vec2::new(f64::from(tex.width()), f64::from(tex.height()));

    let ref_ppu = if canvas_ref_ppu.abs() <= SPAN_EPS {
        1.0
    } else {
        canvas_ref_ppu
    };
    let multiplier = if ppu_multiplier <= SPAN_EPS {
        1.0
    } else {
        ppu_multiplier
    };
    let pixels_per_unit = (sprite.pixels_per_unit * multiplier / ref_ppu).max(SPAN_EPS);

    let border_px = if mode == BorderMode::Simple {
        Borders::default()
    } else {
        sprite.border_px
    };

    DeducedSource::clean(SourceParams {
        texture: TextureHandle::Image(sprite.texture.clone()),
        uv: div_rect(sprite.rect_px, tex_size),
        mode,
        border_px,
        sprite_rect_px: Some(sprite.rect_px),
        tex_size,
        pixels_per_unit,
        preserve_aspect,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/mask/source.rs"]
mod tests;
