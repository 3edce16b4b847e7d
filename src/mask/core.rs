use crate::diagnostics::{DiagFlags, DiagSink, diag_key};
use crate::foundation::core::{BorderMode, ChannelWeights, MaterialId, NodeId, Point, Rect, Vec2};
use crate::foundation::math::{
    SPAN_EPS, adjust_borders, apply_border, div_rect, preserve_aspect,
};
use crate::foundation::error::ScrimResult;
use crate::host::material::MaterialDevice;
use crate::host::scene::SceneGraph;
use crate::mask::def::MaskDef;
use crate::mask::params::MaskParameters;
use crate::mask::source::{MaskSource, deduce_source_params};
use crate::material::cache::MaterialReplacementCache;
use crate::material::replacer::ReplacerChain;

/// Masking activation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MaskState {
    /// Not masking: the component is off, the node is inactive, or no
    /// enclosing canvas exists.
    Disabled,
    /// Masking; parameters are stale while `dirty` is set.
    Enabled {
        /// Parameters must be recomputed before the next apply.
        dirty: bool,
    },
}

/// One mask instance: source selection, geometry recompute, and ownership of
/// the replacement cache.
///
/// Destruction is modeled by arena-slot removal in the engine; a `SoftMask`
/// value that is still reachable is alive by definition.
#[derive(Debug)]
pub(crate) struct SoftMask {
    pub(crate) node: NodeId,
    pub(crate) source: MaskSource,
    pub(crate) weights: ChannelWeights,
    pub(crate) invert_inside: bool,
    pub(crate) invert_outside: bool,
    pub(crate) raycast_threshold: f64,
    /// Whether the host wants this mask on; effective state also requires an
    /// active node under a canvas.
    pub(crate) wanted: bool,
    pub(crate) state: MaskState,
    last_rect: Option<Rect>,
    pub(crate) last_canvas: Option<NodeId>,
    pub(crate) params: MaskParameters,
    pub(crate) cache: MaterialReplacementCache,
    pub(crate) flags: DiagFlags,
    pub(crate) sink: DiagSink,
    source_identity: u64,
}

impl SoftMask {
    pub(crate) fn new(node: NodeId) -> Self {
        Self {
            node,
            source: MaskSource::default(),
            weights: ChannelWeights::ALPHA,
            invert_inside: false,
            invert_outside: false,
            raycast_threshold: 0.0,
            wanted: true,
            state: MaskState::Disabled,
            last_rect: None,
            last_canvas: None,
            params: MaskParameters::default(),
            cache: MaterialReplacementCache::default(),
            flags: DiagFlags::default(),
            sink: DiagSink::default(),
            source_identity: 0,
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        matches!(self.state, MaskState::Enabled { .. })
    }

    pub(crate) fn mark_dirty(&mut self) {
        if let MaskState::Enabled { dirty } = &mut self.state {
            *dirty = true;
        }
    }

    pub(crate) fn apply_def(&mut self, def: &MaskDef) -> ScrimResult<()> {
        def.validate()?;
        self.weights = def.weights();
        self.invert_inside = def.invert_inside;
        self.invert_outside = def.invert_outside;
        self.raycast_threshold = def.raycast_threshold;
        self.mark_dirty();
        Ok(())
    }

    pub(crate) fn set_source(&mut self, source: MaskSource) {
        self.source = source;
        self.mark_dirty();
    }

    /// Whether masking can be on given the node's current ancestry.
    pub(crate) fn can_enable(&self, scene: &dyn SceneGraph) -> bool {
        self.wanted && scene.is_active(self.node) && scene.nearest_canvas(self.node).is_some()
    }

    /// Transition into the enabled state with stale parameters.
    pub(crate) fn enable(&mut self) {
        self.state = MaskState::Enabled { dirty: true };
    }

    /// Transition into the disabled state, tearing down every replacement.
    pub(crate) fn disable(&mut self, device: &mut dyn MaterialDevice) {
        self.cache.destroy_all_and_clear(device);
        self.state = MaskState::Disabled;
        self.last_rect = None;
    }

    /// Per-frame tick: recompute parameters when dirty or when the node's
    /// rect changed, then push them to every live replacement.
    pub(crate) fn tick(&mut self, scene: &dyn SceneGraph, device: &mut dyn MaterialDevice) {
        let MaskState::Enabled { dirty } = self.state else {
            return;
        };
        let rect = scene.local_rect(self.node);
        if dirty || self.last_rect != Some(rect) {
            self.recompute(rect, scene);
            self.last_rect = Some(rect);
            self.state = MaskState::Enabled { dirty: false };
        }
        self.cache.apply_all(&self.params, device);
    }

    /// Grant a replacement for `original` from this mask's cache.
    pub(crate) fn grant(
        &mut self,
        original: MaterialId,
        chain: &ReplacerChain,
        device: &mut dyn MaterialDevice,
    ) -> ScrimResult<Option<MaterialId>> {
        self.cache.get(original, &self.params, chain, device)
    }

    /// Hit-test a point already converted into the mask node's local space.
    pub(crate) fn hit_test(&mut self, local: Point) -> bool {
        if !self.params.mask_rect.contains(local) {
            return self.params.invert_outside;
        }
        if self.raycast_threshold <= 0.0 {
            return true;
        }
        match self.params.sample(local) {
            Ok(v) => {
                let v = if self.params.invert_inside { 1.0 - v } else { v };
                f64::from(v) >= self.raycast_threshold
            }
            Err(e) => {
                // Resource errors degrade to "treat as inside".
                self.flags.insert(DiagFlags::UNREADABLE_TEXTURE);
                let key = diag_key(
                    DiagFlags::UNREADABLE_TEXTURE,
                    self.params.texture.identity(),
                    self.node.0,
                );
                self.sink.warn_once(
                    key,
                    &format!("mask hit-test cannot sample its texture ({e}); treating points as inside"),
                );
                true
            }
        }
    }

    fn recompute(&mut self, rect: Rect, scene: &dyn SceneGraph) {
        let ref_ppu = scene
            .nearest_canvas(self.node)
            .map(|c| scene.reference_ppu(c))
            .unwrap_or(100.0);

        let deduced = deduce_source_params(&self.source, scene, self.node, ref_ppu);
        let sp = deduced.params;

        let identity = sp.texture.identity();
        if identity != self.source_identity {
            self.source_identity = identity;
            self.sink.reset();
        }

        self.flags
            .remove(DiagFlags::TIGHT_PACKED_SPRITE | DiagFlags::UNSUPPORTED_IMAGE_MODE);
        self.flags.insert(deduced.flags);
        if deduced.flags.contains(DiagFlags::TIGHT_PACKED_SPRITE) {
            let key = diag_key(DiagFlags::TIGHT_PACKED_SPRITE, identity, self.node.0);
            self.sink.warn_once(
                key,
                "mask sprite is tightly packed and cannot be sliced or tiled; using a solid mask",
            );
        }
        if deduced.flags.contains(DiagFlags::UNSUPPORTED_IMAGE_MODE) {
            let key = diag_key(DiagFlags::UNSUPPORTED_IMAGE_MODE, identity, self.node.0);
            self.sink.warn_once(
                key,
                "mask node's image mode is not supported as a mask source; using a solid mask",
            );
        }

        let mut mask_rect = rect;
        if sp.preserve_aspect && sp.mode == BorderMode::Simple {
            let src = sp
                .sprite_rect_px
                .map(|r| Vec2::new(r.width(), r.height()))
                .unwrap_or(sp.tex_size);
            mask_rect = preserve_aspect(mask_rect, src);
        }

        let ppu = sp.pixels_per_unit.max(SPAN_EPS);
        let border_local = adjust_borders(sp.border_px.scaled(1.0 / ppu), mask_rect);
        let border_rect = apply_border(mask_rect, border_local);

        let border_uv = match sp.sprite_rect_px {
            Some(r) if sp.mode != BorderMode::Simple => {
                div_rect(apply_border(r, sp.border_px), sp.tex_size)
            }
            _ => sp.uv,
        };

        let tile_repeat = if sp.mode == BorderMode::Tiled {
            let center_px = sp
                .sprite_rect_px
                .map(|r| apply_border(r, sp.border_px))
                .unwrap_or(Rect::ZERO);
            Vec2::new(
                repeat_axis(border_rect.width(), center_px.width(), ppu),
                repeat_axis(border_rect.height(), center_px.height(), ppu),
            )
        } else {
            Vec2::new(1.0, 1.0)
        };

        self.params = MaskParameters {
            mask_rect,
            mask_uv: sp.uv,
            border_rect,
            border_uv,
            tile_repeat,
            weights: self.weights,
            world_to_mask: scene.world_from_local(self.node).inverse(),
            invert_inside: self.invert_inside,
            invert_outside: self.invert_outside,
            texture: sp.texture,
            mode: sp.mode,
        };
    }
}

/// How many source tiles the rendered center spans along one axis.
///
/// Accepts non-integer ratios; the far edge then shows a partial tile.
fn repeat_axis(local_size: f64, center_px: f64, ppu: f64) -> f64 {
    if center_px <= SPAN_EPS || local_size <= 0.0 {
        return 1.0;
    }
    (local_size * ppu / center_px).max(0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/mask/core.rs"]
mod tests;
