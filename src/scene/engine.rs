use std::collections::{HashMap, HashSet};

use crate::diagnostics::{DiagFlags, diag_key};
use crate::foundation::core::{ChannelWeights, MaterialId, NodeId, Point};
use crate::foundation::error::{ScrimError, ScrimResult};
use crate::host::material::MaterialDevice;
use crate::host::scene::SceneGraph;
use crate::mask::core::SoftMask;
use crate::mask::def::MaskDef;
use crate::mask::source::MaskSource;
use crate::material::replacer::ReplacerChain;
use crate::scene::maskable::{Held, Maskable, Resolution};

/// Handle to a mask instance.
///
/// Handles are weak by construction: destroying the mask bumps the slot
/// generation, so a retained handle simply stops resolving instead of
/// dangling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MaskId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct MaskSlot {
    generation: u32,
    mask: Option<SoftMask>,
}

/// The soft-masking engine.
///
/// Owns every mask instance and every per-node adapter, and runs the whole
/// protocol single-threaded from the host's render-preparation pass:
///
/// 1. the host reports scene changes via [`MaskEngine::node_changed`] /
///    [`MaskEngine::node_removed`] as they happen;
/// 2. once per frame, before material rebinds, the host calls
///    [`MaskEngine::begin_frame`] — deferred adapter scans drain, dirty masks
///    recompute their parameters, and live replacements are re-bound;
/// 3. during rebinds the host asks [`MaskEngine::material_for`] for each
///    renderable's material, and [`MaskEngine::is_point_inside`] while routing
///    input.
pub struct MaskEngine {
    slots: Vec<MaskSlot>,
    free: Vec<u32>,
    mask_by_node: HashMap<NodeId, MaskId>,
    adapters: HashMap<NodeId, Maskable>,
    /// Subtree roots awaiting an adapter scan at the next `begin_frame`.
    pending_scan: Vec<NodeId>,
    chain: ReplacerChain,
    frame: u64,
}

impl Default for MaskEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskEngine {
    /// Engine with the built-in default replacer chain.
    pub fn new() -> Self {
        Self::with_replacers(ReplacerChain::new())
    }

    /// Engine with an explicitly assembled replacer chain.
    pub fn with_replacers(chain: ReplacerChain) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            mask_by_node: HashMap::new(),
            adapters: HashMap::new(),
            pending_scan: Vec::new(),
            chain,
            frame: 0,
        }
    }

    /// Attach a mask to `node`.
    ///
    /// The mask enables immediately when the node is active under a canvas;
    /// otherwise it stays disabled until the ancestry allows it. At most one
    /// mask per node.
    pub fn create_mask(&mut self, node: NodeId, scene: &dyn SceneGraph) -> ScrimResult<MaskId> {
        if self.mask_by_node.contains_key(&node) {
            return Err(ScrimError::validation("node already carries a mask"));
        }
        let mut mask = SoftMask::new(node);
        mask.last_canvas = scene.nearest_canvas(node);
        if mask.can_enable(scene) {
            mask.enable();
        }
        let id = match self.free.pop() {
            Some(i) => {
                let slot = &mut self.slots[i as usize];
                slot.mask = Some(mask);
                MaskId {
                    index: i,
                    generation: slot.generation,
                }
            }
            None => {
                let i = self.slots.len() as u32;
                self.slots.push(MaskSlot {
                    generation: 0,
                    mask: Some(mask),
                });
                MaskId {
                    index: i,
                    generation: 0,
                }
            }
        };
        self.mask_by_node.insert(node, id);
        self.pending_scan.push(node);
        Ok(id)
    }

    /// Destroy a mask, tearing down its replacements and re-resolving every
    /// descendant adapter.
    ///
    /// The handle goes stale before descendants are notified, so resolution
    /// during the notification can never hand out the dying mask.
    pub fn destroy_mask(
        &mut self,
        id: MaskId,
        scene: &dyn SceneGraph,
        device: &mut dyn MaterialDevice,
    ) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(mut mask) = slot.mask.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.mask_by_node.remove(&mask.node);
        mask.cache.destroy_all_and_clear(device);
        tracing::debug!(target: "scrim", node = mask.node.0, "mask destroyed");
        self.notify_subtree(mask.node, scene, device);
    }

    /// Turn masking on or off for `id`.
    ///
    /// Disabling destroys all replacements immediately and notifies
    /// descendants, even mid-frame; enabling takes effect right away when the
    /// ancestry allows it, else at the next `begin_frame` after it does.
    pub fn set_enabled(
        &mut self,
        id: MaskId,
        enabled: bool,
        scene: &dyn SceneGraph,
        device: &mut dyn MaterialDevice,
    ) {
        let Some(mask) = self.mask_mut(id) else {
            return;
        };
        mask.wanted = enabled;
        let node = mask.node;
        if enabled && !mask.is_enabled() && mask.can_enable(scene) {
            mask.enable();
            tracing::debug!(target: "scrim", node = node.0, "mask enabled");
            self.notify_subtree(node, scene, device);
        } else if !enabled && mask.is_enabled() {
            mask.disable(device);
            tracing::debug!(target: "scrim", node = node.0, "mask disabled");
            self.notify_subtree(node, scene, device);
        }
    }

    /// Apply an authoring def (channel weights, inverts, hit-test threshold).
    pub fn apply_def(&mut self, id: MaskId, def: &MaskDef) -> ScrimResult<()> {
        let mask = self
            .mask_mut(id)
            .ok_or_else(|| ScrimError::validation("mask handle is stale"))?;
        mask.apply_def(def)
    }

    /// Select the mask's image source.
    pub fn set_source(&mut self, id: MaskId, source: MaskSource) {
        if let Some(mask) = self.mask_mut(id) {
            mask.set_source(source);
        }
    }

    /// Set the channel weights directly.
    pub fn set_channel_weights(&mut self, id: MaskId, weights: ChannelWeights) {
        if let Some(mask) = self.mask_mut(id) {
            mask.weights = weights;
            mask.mark_dirty();
        }
    }

    /// Set the invert flags.
    pub fn set_inverts(&mut self, id: MaskId, invert_inside: bool, invert_outside: bool) {
        if let Some(mask) = self.mask_mut(id) {
            mask.invert_inside = invert_inside;
            mask.invert_outside = invert_outside;
            mask.mark_dirty();
        }
    }

    /// Set the hit-test threshold, clamped into `[0, 1]`.
    pub fn set_raycast_threshold(&mut self, id: MaskId, threshold: f64) {
        if let Some(mask) = self.mask_mut(id) {
            mask.raycast_threshold = threshold.clamp(0.0, 1.0);
        }
    }

    /// Force a parameter recompute at the next tick (e.g. after animating a
    /// property the engine cannot observe).
    pub fn mark_mask_dirty(&mut self, id: MaskId) {
        if let Some(mask) = self.mask_mut(id) {
            mask.mark_dirty();
        }
    }

    /// Whether `id` still refers to a live mask.
    pub fn mask_is_alive(&self, id: MaskId) -> bool {
        self.mask(id).is_some()
    }

    /// Node the mask is attached to, while it is alive.
    pub fn mask_node(&self, id: MaskId) -> Option<NodeId> {
        self.mask(id).map(|m| m.node)
    }

    /// Report that `node`'s subtree changed (reparenting, new renderables,
    /// activation churn). The subtree is re-scanned at the next
    /// `begin_frame`.
    pub fn node_changed(&mut self, node: NodeId) {
        self.pending_scan.push(node);
    }

    /// Report that `node` was removed from the scene.
    ///
    /// Destroys a mask attached to it and drops its adapter, releasing any
    /// held replacement.
    pub fn node_removed(
        &mut self,
        node: NodeId,
        scene: &dyn SceneGraph,
        device: &mut dyn MaterialDevice,
    ) {
        if let Some(&mid) = self.mask_by_node.get(&node) {
            self.destroy_mask(mid, scene, device);
        }
        if let Some(mut adapter) = self.adapters.remove(&node)
            && let Some(held) = adapter.held.take()
        {
            self.release_held(held, device);
        }
    }

    /// Release the replacement `node` is using without dropping its adapter
    /// (the node was disabled but may come back).
    pub fn release_node(&mut self, node: NodeId, device: &mut dyn MaterialDevice) {
        let held = match self.adapters.get_mut(&node) {
            Some(a) => {
                let held = a.held.take();
                if held.is_some() {
                    a.material_dirty = true;
                }
                held
            }
            None => None,
        };
        if let Some(h) = held {
            self.release_held(h, device);
        }
    }

    /// Per-frame tick, called once before the host's material rebind pass.
    ///
    /// Order matters: state reconciliation and deferred adapter scans run
    /// first, then every enabled mask recomputes (if dirty) and re-binds its
    /// replacements — so material requests later in the frame always observe
    /// this frame's parameters.
    #[tracing::instrument(skip_all)]
    pub fn begin_frame(&mut self, scene: &dyn SceneGraph, device: &mut dyn MaterialDevice) {
        self.frame += 1;

        // Reconcile wanted state against scene activity and canvas ancestry.
        let mut transitions: Vec<NodeId> = Vec::new();
        for i in 0..self.slots.len() {
            let Some(mask) = self.slots[i].mask.as_mut() else {
                continue;
            };
            let can = mask.can_enable(scene);
            match (can, mask.is_enabled()) {
                (true, false) => {
                    mask.enable();
                    transitions.push(mask.node);
                }
                (false, true) => {
                    mask.disable(device);
                    transitions.push(mask.node);
                }
                _ => {}
            }
            let canvas = scene.nearest_canvas(mask.node);
            if mask.is_enabled() && mask.last_canvas != canvas {
                mask.mark_dirty();
            }
            mask.last_canvas = canvas;
        }
        for root in transitions {
            self.notify_subtree(root, scene, device);
        }

        // Deferred adapter scans: changes observed last frame take effect now,
        // before any parameter application.
        self.drain_pending(scene, device);

        // Geometry recompute + replacement re-bind for every enabled mask.
        for i in 0..self.slots.len() {
            self.detect_nested(i, scene);
            if let Some(mask) = self.slots[i].mask.as_mut() {
                mask.tick(scene, device);
            }
        }
    }

    /// Resolve the material `node` should render with.
    ///
    /// Returns a masking-aware replacement while the node is under an
    /// enabled, affecting mask; otherwise returns `original` unchanged.
    /// Unknown nodes are queued for the next frame's adapter scan and render
    /// unmasked this frame.
    pub fn material_for(
        &mut self,
        node: NodeId,
        original: MaterialId,
        device: &mut dyn MaterialDevice,
    ) -> MaterialId {
        let Some((mask_opt, affected, held)) = self
            .adapters
            .get(&node)
            .map(|a| (a.mask, a.affected, a.held))
        else {
            self.pending_scan.push(node);
            return original;
        };

        let enabled = mask_opt
            .and_then(|m| self.mask(m))
            .is_some_and(|m| m.is_enabled());

        if !(enabled && affected) {
            if let Some(h) = held {
                self.release_held(h, device);
                if let Some(a) = self.adapters.get_mut(&node) {
                    a.held = None;
                    a.material_dirty = true;
                }
            }
            return original;
        }

        let Some(mid) = mask_opt else {
            return original;
        };
        if let Some(h) = held
            && h.mask == mid
            && h.original == original
        {
            return h.replacement.unwrap_or(original);
        }

        // Different original or different mask: release the old borrow first.
        if let Some(h) = held {
            self.release_held(h, device);
        }
        let replacement = self.grant_from(mid, original, device);
        if let Some(a) = self.adapters.get_mut(&node) {
            a.held = Some(Held {
                mask: mid,
                original,
                replacement,
            });
            a.material_dirty = true;
        }
        replacement.unwrap_or(original)
    }

    /// Take-and-clear the node's "material changed, re-bind" flag.
    pub fn take_material_dirty(&mut self, node: NodeId) -> bool {
        self.adapters
            .get_mut(&node)
            .map(|a| std::mem::take(&mut a.material_dirty))
            .unwrap_or(false)
    }

    /// Hit-test a screen-space point against the mask image.
    ///
    /// Stale or disabled masks pass everything through (`true`), as do
    /// resource errors while sampling; a point that cannot be converted into
    /// the mask's local space is outside.
    pub fn is_point_inside(&mut self, id: MaskId, screen: Point, scene: &dyn SceneGraph) -> bool {
        let Some((node, enabled)) = self.mask(id).map(|m| (m.node, m.is_enabled())) else {
            return true;
        };
        if !enabled {
            return true;
        }
        let Some(local) = scene.screen_to_local(node, screen) else {
            return false;
        };
        self.mask_mut(id).map(|m| m.hit_test(local)).unwrap_or(true)
    }

    /// Current diagnostic flags for a mask; informational only.
    pub fn poll_diagnostics(&self, id: MaskId) -> DiagFlags {
        self.mask(id).map(|m| m.flags).unwrap_or_default()
    }

    /// Whether `node` currently has an adapter attached.
    pub fn has_adapter(&self, node: NodeId) -> bool {
        self.adapters.contains_key(&node)
    }

    /// Number of live replacement materials owned by a mask.
    pub fn live_replacements(&self, id: MaskId) -> usize {
        self.mask(id).map(|m| m.cache.live_replacements()).unwrap_or(0)
    }

    fn mask(&self, id: MaskId) -> Option<&SoftMask> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.mask.as_ref())
    }

    fn mask_mut(&mut self, id: MaskId) -> Option<&mut SoftMask> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.mask.as_mut())
    }

    /// Two-pass nearest-mask resolution: enabled masks first, then any alive
    /// mask (tolerating enable-ordering at frame boundaries).
    fn resolve(&self, node: NodeId, scene: &dyn SceneGraph) -> Resolution {
        self.resolve_pass(node, scene, true)
            .or_else(|| self.resolve_pass(node, scene, false))
            .unwrap_or_default()
    }

    fn resolve_pass(
        &self,
        node: NodeId,
        scene: &dyn SceneGraph,
        enabled_only: bool,
    ) -> Option<Resolution> {
        let mut affected = true;
        let mut cur = scene.parent(node);
        while let Some(n) = cur {
            if let Some(&mid) = self.mask_by_node.get(&n)
                && let Some(m) = self.mask(mid)
                && (!enabled_only || m.is_enabled())
            {
                return Some(Resolution {
                    mask: Some(mid),
                    affected,
                });
            }
            // An overriding canvas makes its subtree opaque to outer masks;
            // anything found past it no longer affects this node.
            if scene.is_canvas(n) && scene.canvas_overrides_sorting(n) {
                affected = false;
            }
            cur = scene.parent(n);
        }
        None
    }

    /// Immediately re-resolve every adapter in `root`'s subtree ("mask might
    /// have changed"), then queue the subtree so new adapters can spawn at
    /// the next `begin_frame`.
    fn notify_subtree(
        &mut self,
        root: NodeId,
        scene: &dyn SceneGraph,
        device: &mut dyn MaterialDevice,
    ) {
        let mut to_refresh = Vec::new();
        let mut stack = vec![root];
        while let Some(n) = stack.pop() {
            if self.adapters.contains_key(&n) {
                to_refresh.push(n);
            }
            stack.extend(scene.children(n));
        }
        for n in to_refresh {
            self.refresh_adapter(n, scene, device);
        }
        self.pending_scan.push(root);
    }

    fn refresh_adapter(
        &mut self,
        node: NodeId,
        scene: &dyn SceneGraph,
        device: &mut dyn MaterialDevice,
    ) {
        let res = self.resolve(node, scene);
        let held = {
            let Some(a) = self.adapters.get_mut(&node) else {
                return;
            };
            let held = a.held.take();
            if held.is_some() || a.mask != res.mask || a.affected != res.affected {
                a.material_dirty = true;
            }
            held
        };
        if let Some(h) = held {
            self.release_held(h, device);
        }
        if res.mask.is_none() {
            // No enclosing mask at all: the adapter is superfluous.
            self.adapters.remove(&node);
            return;
        }
        if let Some(a) = self.adapters.get_mut(&node) {
            a.mask = res.mask;
            a.affected = res.affected;
        }
    }

    fn drain_pending(&mut self, scene: &dyn SceneGraph, device: &mut dyn MaterialDevice) {
        if self.pending_scan.is_empty() {
            return;
        }
        let mut seen = HashSet::new();
        let roots: Vec<NodeId> = std::mem::take(&mut self.pending_scan)
            .into_iter()
            .filter(|n| seen.insert(*n))
            .collect();
        for root in roots {
            let mut stack = vec![root];
            while let Some(n) = stack.pop() {
                stack.extend(scene.children(n));
                if self.adapters.contains_key(&n) {
                    self.refresh_adapter(n, scene, device);
                } else if scene.is_renderable(n) {
                    let res = self.resolve(n, scene);
                    if res.mask.is_some() {
                        self.adapters.insert(n, Maskable::new(res.mask, res.affected));
                    }
                }
            }
        }
    }

    fn grant_from(
        &mut self,
        mid: MaskId,
        original: MaterialId,
        device: &mut dyn MaterialDevice,
    ) -> Option<MaterialId> {
        let chain = &self.chain;
        let slot = self.slots.get_mut(mid.index as usize)?;
        if slot.generation != mid.generation {
            return None;
        }
        let mask = slot.mask.as_mut()?;
        match mask.grant(original, chain, device) {
            Ok(Some(replacement)) => Some(replacement),
            Ok(None) => {
                mask.flags.insert(DiagFlags::UNSUPPORTED_SHADER);
                let key = diag_key(DiagFlags::UNSUPPORTED_SHADER, original.0, mask.node.0);
                mask.sink.warn_once(
                    key,
                    &format!(
                        "no masking-aware replacement for material {:?}; it renders unmasked",
                        original
                    ),
                );
                None
            }
            Err(e) => {
                mask.flags.insert(DiagFlags::UNSUPPORTED_SHADER);
                let key = diag_key(DiagFlags::UNSUPPORTED_SHADER, !original.0, mask.node.0);
                mask.sink
                    .warn_once(key, &format!("material replacement failed: {e}"));
                None
            }
        }
    }

    fn release_held(&mut self, held: Held, device: &mut dyn MaterialDevice) {
        let Some(replacement) = held.replacement else {
            return;
        };
        // A stale mask already tore its cache down; nothing to release then.
        if let Some(slot) = self.slots.get_mut(held.mask.index as usize)
            && slot.generation == held.mask.generation
            && let Some(mask) = slot.mask.as_mut()
        {
            mask.cache.release(replacement, device);
        }
    }

    fn detect_nested(&mut self, index: usize, scene: &dyn SceneGraph) {
        let Some((node, enabled)) = self
            .slots
            .get(index)
            .and_then(|s| s.mask.as_ref())
            .map(|m| (m.node, m.is_enabled()))
        else {
            return;
        };
        if !enabled {
            return;
        }

        let mut outer: Option<NodeId> = None;
        let mut cur = scene.parent(node);
        while let Some(n) = cur {
            if let Some(&mid) = self.mask_by_node.get(&n)
                && self.mask(mid).is_some_and(|m| m.is_enabled())
            {
                outer = Some(n);
                break;
            }
            if scene.is_canvas(n) && scene.canvas_overrides_sorting(n) {
                break;
            }
            cur = scene.parent(n);
        }

        let Some(mask) = self.slots[index].mask.as_mut() else {
            return;
        };
        match outer {
            Some(outer_node) => {
                mask.flags.insert(DiagFlags::NESTED_MASKS);
                let key = diag_key(DiagFlags::NESTED_MASKS, outer_node.0, node.0);
                mask.sink.warn_once(
                    key,
                    "another enabled mask encloses this one; nested masks compete within one sorting group",
                );
            }
            None => mask.flags.remove(DiagFlags::NESTED_MASKS),
        }
    }
}

impl std::fmt::Debug for MaskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskEngine")
            .field("masks", &self.mask_by_node.len())
            .field("adapters", &self.adapters.len())
            .field("frame", &self.frame)
            .finish()
    }
}
