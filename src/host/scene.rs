use std::collections::HashMap;

use crate::foundation::core::{Affine, BorderMode, NodeId, Point, Rect};
use crate::host::texture::{Sprite, TextureHandle};

/// The image a node's own renderable draws, as the `Graphic` mask source sees it.
#[derive(Clone, Debug)]
pub enum NodeImage {
    /// A sprite-based image drawn with the given border mode.
    Sprite {
        /// Sprite resource.
        sprite: Sprite,
        /// Border mode the renderable draws with.
        mode: BorderMode,
        /// Whether the renderable preserves the source aspect ratio.
        preserve_aspect: bool,
    },
    /// A raw texture stretched across the node rect.
    Texture(TextureHandle),
    /// An image type the engine cannot reproduce (e.g. filled/radial modes).
    Unsupported,
}

/// Scene-graph services the engine consumes.
///
/// The engine never owns or mutates the tree; it only queries structure and
/// derived state. Queries against ids the host has already removed must return
/// the empty/`None`/`false` value, never panic — teardown ordering across a
/// tree is not guaranteed.
pub trait SceneGraph {
    /// Parent of `node`, or `None` for a root or an unknown id.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children of `node`, in sibling order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Whether `node` and every ancestor are active and enabled.
    fn is_active(&self, node: NodeId) -> bool;

    /// Node-local rect in min/max form, y-up.
    fn local_rect(&self, node: NodeId) -> Rect;

    /// Local-to-world transform of `node`.
    fn world_from_local(&self, node: NodeId) -> Affine;

    /// Whether `node` is a canvas root.
    fn is_canvas(&self, node: NodeId) -> bool;

    /// Nearest canvas at or above `node`.
    fn nearest_canvas(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `canvas` declares an explicit sort-order override, making its
    /// subtree opaque to enclosing masks.
    fn canvas_overrides_sorting(&self, canvas: NodeId) -> bool;

    /// Reference pixels-per-unit of `canvas`, for sprite border scaling.
    fn reference_ppu(&self, canvas: NodeId) -> f64;

    /// Whether `node` carries a renderable the engine should consider masking.
    fn is_renderable(&self, node: NodeId) -> bool;

    /// The image `node`'s own renderable draws, if it has one.
    fn node_image(&self, node: NodeId) -> Option<NodeImage>;

    /// Convert a screen-space point into `node`'s local rect space.
    fn screen_to_local(&self, node: NodeId, screen: Point) -> Option<Point>;
}

#[derive(Debug, Clone)]
struct SceneNode {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    active: bool,
    rect: Rect,
    world: Affine,
    canvas: bool,
    sort_override: bool,
    reference_ppu: f64,
    renderable: bool,
    image: Option<NodeImage>,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            active: true,
            rect: Rect::ZERO,
            world: Affine::IDENTITY,
            canvas: false,
            sort_override: false,
            reference_ppu: 100.0,
            renderable: false,
            image: None,
        }
    }
}

/// In-memory scene tree implementing [`SceneGraph`].
///
/// Used by the crate's tests and by headless hosts that have no retained tree
/// of their own. Nodes are created active with a zero rect and an identity
/// world transform.
#[derive(Debug, Default)]
pub struct MemoryScene {
    next_id: u64,
    nodes: HashMap<NodeId, SceneNode>,
}

impl MemoryScene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a root node that is also a canvas.
    pub fn add_canvas(&mut self) -> NodeId {
        let id = self.alloc();
        self.nodes.insert(
            id,
            SceneNode {
                canvas: true,
                ..SceneNode::default()
            },
        );
        id
    }

    /// Add a child under `parent`.
    pub fn add_child(&mut self, parent: NodeId) -> NodeId {
        let id = self.alloc();
        self.nodes.insert(
            id,
            SceneNode {
                parent: Some(parent),
                ..SceneNode::default()
            },
        );
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Turn `node` into a nested canvas, optionally overriding sort order.
    pub fn make_canvas(&mut self, node: NodeId, sort_override: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.canvas = true;
            n.sort_override = sort_override;
        }
    }

    /// Set `node`'s active flag (descendants inherit inactivity).
    pub fn set_active(&mut self, node: NodeId, active: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.active = active;
        }
    }

    /// Set `node`'s local rect.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.rect = rect;
        }
    }

    /// Set `node`'s local-to-world transform.
    pub fn set_world(&mut self, node: NodeId, world: Affine) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.world = world;
        }
    }

    /// Set the reference pixels-per-unit reported for `canvas`.
    pub fn set_reference_ppu(&mut self, canvas: NodeId, ppu: f64) {
        if let Some(n) = self.nodes.get_mut(&canvas) {
            n.reference_ppu = ppu;
        }
    }

    /// Mark `node` as carrying a renderable.
    pub fn set_renderable(&mut self, node: NodeId, renderable: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.renderable = renderable;
        }
    }

    /// Set the image `node`'s renderable draws; also marks it renderable.
    pub fn set_image(&mut self, node: NodeId, image: Option<NodeImage>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.renderable = n.renderable || image.is_some();
            n.image = image;
        }
    }

    /// Move `node` under `new_parent`.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) {
        let Some(old_parent) = self.nodes.get(&node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&old_parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parent = Some(new_parent);
        }
        if let Some(p) = self.nodes.get_mut(&new_parent) {
            p.children.push(node);
        }
    }

    /// Remove `node` and its entire subtree.
    pub fn remove(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes.get(&node).and_then(|n| n.parent)
            && let Some(p) = self.nodes.get_mut(&parent)
        {
            p.children.retain(|&c| c != node);
        }
        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            if let Some(rec) = self.nodes.remove(&n) {
                stack.extend(rec.children);
            }
        }
    }

    fn alloc(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }
}

impl SceneGraph for MemoryScene {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn is_active(&self, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            let Some(rec) = self.nodes.get(&n) else {
                return false;
            };
            if !rec.active {
                return false;
            }
            cur = rec.parent;
        }
        true
    }

    fn local_rect(&self, node: NodeId) -> Rect {
        self.nodes.get(&node).map(|n| n.rect).unwrap_or(Rect::ZERO)
    }

    fn world_from_local(&self, node: NodeId) -> Affine {
        self.nodes
            .get(&node)
            .map(|n| n.world)
            .unwrap_or(Affine::IDENTITY)
    }

    fn is_canvas(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.canvas)
    }

    fn nearest_canvas(&self, node: NodeId) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            let rec = self.nodes.get(&n)?;
            if rec.canvas {
                return Some(n);
            }
            cur = rec.parent;
        }
        None
    }

    fn canvas_overrides_sorting(&self, canvas: NodeId) -> bool {
        self.nodes.get(&canvas).is_some_and(|n| n.sort_override)
    }

    fn reference_ppu(&self, canvas: NodeId) -> f64 {
        self.nodes
            .get(&canvas)
            .map(|n| n.reference_ppu)
            .unwrap_or(100.0)
    }

    fn is_renderable(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.renderable)
    }

    fn node_image(&self, node: NodeId) -> Option<NodeImage> {
        self.nodes.get(&node).and_then(|n| n.image.clone())
    }

    fn screen_to_local(&self, node: NodeId, screen: Point) -> Option<Point> {
        let rec = self.nodes.get(&node)?;
        Some(rec.world.inverse() * screen)
    }
}
