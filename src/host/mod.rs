//! Host boundary: the scene graph and material system the engine consumes.
//!
//! Everything here is an interface plus an in-memory reference implementation.
//! Real hosts implement [`SceneGraph`](scene::SceneGraph) and
//! [`MaterialDevice`](material::MaterialDevice) over their own retained tree
//! and GPU resource system; tests and headless embedders use
//! [`MemoryScene`](scene::MemoryScene) and
//! [`MemoryMaterials`](material::MemoryMaterials).

/// Material resource interface and the in-memory device.
pub mod material;
/// Scene-graph interface and the in-memory tree.
pub mod scene;
/// Texture and sprite resource types shared across the boundary.
pub mod texture;
