//! Scrim is a soft alpha-masking engine for retained-mode UI scene graphs.
//!
//! A hard clipping rectangle either draws a pixel or it does not. Scrim instead
//! clips a rectangular subtree by an arbitrary alpha-bearing image — a sprite,
//! a texture, or the masking node's own rendered content — by substituting
//! masking-aware materials for the subtree's authored materials while a mask is
//! in effect, and restoring the originals when it is not. The public API is
//! engine-oriented:
//!
//! - Describe a mask with a [`MaskDef`] and a [`MaskSource`]
//! - Register it on a scene node via [`MaskEngine::create_mask`]
//! - Drive per-frame work through [`MaskEngine::begin_frame`]
//! - Resolve render materials with [`MaskEngine::material_for`]
//! - Filter input with [`MaskEngine::is_point_inside`]
//!
//! The scene graph and the GPU material system stay on the host's side of the
//! boundary: the engine consumes them through the [`SceneGraph`] and
//! [`MaterialDevice`] traits. [`MemoryScene`] and [`MemoryMaterials`] are
//! shipped in-memory implementations for tests and headless embedding.
#![forbid(unsafe_code)]
#![deny(missing_docs)]
// A few geometry and introspection helpers exist for API completeness and are
// exercised only by the unit-test mirror under tests/unit/; allow `dead_code`
// at the crate level so non-test builds stay quiet under `-D warnings`.
#![allow(dead_code)]

mod diagnostics;
mod foundation;

/// Host-implemented boundary traits and in-memory reference implementations.
pub mod host;
/// Mask instances: authoring defs, sources, resolved parameters.
pub mod mask;
/// Material replacement: pluggable replacer strategies.
pub mod material;
/// Engine orchestration: discovery, invalidation, per-frame tick.
pub mod scene;

pub use crate::diagnostics::DiagFlags;
pub use crate::foundation::core::{
    Affine, BorderMode, Borders, ChannelWeights, MaterialId, NodeId, Point, Rect, Vec2,
};
pub use crate::foundation::error::{ScrimError, ScrimResult};

pub use crate::host::material::{MaterialDevice, MaterialRecord, MemoryMaterials};
pub use crate::host::scene::{MemoryScene, NodeImage, SceneGraph};
pub use crate::host::texture::{
    SampleError, Sprite, SpritePacking, Texture2d, TextureHandle, TextureId,
};
pub use crate::mask::def::{ChannelsDef, MaskDef};
pub use crate::mask::params::MaskParameters;
pub use crate::mask::source::MaskSource;
pub use crate::material::replacer::{DefaultReplacer, MaterialReplacer, ReplacerChain};
pub use crate::scene::engine::{MaskEngine, MaskId};
