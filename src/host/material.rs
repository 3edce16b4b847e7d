use std::collections::{BTreeMap, HashMap};

use crate::foundation::core::MaterialId;
use crate::host::texture::TextureHandle;

/// Host material/shader resource interface consumed by the engine.
///
/// Materials are opaque, identity-keyed GPU resources. The engine only ever
/// clones, destroys, and writes named properties; it never inspects property
/// values back. All calls happen on the render-preparation thread.
pub trait MaterialDevice {
    /// Clone `source` into a new material with the same shader and properties.
    fn clone_material(&mut self, source: MaterialId) -> MaterialId;

    /// Create a new material using `shader`, copying `source`'s properties.
    fn clone_with_shader(&mut self, source: MaterialId, shader: &str) -> MaterialId;

    /// Destroy a material and free its GPU resources.
    fn destroy_material(&mut self, id: MaterialId);

    /// Name of the shader `id` uses, or `None` for an unknown id.
    fn shader_name(&self, id: MaterialId) -> Option<String>;

    /// Bind a texture property.
    fn set_texture(&mut self, id: MaterialId, name: &str, texture: &TextureHandle);

    /// Bind a vec4 property.
    fn set_vector(&mut self, id: MaterialId, name: &str, value: [f32; 4]);

    /// Bind a color property.
    fn set_color(&mut self, id: MaterialId, name: &str, value: [f32; 4]);

    /// Bind a 4x4 column-major matrix property.
    fn set_matrix(&mut self, id: MaterialId, name: &str, value: [f32; 16]);

    /// Bind a float property.
    fn set_float(&mut self, id: MaterialId, name: &str, value: f32);

    /// Toggle a shader feature keyword.
    fn set_keyword(&mut self, id: MaterialId, keyword: &str, enabled: bool);

    /// Exclude `id` from persistence and host tooling enumeration.
    ///
    /// Replacement materials are engine-owned transients; hosts must not save
    /// or list them.
    fn set_hidden(&mut self, id: MaterialId);
}

/// Recorded state of one material in [`MemoryMaterials`].
#[derive(Debug, Clone, Default)]
pub struct MaterialRecord {
    /// Shader name.
    pub shader: String,
    /// Whether the material was hidden from host tooling.
    pub hidden: bool,
    /// Bound float properties.
    pub floats: BTreeMap<String, f32>,
    /// Bound vec4 properties.
    pub vectors: BTreeMap<String, [f32; 4]>,
    /// Bound color properties.
    pub colors: BTreeMap<String, [f32; 4]>,
    /// Bound matrix properties.
    pub matrices: BTreeMap<String, [f32; 16]>,
    /// Bound texture identities.
    pub textures: BTreeMap<String, u64>,
    /// Enabled/disabled shader keywords.
    pub keywords: BTreeMap<String, bool>,
    /// Number of property/keyword writes the material has received.
    pub binding_writes: u64,
}

/// In-memory [`MaterialDevice`] for tests and headless hosts.
#[derive(Debug, Default)]
pub struct MemoryMaterials {
    next_id: u64,
    materials: HashMap<MaterialId, MaterialRecord>,
    /// Materials destroyed over the device's lifetime.
    pub destroyed: u64,
}

impl MemoryMaterials {
    /// Empty device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh material using `shader`, with no properties bound.
    pub fn create(&mut self, shader: &str) -> MaterialId {
        let id = self.alloc();
        self.materials.insert(
            id,
            MaterialRecord {
                shader: shader.to_owned(),
                ..MaterialRecord::default()
            },
        );
        id
    }

    /// Recorded state of `id`, if it is alive.
    pub fn record(&self, id: MaterialId) -> Option<&MaterialRecord> {
        self.materials.get(&id)
    }

    /// Whether `id` refers to a live material.
    pub fn is_alive(&self, id: MaterialId) -> bool {
        self.materials.contains_key(&id)
    }

    /// Number of live materials.
    pub fn alive_count(&self) -> usize {
        self.materials.len()
    }

    fn alloc(&mut self) -> MaterialId {
        self.next_id += 1;
        MaterialId(self.next_id)
    }

    fn write(&mut self, id: MaterialId) -> &mut MaterialRecord {
        let rec = self.materials.entry(id).or_default();
        rec.binding_writes += 1;
        rec
    }
}

impl MaterialDevice for MemoryMaterials {
    fn clone_material(&mut self, source: MaterialId) -> MaterialId {
        let mut rec = self.materials.get(&source).cloned().unwrap_or_default();
        rec.binding_writes = 0;
        rec.hidden = false;
        let id = self.alloc();
        self.materials.insert(id, rec);
        id
    }

    fn clone_with_shader(&mut self, source: MaterialId, shader: &str) -> MaterialId {
        let mut rec = self.materials.get(&source).cloned().unwrap_or_default();
        rec.shader = shader.to_owned();
        rec.binding_writes = 0;
        rec.hidden = false;
        // Keywords belong to the source shader's configuration, not the clone's.
        rec.keywords.clear();
        let id = self.alloc();
        self.materials.insert(id, rec);
        id
    }

    fn destroy_material(&mut self, id: MaterialId) {
        if self.materials.remove(&id).is_some() {
            self.destroyed += 1;
        }
    }

    fn shader_name(&self, id: MaterialId) -> Option<String> {
        self.materials.get(&id).map(|r| r.shader.clone())
    }

    fn set_texture(&mut self, id: MaterialId, name: &str, texture: &TextureHandle) {
        let identity = texture.identity();
        self.write(id).textures.insert(name.to_owned(), identity);
    }

    fn set_vector(&mut self, id: MaterialId, name: &str, value: [f32; 4]) {
        self.write(id).vectors.insert(name.to_owned(), value);
    }

    fn set_color(&mut self, id: MaterialId, name: &str, value: [f32; 4]) {
        self.write(id).colors.insert(name.to_owned(), value);
    }

    fn set_matrix(&mut self, id: MaterialId, name: &str, value: [f32; 16]) {
        self.write(id).matrices.insert(name.to_owned(), value);
    }

    fn set_float(&mut self, id: MaterialId, name: &str, value: f32) {
        self.write(id).floats.insert(name.to_owned(), value);
    }

    fn set_keyword(&mut self, id: MaterialId, keyword: &str, enabled: bool) {
        self.write(id).keywords.insert(keyword.to_owned(), enabled);
    }

    fn set_hidden(&mut self, id: MaterialId) {
        if let Some(rec) = self.materials.get_mut(&id) {
            rec.hidden = true;
        }
    }
}
