use std::fmt;

use crate::foundation::core::MaterialId;
use crate::host::material::MaterialDevice;

/// Default UI shader most hosts assign to unmasked renderables.
pub const SHADER_UI_DEFAULT: &str = "ui/default";
/// Variant of the default UI shader for alpha-split compressed textures.
pub const SHADER_UI_DEFAULT_ALPHA_SPLIT: &str = "ui/default-alpha-split";
/// Masking-aware counterpart of [`SHADER_UI_DEFAULT`].
pub const SHADER_UI_MASKED: &str = "ui/masked";
/// Masking-aware counterpart of [`SHADER_UI_DEFAULT_ALPHA_SPLIT`].
pub const SHADER_UI_MASKED_ALPHA_SPLIT: &str = "ui/masked-alpha-split";

/// A pluggable material replacement strategy.
///
/// A replacer inspects an original material and either manufactures a
/// masking-aware substitute or declines with `None`. It must never return the
/// original id itself; the cache treats that as a fail condition.
pub trait MaterialReplacer {
    /// Chain position; lower orders run first. Ties keep registration order.
    fn order(&self) -> i32 {
        0
    }

    /// Produce a replacement for `original`, or `None` to pass.
    fn replace(&self, device: &mut dyn MaterialDevice, original: MaterialId)
    -> Option<MaterialId>;
}

/// Ordered chain of replacers; the first non-`None` result wins.
///
/// Replacers are registered explicitly by the host's composition root —
/// there is no implicit discovery.
pub struct ReplacerChain {
    replacers: Vec<Box<dyn MaterialReplacer>>,
}

impl ReplacerChain {
    /// Chain with only the built-in [`DefaultReplacer`] registered.
    pub fn new() -> Self {
        Self::empty().with(DefaultReplacer::new())
    }

    /// Chain with no replacers at all.
    pub fn empty() -> Self {
        Self {
            replacers: Vec::new(),
        }
    }

    /// Register a replacer, returning the chain for chaining.
    pub fn with(mut self, replacer: impl MaterialReplacer + 'static) -> Self {
        self.register(replacer);
        self
    }

    /// Register a replacer, keeping the chain sorted by ascending order.
    pub fn register(&mut self, replacer: impl MaterialReplacer + 'static) {
        self.replacers.push(Box::new(replacer));
        self.replacers.sort_by_key(|r| r.order());
    }

    /// Number of registered replacers.
    pub fn len(&self) -> usize {
        self.replacers.len()
    }

    /// Return `true` when no replacer is registered.
    pub fn is_empty(&self) -> bool {
        self.replacers.is_empty()
    }

    pub(crate) fn replace(
        &self,
        device: &mut dyn MaterialDevice,
        original: MaterialId,
    ) -> Option<MaterialId> {
        self.replacers
            .iter()
            .find_map(|r| r.replace(device, original))
    }
}

impl Default for ReplacerChain {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReplacerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplacerChain")
            .field("replacers", &self.replacers.len())
            .finish()
    }
}

/// Built-in strategy: swap known UI shaders for their masking-aware variants.
///
/// Three outcomes, in order:
/// 1. the shader already samples the mask natively → plain clone, so
///    per-instance mask parameters don't leak across siblings sharing one
///    source material;
/// 2. the shader is a known substitution source → clone onto the matching
///    masking-aware shader, copying all properties;
/// 3. otherwise → `None`, and masking does not apply to that material.
pub struct DefaultReplacer {
    pairs: Vec<(String, String)>,
    native: Vec<String>,
}

impl DefaultReplacer {
    /// Replacer knowing the built-in `ui/default` substitution pairs.
    pub fn new() -> Self {
        Self {
            pairs: vec![
                (SHADER_UI_DEFAULT.to_owned(), SHADER_UI_MASKED.to_owned()),
                (
                    SHADER_UI_DEFAULT_ALPHA_SPLIT.to_owned(),
                    SHADER_UI_MASKED_ALPHA_SPLIT.to_owned(),
                ),
            ],
            native: Vec::new(),
        }
    }

    /// Add a (source shader → masking-aware shader) substitution pair.
    pub fn with_pair(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.pairs.push((from.into(), to.into()));
        self
    }

    /// Declare a shader as natively mask-aware (cloned as-is).
    pub fn with_native(mut self, shader: impl Into<String>) -> Self {
        self.native.push(shader.into());
        self
    }
}

impl Default for DefaultReplacer {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialReplacer for DefaultReplacer {
    fn replace(
        &self,
        device: &mut dyn MaterialDevice,
        original: MaterialId,
    ) -> Option<MaterialId> {
        let shader = device.shader_name(original)?;
        if self.native.iter().any(|s| *s == shader) {
            return Some(device.clone_material(original));
        }
        let (_, to) = self.pairs.iter().find(|(from, _)| *from == shader)?;
        Some(device.clone_with_shader(original, to))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/material/replacer.rs"]
mod tests;
