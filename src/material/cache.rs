use smallvec::SmallVec;

use crate::foundation::core::MaterialId;
use crate::foundation::error::{ScrimError, ScrimResult};
use crate::host::material::MaterialDevice;
use crate::mask::params::{MaskParameters, ParamFingerprint};
use crate::material::replacer::ReplacerChain;

/// One (original → replacement) entry.
///
/// `replacement == None` records that no replacement is possible for the
/// original's shader; that outcome is cached like any other so the replacer
/// chain is not re-run per request.
#[derive(Debug)]
struct Override {
    original: MaterialId,
    replacement: Option<MaterialId>,
    use_count: u32,
    /// Fingerprint of the parameters last applied to `replacement`.
    bound: Option<ParamFingerprint>,
}

/// Refcounted store of masking-aware replacements for one mask.
///
/// Entries are keyed by the original material's identity and searched
/// linearly: the expected population is one entry per distinct material in
/// the masked subtree, which is small.
#[derive(Debug, Default)]
pub(crate) struct MaterialReplacementCache {
    overrides: SmallVec<[Override; 4]>,
}

impl MaterialReplacementCache {
    /// Grant a replacement for `original`, manufacturing one through `chain`
    /// on first request.
    ///
    /// Increments the entry's use count and leaves the replacement bound with
    /// the current `params`. Fails only when the chain misbehaves by
    /// returning the original itself.
    pub(crate) fn get(
        &mut self,
        original: MaterialId,
        params: &MaskParameters,
        chain: &ReplacerChain,
        device: &mut dyn MaterialDevice,
    ) -> ScrimResult<Option<MaterialId>> {
        let fp = params.fingerprint();

        if let Some(o) = self.overrides.iter_mut().find(|o| o.original == original) {
            o.use_count += 1;
            if let Some(r) = o.replacement
                && o.bound != Some(fp)
            {
                params.apply(device, r);
                o.bound = Some(fp);
            }
            return Ok(o.replacement);
        }

        let replacement = chain.replace(device, original);
        if replacement == Some(original) {
            return Err(ScrimError::replacement(
                "replacer returned the original material instead of a copy",
            ));
        }

        let mut bound = None;
        if let Some(r) = replacement {
            device.set_hidden(r);
            params.apply(device, r);
            bound = Some(fp);
        }
        self.overrides.push(Override {
            original,
            replacement,
            use_count: 1,
            bound,
        });
        Ok(replacement)
    }

    /// Release one use of `replacement`; destroys it at zero uses.
    ///
    /// Unknown ids are ignored — teardown ordering across a subtree is not
    /// guaranteed, and the owning mask may already have torn everything down.
    pub(crate) fn release(&mut self, replacement: MaterialId, device: &mut dyn MaterialDevice) {
        let Some(i) = self
            .overrides
            .iter()
            .position(|o| o.replacement == Some(replacement))
        else {
            return;
        };
        let o = &mut self.overrides[i];
        o.use_count = o.use_count.saturating_sub(1);
        if o.use_count == 0 {
            device.destroy_material(replacement);
            self.overrides.swap_remove(i);
        }
    }

    /// Re-apply `params` to every live replacement.
    ///
    /// Called once per mask per frame after any recompute; entries already
    /// bound with the same fingerprint are skipped.
    pub(crate) fn apply_all(&mut self, params: &MaskParameters, device: &mut dyn MaterialDevice) {
        let fp = params.fingerprint();
        for o in &mut self.overrides {
            if let Some(r) = o.replacement
                && o.bound != Some(fp)
            {
                params.apply(device, r);
                o.bound = Some(fp);
            }
        }
    }

    /// Destroy every replacement regardless of use count and clear the store.
    ///
    /// Used when the owning mask is disabled or destroyed; descendants may
    /// not have had a chance to release cleanly.
    pub(crate) fn destroy_all_and_clear(&mut self, device: &mut dyn MaterialDevice) {
        for o in self.overrides.drain(..) {
            if let Some(r) = o.replacement {
                device.destroy_material(r);
            }
        }
    }

    /// Number of override entries (including cached-`None` ones).
    pub(crate) fn len(&self) -> usize {
        self.overrides.len()
    }

    /// Number of live replacement materials.
    pub(crate) fn live_replacements(&self) -> usize {
        self.overrides
            .iter()
            .filter(|o| o.replacement.is_some())
            .count()
    }

    #[cfg(test)]
    pub(crate) fn use_count_of(&self, original: MaterialId) -> Option<u32> {
        self.overrides
            .iter()
            .find(|o| o.original == original)
            .map(|o| o.use_count)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/material/cache.rs"]
mod tests;
