use crate::foundation::core::MaterialId;
use crate::scene::engine::MaskId;

/// Replacement currently borrowed by an adapter.
///
/// The adapter never owns the replacement; the owning mask's cache does. A
/// `replacement` of `None` records the cached "no replacement possible"
/// outcome so the chain is not re-consulted on every material request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Held {
    pub(crate) mask: MaskId,
    pub(crate) original: MaterialId,
    pub(crate) replacement: Option<MaterialId>,
}

/// Per-node adapter: the resolved nearest enclosing mask plus material
/// bookkeeping.
///
/// Adapters are spawned lazily from the engine's pending-scan queue, hold
/// only weak mask handles, and destroy themselves once resolution finds no
/// enclosing mask at all.
#[derive(Debug)]
pub(crate) struct Maskable {
    /// Nearest enclosing mask; may be a not-yet-enabled one (second
    /// resolution pass), and may go stale between frames.
    pub(crate) mask: Option<MaskId>,
    /// False when a sort-override canvas lies between the node and the mask.
    pub(crate) affected: bool,
    pub(crate) held: Option<Held>,
    /// Host-visible: the node's bound material changed, re-query
    /// `material_for`.
    pub(crate) material_dirty: bool,
}

impl Maskable {
    pub(crate) fn new(mask: Option<MaskId>, affected: bool) -> Self {
        Self {
            mask,
            affected,
            held: None,
            material_dirty: true,
        }
    }
}

/// Outcome of nearest-mask resolution for one node.
///
/// Resolution runs two passes: enabled masks only, then any alive mask. The
/// second pass tolerates a disabled-but-about-to-enable mask at a frame
/// boundary; in rare orderings it can transiently land on a mask that is
/// disabled later the same frame, which the subsequent disable notification
/// corrects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Resolution {
    pub(crate) mask: Option<MaskId>,
    pub(crate) affected: bool,
}
