use log::debug;

/// The `src` attribute value that identifies the pegman drag handle among
/// the nodes the map toolkit inserts at runtime.
pub const PEGMAN_SIGNATURE: &str = "https://maps.gstatic.com/mapfiles/transparent.png";

const HOOK_MARKER: &str = "data-timetravel-hooked";

/// A node reported by the host's structural-change observation, reduced to
/// the attribute surface the detector needs.
pub trait ObservedNode {
    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&mut self, name: &str, value: &str);
}

/// Detects the pegman drag handle among dynamically inserted nodes.
///
/// The host subscribes to structural-change notifications on the map
/// container and feeds each mutated node to [`try_hook`](Self::try_hook).
/// The first node matching the capability signature is marked, and the host
/// should then attach press/release listeners wired to
/// [`handle_pegman_press`](crate::TimeTravelController::handle_pegman_press)
/// and [`handle_pegman_release`](crate::TimeTravelController::handle_pegman_release).
/// The marker guarantees listeners are attached exactly once even though the
/// toolkit keeps mutating the same node.
#[derive(Debug, Clone)]
pub struct PegmanDetector {
    signature: String,
}

impl PegmanDetector {
    pub fn new() -> Self {
        Self {
            signature: PEGMAN_SIGNATURE.to_string(),
        }
    }

    /// Use a custom capability signature instead of the default pegman URL.
    pub fn with_signature(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
        }
    }

    /// Returns `true` when `node` is the drag handle and was not already
    /// hooked; the node is marked so a second notification for it is a no-op.
    pub fn try_hook<N: ObservedNode>(&self, node: &mut N) -> bool {
        if node.attribute("src").as_deref() != Some(self.signature.as_str()) {
            return false;
        }
        if node.attribute(HOOK_MARKER).is_some() {
            return false;
        }
        debug!("Attaching events on pegman");
        node.set_attribute(HOOK_MARKER, "true");
        true
    }
}

impl Default for PegmanDetector {
    fn default() -> Self {
        Self::new()
    }
}
