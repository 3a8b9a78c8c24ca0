//! Trust-anchor candidates supplied on demand.
//!
//! Engines that resolve trust anchors through a callback ask for candidates
//! per certificate being verified. The harness has no selection logic of
//! its own; [`StaticTrustAnchors`] hands back every configured anchor and
//! leaves matching to the engine.

/// Source of candidate trust anchors for a certificate under verification.
pub trait TrustAnchorSource<C> {
    /// Candidates that may have issued `child`. May be empty.
    fn candidates(&self, child: &C) -> Vec<C>;
}

/// Pass-through source returning a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticTrustAnchors<C> {
    anchors: Vec<C>,
}

impl<C> StaticTrustAnchors<C> {
    /// Serve `anchors` for every request.
    pub fn new(anchors: Vec<C>) -> Self {
        Self { anchors }
    }

    /// Number of configured anchors.
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether no anchors are configured.
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl<C: Clone> TrustAnchorSource<C> for StaticTrustAnchors<C> {
    fn candidates(&self, _child: &C) -> Vec<C> {
        tracing::trace!(count = self.anchors.len(), "supplying trust anchor candidates");
        self.anchors.clone()
    }
}
