use crate::layers::LayerCache;
use crate::math::tensor::Tensor;
use crate::network::network::Network;

/// One complete set of per-layer scratch buffers.
///
/// A worker owns its workspace exclusively, so several workers can run
/// forward and backward passes over the same network at once.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub(crate) caches: Vec<LayerCache>,
}

impl Workspace {
    /// `slot` selects the dropout stream, so that parallel workspaces over the
    /// same network never draw identical masks.
    pub(crate) fn new(network: &Network, slot: usize) -> Workspace {
        let caches = network
            .layers()
            .iter()
            .map(|layer| LayerCache::new(layer, slot))
            .collect();
        Workspace { caches }
    }

    pub fn caches(&self) -> &[LayerCache] {
        &self.caches
    }

    /// Output of the last forward pass.
    pub fn output(&self) -> Option<&Tensor> {
        self.caches.last().map(|c| &c.out)
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut LayerCache> {
        self.caches.last_mut()
    }
}
