pub mod network;
pub mod snapshot;
pub mod spec;
pub mod workspace;

pub use network::Network;
pub use snapshot::NetworkSnapshot;
pub use spec::{LayerSpec, NetworkSpec};
pub use workspace::Workspace;
