use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};
use crate::network::network::Network;
use crate::network::spec::NetworkSpec;
use crate::node::ComputationNode;

/// A network as it is persisted: the layer tags and shapes first, then the
/// flat parameter vector in canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub spec: NetworkSpec,
    pub params: Vec<f64>,
}

impl NetworkSnapshot {
    /// Rebuilds the layers, then replays the parameter vector. Any length
    /// mismatch is an error; nothing is truncated or padded.
    pub fn restore(&self) -> Result<Network> {
        let mut network = self.spec.build()?;
        let expected = network.param_count();
        if self.params.len() != expected {
            return Err(NetError::ParamLength { expected, found: self.params.len() });
        }
        let mut cursor = 0;
        network.update_params(&self.params, false, &mut cursor)?;
        debug_assert_eq!(cursor, self.params.len());
        Ok(network)
    }
}

impl Network {
    pub fn to_snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            spec: self.spec(),
            params: self.weights().to_vec(),
        }
    }

    pub fn from_snapshot(snapshot: &NetworkSnapshot) -> Result<Network> {
        snapshot.restore()
    }

    pub fn to_writer<W: std::io::Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &self.to_snapshot())?;
        Ok(())
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Network> {
        let snapshot: NetworkSnapshot = serde_json::from_reader(reader)?;
        snapshot.restore()
    }

    /// Serializes the network (architecture and weights) to a pretty-printed
    /// JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, &self.to_snapshot())?;
        Ok(())
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: &str) -> Result<Network> {
        let file = std::fs::File::open(path)?;
        Network::from_reader(std::io::BufReader::new(file))
    }
}
