use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::layers::{ActivationLayer, Convolution, Dense, Dropout, Layer, Pooling, PoolingKind};
use crate::math::tensor::Shape;
use crate::network::network::Network;

/// Describes one layer: its kind tag plus the hyperparameters needed to
/// rebuild it with the same shapes.
///
/// A dropout layer's fixed mask is a testing aid and is not recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Convolution {
        input: Shape,
        filters: usize,
        window: (usize, usize),
        stride: usize,
        padding: usize,
        activation: Option<ActivationFunction>,
    },
    Pooling {
        input: Shape,
        kind: PoolingKind,
        window: (usize, usize),
        stride: usize,
    },
    Dense {
        input: Shape,
        units: usize,
        activation: Option<ActivationFunction>,
    },
    Dropout {
        input: Shape,
        rate: f64,
        seed: u64,
    },
    Activation {
        input: Shape,
        activation: Option<ActivationFunction>,
    },
}

impl LayerSpec {
    pub fn to_layer(&self) -> Result<Layer> {
        Ok(match self {
            LayerSpec::Convolution { input, filters, window, stride, padding, activation } => {
                Layer::Convolution(Convolution::new(*input, *filters, *window, *stride, *padding, *activation)?)
            }
            LayerSpec::Pooling { input, kind, window, stride } => {
                Layer::Pooling(Pooling::new(*kind, *input, *window, *stride)?)
            }
            LayerSpec::Dense { input, units, activation } => {
                Layer::Dense(Dense::new(*input, *units, *activation)?)
            }
            LayerSpec::Dropout { input, rate, seed } => {
                Layer::Dropout(Dropout::with_seed(*input, *rate, *seed)?)
            }
            LayerSpec::Activation { input, activation } => {
                Layer::Activation(ActivationLayer::new(*input, *activation)?)
            }
        })
    }
}

impl From<&Layer> for LayerSpec {
    fn from(layer: &Layer) -> LayerSpec {
        match layer {
            Layer::Convolution(l) => LayerSpec::Convolution {
                input: l.input_shape(),
                filters: l.filters(),
                window: l.window(),
                stride: l.stride(),
                padding: l.padding(),
                activation: l.activation(),
            },
            Layer::Pooling(l) => LayerSpec::Pooling {
                input: l.input_shape(),
                kind: l.kind(),
                window: l.window(),
                stride: l.stride(),
            },
            Layer::Dense(l) => LayerSpec::Dense {
                input: l.input_shape(),
                units: l.units(),
                activation: l.activation(),
            },
            Layer::Dropout(l) => LayerSpec::Dropout {
                input: l.shape(),
                rate: l.rate(),
                seed: l.seed(),
            },
            Layer::Activation(l) => LayerSpec::Activation {
                input: l.shape(),
                activation: l.activation(),
            },
        }
    }
}

/// A fully serializable description of a network architecture.
///
/// `NetworkSpec` can be saved to / loaded from JSON independently of the
/// trained weights, so architectures can be stored before training starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input: Shape,
    #[serde(default)]
    pub default_activation: Option<ActivationFunction>,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// Assembles and builds the described network. Weights start at zero.
    pub fn build(&self) -> Result<Network> {
        let mut network = Network::new(self.input);
        if let Some(default) = self.default_activation {
            network = network.with_default_activation(default);
        }
        for spec in &self.layers {
            network.add_layer(spec.to_layer()?)?;
        }
        network.build()?;
        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl Network {
    pub fn spec(&self) -> NetworkSpec {
        NetworkSpec {
            input: self.input_shape(),
            default_activation: self.default_activation(),
            layers: self.layers().iter().map(LayerSpec::from).collect(),
        }
    }

    pub fn from_spec(spec: &NetworkSpec) -> Result<Network> {
        spec.build()
    }
}
