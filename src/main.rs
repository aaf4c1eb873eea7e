use std::env;
use std::process::ExitCode;

use ferrite_conv::{ComputationNode, Network};
use tracing_subscriber::EnvFilter;

// All network logic lives in the library; this binary only inspects saved
// models. Run the demos with:
//   cargo run --example xor
//   cargo run --example cnn
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Some(path) = env::args().nth(1) else {
        println!("ferrite-conv: a from-scratch convolutional network engine in Rust.");
        println!("usage: ferrite-conv <model.json>   print the layers of a saved network");
        return ExitCode::SUCCESS;
    };

    let network = match Network::load_json(&path) {
        Ok(network) => network,
        Err(e) => {
            eprintln!("failed to load {path}: {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("input  {}", network.input_shape());
    for (i, layer) in network.layers().iter().enumerate() {
        println!(
            "{i:>3}  {:<16} {} -> {}  ({} params)",
            layer.name(),
            layer.input_shape(),
            layer.output_shape(),
            layer.param_count()
        );
    }
    println!("total parameters: {}", network.param_count());
    ExitCode::SUCCESS
}
