//! Demo driver: compile the state-commitment circuit, evaluate a fleet
//! layout and print the resulting commitments.
//!
//! Run with: cargo run --release --example state_init -- --salt 42

use clap::Parser;
use p3_baby_bear::BabyBear;
use tracing::info;
use tracing_forest::ForestLayer;
use tracing_forest::util::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use witness_program::{
    build_state_graph, sample_fleet, StateInputs, BOARD_DIGEST, CELLS_DIGEST, FLEET_DIGEST,
};

type F = BabyBear;

#[derive(Parser, Debug)]
#[command(about = "Evaluate the board state-commitment circuit")]
struct Args {
    /// Sponge key mixed into every commitment.
    #[arg(short, long, default_value_t = 42)]
    salt: u64,
}

fn main() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    Registry::default()
        .with(env_filter)
        .with(ForestLayer::default())
        .init();

    let args = Args::parse();

    let inputs = StateInputs::from_ships(sample_fleet(), args.salt)
        .expect("sample fleet fits the board");
    let graph = build_state_graph::<F>().expect("state graph is well formed");
    info!(
        signals = graph.total_signals(),
        "evaluating state-commitment circuit"
    );

    let witness = graph
        .runner()
        .run(&inputs.assignment())
        .expect("sample fleet satisfies the circuit");

    info!(cells = ?inputs.cells, "fleet placement");
    info!(fleet = ?witness.get(FLEET_DIGEST).unwrap(), "fleet commitment");
    info!(board = ?witness.get(BOARD_DIGEST).unwrap(), "board commitment");
    info!(claim = ?witness.get(CELLS_DIGEST).unwrap(), "claimed-cells commitment");
}
