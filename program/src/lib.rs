//! Board state-commitment circuit.
//!
//! Defines the hierarchical component templates for a battleship-style
//! board: ship placement with per-coordinate interval validation, pairwise
//! fleet non-overlap, flattening of the placed cells, and MiMC-sponge
//! commitments over the resulting board state. The templates are compiled
//! into a [`witness_circuit::CircuitGraph`] and evaluated by the engine's
//! runner.

pub mod board;
pub mod inputs;
pub mod state;

pub use board::BoardGadgets;
pub use inputs::{ShipSpec, StateInputs, fleet_cells, sample_fleet};
pub use state::{BOARD_DIGEST, CELLS_DIGEST, FLEET_DIGEST, StateGadgets, build_state_graph};

/// Side length of the square board; coordinates are 1-based.
pub const BOARD_SIDE: u64 = 5;

/// Segment length of each fleet ship, in placement order.
pub const SHIP_LENGTHS: [usize; 5] = [2, 3, 3, 4, 5];

/// Total number of occupied cells across the fleet.
pub const FLEET_CELLS: usize = 17;

/// Comparator width used for coordinate range checks.
pub const COORD_BITS: usize = 5;
