//! Driver-facing primary-input types.

use witness_circuit::runner::InputAssignment;
use witness_circuit::WitnessField;

use crate::{BOARD_SIDE, FLEET_CELLS, SHIP_LENGTHS};

/// Anchor coordinate and heading of one ship.
///
/// Coordinates are 1-based; a horizontal ship extends along x, a vertical
/// one along y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipSpec {
    pub x: u64,
    pub y: u64,
    pub horizontal: bool,
}

impl ShipSpec {
    pub const fn new(x: u64, y: u64, horizontal: bool) -> Self {
        Self { x, y, horizontal }
    }

    /// Linear cell indices occupied by this ship, or `None` if any cell
    /// leaves the board. Mirrors the in-circuit mapping
    /// `pos = x + BOARD_SIDE * (y - 1)`.
    pub fn cells(&self, len: usize) -> Option<Vec<u64>> {
        let mut cells = Vec::with_capacity(len);
        for i in 0..len as u64 {
            let (x, y) = if self.horizontal {
                (self.x + i, self.y)
            } else {
                (self.x, self.y + i)
            };
            if x < 1 || x > BOARD_SIDE || y < 1 || y > BOARD_SIDE {
                return None;
            }
            cells.push(x + BOARD_SIDE * (y - 1));
        }
        Some(cells)
    }
}

/// Host-side mirror of the fleet placement: the flattened cell list for a
/// full fleet, or `None` if any ship leaves the board. Overlaps are not
/// checked here; rejecting them is the circuit's job.
pub fn fleet_cells(ships: &[ShipSpec; 5]) -> Option<[u64; FLEET_CELLS]> {
    let mut cells = [0u64; FLEET_CELLS];
    let mut cursor = 0;
    for (ship, &len) in ships.iter().zip(&SHIP_LENGTHS) {
        for cell in ship.cells(len)? {
            cells[cursor] = cell;
            cursor += 1;
        }
    }
    Some(cells)
}

/// Complete primary-input assignment for the state-commitment circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateInputs {
    pub ships: [ShipSpec; 5],
    /// Claimed flat cell list, committed alongside the derived placement.
    pub cells: [u64; FLEET_CELLS],
    pub salt: u64,
}

impl StateInputs {
    /// Build inputs whose claimed cells are derived from the ships
    /// themselves; `None` if any ship leaves the board.
    pub fn from_ships(ships: [ShipSpec; 5], salt: u64) -> Option<Self> {
        let cells = fleet_cells(&ships)?;
        Some(Self { ships, cells, salt })
    }

    /// Render the named input map consumed by the runner.
    pub fn assignment<F: WitnessField>(&self) -> InputAssignment<F> {
        let mut ship_params = Vec::with_capacity(15);
        for ship in &self.ships {
            ship_params.push(F::from_u64(ship.x));
            ship_params.push(F::from_u64(ship.y));
            ship_params.push(F::from_bool(ship.horizontal));
        }
        let mut inputs = InputAssignment::new();
        inputs.set("ships", ship_params);
        inputs.set("cells", self.cells.iter().map(|&c| F::from_u64(c)).collect());
        inputs.set_one("salt", F::from_u64(self.salt));
        inputs
    }
}

/// A known-good fleet layout used by tests and the example driver.
pub fn sample_fleet() -> [ShipSpec; 5] {
    [
        ShipSpec::new(1, 1, true),
        ShipSpec::new(1, 2, true),
        ShipSpec::new(1, 3, true),
        ShipSpec::new(1, 4, true),
        ShipSpec::new(1, 5, true),
    ]
}
