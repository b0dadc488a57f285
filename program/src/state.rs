//! State-commitment templates and the root circuit graph.

use std::sync::Arc;

use tracing::debug;
use witness_circuit::graph::{CircuitGraph, ComponentTemplate, GraphBuilder, SubcomponentSpec};
use witness_circuit::ops::MimcGadgets;
use witness_circuit::types::TemplateId;
use witness_circuit::{CircuitError, WitnessField};

use crate::board::BoardGadgets;
use crate::FLEET_CELLS;

/// Witness index of the fleet commitment (root output 0).
pub const FLEET_DIGEST: usize = 0;
/// Witness index of the board-state commitment (root output 1).
pub const BOARD_DIGEST: usize = 1;
/// Witness index of the claimed-cells commitment (root output 2).
pub const CELLS_DIGEST: usize = 2;

const N: usize = FLEET_CELLS;

// CellsDigest layout.
const CD_CELLS: usize = 1;
const CD_SALT: usize = 1 + N;
const CD_DIGEST: usize = 2 + N;
const CD_SIGNALS: usize = 3 + N;

// BoardDigest layout.
const BD_HITS: usize = 1;
const BD_CELLS: usize = 1 + N;
const BD_SALT: usize = 1 + 2 * N;
const BD_PAIR: usize = 2 + 2 * N;
const BD_MIX: usize = 2 + 3 * N;
const BD_DIGEST: usize = 2 + 4 * N;
const BD_SIGNALS: usize = 3 + 4 * N;

// StateInit layout.
const SI_SHIPS: usize = 3;
const SI_CELLS: usize = SI_SHIPS + 15;
const SI_SALT: usize = SI_CELLS + N;
const SI_PLACED: usize = SI_SALT + 1;
const SI_FLAT: usize = SI_PLACED + N;
const SI_HITS: usize = SI_FLAT + N;
const SI_SIGNALS: usize = SI_HITS + N;

/// Commitment templates for [`GraphBuilder`].
pub trait StateGadgets<F> {
    /// Keyed sponge digest of a flat cell array.
    ///
    /// Layout: `out(0), cells[1..18], salt(18)`.
    fn cells_digest(&mut self) -> TemplateId;

    /// Board-state commitment: one keyed pair sponge per cell over
    /// `(hit, cell)`, then a keyed sponge over the 17 pair digests.
    ///
    /// Layout: `out(0), hits[1..18], cells[18..35], salt(35)`.
    fn board_digest(&mut self) -> TemplateId;

    /// Root template: places the fleet, flattens it, zeroes the hit
    /// markers and emits the three commitments.
    ///
    /// Layout: `fleet_digest(0), board_digest(1), cells_digest(2)`,
    /// inputs `ships[3..18], cells[18..35], salt(35)`.
    fn state_init(&mut self) -> TemplateId;
}

impl<F: WitnessField> StateGadgets<F> for GraphBuilder<F> {
    fn cells_digest(&mut self) -> TemplateId {
        let sponge = self.mimc_sponge(N);
        self.gadget("CellsDigest", &[], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("CellsDigest"),
                signal_count: CD_SIGNALS,
                output_count: 1,
                input_count: N + 1,
                subcomponents: vec![SubcomponentSpec::single("sponge", sponge)],
                body: Arc::new(|scope| {
                    for i in 0..N {
                        let cell = scope.get(CD_CELLS + i)?;
                        scope.feed_child(0, 1 + i, cell)?;
                    }
                    let salt = scope.get(CD_SALT)?;
                    scope.feed_child(0, N + 1, salt)?;
                    let digest = scope.child_output(0, 0)?;
                    scope.set(CD_DIGEST, digest)?;
                    scope.set(0, digest)
                }),
            })
        })
    }

    fn board_digest(&mut self) -> TemplateId {
        let outer = self.mimc_sponge(N);
        let pair = self.mimc_sponge(2);
        self.gadget("BoardDigest", &[], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("BoardDigest"),
                signal_count: BD_SIGNALS,
                output_count: 1,
                input_count: 2 * N + 1,
                subcomponents: vec![
                    SubcomponentSpec::single("outer", outer),
                    SubcomponentSpec::new("cell", pair, N),
                ],
                body: Arc::new(|scope| {
                    let salt = scope.get(BD_SALT)?;
                    for i in 0..N {
                        let slot = 1 + i;
                        let hit = scope.get(BD_HITS + i)?;
                        let cell = scope.get(BD_CELLS + i)?;
                        scope.feed_child(slot, 1, hit)?;
                        scope.feed_child(slot, 2, cell)?;
                        scope.feed_child(slot, 3, salt)?;
                        let digest = scope.child_output(slot, 0)?;
                        scope.set(BD_PAIR + i, digest)?;
                        let mixed = scope.get(BD_PAIR + i)?;
                        scope.set(BD_MIX + i, mixed)?;
                    }
                    for i in 0..N {
                        let mixed = scope.get(BD_MIX + i)?;
                        scope.feed_child(0, 1 + i, mixed)?;
                    }
                    scope.feed_child(0, N + 1, salt)?;
                    let digest = scope.child_output(0, 0)?;
                    scope.set(BD_DIGEST, digest)?;
                    scope.set(0, digest)
                }),
            })
        })
    }

    fn state_init(&mut self) -> TemplateId {
        let fleet = self.fleet_placement();
        let concat = self.concat_cells();
        let cells_digest = self.cells_digest();
        let board_digest = self.board_digest();
        self.gadget("StateInit", &[], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("StateInit"),
                signal_count: SI_SIGNALS,
                output_count: 3,
                input_count: 15 + N + 1,
                subcomponents: vec![
                    SubcomponentSpec::single("fleet", fleet),
                    SubcomponentSpec::single("flat", concat),
                    SubcomponentSpec::single("fleet_commit", cells_digest),
                    SubcomponentSpec::single("board_commit", board_digest),
                    SubcomponentSpec::single("claim_commit", cells_digest),
                ],
                body: Arc::new(|scope| {
                    let salt = scope.get(SI_SALT)?;

                    // Place the fleet from the raw ship parameters.
                    for i in 0..15 {
                        let param = scope.get(SI_SHIPS + i)?;
                        scope.feed_child(0, N + i, param)?;
                    }
                    for i in 0..N {
                        let pos = scope.child_output(0, i)?;
                        scope.set(SI_PLACED + i, pos)?;
                    }

                    // Flatten into one cell array.
                    for i in 0..N {
                        let pos = scope.get(SI_PLACED + i)?;
                        scope.feed_child(1, N + i, pos)?;
                    }
                    for i in 0..N {
                        let pos = scope.child_output(1, i)?;
                        scope.set(SI_FLAT + i, pos)?;
                    }

                    // Commit to the derived placement.
                    for i in 0..N {
                        let pos = scope.get(SI_FLAT + i)?;
                        scope.feed_child(2, CD_CELLS + i, pos)?;
                    }
                    scope.feed_child(2, CD_SALT, salt)?;
                    let fleet_digest = scope.child_output(2, 0)?;
                    scope.set(FLEET_DIGEST, fleet_digest)?;

                    // A fresh board has no hits.
                    for i in 0..N {
                        scope.set(SI_HITS + i, F::ZERO)?;
                    }

                    // Commit to the initial board state over the claimed cells.
                    for i in 0..N {
                        let hit = scope.get(SI_HITS + i)?;
                        scope.feed_child(3, BD_HITS + i, hit)?;
                    }
                    for i in 0..N {
                        let cell = scope.get(SI_CELLS + i)?;
                        scope.feed_child(3, BD_CELLS + i, cell)?;
                    }
                    scope.feed_child(3, BD_SALT, salt)?;
                    let board = scope.child_output(3, 0)?;
                    scope.set(BOARD_DIGEST, board)?;

                    // Commit to the claimed cells themselves.
                    for i in 0..N {
                        let cell = scope.get(SI_CELLS + i)?;
                        scope.feed_child(4, CD_CELLS + i, cell)?;
                    }
                    scope.feed_child(4, CD_SALT, salt)?;
                    let claim = scope.child_output(4, 0)?;
                    scope.set(CELLS_DIGEST, claim)
                }),
            })
        })
    }
}

/// Compile the full state-commitment circuit.
///
/// Primary inputs: `ships` (five `(x, y, heading)` triples), `cells` (the
/// 17 claimed flat cell indices) and `salt` (the sponge key).
pub fn build_state_graph<F: WitnessField>() -> Result<CircuitGraph<F>, CircuitError> {
    let mut builder = GraphBuilder::new();
    let root = builder.state_init();
    builder.set_main(root);
    builder.bind_input("ships", SI_SHIPS, 15);
    builder.bind_input("cells", SI_CELLS, N);
    builder.bind_input("salt", SI_SALT, 1);
    let graph = builder.build()?;
    debug!(
        templates = graph.template_count(),
        signals = graph.total_signals(),
        constants = graph.constant_pool().len(),
        "compiled state-init graph"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use p3_baby_bear::BabyBear;
    use p3_field::PrimeCharacteristicRing;
    use witness_circuit::ops::{reference_sponge, round_constants, MIMC_ROUNDS};
    use witness_circuit::runner::InputAssignment;

    use super::*;

    type F = BabyBear;

    #[test]
    fn test_cells_digest_matches_reference() {
        let mut builder = GraphBuilder::<F>::new();
        let template = builder.cells_digest();
        builder.set_main(template);
        builder.bind_input("cells", CD_CELLS, N);
        builder.bind_input("salt", CD_SALT, 1);
        let graph = builder.build().unwrap();

        let cells: Vec<F> = (1..=N as u64).map(F::from_u64).collect();
        let salt = F::from_u64(99);
        let mut inputs = InputAssignment::new();
        inputs.set("cells", cells.clone());
        inputs.set_one("salt", salt);
        let witness = graph.runner().run(&inputs).unwrap();

        let constants = round_constants::<F>(MIMC_ROUNDS);
        let expected = reference_sponge(&cells, salt, &constants);
        assert_eq!(*witness.get(0).unwrap(), expected);
    }

    #[test]
    fn test_board_digest_matches_nested_reference() {
        let mut builder = GraphBuilder::<F>::new();
        let template = builder.board_digest();
        builder.set_main(template);
        builder.bind_input("hits", BD_HITS, N);
        builder.bind_input("cells", BD_CELLS, N);
        builder.bind_input("salt", BD_SALT, 1);
        let graph = builder.build().unwrap();

        let hits = vec![F::ZERO; N];
        let cells: Vec<F> = (1..=N as u64).map(F::from_u64).collect();
        let salt = F::from_u64(7);
        let mut inputs = InputAssignment::new();
        inputs.set("hits", hits.clone());
        inputs.set("cells", cells.clone());
        inputs.set_one("salt", salt);
        let witness = graph.runner().run(&inputs).unwrap();

        let constants = round_constants::<F>(MIMC_ROUNDS);
        let pair_digests: Vec<F> = hits
            .iter()
            .zip(&cells)
            .map(|(&hit, &cell)| reference_sponge(&[hit, cell], salt, &constants))
            .collect();
        let expected = reference_sponge(&pair_digests, salt, &constants);
        assert_eq!(*witness.get(0).unwrap(), expected);
    }

    #[test]
    fn test_state_graph_layout() {
        let graph = build_state_graph::<F>().unwrap();
        // One template per distinct parameterization: nine generic gadgets,
        // cell indexing, four ship lengths, seven distinct pair shapes, the
        // Feistel plus two sponge widths, and five fleet/state templates.
        assert_eq!(graph.template_count(), 29);
        // Every sponge instantiation reuses the same Feistel template and
        // the same 220-entry schedule in the constant pool.
        assert!(graph.constant_pool().len() < 2 * MIMC_ROUNDS);
        // 87 root signals, 2173 for the placed fleet, 34 for flattening,
        // two 15050 cell digests and the 45191 board digest.
        assert_eq!(graph.total_signals(), 77_585);
    }
}
