//! End-to-end evaluation of the state-commitment circuit.

use p3_baby_bear::BabyBear;
use p3_field::PrimeCharacteristicRing;
use witness_circuit::ops::{reference_sponge, round_constants, MIMC_ROUNDS};
use witness_circuit::runner::InputAssignment;
use witness_circuit::CircuitError;
use witness_circuit::graph::GraphBuilder;
use witness_program::board::BoardGadgets;
use witness_program::{
    build_state_graph, sample_fleet, ShipSpec, StateInputs, BOARD_DIGEST, BOARD_SIDE,
    CELLS_DIGEST, FLEET_DIGEST, SHIP_LENGTHS,
};

type F = BabyBear;

fn run_state(inputs: &StateInputs) -> Result<witness_circuit::Witness<F>, CircuitError> {
    build_state_graph::<F>()?.runner().run(&inputs.assignment())
}

#[test]
fn test_valid_fleet_completes_and_matches_reference_hash() {
    let inputs = StateInputs::from_ships(sample_fleet(), 42).unwrap();
    let witness = run_state(&inputs).unwrap();

    let constants = round_constants::<F>(MIMC_ROUNDS);
    let salt = F::from_u64(42);
    let cells: Vec<F> = inputs.cells.iter().map(|&c| F::from_u64(c)).collect();

    // The fleet commitment is the independently computed sponge over the
    // flattened occupancy vector.
    let expected_fleet = reference_sponge(&cells, salt, &constants);
    assert_eq!(*witness.get(FLEET_DIGEST).unwrap(), expected_fleet);

    // Claimed cells equal the derived ones here, so both commitments agree.
    assert_eq!(*witness.get(CELLS_DIGEST).unwrap(), expected_fleet);

    // The board commitment nests per-cell (hit, cell) digests.
    let pair_digests: Vec<F> = cells
        .iter()
        .map(|&cell| reference_sponge(&[F::ZERO, cell], salt, &constants))
        .collect();
    let expected_board = reference_sponge(&pair_digests, salt, &constants);
    assert_eq!(*witness.get(BOARD_DIGEST).unwrap(), expected_board);
}

#[test]
fn test_mixed_orientation_fleet_is_accepted() {
    let ships = [
        ShipSpec::new(1, 1, false), // cells 1, 6
        ShipSpec::new(2, 1, true),  // cells 2, 3, 4
        ShipSpec::new(5, 1, false), // cells 5, 10, 15
        ShipSpec::new(1, 3, true),  // cells 11, 12, 13, 14
        ShipSpec::new(1, 5, true),  // cells 21..25
    ];
    let inputs = StateInputs::from_ships(ships, 7).unwrap();
    assert!(run_state(&inputs).is_ok());
}

#[test]
fn test_witness_is_deterministic() {
    let inputs = StateInputs::from_ships(sample_fleet(), 42).unwrap();
    let first = run_state(&inputs).unwrap();
    let second = run_state(&inputs).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_salt_changes_every_commitment() {
    let a = run_state(&StateInputs::from_ships(sample_fleet(), 1).unwrap()).unwrap();
    let b = run_state(&StateInputs::from_ships(sample_fleet(), 2).unwrap()).unwrap();
    assert_ne!(a.get(FLEET_DIGEST), b.get(FLEET_DIGEST));
    assert_ne!(a.get(BOARD_DIGEST), b.get(BOARD_DIGEST));
    assert_ne!(a.get(CELLS_DIGEST), b.get(CELLS_DIGEST));
}

#[test]
fn test_overlapping_fleet_is_rejected_with_trace() {
    let mut ships = sample_fleet();
    // Move the second ship onto the first row.
    ships[1] = ShipSpec::new(2, 1, true);
    let inputs = StateInputs::from_ships(ships, 42).unwrap();

    match run_state(&inputs).unwrap_err() {
        CircuitError::ConstraintViolation { template, tag, path } => {
            assert_eq!(template, "DisjointCells");
            assert_eq!(tag, "segments share a cell");
            assert!(path.starts_with("main.fleet.apart01"), "path: {path}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_off_board_fleet_is_rejected() {
    let mut ships = sample_fleet();
    // Length-5 ship anchored at x=2 overhangs the right edge.
    ships[4] = ShipSpec::new(2, 5, true);
    let cells = witness_program::fleet_cells(&sample_fleet()).unwrap();
    let inputs = StateInputs {
        ships,
        cells,
        salt: 42,
    };

    match run_state(&inputs).unwrap_err() {
        CircuitError::ConstraintViolation { template, tag, path } => {
            assert_eq!(template, "CellIndex");
            assert_eq!(tag, "x coordinate on the board");
            assert!(path.starts_with("main.fleet.ship4"), "path: {path}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_claimed_cells_diverging_from_placement_changes_commitment() {
    // The circuit commits to claimed cells without constraining them to the
    // derived placement; the two digests simply stop matching.
    let mut inputs = StateInputs::from_ships(sample_fleet(), 42).unwrap();
    inputs.cells[0] = 3;
    let witness = run_state(&inputs).unwrap();
    assert_ne!(
        witness.get(FLEET_DIGEST).unwrap(),
        witness.get(CELLS_DIGEST).unwrap()
    );
}

/// Every placement of a 2-cell and a 3-cell segment on the board, checked
/// against the non-overlap constraint: all disjoint pairs accepted, all
/// colliding pairs rejected.
#[test]
fn test_non_overlap_exhaustive_for_two_segments() {
    let placements = |len: u64| -> Vec<Vec<u64>> {
        let mut all = Vec::new();
        for y in 1..=BOARD_SIDE {
            for x in 1..=BOARD_SIDE {
                for horizontal in [true, false] {
                    if let Some(cells) = ShipSpec::new(x, y, horizontal).cells(len as usize) {
                        all.push(cells);
                    }
                }
            }
        }
        all
    };

    let twos = placements(2);
    let threes = placements(3);
    assert_eq!(twos.len(), 2 * 4 * 5);
    assert_eq!(threes.len(), 2 * 3 * 5);

    for a in &twos {
        for b in &threes {
            let mut builder = GraphBuilder::<F>::new();
            let template = builder.disjoint_cells(2, 3);
            builder.set_main(template);
            builder.bind_input("a", 0, 2);
            builder.bind_input("b", 2, 3);
            let graph = builder.build().unwrap();

            let mut assignment = InputAssignment::new();
            assignment.set("a", a.iter().map(|&v| F::from_u64(v)).collect());
            assignment.set("b", b.iter().map(|&v| F::from_u64(v)).collect());

            let disjoint = a.iter().all(|cell| !b.contains(cell));
            let result = graph.runner().run(&assignment);
            assert_eq!(
                result.is_ok(),
                disjoint,
                "segments {a:?} vs {b:?} expected disjoint={disjoint}"
            );
        }
    }
}

#[test]
fn test_fleet_lengths_cover_seventeen_cells() {
    assert_eq!(SHIP_LENGTHS.iter().sum::<usize>(), 17);
}
