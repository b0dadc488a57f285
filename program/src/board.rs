//! Board geometry templates: cell indexing, ship placement, non-overlap.

use std::sync::Arc;

use itertools::Itertools;
use witness_circuit::graph::{ComponentTemplate, GraphBuilder, SubcomponentSpec};
use witness_circuit::ops::{BitGadgets, CmpGadgets};
use witness_circuit::types::TemplateId;
use witness_circuit::WitnessField;

use crate::{BOARD_SIDE, COORD_BITS, FLEET_CELLS, SHIP_LENGTHS};

/// Local signal offset of each ship's first cell in the flattened fleet.
pub(crate) fn ship_cell_offsets() -> [usize; 5] {
    let mut offsets = [0; 5];
    let mut cursor = 0;
    for (i, len) in SHIP_LENGTHS.iter().enumerate() {
        offsets[i] = cursor;
        cursor += len;
    }
    offsets
}

/// Board-geometry templates for [`GraphBuilder`].
pub trait BoardGadgets<F> {
    /// Maps a validated coordinate pair to its linear cell index.
    ///
    /// Both coordinates must lie in `[1, BOARD_SIDE]`; each validation
    /// result is asserted to be 1, so exactly one mapping path exists.
    /// `pos = x + BOARD_SIDE * (y - 1)`.
    ///
    /// Layout: `pos(0), x(1), y(2), x_ok(3), y_ok(4)`.
    fn cell_index(&mut self) -> TemplateId;

    /// Places one ship of `len` cells from its anchor coordinate.
    ///
    /// A heading of 1 extends along x, 0 along y; the heading is asserted
    /// binary and every cell goes through [`BoardGadgets::cell_index`].
    ///
    /// Layout: `cells[0..len], x(len), y(len+1), heading(len+2)` plus three
    /// mirrored intermediates.
    fn ship_placement(&mut self, len: usize) -> TemplateId;

    /// Asserts two cell sets are disjoint by pairwise equality-testing
    /// every element of one against every element of the other.
    ///
    /// Layout: inputs `a[0..n], b[n..n+m]`; no outputs.
    fn disjoint_cells(&mut self, n: usize, m: usize) -> TemplateId;

    /// Places the whole fleet and asserts all pairwise non-overlaps.
    ///
    /// Layout: `cells[0..17]`, then per-ship `(x, y, heading)` inputs.
    fn fleet_placement(&mut self) -> TemplateId;

    /// Concatenates the per-ship cell arrays into one flat array.
    ///
    /// Layout: `out[0..17], in[17..34]`.
    fn concat_cells(&mut self) -> TemplateId;
}

impl<F: WitnessField> BoardGadgets<F> for GraphBuilder<F> {
    fn cell_index(&mut self) -> TemplateId {
        let interval = self.interval_check(COORD_BITS);
        self.gadget("CellIndex", &[BOARD_SIDE], |b| {
            let side = b.constant(F::from_u64(BOARD_SIDE));
            b.add_template(ComponentTemplate {
                name: String::from("CellIndex"),
                signal_count: 5,
                output_count: 1,
                input_count: 2,
                subcomponents: vec![
                    SubcomponentSpec::single("x_range", interval),
                    SubcomponentSpec::single("y_range", interval),
                ],
                body: Arc::new(move |scope| {
                    let x = scope.get(1)?;
                    let y = scope.get(2)?;
                    let hi = scope.constant(side);

                    scope.feed_child(0, 1, x)?;
                    scope.feed_child(0, 2, F::ONE)?;
                    scope.feed_child(0, 3, hi)?;
                    let x_ok = scope.child_output(0, 0)?;
                    scope.set(3, x_ok)?;
                    scope.ensure_eq(x_ok, F::ONE, "x coordinate on the board")?;

                    scope.feed_child(1, 1, y)?;
                    scope.feed_child(1, 2, F::ONE)?;
                    scope.feed_child(1, 3, hi)?;
                    let y_ok = scope.child_output(1, 0)?;
                    scope.set(4, y_ok)?;
                    scope.ensure_eq(y_ok, F::ONE, "y coordinate on the board")?;

                    scope.set(0, x + hi * (y - F::ONE))
                }),
            })
        })
    }

    fn ship_placement(&mut self, len: usize) -> TemplateId {
        assert!(len > 0, "ship must occupy at least one cell");
        let bit = self.assert_bit();
        let cell = self.cell_index();
        self.gadget("ShipPlacement", &[len as u64], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("ShipPlacement"),
                signal_count: len + 6,
                output_count: len,
                input_count: 3,
                subcomponents: vec![
                    SubcomponentSpec::single("heading_bit", bit),
                    SubcomponentSpec::new("cell", cell, len),
                ],
                body: Arc::new(move |scope| {
                    let x = scope.get(len)?;
                    let y = scope.get(len + 1)?;
                    let heading = scope.get(len + 2)?;
                    scope.set(len + 3, x)?;
                    scope.set(len + 4, y)?;
                    scope.set(len + 5, heading)?;

                    scope.feed_child(0, 0, heading)?;

                    for i in 0..len {
                        let step = F::from_u64(i as u64);
                        let cx = x + heading * step;
                        let cy = y + (F::ONE - heading) * step;
                        scope.feed_child(1 + i, 1, cx)?;
                        scope.feed_child(1 + i, 2, cy)?;
                        let pos = scope.child_output(1 + i, 0)?;
                        scope.set(i, pos)?;
                    }
                    Ok(())
                }),
            })
        })
    }

    fn disjoint_cells(&mut self, n: usize, m: usize) -> TemplateId {
        let is_equal = self.is_equal();
        self.gadget("DisjointCells", &[n as u64, m as u64], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("DisjointCells"),
                signal_count: n + m,
                output_count: 0,
                input_count: n + m,
                subcomponents: vec![SubcomponentSpec::new("eq", is_equal, n * m)],
                body: Arc::new(move |scope| {
                    for i in 0..n {
                        for j in 0..m {
                            let slot = i * m + j;
                            let a = scope.get(i)?;
                            let b = scope.get(n + j)?;
                            scope.feed_child(slot, 1, a)?;
                            scope.feed_child(slot, 2, b)?;
                            let equal = scope.child_output(slot, 0)?;
                            scope.ensure_eq(equal, F::ZERO, "segments share a cell")?;
                        }
                    }
                    Ok(())
                }),
            })
        })
    }

    fn fleet_placement(&mut self) -> TemplateId {
        let ships: Vec<TemplateId> = SHIP_LENGTHS
            .iter()
            .map(|&len| self.ship_placement(len))
            .collect();
        let pairs: Vec<(usize, usize)> = (0..SHIP_LENGTHS.len()).tuple_combinations().collect();
        let checks: Vec<TemplateId> = pairs
            .iter()
            .map(|&(i, j)| self.disjoint_cells(SHIP_LENGTHS[i], SHIP_LENGTHS[j]))
            .collect();

        self.gadget("FleetPlacement", &[], |b| {
            let mut subcomponents = Vec::new();
            for (s, &ship) in ships.iter().enumerate() {
                subcomponents.push(SubcomponentSpec::single(format!("ship{s}"), ship));
            }
            for (&(i, j), &check) in pairs.iter().zip(&checks) {
                subcomponents.push(SubcomponentSpec::single(format!("apart{i}{j}"), check));
            }

            let offsets = ship_cell_offsets();
            let ship_count = SHIP_LENGTHS.len();
            let pairs = pairs.clone();
            b.add_template(ComponentTemplate {
                name: String::from("FleetPlacement"),
                signal_count: FLEET_CELLS + 3 * ship_count,
                output_count: FLEET_CELLS,
                input_count: 3 * ship_count,
                subcomponents,
                body: Arc::new(move |scope| {
                    for s in 0..ship_count {
                        let len = SHIP_LENGTHS[s];
                        let x = scope.get(FLEET_CELLS + 3 * s)?;
                        let y = scope.get(FLEET_CELLS + 3 * s + 1)?;
                        let heading = scope.get(FLEET_CELLS + 3 * s + 2)?;
                        scope.feed_child(s, len, x)?;
                        scope.feed_child(s, len + 1, y)?;
                        scope.feed_child(s, len + 2, heading)?;
                        for i in 0..len {
                            let pos = scope.child_output(s, i)?;
                            scope.set(offsets[s] + i, pos)?;
                        }
                    }
                    for (pair, &(i, j)) in pairs.iter().enumerate() {
                        let slot = ship_count + pair;
                        let (len_i, len_j) = (SHIP_LENGTHS[i], SHIP_LENGTHS[j]);
                        for t in 0..len_i {
                            let pos = scope.get(offsets[i] + t)?;
                            scope.feed_child(slot, t, pos)?;
                        }
                        for t in 0..len_j {
                            let pos = scope.get(offsets[j] + t)?;
                            scope.feed_child(slot, len_i + t, pos)?;
                        }
                    }
                    Ok(())
                }),
            })
        })
    }

    fn concat_cells(&mut self) -> TemplateId {
        self.gadget("ConcatCells", &[], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("ConcatCells"),
                signal_count: 2 * FLEET_CELLS,
                output_count: FLEET_CELLS,
                input_count: FLEET_CELLS,
                subcomponents: vec![],
                body: Arc::new(|scope| {
                    for i in 0..FLEET_CELLS {
                        let value = scope.get(FLEET_CELLS + i)?;
                        scope.set(i, value)?;
                    }
                    Ok(())
                }),
            })
        })
    }
}
