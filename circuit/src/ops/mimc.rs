//! MiMC permutation and sponge gadgets.
//!
//! The permutation is a Feistel network with an add-then-exponentiate round
//! function: `t = k + xL + c_i`, nonlinearity `t^5` recorded through the
//! `t^2`/`t^4` intermediate signals. The sponge absorbs a fixed-size input
//! sequence one permutation per element (rate `xL`, capacity `xR`) and
//! squeezes a single digest.
//!
//! The round-constant schedule is fixed for the lifetime of a graph: the
//! constants are drawn once from a seeded generator at graph-build time and
//! live in the shared constant pool. The first and last round constants are
//! zero.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::field::WitnessField;
use crate::graph::{ComponentTemplate, GraphBuilder, SubcomponentSpec};
use crate::types::TemplateId;

/// Number of Feistel rounds per permutation call.
pub const MIMC_ROUNDS: usize = 220;

const MIMC_SEED: u64 = 0x6d69_6d63_5f66_6e32;

// Feistel signal layout: outputs, inputs, then the per-round intermediates.
const XL_OUT: usize = 0;
const XR_OUT: usize = 1;
const XL_IN: usize = 2;
const XR_IN: usize = 3;
const KEY: usize = 4;
const T2_BASE: usize = 5;
const T4_BASE: usize = T2_BASE + MIMC_ROUNDS;
const XL_BASE: usize = T4_BASE + MIMC_ROUNDS;
const XR_BASE: usize = XL_BASE + (MIMC_ROUNDS - 1);
const FEISTEL_SIGNALS: usize = XR_BASE + (MIMC_ROUNDS - 1);

/// The fixed round-constant schedule, `rounds` elements with the first and
/// last forced to zero.
pub fn round_constants<F: WitnessField>(rounds: usize) -> Vec<F> {
    let mut rng = SmallRng::seed_from_u64(MIMC_SEED);
    let mut constants: Vec<F> = (0..rounds).map(|_| F::from_u64(rng.random())).collect();
    if let Some(first) = constants.first_mut() {
        *first = F::ZERO;
    }
    if let Some(last) = constants.last_mut() {
        *last = F::ZERO;
    }
    constants
}

/// Straight-line Feistel permutation, the non-circuit counterpart of the
/// `MimcFeistel` template.
pub fn reference_feistel<F: WitnessField>(xl: F, xr: F, key: F, constants: &[F]) -> (F, F) {
    let mut xl = xl;
    let mut xr = xr;
    for (round, &c) in constants.iter().enumerate() {
        let t = key + xl + c;
        let t2 = t * t;
        let t5 = t2 * t2 * t;
        if round < constants.len() - 1 {
            let next_xl = xr + t5;
            xr = xl;
            xl = next_xl;
        } else {
            xr += t5;
        }
    }
    (xl, xr)
}

/// Straight-line sponge, the non-circuit counterpart of the `MimcSponge`
/// template: absorbs `inputs` under `key` and squeezes one digest.
pub fn reference_sponge<F: WitnessField>(inputs: &[F], key: F, constants: &[F]) -> F {
    debug_assert!(!inputs.is_empty());
    let mut state = (F::ZERO, F::ZERO);
    for (i, &input) in inputs.iter().enumerate() {
        let (xl_in, xr_in) = if i == 0 {
            (input, F::ZERO)
        } else {
            (state.0 + input, state.1)
        };
        state = reference_feistel(xl_in, xr_in, key, constants);
    }
    state.0
}

/// MiMC gadget templates for [`GraphBuilder`].
pub trait MimcGadgets<F> {
    /// The Feistel permutation template.
    ///
    /// Layout: `xl_out(0), xr_out(1), xl_in(2), xr_in(3), key(4)` followed by
    /// the per-round `t^2`, `t^4`, `xl`, `xr` intermediates.
    fn mimc_feistel(&mut self) -> TemplateId;

    /// Keyed sponge over `inputs` field elements, squeezing one digest.
    ///
    /// Layout: `out(0), in[0..inputs] (1..), key(inputs + 1)`.
    fn mimc_sponge(&mut self, inputs: usize) -> TemplateId;
}

impl<F: WitnessField> MimcGadgets<F> for GraphBuilder<F> {
    fn mimc_feistel(&mut self) -> TemplateId {
        self.gadget("MimcFeistel", &[], |b| {
            let constants: Vec<_> = round_constants::<F>(MIMC_ROUNDS)
                .into_iter()
                .map(|c| b.constant(c))
                .collect();
            b.add_template(ComponentTemplate {
                name: String::from("MimcFeistel"),
                signal_count: FEISTEL_SIGNALS,
                output_count: 2,
                input_count: 3,
                subcomponents: vec![],
                body: Arc::new(move |scope| {
                    let key = scope.get(KEY)?;
                    let mut xl = scope.get(XL_IN)?;
                    let mut xr = scope.get(XR_IN)?;
                    for round in 0..MIMC_ROUNDS {
                        let c = scope.constant(constants[round]);
                        let t = key + xl + c;
                        let t2 = t * t;
                        let t4 = t2 * t2;
                        scope.set(T2_BASE + round, t2)?;
                        scope.set(T4_BASE + round, t4)?;
                        let t5 = t4 * t;
                        if round < MIMC_ROUNDS - 1 {
                            let next_xl = xr + t5;
                            scope.set(XL_BASE + round, next_xl)?;
                            scope.set(XR_BASE + round, xl)?;
                            xr = xl;
                            xl = next_xl;
                        } else {
                            scope.set(XR_OUT, xr + t5)?;
                            scope.set(XL_OUT, xl)?;
                        }
                    }
                    Ok(())
                }),
            })
        })
    }

    fn mimc_sponge(&mut self, inputs: usize) -> TemplateId {
        assert!(inputs > 0, "sponge needs at least one input");
        let feistel = self.mimc_feistel();
        self.gadget("MimcSponge", &[inputs as u64], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("MimcSponge"),
                signal_count: inputs + 2,
                output_count: 1,
                input_count: inputs + 1,
                subcomponents: vec![SubcomponentSpec::new("round", feistel, inputs)],
                body: Arc::new(move |scope| {
                    let key = scope.get(inputs + 1)?;
                    for i in 0..inputs {
                        scope.feed_child(i, KEY, key)?;
                        let absorbed = scope.get(1 + i)?;
                        if i == 0 {
                            scope.feed_child(i, XL_IN, absorbed)?;
                            scope.feed_child(i, XR_IN, F::ZERO)?;
                        } else {
                            let prev_xl = scope.child_output(i - 1, XL_OUT)?;
                            let prev_xr = scope.child_output(i - 1, XR_OUT)?;
                            scope.feed_child(i, XL_IN, prev_xl + absorbed)?;
                            scope.feed_child(i, XR_IN, prev_xr)?;
                        }
                    }
                    let digest = scope.child_output(inputs - 1, XL_OUT)?;
                    scope.set(0, digest)
                }),
            })
        })
    }
}
