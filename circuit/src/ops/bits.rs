//! Binarity and bit-decomposition gadgets.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;

use crate::field::WitnessField;
use crate::graph::{ComponentTemplate, GraphBuilder};
use crate::types::TemplateId;

/// Bit-level gadget templates for [`GraphBuilder`].
pub trait BitGadgets<F> {
    /// Template asserting its single input is 0 or 1. No outputs.
    fn assert_bit(&mut self) -> TemplateId;

    /// Template decomposing its input into `bits` boolean-constrained bits
    /// (least significant first) and asserting the weighted resummation
    /// reproduces the input exactly. Any value of `bits` bits round-trips;
    /// any larger value fails the resummation assertion.
    ///
    /// Layout: outputs `bit[0..bits]`, input at `bits`.
    fn bit_decompose(&mut self, bits: usize) -> TemplateId;
}

impl<F: WitnessField> BitGadgets<F> for GraphBuilder<F> {
    fn assert_bit(&mut self) -> TemplateId {
        self.gadget("AssertBit", &[], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("AssertBit"),
                signal_count: 1,
                output_count: 0,
                input_count: 1,
                subcomponents: vec![],
                body: Arc::new(|scope| {
                    let value = scope.get(0)?;
                    scope.ensure_eq(value * (value - F::ONE), F::ZERO, "value is binary")
                }),
            })
        })
    }

    fn bit_decompose(&mut self, bits: usize) -> TemplateId {
        assert!(bits > 0 && bits < 64, "bit width out of range");
        assert!(
            (1u64 << bits) < F::ORDER_U64,
            "decomposition width exceeds the field"
        );
        self.gadget("BitDecompose", &[bits as u64], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("BitDecompose"),
                signal_count: bits + 1,
                output_count: bits,
                input_count: 1,
                subcomponents: vec![],
                body: Arc::new(move |scope| {
                    let value = scope.get(bits)?;
                    let mut acc = F::ZERO;
                    let mut weight = F::ONE;
                    for i in 0..bits {
                        let bit = value.shr(i as u32).band(F::ONE);
                        scope.set(i, bit)?;
                        scope.ensure_eq(bit * (bit - F::ONE), F::ZERO, "bit is binary")?;
                        acc += bit * weight;
                        weight = weight.double();
                    }
                    scope.ensure_eq(acc, value, "bit resummation matches input")
                }),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use p3_baby_bear::BabyBear;
    use p3_field::{PrimeCharacteristicRing, PrimeField64};

    use super::*;
    use crate::error::CircuitError;
    use crate::graph::CircuitGraph;
    use crate::runner::InputAssignment;

    type F = BabyBear;

    fn decompose_graph(bits: usize) -> CircuitGraph<F> {
        let mut builder = GraphBuilder::new();
        let template = builder.bit_decompose(bits);
        builder.set_main(template);
        builder.bind_input("value", bits, 1);
        builder.build().unwrap()
    }

    fn decompose(bits: usize, value: u64) -> Result<Vec<F>, CircuitError> {
        let mut inputs = InputAssignment::new();
        inputs.set_one("value", F::from_u64(value));
        let witness = decompose_graph(bits).runner().run(&inputs)?;
        Ok(witness.values()[..bits].to_vec())
    }

    #[test]
    fn test_round_trip_all_four_bit_values() {
        for value in 0..16u64 {
            let bits = decompose(4, value).unwrap();
            let resummed: u64 = bits
                .iter()
                .enumerate()
                .map(|(i, bit)| bit.as_canonical_u64() << i)
                .sum();
            assert_eq!(resummed, value);
        }
    }

    #[test]
    fn test_known_pattern() {
        let bits = decompose(4, 0b1011).unwrap();
        assert_eq!(bits, vec![F::ONE, F::ONE, F::ZERO, F::ONE]);
    }

    #[test]
    fn test_out_of_range_value_rejected() {
        for value in [8u64, 9, 200] {
            let err = decompose(3, value).unwrap_err();
            match err {
                CircuitError::ConstraintViolation { tag, .. } => {
                    assert_eq!(tag, "bit resummation matches input");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_assert_bit() {
        for (value, ok) in [(0u64, true), (1, true), (2, false)] {
            let mut builder = GraphBuilder::<F>::new();
            let template = builder.assert_bit();
            builder.set_main(template);
            builder.bind_input("value", 0, 1);
            let graph = builder.build().unwrap();

            let mut inputs = InputAssignment::new();
            inputs.set_one("value", F::from_u64(value));
            assert_eq!(graph.runner().run(&inputs).is_ok(), ok);
        }
    }
}
