//! Comparator and equality gadgets.
//!
//! The comparators share one pattern: compute a shifted difference, hand it
//! to a bit decomposition, and read a designated high bit off as the boolean
//! result. `GreaterEqThan` and `LessEqThan` are both expressed through
//! `LessThan` with rewired operands.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;

use crate::field::WitnessField;
use crate::graph::{ComponentTemplate, GraphBuilder, SubcomponentSpec};
use crate::ops::bits::BitGadgets;
use crate::types::TemplateId;

/// Comparator gadget templates for [`GraphBuilder`].
///
/// All comparator templates share the layout `out(0), a(1), b(2)` and
/// require both operands to fit in `bits` bits.
pub trait CmpGadgets<F> {
    /// `out = 1` iff the input is zero, via the inverse-witness trick.
    /// Layout: `out(0), in(1), inv(2)`.
    fn is_zero(&mut self) -> TemplateId;

    /// `out = 1` iff the two inputs are equal.
    fn is_equal(&mut self) -> TemplateId;

    /// Boolean conjunction of two {0,1} inputs.
    fn bool_and(&mut self) -> TemplateId;

    /// `out = 1` iff `a < b` on canonical representatives.
    fn less_than(&mut self, bits: usize) -> TemplateId;

    /// `out = 1` iff `a <= b`.
    fn less_eq_than(&mut self, bits: usize) -> TemplateId;

    /// `out = 1` iff `a >= b`.
    fn greater_eq_than(&mut self, bits: usize) -> TemplateId;

    /// `out = 1` iff `lo <= x <= hi`, as the conjunction of the two
    /// comparator results; both conjuncts are additionally guarded by
    /// binarity assertions. Layout: `out(0), x(1), lo(2), hi(3)`.
    fn interval_check(&mut self, bits: usize) -> TemplateId;
}

impl<F: WitnessField> CmpGadgets<F> for GraphBuilder<F> {
    fn is_zero(&mut self) -> TemplateId {
        self.gadget("IsZero", &[], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("IsZero"),
                signal_count: 3,
                output_count: 1,
                input_count: 1,
                subcomponents: vec![],
                body: Arc::new(|scope| {
                    let value = scope.get(1)?;
                    let inv = if value == F::ZERO {
                        F::ZERO
                    } else {
                        F::ONE.try_div(value)?
                    };
                    scope.set(2, inv)?;
                    let out = F::ONE - value * inv;
                    scope.set(0, out)?;
                    scope.ensure_eq(value * out, F::ZERO, "inverse witness consistent")
                }),
            })
        })
    }

    fn is_equal(&mut self) -> TemplateId {
        let is_zero = self.is_zero();
        self.gadget("IsEqual", &[], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("IsEqual"),
                signal_count: 3,
                output_count: 1,
                input_count: 2,
                subcomponents: vec![SubcomponentSpec::single("isz", is_zero)],
                body: Arc::new(|scope| {
                    let a = scope.get(1)?;
                    let b = scope.get(2)?;
                    scope.feed_child(0, 1, b - a)?;
                    let out = scope.child_output(0, 0)?;
                    scope.set(0, out)
                }),
            })
        })
    }

    fn bool_and(&mut self) -> TemplateId {
        self.gadget("BoolAnd", &[], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("BoolAnd"),
                signal_count: 3,
                output_count: 1,
                input_count: 2,
                subcomponents: vec![],
                body: Arc::new(|scope| {
                    let a = scope.get(1)?;
                    let b = scope.get(2)?;
                    scope.set(0, a.bool_and(b))
                }),
            })
        })
    }

    fn less_than(&mut self, bits: usize) -> TemplateId {
        self.gadget("LessThan", &[bits as u64], |b| {
            let decompose = b.bit_decompose(bits + 1);
            let shift = b.constant(F::from_u64(1u64 << bits));
            b.add_template(ComponentTemplate {
                name: String::from("LessThan"),
                signal_count: 3,
                output_count: 1,
                input_count: 2,
                subcomponents: vec![SubcomponentSpec::single("bits", decompose)],
                body: Arc::new(move |scope| {
                    let a = scope.get(1)?;
                    let b = scope.get(2)?;
                    let shifted = a + scope.constant(shift) - b;
                    scope.feed_child(0, bits + 1, shifted)?;
                    // The borrow bit: clear exactly when a < b.
                    let top = scope.child_output(0, bits)?;
                    scope.set(0, F::ONE - top)
                }),
            })
        })
    }

    fn less_eq_than(&mut self, bits: usize) -> TemplateId {
        let less_than = self.less_than(bits);
        self.gadget("LessEqThan", &[bits as u64], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("LessEqThan"),
                signal_count: 3,
                output_count: 1,
                input_count: 2,
                subcomponents: vec![SubcomponentSpec::single("lt", less_than)],
                body: Arc::new(|scope| {
                    // a <= b  <=>  a < b + 1
                    let a = scope.get(1)?;
                    let b = scope.get(2)?;
                    scope.feed_child(0, 1, a)?;
                    scope.feed_child(0, 2, b + F::ONE)?;
                    let out = scope.child_output(0, 0)?;
                    scope.set(0, out)
                }),
            })
        })
    }

    fn greater_eq_than(&mut self, bits: usize) -> TemplateId {
        let less_than = self.less_than(bits);
        self.gadget("GreaterEqThan", &[bits as u64], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("GreaterEqThan"),
                signal_count: 3,
                output_count: 1,
                input_count: 2,
                subcomponents: vec![SubcomponentSpec::single("lt", less_than)],
                body: Arc::new(|scope| {
                    // a >= b  <=>  b < a + 1
                    let a = scope.get(1)?;
                    let b = scope.get(2)?;
                    scope.feed_child(0, 1, b)?;
                    scope.feed_child(0, 2, a + F::ONE)?;
                    let out = scope.child_output(0, 0)?;
                    scope.set(0, out)
                }),
            })
        })
    }

    fn interval_check(&mut self, bits: usize) -> TemplateId {
        let ge = self.greater_eq_than(bits);
        let le = self.less_eq_than(bits);
        let bit = self.assert_bit();
        let and = self.bool_and();
        self.gadget("IntervalCheck", &[bits as u64], |b| {
            b.add_template(ComponentTemplate {
                name: String::from("IntervalCheck"),
                signal_count: 6,
                output_count: 1,
                input_count: 3,
                subcomponents: vec![
                    SubcomponentSpec::single("ge", ge),
                    SubcomponentSpec::single("le", le),
                    SubcomponentSpec::new("bin", bit, 2),
                    SubcomponentSpec::single("and", and),
                ],
                body: Arc::new(|scope| {
                    let x = scope.get(1)?;
                    let lo = scope.get(2)?;
                    let hi = scope.get(3)?;

                    scope.feed_child(0, 1, x)?;
                    scope.feed_child(0, 2, lo)?;
                    let above = scope.child_output(0, 0)?;
                    scope.set(4, above)?;

                    scope.feed_child(1, 1, x)?;
                    scope.feed_child(1, 2, hi)?;
                    let below = scope.child_output(1, 0)?;
                    scope.set(5, below)?;

                    scope.feed_child(2, 0, above)?;
                    scope.feed_child(3, 0, below)?;

                    scope.feed_child(4, 1, above)?;
                    scope.feed_child(4, 2, below)?;
                    let out = scope.child_output(4, 0)?;
                    scope.set(0, out)
                }),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use p3_baby_bear::BabyBear;
    use p3_field::PrimeCharacteristicRing;

    use super::*;
    use crate::runner::InputAssignment;

    type F = BabyBear;

    fn run_binary_gadget(
        build: impl Fn(&mut GraphBuilder<F>) -> TemplateId,
        a: u64,
        b: u64,
    ) -> F {
        let mut builder = GraphBuilder::new();
        let template = build(&mut builder);
        builder.set_main(template);
        builder.bind_input("a", 1, 1);
        builder.bind_input("b", 2, 1);
        let graph = builder.build().unwrap();

        let mut inputs = InputAssignment::new();
        inputs.set_one("a", F::from_u64(a));
        inputs.set_one("b", F::from_u64(b));
        *graph.runner().run(&inputs).unwrap().get(0).unwrap()
    }

    const BITS: usize = 3;

    #[test]
    fn test_less_than_exhaustive() {
        for a in 0..8u64 {
            for b in 0..8u64 {
                let out = run_binary_gadget(|builder| builder.less_than(BITS), a, b);
                assert_eq!(out, F::from_bool(a < b), "{a} < {b}");
            }
        }
    }

    #[test]
    fn test_less_eq_than_exhaustive() {
        for a in 0..8u64 {
            for b in 0..8u64 {
                let out = run_binary_gadget(|builder| builder.less_eq_than(BITS), a, b);
                assert_eq!(out, F::from_bool(a <= b), "{a} <= {b}");
            }
        }
    }

    #[test]
    fn test_greater_eq_than_exhaustive() {
        for a in 0..8u64 {
            for b in 0..8u64 {
                let out = run_binary_gadget(|builder| builder.greater_eq_than(BITS), a, b);
                assert_eq!(out, F::from_bool(a >= b), "{a} >= {b}");
            }
        }
    }

    #[test]
    fn test_is_equal() {
        for (a, b) in [(0u64, 0u64), (0, 1), (5, 5), (5, 6), (7, 0)] {
            let out = run_binary_gadget(|builder| builder.is_equal(), a, b);
            assert_eq!(out, F::from_bool(a == b), "{a} == {b}");
        }
    }

    #[test]
    fn test_bool_and() {
        for (a, b) in [(0u64, 0u64), (0, 1), (1, 0), (1, 1)] {
            let out = run_binary_gadget(|builder| builder.bool_and(), a, b);
            assert_eq!(out, F::from_bool(a == 1 && b == 1));
        }
    }

    #[test]
    fn test_is_zero() {
        for value in [0u64, 1, 2, 100] {
            let mut builder = GraphBuilder::<F>::new();
            let template = builder.is_zero();
            builder.set_main(template);
            builder.bind_input("x", 1, 1);
            let graph = builder.build().unwrap();

            let mut inputs = InputAssignment::new();
            inputs.set_one("x", F::from_u64(value));
            let witness = graph.runner().run(&inputs).unwrap();
            assert_eq!(*witness.get(0).unwrap(), F::from_bool(value == 0));
        }
    }

    #[test]
    fn test_interval_membership_at_boundaries() {
        let (lo, hi) = (2u64, 5u64);
        for x in 0..8u64 {
            let mut builder = GraphBuilder::<F>::new();
            let template = builder.interval_check(BITS);
            builder.set_main(template);
            builder.bind_input("x", 1, 1);
            builder.bind_input("lo", 2, 1);
            builder.bind_input("hi", 3, 1);
            let graph = builder.build().unwrap();

            let mut inputs = InputAssignment::new();
            inputs.set_one("x", F::from_u64(x));
            inputs.set_one("lo", F::from_u64(lo));
            inputs.set_one("hi", F::from_u64(hi));
            let witness = graph.runner().run(&inputs).unwrap();
            assert_eq!(
                *witness.get(0).unwrap(),
                F::from_bool(lo <= x && x <= hi),
                "{lo} <= {x} <= {hi}"
            );
        }
    }
}
