use p3_field::PrimeField64;

use crate::error::CircuitError;

/// Trait encapsulating the field operations required by the evaluator.
///
/// Everything beyond plain ring arithmetic operates on the canonical integer
/// representative in `[0, p)`: ordered comparisons, bitwise operations and
/// the narrowing conversion used for indices and loop bounds. Results of
/// bitwise operations are reduced back into the field. All operations are
/// exact; identical inputs always yield identical outputs.
pub trait WitnessField: PrimeField64 {
    /// Multiplicative division, failing on a zero divisor.
    fn try_div(self, rhs: Self) -> Result<Self, CircuitError> {
        let inv = rhs.try_inverse().ok_or(CircuitError::DivisionByZero)?;
        Ok(self * inv)
    }

    /// Ordered comparison on canonical representatives: `self < rhs` as a
    /// {0,1}-valued element.
    fn lt(self, rhs: Self) -> Self {
        Self::from_bool(self.as_canonical_u64() < rhs.as_canonical_u64())
    }

    /// `self <= rhs` on canonical representatives.
    fn le(self, rhs: Self) -> Self {
        Self::from_bool(self.as_canonical_u64() <= rhs.as_canonical_u64())
    }

    /// `self >= rhs` on canonical representatives.
    fn ge(self, rhs: Self) -> Self {
        Self::from_bool(self.as_canonical_u64() >= rhs.as_canonical_u64())
    }

    /// Logical right shift of the canonical representative.
    fn shr(self, bits: u32) -> Self {
        if bits >= 64 {
            return Self::ZERO;
        }
        Self::from_u64(self.as_canonical_u64() >> bits)
    }

    /// Bitwise AND of canonical representatives.
    fn band(self, rhs: Self) -> Self {
        Self::from_u64(self.as_canonical_u64() & rhs.as_canonical_u64())
    }

    /// Bitwise OR of canonical representatives, reduced mod p.
    fn bor(self, rhs: Self) -> Self {
        Self::from_u64(self.as_canonical_u64() | rhs.as_canonical_u64())
    }

    /// Boolean AND on {0,1}-valued elements.
    fn bool_and(self, rhs: Self) -> Self {
        self * rhs
    }

    /// Boolean OR on {0,1}-valued elements.
    fn bool_or(self, rhs: Self) -> Self {
        self + rhs - self * rhs
    }

    /// Narrowing conversion to a host index, failing if the canonical
    /// representative does not fit.
    fn as_index(self) -> Result<usize, CircuitError> {
        let value = self.as_canonical_u64();
        usize::try_from(value).map_err(|_| CircuitError::IndexOverflow { value })
    }
}

impl<F: PrimeField64> WitnessField for F {}

#[cfg(test)]
mod tests {
    use p3_baby_bear::BabyBear;
    use p3_field::PrimeCharacteristicRing;

    use super::*;

    type F = BabyBear;

    #[test]
    fn test_try_div() {
        let a = F::from_u64(21);
        let b = F::from_u64(7);
        assert_eq!(a.try_div(b).unwrap(), F::from_u64(3));
        assert_eq!(a.try_div(F::ZERO), Err(CircuitError::DivisionByZero));
    }

    #[test]
    fn test_div_roundtrip() {
        let a = F::from_u64(123_456);
        let b = F::from_u64(789);
        let q = a.try_div(b).unwrap();
        assert_eq!(q * b, a);
    }

    #[test]
    fn test_comparisons_use_canonical_representative() {
        let two = F::from_u64(2);
        let three = F::from_u64(3);
        assert_eq!(two.lt(three), F::ONE);
        assert_eq!(three.lt(two), F::ZERO);
        assert_eq!(two.lt(two), F::ZERO);
        assert_eq!(two.le(two), F::ONE);
        assert_eq!(three.ge(two), F::ONE);
        assert_eq!(two.ge(three), F::ZERO);

        // -1 is p - 1, the largest representative.
        let minus_one = F::ZERO - F::ONE;
        assert_eq!(two.lt(minus_one), F::ONE);
        assert_eq!(minus_one.ge(two), F::ONE);
    }

    #[test]
    fn test_bitwise_ops() {
        let a = F::from_u64(0b1100);
        let b = F::from_u64(0b1010);
        assert_eq!(a.band(b), F::from_u64(0b1000));
        assert_eq!(a.bor(b), F::from_u64(0b1110));
        assert_eq!(a.shr(2), F::from_u64(0b11));
        assert_eq!(a.shr(64), F::ZERO);
    }

    #[test]
    fn test_bool_ops() {
        assert_eq!(F::ONE.bool_and(F::ONE), F::ONE);
        assert_eq!(F::ONE.bool_and(F::ZERO), F::ZERO);
        assert_eq!(F::ZERO.bool_or(F::ONE), F::ONE);
        assert_eq!(F::ZERO.bool_or(F::ZERO), F::ZERO);
        assert_eq!(F::ONE.bool_or(F::ONE), F::ONE);
    }

    #[test]
    fn test_as_index() {
        assert_eq!(F::from_u64(25).as_index().unwrap(), 25);
    }
}
