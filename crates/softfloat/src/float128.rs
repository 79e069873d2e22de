use crate::format::Format;
use crate::ops::convert;
use crate::{Float32, Float64, FloatStatus, FloatX80};

/// IEEE quadruple precision: 1 sign, 15 exponent, 112 fraction bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Float128 {
    /// Sign, exponent and the top 48 fraction bits.
    pub high: u64,
    /// Low 64 fraction bits.
    pub low: u64,
}

const FRAC_MASK: u128 = (1u128 << 112) - 1;

impl Format for Float128 {
    const PRECISION: u32 = 113;
    const BIAS: i32 = 0x3FFF;
    const EXP_MAX: i32 = 0x7FFF;
    const EXPLICIT_INT: bool = false;

    fn sign(self) -> bool {
        self.high >> 63 != 0
    }

    fn exp_field(self) -> i32 {
        ((self.high >> 48) & 0x7FFF) as i32
    }

    fn sig_field(self) -> u128 {
        ((u128::from(self.high) << 64) | u128::from(self.low)) & FRAC_MASK
    }

    fn assemble(sign: bool, exp: i32, sig: u128) -> Self {
        let bits = (u128::from(sign) << 127) | ((exp as u128 & 0x7FFF) << 112) | (sig & FRAC_MASK);
        Self {
            high: (bits >> 64) as u64,
            low: bits as u64,
        }
    }
}

float_common!(Float128);

impl Float128 {
    #[must_use]
    pub const fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    #[must_use]
    pub const fn to_bits(self) -> u128 {
        ((self.high as u128) << 64) | self.low as u128
    }

    #[must_use]
    pub const fn from_bits(bits: u128) -> Self {
        Self {
            high: (bits >> 64) as u64,
            low: bits as u64,
        }
    }

    pub fn to_float32(self, status: &mut FloatStatus) -> Float32 {
        convert::<Self, Float32>(self, status, Float32::PRECISION)
    }

    pub fn to_float64(self, status: &mut FloatStatus) -> Float64 {
        convert::<Self, Float64>(self, status, Float64::PRECISION)
    }

    pub fn to_floatx80(self, status: &mut FloatStatus) -> FloatX80 {
        convert::<Self, FloatX80>(self, status, FloatX80::PRECISION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::INEXACT;

    const ONE: Float128 = Float128::new(0x3FFF_0000_0000_0000, 0);
    const THREE: Float128 = Float128::new(0x4000_8000_0000_0000, 0);

    #[test]
    fn one_third_in_quad() {
        let mut st = FloatStatus::new();
        let third = ONE.div(THREE, &mut st);
        assert_eq!(third, Float128::new(0x3FFD_5555_5555_5555, 0x5555_5555_5555_5555));
        assert!(st.test(INEXACT));
    }

    #[test]
    fn sqrt_of_exact_square() {
        let mut st = FloatStatus::new();
        let nine = THREE.mul(THREE, &mut st);
        assert_eq!(nine.sqrt(&mut st), THREE);
        assert_eq!(st.flags, 0);
    }

    #[test]
    fn extended_values_widen_exactly() {
        let mut st = FloatStatus::new();
        let third = FloatX80::ONE.div(FloatX80::from_f64(3.0), &mut st);
        let wide = third.to_float128(&mut st);
        st.flags = 0;
        assert_eq!(wide.to_floatx80(&mut st), third);
        assert_eq!(st.flags, 0);
        assert_eq!(ONE.to_float64(&mut st).to_host(), 1.0);
    }
}
