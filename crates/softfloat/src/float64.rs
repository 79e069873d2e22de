use crate::format::Format;
use crate::ops::convert;
use crate::{Float32, Float128, FloatStatus, FloatX80};

/// IEEE double precision: 1 sign, 11 exponent, 52 fraction bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Float64(pub u64);

const FRAC_MASK: u64 = 0x000F_FFFF_FFFF_FFFF;

impl Format for Float64 {
    const PRECISION: u32 = 53;
    const BIAS: i32 = 0x3FF;
    const EXP_MAX: i32 = 0x7FF;
    const EXPLICIT_INT: bool = false;

    fn sign(self) -> bool {
        self.0 >> 63 != 0
    }

    fn exp_field(self) -> i32 {
        ((self.0 >> 52) & 0x7FF) as i32
    }

    fn sig_field(self) -> u128 {
        u128::from(self.0 & FRAC_MASK)
    }

    fn assemble(sign: bool, exp: i32, sig: u128) -> Self {
        Self((u64::from(sign) << 63) | ((exp as u64 & 0x7FF) << 52) | (sig as u64 & FRAC_MASK))
    }
}

float_common!(Float64);

impl Float64 {
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Reinterpret a host `f64` bit pattern.
    #[must_use]
    pub fn from_host(value: f64) -> Self {
        Self(value.to_bits())
    }

    #[must_use]
    pub fn to_host(self) -> f64 {
        f64::from_bits(self.0)
    }

    /// Narrow to single precision, rounding in the current mode.
    pub fn to_float32(self, status: &mut FloatStatus) -> Float32 {
        convert::<Self, Float32>(self, status, Float32::PRECISION)
    }

    pub fn to_floatx80(self, status: &mut FloatStatus) -> FloatX80 {
        convert::<Self, FloatX80>(self, status, FloatX80::PRECISION)
    }

    pub fn to_float128(self, status: &mut FloatStatus) -> Float128 {
        convert::<Self, Float128>(self, status, Float128::PRECISION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{INEXACT, OVERFLOW, RoundingMode, UNDERFLOW};

    fn d(x: f64) -> Float64 {
        Float64::from_host(x)
    }

    #[test]
    fn correctly_rounded_basic_operations() {
        let mut st = FloatStatus::new();
        assert_eq!(d(0.1).add(d(0.2), &mut st), d(0.1 + 0.2));
        assert_eq!(d(1.1).mul(d(1.1), &mut st), d(1.1 * 1.1));
        assert_eq!(d(2.0).div(d(3.0), &mut st), d(2.0 / 3.0));
        assert_eq!(d(2.0).sqrt(&mut st), d(std::f64::consts::SQRT_2));
        assert!(st.test(INEXACT));
    }

    #[test]
    fn remainder_rounds_quotient_to_nearest_even() {
        let mut st = FloatStatus::new();
        assert_eq!(d(5.0).rem(d(3.0), &mut st), d(-1.0));
        assert_eq!(d(7.0).rem(d(2.0), &mut st), d(-1.0));
        assert_eq!(d(5.0).rem(d(2.0), &mut st), d(1.0));
        assert_eq!(d(-4.0).rem(d(2.0), &mut st), d(-0.0));
        assert_eq!(d(1.0).rem(d(3.0), &mut st), d(1.0));
        assert_eq!(d(2.0).rem(d(3.0), &mut st), d(-1.0));
        assert_eq!(st.flags, 0);
    }

    #[test]
    fn narrowing_rounds_and_flags() {
        let mut st = FloatStatus::new();
        assert_eq!(d(0.1).to_float32(&mut st), Float32::from_host(0.1));
        assert!(st.test(INEXACT));

        let mut st = FloatStatus::new();
        assert_eq!(d(1e300).to_float32(&mut st), Float32::infinity(false));
        assert!(st.test(OVERFLOW));

        let mut st = FloatStatus::new();
        assert_eq!(d(1e-50).to_float32(&mut st), Float32::zero(false));
        assert!(st.test(UNDERFLOW | INEXACT));

        let mut st = FloatStatus::new();
        assert_eq!(d(1e-50).to_float32(&mut st.with_rounding(RoundingMode::Up)), Float32(1));
    }

    #[test]
    fn round_to_int_follows_mode() {
        let mut st = FloatStatus::new();
        assert_eq!(d(2.5).round_to_int(&mut st), d(2.0));
        assert_eq!(d(-2.5).round_to_int(&mut st), d(-2.0));
        assert_eq!(d(-0.4).round_to_int(&mut st), d(-0.0));
        assert_eq!(d(2.7).trunc_to_int(&mut st), d(2.0));
        let mut st = FloatStatus::new().with_rounding(RoundingMode::Up);
        assert_eq!(d(2.1).round_to_int(&mut st), d(3.0));
        assert_eq!(d(1e20).round_to_int(&mut st), d(1e20));
    }

    #[test]
    fn sixty_four_bit_integers() {
        let mut st = FloatStatus::new();
        assert_eq!(d(-9.223_372_036_854_775_808e18).to_i64(&mut st), i64::MIN);
        assert_eq!(Float64::from_i64(i64::MAX, &mut st), d(9.223_372_036_854_775_808e18));
        assert!(st.test(INEXACT));
        assert_eq!(Float64::from_i32(-7, &mut st), d(-7.0));
    }
}
