use crate::format::Format;
use crate::ops::convert;
use crate::{Float64, Float128, FloatStatus, FloatX80};

/// IEEE single precision: 1 sign, 8 exponent, 23 fraction bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Float32(pub u32);

impl Format for Float32 {
    const PRECISION: u32 = 24;
    const BIAS: i32 = 0x7F;
    const EXP_MAX: i32 = 0xFF;
    const EXPLICIT_INT: bool = false;

    fn sign(self) -> bool {
        self.0 >> 31 != 0
    }

    fn exp_field(self) -> i32 {
        ((self.0 >> 23) & 0xFF) as i32
    }

    fn sig_field(self) -> u128 {
        u128::from(self.0 & 0x007F_FFFF)
    }

    fn assemble(sign: bool, exp: i32, sig: u128) -> Self {
        Self((u32::from(sign) << 31) | ((exp as u32 & 0xFF) << 23) | (sig as u32 & 0x007F_FFFF))
    }
}

float_common!(Float32);

impl Float32 {
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn to_bits(self) -> u32 {
        self.0
    }

    /// Reinterpret a host `f32` bit pattern.
    #[must_use]
    pub fn from_host(value: f32) -> Self {
        Self(value.to_bits())
    }

    #[must_use]
    pub fn to_host(self) -> f32 {
        f32::from_bits(self.0)
    }

    /// Widen to double precision (always exact for non-NaNs).
    pub fn to_float64(self, status: &mut FloatStatus) -> Float64 {
        convert::<Self, Float64>(self, status, Float64::PRECISION)
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
    use crate::{DIVIDE_BY_ZERO, INEXACT, INVALID, OVERFLOW, RoundingMode, UNDERFLOW};

    fn f(x: f32) -> Float32 {
        Float32::from_host(x)
    }

    #[test]
    fn simple_arithmetic_matches_host() {
        let mut st = FloatStatus::new();
        assert_eq!(f(1.5).add(f(2.25), &mut st), f(3.75));
        assert_eq!(f(1.5).sub(f(2.25), &mut st), f(-0.75));
        assert_eq!(f(1.5).mul(f(-4.0), &mut st), f(-6.0));
        assert_eq!(f(1.0).div(f(4.0), &mut st), f(0.25));
        assert_eq!(f(16.0).sqrt(&mut st), f(4.0));
        assert_eq!(st.flags, 0);
    }

    #[test]
    fn one_third_is_inexact_and_rounds_to_nearest() {
        let mut st = FloatStatus::new();
        let third = f(1.0).div(f(3.0), &mut st);
        assert_eq!(third, f(1.0 / 3.0));
        assert!(st.test(INEXACT));

        let mut st = FloatStatus::new().with_rounding(RoundingMode::ToZero);
        let third_rz = f(1.0).div(f(3.0), &mut st);
        assert_eq!(third_rz.to_bits(), 0x3EAA_AAAA);
        let mut st = FloatStatus::new().with_rounding(RoundingMode::Up);
        let third_ru = f(1.0).div(f(3.0), &mut st);
        assert_eq!(third_ru.to_bits(), 0x3EAA_AAAB);
    }

    #[test]
    fn invalid_operations_return_default_nan() {
        let mut st = FloatStatus::new();
        let inf = Float32::infinity(false);
        let r = inf.sub(inf, &mut st);
        assert_eq!(r.to_bits(), 0x7FFF_FFFF);
        assert!(st.test(INVALID));

        let mut st = FloatStatus::new();
        assert_eq!(f(0.0).div(f(0.0), &mut st), Float32::default_nan());
        assert!(st.test(INVALID));

        let mut st = FloatStatus::new();
        assert!(f(-1.0).sqrt(&mut st).is_nan());
        assert!(st.test(INVALID));
    }

    #[test]
    fn divide_by_zero_returns_signed_infinity() {
        let mut st = FloatStatus::new();
        assert_eq!(f(-2.0).div(f(0.0), &mut st), Float32::infinity(true));
        assert_eq!(st.flags, DIVIDE_BY_ZERO);
    }

    #[test]
    fn nan_payload_comes_from_first_nan_operand() {
        let mut st = FloatStatus::new();
        let qnan = Float32(0x7FC0_1234);
        let snan = Float32(0x7F80_0001);
        assert_eq!(qnan.add(f(1.0), &mut st), qnan);
        assert_eq!(f(1.0).add(qnan, &mut st), qnan);
        assert_eq!(st.flags, 0);
        assert_eq!(snan.mul(f(2.0), &mut st).to_bits(), 0x7FC0_0001);
        assert!(st.test(INVALID));
    }

    #[test]
    fn overflow_respects_rounding_direction() {
        let max = Float32(0x7F7F_FFFF);
        let mut st = FloatStatus::new();
        assert_eq!(max.add(max, &mut st), Float32::infinity(false));
        assert!(st.test(OVERFLOW | INEXACT));

        let mut st = FloatStatus::new().with_rounding(RoundingMode::ToZero);
        assert_eq!(max.add(max, &mut st), max);
        let mut st = FloatStatus::new().with_rounding(RoundingMode::Down);
        assert_eq!(max.negate().add(max.negate(), &mut st), Float32::infinity(true));
    }

    #[test]
    fn subnormal_results_and_underflow() {
        let min_normal = Float32(0x0080_0000);
        let mut st = FloatStatus::new();
        // Exact halving stays representable as a subnormal: no underflow.
        assert_eq!(min_normal.div(f(2.0), &mut st), Float32(0x0040_0000));
        assert_eq!(st.flags, 0);

        let smallest = Float32(1);
        let mut st = FloatStatus::new();
        assert_eq!(smallest.mul(f(0.5), &mut st), Float32(0));
        assert!(st.test(UNDERFLOW | INEXACT));
        assert!(Float32(1).is_subnormal());
    }

    #[test]
    fn exact_cancellation_sign_depends_on_mode() {
        let mut st = FloatStatus::new();
        assert_eq!(f(1.0).sub(f(1.0), &mut st), Float32(0));
        let mut st = FloatStatus::new().with_rounding(RoundingMode::Down);
        assert_eq!(f(1.0).sub(f(1.0), &mut st), Float32(0x8000_0000));
    }

    #[test]
    fn integer_conversions() {
        let mut st = FloatStatus::new();
        assert_eq!(f(2.5).to_i32(&mut st), 2);
        assert_eq!(f(3.5).to_i32(&mut st), 4);
        assert_eq!(f(-2.7).to_i32_round_to_zero(&mut st), -2);
        assert!(st.test(INEXACT));

        let mut st = FloatStatus::new();
        assert_eq!(f(3.0e9).to_i32(&mut st), i32::MAX);
        assert!(st.test(INVALID));
        let mut st = FloatStatus::new();
        assert_eq!(f(-2_147_483_648.0).to_i32(&mut st), i32::MIN);
        assert_eq!(st.flags, 0);

        let mut st = FloatStatus::new();
        assert_eq!(Float32::from_i32(16_777_217, &mut st), f(16_777_216.0));
        assert!(st.test(INEXACT));
    }

    #[test]
    fn comparisons_handle_zero_signs_and_nans() {
        let mut st = FloatStatus::new();
        assert!(f(0.0).equal(f(-0.0), &mut st));
        assert!(f(-1.0).less_than(f(0.0), &mut st));
        assert!(f(-3.0).less_than(f(-2.0), &mut st));
        assert!(f(2.0).less_equal(f(2.0), &mut st));
        assert_eq!(st.flags, 0);

        let qnan = Float32(0x7FC0_0000);
        assert!(!qnan.equal(qnan, &mut st));
        assert_eq!(st.flags, 0);
        assert!(!qnan.less_than(f(1.0), &mut st));
        assert!(st.test(INVALID));
    }

    #[test]
    fn widening_is_exact() {
        let mut st = FloatStatus::new();
        assert_eq!(f(0.1).to_float64(&mut st), Float64::from_host(f64::from(0.1f32)));
        assert_eq!(Float32(1).to_float64(&mut st), Float64::from_host(f64::from(f32::from_bits(1))));
        assert_eq!(st.flags, 0);
    }
}
