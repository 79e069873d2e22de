use crate::format::{Format, Kind, Unpacked, invalid, kind, propagate_nan, round_pack, unpack};
use crate::ops::{convert, rem, to_int};
use crate::{Float32, Float64, Float128, FloatStatus};

/// 80-bit extended precision as used by the 68881/68882.
///
/// `high` holds the sign (bit 15) and the 15-bit biased exponent; `low` is
/// the 64-bit significand with an explicit integer bit at bit 63. In memory
/// the 68k stores this as 12 bytes: `high`, 16 bits of padding, `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatX80 {
    pub high: u16,
    pub low: u64,
}

impl Format for FloatX80 {
    const PRECISION: u32 = 64;
    const BIAS: i32 = 0x3FFF;
    const EXP_MAX: i32 = 0x7FFF;
    const EXPLICIT_INT: bool = true;

    fn sign(self) -> bool {
        self.high >> 15 != 0
    }

    fn exp_field(self) -> i32 {
        i32::from(self.high & 0x7FFF)
    }

    fn sig_field(self) -> u128 {
        u128::from(self.low)
    }

    fn assemble(sign: bool, exp: i32, sig: u128) -> Self {
        Self {
            high: (u16::from(sign) << 15) | (exp as u16 & 0x7FFF),
            low: sig as u64,
        }
    }

    fn rounding_precision(status: &FloatStatus) -> u32 {
        status.precision.bits()
    }
}

float_common!(FloatX80);

impl FloatX80 {
    /// +1.0
    pub const ONE: Self = Self::new(0x3FFF, 0x8000_0000_0000_0000);

    #[must_use]
    pub const fn new(high: u16, low: u64) -> Self {
        Self { high, low }
    }

    /// Biased exponent field.
    #[must_use]
    pub const fn exponent(self) -> u16 {
        self.high & 0x7FFF
    }

    /// Nearest extended value to a host double (always exact).
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        Float64::from_host(value).to_floatx80(&mut FloatStatus::new())
    }

    /// Nearest host double, rounding to nearest-even.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.to_float64(&mut FloatStatus::new()).to_host()
    }

    pub fn to_float32(self, status: &mut FloatStatus) -> Float32 {
        convert::<Self, Float32>(self, status, Float32::PRECISION)
    }

    pub fn to_float64(self, status: &mut FloatStatus) -> Float64 {
        convert::<Self, Float64>(self, status, Float64::PRECISION)
    }

    pub fn to_float128(self, status: &mut FloatStatus) -> Float128 {
        convert::<Self, Float128>(self, status, Float128::PRECISION)
    }

    /// Round `mantissa * 2^exponent` to the rounding precision in `status`.
    ///
    /// Bits of `mantissa` beyond the target precision act as guard bits; a
    /// caller that has already discarded non-zero bits should OR a one into
    /// bit 0 so the result is rounded as inexact.
    pub fn from_scaled_integer(sign: bool, mantissa: u128, exponent: i32, status: &mut FloatStatus) -> Self {
        if mantissa == 0 {
            return Self::zero(sign);
        }
        let mut u = Unpacked::from_integer(sign, mantissa);
        u.exp += exponent.clamp(-0x1_0000, 0x1_0000);
        let precision = status.precision.bits();
        round_pack(status, u, precision)
    }

    /// Split a finite value into `(sign, significand, exponent)` with
    /// `|self| == significand * 2^exponent`. Zeros give a zero significand.
    #[must_use]
    pub fn to_scaled_integer(self) -> (bool, u64, i32) {
        let exp = i32::from(self.exponent()).max(1) - 0x3FFF - 63;
        (self.sign(), self.low, exp)
    }

    /// Round a finite value to the rounding precision in `status`, keeping
    /// the extended exponent range.
    pub fn round_to_precision(self, status: &mut FloatStatus) -> Self {
        match kind(self) {
            Kind::Finite => {
                let precision = status.precision.bits();
                round_pack(status, unpack(self), precision)
            }
            Kind::Nan if self.is_signaling_nan() => propagate_nan(self, self, status),
            _ => self,
        }
    }

    /// Truncating remainder (FMOD). Returns the remainder, the low bits of
    /// the quotient magnitude and the quotient sign.
    pub fn modulo(self, other: Self, status: &mut FloatStatus) -> (Self, u64, bool) {
        rem(self, other, false, status)
    }

    /// IEEE remainder (FREM), with quotient bits and sign as for
    /// [`modulo`](Self::modulo).
    pub fn remainder(self, other: Self, status: &mut FloatStatus) -> (Self, u64, bool) {
        rem(self, other, true, status)
    }

    /// Multiply by `2^n` (FSCALE).
    pub fn scale(self, n: i32, status: &mut FloatStatus) -> Self {
        match kind(self) {
            Kind::Nan => propagate_nan(self, self, status),
            Kind::Zero | Kind::Infinity => self,
            Kind::Finite => {
                let mut u = unpack(self);
                u.exp += n.clamp(-0x1_0000, 0x1_0000);
                let precision = status.precision.bits();
                round_pack(status, u, precision)
            }
        }
    }

    /// Unbiased exponent as an extended value (FGETEXP). Denormals report
    /// the exponent of their normalised form.
    pub fn get_exp(self, status: &mut FloatStatus) -> Self {
        match kind(self) {
            Kind::Nan => propagate_nan(self, self, status),
            Kind::Zero => self,
            Kind::Infinity => invalid(status),
            Kind::Finite => Self::from_i32(unpack(self).exp, status),
        }
    }

    /// Significand scaled into `[1, 2)` with the sign kept (FGETMAN).
    pub fn get_man(self, status: &mut FloatStatus) -> Self {
        match kind(self) {
            Kind::Nan => propagate_nan(self, self, status),
            Kind::Zero => self,
            Kind::Infinity => invalid(status),
            Kind::Finite => {
                let u = unpack(self);
                round_pack(status, Unpacked { exp: 0, ..u }, Self::PRECISION)
            }
        }
    }

    /// Convert to a 16-bit integer in the current mode, saturating.
    pub fn to_i16(self, status: &mut FloatStatus) -> i16 {
        let mode = status.rounding_mode;
        to_int(self, 16, mode, status) as i16
    }

    /// Convert to an 8-bit integer in the current mode, saturating.
    pub fn to_i8(self, status: &mut FloatStatus) -> i8 {
        let mode = status.rounding_mode;
        to_int(self, 8, mode, status) as i8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{INEXACT, INVALID, Precision};

    fn x(v: f64) -> FloatX80 {
        FloatX80::from_f64(v)
    }

    #[test]
    fn encodes_with_explicit_integer_bit() {
        assert_eq!(x(1.0), FloatX80::ONE);
        assert_eq!(x(-2.0), FloatX80::new(0xC000, 0x8000_0000_0000_0000));
        assert_eq!(FloatX80::infinity(false), FloatX80::new(0x7FFF, 0x8000_0000_0000_0000));
        assert_eq!(FloatX80::default_nan(), FloatX80::new(0x7FFF, u64::MAX));
    }

    #[test]
    fn one_third_uses_all_sixty_four_bits() {
        let mut st = FloatStatus::new();
        let third = x(1.0).div(x(3.0), &mut st);
        assert_eq!(third, FloatX80::new(0x3FFD, 0xAAAA_AAAA_AAAA_AAAB));
        assert!(st.test(INEXACT));
    }

    #[test]
    fn rounding_precision_limits_significand_only() {
        let mut st = FloatStatus::new().with_precision(Precision::Single);
        let third = x(1.0).div(x(3.0), &mut st);
        assert_eq!(third, FloatX80::new(0x3FFD, 0xAAAA_AB00_0000_0000));

        let mut st = FloatStatus::new().with_precision(Precision::Double);
        let third = x(1.0).div(x(3.0), &mut st);
        assert_eq!(third.to_f64(), 1.0 / 3.0);

        // Exponent range stays extended: 2^-1000 squared is representable.
        let mut st = FloatStatus::new().with_precision(Precision::Single);
        let tiny = x(2f64.powi(-1000));
        let sq = tiny.mul(tiny, &mut st);
        assert_eq!(sq.exponent(), 0x3FFF - 2000);
    }

    #[test]
    fn double_round_trip_is_exact_when_representable() {
        let mut st = FloatStatus::new();
        for v in [0.0, -0.0, 1.5, -3.25e-300, 6.02e23, f64::MAX, f64::MIN_POSITIVE, 5e-324] {
            let back = x(v).to_float64(&mut st).to_host();
            assert_eq!(back.to_bits(), v.to_bits(), "{v}");
        }
        assert_eq!(st.flags, 0);
    }

    #[test]
    fn modulo_and_remainder_report_quotient() {
        let mut st = FloatStatus::new();
        let (r, q, neg) = x(7.0).modulo(x(2.0), &mut st);
        assert_eq!((r, q, neg), (x(1.0), 3, false));
        let (r, q, neg) = x(7.0).remainder(x(-2.0), &mut st);
        assert_eq!((r, q, neg), (x(-1.0), 4, true));
        let (r, q, _) = x(-10.5).modulo(x(3.0), &mut st);
        assert_eq!((r, q), (x(-1.5), 3));
        assert_eq!(st.flags, 0);

        let (r, _, _) = x(1.0).modulo(x(0.0), &mut st);
        assert!(r.is_nan());
        assert!(st.test(INVALID));
    }

    #[test]
    fn scale_getexp_getman() {
        let mut st = FloatStatus::new();
        assert_eq!(x(3.0).scale(4, &mut st), x(48.0));
        assert_eq!(x(3.0).scale(-1, &mut st), x(1.5));
        assert_eq!(x(48.0).get_exp(&mut st), x(5.0));
        assert_eq!(x(0.375).get_exp(&mut st), x(-2.0));
        assert_eq!(x(-48.0).get_man(&mut st), x(-1.5));
        assert_eq!(st.flags, 0);
        assert!(FloatX80::infinity(false).get_exp(&mut st).is_nan());
        assert!(st.test(INVALID));
    }

    #[test]
    fn narrow_integers_saturate() {
        let mut st = FloatStatus::new();
        assert_eq!(x(100.4).to_i8(&mut st), 100);
        assert_eq!(x(300.0).to_i8(&mut st), i8::MAX);
        assert_eq!(x(-40000.0).to_i16(&mut st), i16::MIN);
        assert!(st.test(INVALID));
    }

    #[test]
    fn scaled_integers_round_once() {
        let mut st = FloatStatus::new();
        assert_eq!(FloatX80::from_scaled_integer(true, 3, 4, &mut st), x(-48.0));
        assert_eq!(x(-48.0).to_scaled_integer(), (true, 0xC000_0000_0000_0000, -58));
        assert_eq!(st.flags, 0);
        // 2^65 + 1 needs 66 bits: rounds to 2^65.
        let v = FloatX80::from_scaled_integer(false, (1u128 << 65) | 1, 0, &mut st);
        assert_eq!(v, x(2f64.powi(65)));
        assert!(st.test(INEXACT));
    }

    #[test]
    fn unnormal_zero_is_zero() {
        let unnormal = FloatX80::new(0x1234, 0);
        assert!(unnormal.is_zero());
        let denormal = FloatX80::new(0, 1);
        assert!(denormal.is_subnormal());
        let mut st = FloatStatus::new();
        assert_eq!(denormal.add(FloatX80::zero(false), &mut st), denormal);
    }
}
