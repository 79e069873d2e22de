//! Software IEEE-754 arithmetic on transparent bit patterns.
//!
//! Four formats are provided: [`Float32`], [`Float64`], [`FloatX80`] (the
//! 68881/68882 extended format with an explicit integer bit) and
//! [`Float128`]. Values are plain bit patterns; nothing here goes through
//! host floating point, so results are bit-exact under every rounding mode.
//!
//! Operations take a [`FloatStatus`] carrying the rounding mode, tininess
//! detection and extended rounding precision, and accumulate IEEE exception
//! flags into it.
//!
//! NaN conventions follow the Motorola FPU: the default NaN has every
//! significand bit set, and a NaN result takes its payload from the first
//! NaN operand.

/// Methods shared by every format, expressed through the generic kernels.
macro_rules! float_common {
    ($ty:ident) => {
        impl $ty {
            /// True for quiet and signalling NaNs.
            #[must_use]
            pub fn is_nan(self) -> bool {
                crate::format::is_nan(self)
            }

            #[must_use]
            pub fn is_signaling_nan(self) -> bool {
                crate::format::is_signaling_nan(self)
            }

            #[must_use]
            pub fn is_infinity(self) -> bool {
                crate::format::kind(self) == crate::format::Kind::Infinity
            }

            /// True for either signed zero.
            #[must_use]
            pub fn is_zero(self) -> bool {
                crate::format::kind(self) == crate::format::Kind::Zero
            }

            /// True for non-zero values below the normal range.
            #[must_use]
            pub fn is_subnormal(self) -> bool {
                use crate::format::Format;
                self.exp_field() == 0 && !self.is_zero()
            }

            #[must_use]
            pub fn sign(self) -> bool {
                crate::format::Format::sign(self)
            }

            /// Positive infinity, or negative with `sign`.
            #[must_use]
            pub fn infinity(sign: bool) -> Self {
                crate::format::infinity(sign)
            }

            /// Signed zero.
            #[must_use]
            pub fn zero(sign: bool) -> Self {
                crate::format::zero(sign)
            }

            /// The canonical NaN returned by invalid operations.
            #[must_use]
            pub fn default_nan() -> Self {
                crate::format::default_nan()
            }

            /// Flip the sign bit. Never raises flags, even for NaNs.
            #[must_use]
            pub fn negate(self) -> Self {
                use crate::format::Format;
                Self::assemble(!self.sign(), self.exp_field(), self.sig_field())
            }

            /// Clear the sign bit.
            #[must_use]
            pub fn abs(self) -> Self {
                use crate::format::Format;
                Self::assemble(false, self.exp_field(), self.sig_field())
            }

            pub fn add(self, other: Self, status: &mut crate::FloatStatus) -> Self {
                let precision = <Self as crate::format::Format>::rounding_precision(status);
                crate::ops::add(self, other, false, status, precision)
            }

            pub fn sub(self, other: Self, status: &mut crate::FloatStatus) -> Self {
                let precision = <Self as crate::format::Format>::rounding_precision(status);
                crate::ops::add(self, other, true, status, precision)
            }

            pub fn mul(self, other: Self, status: &mut crate::FloatStatus) -> Self {
                let precision = <Self as crate::format::Format>::rounding_precision(status);
                crate::ops::mul(self, other, status, precision)
            }

            pub fn div(self, other: Self, status: &mut crate::FloatStatus) -> Self {
                let precision = <Self as crate::format::Format>::rounding_precision(status);
                crate::ops::div(self, other, status, precision)
            }

            pub fn sqrt(self, status: &mut crate::FloatStatus) -> Self {
                let precision = <Self as crate::format::Format>::rounding_precision(status);
                crate::ops::sqrt(self, status, precision)
            }

            /// IEEE remainder: `self - n * other` with `n` the nearest
            /// integer to the exact quotient, ties to even.
            pub fn rem(self, other: Self, status: &mut crate::FloatStatus) -> Self {
                crate::ops::rem(self, other, true, status).0
            }

            /// Round to an integral value in the current rounding mode.
            pub fn round_to_int(self, status: &mut crate::FloatStatus) -> Self {
                let mode = status.rounding_mode;
                crate::ops::round_to_int(self, mode, status)
            }

            /// Round to an integral value toward zero.
            pub fn trunc_to_int(self, status: &mut crate::FloatStatus) -> Self {
                crate::ops::round_to_int(self, crate::RoundingMode::ToZero, status)
            }

            /// Convert to `i32` in the current rounding mode. Out-of-range
            /// values and NaNs saturate and raise invalid.
            pub fn to_i32(self, status: &mut crate::FloatStatus) -> i32 {
                let mode = status.rounding_mode;
                crate::ops::to_int(self, 32, mode, status) as i32
            }

            pub fn to_i32_round_to_zero(self, status: &mut crate::FloatStatus) -> i32 {
                crate::ops::to_int(self, 32, crate::RoundingMode::ToZero, status) as i32
            }

            pub fn to_i64(self, status: &mut crate::FloatStatus) -> i64 {
                let mode = status.rounding_mode;
                crate::ops::to_int(self, 64, mode, status)
            }

            pub fn to_i64_round_to_zero(self, status: &mut crate::FloatStatus) -> i64 {
                crate::ops::to_int(self, 64, crate::RoundingMode::ToZero, status)
            }

            pub fn from_i32(value: i32, status: &mut crate::FloatStatus) -> Self {
                crate::ops::from_int(i64::from(value), status)
            }

            pub fn from_i64(value: i64, status: &mut crate::FloatStatus) -> Self {
                crate::ops::from_int(value, status)
            }

            /// Quiet equality: only signalling NaNs raise invalid.
            pub fn equal(self, other: Self, status: &mut crate::FloatStatus) -> bool {
                crate::ops::compare(self, other, false, status) == Some(std::cmp::Ordering::Equal)
            }

            /// Signalling `<=`: any NaN raises invalid.
            pub fn less_equal(self, other: Self, status: &mut crate::FloatStatus) -> bool {
                matches!(
                    crate::ops::compare(self, other, true, status),
                    Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
                )
            }

            /// Signalling `<`: any NaN raises invalid.
            pub fn less_than(self, other: Self, status: &mut crate::FloatStatus) -> bool {
                crate::ops::compare(self, other, true, status) == Some(std::cmp::Ordering::Less)
            }

            pub fn equal_signaling(self, other: Self, status: &mut crate::FloatStatus) -> bool {
                crate::ops::compare(self, other, true, status) == Some(std::cmp::Ordering::Equal)
            }

            pub fn less_equal_quiet(self, other: Self, status: &mut crate::FloatStatus) -> bool {
                matches!(
                    crate::ops::compare(self, other, false, status),
                    Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
                )
            }

            pub fn less_than_quiet(self, other: Self, status: &mut crate::FloatStatus) -> bool {
                crate::ops::compare(self, other, false, status) == Some(std::cmp::Ordering::Less)
            }

            /// Quiet three-way comparison; `None` when unordered.
            pub fn compare(self, other: Self, status: &mut crate::FloatStatus) -> Option<std::cmp::Ordering> {
                crate::ops::compare(self, other, false, status)
            }
        }
    };
}

mod float128;
mod float32;
mod float64;
mod floatx80;
mod format;
mod ops;
mod primitives;
mod status;

pub use float32::Float32;
pub use float64::Float64;
pub use float128::Float128;
pub use floatx80::FloatX80;
pub use status::{
    DIVIDE_BY_ZERO, FloatStatus, INEXACT, INVALID, OVERFLOW, Precision, RoundingMode, Tininess,
    UNDERFLOW,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_shared_by_every_format() {
        assert!(Float32::from_bits(0x7FA0_0000).is_signaling_nan());
        assert!(!Float32::from_bits(0x7FC0_0000).is_signaling_nan());
        assert!(Float32::from_bits(0x8000_0000).is_zero());
        assert!(Float32::from_bits(0x8000_0000).sign());
        assert!(Float32::from_bits(1).is_subnormal());

        assert!(Float64::from_bits(0x7FF4_0000_0000_0000).is_signaling_nan());
        assert!(Float64::from_bits(1).is_subnormal());
        assert!(Float64::infinity(true).is_infinity());

        assert!(FloatX80::new(0x7FFF, 0xA000_0000_0000_0000).is_signaling_nan());
        assert!(FloatX80::new(0x7FFF, 0xC000_0000_0000_0000).is_nan());
        assert!(FloatX80::new(0, 1).is_subnormal());
        assert!(FloatX80::infinity(false).is_infinity());
        assert!(!FloatX80::infinity(false).sign());

        assert!(Float128::new(0x7FFF_4000_0000_0000, 0).is_signaling_nan());
        assert!(Float128::new(0, 1).is_subnormal());
        assert!(Float128::infinity(true).sign());
    }
}
