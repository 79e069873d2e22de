//! Floating-point environment: rounding control and exception flags.
//!
//! Every operation takes a `&mut FloatStatus`. Rounding mode, tininess
//! detection and extended rounding precision are read from it, and the
//! IEEE exception flags raised by the operation are OR-ed into `flags`.
//! Flags are sticky: nothing in this crate ever clears them.

/// Invalid operation (0/0, inf-inf, sqrt(-x), signalling NaN operand).
pub const INVALID: u8 = 0x01;
/// Exact division of a finite non-zero value by zero.
pub const DIVIDE_BY_ZERO: u8 = 0x02;
/// Rounded result exceeded the largest finite value.
pub const OVERFLOW: u8 = 0x04;
/// Result was tiny and inexact.
pub const UNDERFLOW: u8 = 0x08;
/// Rounded result differs from the infinitely precise one.
pub const INEXACT: u8 = 0x10;

/// IEEE-754 rounding direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoundingMode {
    /// Round to nearest, ties to even.
    #[default]
    NearestEven,
    /// Round toward zero (truncate).
    ToZero,
    /// Round toward negative infinity.
    Down,
    /// Round toward positive infinity.
    Up,
}

impl RoundingMode {
    /// Decode the two-bit 68881 FPCR rounding-mode field (RN, RZ, RM, RP).
    #[must_use]
    pub const fn from_fpcr_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::NearestEven,
            1 => Self::ToZero,
            2 => Self::Down,
            _ => Self::Up,
        }
    }
}

/// When an underflow is detected relative to rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tininess {
    /// Tiny if the exact result is below the normal range (Motorola).
    #[default]
    BeforeRounding,
    /// Tiny if the result rounded with unbounded exponent is below the
    /// normal range.
    AfterRounding,
}

/// Significand precision used when rounding extended-precision results.
///
/// Only affects [`FloatX80`](crate::FloatX80) results: the exponent range
/// stays extended, only the number of significant bits is reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Precision {
    /// 64 significant bits.
    #[default]
    Extended,
    /// 53 significant bits.
    Double,
    /// 24 significant bits.
    Single,
}

impl Precision {
    /// Number of significand bits kept when rounding.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Extended => 64,
            Self::Double => 53,
            Self::Single => 24,
        }
    }

    /// Decode the two-bit 68881 FPCR rounding-precision field (X, S, D).
    #[must_use]
    pub const fn from_fpcr_bits(bits: u32) -> Self {
        match bits & 3 {
            1 => Self::Single,
            2 => Self::Double,
            // 3 is undefined on the 68881 and behaves as extended.
            _ => Self::Extended,
        }
    }
}

/// Rounding control plus accumulated exception flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloatStatus {
    /// Rounding direction for inexact results.
    pub rounding_mode: RoundingMode,
    /// Tininess detection for the underflow flag.
    pub tininess: Tininess,
    /// Significand precision for extended results.
    pub precision: Precision,
    /// Accumulated exception flags (`INVALID`, `DIVIDE_BY_ZERO`, ...).
    pub flags: u8,
}

impl FloatStatus {
    /// Round-to-nearest, extended precision, no flags raised.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rounding_mode: RoundingMode::NearestEven,
            tininess: Tininess::BeforeRounding,
            precision: Precision::Extended,
            flags: 0,
        }
    }

    /// Same environment with a different rounding mode.
    #[must_use]
    pub const fn with_rounding(mut self, mode: RoundingMode) -> Self {
        self.rounding_mode = mode;
        self
    }

    /// Same environment with a different extended rounding precision.
    #[must_use]
    pub const fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Raise one or more exception flags.
    pub fn raise(&mut self, flags: u8) {
        self.flags |= flags;
    }

    /// True if every flag in `flags` has been raised.
    #[must_use]
    pub const fn test(&self, flags: u8) -> bool {
        self.flags & flags == flags
    }

    /// Return the raised flags and clear them.
    pub fn take_flags(&mut self) -> u8 {
        std::mem::take(&mut self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fpcr_rounding_fields_decode_in_motorola_order() {
        assert_eq!(RoundingMode::from_fpcr_bits(0), RoundingMode::NearestEven);
        assert_eq!(RoundingMode::from_fpcr_bits(1), RoundingMode::ToZero);
        assert_eq!(RoundingMode::from_fpcr_bits(2), RoundingMode::Down);
        assert_eq!(RoundingMode::from_fpcr_bits(3), RoundingMode::Up);
        assert_eq!(Precision::from_fpcr_bits(0), Precision::Extended);
        assert_eq!(Precision::from_fpcr_bits(1), Precision::Single);
        assert_eq!(Precision::from_fpcr_bits(2), Precision::Double);
        assert_eq!(Precision::from_fpcr_bits(3), Precision::Extended);
    }

    #[test]
    fn flags_accumulate_until_taken() {
        let mut st = FloatStatus::new();
        st.raise(INEXACT);
        st.raise(OVERFLOW);
        assert!(st.test(INEXACT | OVERFLOW));
        assert!(!st.test(INVALID));
        assert_eq!(st.take_flags(), INEXACT | OVERFLOW);
        assert_eq!(st.flags, 0);
    }
}
