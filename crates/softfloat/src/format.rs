//! Layout description shared by the four interchange formats.
//!
//! Each format type implements [`Format`] to say where its sign, exponent
//! and significand live. Classification, unpacking into the working
//! representation, rounding, packing and NaN handling are written once
//! here against that description.

use crate::primitives::{LEAD, normalize, round_bits};
use crate::status::{FloatStatus, INEXACT, INVALID, OVERFLOW, RoundingMode, Tininess, UNDERFLOW};

/// Field layout of a binary interchange format.
pub(crate) trait Format: Copy {
    /// Significand bits including the integer bit.
    const PRECISION: u32;
    /// Exponent bias.
    const BIAS: i32;
    /// Biased exponent of infinities and NaNs.
    const EXP_MAX: i32;
    /// True if the integer bit is stored (extended precision).
    const EXPLICIT_INT: bool;

    fn sign(self) -> bool;
    fn exp_field(self) -> i32;
    /// Stored significand bits, including the integer bit when explicit.
    fn sig_field(self) -> u128;
    fn assemble(sign: bool, exp: i32, sig: u128) -> Self;

    /// Significand bits kept when rounding an arithmetic result.
    fn rounding_precision(_status: &FloatStatus) -> u32 {
        Self::PRECISION
    }

    /// Fraction bits below the integer bit.
    const FRAC_BITS: u32 = Self::PRECISION - 1;
    /// Width of the stored significand field.
    const SIG_BITS: u32 = if Self::EXPLICIT_INT {
        Self::PRECISION
    } else {
        Self::PRECISION - 1
    };
}

/// Broad classification of an encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Kind {
    Zero,
    Finite,
    Infinity,
    Nan,
}

/// A finite, non-zero value in working form: `sig * 2^(exp - LEAD)`.
///
/// `sig` has its leading one at `LEAD` when normalised; bit 0 may be a
/// sticky bit. A zero `sig` denotes an exact zero with the given sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Unpacked {
    pub sign: bool,
    pub exp: i32,
    pub sig: u128,
}

impl Unpacked {
    pub const fn zero(sign: bool) -> Self {
        Self { sign, exp: 0, sig: 0 }
    }

    /// Build from an arbitrary (possibly unnormalised) significand.
    pub fn from_parts(sign: bool, exp: i32, sig: u128) -> Self {
        if sig == 0 {
            return Self::zero(sign);
        }
        let (sig, adjust) = normalize(sig);
        Self {
            sign,
            exp: exp + adjust,
            sig,
        }
    }

    /// Exact integer magnitude as a working value.
    pub fn from_integer(sign: bool, magnitude: u128) -> Self {
        Self::from_parts(sign, LEAD as i32, magnitude)
    }
}

const fn frac_mask<F: Format>() -> u128 {
    (1u128 << F::FRAC_BITS) - 1
}

const fn quiet_bit<F: Format>() -> u128 {
    1u128 << (F::FRAC_BITS - 1)
}

pub(crate) fn kind<F: Format>(x: F) -> Kind {
    let exp = x.exp_field();
    let frac = x.sig_field() & frac_mask::<F>();
    if exp == F::EXP_MAX {
        if frac == 0 { Kind::Infinity } else { Kind::Nan }
    } else if x.sig_field() == 0 && (exp == 0 || F::EXPLICIT_INT) {
        // Extended unnormals with a zero significand are zeros.
        Kind::Zero
    } else {
        Kind::Finite
    }
}

pub(crate) fn is_nan<F: Format>(x: F) -> bool {
    kind(x) == Kind::Nan
}

pub(crate) fn is_signaling_nan<F: Format>(x: F) -> bool {
    is_nan(x) && x.sig_field() & quiet_bit::<F>() == 0
}

/// Unpack a finite non-zero encoding. Subnormals come out normalised.
pub(crate) fn unpack<F: Format>(x: F) -> Unpacked {
    let field = x.exp_field();
    let (exp, sig) = if F::EXPLICIT_INT {
        (field.max(1) - F::BIAS, x.sig_field())
    } else if field == 0 {
        (1 - F::BIAS, x.sig_field())
    } else {
        (field - F::BIAS, x.sig_field() | 1u128 << F::FRAC_BITS)
    };
    // sig * 2^(exp - FRAC_BITS) == sig' * 2^(exp' - LEAD)
    Unpacked::from_parts(x.sign(), exp - F::FRAC_BITS as i32 + LEAD as i32, sig)
}

pub(crate) fn zero<F: Format>(sign: bool) -> F {
    F::assemble(sign, 0, 0)
}

pub(crate) fn infinity<F: Format>(sign: bool) -> F {
    let sig = if F::EXPLICIT_INT { 1u128 << F::FRAC_BITS } else { 0 };
    F::assemble(sign, F::EXP_MAX, sig)
}

/// The 68881 default NaN: positive, every significand bit set.
pub(crate) fn default_nan<F: Format>() -> F {
    F::assemble(false, F::EXP_MAX, (1u128 << F::SIG_BITS) - 1)
}

/// Set the quiet bit (and the integer bit on extended precision).
pub(crate) fn quiet<F: Format>(x: F) -> F {
    let mut sig = x.sig_field() | quiet_bit::<F>();
    if F::EXPLICIT_INT {
        sig |= 1u128 << F::FRAC_BITS;
    }
    F::assemble(x.sign(), F::EXP_MAX, sig)
}

/// NaN result of a two-operand operation. Prefers the first operand's
/// payload, raising invalid if either operand signals.
pub(crate) fn propagate_nan<F: Format>(a: F, b: F, status: &mut FloatStatus) -> F {
    if is_signaling_nan(a) || is_signaling_nan(b) {
        status.raise(INVALID);
    }
    if is_nan(a) { quiet(a) } else { quiet(b) }
}

/// Invalid operation: raise the flag and produce the default NaN.
pub(crate) fn invalid<F: Format>(status: &mut FloatStatus) -> F {
    status.raise(INVALID);
    default_nan()
}

/// Re-encode a NaN in another format, keeping sign and the top payload
/// bits. Signalling NaNs raise invalid and come out quiet.
pub(crate) fn convert_nan<F: Format, G: Format>(x: F, status: &mut FloatStatus) -> G {
    if is_signaling_nan(x) {
        status.raise(INVALID);
    }
    let payload = (x.sig_field() & frac_mask::<F>()) << (128 - F::FRAC_BITS);
    let mut sig = (payload >> (128 - G::FRAC_BITS)) | quiet_bit::<G>();
    if G::EXPLICIT_INT {
        sig |= 1u128 << G::FRAC_BITS;
    }
    G::assemble(x.sign(), G::EXP_MAX, sig)
}

/// Round a working value to `precision` significant bits and encode it,
/// handling overflow, underflow and subnormal results.
pub(crate) fn round_pack<F: Format>(status: &mut FloatStatus, value: Unpacked, precision: u32) -> F {
    let Unpacked { sign, exp, sig } = value;
    if sig == 0 {
        return zero(sign);
    }
    debug_assert_eq!(sig >> LEAD, 1, "working significand must be normalised");

    let mode = status.rounding_mode;
    let drop = LEAD + 1 - precision;
    let biased = exp + F::BIAS;

    if biased >= 1 {
        let (mut rounded, inexact) = round_bits(sig, drop, sign, mode);
        let mut biased = biased;
        if rounded >> precision != 0 {
            rounded >>= 1;
            biased += 1;
        }
        if biased >= F::EXP_MAX {
            return overflow(status, sign, precision);
        }
        if inexact {
            status.raise(INEXACT);
        }
        return pack_rounded(sign, biased, rounded, precision);
    }

    let tiny = match status.tininess {
        Tininess::BeforeRounding => true,
        Tininess::AfterRounding => {
            biased < 0 || round_bits(sig, drop, sign, mode).0 >> precision == 0
        }
    };

    let denorm_shift = (1 - biased) as u32;
    let (rounded, inexact) = round_bits(sig, drop.saturating_add(denorm_shift), sign, mode);
    if inexact {
        if tiny {
            status.raise(UNDERFLOW);
        }
        status.raise(INEXACT);
    }
    let biased = i32::from(rounded >> (precision - 1) != 0);
    pack_rounded(sign, biased, rounded, precision)
}

fn pack_rounded<F: Format>(sign: bool, biased: i32, rounded: u128, precision: u32) -> F {
    let stored = rounded << (F::PRECISION - precision);
    let sig = if F::EXPLICIT_INT {
        stored
    } else {
        stored & frac_mask::<F>()
    };
    F::assemble(sign, biased, sig)
}

fn overflow<F: Format>(status: &mut FloatStatus, sign: bool, precision: u32) -> F {
    status.raise(OVERFLOW | INEXACT);
    let to_infinity = match status.rounding_mode {
        RoundingMode::NearestEven => true,
        RoundingMode::ToZero => false,
        RoundingMode::Up => !sign,
        RoundingMode::Down => sign,
    };
    if to_infinity {
        infinity(sign)
    } else {
        pack_rounded(sign, F::EXP_MAX - 1, (1u128 << precision) - 1, precision)
    }
}
