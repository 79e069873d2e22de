//! Format-independent arithmetic.
//!
//! Each operation handles NaN/infinity/zero operands from the encodings,
//! computes the exact result of finite operands in working form (with a
//! sticky bit for anything below the working precision), then rounds once
//! into the destination format.

use std::cmp::Ordering;

use crate::format::{
    Format, Kind, Unpacked, infinity, invalid, is_signaling_nan, kind, propagate_nan, round_pack,
    unpack, zero,
};
use crate::primitives::{
    LEAD, bit_pair_wide, mul_wide, round_bits, shift_right_jam, shift_right_jam_wide,
};
use crate::status::{DIVIDE_BY_ZERO, FloatStatus, INEXACT, INVALID, RoundingMode};

// --- Working-form kernels -------------------------------------------------

/// Exact sum of two finite working values (up to the sticky bit).
pub(crate) fn add_unpacked(a: Unpacked, b: Unpacked, mode: RoundingMode) -> Unpacked {
    if a.sig == 0 {
        return b;
    }
    if b.sig == 0 {
        return a;
    }
    let (big, small) = if a.exp >= b.exp { (a, b) } else { (b, a) };
    let aligned = shift_right_jam(small.sig, (big.exp - small.exp).unsigned_abs().min(200));

    if big.sign == small.sign {
        let sum = big.sig + aligned;
        return Unpacked::from_parts(big.sign, big.exp, sum);
    }

    let (magnitude, sign) = match big.sig.cmp(&aligned) {
        Ordering::Greater => (big.sig - aligned, big.sign),
        Ordering::Less => (aligned - big.sig, small.sign),
        Ordering::Equal => return Unpacked::zero(mode == RoundingMode::Down),
    };
    Unpacked::from_parts(sign, big.exp, magnitude)
}

/// Exact product of two finite non-zero working values.
pub(crate) fn mul_unpacked(a: Unpacked, b: Unpacked) -> Unpacked {
    let (high, low) = mul_wide(a.sig, b.sig);
    // Leading one of the product is at bit 252 or 253.
    let sig = shift_right_jam_wide(high, low, LEAD);
    Unpacked::from_parts(a.sign ^ b.sign, a.exp + b.exp, sig)
}

/// Quotient of two finite non-zero working values, to full working
/// precision plus sticky.
pub(crate) fn div_unpacked(a: Unpacked, b: Unpacked) -> Unpacked {
    let divisor = b.sig;
    let mut rem = a.sig;
    let mut exp = a.exp - b.exp;
    if rem < divisor {
        rem <<= 1;
        exp -= 1;
    }

    let mut quotient = 0u128;
    for bit in (0..=LEAD).rev() {
        if rem >= divisor {
            rem -= divisor;
            quotient |= 1u128 << bit;
        }
        rem <<= 1;
    }
    Unpacked {
        sign: a.sign ^ b.sign,
        exp,
        sig: quotient | u128::from(rem != 0),
    }
}

/// Square root of a finite positive working value.
pub(crate) fn sqrt_unpacked(a: Unpacked) -> Unpacked {
    const ROOT_BITS: u32 = 120;
    // Radicand sig << k holds 2*ROOT_BITS significant bits; an odd
    // exponent moves one factor of two into the radicand.
    let k = 112 + a.exp.rem_euclid(2) as u32;
    let high = a.sig >> (128 - k);
    let low = a.sig << k;

    let mut rem = 0u128;
    let mut root = 0u128;
    for pair in (0..ROOT_BITS).rev() {
        rem = (rem << 2) | bit_pair_wide(high, low, pair * 2);
        let trial = (root << 2) | 1;
        root <<= 1;
        if rem >= trial {
            rem -= trial;
            root |= 1;
        }
    }

    Unpacked {
        sign: false,
        exp: a.exp.div_euclid(2),
        sig: (root << (LEAD + 1 - ROOT_BITS)) | u128::from(rem != 0),
    }
}

/// Remainder of `a / b` for finite non-zero operands.
///
/// With `nearest` the quotient is rounded to nearest-even (IEEE remainder,
/// FREM); otherwise it is truncated (FMOD). Returns the exact remainder and
/// the low 64 bits of the integer quotient magnitude.
pub(crate) fn rem_unpacked(a: Unpacked, b: Unpacked, nearest: bool) -> (Unpacked, u64) {
    let divisor = b.sig;

    if a.exp < b.exp - 1 {
        return (a, 0);
    }

    if a.exp == b.exp - 1 {
        // |a| < |b|: quotient is 0 unless rounding to nearest pushes it to 1.
        if nearest && a.sig > divisor {
            let diff = (divisor << 1) - a.sig;
            return (Unpacked::from_parts(!a.sign, b.exp - 1, diff), 1);
        }
        return (a, 0);
    }

    let steps = a.exp - b.exp;
    let mut rem = a.sig;
    let mut quotient = 0u64;
    for step in 0..=steps {
        quotient = quotient.wrapping_shl(1);
        if rem >= divisor {
            rem -= divisor;
            quotient |= 1;
        }
        if step < steps {
            rem <<= 1;
        }
    }

    let mut sign = a.sign;
    if nearest {
        let twice = rem << 1;
        if twice > divisor || (twice == divisor && quotient & 1 == 1) {
            rem = divisor - rem;
            sign = !sign;
            quotient = quotient.wrapping_add(1);
        }
    }

    if rem == 0 {
        return (Unpacked::zero(a.sign), quotient);
    }
    (Unpacked::from_parts(sign, b.exp, rem), quotient)
}

// --- Encoded operations ----------------------------------------------------

pub(crate) fn add<F: Format>(a: F, b: F, negate_b: bool, status: &mut FloatStatus, precision: u32) -> F {
    let (ka, kb) = (kind(a), kind(b));
    if ka == Kind::Nan || kb == Kind::Nan {
        return propagate_nan(a, b, status);
    }
    let b_sign = b.sign() ^ negate_b;

    match (ka, kb) {
        (Kind::Infinity, Kind::Infinity) => {
            if a.sign() == b_sign {
                a
            } else {
                invalid(status)
            }
        }
        (Kind::Infinity, _) => a,
        (_, Kind::Infinity) => infinity(b_sign),
        (Kind::Zero, Kind::Zero) => {
            let sign = if a.sign() == b_sign {
                b_sign
            } else {
                status.rounding_mode == RoundingMode::Down
            };
            zero(sign)
        }
        (Kind::Zero, _) => {
            let mut ub = unpack(b);
            ub.sign = b_sign;
            round_pack(status, ub, precision)
        }
        (_, Kind::Zero) => round_pack(status, unpack(a), precision),
        _ => {
            let mut ub = unpack(b);
            ub.sign = b_sign;
            let sum = add_unpacked(unpack(a), ub, status.rounding_mode);
            round_pack(status, sum, precision)
        }
    }
}

pub(crate) fn mul<F: Format>(a: F, b: F, status: &mut FloatStatus, precision: u32) -> F {
    let (ka, kb) = (kind(a), kind(b));
    if ka == Kind::Nan || kb == Kind::Nan {
        return propagate_nan(a, b, status);
    }
    let sign = a.sign() ^ b.sign();
    match (ka, kb) {
        (Kind::Infinity, Kind::Zero) | (Kind::Zero, Kind::Infinity) => invalid(status),
        (Kind::Infinity, _) | (_, Kind::Infinity) => infinity(sign),
        (Kind::Zero, _) | (_, Kind::Zero) => zero(sign),
        _ => round_pack(status, mul_unpacked(unpack(a), unpack(b)), precision),
    }
}

pub(crate) fn div<F: Format>(a: F, b: F, status: &mut FloatStatus, precision: u32) -> F {
    let (ka, kb) = (kind(a), kind(b));
    if ka == Kind::Nan || kb == Kind::Nan {
        return propagate_nan(a, b, status);
    }
    let sign = a.sign() ^ b.sign();
    match (ka, kb) {
        (Kind::Infinity, Kind::Infinity) | (Kind::Zero, Kind::Zero) => invalid(status),
        (Kind::Infinity, _) => infinity(sign),
        (_, Kind::Infinity) => zero(sign),
        (_, Kind::Zero) => {
            status.raise(DIVIDE_BY_ZERO);
            infinity(sign)
        }
        (Kind::Zero, _) => zero(sign),
        _ => round_pack(status, div_unpacked(unpack(a), unpack(b)), precision),
    }
}

pub(crate) fn sqrt<F: Format>(a: F, status: &mut FloatStatus, precision: u32) -> F {
    match kind(a) {
        Kind::Nan => propagate_nan(a, a, status),
        Kind::Zero => a,
        _ if a.sign() => invalid(status),
        Kind::Infinity => a,
        Kind::Finite => round_pack(status, sqrt_unpacked(unpack(a)), precision),
    }
}

/// Remainder; returns the result and the quotient's low bits and sign.
pub(crate) fn rem<F: Format>(a: F, b: F, nearest: bool, status: &mut FloatStatus) -> (F, u64, bool) {
    let (ka, kb) = (kind(a), kind(b));
    let q_sign = a.sign() ^ b.sign();
    if ka == Kind::Nan || kb == Kind::Nan {
        return (propagate_nan(a, b, status), 0, q_sign);
    }
    match (ka, kb) {
        (Kind::Infinity, _) | (_, Kind::Zero) => (invalid(status), 0, q_sign),
        (Kind::Zero, _) | (_, Kind::Infinity) => (a, 0, q_sign),
        _ => {
            let (result, quotient) = rem_unpacked(unpack(a), unpack(b), nearest);
            (round_pack(status, result, F::PRECISION), quotient, q_sign)
        }
    }
}

/// Round to an integral value in the given mode.
pub(crate) fn round_to_int<F: Format>(a: F, mode: RoundingMode, status: &mut FloatStatus) -> F {
    match kind(a) {
        Kind::Nan => propagate_nan(a, a, status),
        Kind::Zero | Kind::Infinity => a,
        Kind::Finite => {
            let u = unpack(a);
            if u.exp >= F::FRAC_BITS as i32 {
                return a;
            }
            let shift = (LEAD as i32 - u.exp).min(250) as u32;
            let (magnitude, inexact) = round_bits(u.sig, shift, u.sign, mode);
            if inexact {
                status.raise(INEXACT);
            }
            if magnitude == 0 {
                return zero(u.sign);
            }
            let mut exact = *status;
            round_pack(&mut exact, Unpacked::from_integer(u.sign, magnitude), F::PRECISION)
        }
    }
}

/// Convert to a signed integer of `bits` width (32 or 64).
pub(crate) fn to_int<F: Format>(a: F, bits: u32, mode: RoundingMode, status: &mut FloatStatus) -> i64 {
    let max_positive = (1u128 << (bits - 1)) - 1;
    let saturate = |negative: bool| -> i64 {
        if negative {
            -(max_positive as i64) - 1
        } else {
            max_positive as i64
        }
    };

    match kind(a) {
        Kind::Nan => {
            status.raise(INVALID);
            saturate(false)
        }
        Kind::Infinity => {
            status.raise(INVALID);
            saturate(a.sign())
        }
        Kind::Zero => 0,
        Kind::Finite => {
            let u = unpack(a);
            if u.exp >= bits as i32 {
                status.raise(INVALID);
                return saturate(u.sign);
            }
            let shift = (LEAD as i32 - u.exp).min(250) as u32;
            let (magnitude, inexact) = round_bits(u.sig, shift, u.sign, mode);
            let limit = if u.sign { max_positive + 1 } else { max_positive };
            if magnitude > limit {
                status.raise(INVALID);
                return saturate(u.sign);
            }
            if inexact {
                status.raise(INEXACT);
            }
            let value = magnitude as i64;
            if u.sign { value.wrapping_neg() } else { value }
        }
    }
}

pub(crate) fn from_int<F: Format>(value: i64, status: &mut FloatStatus) -> F {
    if value == 0 {
        return zero(false);
    }
    let u = Unpacked::from_integer(value < 0, u128::from(value.unsigned_abs()));
    round_pack(status, u, F::PRECISION)
}

/// Format-to-format conversion.
pub(crate) fn convert<F: Format, G: Format>(a: F, status: &mut FloatStatus, precision: u32) -> G {
    match kind(a) {
        Kind::Nan => crate::format::convert_nan(a, status),
        Kind::Infinity => infinity(a.sign()),
        Kind::Zero => zero(a.sign()),
        Kind::Finite => round_pack(status, unpack(a), precision),
    }
}

/// Ordered comparison. `None` means unordered. Signalling comparisons
/// raise invalid on any NaN; quiet ones only on signalling NaNs.
pub(crate) fn compare<F: Format>(a: F, b: F, signaling: bool, status: &mut FloatStatus) -> Option<Ordering> {
    let (ka, kb) = (kind(a), kind(b));
    if ka == Kind::Nan || kb == Kind::Nan {
        if signaling || is_signaling_nan(a) || is_signaling_nan(b) {
            status.raise(INVALID);
        }
        return None;
    }
    Some(total_key(a, ka).cmp(&total_key(b, kb)))
}

/// Signed sort key for non-NaN values; both zeros map to the same key.
fn total_key<F: Format>(x: F, k: Kind) -> (i8, i64, u128) {
    let (rank, exp, sig) = match k {
        Kind::Zero => return (0, 0, 0),
        Kind::Infinity => (1, i64::MAX, 0),
        _ => {
            let u = unpack(x);
            (1, i64::from(u.exp), u.sig)
        }
    };
    if x.sign() {
        (-rank, -exp, u128::MAX - sig)
    } else {
        (rank, exp, sig)
    }
}
