//! Memory operand formats and their conversion to and from extended
//! precision.
//!
//! An operand image is three big-endian long words. Formats shorter than
//! twelve bytes use the leading words; byte and word integers are right
//! aligned in word 0.

use softfloat::{Float32, Float64, FloatStatus, FloatX80, INVALID};

use crate::packed;
use crate::registers::EXC_OPERR;

/// Source/destination format field of an FPU command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Long,
    Single,
    Extended,
    /// Packed decimal with a static k-factor.
    Packed,
    Word,
    Double,
    Byte,
    /// Packed decimal with the k-factor in a data register.
    PackedDynamic,
}

impl DataFormat {
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        match bits & 7 {
            0 => Self::Long,
            1 => Self::Single,
            2 => Self::Extended,
            3 => Self::Packed,
            4 => Self::Word,
            5 => Self::Double,
            6 => Self::Byte,
            _ => Self::PackedDynamic,
        }
    }

    /// Operand size in bytes.
    #[must_use]
    pub const fn size(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long | Self::Single => 4,
            Self::Double => 8,
            Self::Extended | Self::Packed | Self::PackedDynamic => 12,
        }
    }

    /// True for the formats an FPU can take from a data register.
    #[must_use]
    pub const fn fits_data_register(self) -> bool {
        matches!(self, Self::Byte | Self::Word | Self::Long | Self::Single)
    }
}

/// Widen a single-precision NaN keeping its signalling state.
fn nan_from_single(v: Float32) -> FloatX80 {
    let bits = v.to_bits();
    let sign = u16::from(bits >> 31 != 0) << 15;
    FloatX80::new(sign | 0x7FFF, (1 << 63) | (u64::from(bits & 0x007F_FFFF) << 40))
}

fn nan_from_double(v: Float64) -> FloatX80 {
    let bits = v.to_bits();
    let sign = u16::from(bits >> 63 != 0) << 15;
    FloatX80::new(sign | 0x7FFF, (1 << 63) | ((bits & 0x000F_FFFF_FFFF_FFFF) << 11))
}

/// Convert a memory or register image to extended precision.
///
/// Returns the value and FPSR exception bits (`INEX1` for inexact packed
/// decimal input). Signalling NaNs are kept signalling so the operation
/// that consumes them can report SNAN.
#[must_use]
pub fn load(format: DataFormat, image: [u32; 3], status: &FloatStatus) -> (FloatX80, u32) {
    let mut st = FloatStatus { flags: 0, ..*status };
    let value = match format {
        DataFormat::Byte => FloatX80::from_i32(i32::from(image[0] as u8 as i8), &mut st),
        DataFormat::Word => FloatX80::from_i32(i32::from(image[0] as u16 as i16), &mut st),
        DataFormat::Long => FloatX80::from_i32(image[0] as i32, &mut st),
        DataFormat::Single => {
            let v = Float32(image[0]);
            if v.is_nan() { nan_from_single(v) } else { v.to_floatx80(&mut st) }
        }
        DataFormat::Double => {
            let v = Float64((u64::from(image[0]) << 32) | u64::from(image[1]));
            if v.is_nan() { nan_from_double(v) } else { v.to_floatx80(&mut st) }
        }
        DataFormat::Extended => {
            FloatX80::new((image[0] >> 16) as u16, (u64::from(image[1]) << 32) | u64::from(image[2]))
        }
        DataFormat::Packed | DataFormat::PackedDynamic => return packed::decode(image, status),
    };
    (value, 0)
}

/// Convert an extended value to a memory image in `format`.
///
/// `k_factor` only applies to packed decimal. Returns the image and the
/// softfloat flags raised, plus any FPSR bits raised directly (OPERR for an
/// out-of-range k-factor or exponent).
#[must_use]
pub fn store(format: DataFormat, value: FloatX80, k_factor: i8, status: &mut FloatStatus) -> ([u32; 3], u32) {
    let image = match format {
        DataFormat::Byte => [u32::from(value.to_i8(status) as u8), 0, 0],
        DataFormat::Word => [u32::from(value.to_i16(status) as u16), 0, 0],
        DataFormat::Long => [value.to_i32(status) as u32, 0, 0],
        DataFormat::Single => [value.to_float32(status).to_bits(), 0, 0],
        DataFormat::Double => {
            let bits = value.to_float64(status).to_bits();
            [(bits >> 32) as u32, bits as u32, 0]
        }
        DataFormat::Extended => [u32::from(value.high) << 16, (value.low >> 32) as u32, value.low as u32],
        DataFormat::Packed | DataFormat::PackedDynamic => {
            return packed::encode(value, k_factor, status.rounding_mode);
        }
    };
    // Integer conversions report range errors as OPERR rather than SNAN.
    let extra = if format.fits_data_register() && format != DataFormat::Single && status.flags & INVALID != 0 {
        EXC_OPERR
    } else {
        0
    };
    (image, extra)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_loads_sign_extend() {
        let st = FloatStatus::new();
        assert_eq!(load(DataFormat::Byte, [0xFF, 0, 0], &st).0, FloatX80::from_f64(-1.0));
        assert_eq!(load(DataFormat::Word, [0x8000, 0, 0], &st).0, FloatX80::from_f64(-32768.0));
        assert_eq!(load(DataFormat::Long, [0x7FFF_FFFF, 0, 0], &st).0, FloatX80::from_f64(2_147_483_647.0));
    }

    #[test]
    fn float_loads_are_exact_and_keep_snan() {
        let st = FloatStatus::new();
        assert_eq!(load(DataFormat::Single, [0x3FC0_0000, 0, 0], &st).0, FloatX80::from_f64(1.5));
        assert_eq!(load(DataFormat::Double, [0x4009_21FB, 0x5444_2D18, 0], &st).0, FloatX80::from_f64(std::f64::consts::PI));
        let snan = load(DataFormat::Single, [0x7F80_0001, 0, 0], &st).0;
        assert!(snan.is_signaling_nan());
    }

    #[test]
    fn stores_round_and_saturate() {
        let mut st = FloatStatus::new();
        let v = FloatX80::from_f64(2.5);
        assert_eq!(store(DataFormat::Long, v, 0, &mut st).0[0], 2);
        assert_eq!(store(DataFormat::Double, v, 0, &mut st).0, [0x4004_0000, 0, 0]);
        assert_eq!(store(DataFormat::Extended, v, 0, &mut st).0, [0x4000_0000, 0xA000_0000, 0]);

        let mut st = FloatStatus::new();
        let (image, extra) = store(DataFormat::Byte, FloatX80::from_f64(1000.0), 0, &mut st);
        assert_eq!(image[0], 0x7F);
        assert_eq!(extra, EXC_OPERR);
    }

    #[test]
    fn sizes() {
        assert_eq!(DataFormat::from_bits(6).size(), 1);
        assert_eq!(DataFormat::from_bits(5).size(), 8);
        assert_eq!(DataFormat::from_bits(3).size(), 12);
    }
}
