//! Arithmetic command decoding (command word bits 6-0).

use softfloat::Precision;

/// An FPU arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Move,
    Int,
    Sinh,
    IntRz,
    Sqrt,
    LogNp1,
    EtoxM1,
    Tanh,
    Atan,
    Asin,
    Atanh,
    Sin,
    Tan,
    Etox,
    TwoToX,
    TenToX,
    LogN,
    Log10,
    Log2,
    Abs,
    Cosh,
    Neg,
    Acos,
    Cos,
    GetExp,
    GetMan,
    Div,
    Mod,
    Add,
    Mul,
    SglDiv,
    Rem,
    Scale,
    SglMul,
    Sub,
    /// Sine to the destination, cosine to the given register.
    SinCos(u8),
    Cmp,
    Tst,
}

impl Operation {
    /// True if the operation reads the destination register as an operand.
    #[must_use]
    pub const fn is_dyadic(self) -> bool {
        matches!(
            self,
            Self::Div
                | Self::Mod
                | Self::Add
                | Self::Mul
                | Self::SglDiv
                | Self::Rem
                | Self::Scale
                | Self::SglMul
                | Self::Sub
                | Self::Cmp
        )
    }

    /// True if the operation goes through the host math library.
    #[must_use]
    pub const fn is_transcendental(self) -> bool {
        matches!(
            self,
            Self::Sinh
                | Self::LogNp1
                | Self::EtoxM1
                | Self::Tanh
                | Self::Atan
                | Self::Asin
                | Self::Atanh
                | Self::Sin
                | Self::Tan
                | Self::Etox
                | Self::TwoToX
                | Self::TenToX
                | Self::LogN
                | Self::Log10
                | Self::Log2
                | Self::Cosh
                | Self::Acos
                | Self::Cos
        )
    }
}

/// A decoded arithmetic command: the operation plus an optional rounding
/// precision override (the 68040 FSxxx/FDxxx forms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub op: Operation,
    pub precision: Option<Precision>,
}

impl Command {
    /// Decode the opmode field. `rounding_variants` enables the 68040
    /// single/double rounding forms; without it they are undefined.
    #[must_use]
    pub fn decode(opmode: u8, rounding_variants: bool) -> Option<Self> {
        let plain = |op| Some(Self { op, precision: None });
        let op = match opmode & 0x7F {
            0x00 => Operation::Move,
            0x01 => Operation::Int,
            0x02 => Operation::Sinh,
            0x03 => Operation::IntRz,
            0x04 => Operation::Sqrt,
            0x06 => Operation::LogNp1,
            0x08 => Operation::EtoxM1,
            0x09 => Operation::Tanh,
            0x0A => Operation::Atan,
            0x0C => Operation::Asin,
            0x0D => Operation::Atanh,
            0x0E => Operation::Sin,
            0x0F => Operation::Tan,
            0x10 => Operation::Etox,
            0x11 => Operation::TwoToX,
            0x12 => Operation::TenToX,
            0x14 => Operation::LogN,
            0x15 => Operation::Log10,
            0x16 => Operation::Log2,
            0x18 => Operation::Abs,
            0x19 => Operation::Cosh,
            0x1A => Operation::Neg,
            0x1C => Operation::Acos,
            0x1D => Operation::Cos,
            0x1E => Operation::GetExp,
            0x1F => Operation::GetMan,
            0x20 => Operation::Div,
            0x21 => Operation::Mod,
            0x22 => Operation::Add,
            0x23 => Operation::Mul,
            0x24 => Operation::SglDiv,
            0x25 => Operation::Rem,
            0x26 => Operation::Scale,
            0x27 => Operation::SglMul,
            0x28 => Operation::Sub,
            0x30..=0x37 => Operation::SinCos(opmode & 7),
            0x38 => Operation::Cmp,
            0x3A => Operation::Tst,
            other if rounding_variants => return Self::decode_rounding(other),
            _ => return None,
        };
        plain(op)
    }

    fn decode_rounding(opmode: u8) -> Option<Self> {
        let (op, precision) = match opmode {
            0x40 => (Operation::Move, Precision::Single),
            0x41 => (Operation::Sqrt, Precision::Single),
            0x44 => (Operation::Move, Precision::Double),
            0x45 => (Operation::Sqrt, Precision::Double),
            0x58 => (Operation::Abs, Precision::Single),
            0x5A => (Operation::Neg, Precision::Single),
            0x5C => (Operation::Abs, Precision::Double),
            0x5E => (Operation::Neg, Precision::Double),
            0x60 => (Operation::Div, Precision::Single),
            0x62 => (Operation::Add, Precision::Single),
            0x63 => (Operation::Mul, Precision::Single),
            0x64 => (Operation::Div, Precision::Double),
            0x66 => (Operation::Add, Precision::Double),
            0x67 => (Operation::Mul, Precision::Double),
            0x68 => (Operation::Sub, Precision::Single),
            0x6C => (Operation::Sub, Precision::Double),
            _ => return None,
        };
        Some(Self {
            op,
            precision: Some(precision),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_core_opmodes() {
        assert_eq!(Command::decode(0x22, false).map(|c| c.op), Some(Operation::Add));
        assert_eq!(Command::decode(0x35, false).map(|c| c.op), Some(Operation::SinCos(5)));
        assert_eq!(Command::decode(0x05, false), None);
        assert_eq!(Command::decode(0x3B, false), None);
    }

    #[test]
    fn rounding_forms_need_68040() {
        assert_eq!(Command::decode(0x62, false), None);
        assert_eq!(
            Command::decode(0x62, true),
            Some(Command {
                op: Operation::Add,
                precision: Some(Precision::Single)
            })
        );
    }
}
