//! FPU programmer-visible state and instruction-level operations.

use softfloat::{
    DIVIDE_BY_ZERO, FloatStatus, FloatX80, INEXACT, INVALID, OVERFLOW, Precision, RoundingMode,
    UNDERFLOW,
};

use crate::arith::{Command, Operation};
use crate::conditions;
use crate::constants;
use crate::formats::{self, DataFormat};
use crate::registers::{
    EXC_BSUN, EXC_DZ, EXC_INEX2, EXC_MASK, EXC_OPERR, EXC_OVFL, EXC_SNAN, EXC_UNFL, FPCR_MASK,
    FPCR_MODE_SHIFT, FPCR_PREC_SHIFT, FPSR_CC_I, FPSR_CC_MASK, FPSR_CC_N, FPSR_CC_NAN, FPSR_CC_Z,
    FPSR_MASK, FPSR_QUOTIENT_MASK, accrue,
};

/// Which FPU implementation is attached. Affects FSAVE frame layout and
/// the instruction subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FpuModel {
    Mc68881,
    Mc68882,
    /// The on-chip FPU of the 68040.
    Mc68040,
}

/// FPU register file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fpu {
    pub model: FpuModel,
    /// FP0-FP7.
    pub fp: [FloatX80; 8],
    pub fpcr: u32,
    pub fpsr: u32,
    /// Address of the last FPU instruction that could raise an exception.
    pub fpiar: u32,
    /// Set by reset and by restoring a null frame; FSAVE then writes a
    /// null frame.
    pub just_reset: bool,
}

impl Fpu {
    #[must_use]
    pub fn new(model: FpuModel) -> Self {
        let mut fpu = Self {
            model,
            fp: [FloatX80::default(); 8],
            fpcr: 0,
            fpsr: 0,
            fpiar: 0,
            just_reset: true,
        };
        fpu.reset();
        fpu
    }

    /// Hardware reset: data registers become non-signalling NaNs and the
    /// control registers clear.
    pub fn reset(&mut self) {
        self.fp = [FloatX80::default_nan(); 8];
        self.fpcr = 0;
        self.fpsr = 0;
        self.fpiar = 0;
        self.just_reset = true;
    }

    /// Rounding environment described by FPCR.
    #[must_use]
    pub fn status(&self) -> FloatStatus {
        FloatStatus::new()
            .with_rounding(RoundingMode::from_fpcr_bits(self.fpcr >> FPCR_MODE_SHIFT))
            .with_precision(Precision::from_fpcr_bits(self.fpcr >> FPCR_PREC_SHIFT))
    }

    pub fn set_fpcr(&mut self, value: u32) {
        self.fpcr = value & FPCR_MASK;
    }

    pub fn set_fpsr(&mut self, value: u32) {
        self.fpsr = value & FPSR_MASK;
    }

    /// Start an instruction that reports exceptions: clears the exception
    /// status byte and records the instruction address.
    pub fn begin_instruction(&mut self, pc: u32) {
        self.fpsr &= !EXC_MASK;
        self.fpiar = pc;
        self.just_reset = false;
    }

    /// Set exception status bits and fold them into the accrued byte.
    pub fn raise(&mut self, exc: u32) {
        self.fpsr |= (exc & EXC_MASK) | accrue(exc);
    }

    /// Map softfloat flags to FPSR exception bits. An invalid operation
    /// caused by a signalling NaN operand is SNAN rather than OPERR.
    fn raise_flags(&mut self, flags: u8, snan_operand: bool) {
        let mut exc = 0;
        if flags & INVALID != 0 {
            exc |= if snan_operand { EXC_SNAN } else { EXC_OPERR };
        }
        if flags & DIVIDE_BY_ZERO != 0 {
            exc |= EXC_DZ;
        }
        if flags & OVERFLOW != 0 {
            exc |= EXC_OVFL;
        }
        if flags & UNDERFLOW != 0 {
            exc |= EXC_UNFL;
        }
        if flags & INEXACT != 0 {
            exc |= EXC_INEX2;
        }
        self.raise(exc);
    }

    /// Set N, Z, I and NaN from a result.
    pub fn set_condition_codes(&mut self, value: FloatX80) {
        let mut cc = 0;
        if value.sign() {
            cc |= FPSR_CC_N;
        }
        if value.is_nan() {
            cc |= FPSR_CC_NAN;
        } else if value.is_infinity() {
            cc |= FPSR_CC_I;
        } else if value.is_zero() {
            cc |= FPSR_CC_Z;
        }
        self.fpsr = (self.fpsr & !FPSR_CC_MASK) | cc;
    }

    /// Evaluate a conditional predicate, raising BSUN for signalling
    /// predicates on unordered results. `None` for reserved predicates.
    pub fn test_condition(&mut self, predicate: u8) -> Option<bool> {
        let result = conditions::evaluate(predicate, self.fpsr)?;
        if conditions::sets_bsun(predicate, self.fpsr) {
            self.raise(EXC_BSUN);
        }
        Some(result)
    }

    /// Convert an operand image for use as an arithmetic source.
    pub fn load_operand(&mut self, format: DataFormat, image: [u32; 3]) -> FloatX80 {
        let (value, exc) = formats::load(format, image, &self.status());
        self.raise(exc);
        value
    }

    /// FMOVE FPn,<ea>: convert a register to a memory image.
    pub fn store_operand(&mut self, format: DataFormat, reg: usize, k_factor: i8) -> [u32; 3] {
        let value = self.fp[reg & 7];
        let mut st = self.status();
        let (image, exc) = formats::store(format, value, k_factor, &mut st);
        self.raise_flags(st.flags, value.is_signaling_nan());
        self.raise(exc);
        image
    }

    /// FMOVECR: load a ROM constant into `reg`.
    pub fn move_constant(&mut self, offset: u8, reg: usize) {
        let (value, inexact) = constants::lookup(offset);
        let mut st = self.status();
        let result = value.round_to_precision(&mut st);
        self.raise_flags(st.flags, false);
        if inexact {
            self.raise(EXC_INEX2);
        }
        self.fp[reg & 7] = result;
        self.set_condition_codes(result);
    }

    /// Execute an arithmetic command with `src` as source operand and
    /// FP`dst` as destination.
    pub fn execute(&mut self, cmd: Command, src: FloatX80, dst: usize) {
        let dst = dst & 7;
        let mut st = self.status();
        if let Some(precision) = cmd.precision {
            st.precision = precision;
        }
        let d = self.fp[dst];
        let snan = src.is_signaling_nan() || (cmd.op.is_dyadic() && d.is_signaling_nan());

        log::trace!("fpu {:?} src={src:?} fp{dst}={d:?}", cmd.op);

        let result = match cmd.op {
            Operation::Move => src.round_to_precision(&mut st),
            Operation::Int => src.round_to_int(&mut st).round_to_precision(&mut st),
            Operation::IntRz => src.trunc_to_int(&mut st).round_to_precision(&mut st),
            Operation::Sqrt => src.sqrt(&mut st),
            Operation::Abs => sign_op(src, &mut st, FloatX80::abs),
            Operation::Neg => sign_op(src, &mut st, FloatX80::negate),
            Operation::GetExp => src.get_exp(&mut st),
            Operation::GetMan => src.get_man(&mut st),
            Operation::Div => d.div(src, &mut st),
            Operation::Add => d.add(src, &mut st),
            Operation::Mul => d.mul(src, &mut st),
            Operation::Sub => d.sub(src, &mut st),
            Operation::SglDiv => {
                st.precision = Precision::Single;
                d.div(src, &mut st)
            }
            Operation::SglMul => {
                st.precision = Precision::Single;
                d.mul(src, &mut st)
            }
            Operation::Mod | Operation::Rem => {
                let (r, quotient, negative) = if cmd.op == Operation::Mod {
                    d.modulo(src, &mut st)
                } else {
                    d.remainder(src, &mut st)
                };
                let byte = (quotient as u32 & 0x7F) | (u32::from(negative) << 7);
                self.fpsr = (self.fpsr & !FPSR_QUOTIENT_MASK) | (byte << 16);
                r
            }
            Operation::Scale => scale(d, src, &mut st),
            Operation::Cmp => {
                self.compare(d, src, &mut st);
                self.raise_flags(st.flags, snan);
                return;
            }
            Operation::Tst => {
                if snan {
                    st.raise(INVALID);
                }
                self.raise_flags(st.flags, snan);
                self.set_condition_codes(src);
                return;
            }
            Operation::SinCos(cos_reg) => {
                let sin = transcendental(Operation::Sin, src, &mut st);
                let cos = transcendental(Operation::Cos, src, &mut st);
                self.fp[usize::from(cos_reg & 7)] = cos;
                sin
            }
            op => transcendental(op, src, &mut st),
        };

        self.raise_flags(st.flags, snan);
        self.fp[dst] = result;
        self.set_condition_codes(result);
    }

    /// FCMP: condition codes of `dst - src` without storing it.
    fn compare(&mut self, dst: FloatX80, src: FloatX80, st: &mut FloatStatus) {
        let mut cc = 0;
        match dst.compare(src, st) {
            None => cc |= FPSR_CC_NAN,
            Some(std::cmp::Ordering::Less) => cc |= FPSR_CC_N,
            Some(std::cmp::Ordering::Equal) => {
                cc |= FPSR_CC_Z;
                if dst.sign() && (dst.is_infinity() || dst.is_zero() && src.sign()) {
                    cc |= FPSR_CC_N;
                }
            }
            Some(std::cmp::Ordering::Greater) => {}
        }
        self.fpsr = (self.fpsr & !FPSR_CC_MASK) | cc;
    }
}

/// FABS/FNEG: sign manipulation, then rounding to the FPCR precision.
fn sign_op(src: FloatX80, st: &mut FloatStatus, f: fn(FloatX80) -> FloatX80) -> FloatX80 {
    if src.is_nan() {
        return src.round_to_precision(st);
    }
    f(src).round_to_precision(st)
}

/// FSCALE: multiply `dst` by two to the integer part of `src`.
fn scale(dst: FloatX80, src: FloatX80, st: &mut FloatStatus) -> FloatX80 {
    if src.is_nan() || dst.is_nan() {
        return dst.add(src, st);
    }
    if src.is_infinity() {
        st.raise(INVALID);
        return FloatX80::default_nan();
    }
    let mut scratch = FloatStatus::new();
    let n = src.to_i32_round_to_zero(&mut scratch);
    dst.scale(n, st)
}

/// Transcendental operations through host double precision. Results are
/// correctly signed and flagged but not bit-exact with the 68881's own
/// algorithms.
fn transcendental(op: Operation, src: FloatX80, st: &mut FloatStatus) -> FloatX80 {
    if src.is_nan() {
        return src.add(src, st);
    }
    let x = src.to_f64();

    let domain_error = match op {
        Operation::Sin | Operation::Cos | Operation::Tan => x.is_infinite(),
        Operation::Asin | Operation::Acos => x.abs() > 1.0,
        Operation::Atanh => x.abs() > 1.0,
        Operation::LogN | Operation::Log10 | Operation::Log2 => x < 0.0 && !src.is_zero(),
        Operation::LogNp1 => x < -1.0,
        _ => false,
    };
    if domain_error {
        st.raise(INVALID);
        return FloatX80::default_nan();
    }

    let pole = match op {
        Operation::LogN | Operation::Log10 | Operation::Log2 => src.is_zero(),
        Operation::LogNp1 => x == -1.0,
        Operation::Atanh => x.abs() == 1.0,
        _ => false,
    };
    if pole {
        st.raise(DIVIDE_BY_ZERO);
        let negative = !matches!(op, Operation::Atanh) || x < 0.0;
        return FloatX80::infinity(negative);
    }

    let y = match op {
        Operation::Sinh => x.sinh(),
        Operation::Cosh => x.cosh(),
        Operation::Tanh => x.tanh(),
        Operation::LogNp1 => x.ln_1p(),
        Operation::EtoxM1 => x.exp_m1(),
        Operation::Atan => x.atan(),
        Operation::Asin => x.asin(),
        Operation::Acos => x.acos(),
        Operation::Atanh => x.atanh(),
        Operation::Sin => x.sin(),
        Operation::Cos => x.cos(),
        Operation::Tan => x.tan(),
        Operation::Etox => x.exp(),
        Operation::TwoToX => x.exp2(),
        Operation::TenToX => 10f64.powf(x),
        Operation::LogN => x.ln(),
        Operation::Log10 => x.log10(),
        Operation::Log2 => x.log2(),
        _ => x,
    };

    if y.is_nan() {
        st.raise(INVALID);
        return FloatX80::default_nan();
    }
    if y.is_infinite() && x.is_finite() {
        st.raise(OVERFLOW | INEXACT);
    } else if !(x == 0.0 || (x == x.trunc() && y == y.trunc()) || x.is_infinite()) {
        st.raise(INEXACT);
    }
    FloatX80::from_f64(y).round_to_precision(st)
}

impl Default for Fpu {
    fn default() -> Self {
        Self::new(FpuModel::Mc68881)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{ACC_DZ, ACC_INEX, ACC_IOP};

    fn x(v: f64) -> FloatX80 {
        FloatX80::from_f64(v)
    }

    fn cmd(op: Operation) -> Command {
        Command { op, precision: None }
    }

    #[test]
    fn reset_state() {
        let fpu = Fpu::new(FpuModel::Mc68882);
        assert!(fpu.fp.iter().all(|r| r.is_nan() && !r.is_signaling_nan()));
        assert_eq!((fpu.fpcr, fpu.fpsr, fpu.fpiar), (0, 0, 0));
        assert!(fpu.just_reset);
    }

    #[test]
    fn infinity_minus_infinity_is_default_nan() {
        let mut fpu = Fpu::default();
        fpu.fp[0] = FloatX80::infinity(false);
        fpu.begin_instruction(0x1000);
        fpu.execute(cmd(Operation::Add), FloatX80::infinity(true), 0);
        assert_eq!(fpu.fp[0], FloatX80::default_nan());
        assert_ne!(fpu.fpsr & FPSR_CC_NAN, 0);
        assert_ne!(fpu.fpsr & EXC_OPERR, 0);
        assert_ne!(fpu.fpsr & ACC_IOP, 0);
        assert_eq!(fpu.fpiar, 0x1000);
    }

    #[test]
    fn infinity_plus_finite_is_unchanged_and_silent() {
        let mut fpu = Fpu::default();
        fpu.fp[1] = FloatX80::infinity(false);
        fpu.begin_instruction(0);
        fpu.execute(cmd(Operation::Add), x(42.0), 1);
        assert_eq!(fpu.fp[1], FloatX80::infinity(false));
        assert_eq!(fpu.fpsr & !FPSR_CC_MASK, 0);
        assert_eq!(fpu.fpsr & FPSR_CC_MASK, FPSR_CC_I);
    }

    #[test]
    fn divide_by_zero_accrues() {
        let mut fpu = Fpu::default();
        fpu.fp[2] = x(-1.0);
        fpu.execute(cmd(Operation::Div), x(0.0), 2);
        assert_eq!(fpu.fp[2], FloatX80::infinity(true));
        assert_ne!(fpu.fpsr & EXC_DZ, 0);
        assert_ne!(fpu.fpsr & ACC_DZ, 0);
        assert_eq!(fpu.fpsr & FPSR_CC_MASK, FPSR_CC_N | FPSR_CC_I);
    }

    #[test]
    fn exception_byte_clears_but_accrued_sticks() {
        let mut fpu = Fpu::default();
        fpu.fp[0] = x(1.0);
        fpu.execute(cmd(Operation::Div), x(3.0), 0);
        assert_ne!(fpu.fpsr & EXC_INEX2, 0);
        fpu.begin_instruction(0);
        fpu.execute(cmd(Operation::Add), x(0.0), 0);
        assert_eq!(fpu.fpsr & EXC_INEX2, 0);
        assert_ne!(fpu.fpsr & ACC_INEX, 0);
    }

    #[test]
    fn precision_control_from_fpcr() {
        let mut fpu = Fpu::default();
        fpu.set_fpcr(1 << FPCR_PREC_SHIFT);
        fpu.fp[0] = x(1.0);
        fpu.execute(cmd(Operation::Div), x(3.0), 0);
        assert_eq!(fpu.fp[0], FloatX80::new(0x3FFD, 0xAAAA_AB00_0000_0000));
    }

    #[test]
    fn modulo_sets_quotient_byte() {
        let mut fpu = Fpu::default();
        fpu.fp[3] = x(-7.0);
        fpu.execute(cmd(Operation::Mod), x(2.0), 3);
        assert_eq!(fpu.fp[3], x(-1.0));
        assert_eq!((fpu.fpsr & FPSR_QUOTIENT_MASK) >> 16, 0x83);
    }

    #[test]
    fn compare_sets_codes_only() {
        let mut fpu = Fpu::default();
        fpu.fp[0] = x(1.0);
        fpu.execute(cmd(Operation::Cmp), x(2.0), 0);
        assert_eq!(fpu.fp[0], x(1.0));
        assert_eq!(fpu.fpsr & FPSR_CC_MASK, FPSR_CC_N);
        assert_eq!(fpu.test_condition(0x04), Some(true)); // OLT
        fpu.execute(cmd(Operation::Cmp), x(1.0), 0);
        assert_eq!(fpu.fpsr & FPSR_CC_MASK, FPSR_CC_Z);
    }

    #[test]
    fn signalling_nan_operand_reports_snan() {
        let mut fpu = Fpu::default();
        fpu.fp[0] = x(1.0);
        let snan = FloatX80::new(0x7FFF, 0x8000_0000_0000_0001);
        fpu.execute(cmd(Operation::Mul), snan, 0);
        assert!(fpu.fp[0].is_nan() && !fpu.fp[0].is_signaling_nan());
        assert_ne!(fpu.fpsr & EXC_SNAN, 0);
        assert_eq!(fpu.fpsr & EXC_OPERR, 0);
    }

    #[test]
    fn bsun_on_signalling_predicate_with_nan() {
        let mut fpu = Fpu::default();
        fpu.set_condition_codes(FloatX80::default_nan());
        assert_eq!(fpu.test_condition(0x12), Some(false));
        assert_ne!(fpu.fpsr & EXC_BSUN, 0);
        assert_ne!(fpu.fpsr & ACC_IOP, 0);
    }

    #[test]
    fn sincos_writes_both_registers() {
        let mut fpu = Fpu::default();
        fpu.execute(cmd(Operation::SinCos(5)), x(0.0), 4);
        assert_eq!(fpu.fp[4], x(0.0));
        assert_eq!(fpu.fp[5], x(1.0));
        assert_eq!(fpu.fpsr & EXC_MASK, 0);
    }

    #[test]
    fn logarithm_of_zero_is_a_pole() {
        let mut fpu = Fpu::default();
        fpu.execute(cmd(Operation::LogN), x(0.0), 0);
        assert_eq!(fpu.fp[0], FloatX80::infinity(true));
        assert_ne!(fpu.fpsr & EXC_DZ, 0);
        fpu.begin_instruction(0);
        fpu.execute(cmd(Operation::Sqrt), x(-4.0), 1);
        assert!(fpu.fp[1].is_nan());
        assert_ne!(fpu.fpsr & EXC_OPERR, 0);
    }

    #[test]
    fn constant_rom_loads_and_flags() {
        let mut fpu = Fpu::default();
        fpu.move_constant(0x32, 7);
        assert_eq!(fpu.fp[7], FloatX80::ONE);
        assert_eq!(fpu.fpsr & EXC_INEX2, 0);
        fpu.move_constant(0x00, 6);
        assert_ne!(fpu.fpsr & EXC_INEX2, 0);
    }

    #[test]
    fn scale_and_getexp() {
        let mut fpu = Fpu::default();
        fpu.fp[0] = x(3.0);
        fpu.execute(cmd(Operation::Scale), x(2.9), 0);
        assert_eq!(fpu.fp[0], x(12.0));
        fpu.execute(cmd(Operation::GetExp), x(1024.0), 1);
        assert_eq!(fpu.fp[1], x(10.0));
    }
}
