//! End-to-end FPU operations through the public API: operand load,
//! arithmetic, store, and condition evaluation.

use motorola_68881::{
    ACC_INEX, ACC_IOP, Command, DataFormat, EXC_INEX1, EXC_INEX2, EXC_OPERR, FPSR_CC_I,
    FPSR_CC_MASK, FPSR_CC_NAN, Fpu, FpuModel, Operation,
};
use softfloat::FloatX80;

fn command(opmode: u8, model: FpuModel) -> Command {
    Command::decode(opmode, model == FpuModel::Mc68040)
        .unwrap_or_else(|| panic!("opmode {opmode:#04X} should decode"))
}

#[test]
fn add_opposite_infinities_gives_default_nan() {
    let mut fpu = Fpu::new(FpuModel::Mc68881);
    fpu.begin_instruction(0x2000);
    let pos_inf = fpu.load_operand(DataFormat::Single, [0x7F80_0000, 0, 0]);
    fpu.execute(command(0x00, FpuModel::Mc68881), pos_inf, 0);
    fpu.begin_instruction(0x2004);
    let neg_inf = fpu.load_operand(DataFormat::Double, [0xFFF0_0000, 0, 0]);
    fpu.execute(command(0x22, FpuModel::Mc68881), neg_inf, 0);

    assert_eq!(fpu.fp[0], FloatX80::default_nan());
    assert_eq!(fpu.fpsr & FPSR_CC_MASK, FPSR_CC_NAN);
    assert_ne!(fpu.fpsr & EXC_OPERR, 0);
    assert_ne!(fpu.fpsr & ACC_IOP, 0);
}

#[test]
fn infinity_plus_finite_raises_nothing() {
    let mut fpu = Fpu::new(FpuModel::Mc68882);
    fpu.fp[1] = FloatX80::infinity(false);
    fpu.begin_instruction(0);
    let five = fpu.load_operand(DataFormat::Long, [5, 0, 0]);
    fpu.execute(command(0x22, FpuModel::Mc68882), five, 1);
    assert_eq!(fpu.fp[1], FloatX80::infinity(false));
    assert_eq!(fpu.fpsr, FPSR_CC_I);
}

#[test]
fn packed_decimal_source_keeps_inex1() {
    let mut fpu = Fpu::new(FpuModel::Mc68881);
    fpu.begin_instruction(0);
    // 1.0E-1, not representable in binary.
    let tenth = fpu.load_operand(DataFormat::Packed, [0x4001_0001, 0, 0]);
    fpu.execute(command(0x00, FpuModel::Mc68881), tenth, 2);
    assert_eq!(fpu.fp[2], FloatX80::new(0x3FFB, 0xCCCC_CCCC_CCCC_CCCD));
    assert_ne!(fpu.fpsr & EXC_INEX1, 0);
    assert_ne!(fpu.fpsr & ACC_INEX, 0);
}

#[test]
fn store_long_rounds_with_fpcr_mode() {
    let mut fpu = Fpu::new(FpuModel::Mc68881);
    fpu.fp[0] = FloatX80::from_f64(-2.5);
    fpu.begin_instruction(0);
    assert_eq!(fpu.store_operand(DataFormat::Long, 0, 0)[0], (-2i32) as u32);
    assert_ne!(fpu.fpsr & EXC_INEX2, 0);

    // Round toward minus infinity.
    fpu.set_fpcr(0x20);
    fpu.begin_instruction(0);
    assert_eq!(fpu.store_operand(DataFormat::Long, 0, 0)[0], (-3i32) as u32);
}

#[test]
fn store_packed_with_k_factor() {
    let mut fpu = Fpu::new(FpuModel::Mc68882);
    fpu.fp[3] = FloatX80::from_f64(1234.5);
    fpu.begin_instruction(0);
    let image = fpu.store_operand(DataFormat::Packed, 3, 17);
    assert_eq!(image, [0x0003_0001, 0x2345_0000, 0]);
}

#[test]
fn single_rounding_forms_only_on_68040() {
    assert!(Command::decode(0x60, false).is_none());
    let mut fpu = Fpu::new(FpuModel::Mc68040);
    fpu.fp[0] = FloatX80::ONE;
    let three = FloatX80::from_f64(3.0);
    fpu.execute(command(0x60, FpuModel::Mc68040), three, 0);
    assert_eq!(fpu.fp[0], FloatX80::new(0x3FFD, 0xAAAA_AB00_0000_0000));

    let plain = command(0x20, FpuModel::Mc68040);
    assert_eq!(plain.op, Operation::Div);
    assert!(plain.precision.is_none());
}

#[test]
fn conditions_follow_compare() {
    let mut fpu = Fpu::new(FpuModel::Mc68881);
    fpu.fp[0] = FloatX80::from_f64(2.0);
    fpu.execute(command(0x38, FpuModel::Mc68881), FloatX80::from_f64(1.0), 0);
    assert_eq!(fpu.test_condition(0x02), Some(true)); // OGT
    assert_eq!(fpu.test_condition(0x01), Some(false)); // EQ
    assert_eq!(fpu.test_condition(0x3F), None);
}
