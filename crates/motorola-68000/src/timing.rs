//! Cycle accounting.
//!
//! Counts are keyed by decoded instruction class and effective address
//! mode. The 68000/68010 table follows the published 68000 instruction
//! timings for the register forms, with memory operand costs added as
//! operands are resolved. The 68020 and later have caches and overlapped
//! pipelines that make exact counts depend on alignment and cache state;
//! they use a flat best-case table.
//!
//! DIVU/DIVS on the 68000 use Jorge Cwik's restoring division timing.

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::decode::Instruction;
use crate::exceptions::vector;
use crate::model::CpuModel;

/// Interrupt acknowledge and exception processing.
pub(crate) const INTERRUPT_CYCLES: u32 = 44;
/// One idle bus cycle while stopped.
pub(crate) const STOPPED_CYCLES: u32 = 4;

const fn is_68000_class(model: CpuModel) -> bool {
    matches!(model, CpuModel::M68000 | CpuModel::M68010)
}

/// Exception processing cycles, excluding the instruction that raised it.
pub(crate) fn exception_cycles(model: CpuModel, vec: u8) -> u32 {
    if is_68000_class(model) {
        match vec {
            vector::BUS_ERROR | vector::ADDRESS_ERROR => 50,
            vector::ZERO_DIVIDE => 38,
            vector::CHK => 40,
            _ => 34,
        }
    } else {
        match vec {
            vector::BUS_ERROR | vector::ADDRESS_ERROR => 50,
            _ => 20,
        }
    }
}

/// Cost of resolving a memory operand.
pub(crate) fn ea_cycles(model: CpuModel, mode: AddrMode, size: Size) -> u32 {
    let long = size == Size::Long;
    if !is_68000_class(model) {
        return match mode {
            AddrMode::DataReg(_) | AddrMode::AddrReg(_) => 0,
            AddrMode::AddrIndIndex(_) | AddrMode::PcIndex => 4,
            _ => 2,
        };
    }
    let (word, extra) = match mode {
        AddrMode::DataReg(_) | AddrMode::AddrReg(_) => return 0,
        AddrMode::AddrInd(_) | AddrMode::AddrIndPostInc(_) | AddrMode::Immediate => (4, 4),
        AddrMode::AddrIndPreDec(_) => (6, 4),
        AddrMode::AddrIndDisp(_) | AddrMode::AbsShort | AddrMode::PcDisp => (8, 4),
        AddrMode::AddrIndIndex(_) | AddrMode::PcIndex => (10, 4),
        AddrMode::AbsLong => (12, 4),
    };
    if long { word + extra } else { word }
}

/// Base cycles for an instruction class, operands in registers.
pub(crate) fn base_cycles(model: CpuModel, instr: &Instruction) -> u32 {
    if !is_68000_class(model) {
        return match instr {
            Instruction::MulL { .. } => 43,
            Instruction::DivL { .. } => 90,
            Instruction::Mul { .. } => 27,
            Instruction::Div { signed: false, .. } => 44,
            Instruction::Div { signed: true, .. } => 56,
            Instruction::Rte | Instruction::Rtr => 20,
            Instruction::Rts | Instruction::Rtd => 10,
            Instruction::Jsr { .. } | Instruction::Bcc { cond: 1, .. } => 7,
            Instruction::Bcc { .. } | Instruction::DBcc { .. } | Instruction::Jmp { .. } => 6,
            Instruction::Cas { .. } | Instruction::Cas2 { .. } => 16,
            Instruction::BitField { .. } => 10,
            Instruction::MoveM { .. } | Instruction::Link { .. } | Instruction::Unlk { .. } => 8,
            Instruction::Bcd { .. } | Instruction::Pack { .. } => 6,
            Instruction::Reset => 518,
            _ => 2,
        };
    }
    match *instr {
        Instruction::Move { .. }
        | Instruction::MoveA { .. }
        | Instruction::MoveQ { .. }
        | Instruction::Swap { .. }
        | Instruction::Ext { .. }
        | Instruction::MoveUsp { .. }
        | Instruction::Tst { .. }
        | Instruction::Tas { .. }
        | Instruction::Lea { .. }
        | Instruction::Nop
        | Instruction::Stop
        | Instruction::TrapV
        | Instruction::Trap { .. }
        | Instruction::Illegal
        | Instruction::LineA
        | Instruction::LineF
        | Instruction::Bkpt => 4,
        Instruction::Alu { size: Size::Long, to_ea: false, .. } => 6,
        Instruction::Alu { size: Size::Long, .. } => 12,
        Instruction::Alu { to_ea: true, .. } => 8,
        Instruction::Alu { .. } | Instruction::Scc { .. } => 4,
        Instruction::AluA { op: crate::decode::AluOp::Cmp, .. } => 6,
        Instruction::AluA { .. } | Instruction::AluI { size: Size::Byte | Size::Word, .. } => 8,
        Instruction::AluI { .. } => 16,
        Instruction::AluQ { size: Size::Long, .. } | Instruction::AluQ { mode: AddrMode::AddrReg(_), .. } => 8,
        Instruction::AluQ { .. } => 4,
        Instruction::AluX { memory: true, size: Size::Long, .. } => 30,
        Instruction::AluX { memory: true, .. } => 18,
        Instruction::AluX { size: Size::Long, .. } => 8,
        Instruction::AluX { .. } | Instruction::Unary { .. } | Instruction::MoveFromSr { .. } => 6,
        Instruction::CmpM { size: Size::Long, .. } => 20,
        Instruction::CmpM { .. } | Instruction::Unlk { .. } => 12,
        Instruction::MoveToCcr { .. } | Instruction::MoveToSr { .. } | Instruction::Pea { .. } => 12,
        Instruction::ToCcr { .. } | Instruction::ToSr { .. } | Instruction::Rtr => 20,
        Instruction::Exg { .. } | Instruction::Nbcd { .. } => 6,
        Instruction::Bcd { memory: true, .. } => 18,
        Instruction::Bcd { .. } => 6,
        Instruction::Link { .. } | Instruction::Jsr { .. } | Instruction::Rts => 16,
        Instruction::Mul { .. } => 38,
        // Division time is added by the executor from the operands.
        Instruction::Div { .. } => 0,
        Instruction::Chk { .. } => 10,
        Instruction::MoveP { size: Size::Long, .. } => 24,
        Instruction::MoveP { .. } => 16,
        Instruction::MoveM { .. } => 8,
        Instruction::ShiftReg { size: Size::Long, .. } => 8,
        Instruction::ShiftReg { .. } => 6,
        Instruction::ShiftMem { .. } => 8,
        Instruction::Bit { .. } | Instruction::Jmp { .. } | Instruction::Bcc { .. } | Instruction::DBcc { .. } => 8,
        Instruction::Rte | Instruction::Rtd => 20,
        Instruction::Reset => 132,
        _ => 4,
    }
}

/// DIVU timing (68000), Jorge Cwik's restoring division algorithm.
pub(crate) fn divu_cycles(dividend: u32, divisor: u16) -> u32 {
    if (dividend >> 16) >= u32::from(divisor) {
        return 10;
    }

    let mut mcycles: u32 = 38;
    let hdivisor = u32::from(divisor) << 16;
    let mut dvd = dividend;

    for _ in 0..15 {
        let temp = dvd;
        dvd <<= 1;
        if temp & 0x8000_0000 != 0 {
            dvd = dvd.wrapping_sub(hdivisor);
        } else {
            mcycles += 2;
            if dvd >= hdivisor {
                dvd = dvd.wrapping_sub(hdivisor);
                mcycles -= 1;
            }
        }
    }
    mcycles * 2
}

/// DIVS timing (68000), Jorge Cwik's algorithm.
pub(crate) fn divs_cycles(dividend: i32, divisor: i16) -> u32 {
    let mut mcycles: u32 = 6;
    if dividend < 0 {
        mcycles += 1;
    }

    let abs_dividend = i64::from(dividend).unsigned_abs() as u32;
    let abs_divisor = i32::from(divisor).unsigned_abs() as u16;
    if (abs_dividend >> 16) >= u32::from(abs_divisor) {
        return (mcycles + 2) * 2;
    }

    let mut aquot = abs_dividend / u32::from(abs_divisor);
    mcycles += 55;
    if divisor >= 0 {
        if dividend >= 0 {
            mcycles -= 1;
        } else {
            mcycles += 1;
        }
    }
    // Each zero among the 15 quotient MSBs costs one more micro-cycle.
    for _ in 0..15 {
        if (aquot as i16) >= 0 {
            mcycles += 1;
        }
        aquot <<= 1;
    }
    mcycles * 2
}

/// MULU/MULS data-dependent cycles (68000): 2 per set bit of the source,
/// or per 01/10 pair for MULS.
pub(crate) fn mul_cycles(source: u16, signed: bool) -> u32 {
    let ones = if signed {
        let pairs = (source << 1) ^ source;
        pairs.count_ones()
    } else {
        source.count_ones()
    };
    2 * ones
}
