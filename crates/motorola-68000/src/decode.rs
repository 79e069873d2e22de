//! Opcode decoding.
//!
//! `decode` turns the first word of an instruction into an [`Instruction`]
//! value. Extension words are not looked at here; the executor fetches
//! them as it resolves operands. Encodings that the selected model does not
//! implement, or that combine an instruction with a forbidden addressing
//! mode, decode as [`Instruction::Illegal`].

use crate::addressing::AddrMode;
use crate::alu::Size;
use crate::model::CpuCapabilities;

/// Two-operand integer ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Eor,
    Cmp,
}

/// Single-operand read-modify-write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    NegX,
    Clr,
    Neg,
    Not,
}

/// Shift/rotate family (bits 4-3 of the register form).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftKind {
    /// ASL/ASR
    Arithmetic,
    /// LSL/LSR
    Logical,
    /// ROXL/ROXR
    RotateExtend,
    /// ROL/ROR
    Rotate,
}

impl ShiftKind {
    const fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::Arithmetic,
            1 => Self::Logical,
            2 => Self::RotateExtend,
            _ => Self::Rotate,
        }
    }
}

/// Shift count source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftCount {
    /// Count 1-8 encoded in the opcode.
    Immediate(u8),
    /// Count modulo 64 from a data register.
    Register(u8),
}

/// Single-bit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    Test,
    Change,
    Clear,
    Set,
}

impl BitOp {
    const fn from_bits(bits: u16) -> Self {
        match bits & 3 {
            0 => Self::Test,
            1 => Self::Change,
            2 => Self::Clear,
            _ => Self::Set,
        }
    }
}

/// Bit number source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitSource {
    /// Bit number in an extension word.
    Immediate,
    /// Bit number in a data register.
    Register(u8),
}

/// Bit field operation (68020+).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitFieldOp {
    Tst,
    Extu,
    Chg,
    Exts,
    Clr,
    Ffo,
    Set,
    Ins,
}

impl BitFieldOp {
    const fn from_bits(bits: u16) -> Self {
        match bits & 7 {
            0 => Self::Tst,
            1 => Self::Extu,
            2 => Self::Chg,
            3 => Self::Exts,
            4 => Self::Clr,
            5 => Self::Ffo,
            6 => Self::Set,
            _ => Self::Ins,
        }
    }

    /// True for the forms that write the field back.
    #[must_use]
    pub const fn modifies(self) -> bool {
        matches!(self, Self::Chg | Self::Clr | Self::Set | Self::Ins)
    }
}

/// A decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    // === Data movement ===
    Move { size: Size, src: AddrMode, dst: AddrMode },
    MoveA { size: Size, src: AddrMode, reg: u8 },
    MoveQ { reg: u8, data: i8 },
    MoveM { size: Size, to_memory: bool, mode: AddrMode },
    MoveP { size: Size, to_memory: bool, dreg: u8, areg: u8 },
    Lea { src: AddrMode, reg: u8 },
    Pea { src: AddrMode },
    /// Register numbers 0-15, 8-15 being A0-A7.
    Exg { rx: u8, ry: u8 },
    Swap { reg: u8 },
    /// EXT.W, EXT.L, or EXTB.L when `from` is byte and `size` long.
    Ext { reg: u8, from: Size, size: Size },
    Link { reg: u8, long: bool },
    Unlk { reg: u8 },
    MoveFromSr { dst: AddrMode },
    MoveFromCcr { dst: AddrMode },
    MoveToCcr { src: AddrMode },
    MoveToSr { src: AddrMode },
    MoveUsp { reg: u8, to_usp: bool },
    MoveC { to_control: bool },
    MoveS { size: Size, mode: AddrMode },
    Move16 { opcode: u16 },

    // === Integer arithmetic and logic ===
    /// `to_ea` selects `<ea> op Dn -> <ea>` over `<ea> op Dn -> Dn`.
    Alu { op: AluOp, size: Size, mode: AddrMode, reg: u8, to_ea: bool },
    AluA { op: AluOp, size: Size, src: AddrMode, reg: u8 },
    AluI { op: AluOp, size: Size, mode: AddrMode },
    AluQ { add: bool, size: Size, data: u8, mode: AddrMode },
    AluX { add: bool, size: Size, rx: u8, ry: u8, memory: bool },
    CmpM { size: Size, rx: u8, ry: u8 },
    ToCcr { op: AluOp },
    ToSr { op: AluOp },
    Unary { op: UnaryOp, size: Size, mode: AddrMode },
    Tst { size: Size, mode: AddrMode },
    Tas { mode: AddrMode },
    Mul { signed: bool, src: AddrMode, reg: u8 },
    Div { signed: bool, src: AddrMode, reg: u8 },
    MulL { src: AddrMode },
    DivL { src: AddrMode },
    Bcd { add: bool, rx: u8, ry: u8, memory: bool },
    Nbcd { mode: AddrMode },
    Pack { unpack: bool, rx: u8, ry: u8, memory: bool },
    Chk { size: Size, src: AddrMode, reg: u8 },
    Chk2 { size: Size, mode: AddrMode },
    Cas { size: Size, mode: AddrMode },
    Cas2 { size: Size },

    // === Shifts and bits ===
    ShiftReg { kind: ShiftKind, left: bool, size: Size, count: ShiftCount, reg: u8 },
    ShiftMem { kind: ShiftKind, left: bool, mode: AddrMode },
    Bit { op: BitOp, src: BitSource, mode: AddrMode },
    BitField { op: BitFieldOp, mode: AddrMode },

    // === Program control ===
    /// Condition 0 is BRA, 1 is BSR. Displacement 0 means a word follows,
    /// -1 a long (68020+).
    Bcc { cond: u8, disp: i8 },
    DBcc { cond: u8, reg: u8 },
    Scc { cond: u8, mode: AddrMode },
    TrapCc { cond: u8, operand: Option<Size> },
    Jmp { mode: AddrMode },
    Jsr { mode: AddrMode },
    Rts,
    Rtr,
    Rte,
    Rtd,
    Trap { vector: u8 },
    TrapV,
    Nop,
    Reset,
    Stop,
    Bkpt,
    Illegal,
    LineA,
    /// Coprocessor and other F-line opcodes.
    LineF,
    /// CINV/CPUSH (68040).
    CacheOp,
    /// PFLUSH/PTEST (68040).
    MmuOp,
}

/// Decode the opcode word for a CPU with `caps`.
#[must_use]
pub fn decode(op: u16, caps: &CpuCapabilities) -> Instruction {
    match op >> 12 {
        0x0 => decode_immediate_and_bits(op, caps),
        0x1..=0x3 => decode_move(op),
        0x4 => decode_misc(op, caps),
        0x5 => decode_quick_and_conditional(op, caps),
        0x6 => Instruction::Bcc {
            cond: ((op >> 8) & 0xF) as u8,
            disp: op as u8 as i8,
        },
        0x7 if op & 0x0100 == 0 => Instruction::MoveQ {
            reg: reg9(op),
            data: op as u8 as i8,
        },
        0x8 => decode_or_div(op, caps),
        0x9 | 0xD => decode_add_sub(op),
        0xA => Instruction::LineA,
        0xB => decode_cmp_eor(op),
        0xC => decode_and_mul(op),
        0xE => decode_shift(op, caps),
        0xF => decode_line_f(op, caps),
        _ => Instruction::Illegal,
    }
}

fn reg9(op: u16) -> u8 {
    ((op >> 9) & 7) as u8
}

fn reg0(op: u16) -> u8 {
    (op & 7) as u8
}

/// EA from the low six bits, accepted only if `valid` holds.
fn ea(op: u16, valid: impl Fn(&AddrMode) -> bool) -> Option<AddrMode> {
    AddrMode::from_opcode(op).filter(|m| valid(m))
}

// ================================================================
// 0000: immediate ops, bit ops, MOVEP, MOVES, CAS, CHK2
// ================================================================

fn decode_immediate_and_bits(op: u16, caps: &CpuCapabilities) -> Instruction {
    use Instruction::Illegal;

    match op {
        0x003C => return Instruction::ToCcr { op: AluOp::Or },
        0x007C => return Instruction::ToSr { op: AluOp::Or },
        0x023C => return Instruction::ToCcr { op: AluOp::And },
        0x027C => return Instruction::ToSr { op: AluOp::And },
        0x0A3C => return Instruction::ToCcr { op: AluOp::Eor },
        0x0A7C => return Instruction::ToSr { op: AluOp::Eor },
        0x0CFC if caps.cas => return Instruction::Cas2 { size: Size::Word },
        0x0EFC if caps.cas => return Instruction::Cas2 { size: Size::Long },
        _ => {}
    }

    // Dynamic bit operations and MOVEP: 0000 rrr1 ...
    if op & 0x0100 != 0 {
        if (op >> 3) & 7 == 1 {
            return Instruction::MoveP {
                size: if op & 0x40 != 0 { Size::Long } else { Size::Word },
                to_memory: op & 0x80 != 0,
                dreg: reg9(op),
                areg: reg0(op),
            };
        }
        let bit_op = BitOp::from_bits(op >> 6);
        let mode = if bit_op == BitOp::Test {
            ea(op, AddrMode::is_data)
        } else {
            ea(op, AddrMode::is_data_alterable)
        };
        return mode.map_or(Illegal, |mode| Instruction::Bit {
            op: bit_op,
            src: BitSource::Register(reg9(op)),
            mode,
        });
    }

    let size_bits = (op >> 6) & 3;
    match (op >> 9) & 7 {
        4 => {
            let bit_op = BitOp::from_bits(op >> 6);
            let mode = if bit_op == BitOp::Test {
                ea(op, |m| m.is_data() && *m != AddrMode::Immediate)
            } else {
                ea(op, AddrMode::is_data_alterable)
            };
            mode.map_or(Illegal, |mode| Instruction::Bit {
                op: bit_op,
                src: BitSource::Immediate,
                mode,
            })
        }
        7 if size_bits != 3 => {
            if !caps.movec {
                return Illegal;
            }
            match (Size::from_bits(size_bits), ea(op, AddrMode::is_memory_alterable)) {
                (Some(size), Some(mode)) => Instruction::MoveS { size, mode },
                _ => Illegal,
            }
        }
        0..=2 if size_bits == 3 => {
            if !caps.chk2 {
                return Illegal;
            }
            match (Size::from_bits(op >> 9), ea(op, AddrMode::is_control)) {
                (Some(size), Some(mode)) => Instruction::Chk2 { size, mode },
                _ => Illegal,
            }
        }
        5..=7 if size_bits == 3 => {
            if !caps.cas {
                return Illegal;
            }
            match (Size::from_cas_bits(op >> 9), ea(op, AddrMode::is_memory_alterable)) {
                (Some(size), Some(mode)) => Instruction::Cas { size, mode },
                _ => Illegal,
            }
        }
        n if size_bits != 3 => {
            let alu = match n {
                0 => AluOp::Or,
                1 => AluOp::And,
                2 => AluOp::Sub,
                3 => AluOp::Add,
                5 => AluOp::Eor,
                6 => AluOp::Cmp,
                _ => return Illegal,
            };
            let pc_relative_cmp = alu == AluOp::Cmp && caps.extended_addressing;
            let mode = ea(op, |m| {
                m.is_data_alterable() || (pc_relative_cmp && matches!(m, AddrMode::PcDisp | AddrMode::PcIndex))
            });
            match (Size::from_bits(size_bits), mode) {
                (Some(size), Some(mode)) => Instruction::AluI { op: alu, size, mode },
                _ => Illegal,
            }
        }
        _ => Illegal,
    }
}

// ================================================================
// 0001/0010/0011: MOVE, MOVEA
// ================================================================

fn decode_move(op: u16) -> Instruction {
    let Some(size) = Size::from_move_bits(op >> 12) else {
        return Instruction::Illegal;
    };
    let Some(src) = AddrMode::from_opcode(op) else {
        return Instruction::Illegal;
    };
    if size == Size::Byte && matches!(src, AddrMode::AddrReg(_)) {
        return Instruction::Illegal;
    }
    match AddrMode::decode(op >> 6, op >> 9) {
        Some(AddrMode::AddrReg(reg)) if size != Size::Byte => Instruction::MoveA { size, src, reg },
        Some(dst) if dst.is_data_alterable() => Instruction::Move { size, src, dst },
        _ => Instruction::Illegal,
    }
}

// ================================================================
// 0100: miscellaneous
// ================================================================

fn decode_misc(op: u16, caps: &CpuCapabilities) -> Instruction {
    use Instruction::Illegal;

    match op {
        0x4AFC => return Illegal,
        0x4E70 => return Instruction::Reset,
        0x4E71 => return Instruction::Nop,
        0x4E72 => return Instruction::Stop,
        0x4E73 => return Instruction::Rte,
        0x4E74 if caps.movec => return Instruction::Rtd,
        0x4E75 => return Instruction::Rts,
        0x4E76 => return Instruction::TrapV,
        0x4E77 => return Instruction::Rtr,
        0x4E7A | 0x4E7B if caps.movec => return Instruction::MoveC { to_control: op & 1 != 0 },
        _ => {}
    }

    // EXTB.L shares its bit pattern with LEA to a data register.
    if op & 0xFFF8 == 0x49C0 {
        return if caps.long_muldiv {
            Instruction::Ext { reg: reg0(op), from: Size::Byte, size: Size::Long }
        } else {
            Illegal
        };
    }

    let mode_bits = (op >> 3) & 7;
    let size_bits = (op >> 6) & 3;

    // CHK and LEA: 0100 rrr1 s0 / 0100 rrr1 11
    if op & 0x0100 != 0 {
        return match size_bits {
            3 => ea(op, AddrMode::is_control).map_or(Illegal, |src| Instruction::Lea { src, reg: reg9(op) }),
            2 => ea(op, AddrMode::is_data).map_or(Illegal, |src| Instruction::Chk {
                size: Size::Word,
                src,
                reg: reg9(op),
            }),
            0 if caps.chk2 => ea(op, AddrMode::is_data).map_or(Illegal, |src| Instruction::Chk {
                size: Size::Long,
                src,
                reg: reg9(op),
            }),
            _ => Illegal,
        };
    }

    let unary = |unary_op| match (Size::from_bits(size_bits), ea(op, AddrMode::is_data_alterable)) {
        (Some(size), Some(mode)) => Instruction::Unary { op: unary_op, size, mode },
        _ => Illegal,
    };

    match (op >> 8) & 0xF {
        0x0 if size_bits == 3 => {
            ea(op, AddrMode::is_data_alterable).map_or(Illegal, |dst| Instruction::MoveFromSr { dst })
        }
        0x0 => unary(UnaryOp::NegX),
        0x2 if size_bits == 3 => {
            if caps.movec {
                ea(op, AddrMode::is_data_alterable).map_or(Illegal, |dst| Instruction::MoveFromCcr { dst })
            } else {
                Illegal
            }
        }
        0x2 => unary(UnaryOp::Clr),
        0x4 if size_bits == 3 => ea(op, AddrMode::is_data).map_or(Illegal, |src| Instruction::MoveToCcr { src }),
        0x4 => unary(UnaryOp::Neg),
        0x6 if size_bits == 3 => ea(op, AddrMode::is_data).map_or(Illegal, |src| Instruction::MoveToSr { src }),
        0x6 => unary(UnaryOp::Not),
        0x8 => match size_bits {
            0 if mode_bits == 1 => {
                if caps.long_muldiv {
                    Instruction::Link { reg: reg0(op), long: true }
                } else {
                    Illegal
                }
            }
            0 => ea(op, AddrMode::is_data_alterable).map_or(Illegal, |mode| Instruction::Nbcd { mode }),
            1 if mode_bits == 0 => Instruction::Swap { reg: reg0(op) },
            1 if mode_bits == 1 => {
                if caps.movec {
                    Instruction::Bkpt
                } else {
                    Illegal
                }
            }
            1 => ea(op, AddrMode::is_control).map_or(Illegal, |src| Instruction::Pea { src }),
            _ => {
                let size = if size_bits == 2 { Size::Word } else { Size::Long };
                if mode_bits == 0 {
                    let from = if size == Size::Word { Size::Byte } else { Size::Word };
                    Instruction::Ext { reg: reg0(op), from, size }
                } else {
                    ea(op, |m| m.is_control_alterable() || matches!(m, AddrMode::AddrIndPreDec(_)))
                        .map_or(Illegal, |mode| Instruction::MoveM { size, to_memory: true, mode })
                }
            }
        },
        0xA if size_bits == 3 => ea(op, AddrMode::is_data_alterable).map_or(Illegal, |mode| Instruction::Tas { mode }),
        0xA => {
            let Some(size) = Size::from_bits(size_bits) else {
                return Illegal;
            };
            let mode = if caps.extended_addressing {
                ea(op, |m| !(size == Size::Byte && matches!(m, AddrMode::AddrReg(_))))
            } else {
                ea(op, AddrMode::is_data_alterable)
            };
            mode.map_or(Illegal, |mode| Instruction::Tst { size, mode })
        }
        0xC => match size_bits {
            0 if caps.long_muldiv => ea(op, AddrMode::is_data).map_or(Illegal, |src| Instruction::MulL { src }),
            1 if caps.long_muldiv => ea(op, AddrMode::is_data).map_or(Illegal, |src| Instruction::DivL { src }),
            2 | 3 => {
                let size = if size_bits == 2 { Size::Word } else { Size::Long };
                ea(op, |m| m.is_control() || matches!(m, AddrMode::AddrIndPostInc(_)))
                    .map_or(Illegal, |mode| Instruction::MoveM { size, to_memory: false, mode })
            }
            _ => Illegal,
        },
        0xE => match size_bits {
            1 => match mode_bits {
                0 | 1 => Instruction::Trap { vector: (op & 0xF) as u8 },
                2 => Instruction::Link { reg: reg0(op), long: false },
                3 => Instruction::Unlk { reg: reg0(op) },
                4 => Instruction::MoveUsp { reg: reg0(op), to_usp: true },
                5 => Instruction::MoveUsp { reg: reg0(op), to_usp: false },
                _ => Illegal,
            },
            2 => ea(op, AddrMode::is_control).map_or(Illegal, |mode| Instruction::Jsr { mode }),
            3 => ea(op, AddrMode::is_control).map_or(Illegal, |mode| Instruction::Jmp { mode }),
            _ => Illegal,
        },
        _ => Illegal,
    }
}

// ================================================================
// 0101: ADDQ, SUBQ, Scc, DBcc, TRAPcc
// ================================================================

fn decode_quick_and_conditional(op: u16, caps: &CpuCapabilities) -> Instruction {
    let cond = ((op >> 8) & 0xF) as u8;
    let mode_bits = (op >> 3) & 7;
    if let Some(size) = Size::from_bits(op >> 6) {
        let data = match reg9(op) {
            0 => 8,
            n => n,
        };
        let mode = ea(op, |m| {
            m.is_alterable() && !(size == Size::Byte && matches!(m, AddrMode::AddrReg(_)))
        });
        return mode.map_or(Instruction::Illegal, |mode| Instruction::AluQ {
            add: op & 0x0100 == 0,
            size,
            data,
            mode,
        });
    }
    if mode_bits == 1 {
        return Instruction::DBcc { cond, reg: reg0(op) };
    }
    if mode_bits == 7 && (2..=4).contains(&(op & 7)) {
        if !caps.long_muldiv {
            return Instruction::Illegal;
        }
        let operand = match op & 7 {
            2 => Some(Size::Word),
            3 => Some(Size::Long),
            _ => None,
        };
        return Instruction::TrapCc { cond, operand };
    }
    ea(op, AddrMode::is_data_alterable).map_or(Instruction::Illegal, |mode| Instruction::Scc { cond, mode })
}

// ================================================================
// 1000: OR, DIVU/DIVS, SBCD, PACK, UNPK
// ================================================================

fn decode_or_div(op: u16, caps: &CpuCapabilities) -> Instruction {
    let opmode = (op >> 6) & 7;
    match opmode {
        3 | 7 => ea(op, AddrMode::is_data).map_or(Instruction::Illegal, |src| Instruction::Div {
            signed: opmode == 7,
            src,
            reg: reg9(op),
        }),
        _ if op & 0x01F0 == 0x0100 => Instruction::Bcd {
            add: false,
            rx: reg9(op),
            ry: reg0(op),
            memory: op & 8 != 0,
        },
        _ if op & 0x01F0 == 0x0140 || op & 0x01F0 == 0x0180 => {
            if !caps.pack {
                return Instruction::Illegal;
            }
            Instruction::Pack {
                unpack: op & 0x01F0 == 0x0180,
                rx: reg9(op),
                ry: reg0(op),
                memory: op & 8 != 0,
            }
        }
        _ => decode_alu(op, AluOp::Or),
    }
}

/// Shared Dn/<ea> form of ADD, SUB, AND, OR (opmodes 0-2 and 4-6).
fn decode_alu(op: u16, alu: AluOp) -> Instruction {
    let opmode = (op >> 6) & 7;
    let Some(size) = Size::from_bits(opmode & 3) else {
        return Instruction::Illegal;
    };
    let to_ea = opmode >= 4;
    let logical = matches!(alu, AluOp::And | AluOp::Or);
    let mode = if to_ea {
        ea(op, AddrMode::is_memory_alterable)
    } else if logical {
        ea(op, AddrMode::is_data)
    } else {
        ea(op, |m| !(size == Size::Byte && matches!(m, AddrMode::AddrReg(_))))
    };
    mode.map_or(Instruction::Illegal, |mode| Instruction::Alu {
        op: alu,
        size,
        mode,
        reg: reg9(op),
        to_ea,
    })
}

// ================================================================
// 1001/1101: SUB, SUBA, SUBX / ADD, ADDA, ADDX
// ================================================================

fn decode_add_sub(op: u16) -> Instruction {
    let alu = if op >> 12 == 0xD { AluOp::Add } else { AluOp::Sub };
    let opmode = (op >> 6) & 7;
    match opmode {
        3 | 7 => AddrMode::from_opcode(op).map_or(Instruction::Illegal, |src| Instruction::AluA {
            op: alu,
            size: if opmode == 3 { Size::Word } else { Size::Long },
            src,
            reg: reg9(op),
        }),
        4..=6 if (op >> 3) & 6 == 0 => Instruction::AluX {
            add: alu == AluOp::Add,
            size: Size::from_bits(opmode & 3).unwrap_or(Size::Long),
            rx: reg9(op),
            ry: reg0(op),
            memory: op & 8 != 0,
        },
        _ => decode_alu(op, alu),
    }
}

// ================================================================
// 1011: CMP, CMPA, CMPM, EOR
// ================================================================

fn decode_cmp_eor(op: u16) -> Instruction {
    let opmode = (op >> 6) & 7;
    match opmode {
        3 | 7 => AddrMode::from_opcode(op).map_or(Instruction::Illegal, |src| Instruction::AluA {
            op: AluOp::Cmp,
            size: if opmode == 3 { Size::Word } else { Size::Long },
            src,
            reg: reg9(op),
        }),
        4..=6 => {
            let size = Size::from_bits(opmode & 3).unwrap_or(Size::Long);
            if (op >> 3) & 7 == 1 {
                return Instruction::CmpM { size, rx: reg9(op), ry: reg0(op) };
            }
            ea(op, AddrMode::is_data_alterable).map_or(Instruction::Illegal, |mode| Instruction::Alu {
                op: AluOp::Eor,
                size,
                mode,
                reg: reg9(op),
                to_ea: true,
            })
        }
        _ => {
            let size = Size::from_bits(opmode).unwrap_or(Size::Long);
            ea(op, |m| !(size == Size::Byte && matches!(m, AddrMode::AddrReg(_)))).map_or(
                Instruction::Illegal,
                |mode| Instruction::Alu {
                    op: AluOp::Cmp,
                    size,
                    mode,
                    reg: reg9(op),
                    to_ea: false,
                },
            )
        }
    }
}

// ================================================================
// 1100: AND, MULU/MULS, ABCD, EXG
// ================================================================

fn decode_and_mul(op: u16) -> Instruction {
    let opmode = (op >> 6) & 7;
    match opmode {
        3 | 7 => ea(op, AddrMode::is_data).map_or(Instruction::Illegal, |src| Instruction::Mul {
            signed: opmode == 7,
            src,
            reg: reg9(op),
        }),
        _ => match op & 0x01F8 {
            0x0100 | 0x0108 => Instruction::Bcd {
                add: true,
                rx: reg9(op),
                ry: reg0(op),
                memory: op & 8 != 0,
            },
            0x0140 => Instruction::Exg { rx: reg9(op), ry: reg0(op) },
            0x0148 => Instruction::Exg { rx: reg9(op) + 8, ry: reg0(op) + 8 },
            0x0188 => Instruction::Exg { rx: reg9(op), ry: reg0(op) + 8 },
            _ => decode_alu(op, AluOp::And),
        },
    }
}

// ================================================================
// 1110: shifts, rotates, bit fields
// ================================================================

fn decode_shift(op: u16, caps: &CpuCapabilities) -> Instruction {
    let left = op & 0x0100 != 0;
    let Some(size) = Size::from_bits(op >> 6) else {
        if op & 0x0800 != 0 {
            if !caps.bitfield {
                return Instruction::Illegal;
            }
            let bf = BitFieldOp::from_bits(op >> 8);
            let mode = if bf.modifies() {
                ea(op, |m| matches!(m, AddrMode::DataReg(_)) || m.is_control_alterable())
            } else {
                ea(op, |m| matches!(m, AddrMode::DataReg(_)) || m.is_control())
            };
            return mode.map_or(Instruction::Illegal, |mode| Instruction::BitField { op: bf, mode });
        }
        return ea(op, AddrMode::is_memory_alterable).map_or(Instruction::Illegal, |mode| {
            Instruction::ShiftMem {
                kind: ShiftKind::from_bits(op >> 9),
                left,
                mode,
            }
        });
    };
    let count = if op & 0x20 != 0 {
        ShiftCount::Register(reg9(op))
    } else {
        ShiftCount::Immediate(match reg9(op) {
            0 => 8,
            n => n,
        })
    };
    Instruction::ShiftReg {
        kind: ShiftKind::from_bits(op >> 3),
        left,
        size,
        count,
        reg: reg0(op),
    }
}

// ================================================================
// 1111: line F, 68040 extras
// ================================================================

fn decode_line_f(op: u16, caps: &CpuCapabilities) -> Instruction {
    if caps.move16 {
        if op & 0xFFF8 == 0xF620 || op & 0xFFE0 == 0xF600 {
            return Instruction::Move16 { opcode: op };
        }
        match op & 0xFF00 {
            0xF400 => return Instruction::CacheOp,
            0xF500 => return Instruction::MmuOp,
            _ => {}
        }
    }
    Instruction::LineF
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CpuModel;

    fn d(op: u16) -> Instruction {
        decode(op, &CpuModel::M68000.capabilities())
    }

    fn d20(op: u16) -> Instruction {
        decode(op, &CpuModel::M68020.capabilities())
    }

    #[test]
    fn moves() {
        assert_eq!(
            d(0x2200),
            Instruction::Move { size: Size::Long, src: AddrMode::DataReg(0), dst: AddrMode::DataReg(1) }
        );
        assert_eq!(d(0x3040), Instruction::MoveA { size: Size::Word, src: AddrMode::DataReg(0), reg: 0 });
        assert_eq!(d(0x1040), Instruction::Illegal); // MOVEA.B
        assert_eq!(d(0x7EFF), Instruction::MoveQ { reg: 7, data: -1 });
    }

    #[test]
    fn arithmetic_forms() {
        assert_eq!(
            d(0xD081),
            Instruction::Alu { op: AluOp::Add, size: Size::Long, mode: AddrMode::DataReg(1), reg: 0, to_ea: false }
        );
        assert_eq!(
            d(0xD389),
            Instruction::AluX { add: true, size: Size::Long, rx: 1, ry: 1, memory: true }
        );
        assert_eq!(d(0x5288), Instruction::AluQ { add: true, size: Size::Long, data: 1, mode: AddrMode::AddrReg(0) });
        assert_eq!(d(0x80FC), Instruction::Div { signed: false, src: AddrMode::Immediate, reg: 0 });
        assert_eq!(d(0xC341), Instruction::Exg { rx: 1, ry: 1 });
        assert_eq!(d(0xC189), Instruction::Exg { rx: 0, ry: 9 });
    }

    #[test]
    fn misc_group() {
        assert_eq!(d(0x4E75), Instruction::Rts);
        assert_eq!(d(0x4E4F), Instruction::Trap { vector: 15 });
        assert_eq!(d(0x41F9), Instruction::Lea { src: AddrMode::AbsLong, reg: 0 });
        assert_eq!(d(0x4880), Instruction::Ext { reg: 0, from: Size::Byte, size: Size::Word });
        assert_eq!(d(0x48E7), Instruction::MoveM { size: Size::Long, to_memory: true, mode: AddrMode::AddrIndPreDec(7) });
        assert_eq!(d(0x4AFC), Instruction::Illegal);
    }

    #[test]
    fn model_gating() {
        assert_eq!(d(0x4E7A), Instruction::Illegal);
        assert_eq!(d20(0x4E7A), Instruction::MoveC { to_control: false });
        assert_eq!(d(0x49C0), Instruction::Illegal);
        assert_eq!(d20(0x49C0), Instruction::Ext { reg: 0, from: Size::Byte, size: Size::Long });
        assert_eq!(d(0xE8C0), Instruction::Illegal);
        assert_eq!(d20(0xE8C0), Instruction::BitField { op: BitFieldOp::Tst, mode: AddrMode::DataReg(0) });
        assert_eq!(d20(0x4C00), Instruction::MulL { src: AddrMode::DataReg(0) });
    }

    #[test]
    fn conditional_group() {
        assert_eq!(d(0x51C8), Instruction::DBcc { cond: 1, reg: 0 });
        assert_eq!(d(0x57C0), Instruction::Scc { cond: 7, mode: AddrMode::DataReg(0) });
        assert_eq!(d20(0x50FC), Instruction::TrapCc { cond: 0, operand: None });
        assert_eq!(d(0x6602), Instruction::Bcc { cond: 6, disp: 2 });
    }

    #[test]
    fn shifts() {
        assert_eq!(
            d(0xE388),
            Instruction::ShiftReg {
                kind: ShiftKind::Logical,
                left: true,
                size: Size::Long,
                count: ShiftCount::Immediate(1),
                reg: 0
            }
        );
        assert_eq!(
            d(0xE0D0),
            Instruction::ShiftMem { kind: ShiftKind::Arithmetic, left: false, mode: AddrMode::AddrInd(0) }
        );
    }

    #[test]
    fn lines_a_and_f() {
        assert_eq!(d(0xA000), Instruction::LineA);
        assert_eq!(d(0xF200), Instruction::LineF);
        let caps = CpuModel::M68040.capabilities();
        assert_eq!(decode(0xF620, &caps), Instruction::Move16 { opcode: 0xF620 });
        assert_eq!(decode(0xF4F8, &caps), Instruction::CacheOp);
    }
}
