//! Logical and bit operations: immediate to CCR/SR, TST, TAS, single-bit
//! operations and the 68020 bit field instructions.

use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::bus::M68kBus;
use crate::cpu::Cpu68000;
use crate::decode::{AluOp, BitFieldOp, BitOp, BitSource};
use crate::ea::Ea;
use crate::exceptions::Fault;
use crate::flags::{C, N, Status, V, Z};

/// Apply ANDI/ORI/EORI to a status value.
fn apply_immediate(op: AluOp, value: u16, imm: u16) -> u16 {
    match op {
        AluOp::And => value & imm,
        AluOp::Or => value | imm,
        _ => value ^ imm,
    }
}

impl Cpu68000 {
    /// ANDI/ORI/EORI to CCR.
    pub(crate) fn exec_to_ccr<B: M68kBus>(&mut self, bus: &mut B, op: AluOp) -> Result<(), Fault> {
        let imm = self.fetch_word(bus)? & 0xFF;
        let ccr = apply_immediate(op, u16::from(self.regs.ccr()), imm);
        self.regs.set_ccr(ccr as u8);
        Ok(())
    }

    /// ANDI/ORI/EORI to SR (privileged).
    pub(crate) fn exec_to_sr<B: M68kBus>(&mut self, bus: &mut B, op: AluOp) -> Result<(), Fault> {
        self.require_supervisor()?;
        let imm = self.fetch_word(bus)?;
        self.set_sr_masked(apply_immediate(op, self.regs.sr, imm));
        Ok(())
    }

    pub(crate) fn exec_tst<B: M68kBus>(&mut self, bus: &mut B, size: Size, mode: AddrMode) -> Result<(), Fault> {
        let value = self.read_operand(bus, mode, size)?;
        let sr = alu::logic(value, size, self.regs.sr);
        self.set_flags(sr);
        Ok(())
    }

    /// TAS: test a byte and set its bit 7.
    pub(crate) fn exec_tas<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode) -> Result<(), Fault> {
        let ea = self.resolve(bus, mode, Size::Byte)?;
        let value = self.read_ea(bus, ea, Size::Byte)?;
        let sr = alu::logic(value, Size::Byte, self.regs.sr);
        self.set_flags(sr);
        self.write_ea(bus, ea, Size::Byte, value | 0x80)
    }

    /// BTST/BCHG/BCLR/BSET. Data registers are 32 bits wide, memory
    /// operands one byte.
    pub(crate) fn exec_bit<B: M68kBus>(&mut self, bus: &mut B, op: BitOp, src: BitSource, mode: AddrMode) -> Result<(), Fault> {
        let bit = match src {
            BitSource::Immediate => u32::from(self.fetch_word(bus)?),
            BitSource::Register(r) => self.regs.d[r as usize],
        };
        let size = if matches!(mode, AddrMode::DataReg(_)) { Size::Long } else { Size::Byte };
        let bit = bit % size.bits();
        let ea = self.resolve(bus, mode, size)?;
        let value = self.read_ea(bus, ea, size)?;
        let mask = 1u32 << bit;

        let sr = Status::set_if(self.regs.sr, Z, value & mask == 0);
        self.set_flags(sr);
        let result = match op {
            BitOp::Test => return Ok(()),
            BitOp::Change => value ^ mask,
            BitOp::Clear => value & !mask,
            BitOp::Set => value | mask,
        };
        if size == Size::Long {
            self.cycles += if bit >= 16 { 4 } else { 2 };
        }
        self.write_ea(bus, ea, size, result)
    }

    /// BFTST, BFEXTU, BFCHG, BFEXTS, BFCLR, BFFFO, BFSET, BFINS.
    pub(crate) fn exec_bitfield<B: M68kBus>(&mut self, bus: &mut B, op: BitFieldOp, mode: AddrMode) -> Result<(), Fault> {
        let ext = self.fetch_word(bus)?;
        let reg = ((ext >> 12) & 7) as usize;
        let offset: i32 = if ext & 0x0800 != 0 {
            self.regs.d[((ext >> 6) & 7) as usize] as i32
        } else {
            i32::from((ext >> 6) & 0x1F)
        };
        let raw_width = if ext & 0x20 != 0 {
            self.regs.d[(ext & 7) as usize] & 0x1F
        } else {
            u32::from(ext & 0x1F)
        };
        let width = if raw_width == 0 { 32 } else { raw_width };
        let field_mask = if width == 32 { u32::MAX } else { (1u32 << width) - 1 };

        // Read the field right-aligned and remember where it came from.
        let (field, location) = if let AddrMode::DataReg(r) = mode {
            let shift = (offset as u32) & 31;
            let value = self.regs.d[r as usize].rotate_left(shift);
            (value >> (32 - width), FieldLocation::Register { reg: r, shift })
        } else {
            let base = self.control_address(bus, mode)?;
            let addr = base.wrapping_add(offset.div_euclid(8) as u32);
            let bit_offset = offset.rem_euclid(8) as u32;
            let spans_fifth_byte = bit_offset + width > 32;
            let long = u64::from(self.read_mem(bus, Size::Long, addr)?);
            let fifth = if spans_fifth_byte {
                u64::from(self.read_mem(bus, Size::Byte, addr.wrapping_add(4))?)
            } else {
                0
            };
            let data = (long << 32) | (fifth << 24);
            let field = ((data << bit_offset) >> (64 - width)) as u32;
            (
                field,
                FieldLocation::Memory {
                    addr,
                    bit_offset,
                    data,
                    spans_fifth_byte,
                },
            )
        };

        let msb = 1u32 << (width - 1);
        let flags_for = |value: u32, sr: u16| {
            let mut sr = sr & !(N | Z | V | C);
            sr = Status::set_if(sr, N, value & msb != 0);
            Status::set_if(sr, Z, value & field_mask == 0)
        };
        let sr = flags_for(field, self.regs.sr);
        self.set_flags(sr);

        let new_field = match op {
            BitFieldOp::Tst => None,
            BitFieldOp::Extu => {
                self.regs.d[reg] = field;
                None
            }
            BitFieldOp::Exts => {
                self.regs.d[reg] = if field & msb != 0 { field | !field_mask } else { field };
                None
            }
            BitFieldOp::Ffo => {
                let leading = (field << (32 - width)).leading_zeros().min(width);
                self.regs.d[reg] = (offset as u32).wrapping_add(leading);
                None
            }
            BitFieldOp::Chg => Some(!field & field_mask),
            BitFieldOp::Clr => Some(0),
            BitFieldOp::Set => Some(field_mask),
            BitFieldOp::Ins => {
                let value = self.regs.d[reg] & field_mask;
                let sr = flags_for(value, self.regs.sr);
                self.set_flags(sr);
                Some(value)
            }
        };

        let Some(new_field) = new_field else {
            return Ok(());
        };
        match location {
            FieldLocation::Register { reg: r, shift } => {
                let field_bits = field_mask << (32 - width);
                let rotated = self.regs.d[r as usize].rotate_left(shift);
                let merged = (rotated & !field_bits) | ((new_field << (32 - width)) & field_bits);
                self.regs.d[r as usize] = merged.rotate_right(shift);
            }
            FieldLocation::Memory {
                addr,
                bit_offset,
                data,
                spans_fifth_byte,
            } => {
                let shift = 64 - width - bit_offset;
                let mask = u64::from(field_mask) << shift;
                let data = (data & !mask) | (u64::from(new_field) << shift);
                self.write_ea(bus, Ea::Memory { addr, program: false }, Size::Long, (data >> 32) as u32)?;
                if spans_fifth_byte {
                    let fifth = Ea::Memory {
                        addr: addr.wrapping_add(4),
                        program: false,
                    };
                    self.write_ea(bus, fifth, Size::Byte, (data >> 24) as u32)?;
                }
            }
        }
        Ok(())
    }
}

/// Where a bit field lives.
enum FieldLocation {
    /// Field starts `shift` bits from the MSB of a data register and wraps.
    Register { reg: u8, shift: u32 },
    /// Field inside the 40-bit window starting at `addr`.
    Memory {
        addr: u32,
        bit_offset: u32,
        data: u64,
        spans_fifth_byte: bool,
    },
}
