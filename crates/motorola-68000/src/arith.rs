//! Integer arithmetic: ADD/SUB/CMP families, NEG/CLR/NOT, multiply,
//! divide, BCD, PACK/UNPK, CHK/CHK2 and CAS.

use crate::addressing::AddrMode;
use crate::alu::{self, Size};
use crate::bus::M68kBus;
use crate::cpu::Cpu68000;
use crate::decode::{AluOp, UnaryOp};
use crate::ea::{Ea, step_bytes};
use crate::exceptions::{Fault, vector};
use crate::flags::{C, N, Status, V, X, Z};
use crate::model::CpuModel;
use crate::timing;

impl Cpu68000 {
    /// Commit new condition codes. Only the CCR byte of `sr` is used.
    pub(crate) fn set_flags(&mut self, sr: u16) {
        self.regs.set_ccr(sr as u8);
    }

    pub(crate) fn x_flag(&self) -> u8 {
        u8::from(self.regs.sr & X != 0)
    }

    /// Apply `op` as `dst op src`. CMP returns no result.
    fn alu_compute(&self, op: AluOp, src: u32, dst: u32, size: Size) -> (Option<u32>, u16) {
        let sr = self.regs.sr;
        match op {
            AluOp::Add => {
                let (r, f) = alu::add(src, dst, size, sr);
                (Some(r), f)
            }
            AluOp::Sub => {
                let (r, f) = alu::sub(src, dst, size, sr);
                (Some(r), f)
            }
            AluOp::And => {
                let r = src & dst & size.mask();
                (Some(r), alu::logic(r, size, sr))
            }
            AluOp::Or => {
                let r = (src | dst) & size.mask();
                (Some(r), alu::logic(r, size, sr))
            }
            AluOp::Eor => {
                let r = (src ^ dst) & size.mask();
                (Some(r), alu::logic(r, size, sr))
            }
            AluOp::Cmp => (None, alu::cmp(src, dst, size, sr)),
        }
    }

    /// `<ea> op Dn -> Dn` or `Dn op <ea> -> <ea>`.
    pub(crate) fn exec_alu<B: M68kBus>(
        &mut self,
        bus: &mut B,
        op: AluOp,
        size: Size,
        mode: AddrMode,
        reg: u8,
        to_ea: bool,
    ) -> Result<(), Fault> {
        let ea = self.resolve(bus, mode, size)?;
        let operand = self.read_ea(bus, ea, size)?;
        let dreg = self.regs.d[reg as usize];
        let (src, dst, target) = if to_ea {
            (dreg, operand, ea)
        } else {
            (operand, dreg, Ea::DataReg(reg))
        };
        let (result, sr) = self.alu_compute(op, src, dst, size);
        if let Some(result) = result {
            self.write_ea(bus, target, size, result)?;
        }
        self.set_flags(sr);
        Ok(())
    }

    /// ADDA/SUBA/CMPA: source sign-extended to 32 bits.
    pub(crate) fn exec_alu_a<B: M68kBus>(
        &mut self,
        bus: &mut B,
        op: AluOp,
        size: Size,
        src: AddrMode,
        reg: u8,
    ) -> Result<(), Fault> {
        let value = size.sign_extend(self.read_operand(bus, src, size)?);
        let an = self.regs.a(reg as usize);
        match op {
            AluOp::Add => self.regs.set_a(reg as usize, an.wrapping_add(value)),
            AluOp::Sub => self.regs.set_a(reg as usize, an.wrapping_sub(value)),
            _ => {
                let sr = alu::cmp(value, an, Size::Long, self.regs.sr);
                self.set_flags(sr);
            }
        }
        Ok(())
    }

    /// ADDI/SUBI/ANDI/ORI/EORI/CMPI.
    pub(crate) fn exec_alu_i<B: M68kBus>(&mut self, bus: &mut B, op: AluOp, size: Size, mode: AddrMode) -> Result<(), Fault> {
        let imm = self.read_operand(bus, AddrMode::Immediate, size)?;
        let ea = self.resolve(bus, mode, size)?;
        let dst = self.read_ea(bus, ea, size)?;
        let (result, sr) = self.alu_compute(op, imm, dst, size);
        if let Some(result) = result {
            self.write_ea(bus, ea, size, result)?;
        }
        self.set_flags(sr);
        Ok(())
    }

    /// ADDQ/SUBQ. Address register destinations use all 32 bits and leave
    /// the flags alone.
    pub(crate) fn exec_alu_q<B: M68kBus>(
        &mut self,
        bus: &mut B,
        add: bool,
        size: Size,
        data: u8,
        mode: AddrMode,
    ) -> Result<(), Fault> {
        let data = u32::from(data);
        if let AddrMode::AddrReg(r) = mode {
            let an = self.regs.a(r as usize);
            let value = if add { an.wrapping_add(data) } else { an.wrapping_sub(data) };
            self.regs.set_a(r as usize, value);
            return Ok(());
        }
        let ea = self.resolve(bus, mode, size)?;
        let dst = self.read_ea(bus, ea, size)?;
        let (result, sr) = if add {
            alu::add(data, dst, size, self.regs.sr)
        } else {
            alu::sub(data, dst, size, self.regs.sr)
        };
        self.write_ea(bus, ea, size, result)?;
        self.set_flags(sr);
        Ok(())
    }

    /// Both operands of a -(Ay),-(Ax) form: (source, destination address).
    fn predec_pair<B: M68kBus>(&mut self, bus: &mut B, size: Size, rx: u8, ry: u8) -> Result<(u32, u32), Fault> {
        let src_addr = self.regs.a(ry as usize).wrapping_sub(step_bytes(ry, size));
        self.regs.set_a(ry as usize, src_addr);
        let src = self.read_mem(bus, size, src_addr)?;
        let dst_addr = self.regs.a(rx as usize).wrapping_sub(step_bytes(rx, size));
        self.regs.set_a(rx as usize, dst_addr);
        Ok((src, dst_addr))
    }

    /// ADDX/SUBX.
    pub(crate) fn exec_alu_x<B: M68kBus>(
        &mut self,
        bus: &mut B,
        add: bool,
        size: Size,
        rx: u8,
        ry: u8,
        memory: bool,
    ) -> Result<(), Fault> {
        let (src, target) = if memory {
            let (src, addr) = self.predec_pair(bus, size, rx, ry)?;
            (src, Ea::Memory { addr, program: false })
        } else {
            (self.regs.d[ry as usize], Ea::DataReg(rx))
        };
        let dst = self.read_ea(bus, target, size)?;
        let (result, sr) = if add {
            alu::addx(src, dst, size, self.regs.sr)
        } else {
            alu::subx(src, dst, size, self.regs.sr)
        };
        self.write_ea(bus, target, size, result)?;
        self.set_flags(sr);
        Ok(())
    }

    /// CMPM (Ay)+,(Ax)+.
    pub(crate) fn exec_cmpm<B: M68kBus>(&mut self, bus: &mut B, size: Size, rx: u8, ry: u8) -> Result<(), Fault> {
        let src = self.read_operand(bus, AddrMode::AddrIndPostInc(ry), size)?;
        let dst = self.read_operand(bus, AddrMode::AddrIndPostInc(rx), size)?;
        let sr = alu::cmp(src, dst, size, self.regs.sr);
        self.set_flags(sr);
        Ok(())
    }

    /// NEG, NEGX, CLR, NOT.
    pub(crate) fn exec_unary<B: M68kBus>(&mut self, bus: &mut B, op: UnaryOp, size: Size, mode: AddrMode) -> Result<(), Fault> {
        let ea = self.resolve(bus, mode, size)?;
        let dst = self.read_ea(bus, ea, size)?;
        let sr = self.regs.sr;
        let (result, sr) = match op {
            UnaryOp::Neg => alu::neg(dst, size, sr),
            UnaryOp::NegX => alu::negx(dst, size, sr),
            UnaryOp::Clr => (0, alu::logic(0, size, sr)),
            UnaryOp::Not => {
                let r = !dst & size.mask();
                (r, alu::logic(r, size, sr))
            }
        };
        self.write_ea(bus, ea, size, result)?;
        self.set_flags(sr);
        Ok(())
    }

    /// MULU.W/MULS.W: 16 x 16 -> 32.
    pub(crate) fn exec_mul<B: M68kBus>(&mut self, bus: &mut B, signed: bool, src: AddrMode, reg: u8) -> Result<(), Fault> {
        let source = self.read_operand(bus, src, Size::Word)? as u16;
        let dst = self.regs.d[reg as usize] as u16;
        let result = if signed {
            (i32::from(source as i16) * i32::from(dst as i16)) as u32
        } else {
            u32::from(source) * u32::from(dst)
        };
        self.regs.d[reg as usize] = result;
        let sr = alu::logic(result, Size::Long, self.regs.sr);
        self.set_flags(sr);
        if matches!(self.model, CpuModel::M68000 | CpuModel::M68010) {
            self.cycles += timing::mul_cycles(source, signed);
        }
        Ok(())
    }

    /// DIVU.W/DIVS.W: 32 / 16 -> 16r:16q. Overflow sets V and leaves the
    /// destination unchanged.
    pub(crate) fn exec_div<B: M68kBus>(&mut self, bus: &mut B, signed: bool, src: AddrMode, reg: u8) -> Result<(), Fault> {
        let divisor = self.read_operand(bus, src, Size::Word)? as u16;
        let dividend = self.regs.d[reg as usize];
        if divisor == 0 {
            let sr = self.regs.sr & !C;
            self.set_flags(sr);
            return Err(Fault::Trap(vector::ZERO_DIVIDE));
        }
        let early_model = matches!(self.model, CpuModel::M68000 | CpuModel::M68010);

        let quotient_and_remainder = if signed {
            if early_model {
                self.cycles += timing::divs_cycles(dividend as i32, divisor as i16);
            }
            let q = i64::from(dividend as i32) / i64::from(divisor as i16);
            let r = i64::from(dividend as i32) % i64::from(divisor as i16);
            i16::try_from(q).ok().map(|q| (q as u16, r as u16))
        } else {
            if early_model {
                self.cycles += timing::divu_cycles(dividend, divisor);
            }
            let q = dividend / u32::from(divisor);
            let r = dividend % u32::from(divisor);
            u16::try_from(q).ok().map(|q| (q, r as u16))
        };

        let mut sr = self.regs.sr & !(V | C);
        match quotient_and_remainder {
            Some((q, r)) => {
                self.regs.d[reg as usize] = (u32::from(r) << 16) | u32::from(q);
                sr = alu::nz(u32::from(q), Size::Word, sr);
            }
            None => sr |= V,
        }
        self.set_flags(sr);
        Ok(())
    }

    /// MULU.L/MULS.L: 32 x 32 -> 32 or 64.
    pub(crate) fn exec_mul_long<B: M68kBus>(&mut self, bus: &mut B, src: AddrMode) -> Result<(), Fault> {
        let ext = self.fetch_word(bus)?;
        let source = self.read_operand(bus, src, Size::Long)?;
        let dl = ((ext >> 12) & 7) as usize;
        let dh = (ext & 7) as usize;
        let signed = ext & 0x0800 != 0;
        let wide = ext & 0x0400 != 0;
        let multiplicand = self.regs.d[dl];

        let product = if signed {
            (i64::from(source as i32) * i64::from(multiplicand as i32)) as u64
        } else {
            u64::from(source) * u64::from(multiplicand)
        };
        let low = product as u32;
        let mut sr = self.regs.sr & !(N | Z | V | C);
        if wide {
            self.regs.d[dh] = (product >> 32) as u32;
            self.regs.d[dl] = low;
            sr = Status::set_if(sr, N, product & (1 << 63) != 0);
            sr = Status::set_if(sr, Z, product == 0);
        } else {
            self.regs.d[dl] = low;
            let fits = if signed {
                i32::try_from(product as i64).is_ok()
            } else {
                product >> 32 == 0
            };
            sr = Status::set_if(sr, V, !fits);
            sr = alu::nz(low, Size::Long, sr);
        }
        self.set_flags(sr);
        Ok(())
    }

    /// DIVU.L/DIVS.L: 32 or 64 / 32 -> 32r:32q.
    pub(crate) fn exec_div_long<B: M68kBus>(&mut self, bus: &mut B, src: AddrMode) -> Result<(), Fault> {
        let ext = self.fetch_word(bus)?;
        let divisor = self.read_operand(bus, src, Size::Long)?;
        let dq = ((ext >> 12) & 7) as usize;
        let dr = (ext & 7) as usize;
        let signed = ext & 0x0800 != 0;
        let wide = ext & 0x0400 != 0;
        if divisor == 0 {
            let sr = self.regs.sr & !C;
            self.set_flags(sr);
            return Err(Fault::Trap(vector::ZERO_DIVIDE));
        }

        let result = if signed {
            let dividend = if wide {
                ((u64::from(self.regs.d[dr]) << 32) | u64::from(self.regs.d[dq])) as i64
            } else {
                i64::from(self.regs.d[dq] as i32)
            };
            let divisor = i64::from(divisor as i32);
            match (dividend.checked_div(divisor), dividend.checked_rem(divisor)) {
                (Some(q), Some(r)) => i32::try_from(q).ok().map(|q| (q as u32, r as u32)),
                _ => None,
            }
        } else {
            let dividend = if wide {
                (u64::from(self.regs.d[dr]) << 32) | u64::from(self.regs.d[dq])
            } else {
                u64::from(self.regs.d[dq])
            };
            let q = dividend / u64::from(divisor);
            let r = dividend % u64::from(divisor);
            u32::try_from(q).ok().map(|q| (q, r as u32))
        };

        let mut sr = self.regs.sr & !(V | C);
        match result {
            Some((q, r)) => {
                if wide || dr != dq {
                    self.regs.d[dr] = r;
                }
                self.regs.d[dq] = q;
                sr = alu::nz(q, Size::Long, sr);
            }
            None => sr |= V,
        }
        self.set_flags(sr);
        Ok(())
    }

    /// ABCD/SBCD, register or -(Ay),-(Ax).
    pub(crate) fn exec_bcd<B: M68kBus>(&mut self, bus: &mut B, add: bool, rx: u8, ry: u8, memory: bool) -> Result<(), Fault> {
        let (src, target) = if memory {
            let (src, addr) = self.predec_pair(bus, Size::Byte, rx, ry)?;
            (src as u8, Ea::Memory { addr, program: false })
        } else {
            (self.regs.d[ry as usize] as u8, Ea::DataReg(rx))
        };
        let dst = self.read_ea(bus, target, Size::Byte)? as u8;
        let x = self.x_flag();
        let (result, carry, overflow) = if add {
            alu::bcd_add(src, dst, x)
        } else {
            alu::bcd_sub(src, dst, x)
        };
        self.write_ea(bus, target, Size::Byte, u32::from(result))?;
        let sr = alu::bcd_flags(result, carry, overflow, self.regs.sr);
        self.set_flags(sr);
        Ok(())
    }

    /// NBCD: `0 - <ea> - X` in decimal.
    pub(crate) fn exec_nbcd<B: M68kBus>(&mut self, bus: &mut B, mode: AddrMode) -> Result<(), Fault> {
        let ea = self.resolve(bus, mode, Size::Byte)?;
        let src = self.read_ea(bus, ea, Size::Byte)? as u8;
        let (result, borrow, overflow) = alu::bcd_sub(src, 0, self.x_flag());
        self.write_ea(bus, ea, Size::Byte, u32::from(result))?;
        let sr = alu::bcd_flags(result, borrow, overflow, self.regs.sr);
        self.set_flags(sr);
        Ok(())
    }

    /// PACK/UNPK. `rx` is the destination, `ry` the source.
    pub(crate) fn exec_pack<B: M68kBus>(&mut self, bus: &mut B, unpack: bool, rx: u8, ry: u8, memory: bool) -> Result<(), Fault> {
        let adjust = self.fetch_word(bus)?;
        if unpack {
            let src = if memory {
                self.read_operand(bus, AddrMode::AddrIndPreDec(ry), Size::Byte)? as u16
            } else {
                self.regs.d[ry as usize] as u16 & 0xFF
            };
            let result = (((src & 0xF0) << 4) | (src & 0x0F)).wrapping_add(adjust);
            if memory {
                let lo = self.resolve(bus, AddrMode::AddrIndPreDec(rx), Size::Byte)?;
                self.write_ea(bus, lo, Size::Byte, u32::from(result))?;
                let hi = self.resolve(bus, AddrMode::AddrIndPreDec(rx), Size::Byte)?;
                self.write_ea(bus, hi, Size::Byte, u32::from(result >> 8))?;
            } else {
                self.write_ea(bus, Ea::DataReg(rx), Size::Word, u32::from(result))?;
            }
        } else {
            let src = if memory {
                let lo = self.read_operand(bus, AddrMode::AddrIndPreDec(ry), Size::Byte)? as u16;
                let hi = self.read_operand(bus, AddrMode::AddrIndPreDec(ry), Size::Byte)? as u16;
                (hi << 8) | lo
            } else {
                self.regs.d[ry as usize] as u16
            };
            let sum = src.wrapping_add(adjust);
            let packed = ((sum >> 4) & 0xF0) | (sum & 0x0F);
            let target = if memory {
                self.resolve(bus, AddrMode::AddrIndPreDec(rx), Size::Byte)?
            } else {
                Ea::DataReg(rx)
            };
            self.write_ea(bus, target, Size::Byte, u32::from(packed))?;
        }
        Ok(())
    }

    /// CHK: trap unless `0 <= Dn <= bound`.
    pub(crate) fn exec_chk<B: M68kBus>(&mut self, bus: &mut B, size: Size, src: AddrMode, reg: u8) -> Result<(), Fault> {
        let bound = size.sign_extend(self.read_operand(bus, src, size)?) as i32;
        let value = size.sign_extend(self.regs.d[reg as usize]) as i32;
        let mut sr = self.regs.sr & !(Z | V | C);
        sr = Status::set_if(sr, Z, value == 0);
        if value < 0 {
            self.set_flags(sr | N);
            return Err(Fault::Trap(vector::CHK));
        }
        if value > bound {
            self.set_flags(sr & !N);
            return Err(Fault::Trap(vector::CHK));
        }
        self.set_flags(sr);
        Ok(())
    }

    /// CMP2/CHK2: bounds pair in memory, lower bound first.
    pub(crate) fn exec_chk2<B: M68kBus>(&mut self, bus: &mut B, size: Size, mode: AddrMode) -> Result<(), Fault> {
        let ext = self.fetch_word(bus)?;
        let addr = self.control_address(bus, mode)?;
        let lower = self.read_mem(bus, size, addr)?;
        let upper = self.read_mem(bus, size, addr.wrapping_add(size.bytes()))?;
        let reg = ((ext >> 12) & 7) as usize;

        let (compare, lower, upper) = if ext & 0x8000 != 0 {
            (self.regs.a(reg), size.sign_extend(lower), size.sign_extend(upper))
        } else {
            (self.regs.d[reg] & size.mask(), lower, upper)
        };

        let out_of_bounds = if lower <= upper {
            compare < lower || compare > upper
        } else {
            compare > upper && compare < lower
        };
        let mut sr = self.regs.sr & !(Z | C);
        sr = Status::set_if(sr, Z, compare == lower || compare == upper);
        sr = Status::set_if(sr, C, out_of_bounds);
        self.set_flags(sr);
        if out_of_bounds && ext & 0x0800 != 0 {
            return Err(Fault::Trap(vector::CHK));
        }
        Ok(())
    }

    /// CAS Dc,Du,<ea>.
    pub(crate) fn exec_cas<B: M68kBus>(&mut self, bus: &mut B, size: Size, mode: AddrMode) -> Result<(), Fault> {
        let ext = self.fetch_word(bus)?;
        let dc = (ext & 7) as usize;
        let du = ((ext >> 6) & 7) as usize;
        let ea = self.resolve(bus, mode, size)?;
        let dest = self.read_ea(bus, ea, size)?;
        let sr = alu::cmp(self.regs.d[dc], dest, size, self.regs.sr);
        self.set_flags(sr);
        if sr & Z != 0 {
            self.write_ea(bus, ea, size, self.regs.d[du])?;
        } else {
            self.write_ea(bus, Ea::DataReg(dc as u8), size, dest)?;
        }
        Ok(())
    }

    /// CAS2 Dc1:Dc2,Du1:Du2,(Rn1):(Rn2).
    pub(crate) fn exec_cas2<B: M68kBus>(&mut self, bus: &mut B, size: Size) -> Result<(), Fault> {
        let ext1 = self.fetch_word(bus)?;
        let ext2 = self.fetch_word(bus)?;
        let pointer = |cpu: &Self, ext: u16| {
            let reg = ((ext >> 12) & 7) as usize;
            if ext & 0x8000 != 0 { cpu.regs.a(reg) } else { cpu.regs.d[reg] }
        };
        let addr1 = pointer(self, ext1);
        let addr2 = pointer(self, ext2);
        let (dc1, du1) = ((ext1 & 7) as usize, ((ext1 >> 6) & 7) as usize);
        let (dc2, du2) = ((ext2 & 7) as usize, ((ext2 >> 6) & 7) as usize);

        let op1 = self.read_mem(bus, size, addr1)?;
        let op2 = self.read_mem(bus, size, addr2)?;
        let mut sr = alu::cmp(self.regs.d[dc1], op1, size, self.regs.sr);
        if sr & Z != 0 {
            sr = alu::cmp(self.regs.d[dc2], op2, size, sr);
        }
        self.set_flags(sr);
        if sr & Z != 0 {
            self.write_mem(bus, size, addr1, self.regs.d[du1])?;
            self.write_mem(bus, size, addr2, self.regs.d[du2])?;
        } else {
            self.write_ea(bus, Ea::DataReg(dc1 as u8), size, op1)?;
            self.write_ea(bus, Ea::DataReg(dc2 as u8), size, op2)?;
        }
        Ok(())
    }
}
