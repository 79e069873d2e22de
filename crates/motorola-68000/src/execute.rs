//! Instruction dispatch.
//!
//! Maps each decoded [`Instruction`] to its handler. Handlers consume their
//! own extension words and report faults through `Result`; cycle costs
//! beyond the base timing are added by the handlers themselves.

use log::debug;

use crate::bus::M68kBus;
use crate::cpu::Cpu68000;
use crate::decode::Instruction;
use crate::exceptions::{Fault, vector};

impl Cpu68000 {
    pub(crate) fn dispatch<B: M68kBus>(&mut self, bus: &mut B, instr: Instruction) -> Result<(), Fault> {
        match instr {
            // === Data movement ===
            Instruction::Move { size, src, dst } => self.exec_move(bus, size, src, dst),
            Instruction::MoveA { size, src, reg } => self.exec_movea(bus, size, src, reg),
            Instruction::MoveQ { reg, data } => {
                self.exec_moveq(reg, data);
                Ok(())
            }
            Instruction::MoveM { size, to_memory, mode } => self.exec_movem(bus, size, to_memory, mode),
            Instruction::MoveP { size, to_memory, dreg, areg } => self.exec_movep(bus, size, to_memory, dreg, areg),
            Instruction::Lea { src, reg } => self.exec_lea(bus, src, reg),
            Instruction::Pea { src } => self.exec_pea(bus, src),
            Instruction::Exg { rx, ry } => {
                self.exec_exg(rx, ry);
                Ok(())
            }
            Instruction::Swap { reg } => {
                self.exec_swap(reg);
                Ok(())
            }
            Instruction::Ext { reg, from, size } => {
                self.exec_ext(reg, from, size);
                Ok(())
            }
            Instruction::Link { reg, long } => self.exec_link(bus, reg, long),
            Instruction::Unlk { reg } => self.exec_unlk(bus, reg),
            Instruction::MoveFromSr { dst } => self.exec_move_from_sr(bus, dst),
            Instruction::MoveFromCcr { dst } => self.exec_move_from_ccr(bus, dst),
            Instruction::MoveToCcr { src } => self.exec_move_to_ccr(bus, src),
            Instruction::MoveToSr { src } => self.exec_move_to_sr(bus, src),
            Instruction::MoveUsp { reg, to_usp } => self.exec_move_usp(reg, to_usp),
            Instruction::MoveC { to_control } => self.exec_movec(bus, to_control),
            Instruction::MoveS { size, mode } => self.exec_moves(bus, size, mode),
            Instruction::Move16 { opcode } => self.exec_move16(bus, opcode),

            // === Integer arithmetic and logic ===
            Instruction::Alu { op, size, mode, reg, to_ea } => self.exec_alu(bus, op, size, mode, reg, to_ea),
            Instruction::AluA { op, size, src, reg } => self.exec_alu_a(bus, op, size, src, reg),
            Instruction::AluI { op, size, mode } => self.exec_alu_i(bus, op, size, mode),
            Instruction::AluQ { add, size, data, mode } => self.exec_alu_q(bus, add, size, data, mode),
            Instruction::AluX { add, size, rx, ry, memory } => self.exec_alu_x(bus, add, size, rx, ry, memory),
            Instruction::CmpM { size, rx, ry } => self.exec_cmpm(bus, size, rx, ry),
            Instruction::ToCcr { op } => self.exec_to_ccr(bus, op),
            Instruction::ToSr { op } => self.exec_to_sr(bus, op),
            Instruction::Unary { op, size, mode } => self.exec_unary(bus, op, size, mode),
            Instruction::Tst { size, mode } => self.exec_tst(bus, size, mode),
            Instruction::Tas { mode } => self.exec_tas(bus, mode),
            Instruction::Mul { signed, src, reg } => self.exec_mul(bus, signed, src, reg),
            Instruction::Div { signed, src, reg } => self.exec_div(bus, signed, src, reg),
            Instruction::MulL { src } => self.exec_mul_long(bus, src),
            Instruction::DivL { src } => self.exec_div_long(bus, src),
            Instruction::Bcd { add, rx, ry, memory } => self.exec_bcd(bus, add, rx, ry, memory),
            Instruction::Nbcd { mode } => self.exec_nbcd(bus, mode),
            Instruction::Pack { unpack, rx, ry, memory } => self.exec_pack(bus, unpack, rx, ry, memory),
            Instruction::Chk { size, src, reg } => self.exec_chk(bus, size, src, reg),
            Instruction::Chk2 { size, mode } => self.exec_chk2(bus, size, mode),
            Instruction::Cas { size, mode } => self.exec_cas(bus, size, mode),
            Instruction::Cas2 { size } => self.exec_cas2(bus, size),

            // === Shifts and bits ===
            Instruction::ShiftReg { kind, left, size, count, reg } => {
                self.exec_shift_reg(kind, left, size, count, reg);
                Ok(())
            }
            Instruction::ShiftMem { kind, left, mode } => self.exec_shift_mem(bus, kind, left, mode),
            Instruction::Bit { op, src, mode } => self.exec_bit(bus, op, src, mode),
            Instruction::BitField { op, mode } => self.exec_bitfield(bus, op, mode),

            // === Program control ===
            Instruction::Bcc { cond, disp } => self.exec_bcc(bus, cond, disp),
            Instruction::DBcc { cond, reg } => self.exec_dbcc(bus, cond, reg),
            Instruction::Scc { cond, mode } => self.exec_scc(bus, cond, mode),
            Instruction::TrapCc { cond, operand } => self.exec_trapcc(bus, cond, operand),
            Instruction::Jmp { mode } => self.exec_jmp(bus, mode),
            Instruction::Jsr { mode } => self.exec_jsr(bus, mode),
            Instruction::Rts => self.exec_rts(bus),
            Instruction::Rtr => self.exec_rtr(bus),
            Instruction::Rte => self.exec_rte(bus),
            Instruction::Rtd => self.exec_rtd(bus),
            Instruction::Trap { vector: n } => Err(Fault::Trap(vector::TRAP_BASE + n)),
            Instruction::TrapV => self.exec_trapv(),
            Instruction::Nop => Ok(()),
            Instruction::Reset => self.exec_reset(bus),
            Instruction::Stop => self.exec_stop(bus),

            // === Exceptions by opcode ===
            Instruction::Illegal | Instruction::Bkpt => {
                if bus.illegal_instruction(self.ir) {
                    debug!("illegal opcode {:04X} handled by the host", self.ir);
                    Ok(())
                } else {
                    Err(Fault::Exception(vector::ILLEGAL_INSTRUCTION))
                }
            }
            Instruction::LineA => Err(Fault::Exception(vector::LINE_A)),
            Instruction::LineF => self.exec_line_f(bus),
            Instruction::CacheOp | Instruction::MmuOp => self.require_supervisor(),
        }
    }
}
