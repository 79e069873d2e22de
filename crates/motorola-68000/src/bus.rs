//! Bus and interrupt interface between the CPU and the rest of the machine.
//!
//! The `M68kBus` trait models:
//! - Sized accesses (byte, word, long) with function codes
//! - Wait cycles returned from every access (DMA contention, slow memory)
//! - A bus error bit for accesses nothing answers
//! - The interrupt priority lines and the acknowledge cycle
//! - Host hooks for RESET, unrecognised opcodes and PC changes

use crate::alu::Size;

/// Function code values from the FC0-FC2 pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCode {
    /// Undefined (FC=0).
    Reserved0 = 0,
    /// User data access (FC=1).
    UserData = 1,
    /// User program access (FC=2).
    UserProgram = 2,
    /// Undefined, user-definable (FC=3).
    Reserved3 = 3,
    /// Undefined, user-definable (FC=4).
    Reserved4 = 4,
    /// Supervisor data access (FC=5).
    SupervisorData = 5,
    /// Supervisor program access (FC=6).
    SupervisorProgram = 6,
    /// CPU space: interrupt acknowledge, breakpoints, coprocessors (FC=7).
    CpuSpace = 7,
}

impl FunctionCode {
    /// Build a function code from supervisor flag and program/data flag.
    #[must_use]
    pub fn from_flags(supervisor: bool, program: bool) -> Self {
        match (supervisor, program) {
            (false, false) => Self::UserData,
            (false, true) => Self::UserProgram,
            (true, false) => Self::SupervisorData,
            (true, true) => Self::SupervisorProgram,
        }
    }

    /// Function code from a 3-bit value (SFC/DFC).
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        match bits & 7 {
            0 => Self::Reserved0,
            1 => Self::UserData,
            2 => Self::UserProgram,
            3 => Self::Reserved3,
            4 => Self::Reserved4,
            5 => Self::SupervisorData,
            6 => Self::SupervisorProgram,
            _ => Self::CpuSpace,
        }
    }

    /// Returns the 3-bit value for the function code.
    #[must_use]
    pub fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn is_program(self) -> bool {
        matches!(self, Self::UserProgram | Self::SupervisorProgram)
    }
}

/// Result of a bus access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusResult {
    /// Data read from the bus, right-aligned. For writes, this is 0.
    pub data: u32,
    /// Extra wait cycles inserted by the bus.
    pub wait_cycles: u8,
    /// True if nothing acknowledged the access. The CPU takes a bus error
    /// (vector 2).
    pub bus_error: bool,
}

impl BusResult {
    /// Create a result with data and no wait cycles.
    #[must_use]
    pub const fn new(data: u32) -> Self {
        Self {
            data,
            wait_cycles: 0,
            bus_error: false,
        }
    }

    /// Create a result with data and wait cycles.
    #[must_use]
    pub const fn with_wait(data: u32, wait_cycles: u8) -> Self {
        Self {
            data,
            wait_cycles,
            bus_error: false,
        }
    }

    /// Create a write result (no data returned).
    #[must_use]
    pub const fn write_ok() -> Self {
        Self::new(0)
    }

    /// Create a bus error result.
    #[must_use]
    pub const fn error() -> Self {
        Self {
            data: 0,
            wait_cycles: 0,
            bus_error: true,
        }
    }
}

/// Outcome of an interrupt acknowledge cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAck {
    /// The device supplied a vector number.
    Vector(u8),
    /// VPA asserted: use autovector `24 + level`.
    Autovector,
    /// Nothing answered: spurious interrupt, vector 24.
    Spurious,
}

/// Bus trait for 680x0-family CPUs.
///
/// Multi-byte values are big-endian. The CPU masks addresses to the model's
/// address bus width before calling the bus.
pub trait M68kBus {
    /// Read a value of `size` at `addr`.
    fn read(&mut self, size: Size, addr: u32, fc: FunctionCode) -> BusResult;

    /// Write the low `size` bytes of `value` at `addr`.
    fn write(&mut self, size: Size, addr: u32, value: u32, fc: FunctionCode) -> BusResult;

    /// Instruction stream word fetch.
    fn fetch(&mut self, addr: u32, fc: FunctionCode) -> BusResult {
        self.read(Size::Word, addr, fc)
    }

    /// Current level on the interrupt priority lines (0-7).
    fn interrupt_level(&mut self) -> u8;

    /// Interrupt acknowledge cycle for `level`.
    fn interrupt_ack(&mut self, _level: u8) -> InterruptAck {
        InterruptAck::Autovector
    }

    /// The RESET instruction asserted the reset line.
    fn reset(&mut self) {}

    /// An opcode decoded as illegal. Return true to skip it instead of
    /// taking the illegal instruction exception.
    fn illegal_instruction(&mut self, _opcode: u16) -> bool {
        false
    }

    /// The program counter was written by something other than sequential
    /// execution.
    fn pc_changed(&mut self, _pc: u32) {}
}
