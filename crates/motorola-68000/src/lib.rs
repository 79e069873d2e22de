//! Motorola 68000-family CPU core: 68000, 68010, 68020, 68030 and 68040.
//!
//! The CPU executes one instruction per [`Cpu68000::execute`] call against
//! a host-supplied [`M68kBus`]. Model differences (address bus width,
//! stack frame formats, instruction set extensions, the FPU) come from the
//! [`CpuCapabilities`] table of the selected [`CpuModel`]. F-line
//! instructions are handed to the `motorola-68881` FPU when the model has
//! one.

pub mod addressing;
pub mod alu;
mod arith;
mod branches;
pub mod bus;
mod cpu;
pub mod decode;
mod ea;
pub mod exceptions;
mod execute;
pub mod flags;
mod fpu;
mod logic;
mod misc;
pub mod model;
pub mod registers;
mod shifts;
mod timing;

pub use alu::Size;
pub use bus::{BusResult, FunctionCode, InterruptAck, M68kBus};
pub use cpu::Cpu68000;
pub use decode::{Instruction, decode};
pub use exceptions::{AccessFault, ExecuteError, FaultState, FrameFormat};
pub use model::{CpuCapabilities, CpuModel, FrameFamily};
pub use motorola_68881 as fpu68881;
pub use registers::{Register, Registers};
