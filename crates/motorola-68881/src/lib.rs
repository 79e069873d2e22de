//! Motorola 68881/68882 floating-point unit.
//!
//! The FPU is modelled at the level of its programmer-visible state: eight
//! 80-bit data registers and the FPCR, FPSR and FPIAR control registers.
//! Instruction decode and effective addresses belong to the host CPU,
//! which hands this crate decoded commands and operand images. Arithmetic
//! is bit-exact through [`softfloat`]; transcendental functions go through
//! host double precision.
//!
//! The same unit also serves as the on-chip FPU of the 68040, which adds
//! single and double rounding forms of the basic operations.

mod arith;
mod bigint;
mod conditions;
mod constants;
mod formats;
mod fpu;
mod frame;
mod packed;
mod registers;

pub use arith::{Command, Operation};
pub use conditions::{evaluate as evaluate_condition, sets_bsun};
pub use constants::lookup as rom_constant;
pub use formats::{DataFormat, load, store};
pub use fpu::{Fpu, FpuModel};
pub use frame::FrameError;
pub use packed::{decode as decode_packed, encode as encode_packed};
pub use registers::*;
