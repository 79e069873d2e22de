//! FSAVE/FRESTORE internal state frames.
//!
//! The frame starts with a format long word: version number in bits 31-24,
//! size in bytes of the rest of the frame in bits 23-16. A zero version is
//! the null frame of an FPU that has not executed anything since reset.
//! The internal state following the header is not modelled; an idle frame
//! is written as zeros and its contents are ignored on restore.

use thiserror::Error;

use crate::fpu::{Fpu, FpuModel};

/// Version byte of a 68881/68882 idle frame.
const VERSION_6888X: u8 = 0x1F;
/// Version byte of a 68040 frame.
const VERSION_68040: u8 = 0x41;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// FRESTORE of a frame this FPU cannot have produced. The CPU takes a
    /// format error exception.
    #[error("unrecognised FPU state frame header {0:#010X}")]
    InvalidFormat(u32),
}

/// Frame sizes accepted by FRESTORE, per version byte.
fn accepted_sizes(model: FpuModel, version: u8) -> &'static [u8] {
    match (model, version) {
        (FpuModel::Mc68881 | FpuModel::Mc68882, VERSION_6888X) => &[0x18, 0x38, 0xB4, 0xD4],
        (FpuModel::Mc68040, VERSION_68040) => &[0x00, 0x28, 0x60],
        _ => &[],
    }
}

impl Fpu {
    /// Idle frame size in bytes, excluding the header.
    const fn idle_size(&self) -> u8 {
        match self.model {
            FpuModel::Mc68881 => 0x18,
            FpuModel::Mc68882 => 0x38,
            FpuModel::Mc68040 => 0x00,
        }
    }

    /// FSAVE: the frame as long words, header first.
    #[must_use]
    pub fn save_frame(&self) -> Vec<u32> {
        if self.just_reset {
            return vec![0];
        }
        let size = self.idle_size();
        let version = match self.model {
            FpuModel::Mc68040 => VERSION_68040,
            _ => VERSION_6888X,
        };
        let mut frame = vec![0; 1 + usize::from(size) / 4];
        frame[0] = (u32::from(version) << 24) | (u32::from(size) << 16);
        frame
    }

    /// FRESTORE: validate the header and update state. Returns the number
    /// of bytes that follow the header in memory.
    pub fn restore_frame(&mut self, header: u32) -> Result<u32, FrameError> {
        let version = (header >> 24) as u8;
        if version == 0 {
            log::debug!("fpu: null frame restored, resetting");
            self.reset();
            return Ok(0);
        }
        let size = (header >> 16) as u8;
        if !accepted_sizes(self.model, version).contains(&size) {
            log::warn!("fpu: rejecting state frame {header:#010X}");
            return Err(FrameError::InvalidFormat(header));
        }
        self.just_reset = false;
        Ok(u32::from(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_fpu_saves_null_frame() {
        let fpu = Fpu::new(FpuModel::Mc68881);
        assert_eq!(fpu.save_frame(), vec![0]);
    }

    #[test]
    fn idle_frame_shapes() {
        let mut fpu = Fpu::new(FpuModel::Mc68881);
        fpu.begin_instruction(0);
        let frame = fpu.save_frame();
        assert_eq!(frame[0], 0x1F18_0000);
        assert_eq!(frame.len(), 7);

        let mut fpu = Fpu::new(FpuModel::Mc68882);
        fpu.begin_instruction(0);
        assert_eq!(fpu.save_frame().len(), 15);

        let mut fpu = Fpu::new(FpuModel::Mc68040);
        fpu.begin_instruction(0);
        assert_eq!(fpu.save_frame(), vec![0x4100_0000]);
    }

    #[test]
    fn null_restore_resets() {
        let mut fpu = Fpu::new(FpuModel::Mc68882);
        fpu.set_fpcr(0x30);
        fpu.fp[0] = softfloat::FloatX80::ONE;
        fpu.just_reset = false;
        assert_eq!(fpu.restore_frame(0), Ok(0));
        assert_eq!(fpu.fpcr, 0);
        assert!(fpu.fp[0].is_nan());
        assert!(fpu.just_reset);
    }

    #[test]
    fn idle_restore_round_trips() {
        let mut fpu = Fpu::new(FpuModel::Mc68882);
        fpu.begin_instruction(0);
        let header = fpu.save_frame()[0];
        fpu.reset();
        assert_eq!(fpu.restore_frame(header), Ok(0x38));
        assert!(!fpu.just_reset);
    }

    #[test]
    fn foreign_frame_is_a_format_error() {
        let mut fpu = Fpu::new(FpuModel::Mc68881);
        assert_eq!(fpu.restore_frame(0x4100_0000), Err(FrameError::InvalidFormat(0x4100_0000)));
        assert_eq!(fpu.restore_frame(0x1F20_0000), Err(FrameError::InvalidFormat(0x1F20_0000)));
    }
}
