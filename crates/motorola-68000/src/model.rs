//! CPU model and capability definitions for the Motorola 680x0 family.
//!
//! Decode and execute consult the capability table at run time, so one core
//! serves every model and `set_cpu_type` can switch between them.

use motorola_68881::FpuModel;

use crate::flags::{SR_MASK_68000, SR_MASK_68020};

/// Selected Motorola 68k CPU model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CpuModel {
    /// Motorola MC68000.
    M68000,
    /// Motorola MC68010.
    M68010,
    /// Motorola MC68020 with an MC68881 coprocessor.
    M68020,
    /// Motorola MC68030 with an MC68882 coprocessor.
    M68030,
    /// Motorola MC68040 with its on-chip FPU.
    M68040,
}

/// Exception stack frame family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFamily {
    /// Short three-word frames, seven-word group 0 frames.
    M68000,
    /// Format word frames; format 8 for bus and address errors.
    M68010,
    /// Formats 0, 1 and 2; format B for bus and address errors.
    M68020,
    /// As the 68020 but format 7 for access errors.
    M68040,
}

/// Capability flags for a specific CPU model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CpuCapabilities {
    /// Vector Base Register (`VBR`) is present.
    pub vbr: bool,
    /// `MOVEC`, `MOVES`, `RTD` and MOVE from CCR are available.
    pub movec: bool,
    /// Cache control registers (`CACR`) are present.
    pub cacr: bool,
    /// `CAAR` is present (68020 and 68030 only).
    pub caar: bool,
    /// Master stack pointer and the M bit.
    pub master_state: bool,
    /// Full extension word addressing and index scaling.
    pub extended_addressing: bool,
    /// Address bus is 32 bits wide rather than 24.
    pub address_bus_32: bool,
    /// Word and long accesses may be misaligned.
    pub misaligned_data: bool,
    /// BFxxx bit field instructions.
    pub bitfield: bool,
    /// 64-bit MULx.L/DIVx.L, EXTB.L, LINK.L, 32-bit branches, TRAPcc.
    pub long_muldiv: bool,
    /// CAS and CAS2.
    pub cas: bool,
    /// CHK2/CMP2 and CHK.L.
    pub chk2: bool,
    /// PACK and UNPK.
    pub pack: bool,
    /// MOVE16 and the CINV/CPUSH cache instructions.
    pub move16: bool,
    /// Trace on change of flow (T0).
    pub trace_flow: bool,
    /// Attached floating-point unit, if any.
    pub fpu: Option<FpuModel>,
    /// Exception stack frame layout.
    pub frames: FrameFamily,
}

impl CpuModel {
    /// Static capability set for this CPU model.
    #[must_use]
    pub const fn capabilities(self) -> CpuCapabilities {
        let m68000 = CpuCapabilities {
            vbr: false,
            movec: false,
            cacr: false,
            caar: false,
            master_state: false,
            extended_addressing: false,
            address_bus_32: false,
            misaligned_data: false,
            bitfield: false,
            long_muldiv: false,
            cas: false,
            chk2: false,
            pack: false,
            move16: false,
            trace_flow: false,
            fpu: None,
            frames: FrameFamily::M68000,
        };
        let m68020 = CpuCapabilities {
            vbr: true,
            movec: true,
            cacr: true,
            caar: true,
            master_state: true,
            extended_addressing: true,
            address_bus_32: true,
            misaligned_data: true,
            bitfield: true,
            long_muldiv: true,
            cas: true,
            chk2: true,
            pack: true,
            move16: false,
            trace_flow: true,
            fpu: Some(FpuModel::Mc68881),
            frames: FrameFamily::M68020,
        };
        match self {
            Self::M68000 => m68000,
            Self::M68010 => CpuCapabilities {
                vbr: true,
                movec: true,
                frames: FrameFamily::M68010,
                ..m68000
            },
            Self::M68020 => m68020,
            Self::M68030 => CpuCapabilities {
                fpu: Some(FpuModel::Mc68882),
                ..m68020
            },
            Self::M68040 => CpuCapabilities {
                caar: false,
                move16: true,
                fpu: Some(FpuModel::Mc68040),
                frames: FrameFamily::M68040,
                ..m68020
            },
        }
    }

    /// Mask applied to every bus address.
    #[must_use]
    pub const fn address_mask(self) -> u32 {
        if self.capabilities().address_bus_32 { 0xFFFF_FFFF } else { 0x00FF_FFFF }
    }

    /// Implemented status register bits.
    #[must_use]
    pub const fn sr_mask(self) -> u16 {
        if self.capabilities().master_state { SR_MASK_68020 } else { SR_MASK_68000 }
    }

    /// Writable CACR bits.
    #[must_use]
    pub const fn cacr_mask(self) -> u32 {
        match self {
            Self::M68000 | Self::M68010 => 0,
            Self::M68020 => 0x0000_000F,
            Self::M68030 => 0x0000_3F1F,
            Self::M68040 => 0x8000_8000,
        }
    }

    /// Convenience helper for decode gating.
    #[must_use]
    pub const fn supports_movec(self) -> bool {
        self.capabilities().movec
    }

    /// Model name as printed on the package.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::M68000 => "68000",
            Self::M68010 => "68010",
            Self::M68020 => "68020",
            Self::M68030 => "68030",
            Self::M68040 => "68040",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn early_models_lack_extensions() {
        let caps = CpuModel::M68000.capabilities();
        assert!(!caps.vbr && !caps.movec && caps.fpu.is_none());
        let caps = CpuModel::M68010.capabilities();
        assert!(caps.vbr && caps.movec && !caps.master_state);
        assert_eq!(caps.frames, FrameFamily::M68010);
        assert!(!CpuModel::M68000.supports_movec());
    }

    #[test]
    fn later_models_widen_the_bus() {
        assert_eq!(CpuModel::M68010.address_mask(), 0x00FF_FFFF);
        assert_eq!(CpuModel::M68020.address_mask(), 0xFFFF_FFFF);
        assert_eq!(CpuModel::M68000.sr_mask(), 0xA71F);
        assert_eq!(CpuModel::M68030.sr_mask(), 0xF71F);
    }

    #[test]
    fn fpu_presence() {
        assert_eq!(CpuModel::M68020.capabilities().fpu, Some(FpuModel::Mc68881));
        assert_eq!(CpuModel::M68040.capabilities().fpu, Some(FpuModel::Mc68040));
        assert!(CpuModel::M68040.capabilities().move16);
        assert!(!CpuModel::M68040.capabilities().caar);
    }
}
