//! Addressing mode definitions for the 680x0 family.
//!
//! The mode/register field pair names twelve modes. On the 68020 and later
//! the two indexed modes also accept the full extension word format, which
//! is resolved in `ea.rs`; the mode itself is the same.

/// Addressing mode of an instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Data register direct: Dn
    DataReg(u8),
    /// Address register direct: An
    AddrReg(u8),
    /// Address register indirect: (An)
    AddrInd(u8),
    /// Address register indirect with postincrement: (An)+
    AddrIndPostInc(u8),
    /// Address register indirect with predecrement: -(An)
    AddrIndPreDec(u8),
    /// Address register indirect with displacement: d16(An)
    AddrIndDisp(u8),
    /// Address register indirect with index: d8(An,Xn) or full format
    AddrIndIndex(u8),
    /// Absolute short: (xxx).W
    AbsShort,
    /// Absolute long: (xxx).L
    AbsLong,
    /// Program counter with displacement: d16(PC)
    PcDisp,
    /// Program counter with index: d8(PC,Xn) or full format
    PcIndex,
    /// Immediate: #<data>
    Immediate,
}

impl AddrMode {
    /// Decode addressing mode from mode/register fields.
    #[must_use]
    pub fn decode(mode: u16, reg: u16) -> Option<Self> {
        let r = (reg & 0x07) as u8;
        match mode & 0x07 {
            0 => Some(Self::DataReg(r)),
            1 => Some(Self::AddrReg(r)),
            2 => Some(Self::AddrInd(r)),
            3 => Some(Self::AddrIndPostInc(r)),
            4 => Some(Self::AddrIndPreDec(r)),
            5 => Some(Self::AddrIndDisp(r)),
            6 => Some(Self::AddrIndIndex(r)),
            _ => match r {
                0 => Some(Self::AbsShort),
                1 => Some(Self::AbsLong),
                2 => Some(Self::PcDisp),
                3 => Some(Self::PcIndex),
                4 => Some(Self::Immediate),
                _ => None,
            },
        }
    }

    /// Decode the EA field in the low six bits of an opcode.
    #[must_use]
    pub fn from_opcode(opcode: u16) -> Option<Self> {
        Self::decode(opcode >> 3, opcode)
    }

    /// Any mode that refers to memory.
    #[must_use]
    pub fn is_memory(&self) -> bool {
        !matches!(self, Self::DataReg(_) | Self::AddrReg(_) | Self::Immediate)
    }

    /// Data addressing: everything except An.
    #[must_use]
    pub fn is_data(&self) -> bool {
        !matches!(self, Self::AddrReg(_))
    }

    /// Alterable: everything except PC-relative and immediate.
    #[must_use]
    pub fn is_alterable(&self) -> bool {
        !matches!(self, Self::PcDisp | Self::PcIndex | Self::Immediate)
    }

    /// Check if this mode is a data alterable destination.
    #[must_use]
    pub fn is_data_alterable(&self) -> bool {
        self.is_data() && self.is_alterable()
    }

    /// Check if this mode is memory alterable.
    #[must_use]
    pub fn is_memory_alterable(&self) -> bool {
        self.is_memory() && self.is_alterable()
    }

    /// Control addressing: memory modes without implicit register update.
    #[must_use]
    pub fn is_control(&self) -> bool {
        self.is_memory() && !matches!(self, Self::AddrIndPostInc(_) | Self::AddrIndPreDec(_))
    }

    #[must_use]
    pub fn is_control_alterable(&self) -> bool {
        self.is_control() && self.is_alterable()
    }
}
