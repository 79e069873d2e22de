//! FPU condition predicates for FBcc, FScc, FDBcc and FTRAPcc.
//!
//! A predicate is six bits. Predicates 0x10-0x1F are the IEEE-aware
//! "signalling" forms: they evaluate exactly like 0x00-0x0F but also set
//! BSUN when the NaN condition bit is set. 0x20-0x3F are reserved.

use crate::registers::{FPSR_CC_N, FPSR_CC_NAN, FPSR_CC_Z};

/// Evaluate `predicate` against the FPSR condition codes.
///
/// Returns `None` for a reserved predicate.
#[must_use]
pub fn evaluate(predicate: u8, fpsr: u32) -> Option<bool> {
    if predicate > 0x1F {
        return None;
    }
    let n = fpsr & FPSR_CC_N != 0;
    let z = fpsr & FPSR_CC_Z != 0;
    let nan = fpsr & FPSR_CC_NAN != 0;

    Some(match predicate & 0x0F {
        0x0 => false,                 // F / SF
        0x1 => z,                     // EQ / SEQ
        0x2 => !(nan || z || n),      // OGT / GT
        0x3 => z || !(nan || n),      // OGE / GE
        0x4 => n && !(nan || z),      // OLT / LT
        0x5 => z || (n && !nan),      // OLE / LE
        0x6 => !(nan || z),           // OGL / GL
        0x7 => !nan,                  // OR / GLE
        0x8 => nan,                   // UN / NGLE
        0x9 => nan || z,              // UEQ / NGL
        0xA => nan || !(n || z),      // UGT / NLE
        0xB => nan || z || !n,        // UGE / NLT
        0xC => nan || (n && !z),      // ULT / NGE
        0xD => nan || z || n,         // ULE / NGT
        0xE => !z,                    // NE / SNE
        _ => true,                    // T / ST
    })
}

/// True if evaluating `predicate` with the NaN bit set raises BSUN.
#[must_use]
pub const fn sets_bsun(predicate: u8, fpsr: u32) -> bool {
    predicate & 0x10 != 0 && fpsr & FPSR_CC_NAN != 0
}
