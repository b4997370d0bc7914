use std::fmt;

use crate::error::Result;
use crate::state::State;

/// # Opcodes
///
/// Chip-8 opcodes are 16 bits each, stored big-endian: the high byte lives at
/// the lower address. Their behavior is cased on some combination of:
/// - `(n, _, _, _)` broad categorization; applies to all opcodes
/// - `(_, _, _, n)` specific behavior within a category
/// - `(_, _, n, n)` more specific behavior within a category
/// - `(_, n, n, n)` some fixed function that doesn't require variables (e.g. CLS; clear screen)
///
/// Nibbles not used to determine the operation often (but not always) carry important data.
/// - `(_, n, n, n)` a 12-bit address or immediate, `nnn`
/// - `(_, _, n, n)` a byte that is assigned to and/or compared with Vx, `kk`
/// - `(_, n, _, _)` either the register Vx or the range of registers V0..=Vx, `x`
/// - `(_, _, n, _)` the register Vy, `y`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Reads the opcode pointed at by `state.pc`.
    pub fn fetch(state: &State) -> Result<Self> {
        let word = state.read(state.pc, 2)?;
        Ok(Opcode(u16::from(word[0]) << 8 | u16::from(word[1])))
    }

    /// The Opcode's component nibbles, most significant first.
    pub fn nibbles(self) -> (u8, u8, u8, u8) {
        (self.family(), self.x(), self.y(), self.n())
    }

    /// `[F___]`
    pub fn family(self) -> u8 {
        ((self.0 & 0xF000) >> 12) as u8
    }

    /// `[_x__]`
    pub fn x(self) -> u8 {
        ((self.0 & 0x0F00) >> 8) as u8
    }

    /// `[__y_]`
    pub fn y(self) -> u8 {
        ((self.0 & 0x00F0) >> 4) as u8
    }

    /// `[___n]`
    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// `[__kk]`
    pub fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// `[_nnn]`
    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}
