use rand::RngCore;

use crate::error::Result;
use crate::opcode::Opcode;
use crate::operations::*;
use crate::state::State;

/// Every operation the machine understands, with its operands already decoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 1nnn
    Jump(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SkipEqImm { x: u8, kk: u8 },
    /// 4xkk
    SkipNeImm { x: u8, kk: u8 },
    /// 5xy0
    SkipEqReg { x: u8, y: u8 },
    /// 6xkk
    LoadImm { x: u8, kk: u8 },
    /// 7xkk
    AddImm { x: u8, kk: u8 },
    /// 8xy0
    Move { x: u8, y: u8 },
    /// 8xy1
    Or { x: u8, y: u8 },
    /// 8xy2
    And { x: u8, y: u8 },
    /// 8xy3
    Xor { x: u8, y: u8 },
    /// 8xy4
    AddReg { x: u8, y: u8 },
    /// 8xy5
    Sub { x: u8, y: u8 },
    /// 8xy6
    ShiftRight { x: u8 },
    /// 8xy7
    SubN { x: u8, y: u8 },
    /// 8xyE
    ShiftLeft { x: u8 },
    /// 9xy0
    SkipNeReg { x: u8, y: u8 },
    /// Annn
    LoadI(u16),
    /// Bnnn
    JumpV0(u16),
    /// Cxkk
    Random { x: u8, kk: u8 },
    /// Dxyn
    Draw { x: u8, y: u8, n: u8 },
    /// Ex9E
    SkipPressed { x: u8 },
    /// ExA1
    SkipNotPressed { x: u8 },
    /// Fx07
    LoadDelay { x: u8 },
    /// Fx0A
    WaitKey { x: u8 },
    /// Fx15
    SetDelay { x: u8 },
    /// Fx18
    SetSound { x: u8 },
    /// Fx1E
    AddI { x: u8 },
    /// Fx29
    LoadGlyph { x: u8 },
    /// Fx33
    StoreBcd { x: u8 },
    /// Fx55
    StoreRegs { x: u8 },
    /// Fx65
    LoadRegs { x: u8 },
}

impl Instruction {
    /// Selects the Instruction for a given Opcode.
    ///
    /// Family 0 is told apart by its low nibble alone, so `0nn0` clears the screen
    /// and `0nnE` returns. Returns `None` for any opcode outside the instruction set.
    pub fn decode(op: Opcode) -> Option<Self> {
        use Instruction::*;

        let (x, y, n, kk, nnn) = (op.x(), op.y(), op.n(), op.kk(), op.nnn());
        let instruction = match op.nibbles() {
            (0x0, .., 0x0) => Clear,
            (0x0, .., 0xE) => Return,
            (0x1, ..) => Jump(nnn),
            (0x2, ..) => Call(nnn),
            (0x3, ..) => SkipEqImm { x, kk },
            (0x4, ..) => SkipNeImm { x, kk },
            (0x5, ..) => SkipEqReg { x, y },
            (0x6, ..) => LoadImm { x, kk },
            (0x7, ..) => AddImm { x, kk },
            (0x8, .., 0x0) => Move { x, y },
            (0x8, .., 0x1) => Or { x, y },
            (0x8, .., 0x2) => And { x, y },
            (0x8, .., 0x3) => Xor { x, y },
            (0x8, .., 0x4) => AddReg { x, y },
            (0x8, .., 0x5) => Sub { x, y },
            (0x8, .., 0x6) => ShiftRight { x },
            (0x8, .., 0x7) => SubN { x, y },
            (0x8, .., 0xE) => ShiftLeft { x },
            (0x9, ..) => SkipNeReg { x, y },
            (0xA, ..) => LoadI(nnn),
            (0xB, ..) => JumpV0(nnn),
            (0xC, ..) => Random { x, kk },
            (0xD, ..) => Draw { x, y, n },
            (0xE, .., 0x9, 0xE) => SkipPressed { x },
            (0xE, .., 0xA, 0x1) => SkipNotPressed { x },
            (0xF, .., 0x0, 0x7) => LoadDelay { x },
            (0xF, .., 0x0, 0xA) => WaitKey { x },
            (0xF, .., 0x1, 0x5) => SetDelay { x },
            (0xF, .., 0x1, 0x8) => SetSound { x },
            (0xF, .., 0x1, 0xE) => AddI { x },
            (0xF, .., 0x2, 0x9) => LoadGlyph { x },
            (0xF, .., 0x3, 0x3) => StoreBcd { x },
            (0xF, .., 0x5, 0x5) => StoreRegs { x },
            (0xF, .., 0x6, 0x5) => LoadRegs { x },
            _ => return None,
        };
        Some(instruction)
    }

    /// Applies the instruction to `state`, leaving pc at the next instruction to run.
    ///
    /// `rng` supplies the random bytes for `Cxkk`.
    pub fn execute(self, state: &mut State, rng: &mut dyn RngCore) -> Result<()> {
        use Instruction::*;

        match self {
            Clear => clr(state),
            Return => rts(state)?,
            Jump(addr) => jump(state, addr),
            Call(addr) => call(state, addr)?,
            SkipEqImm { x, kk } => ske(state, x, kk),
            SkipNeImm { x, kk } => skne(state, x, kk),
            SkipEqReg { x, y } => skre(state, x, y),
            LoadImm { x, kk } => load(state, x, kk),
            AddImm { x, kk } => add(state, x, kk),
            Move { x, y } => mv(state, x, y),
            Or { x, y } => or(state, x, y),
            And { x, y } => and(state, x, y),
            Xor { x, y } => xor(state, x, y),
            AddReg { x, y } => addr(state, x, y),
            Sub { x, y } => sub(state, x, y),
            ShiftRight { x } => shr(state, x),
            SubN { x, y } => subn(state, x, y),
            ShiftLeft { x } => shl(state, x),
            SkipNeReg { x, y } => skrne(state, x, y),
            LoadI(addr) => loadi(state, addr),
            JumpV0(addr) => jumpi(state, addr),
            Random { x, kk } => rnd(state, rng, x, kk),
            Draw { x, y, n } => draw(state, x, y, n)?,
            SkipPressed { x } => skpr(state, x)?,
            SkipNotPressed { x } => skup(state, x)?,
            LoadDelay { x } => moved(state, x),
            WaitKey { x } => keyd(state, x),
            SetDelay { x } => loads(state, x),
            SetSound { x } => ld(state, x),
            AddI { x } => addi(state, x),
            LoadGlyph { x } => ldspr(state, x),
            StoreBcd { x } => bcd(state, x)?,
            StoreRegs { x } => stor(state, x)?,
            LoadRegs { x } => read(state, x)?,
        }
        Ok(())
    }
}
