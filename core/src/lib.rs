//! An embeddable Chip-8 machine.
//!
//! The host owns the clock, the screen, the keypad and the speaker: it loads a
//! program, sets keys, calls [`Chip8::step`] at its own pace, and reads back the
//! frame buffer and sound timer.
pub use chip8::{Chip8, SoundEdge};
pub use constants::CLOCK_SPEED;
pub use diagnostics::{Diagnostics, LogDiagnostics, SilentDiagnostics};
pub use error::{Error, Result};
pub use instruction::Instruction;
pub use opcode::Opcode;

mod chip8;
pub mod constants;
mod diagnostics;
mod error;
mod instruction;
mod opcode;
mod operations;
pub mod state;
