use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, MEMORY_SIZE, PROGRAM_START, SPRITE_SHEET, STACK_DEPTH,
};
use crate::error::{Error, Result};

/// The FrameBuffer is indexed as [y][x]
pub type FrameBuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// The complete Chip-8 machine state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) doubles as the carry, borrow and collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter
///
/// Pointer
/// - (sp) the next free slot of the stack, 0..=16
///
/// Timers
/// - 2 8-bit timers (delay & sound), decremented once per cycle
/// - A beep sounds for as long as the sound timer is nonzero
///
/// ## Memory
/// - 16 slot stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the sprite sheet
///     - 0x200.. holds the loaded ROM
/// - 64x32 frame buffer of monochrome pixels
///
/// ## Input
/// - 16 booleans tracking the pressed status of keys 0..F
#[derive(Clone, Debug)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_DEPTH],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub pressed_keys: [bool; 16],
    pub opcode: u16,
}

impl State {
    /// A freshly initialized machine: everything zeroed, the sprite sheet
    /// loaded, pc at the program start and the draw flag raised so the host
    /// renders the blank screen.
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[0..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_DEPTH],
            memory,
            frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: true,
            pressed_keys: [false; 16],
            opcode: 0,
        }
    }

    /// Borrow `len` bytes of memory starting at `addr`.
    pub fn read(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let range = Self::span(addr, len)?;
        Ok(&self.memory[range])
    }

    /// Mutably borrow `len` bytes of memory starting at `addr`.
    pub fn write(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let range = Self::span(addr, len)?;
        Ok(&mut self.memory[range])
    }

    fn span(addr: u16, len: usize) -> Result<std::ops::Range<usize>> {
        let start = addr as usize;
        let end = start + len;
        if end > MEMORY_SIZE {
            // report the first byte that falls outside memory
            return Err(Error::MemoryOutOfBounds {
                address: start.max(MEMORY_SIZE),
            });
        }
        Ok(start..end)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_loads_sprite_sheet() {
        let state = State::new();
        assert_eq!(state.memory[0..80], SPRITE_SHEET[..]);
        assert!(state.memory[80..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_new_state_starts_at_program_start() {
        let state = State::new();
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
        assert!(state.draw_flag);
    }

    #[test]
    fn test_read_at_end_of_memory() {
        let state = State::new();
        assert_eq!(state.read(0xFFE, 2).unwrap().len(), 2);
    }

    #[test]
    fn test_read_past_end_of_memory() {
        let state = State::new();
        match state.read(0xFFE, 3) {
            Err(Error::MemoryOutOfBounds { address }) => assert_eq!(address, 0x1000),
            other => panic!("expected out of bounds, got {:?}", other),
        }
    }

    #[test]
    fn test_write_past_end_of_memory() {
        let mut state = State::new();
        assert!(state.write(0x1000, 1).is_err());
    }
}
