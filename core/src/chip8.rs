use std::io::Read;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::{MAX_PROGRAM_SIZE, PROGRAM_START};
use crate::diagnostics::{Diagnostics, LogDiagnostics};
use crate::error::{Error, Result};
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::state::{FrameBuffer, State};

/// A change in whether the machine wants a tone played.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SoundEdge {
    /// The sound timer went from zero to nonzero.
    Start,
    /// The sound timer reached zero.
    Stop,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the random source behind `Cxkk`
///  - a `Diagnostics` sink that is told about loads, instructions and faults
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys
/// - advancing the machine one cycle at a time
/// - inspecting its frame buffer for rendering by some display
/// - inspecting its sound timer for playback by some speaker
///
/// The machine never paces itself; the host calls `step` at whatever rate it likes.
pub struct Chip8 {
    state: State,
    rng: StdRng,
    diagnostics: Box<dyn Diagnostics + Send>,
}

impl Chip8 {
    pub fn new() -> Self {
        Chip8 {
            state: State::new(),
            rng: StdRng::from_entropy(),
            diagnostics: Box::new(LogDiagnostics),
        }
    }

    /// Makes the random bytes drawn by `Cxkk` reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replaces the default `LogDiagnostics`.
    pub fn with_diagnostics(mut self, diagnostics: Box<dyn Diagnostics + Send>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Zeroes the machine, reloads the sprite sheet and points pc at the program start.
    /// Any loaded program is discarded.
    pub fn initialize(&mut self) {
        self.state = State::new();
    }

    /// Copy a ROM image into memory at the program start
    ///
    /// # Arguments
    /// * `name` how the image is referred to in diagnostics and errors
    /// * `bytes` the raw image; at most `MAX_PROGRAM_SIZE` bytes
    pub fn load_program(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_PROGRAM_SIZE {
            let err = Error::OversizeImage {
                name: name.to_string(),
                size: bytes.len(),
                max: MAX_PROGRAM_SIZE,
            };
            self.diagnostics.fault(&err);
            return Err(err);
        }

        let start = PROGRAM_START as usize;
        self.state.memory[start..start + bytes.len()].copy_from_slice(bytes);
        self.diagnostics.program_loaded(name, bytes.len());
        Ok(())
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `name` how the image is referred to in diagnostics and errors
    /// * `reader` a file reader that contains a ROM
    pub fn load_rom(&mut self, name: &str, reader: &mut dyn Read) -> Result<()> {
        let mut bytes = Vec::with_capacity(MAX_PROGRAM_SIZE);
        reader.read_to_end(&mut bytes)?;
        self.load_program(name, &bytes)
    }

    /// Advances the machine by a single cycle
    /// - fetches, decodes and executes the opcode at pc
    /// - ticks both timers once
    ///
    /// One timer tick per instruction is the whole timing model; a host that wants
    /// 60Hz timers calls this at 60Hz.
    ///
    /// Returns the sound edge crossed during the cycle, if any. A fault aborts the
    /// cycle before the timers tick and leaves pc on the faulting instruction.
    pub fn step(&mut self) -> Result<Option<SoundEdge>> {
        let result = self.cycle();
        if let Err(ref err) = result {
            self.diagnostics.fault(err);
        }
        result
    }

    fn cycle(&mut self) -> Result<Option<SoundEdge>> {
        let address = self.state.pc;
        let op = Opcode::fetch(&self.state)?;
        self.state.opcode = op.0;

        let instruction = Instruction::decode(op).ok_or(Error::UnknownOpcode {
            opcode: op.0,
            address,
        })?;

        let sound_before = self.state.sound_timer;
        instruction.execute(&mut self.state, &mut self.rng)?;
        self.diagnostics.executed(address, op.0);

        let edge = self.advance_timers(sound_before);
        if let Some(edge) = edge {
            self.diagnostics.sound(edge);
        }
        Ok(edge)
    }

    /// Decrements both timers, stopping at 0
    ///
    /// A sound timer that hits 0 this tick is a `Stop`, even when the instruction
    /// just before set it to 1; otherwise a sound timer that was 0 before the
    /// instruction and is still running is a `Start`.
    fn advance_timers(&mut self, sound_before: u8) -> Option<SoundEdge> {
        let sound_set = self.state.sound_timer;
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = sound_set.saturating_sub(1);

        if sound_set > 0 && self.state.sound_timer == 0 {
            Some(SoundEdge::Stop)
        } else if sound_before == 0 && self.state.sound_timer > 0 {
            Some(SoundEdge::Start)
        } else {
            None
        }
    }

    /// Whether the frame buffer changed since the draw flag was last cleared
    pub fn draw_pending(&self) -> bool {
        self.state.draw_flag
    }

    /// Marks the current frame as consumed
    pub fn clear_draw_flag(&mut self) {
        self.state.draw_flag = false;
    }

    /// Returns the FrameBuffer if the display should be redrawn
    pub fn get_frame(&self) -> Option<&FrameBuffer> {
        if self.state.draw_flag {
            Some(&self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 8-bit representation of the key, 0x0..=0xF
    /// * `pressed` whether it is held down
    pub fn set_key(&mut self, key: u8, pressed: bool) -> Result<()> {
        let slot = self
            .state
            .pressed_keys
            .get_mut(key as usize)
            .ok_or(Error::InvalidKey { key })?;
        *slot = pressed;
        Ok(())
    }

    pub fn key_press(&mut self, key: u8) -> Result<()> {
        self.set_key(key, true)
    }

    pub fn key_release(&mut self, key: u8) -> Result<()> {
        self.set_key(key, false)
    }

    pub fn sound_timer(&self) -> u8 {
        self.state.sound_timer
    }

    pub fn delay_timer(&self) -> u8 {
        self.state.delay_timer
    }

    /// Whether a tone should currently be playing
    pub fn is_beeping(&self) -> bool {
        self.state.sound_timer != 0
    }

    /// The most recently fetched opcode
    pub fn opcode(&self) -> u16 {
        self.state.opcode
    }

    pub fn state(&self) -> &State {
        &self.state
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::SilentDiagnostics;
    use std::sync::{Arc, Mutex};

    fn chip8_with(program: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::new()
            .with_seed(0x8)
            .with_diagnostics(Box::new(SilentDiagnostics));
        chip8.load_program("test", program).unwrap();
        chip8
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Diagnostics for Recorder {
        fn program_loaded(&mut self, name: &str, size: usize) {
            self.0.lock().unwrap().push(format!("load {} {}", name, size));
        }

        fn executed(&mut self, address: u16, opcode: u16) {
            self.0
                .lock()
                .unwrap()
                .push(format!("exec {:04X} {:04X}", address, opcode));
        }

        fn sound(&mut self, edge: SoundEdge) {
            self.0.lock().unwrap().push(format!("sound {:?}", edge));
        }

        fn fault(&mut self, _error: &Error) {
            self.0.lock().unwrap().push("fault".to_string());
        }
    }

    #[test]
    fn test_cycles_advance_pc() {
        // CLS
        let mut chip8 = chip8_with(&[0x00, 0xE0]);
        chip8.step().unwrap();
        assert_eq!(chip8.state.pc, 0x202);
        assert_eq!(chip8.opcode(), 0x00E0);
    }

    #[test]
    fn test_unknown_opcode_faults() {
        let mut chip8 = chip8_with(&[0xFF, 0xFF]);
        chip8.state.v[0x3] = 0x7;
        let before = chip8.state.clone();
        match chip8.step() {
            Err(Error::UnknownOpcode { opcode, address }) => {
                assert_eq!(opcode, 0xFFFF);
                assert_eq!(address, 0x200);
            }
            other => panic!("expected unknown opcode, got {:?}", other),
        }
        // only the opcode field records the faulting word
        assert_eq!(chip8.opcode(), 0xFFFF);
        assert_eq!(chip8.state.pc, before.pc);
        assert_eq!(chip8.state.v, before.v);
        assert_eq!(chip8.state.i, before.i);
        assert_eq!(chip8.state.sp, before.sp);
        assert_eq!(chip8.state.delay_timer, before.delay_timer);
        assert_eq!(chip8.state.sound_timer, before.sound_timer);
        assert_eq!(chip8.state.memory[..], before.memory[..]);
    }

    #[test]
    fn test_fetch_past_end_of_memory_faults() {
        // V0 = 0xFF; jump to V0 + 0xFFF
        let mut chip8 = chip8_with(&[0x60, 0xFF, 0xBF, 0xFF]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert!(matches!(
            chip8.step(),
            Err(Error::MemoryOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_load_program_rejects_oversize_image() {
        let mut chip8 = chip8_with(&[]);
        assert!(chip8.load_program("fits", &[0xAA; MAX_PROGRAM_SIZE]).is_ok());
        assert_eq!(chip8.state.memory[0xFFF], 0xAA);
        match chip8.load_program("too big", &[0; MAX_PROGRAM_SIZE + 1]) {
            Err(Error::OversizeImage { name, size, max }) => {
                assert_eq!(name, "too big");
                assert_eq!(size, 3585);
                assert_eq!(max, 3584);
            }
            other => panic!("expected oversize image, got {:?}", other),
        }
    }

    #[test]
    fn test_load_rom_reads_whole_reader() {
        let mut chip8 = chip8_with(&[]);
        let mut rom: &[u8] = &[0x12, 0x34, 0x56];
        chip8.load_rom("reader", &mut rom).unwrap();
        assert_eq!(chip8.state.memory[0x200..0x203], [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_initialize_discards_program() {
        let mut chip8 = chip8_with(&[0x60, 0x01]);
        chip8.step().unwrap();
        chip8.initialize();
        assert_eq!(chip8.state.pc, 0x200);
        assert_eq!(chip8.state.v[0x0], 0x0);
        assert_eq!(chip8.state.memory[0x200], 0x0);
        assert!(chip8.draw_pending());
    }

    #[test]
    fn test_set_key() {
        let mut chip8 = chip8_with(&[]);
        chip8.set_key(0xE, true).unwrap();
        assert!(chip8.state.pressed_keys[0xE]);
        chip8.key_release(0xE).unwrap();
        assert!(!chip8.state.pressed_keys[0xE]);
    }

    #[test]
    fn test_set_key_rejects_invalid_key() {
        let mut chip8 = chip8_with(&[]);
        assert!(matches!(
            chip8.key_press(0x10),
            Err(Error::InvalidKey { key: 0x10 })
        ));
    }

    #[test]
    fn test_timers_tick_once_per_cycle_and_stop_at_zero() {
        // V0 = 2; DT = V0; then two CLS
        let mut chip8 = chip8_with(&[0x60, 0x02, 0xF0, 0x15, 0x00, 0xE0, 0x00, 0xE0]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.delay_timer(), 1);
        chip8.step().unwrap();
        assert_eq!(chip8.delay_timer(), 0);
        chip8.step().unwrap();
        assert_eq!(chip8.delay_timer(), 0);
    }

    #[test]
    fn test_sound_edges() {
        // V0 = 3; ST = V0; then CLS until it runs out
        let mut chip8 = chip8_with(&[0x60, 0x03, 0xF0, 0x18, 0x00, 0xE0, 0x00, 0xE0]);
        assert_eq!(chip8.step().unwrap(), None);
        assert_eq!(chip8.step().unwrap(), Some(SoundEdge::Start));
        assert!(chip8.is_beeping());
        assert_eq!(chip8.step().unwrap(), None);
        assert_eq!(chip8.step().unwrap(), Some(SoundEdge::Stop));
        assert!(!chip8.is_beeping());
    }

    #[test]
    fn test_single_tick_beep_is_a_stop() {
        // V0 = 1; ST = V0
        let mut chip8 = chip8_with(&[0x60, 0x01, 0xF0, 0x18]);
        chip8.step().unwrap();
        assert_eq!(chip8.step().unwrap(), Some(SoundEdge::Stop));
        assert_eq!(chip8.sound_timer(), 0);
    }

    #[test]
    fn test_fault_does_not_tick_timers() {
        let mut chip8 = chip8_with(&[0x00, 0xEE]);
        chip8.state.delay_timer = 5;
        assert!(chip8.step().is_err());
        assert_eq!(chip8.delay_timer(), 5);
    }

    #[test]
    fn test_get_frame_follows_draw_flag() {
        let mut chip8 = chip8_with(&[]);
        assert!(chip8.get_frame().is_some());
        chip8.clear_draw_flag();
        assert!(chip8.get_frame().is_none());
        assert!(!chip8.draw_pending());
    }

    #[test]
    fn test_same_seed_same_random_bytes() {
        let program = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF];
        let mut a = chip8_with(&program);
        let mut b = chip8_with(&program);
        for _ in 0..3 {
            a.step().unwrap();
            b.step().unwrap();
        }
        assert_eq!(a.state.v[..3], b.state.v[..3]);
    }

    #[test]
    fn test_diagnostics_sees_loads_instructions_and_faults() {
        let recorder = Recorder::default();
        let mut chip8 = Chip8::new().with_diagnostics(Box::new(recorder.clone()));
        chip8
            .load_program("rom", &[0x60, 0x01, 0xF0, 0x18, 0xFF, 0xFF])
            .unwrap();
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert!(chip8.step().is_err());
        assert_eq!(
            recorder.events(),
            vec![
                "load rom 6",
                "exec 0200 6001",
                "exec 0202 F018",
                "sound Stop",
                "fault",
            ]
        );
    }
}
