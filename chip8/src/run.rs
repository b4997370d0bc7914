use std::fs::File;
use std::io::{self, BufReader};
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use crossterm::event::KeyCode;
use log::{info, warn};

use display::Display;
use emu8_core::{Chip8, SoundEdge};

use crate::keymap::keymap;
use crate::Args;

pub fn run(args: &Args) -> anyhow::Result<()> {
    let mut chip8: Chip8 = Chip8::new();
    if let Some(seed) = args.seed {
        chip8 = chip8.with_seed(seed);
    }

    let stdout = io::stdout();
    let mut display = Display::new(stdout.lock());

    // Load ROM
    let name = args.rom.display().to_string();
    let file = File::open(&args.rom).with_context(|| format!("unable to open {}", name))?;
    let mut reader = BufReader::new(file);
    chip8.load_rom(&name, &mut reader)?;

    // Hold keys
    for key in args.hold.chars() {
        match keymap(KeyCode::Char(key)) {
            Some(kc) => chip8.key_press(kc)?,
            None => bail!("{:?} is not on the keypad", key),
        }
    }

    if args.clock == 0 {
        bail!("the clock must run at 1Hz or more");
    }

    // Set initial timing
    let cycle_time: Duration = Duration::from_secs(1) / args.clock;
    let mut last_cycle: Instant = Instant::now();
    let mut cycles: u64 = 0;

    loop {
        if args.cycles.map_or(false, |limit| cycles >= limit) {
            break;
        }

        // If the draw flag is set, unset it and render the current frame
        if args.show_frames {
            if let Some(frame) = chip8.get_frame() {
                display.render(frame)?;
                chip8.clear_draw_flag();
            }
        }

        // Update state
        match chip8
            .step()
            .with_context(|| format!("halted after {} cycles", cycles))?
        {
            Some(SoundEdge::Start) => info!("beep"),
            Some(SoundEdge::Stop) => info!("silence"),
            None => {}
        }
        cycles += 1;

        // Handle timing
        let current_time = Instant::now();
        let elapsed_cycle_time = current_time - last_cycle;
        if !args.fast && cycle_time > elapsed_cycle_time {
            std::thread::sleep(cycle_time - elapsed_cycle_time);
        }
        last_cycle = Instant::now();
    }

    if chip8.is_beeping() {
        warn!("stopped while the sound timer was still running");
    }
    info!("ran {} cycles", cycles);
    display.render(chip8.frame_buffer())?;
    Ok(())
}
