use std::path::PathBuf;

use clap::Parser;

use emu8_core::CLOCK_SPEED;

mod keymap;
mod run;

/// Runs a Chip-8 ROM headlessly, drawing frames to the terminal.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// ROM image to load at 0x200
    pub rom: PathBuf,

    /// Cycles per second; the timers tick once per cycle
    #[arg(long, default_value_t = CLOCK_SPEED)]
    pub clock: u32,

    /// Stop after this many cycles instead of running forever
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Seed for the random number instruction
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keys held down for the whole run, named by the 1234/qwer/asdf/zxcv layout
    #[arg(long, default_value = "")]
    pub hold: String,

    /// Print every frame as it is drawn, not just the last one
    #[arg(long)]
    pub show_frames: bool,

    /// Run as fast as possible instead of respecting the clock
    #[arg(long)]
    pub fast: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    run::run(&args)
}
