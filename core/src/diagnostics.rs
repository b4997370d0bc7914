use log::{debug, error, info, trace};

use crate::chip8::SoundEdge;
use crate::error::Error;

/// # Diagnostics
/// Observes what the machine does without being able to change it.
///
/// A `Chip8` owns one of these and reports every load, executed instruction,
/// sound edge and fault to it. Every hook defaults to doing nothing.
pub trait Diagnostics {
    /// A ROM image called `name` was copied into memory.
    fn program_loaded(&mut self, _name: &str, _size: usize) {}

    /// The instruction `opcode` fetched from `address` ran to completion.
    fn executed(&mut self, _address: u16, _opcode: u16) {}

    /// The sound timer crossed zero during the last cycle.
    fn sound(&mut self, _edge: SoundEdge) {}

    /// A cycle or load was aborted.
    fn fault(&mut self, _error: &Error) {}
}

/// Forwards every event to the `log` facade; what gets written, and where,
/// is up to whichever logger the host installs.
#[derive(Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn program_loaded(&mut self, name: &str, size: usize) {
        info!("loaded {} [size: {}]", name, size);
    }

    fn executed(&mut self, address: u16, opcode: u16) {
        trace!("{:04X}: {:04X}", address, opcode);
    }

    fn sound(&mut self, edge: SoundEdge) {
        debug!("sound {:?}", edge);
    }

    fn fault(&mut self, err: &Error) {
        error!("{}", err);
    }
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct SilentDiagnostics;

impl Diagnostics for SilentDiagnostics {}
