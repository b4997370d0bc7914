use thiserror::Error;

/// Faults raised by the machine.
///
/// Every fault aborts the cycle that raised it. Apart from the `opcode` field,
/// which records the faulting instruction word, the machine is left as it was
/// before that cycle began, so the host may inspect it or reset it.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown opcode {opcode:#06X} at {address:#05X}")]
    UnknownOpcode { opcode: u16, address: u16 },

    #[error("unable to load {name}: {size} bytes exceeds the {max} bytes available")]
    OversizeImage {
        name: String,
        size: usize,
        max: usize,
    },

    #[error("stack overflow: call at {address:#05X} with a full call stack")]
    StackOverflow { address: u16 },

    #[error("stack underflow: return at {address:#05X} with an empty call stack")]
    StackUnderflow { address: u16 },

    #[error("memory access out of bounds at {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("no such key {key:#04X}; the keypad has keys 0x0..=0xF")]
    InvalidKey { key: u8 },

    #[error("unable to read ROM")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
