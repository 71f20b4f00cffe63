use std::io;

/// Errors surfaced by the interpreter. Unknown opcodes are not among them:
/// those are logged and skipped.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("stack overflow: call at {pc:#05X} with 16 return addresses already stacked")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#05X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("machine is halted, reset it before stepping again")]
    Halted,

    #[error("failed to read program: {0}")]
    Io(#[from] io::Error),
}
