//! A CHIP-8 interpreter core: memory, registers, timers, keypad and a 64x32
//! monochrome framebuffer, driven one instruction at a time by the host.

pub mod chip8;

pub use crate::chip8::{
    Chip8, Chip8Error, LoadStore, Opcode, Quirks, SpriteEdge, FONTSET, KEY_COUNT,
    MAX_PROGRAM_SIZE, MEMORY_SIZE, PROGRAM_START, SCREEN_HEIGHT, SCREEN_WIDTH, STACK_SIZE,
};
