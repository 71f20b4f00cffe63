use log::{debug, error, info, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Read;

mod error;
mod opcode;
mod quirks;

pub use error::Chip8Error;
pub use opcode::Opcode;
pub use quirks::{LoadStore, Quirks, SpriteEdge};

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: u16 = 0x200; // programs start at 0x200
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;
pub const STACK_SIZE: usize = 16;
pub const KEY_COUNT: usize = 16;

const ADDRESS_MASK: u16 = 0x0FFF;
const FONT_GLYPH_BYTES: u16 = 5;

/// Hex digit glyphs 0-F, five rows each, stored at the bottom of memory.
pub const FONTSET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

type OpcodeFn = fn(&mut Chip8) -> Result<(), Chip8Error>;

// indexed by the high nibble of the opcode
const OPCODE_FNS: [OpcodeFn; 16] = [
    Chip8::cls_ret, // 00E0 / 00EE
    Chip8::jmp,     // 1NNN
    Chip8::call,    // 2NNN
    Chip8::eb,      // 3XKK
    Chip8::neb,     // 4XKK
    Chip8::er,      // 5XY0
    Chip8::ld,      // 6XKK
    Chip8::addb,    // 7XKK
    Chip8::alu,     // 8XY*
    Chip8::ner,     // 9XY0
    Chip8::si,      // ANNN
    Chip8::jmpo,    // BNNN
    Chip8::rng,     // CXKK
    Chip8::draw,    // DXYN
    Chip8::key,     // EX9E / EXA1
    Chip8::ex,      // FX**
];

/// A CHIP-8 machine. The caller drives it: `step()` runs one instruction,
/// `tick_timers()` should be called at 60Hz independently of that.
pub struct Chip8 {
    opcode: Opcode,                           // current opcode
    memory: [u8; MEMORY_SIZE],                // system memory
    v: [u8; 16],                              // registers V0-VE (VF is flag for some instructions)
    i: u16,                                   // address register
    pc: u16,                                  // program counter
    gfx: [u8; SCREEN_WIDTH * SCREEN_HEIGHT], // pixels state
    delay_timer: u8,
    sound_timer: u8, // timers count down at 60Hz
    stack: [u16; STACK_SIZE],
    sp: u16,                // stack pointer
    keys: [bool; KEY_COUNT], // hex keypad state

    draw_flag: bool,
    awaiting_key: Option<usize>, // register waiting on FX0A
    halted: bool,
    quirks: Quirks,
    rng: StdRng,
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_quirks(Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Self {
        let mut chip8 = Self {
            opcode: Opcode(0),
            memory: [0; MEMORY_SIZE],
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            gfx: [0; SCREEN_WIDTH * SCREEN_HEIGHT],
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            sp: 0,
            keys: [false; KEY_COUNT],

            draw_flag: false,
            awaiting_key: None,
            halted: false,
            quirks,
            rng: seeded_rng(quirks.rng_seed),
        };
        chip8.reset();
        chip8
    }

    /// Put the machine back in its power-on state. Quirks are kept and a
    /// seeded random source restarts its sequence.
    pub fn reset(&mut self) {
        self.opcode = Opcode(0);
        self.memory = [0; MEMORY_SIZE];
        // CHIP-8 systems had the interpreter in the first 512 bytes of memory
        // since we're emulating that we can just store the fontset there
        self.memory[..FONTSET.len()].copy_from_slice(&FONTSET);
        self.v = [0; 16];
        self.i = 0;
        self.pc = PROGRAM_START;
        self.gfx = [0; SCREEN_WIDTH * SCREEN_HEIGHT];
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.stack = [0; STACK_SIZE];
        self.sp = 0;
        self.keys = [false; KEY_COUNT];
        self.draw_flag = false;
        self.awaiting_key = None;
        self.halted = false;
        self.rng = seeded_rng(self.quirks.rng_seed);
        debug!("machine reset, pc={:03X}", self.pc);
    }

    /// Copy a program into memory at 0x200. Nothing is written if it does
    /// not fit.
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        if program.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        debug!("loaded {} byte program at {:03X}", program.len(), start);
        Ok(())
    }

    pub fn load_from<R: Read>(&mut self, mut reader: R) -> Result<(), Chip8Error> {
        let mut program = Vec::new();
        reader.read_to_end(&mut program)?;
        self.load_program(&program)
    }

    /// Execute one instruction. While an FX0A is pending this only polls the
    /// keypad and leaves pc on the waiting instruction.
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        if self.halted {
            return Err(Chip8Error::Halted);
        }

        if let Some(x) = self.awaiting_key {
            self.poll_key(x);
            return Ok(());
        }

        // two-byte opcodes
        self.opcode = Opcode::from_bytes(
            self.read_byte(self.pc),
            self.read_byte(self.pc.wrapping_add(1)),
        );

        trace!(
            "{:03X}: {} V={:02X?} I={:03X} SP={}",
            self.pc,
            self.opcode,
            self.v,
            self.i,
            self.sp
        );

        let f = OPCODE_FNS[self.opcode.group()];
        if let Err(e) = f(self) {
            error!("{}, halting", e);
            self.halted = true;
            return Err(e);
        }
        Ok(())
    }

    /// One 60Hz tick: both timers count down towards 0. Returns true when
    /// this tick ends a sound, which is when a beep should be heard.
    pub fn tick_timers(&mut self) -> bool {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        let beep = self.sound_timer == 1;
        if beep {
            info!("beep");
        }
        self.sound_timer = self.sound_timer.saturating_sub(1);
        beep
    }

    /// `step()` followed by `tick_timers()`, i.e. one instruction per tick.
    pub fn emulate_cycle(&mut self) -> Result<bool, Chip8Error> {
        self.step()?;
        Ok(self.tick_timers())
    }

    pub fn set_key(&mut self, key: usize, pressed: bool) {
        self.keys[key & 0xF] = pressed;
    }

    pub fn press_key(&mut self, key: usize) {
        self.set_key(key, true);
    }

    pub fn release_key(&mut self, key: usize) {
        self.set_key(key, false);
    }

    pub fn set_keys(&mut self, keys: &[bool; KEY_COUNT]) {
        self.keys = *keys;
    }

    pub fn clear_keys(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }

    /// 64x32 pixels, row-major, each 0 or 1
    pub fn gfx(&self) -> &[u8] {
        &self.gfx
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.gfx[(y % SCREEN_HEIGHT) * SCREEN_WIDTH + x % SCREEN_WIDTH]
    }

    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }

    pub fn clear_draw_flag(&mut self) {
        self.draw_flag = false;
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn sound_flag(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn v(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn sp(&self) -> u16 {
        self.sp
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack[..self.sp as usize]
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn awaiting_key(&self) -> Option<usize> {
        self.awaiting_key
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn quirks(&self) -> &Quirks {
        &self.quirks
    }

    fn read_byte(&self, addr: u16) -> u8 {
        self.memory[(addr & ADDRESS_MASK) as usize]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        self.memory[(addr & ADDRESS_MASK) as usize] = value;
    }

    fn next(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    fn skip_if(&mut self, cond: bool) {
        self.pc = self.pc.wrapping_add(if cond { 4 } else { 2 });
    }

    fn unknown(&mut self) -> Result<(), Chip8Error> {
        warn!("unknown opcode {} at {:03X}", self.opcode, self.pc);
        self.next();
        Ok(())
    }

    fn poll_key(&mut self, x: usize) {
        // lowest pressed key wins
        if let Some(key) = self.keys.iter().position(|&pressed| pressed) {
            debug!("key {:X} pressed, stored in V{:X}", key, x);
            self.v[x] = key as u8;
            self.awaiting_key = None;
            self.next();
        }
    }

    fn cls_ret(&mut self) -> Result<(), Chip8Error> {
        match self.opcode.0 {
            0x00E0 => {
                // 00E0
                // clear screen
                self.gfx = [0; SCREEN_WIDTH * SCREEN_HEIGHT];
                self.draw_flag = true;
                self.next();
            }
            0x00EE => {
                // 00EE
                // return from subroutine
                if self.sp == 0 {
                    return Err(Chip8Error::StackUnderflow { pc: self.pc });
                }
                self.sp -= 1;
                self.pc = self.stack[self.sp as usize];
                self.next();
            }
            _ => return self.unknown(),
        }
        Ok(())
    }

    fn jmp(&mut self) -> Result<(), Chip8Error> {
        // 1NNN
        // jump to NNN
        self.pc = self.opcode.nnn();
        Ok(())
    }

    fn call(&mut self) -> Result<(), Chip8Error> {
        // 2NNN
        // call subroutine at NNN
        let sp = self.sp as usize;
        if sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow { pc: self.pc });
        }
        self.stack[sp] = self.pc;
        self.sp += 1;
        self.pc = self.opcode.nnn();
        Ok(())
    }

    fn eb(&mut self) -> Result<(), Chip8Error> {
        // 3XKK
        // skip if VX == KK
        let op = self.opcode;
        self.skip_if(self.v[op.x()] == op.kk());
        Ok(())
    }

    fn neb(&mut self) -> Result<(), Chip8Error> {
        // 4XKK
        // skip if VX != KK
        let op = self.opcode;
        self.skip_if(self.v[op.x()] != op.kk());
        Ok(())
    }

    fn er(&mut self) -> Result<(), Chip8Error> {
        // 5XY0
        // skip if VX == VY
        let op = self.opcode;
        if op.n() != 0 {
            return self.unknown();
        }
        self.skip_if(self.v[op.x()] == self.v[op.y()]);
        Ok(())
    }

    fn ld(&mut self) -> Result<(), Chip8Error> {
        // 6XKK
        // set VX to KK
        let op = self.opcode;
        self.v[op.x()] = op.kk();
        self.next();
        Ok(())
    }

    fn addb(&mut self) -> Result<(), Chip8Error> {
        // 7XKK
        // add KK to VX (no carry)
        let op = self.opcode;
        self.v[op.x()] = self.v[op.x()].wrapping_add(op.kk());
        self.next();
        Ok(())
    }

    fn alu(&mut self) -> Result<(), Chip8Error> {
        let op = self.opcode;
        let (x, y) = (op.x(), op.y());
        let (vx, vy) = (self.v[x], self.v[y]);
        // VF is written after VX so the flag survives when X is F
        let (result, flag) = match op.n() {
            // 8XY0
            // set VX to VY
            0x0 => (vy, None),
            // 8XY1
            // set VX to VX OR VY
            0x1 => (vx | vy, None),
            // 8XY2
            // set VX to VX AND VY
            0x2 => (vx & vy, None),
            // 8XY3
            // set VX to VX XOR VY
            0x3 => (vx ^ vy, None),
            0x4 => {
                // 8XY4
                // add VY to VX (VF = 1 on carry)
                let (sum, carry) = vx.overflowing_add(vy);
                (sum, Some(carry as u8))
            }
            0x5 => {
                // 8XY5
                // sub VY from VX (VF = 0 on borrow, 1 otherwise)
                let (diff, borrow) = vx.overflowing_sub(vy);
                (diff, Some(!borrow as u8))
            }
            // 8XY6
            // shift VX right, VF gets the bit shifted out
            0x6 => (vx >> 1, Some(vx & 0x1)),
            0x7 => {
                // 8XY7
                // set VX to VY - VX (VF = 0 on borrow, 1 otherwise)
                let (diff, borrow) = vy.overflowing_sub(vx);
                (diff, Some(!borrow as u8))
            }
            // 8XYE
            // shift VX left, VF gets the bit shifted out
            0xE => (vx << 1, Some(vx >> 7)),
            _ => return self.unknown(),
        };
        self.v[x] = result;
        if let Some(flag) = flag {
            self.v[0xF] = flag;
        }
        self.next();
        Ok(())
    }

    fn ner(&mut self) -> Result<(), Chip8Error> {
        // 9XY0
        // skip if VX != VY
        let op = self.opcode;
        if op.n() != 0 {
            return self.unknown();
        }
        self.skip_if(self.v[op.x()] != self.v[op.y()]);
        Ok(())
    }

    fn si(&mut self) -> Result<(), Chip8Error> {
        // ANNN
        // set I to NNN
        self.i = self.opcode.nnn();
        self.next();
        Ok(())
    }

    fn jmpo(&mut self) -> Result<(), Chip8Error> {
        // BNNN
        // jump to NNN + V0
        self.pc = self.opcode.nnn() + self.v[0] as u16;
        Ok(())
    }

    fn rng(&mut self) -> Result<(), Chip8Error> {
        // CXKK
        // set VX = random byte & KK
        let op = self.opcode;
        self.v[op.x()] = self.rng.gen::<u8>() & op.kk();
        self.next();
        Ok(())
    }

    fn draw(&mut self) -> Result<(), Chip8Error> {
        // DXYN
        // draw a sprite at VX,VY with a width of 8 pixels and a height of N pixels
        // each row of 8 pixels is bit-coded in memory starting at I
        // currently drawn pixels are XORd with pixels in memory
        // VF is set to 1 if any currently drawn pixels are unset during this
        let op = self.opcode;
        let vx = self.v[op.x()] as usize % SCREEN_WIDTH;
        let vy = self.v[op.y()] as usize % SCREEN_HEIGHT;
        let height = op.n() as usize;
        let clip = self.quirks.sprite_edge == SpriteEdge::Clip;

        self.v[0xF] = 0;
        for row in 0..height {
            let sprite = self.read_byte(self.i.wrapping_add(row as u16));
            for col in 0..8 {
                if sprite & (0x80 >> col) == 0 {
                    continue;
                }
                let (px, py) = (vx + col, vy + row);
                if clip && (px >= SCREEN_WIDTH || py >= SCREEN_HEIGHT) {
                    continue;
                }
                let gfx_offset = SCREEN_WIDTH * (py % SCREEN_HEIGHT) + px % SCREEN_WIDTH;
                if self.gfx[gfx_offset] == 1 {
                    // screen pixel is set and being unset
                    self.v[0xF] = 1;
                }
                self.gfx[gfx_offset] ^= 1;
            }
        }

        self.draw_flag = true;
        self.next();
        Ok(())
    }

    fn key(&mut self) -> Result<(), Chip8Error> {
        let op = self.opcode;
        let pressed = self.keys[(self.v[op.x()] & 0xF) as usize];
        match op.kk() {
            // EX9E
            // skip if key stored in VX is pressed
            0x9E => self.skip_if(pressed),
            // EXA1
            // skip if key stored in VX isn't pressed
            0xA1 => self.skip_if(!pressed),
            _ => return self.unknown(),
        }
        Ok(())
    }

    fn ex(&mut self) -> Result<(), Chip8Error> {
        let op = self.opcode;
        let x = op.x();
        match op.kk() {
            0x07 => {
                // FX07
                // set VX to delay timer
                self.v[x] = self.delay_timer;
            }
            0x0A => {
                // FX0A
                // store next key press in VX, pc stays here until one arrives
                debug!("waiting for key press into V{:X}", x);
                self.awaiting_key = Some(x);
                self.poll_key(x);
                return Ok(());
            }
            0x15 => {
                // FX15
                // set delay timer to VX
                self.delay_timer = self.v[x];
            }
            0x18 => {
                // FX18
                // set sound timer to VX
                self.sound_timer = self.v[x];
            }
            0x1E => {
                // FX1E
                // add VX to I (VF = 1 when I passes 0xFFF)
                let i = self.i.wrapping_add(self.v[x] as u16);
                self.i = i;
                self.v[0xF] = (i > ADDRESS_MASK) as u8;
            }
            0x29 => {
                // FX29
                // set I to the font glyph for the digit in VX
                self.i = self.v[x] as u16 * FONT_GLYPH_BYTES;
            }
            0x33 => {
                // FX33
                // store the BCD representation of VX at I
                // so 193 becomes [1, 9, 3] in memory at I
                let vx = self.v[x];
                let i = self.i;
                self.write_byte(i, vx / 100);
                self.write_byte(i.wrapping_add(1), (vx / 10) % 10);
                self.write_byte(i.wrapping_add(2), vx % 10);
            }
            0x55 => {
                // FX55
                // store V0.. in memory at I, then I += X + 1
                for offset in 0..self.quirks.register_count(x) {
                    self.write_byte(self.i.wrapping_add(offset as u16), self.v[offset]);
                }
                self.i = self.i.wrapping_add(x as u16 + 1);
            }
            0x65 => {
                // FX65
                // fill V0.. from memory at I, then I += X + 1
                for offset in 0..self.quirks.register_count(x) {
                    self.v[offset] = self.read_byte(self.i.wrapping_add(offset as u16));
                }
                self.i = self.i.wrapping_add(x as u16 + 1);
            }
            _ => return self.unknown(),
        }
        self.next();
        Ok(())
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
