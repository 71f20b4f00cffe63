use chip8_vm::{Chip8, Quirks, SCREEN_WIDTH};

fn boot(program: &[u8]) -> Chip8 {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut chip8 = Chip8::with_quirks(Quirks::default().with_rng_seed(1));
    chip8.load_program(program).unwrap();
    chip8
}

fn row(chip8: &Chip8, y: usize, x: usize) -> u8 {
    (0..8).fold(0, |acc, col| (acc << 1) | chip8.gfx()[y * SCREEN_WIDTH + x + col])
}

#[test]
fn draws_font_digit() {
    // V0 = 7, I = glyph(V0), V1 = V2 = 10, draw 5 rows at (V1, V2), halt
    let mut chip8 = boot(&[
        0x60, 0x07, 0xF0, 0x29, 0x61, 0x0A, 0x62, 0x0A, 0xD1, 0x25, 0x12, 0x0A,
    ]);
    for _ in 0..8 {
        chip8.emulate_cycle().unwrap();
    }

    assert!(chip8.draw_flag());
    let glyph: Vec<u8> = (0..5).map(|y| row(&chip8, 10 + y, 10)).collect();
    assert_eq!(glyph, vec![0xF0, 0x10, 0x20, 0x40, 0x40]);
    assert_eq!(chip8.v()[0xF], 0);
    assert_eq!(chip8.pc(), 0x20A);
}

#[test]
fn prints_bcd_of_register() {
    // V0 = 137, I = 0x300, BCD, then F365 reads V0..V2 back (V3 excluded)
    let mut chip8 = boot(&[0x60, 137, 0xA3, 0x00, 0xF0, 0x33, 0xF3, 0x65]);
    for _ in 0..4 {
        chip8.step().unwrap();
    }
    assert_eq!(&chip8.v()[..3], &[1, 3, 7]);
    assert_eq!(chip8.i(), 0x304);
}

#[test]
fn subroutine_counts_to_five() {
    // 200: V0 = 0
    // 202: call 20A
    // 204: skip next if V0 == 5
    // 206: jump 202
    // 208: jump 208
    // 20A: V0 += 1
    // 20C: return
    let mut chip8 = boot(&[
        0x60, 0x00, 0x22, 0x0A, 0x30, 0x05, 0x12, 0x02, 0x12, 0x08, 0x70, 0x01, 0x00, 0xEE,
    ]);
    for _ in 0..40 {
        chip8.step().unwrap();
    }
    assert_eq!(chip8.v()[0], 5);
    assert_eq!(chip8.pc(), 0x208);
    assert_eq!(chip8.sp(), 0);
}

#[test]
fn waits_for_key_then_beeps() {
    // wait for key into V3, sound timer = V3, spin
    let mut chip8 = boot(&[0xF3, 0x0A, 0xF3, 0x18, 0x12, 0x04]);
    for _ in 0..10 {
        chip8.step().unwrap();
        assert!(!chip8.tick_timers());
    }
    assert_eq!(chip8.pc(), 0x200);

    chip8.press_key(2);
    chip8.step().unwrap();
    chip8.release_key(2);
    chip8.step().unwrap();
    assert_eq!(chip8.sound_timer(), 2);

    let beeps: Vec<bool> = (0..4).map(|_| chip8.tick_timers()).collect();
    assert_eq!(beeps, vec![false, true, false, false]);
}

#[test]
fn restart_after_reset() {
    let program = [0x6A, 0x05, 0x12, 0x02];
    let mut chip8 = boot(&program);
    chip8.step().unwrap();
    assert_eq!(chip8.v()[0xA], 5);

    chip8.reset();
    chip8.load_program(&program).unwrap();
    assert_eq!(chip8.v()[0xA], 0);
    assert_eq!(chip8.pc(), 0x200);
    chip8.step().unwrap();
    assert_eq!(chip8.v()[0xA], 5);
}
