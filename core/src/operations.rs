use rand::{Rng, RngCore};

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_GLYPH_HEIGHT, STACK_DEPTH};
use crate::error::{Error, Result};
use crate::state::State;

/// pc += 2
fn next(state: &mut State) {
    state.pc += 0x2;
}

/// pc += 4 when `condition` holds, pc += 2 otherwise
fn skip_if(state: &mut State, condition: bool) {
    state.pc += if condition { 0x4 } else { 0x2 };
}

/// Index into the keypad named by Vx
fn key_index(state: &State, x: u8) -> Result<usize> {
    let key = state.v[x as usize];
    if key as usize >= state.pressed_keys.len() {
        return Err(Error::InvalidKey { key });
    }
    Ok(key as usize)
}

/// clear
pub fn clr(state: &mut State) {
    state.frame_buffer = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    state.draw_flag = true;
    next(state);
}

/// PC = STACK.pop()
pub fn rts(state: &mut State) -> Result<()> {
    if state.sp == 0 {
        return Err(Error::StackUnderflow { address: state.pc });
    }
    state.sp -= 0x1;
    state.pc = state.stack[state.sp as usize];
    Ok(())
}

/// PC = addr
pub fn jump(state: &mut State, addr: u16) {
    state.pc = addr;
}

/// STACK.push(PC + 2); PC = addr
pub fn call(state: &mut State, addr: u16) -> Result<()> {
    if state.sp as usize == STACK_DEPTH {
        return Err(Error::StackOverflow { address: state.pc });
    }
    state.stack[state.sp as usize] = state.pc + 0x2;
    state.sp += 0x1;
    state.pc = addr;
    Ok(())
}

/// if Vx == kk then pc += 2
pub fn ske(state: &mut State, x: u8, kk: u8) {
    let taken = state.v[x as usize] == kk;
    skip_if(state, taken);
}

/// if Vx != kk then pc += 2
pub fn skne(state: &mut State, x: u8, kk: u8) {
    let taken = state.v[x as usize] != kk;
    skip_if(state, taken);
}

/// if Vx == Vy then pc += 2
pub fn skre(state: &mut State, x: u8, y: u8) {
    let taken = state.v[x as usize] == state.v[y as usize];
    skip_if(state, taken);
}

/// Vx = kk
pub fn load(state: &mut State, x: u8, kk: u8) {
    state.v[x as usize] = kk;
    next(state);
}

/// Vx += kk
/// Wraps on overflow; VF is left alone
pub fn add(state: &mut State, x: u8, kk: u8) {
    state.v[x as usize] = state.v[x as usize].wrapping_add(kk);
    next(state);
}

/// Vx = Vy
pub fn mv(state: &mut State, x: u8, y: u8) {
    state.v[x as usize] = state.v[y as usize];
    next(state);
}

/// Vx |= Vy
pub fn or(state: &mut State, x: u8, y: u8) {
    state.v[x as usize] |= state.v[y as usize];
    next(state);
}

/// Vx &= Vy
pub fn and(state: &mut State, x: u8, y: u8) {
    state.v[x as usize] &= state.v[y as usize];
    next(state);
}

/// Vx ^= Vy
pub fn xor(state: &mut State, x: u8, y: u8) {
    state.v[x as usize] ^= state.v[y as usize];
    next(state);
}

// The flag-setting ALU ops below compute VF from the operands, then write VF
// before Vx. With x = F the result overwrites the flag.

/// Vx += Vy; VF = carry
pub fn addr(state: &mut State, x: u8, y: u8) {
    let (res, carry) = state.v[x as usize].overflowing_add(state.v[y as usize]);
    state.v[0xF] = carry as u8;
    state.v[x as usize] = res;
    next(state);
}

/// Vx -= Vy; VF = Vx > Vy
pub fn sub(state: &mut State, x: u8, y: u8) {
    let (vx, vy) = (state.v[x as usize], state.v[y as usize]);
    state.v[0xF] = (vx > vy) as u8;
    state.v[x as usize] = vx.wrapping_sub(vy);
    next(state);
}

/// Vx >>= 1; VF = shifted out bit
pub fn shr(state: &mut State, x: u8) {
    let vx = state.v[x as usize];
    state.v[0xF] = vx & 0x1;
    state.v[x as usize] = vx >> 1;
    next(state);
}

/// Vx = Vy - Vx; VF = Vy > Vx
pub fn subn(state: &mut State, x: u8, y: u8) {
    let (vx, vy) = (state.v[x as usize], state.v[y as usize]);
    state.v[0xF] = (vy > vx) as u8;
    state.v[x as usize] = vy.wrapping_sub(vx);
    next(state);
}

/// Vx <<= 1; VF = shifted out bit
pub fn shl(state: &mut State, x: u8) {
    let vx = state.v[x as usize];
    state.v[0xF] = vx >> 7;
    state.v[x as usize] = vx << 1;
    next(state);
}

/// if Vx != Vy then pc += 2
pub fn skrne(state: &mut State, x: u8, y: u8) {
    let taken = state.v[x as usize] != state.v[y as usize];
    skip_if(state, taken);
}

/// I = addr
pub fn loadi(state: &mut State, addr: u16) {
    state.i = addr;
    next(state);
}

/// PC = V0 + addr
pub fn jumpi(state: &mut State, addr: u16) {
    state.pc = u16::from(state.v[0x0]) + addr;
}

/// Vx = rand_byte & kk
pub fn rnd(state: &mut State, rng: &mut dyn RngCore, x: u8, kk: u8) {
    let rand_byte: u8 = rng.gen();
    state.v[x as usize] = rand_byte & kk;
    next(state);
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory i..i+n at position x, y on the FrameBuffer.
/// Pixels that fall off an edge wrap around to the opposite one.
/// Sets VF if any pixels were erased
pub fn draw(state: &mut State, x: u8, y: u8, n: u8) -> Result<()> {
    let height = n as usize;
    let mut sprite = [0u8; 0x10];
    sprite[..height].copy_from_slice(state.read(state.i, height)?);

    let origin_x = state.v[x as usize] as usize;
    let origin_y = state.v[y as usize] as usize;
    let mut collision = false;

    for (row, &byte) in sprite[..height].iter().enumerate() {
        let py = (origin_y + row) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            if (byte & (0x80u8 >> bit)) == 0 {
                continue;
            }
            let px = (origin_x + bit) % DISPLAY_WIDTH;
            let pixel = &mut state.frame_buffer[py][px];
            collision |= *pixel;
            *pixel ^= true;
        }
    }

    state.v[0xF] = collision as u8;
    state.draw_flag = true;
    next(state);
    Ok(())
}

/// if Vx.pressed then pc += 2
pub fn skpr(state: &mut State, x: u8) -> Result<()> {
    let key = key_index(state, x)?;
    let taken = state.pressed_keys[key];
    skip_if(state, taken);
    Ok(())
}

/// if !Vx.pressed then pc += 2
pub fn skup(state: &mut State, x: u8) -> Result<()> {
    let key = key_index(state, x)?;
    let taken = !state.pressed_keys[key];
    skip_if(state, taken);
    Ok(())
}

/// Vx = DT
pub fn moved(state: &mut State, x: u8) {
    state.v[x as usize] = state.delay_timer;
    next(state);
}

/// await keypress for Vx
/// Without a pressed key the pc stays put, so the same instruction runs again
/// next cycle. The lowest pressed key wins.
pub fn keyd(state: &mut State, x: u8) {
    if let Some(key) = state.pressed_keys.iter().position(|&pressed| pressed) {
        state.v[x as usize] = key as u8;
        next(state);
    }
}

/// DT = Vx
pub fn loads(state: &mut State, x: u8) {
    state.delay_timer = state.v[x as usize];
    next(state);
}

/// ST = Vx
pub fn ld(state: &mut State, x: u8) {
    state.sound_timer = state.v[x as usize];
    next(state);
}

/// I += Vx; VF = I overflowed 0xFFF
pub fn addi(state: &mut State, x: u8) {
    let sum = state.i.wrapping_add(u16::from(state.v[x as usize]));
    state.v[0xF] = (sum > 0xFFF) as u8;
    state.i = sum;
    next(state);
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(state: &mut State, x: u8) {
    state.i = u16::from(state.v[x as usize]) * FONT_GLYPH_HEIGHT;
    next(state);
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(state: &mut State, x: u8) -> Result<()> {
    let vx = state.v[x as usize];
    let digits = [vx / 100, vx / 10 % 10, vx % 10];
    state.write(state.i, digits.len())?.copy_from_slice(&digits);
    next(state);
    Ok(())
}

/// mem[I..=I+x] = V0..=Vx; I += x + 1
pub fn stor(state: &mut State, x: u8) -> Result<()> {
    let count = x as usize + 1;
    let registers = state.v;
    state
        .write(state.i, count)?
        .copy_from_slice(&registers[..count]);
    state.i += u16::from(x) + 1;
    next(state);
    Ok(())
}

/// V0..=Vx = mem[I..=I+x]; I += x + 1
pub fn read(state: &mut State, x: u8) -> Result<()> {
    let count = x as usize + 1;
    let mut values = [0u8; 16];
    values[..count].copy_from_slice(state.read(state.i, count)?);
    state.v[..count].copy_from_slice(&values[..count]);
    state.i += u16::from(x) + 1;
    next(state);
    Ok(())
}
