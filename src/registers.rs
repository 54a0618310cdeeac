//! Register address map. Every voice owns a block of `VOICE_STRIDE` bytes.

pub const VOICE_STRIDE: u8 = 7;

pub const FREQ_LO: u8 = 0;
pub const FREQ_HI: u8 = 1;
pub const PW_LO: u8 = 2;
/// Upper nibble of the 12-bit pulse width, in the low 4 bits of the byte.
pub const PW_HI: u8 = 3;
pub const CONTROL: u8 = 4;
pub const ATTACK_DECAY: u8 = 5;
pub const SUSTAIN_RELEASE: u8 = 6;

/// Filter routing, voice `i` on bit `i`.
pub const FILTER_ROUTING: u8 = 0x17;
/// Master volume nibble.
pub const MASTER_VOLUME: u8 = 0x18;

/// Address of `offset` within the block of `voice`.
pub fn voice_register(voice: u8, offset: u8) -> u8 {
    voice * VOICE_STRIDE + offset
}
