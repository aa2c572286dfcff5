//! Classic-protocol output payload encoding.
//!
//! All functions are pure and allocation-free.
//!
//! # Protocol notes
//!
//! Every classic FFB command is a fixed **7-byte** payload delivered as a HID
//! output report (the report ID travels outside the payload):
//!
//! ```text
//! Byte 0: [F3 F2 F1 F0 | CMD(4 bits)]   slot mask in the high nibble
//! Bytes 1–6: command-specific data
//! ```
//!
//! | Command              | byte0           | byte1        | bytes 2–5      | byte6 |
//! |----------------------|-----------------|--------------|----------------|-------|
//! | Stop Force           | `mask<<4\|0x03` | 0            | 0              | 0     |
//! | Default Spring Off   | `mask<<4\|0x05` | 0            | 0              | 0     |
//! | Fixed Time Loop      | `0x0D`          | enable? 1: 0 | 0              | 0     |
//! | Download/Play Force  | `mask<<4\|0x01` | force type   | F0–F3 levels   | 0     |
//!
//! Force levels are offset-binary: `0x80` is neutral, `0x00` full one way,
//! `0xFF` full the other. Fixed Time Loop is a global toggle and carries no
//! slot mask.

use crate::ids::{commands, force_types};

/// Wire size of every classic-protocol command payload.
pub const CLASSIC_PAYLOAD_LEN: usize = 7;

/// Offset-binary force level meaning "no force".
pub const NEUTRAL_FORCE_LEVEL: u8 = 0x80;

/// Pack the slot mask and command nibble into payload byte 0.
#[inline]
fn command_byte(slot_mask: u8, command: u8) -> u8 {
    ((slot_mask & 0x0F) << 4) | (command & 0x0F)
}

/// Convert a signed force magnitude to the offset-binary wire level.
///
/// `0` maps to [`NEUTRAL_FORCE_LEVEL`]; callers are responsible for clamping
/// the magnitude to their configured bound first.
#[inline]
pub fn force_level(force: i8) -> u8 {
    (i16::from(force) + i16::from(NEUTRAL_FORCE_LEVEL)) as u8
}

/// Build a Stop Force payload for the slots selected by `slot_mask`.
pub fn build_stop_force(slot_mask: u8) -> [u8; CLASSIC_PAYLOAD_LEN] {
    [
        command_byte(slot_mask, commands::STOP_FORCE),
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
    ]
}

/// Build a Default Spring Off payload for the slots selected by `slot_mask`.
pub fn build_default_spring_off(slot_mask: u8) -> [u8; CLASSIC_PAYLOAD_LEN] {
    [
        command_byte(slot_mask, commands::DEFAULT_SPRING_OFF),
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
    ]
}

/// Build a Fixed Time Loop payload.
///
/// `enable` selects the 2 ms fixed update loop; byte 1 is `0x01` when enabled
/// and `0x00` when disabled. This command is global and carries no slot mask.
pub fn build_fixed_time_loop(enable: bool) -> [u8; CLASSIC_PAYLOAD_LEN] {
    [
        commands::FIXED_TIME_LOOP,
        if enable { 0x01 } else { 0x00 },
        0x00,
        0x00,
        0x00,
        0x00,
        0x00,
    ]
}

/// Build a Download and Play Constant Force payload with explicit levels for
/// all four slots.
pub fn build_constant_force(slot_mask: u8, levels: [u8; 4]) -> [u8; CLASSIC_PAYLOAD_LEN] {
    [
        command_byte(slot_mask, commands::DOWNLOAD_PLAY_FORCE),
        force_types::CONSTANT,
        levels[0],
        levels[1],
        levels[2],
        levels[3],
        0x00,
    ]
}

/// Build a Download and Play Constant Force payload driving slot F0 only,
/// with the remaining slots held at neutral.
pub fn build_constant_force_f0(slot_mask: u8, f0: u8) -> [u8; CLASSIC_PAYLOAD_LEN] {
    build_constant_force(
        slot_mask,
        [
            f0,
            NEUTRAL_FORCE_LEVEL,
            NEUTRAL_FORCE_LEVEL,
            NEUTRAL_FORCE_LEVEL,
        ],
    )
}
