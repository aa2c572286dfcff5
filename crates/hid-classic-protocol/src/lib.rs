//! Logitech "classic" FFB wire protocol: fixed 7-byte command payload encoders.
//!
//! This crate is intentionally I/O-free and allocation-free. It provides pure
//! functions and constants that can be tested without hardware; the report ID
//! used to deliver a payload is a transport concern and is passed separately
//! to whatever sends the output report.

pub mod ids;
pub mod output;

pub use ids::{LOGITECH_VENDOR_ID, commands, force_types, slots};
pub use output::{
    CLASSIC_PAYLOAD_LEN, NEUTRAL_FORCE_LEVEL, build_constant_force, build_constant_force_f0,
    build_default_spring_off, build_fixed_time_loop, build_stop_force, force_level,
};
