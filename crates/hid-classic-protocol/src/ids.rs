//! Vendor ID and classic-protocol command constants.

/// Logitech USB vendor ID.
pub const LOGITECH_VENDOR_ID: u16 = 0x046D;

/// Command nibbles carried in the low 4 bits of payload byte 0.
pub mod commands {
    /// Download and play a force in the selected slots.
    pub const DOWNLOAD_PLAY_FORCE: u8 = 0x01;
    /// Stop the force playing in the selected slots.
    pub const STOP_FORCE: u8 = 0x03;
    /// Turn off the default centering spring.
    pub const DEFAULT_SPRING_OFF: u8 = 0x05;
    /// Toggle the fixed 2 ms force update loop (no slot mask).
    pub const FIXED_TIME_LOOP: u8 = 0x0D;
}

/// Force type bytes for `DOWNLOAD_PLAY_FORCE` (payload byte 1).
pub mod force_types {
    /// Constant force; levels for F0–F3 in bytes 2–5.
    pub const CONSTANT: u8 = 0x00;
}

/// Slot masks addressing the four force slots F0–F3 (high nibble of byte 0).
pub mod slots {
    /// Force slot F0.
    pub const F0: u8 = 0x01;
    /// Force slot F1.
    pub const F1: u8 = 0x02;
    /// Force slot F2.
    pub const F2: u8 = 0x04;
    /// Force slot F3.
    pub const F3: u8 = 0x08;
    /// All four force slots.
    pub const ALL: u8 = 0x0F;
}

/// Known Logitech wheel product IDs speaking the classic protocol.
pub mod product_ids {
    /// Driving Force GT (900°).
    pub const DFGT: u16 = 0xC29A;
    /// G29 racing wheel (PlayStation/PC, 900°, 2.2 Nm).
    pub const G29_PS: u16 = 0xC24F;
    /// G29 racing wheel (Xbox variant).
    pub const G29_XBOX: u16 = 0xC260;
}
