//! Host configuration with safety floors and clamps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default command-channel UDP port.
pub const DEFAULT_PORT: u16 = 21999;
/// Default tick frequency.
pub const DEFAULT_RATE_HZ: u32 = 200;
/// Lowest tick frequency the host will run at.
pub const MIN_RATE_HZ: u32 = 50;
/// Default watchdog staleness budget.
pub const DEFAULT_WATCHDOG_MS: u64 = 250;
/// Lowest watchdog budget; below this the wheel would fight normal jitter.
pub const MIN_WATCHDOG_MS: u64 = 50;
/// Default force clamp magnitude.
pub const DEFAULT_MAX_FORCE: i16 = 100;
/// Default output report ID for classic payloads.
pub const DEFAULT_REPORT_ID: u8 = 0x00;
/// Keep-alive resends never come faster than this.
pub const MIN_KEEP_ALIVE: Duration = Duration::from_millis(10);

/// Immutable host configuration.
///
/// Values are stored as given; [`HostConfig::normalized`] applies the
/// documented floors and clamps once, before the controller is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// UDP port the command channel binds on loopback.
    pub port: u16,
    /// Tick frequency in Hz (floor [`MIN_RATE_HZ`]).
    pub rate_hz: u32,
    /// Watchdog staleness budget in ms (floor [`MIN_WATCHDOG_MS`]).
    pub watchdog_ms: u64,
    /// Force clamp magnitude (clamped to 1–127).
    pub max_force: i16,
    /// Index into the enumerated candidate wheels.
    pub device_index: usize,
    /// Output report ID used for every classic payload this session.
    pub report_id: u8,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            rate_hz: DEFAULT_RATE_HZ,
            watchdog_ms: DEFAULT_WATCHDOG_MS,
            max_force: DEFAULT_MAX_FORCE,
            device_index: 0,
            report_id: DEFAULT_REPORT_ID,
        }
    }
}

impl HostConfig {
    /// Apply the safety floors and clamps: rate and watchdog are floored,
    /// `max_force` is clamped into 1–127.
    pub fn normalized(mut self) -> Self {
        self.rate_hz = self.rate_hz.max(MIN_RATE_HZ);
        self.watchdog_ms = self.watchdog_ms.max(MIN_WATCHDOG_MS);
        self.max_force = self.max_force.clamp(1, 127);
        self
    }

    /// Force clamp as the signed byte the wire format works in.
    pub fn max_force_i8(&self) -> i8 {
        self.max_force.clamp(1, 127) as i8
    }

    /// Tick period derived from the floored rate.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.rate_hz.max(MIN_RATE_HZ)).max(1))
    }

    /// Keep-alive resend interval: `max(10ms, 1000 / max(50, rate_hz))`.
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_millis(u64::from(1000 / self.rate_hz.max(MIN_RATE_HZ))).max(MIN_KEEP_ALIVE)
    }

    /// Watchdog budget as a duration.
    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms.max(MIN_WATCHDOG_MS))
    }
}
