//! Candidate-wheel discovery and descriptor probing over hidapi.

use std::ffi::CString;

use classicwheel_hid_classic_protocol::LOGITECH_VENDOR_ID;
use hidapi::{HidApi, HidDevice};
use serde::Serialize;
use tracing::debug;

use crate::{HidCommonError, HidCommonResult};

/// Upper bound on a HID report descriptor (per the hidapi API contract).
const MAX_REPORT_DESCRIPTOR_SIZE: usize = 4096;

/// One discovered candidate wheel interface.
#[derive(Debug, Clone, Serialize)]
pub struct WheelInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub product: String,
    /// Platform device path used to open this exact interface.
    pub path: String,
}

/// Product-string filter for wheels speaking the classic protocol.
///
/// Matches the G29 family and the older "Driving Force" wheels; other
/// Logitech HID devices (keyboards, mice) share the vendor ID and must be
/// excluded.
pub fn is_candidate_product(product: &str) -> bool {
    let lower = product.to_lowercase();
    lower.contains("g29") || lower.contains("driving force")
}

/// Enumerate candidate wheel interfaces, in enumeration order.
pub fn list_candidate_wheels(api: &HidApi) -> Vec<WheelInfo> {
    let mut out = Vec::new();
    for dev in api.device_list() {
        if dev.vendor_id() != LOGITECH_VENDOR_ID {
            continue;
        }
        let product = dev.product_string().unwrap_or("(unknown)");
        if !is_candidate_product(product) {
            continue;
        }
        out.push(WheelInfo {
            vendor_id: dev.vendor_id(),
            product_id: dev.product_id(),
            product: product.to_string(),
            path: dev.path().to_string_lossy().into_owned(),
        });
    }
    debug!(candidates = out.len(), "wheel enumeration complete");
    out
}

/// Open the exact interface described by `info`.
///
/// # Errors
///
/// Returns [`HidCommonError::OpenError`] when the device path cannot be
/// opened (missing permissions, device unplugged since enumeration).
pub fn open_wheel(api: &HidApi, info: &WheelInfo) -> HidCommonResult<HidDevice> {
    let path = CString::new(info.path.as_bytes())
        .map_err(|e| HidCommonError::OpenError(format!("invalid device path: {e}")))?;
    api.open_path(&path)
        .map_err(|e| HidCommonError::OpenError(format!("{}: {e}", info.path)))
}

/// Read the raw report descriptor bytes for an open device.
///
/// # Errors
///
/// Returns [`HidCommonError::DescriptorUnavailable`] when the platform
/// cannot produce the descriptor for this handle.
pub fn read_report_descriptor(device: &HidDevice) -> HidCommonResult<Vec<u8>> {
    let mut buf = vec![0u8; MAX_REPORT_DESCRIPTOR_SIZE];
    let len = device
        .get_report_descriptor(&mut buf)
        .map_err(|e| HidCommonError::DescriptorUnavailable(e.to_string()))?;
    buf.truncate(len);
    Ok(buf)
}
