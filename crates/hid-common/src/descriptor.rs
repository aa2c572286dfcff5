//! Minimal HID report-descriptor walk for output-report sizes.
//!
//! This is not a full HID item parser. It tracks the three Global items that
//! determine report geometry (Report Size, Report Count, Report ID) and sums
//! the bits declared by Main Output items per report ID. That is enough to
//! size the output reports a wheel accepts without pulling in a descriptor
//! library.
//!
//! The walk is best-effort by contract: truncated or malformed input stops
//! consumption at the point data runs out and whatever was accumulated so far
//! is returned. It never fails.

use std::collections::BTreeMap;

/// Prefix byte introducing a long item (`0xFE`, length, long tag, data...).
const LONG_ITEM_PREFIX: u8 = 0xFE;

/// Short-item tag values (bits 4–7 of the prefix).
mod tags {
    /// Global: Report Size in bits (prefix `0x75`).
    pub const REPORT_SIZE: u8 = 0x7;
    /// Global: Report ID (prefix `0x85`).
    pub const REPORT_ID: u8 = 0x8;
    /// Global: Report Count (prefix `0x95`).
    pub const REPORT_COUNT: u8 = 0x9;
    /// Main: Output item (prefix `0x91`).
    pub const OUTPUT: u8 = 0x9;
}

/// Short-item type (bits 2–3 of the prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemType {
    Main,
    Global,
    Local,
    Reserved,
}

impl ItemType {
    fn from_prefix(prefix: u8) -> Self {
        match (prefix >> 2) & 0x03 {
            0 => ItemType::Main,
            1 => ItemType::Global,
            2 => ItemType::Local,
            _ => ItemType::Reserved,
        }
    }
}

#[derive(Debug, Default)]
struct ParseState {
    report_id: u8,
    report_size_bits: u32,
    report_count: u32,
    /// Accumulated sizes in bits for Output reports, keyed by report ID.
    output_bits: BTreeMap<u8, u32>,
}

/// Walk a raw report descriptor and return the byte size of each Output
/// report, keyed by report ID.
///
/// Sizes are the ceiling of the accumulated bit total divided by 8. Devices
/// that declare no report IDs accumulate under ID 0.
pub fn parse_output_report_sizes(desc: &[u8]) -> BTreeMap<u8, usize> {
    let mut st = ParseState::default();
    let mut i = 0usize;

    while let Some(&prefix) = desc.get(i) {
        i += 1;

        if prefix == LONG_ITEM_PREFIX {
            // 0xFE, data length, long tag, data bytes. Contributes nothing.
            let Some(&len) = desc.get(i) else { break };
            if desc.get(i + 1).is_none() {
                break;
            }
            i += 2 + usize::from(len);
            continue;
        }

        let data_len = match prefix & 0x03 {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 4,
        };

        let mut value: u32 = 0;
        if data_len > 0 {
            let Some(data) = desc.get(i..i + data_len) else {
                break;
            };
            for (shift, &b) in data.iter().enumerate() {
                value |= u32::from(b) << (8 * shift as u32);
            }
            i += data_len;
        }

        let tag = (prefix >> 4) & 0x0F;
        match ItemType::from_prefix(prefix) {
            ItemType::Global => match tag {
                tags::REPORT_SIZE => st.report_size_bits = value,
                tags::REPORT_COUNT => st.report_count = value,
                tags::REPORT_ID => st.report_id = (value & 0xFF) as u8,
                _ => {}
            },
            ItemType::Main if tag == tags::OUTPUT => {
                let bits = st.report_size_bits.saturating_mul(st.report_count);
                if bits > 0 {
                    *st.output_bits.entry(st.report_id).or_insert(0) += bits;
                }
            }
            _ => {}
        }
    }

    st.output_bits
        .into_iter()
        .map(|(rid, bits)| (rid, (bits as usize).div_ceil(8)))
        .collect()
}

/// Largest Output report size in the map, or 0 when no Output reports were
/// found.
pub fn max_output_report_size(sizes: &BTreeMap<u8, usize>) -> usize {
    sizes.values().copied().max().unwrap_or(0)
}
