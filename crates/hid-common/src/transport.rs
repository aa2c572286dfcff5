//! Output-report transport boundary.
//!
//! The controller writes hardware commands through [`OutputReportSink`]; the
//! hidapi-backed implementation lives here next to a mock that records every
//! write for tests.

use hidapi::HidDevice;
use tracing::trace;

use crate::{HidCommonError, HidCommonResult};

/// One output report as handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentReport {
    pub report_id: u8,
    pub payload: Vec<u8>,
}

/// Boundary contract for delivering an output report to hardware.
///
/// A failed send is reported as an error value; implementations never panic
/// and callers never treat a single failure as fatal to their loop.
pub trait OutputReportSink: Send {
    /// Deliver `payload` as the output report `report_id`.
    ///
    /// # Errors
    ///
    /// Returns [`HidCommonError::WriteError`] when the underlying transport
    /// rejects the write.
    fn send_report(&mut self, report_id: u8, payload: &[u8]) -> HidCommonResult<usize>;
}

/// Assemble the wire buffer for a hidraw write: report ID first, then the
/// payload zero-padded out to the device's maximum output-report length.
fn padded_report(report_id: u8, payload: &[u8], max_output_len: usize) -> Vec<u8> {
    let body_len = payload.len().max(max_output_len);
    let mut buf = Vec::with_capacity(1 + body_len);
    buf.push(report_id);
    buf.extend_from_slice(payload);
    buf.resize(1 + body_len, 0x00);
    buf
}

/// hidapi-backed sink writing to an open wheel handle.
pub struct HidOutputTransport {
    device: HidDevice,
    max_output_len: usize,
}

impl HidOutputTransport {
    /// Wrap an open device. `max_output_len` is the device's declared
    /// maximum output-report byte length; shorter payloads are zero-padded
    /// to it before transmission.
    pub fn new(device: HidDevice, max_output_len: usize) -> Self {
        Self {
            device,
            max_output_len,
        }
    }
}

impl OutputReportSink for HidOutputTransport {
    fn send_report(&mut self, report_id: u8, payload: &[u8]) -> HidCommonResult<usize> {
        let buf = padded_report(report_id, payload, self.max_output_len);
        trace!(report_id, len = buf.len(), "writing output report");
        self.device
            .write(&buf)
            .map_err(|e| HidCommonError::WriteError(e.to_string()))
    }
}

pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Recording sink for tests. Clones share the same history and failure
    /// switch, so a test can keep one handle while the controller owns the
    /// other.
    #[derive(Clone, Default)]
    pub struct MockOutputSink {
        sent: Arc<Mutex<Vec<SentReport>>>,
        failing: Arc<AtomicBool>,
    }

    impl MockOutputSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every report sent so far, in order.
        pub fn sent(&self) -> Vec<SentReport> {
            self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }

        /// Payloads only, for compact assertions.
        pub fn sent_payloads(&self) -> Vec<Vec<u8>> {
            self.sent()
                .into_iter()
                .map(|r| r.payload)
                .collect()
        }

        /// Make every subsequent send fail (or succeed again).
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn clear(&self) {
            self.sent.lock().unwrap_or_else(|e| e.into_inner()).clear();
        }
    }

    impl OutputReportSink for MockOutputSink {
        fn send_report(&mut self, report_id: u8, payload: &[u8]) -> HidCommonResult<usize> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(HidCommonError::WriteError("mock sink failing".to_string()));
            }
            let mut sent = self.sent.lock().unwrap_or_else(|e| e.into_inner());
            sent.push(SentReport {
                report_id,
                payload: payload.to_vec(),
            });
            Ok(payload.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockOutputSink;
    use super::*;

    #[test]
    fn padding_extends_short_payloads() {
        let buf = padded_report(0x00, &[0xF3, 0, 0, 0, 0, 0, 0], 16);
        assert_eq!(buf.len(), 17, "report id byte plus 16 padded bytes");
        assert_eq!(buf[0], 0x00);
        assert_eq!(buf[1], 0xF3);
        assert!(buf[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn padding_never_truncates() {
        let payload = [0xAA; 12];
        let buf = padded_report(0x01, &payload, 7);
        assert_eq!(buf.len(), 13);
        assert_eq!(&buf[1..], &payload);
    }

    #[test]
    fn padding_noop_at_exact_length() {
        let payload = [0x11, 0x00, 0x40, 0x80, 0x80, 0x80, 0x00];
        let buf = padded_report(0x00, &payload, 7);
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[1..], &payload);
    }

    #[test]
    fn mock_records_writes_in_order() {
        let mut sink = MockOutputSink::new();
        let observer = sink.clone();
        sink.send_report(0x00, &[0x01]).expect("send");
        sink.send_report(0x01, &[0x02, 0x03]).expect("send");

        let sent = observer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].report_id, 0x00);
        assert_eq!(sent[0].payload, vec![0x01]);
        assert_eq!(sent[1].payload, vec![0x02, 0x03]);
    }

    #[test]
    fn mock_failure_injection() {
        let mut sink = MockOutputSink::new();
        sink.set_failing(true);
        let err = sink.send_report(0x00, &[0x01]);
        assert!(matches!(err, Err(HidCommonError::WriteError(_))));
        assert!(sink.sent().is_empty(), "failed sends are not recorded");

        sink.set_failing(false);
        sink.send_report(0x00, &[0x01]).expect("send");
        assert_eq!(sink.sent().len(), 1);
    }
}
