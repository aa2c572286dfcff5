//! Common HID plumbing for the ClassicWheel host.
//!
//! Descriptor parsing, candidate-wheel discovery over hidapi, and the
//! output-report transport boundary the controller writes through.

pub mod descriptor;
pub mod device;
pub mod transport;

pub use descriptor::{max_output_report_size, parse_output_report_sizes};
pub use device::{WheelInfo, list_candidate_wheels, open_wheel, read_report_descriptor};
pub use transport::{HidOutputTransport, OutputReportSink, SentReport, mock};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HidCommonError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenError(String),

    #[error("Failed to write to device: {0}")]
    WriteError(String),

    #[error("Report descriptor unavailable: {0}")]
    DescriptorUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HidCommonResult<T> = Result<T, HidCommonError>;
