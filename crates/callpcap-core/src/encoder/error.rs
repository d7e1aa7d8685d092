use thiserror::Error;

/// Reasons a single datagram is left out of the capture.
///
/// These never fail the whole encode; the encoder logs and moves on.
///
/// # Examples
/// ```
/// use callpcap_core::FrameError;
///
/// let err = FrameError::PayloadTooLarge { len: 65_508, max: 65_507 };
/// assert!(err.to_string().contains("65508"));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("payload of {len} bytes exceeds the UDP maximum of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },
    #[error("invalid IPv4 address '{value}'")]
    InvalidIpv4 { value: String },
    #[error("timestamp of {seconds}s does not fit a 32-bit pcap record")]
    TimestampOutOfRange { seconds: u64 },
    #[error("RTP field {field} = {value} exceeds its maximum of {max}")]
    RtpFieldOutOfRange {
        field: &'static str,
        value: u8,
        max: u8,
    },
}
