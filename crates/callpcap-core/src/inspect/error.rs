use thiserror::Error;

/// Errors returned while reading a capture back.
///
/// # Examples
/// ```
/// use callpcap_core::InspectError;
///
/// let err = InspectError::UnsupportedFormat { format: "pcapng" };
/// assert!(err.to_string().contains("pcapng"));
/// ```
#[derive(Debug, Error)]
pub enum InspectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PCAP parse error ({context}): {message}")]
    Pcap {
        context: &'static str,
        message: String,
    },
    #[error("unsupported capture format: {format}")]
    UnsupportedFormat { format: &'static str },
}

/// A frame whose headers claim a protocol but do not decode.
#[derive(Debug, Error)]
pub enum FrameSliceError {
    #[error("frame slice error: {0}")]
    Slice(String),
}
