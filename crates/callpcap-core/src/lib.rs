//! callpcap core library: rebuild downloadable packet captures from call
//! traces.
//!
//! The trace backend hands out a call's SIP messages and RTP media frames as
//! structured records. This crate turns them back into a classic libpcap file
//! (Ethernet link type) that standard analyzers open directly:
//! `model` loads the call, `encoder` synthesizes Ethernet/IPv4/UDP frames
//! around each payload, and `inspect` reads a capture back into a summary.
//!
//! Invariants:
//! - Encoding is deterministic and keeps the caller's message order.
//! - A datagram that cannot be framed is skipped with a warning; `encode`
//!   itself never fails.
//! - Timestamps stay in integer nanoseconds end to end.
//!
//! # Examples
//! ```
//! use callpcap_core::{CallCapture, encode, inspect_bytes};
//!
//! let capture = CallCapture::from_json_slice(br#"{
//!     "callId": "demo",
//!     "messages": [{
//!         "kind": "sip",
//!         "timestamp": "1700000000000000000",
//!         "header": {"srcIp": "10.0.0.1", "dstIp": "10.0.0.2", "srcPort": 5060, "dstPort": 5060},
//!         "rawText": "OPTIONS sip:b@example.com SIP/2.0\r\n\r\n"
//!     }]
//! }"#)?;
//! let pcap = encode(&capture);
//! let summary = inspect_bytes(pcap.as_bytes())?;
//! assert_eq!(summary.packets_total, 1);
//! assert_eq!(summary.packets[0].proto, "sip");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod encoder;
mod inspect;
mod model;
mod timestamp;

pub use encoder::error::FrameError;
pub use encoder::layout::MAX_UDP_PAYLOAD;
pub use encoder::{PcapFile, encode};
pub use inspect::error::InspectError;
pub use inspect::{inspect_bytes, inspect_file, inspect_reader};
pub use model::{
    CallCapture, CaptureError, CaptureMessage, ProtocolHeader, RtpFlow, RtpFrame,
    RtpHeaderFields, SipMessage, StreamRecord,
};
pub use timestamp::{Timestamp, TimestampError};

/// Summary of a capture file read back by the inspector.
///
/// # Examples
/// ```
/// use callpcap_core::CaptureSummary;
///
/// let summary = CaptureSummary::default();
/// assert_eq!(summary.packets_total, 0);
/// assert!(summary.packets.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Link-layer type from the global header (1 = Ethernet).
    pub link_type: i32,
    /// Snapshot length from the global header.
    pub snaplen: u32,
    /// Number of packet records.
    pub packets_total: u64,
    /// RFC3339 timestamp of the earliest record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the latest record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
    /// Records in file order.
    pub packets: Vec<PacketSummary>,
}

/// One packet record as seen by a consumer of the capture.
///
/// # Examples
/// ```
/// use callpcap_core::PacketSummary;
///
/// let packet = PacketSummary {
///     index: 0,
///     timestamp: None,
///     timestamp_ns: 0,
///     captured_len: 42,
///     original_len: 42,
///     proto: "udp".to_string(),
///     src: Some("10.0.0.1:5060".to_string()),
///     dst: Some("10.0.0.2:5060".to_string()),
///     payload_len: Some(0),
///     sip_start_line: None,
///     rtp: None,
///     error: None,
/// };
/// assert_eq!(packet.captured_len, packet.original_len);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketSummary {
    /// Zero-based record index.
    pub index: u64,
    /// RFC3339 record timestamp (microsecond resolution).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Record timestamp in nanoseconds since the epoch.
    pub timestamp_ns: u64,
    pub captured_len: u32,
    pub original_len: u32,
    /// `sip`, `rtp`, `udp`, or `other` for frames without UDP.
    pub proto: String,
    /// Source endpoint in `ip:port` form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Destination endpoint in `ip:port` form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dst: Option<String>,
    /// UDP payload length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sip_start_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtp: Option<RtpSummary>,
    /// Slicing error for frames that could not be decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// RTP fixed-header fields of an inspected datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RtpSummary {
    pub payload_type: u8,
    pub marker: bool,
    pub sequence_number: u16,
    pub rtp_timestamp: u32,
    pub ssrc: u32,
    /// Media bytes after the fixed header.
    pub payload_len: usize,
}
