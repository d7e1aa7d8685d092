//! Call capture input model.
//!
//! A `CallCapture` is what the API client hands over after fetching a call's
//! signaling and media records from the trace backend. The JSON loader is
//! lenient about spelling (camelCase or the backend's snake_case) and about
//! numbers encoded as strings, but strict about structure.

mod de;

use std::io::Read;

use serde::Deserialize;
use thiserror::Error;

use crate::timestamp::Timestamp;

/// File name used when a call id produces nothing printable.
pub const DEFAULT_FILE_NAME: &str = "capture.pcap";

/// Whole-call load failures. Per-message problems never surface here.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid call capture JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One call's complete set of capture-worthy messages.
///
/// # Examples
/// ```
/// use callpcap_core::CallCapture;
///
/// let capture = CallCapture::from_json_slice(br#"{"callId": "abc@host", "messages": []}"#)?;
/// assert_eq!(capture.file_name(), "abc@host.pcap");
/// # Ok::<(), callpcap_core::CaptureError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallCapture {
    /// Opaque call identifier, only used for naming the output.
    #[serde(alias = "call_id", default)]
    pub call_id: String,
    /// Messages in caller order; the encoder preserves it.
    #[serde(deserialize_with = "de::supported_messages")]
    pub messages: Vec<CaptureMessage>,
}

impl CallCapture {
    pub fn new(call_id: impl Into<String>, messages: Vec<CaptureMessage>) -> Self {
        Self {
            call_id: call_id.into(),
            messages,
        }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, CaptureError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, CaptureError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Download name for this call: `<callId>.pcap` with unsafe characters
    /// replaced by `_`.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .call_id
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stem = stem.trim_start_matches('.');
        if stem.is_empty() {
            DEFAULT_FILE_NAME.to_string()
        } else {
            format!("{stem}.pcap")
        }
    }
}

/// Closed set of message shapes the encoder knows how to frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureMessage {
    Sip(SipMessage),
    RtpFlow(RtpFlow),
    /// Generic `{stream, values}` record: one datagram per value.
    Stream(StreamRecord),
}

impl CaptureMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureMessage::Sip(_) => "sip",
            CaptureMessage::RtpFlow(_) => "rtp_flow",
            CaptureMessage::Stream(_) => "stream",
        }
    }
}

impl From<SipMessage> for CaptureMessage {
    fn from(value: SipMessage) -> Self {
        CaptureMessage::Sip(value)
    }
}

impl From<RtpFlow> for CaptureMessage {
    fn from(value: RtpFlow) -> Self {
        CaptureMessage::RtpFlow(value)
    }
}

impl From<StreamRecord> for CaptureMessage {
    fn from(value: StreamRecord) -> Self {
        CaptureMessage::Stream(value)
    }
}

/// UDP endpoint pair of a captured datagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolHeader {
    #[serde(alias = "src_ip")]
    pub src_ip: String,
    #[serde(alias = "dst_ip")]
    pub dst_ip: String,
    /// 0 means unknown.
    #[serde(alias = "src_port", default, deserialize_with = "de::flexible_number")]
    pub src_port: u16,
    #[serde(alias = "dst_port", default, deserialize_with = "de::flexible_number")]
    pub dst_port: u16,
}

impl ProtocolHeader {
    pub fn new(
        src_ip: impl Into<String>,
        src_port: u16,
        dst_ip: impl Into<String>,
        dst_port: u16,
    ) -> Self {
        Self {
            src_ip: src_ip.into(),
            dst_ip: dst_ip.into(),
            src_port,
            dst_port,
        }
    }
}

/// A complete SIP message as captured, start line through body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SipMessage {
    #[serde(alias = "create_date")]
    pub timestamp: Timestamp,
    #[serde(alias = "protocol_header")]
    pub header: ProtocolHeader,
    #[serde(alias = "raw")]
    pub raw_text: String,
}

/// Media frames exchanged between one source/destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpFlow {
    /// Endpoints for frames that do not carry their own.
    #[serde(alias = "protocol_header", default)]
    pub header: ProtocolHeader,
    #[serde(alias = "messages", default)]
    pub frames: Vec<RtpFrame>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpFrame {
    #[serde(alias = "create_date")]
    pub timestamp: Timestamp,
    /// Falls back to the enclosing flow's header when absent.
    #[serde(alias = "protocol_header", default)]
    pub header: Option<ProtocolHeader>,
    #[serde(alias = "data_header")]
    pub rtp_header_fields: RtpHeaderFields,
    #[serde(alias = "raw", default)]
    pub payload_bytes: Vec<u8>,
}

/// Decoded RTP fixed-header fields. Widths are checked when framing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RtpHeaderFields {
    #[serde(alias = "Version", deserialize_with = "de::flexible_number")]
    pub version: u8,
    #[serde(alias = "Padding", default, deserialize_with = "de::flexible_number")]
    pub padding: u8,
    #[serde(alias = "Extension", default, deserialize_with = "de::flexible_number")]
    pub extension: u8,
    #[serde(alias = "CC", default, deserialize_with = "de::flexible_number")]
    pub csrc_count: u8,
    #[serde(alias = "Marker", default, deserialize_with = "de::flexible_number")]
    pub marker: u8,
    #[serde(alias = "PayloadType", deserialize_with = "de::flexible_number")]
    pub payload_type: u8,
    #[serde(alias = "SequenceNumber", deserialize_with = "de::flexible_number")]
    pub sequence_number: u16,
    #[serde(
        alias = "Timestamp",
        alias = "timestamp",
        deserialize_with = "de::flexible_number"
    )]
    pub rtp_timestamp: u32,
    #[serde(alias = "Ssrc", deserialize_with = "de::flexible_number")]
    pub ssrc: u32,
}

/// Raw payload captures sharing one stream descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamRecord {
    pub stream: ProtocolHeader,
    #[serde(default)]
    pub values: Vec<(Timestamp, String)>,
}

#[cfg(test)]
mod tests {
    use super::{CallCapture, CaptureMessage, DEFAULT_FILE_NAME};

    #[test]
    fn load_camel_case_document() {
        let json = br#"{
            "callId": "a84b4c76e66710",
            "messages": [
                {
                    "kind": "sip",
                    "timestamp": "1700000000000000000",
                    "header": {"srcIp": "10.0.0.1", "dstIp": "10.0.0.2", "srcPort": 5060, "dstPort": 5060},
                    "rawText": "OPTIONS sip:a@b SIP/2.0\r\n\r\n"
                },
                {
                    "kind": "rtp_flow",
                    "header": {"srcIp": "10.0.0.1", "dstIp": "10.0.0.2", "srcPort": 4000, "dstPort": 4002},
                    "frames": [{
                        "timestamp": 1700000000020000000,
                        "header": {"srcIp": "10.0.0.1", "dstIp": "10.0.0.2", "srcPort": 4000, "dstPort": 4002},
                        "rtpHeaderFields": {
                            "version": 2, "padding": 0, "extension": 0, "csrcCount": 0,
                            "marker": 1, "payloadType": 8, "sequenceNumber": 300,
                            "rtpTimestamp": 123456, "ssrc": 3735928559
                        },
                        "payloadBytes": [1, 2, 3]
                    }]
                }
            ]
        }"#;
        let capture = CallCapture::from_json_slice(json).unwrap();
        assert_eq!(capture.call_id, "a84b4c76e66710");
        assert_eq!(capture.messages.len(), 2);
        match &capture.messages[1] {
            CaptureMessage::RtpFlow(flow) => {
                let fields = flow.frames[0].rtp_header_fields;
                assert_eq!(fields.ssrc, 0xDEAD_BEEF);
                assert_eq!(fields.marker, 1);
                assert_eq!(flow.frames[0].payload_bytes, vec![1, 2, 3]);
            }
            other => panic!("unexpected message {}", other.kind()),
        }
    }

    #[test]
    fn load_backend_spelling_with_string_numbers() {
        let json = br#"{
            "call_id": "x",
            "messages": [
                {
                    "type": "sip",
                    "create_date": "2023-11-14T22:13:20Z",
                    "protocol_header": {"src_ip": "10.0.0.1", "dst_ip": "10.0.0.2", "src_port": "5060"},
                    "raw": "BYE sip:a@b SIP/2.0\r\n\r\n"
                },
                {
                    "type": "rtp_flow",
                    "messages": [{
                        "create_date": "2023-11-14T22:13:21Z",
                        "protocol_header": {"src_ip": "10.0.0.3", "dst_ip": "10.0.0.4", "src_port": 7078, "dst_port": 7080},
                        "data_header": {
                            "Version": "2", "Padding": "0", "Extension": "0", "CC": "0",
                            "Marker": "0", "PayloadType": "0", "SequenceNumber": "7",
                            "Timestamp": "160", "Ssrc": "42"
                        },
                        "raw": [255]
                    }]
                }
            ]
        }"#;
        let capture = CallCapture::from_json_slice(json).unwrap();
        match &capture.messages[0] {
            CaptureMessage::Sip(sip) => {
                assert_eq!(sip.header.src_port, 5060);
                assert_eq!(sip.header.dst_port, 0);
                assert_eq!(sip.timestamp.seconds(), 1_700_000_000);
            }
            other => panic!("unexpected message {}", other.kind()),
        }
        match &capture.messages[1] {
            CaptureMessage::RtpFlow(flow) => {
                assert_eq!(flow.frames[0].rtp_header_fields.sequence_number, 7);
                assert_eq!(flow.frames[0].rtp_header_fields.rtp_timestamp, 160);
                let header = flow.frames[0].header.as_ref().unwrap();
                assert_eq!(header.src_port, 7078);
            }
            other => panic!("unexpected message {}", other.kind()),
        }
    }

    #[test]
    fn load_generic_stream_record() {
        let json = br#"{
            "callId": "x",
            "messages": [{
                "stream": {"src_ip": "10.0.0.1", "dst_ip": "10.0.0.2", "src_port": "5060", "dst_port": "5080", "method": "INVITE"},
                "values": [["1700000000000000000", "INVITE sip:b@c SIP/2.0\r\n\r\n"], ["1700000000500000000", "SIP/2.0 100 Trying\r\n\r\n"]]
            }]
        }"#;
        let capture = CallCapture::from_json_slice(json).unwrap();
        match &capture.messages[0] {
            CaptureMessage::Stream(record) => {
                assert_eq!(record.stream.dst_port, 5080);
                assert_eq!(record.values.len(), 2);
                assert_eq!(record.values[1].0.subsec_micros(), 500_000);
            }
            other => panic!("unexpected message {}", other.kind()),
        }
    }

    #[test]
    fn unsupported_kinds_are_dropped() {
        let json = br#"{
            "callId": "x",
            "messages": [
                {"kind": "rtcp_flow", "messages": []},
                {"kind": "sip", "timestamp": 1, "header": {"srcIp": "1.1.1.1", "dstIp": "2.2.2.2"}, "rawText": ""}
            ]
        }"#;
        let capture = CallCapture::from_json_slice(json).unwrap();
        assert_eq!(capture.messages.len(), 1);
        assert_eq!(capture.messages[0].kind(), "sip");
    }

    #[test]
    fn null_ports_load_as_unset() {
        let json = br#"{
            "callId": "x",
            "messages": [{
                "kind": "sip",
                "timestamp": 1,
                "header": {"srcIp": "10.0.0.1", "dstIp": "10.0.0.2", "srcPort": null, "dstPort": "5060"},
                "rawText": "OPTIONS sip:a@b SIP/2.0\r\n\r\n"
            }]
        }"#;
        let capture = CallCapture::from_json_slice(json).unwrap();
        match &capture.messages[0] {
            CaptureMessage::Sip(sip) => {
                assert_eq!(sip.header.src_port, 0);
                assert_eq!(sip.header.dst_port, 5060);
            }
            other => panic!("unexpected message {}", other.kind()),
        }
    }

    #[test]
    fn malformed_known_kind_is_an_error() {
        let json = br#"{"callId": "x", "messages": [{"kind": "sip", "timestamp": 1}]}"#;
        assert!(CallCapture::from_json_slice(json).is_err());
    }

    #[test]
    fn missing_messages_is_an_error() {
        let err = CallCapture::from_json_slice(br#"{"callId": "x"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid call capture JSON"));
    }

    #[test]
    fn file_name_sanitizes_call_id() {
        let capture = CallCapture::new("a/b c@host", Vec::new());
        assert_eq!(capture.file_name(), "a_b_c@host.pcap");
        assert_eq!(CallCapture::new("  ", Vec::new()).file_name(), DEFAULT_FILE_NAME);
        assert_eq!(CallCapture::new("..", Vec::new()).file_name(), DEFAULT_FILE_NAME);
    }
}
