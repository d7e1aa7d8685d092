//! Classic pcap synthesis for call captures.
//!
//! The encoder turns already-decoded call messages into a libpcap file with
//! Ethernet link type: every datagram becomes one record carrying synthetic
//! Ethernet/IPv4/UDP headers around the SIP text or the RTP frame.
//!
//! Encoding is a pure function of its input. Records appear in the order of
//! `CallCapture::messages` (no sorting). A datagram that cannot be framed is
//! logged at warn level and left out; encoding itself never fails.
//!
//! Wire offsets live in `layout`, header synthesis in `writer`, RTP packing in
//! `rtp`.

pub mod error;
pub mod layout;
pub mod rtp;
pub mod writer;

use tracing::{debug, warn};

use crate::model::{CallCapture, CaptureMessage, RtpFlow, RtpFrame};

use error::FrameError;
use writer::{Datagram, Frame, Payload};

/// An encoded capture file. Owns its bytes; the encoder keeps nothing.
///
/// # Examples
/// ```
/// use callpcap_core::{CallCapture, encode};
///
/// let pcap = encode(&CallCapture::new("empty", Vec::new()));
/// assert_eq!(pcap.len(), 24);
/// assert_eq!(pcap.packet_count(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcapFile {
    bytes: Vec<u8>,
    packet_count: usize,
}

impl PcapFile {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false: a capture holds at least its global header.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of packet records written.
    pub fn packet_count(&self) -> usize {
        self.packet_count
    }
}

impl AsRef<[u8]> for PcapFile {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<PcapFile> for Vec<u8> {
    fn from(value: PcapFile) -> Self {
        value.bytes
    }
}

/// Serialize a call capture into a classic pcap buffer.
pub fn encode(capture: &CallCapture) -> PcapFile {
    let mut sink = RecordSink::new(&capture.call_id);

    for (index, message) in capture.messages.iter().enumerate() {
        let origin = Origin::message(index, message);
        match message {
            CaptureMessage::Sip(sip) => sink.push(
                origin,
                Ok(Datagram {
                    timestamp: sip.timestamp,
                    header: &sip.header,
                    payload: Payload::Raw(sip.raw_text.as_bytes()),
                }),
            ),
            CaptureMessage::RtpFlow(flow) => {
                for (frame_index, frame) in flow.frames.iter().enumerate() {
                    sink.push(
                        origin.rtp_frame(frame_index, frame),
                        rtp_datagram(flow, frame),
                    );
                }
            }
            CaptureMessage::Stream(record) => {
                for (value_index, (timestamp, text)) in record.values.iter().enumerate() {
                    sink.push(
                        origin.frame(value_index),
                        Ok(Datagram {
                            timestamp: *timestamp,
                            header: &record.stream,
                            payload: Payload::Raw(text.as_bytes()),
                        }),
                    );
                }
            }
        }
    }

    sink.finish()
}

/// Frames without their own endpoints use the flow's.
fn rtp_datagram<'a>(flow: &'a RtpFlow, frame: &'a RtpFrame) -> Result<Datagram<'a>, FrameError> {
    let header = rtp::rtp_header(&frame.rtp_header_fields)?;
    Ok(Datagram {
        timestamp: frame.timestamp,
        header: frame.header.as_ref().unwrap_or(&flow.header),
        payload: Payload::Rtp {
            header,
            body: &frame.payload_bytes,
        },
    })
}

/// Position of a datagram in the input, reported when it is skipped.
#[derive(Debug, Clone, Copy)]
struct Origin {
    kind: &'static str,
    message_index: usize,
    frame_index: Option<usize>,
    sequence_number: Option<u16>,
}

impl Origin {
    fn message(message_index: usize, message: &CaptureMessage) -> Self {
        Self {
            kind: message.kind(),
            message_index,
            frame_index: None,
            sequence_number: None,
        }
    }

    fn frame(self, frame_index: usize) -> Self {
        Self {
            frame_index: Some(frame_index),
            ..self
        }
    }

    fn rtp_frame(self, frame_index: usize, frame: &RtpFrame) -> Self {
        Self {
            sequence_number: Some(frame.rtp_header_fields.sequence_number),
            ..self.frame(frame_index)
        }
    }
}

struct RecordSink<'a> {
    call_id: &'a str,
    bytes: Vec<u8>,
    packet_count: usize,
    skipped: usize,
}

impl<'a> RecordSink<'a> {
    fn new(call_id: &'a str) -> Self {
        let mut bytes = Vec::with_capacity(layout::GLOBAL_HEADER_LEN);
        bytes.extend_from_slice(&writer::global_header());
        Self {
            call_id,
            bytes,
            packet_count: 0,
            skipped: 0,
        }
    }

    fn push(&mut self, origin: Origin, datagram: Result<Datagram<'_>, FrameError>) {
        match datagram.and_then(Frame::prepare) {
            Ok(frame) => {
                frame.write_to(&mut self.bytes);
                self.packet_count += 1;
            }
            Err(err) => {
                self.skipped += 1;
                warn!(
                    call_id = self.call_id,
                    message_index = origin.message_index,
                    frame_index = origin.frame_index,
                    sequence_number = origin.sequence_number,
                    kind = origin.kind,
                    error = %err,
                    "skipping packet"
                );
            }
        }
    }

    fn finish(self) -> PcapFile {
        debug!(
            call_id = self.call_id,
            packets = self.packet_count,
            skipped = self.skipped,
            bytes = self.bytes.len(),
            "encoded capture"
        );
        PcapFile {
            bytes: self.bytes,
            packet_count: self.packet_count,
        }
    }
}
