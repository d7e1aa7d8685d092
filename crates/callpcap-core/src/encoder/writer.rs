//! Header synthesis for the pcap container and the Ethernet/IPv4/UDP stack.
//!
//! Every header is built as a fixed-size array through the offsets in
//! `layout`; a `Frame` is only constructed once all of its inputs are known
//! to be encodable, so writing one never fails half-way.

use std::net::Ipv4Addr;

use super::error::FrameError;
use super::layout;
use crate::model::ProtocolHeader;
use crate::timestamp::Timestamp;

/// UDP body of a datagram, kept borrowed until it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Bytes carried verbatim (SIP text).
    Raw(&'a [u8]),
    /// Synthesized RTP fixed header followed by the media bytes.
    Rtp {
        header: [u8; layout::RTP_HEADER_LEN],
        body: &'a [u8],
    },
}

impl Payload<'_> {
    pub fn len(&self) -> usize {
        match self {
            Payload::Raw(bytes) => bytes.len(),
            Payload::Rtp { header, body } => header.len() + body.len(),
        }
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Payload::Raw(bytes) => out.extend_from_slice(bytes),
            Payload::Rtp { header, body } => {
                out.extend_from_slice(header);
                out.extend_from_slice(body);
            }
        }
    }
}

/// One UDP datagram as described by the input model.
#[derive(Debug, Clone, Copy)]
pub struct Datagram<'a> {
    pub timestamp: Timestamp,
    pub header: &'a ProtocolHeader,
    pub payload: Payload<'a>,
}

/// A validated datagram, ready to be appended as a pcap record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    ts_sec: u32,
    ts_usec: u32,
    src_ip: [u8; 4],
    dst_ip: [u8; 4],
    src_port: u16,
    dst_port: u16,
    payload: Payload<'a>,
}

impl<'a> Frame<'a> {
    pub fn prepare(datagram: Datagram<'a>) -> Result<Self, FrameError> {
        let payload_len = datagram.payload.len();
        if payload_len > layout::MAX_UDP_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                len: payload_len,
                max: layout::MAX_UDP_PAYLOAD,
            });
        }
        let src_ip = parse_ipv4(&datagram.header.src_ip)?;
        let dst_ip = parse_ipv4(&datagram.header.dst_ip)?;
        let seconds = datagram.timestamp.seconds();
        let ts_sec =
            u32::try_from(seconds).map_err(|_| FrameError::TimestampOutOfRange { seconds })?;

        Ok(Self {
            ts_sec,
            ts_usec: datagram.timestamp.subsec_micros(),
            src_ip,
            dst_ip,
            src_port: datagram.header.src_port,
            dst_port: datagram.header.dst_port,
            payload: datagram.payload,
        })
    }

    /// Captured length: Ethernet + IPv4 + UDP headers plus payload.
    pub fn frame_len(&self) -> usize {
        layout::ETHERNET_HEADER_LEN + self.ip_len()
    }

    /// Bytes this frame occupies in the file, record header included.
    pub fn record_len(&self) -> usize {
        layout::RECORD_OVERHEAD + self.payload.len()
    }

    fn udp_len(&self) -> usize {
        layout::UDP_HEADER_LEN + self.payload.len()
    }

    fn ip_len(&self) -> usize {
        layout::IPV4_HEADER_LEN + self.udp_len()
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        // `prepare` bounds the payload, so all lengths below fit in u16.
        let frame_len = self.frame_len() as u32;
        out.reserve(self.record_len());
        out.extend_from_slice(&record_header(self.ts_sec, self.ts_usec, frame_len));
        out.extend_from_slice(&ethernet_header());
        out.extend_from_slice(&ipv4_header(
            self.src_ip,
            self.dst_ip,
            self.ip_len() as u16,
        ));
        out.extend_from_slice(&udp_header(
            self.src_port,
            self.dst_port,
            self.udp_len() as u16,
        ));
        self.payload.write_to(out);
    }
}

/// The 24-byte classic pcap global header (little-endian, Ethernet).
pub fn global_header() -> [u8; layout::GLOBAL_HEADER_LEN] {
    let mut header = [0u8; layout::GLOBAL_HEADER_LEN];
    header[layout::MAGIC_RANGE].copy_from_slice(&layout::PCAP_MAGIC.to_le_bytes());
    header[layout::VERSION_MAJOR_RANGE]
        .copy_from_slice(&layout::PCAP_VERSION_MAJOR.to_le_bytes());
    header[layout::VERSION_MINOR_RANGE]
        .copy_from_slice(&layout::PCAP_VERSION_MINOR.to_le_bytes());
    header[layout::THISZONE_RANGE].copy_from_slice(&layout::PCAP_THISZONE.to_le_bytes());
    header[layout::SIGFIGS_RANGE].copy_from_slice(&layout::PCAP_SIGFIGS.to_le_bytes());
    header[layout::SNAPLEN_RANGE].copy_from_slice(&layout::PCAP_SNAPLEN.to_le_bytes());
    header[layout::LINKTYPE_RANGE].copy_from_slice(&layout::LINKTYPE_ETHERNET.to_le_bytes());
    header
}

/// Per-packet record header; captured and original lengths are equal.
pub fn record_header(ts_sec: u32, ts_usec: u32, len: u32) -> [u8; layout::RECORD_HEADER_LEN] {
    let mut header = [0u8; layout::RECORD_HEADER_LEN];
    header[layout::TS_SEC_RANGE].copy_from_slice(&ts_sec.to_le_bytes());
    header[layout::TS_USEC_RANGE].copy_from_slice(&ts_usec.to_le_bytes());
    header[layout::CAPLEN_RANGE].copy_from_slice(&len.to_le_bytes());
    header[layout::ORIGLEN_RANGE].copy_from_slice(&len.to_le_bytes());
    header
}

/// Ethernet II header with placeholder addresses.
pub fn ethernet_header() -> [u8; layout::ETHERNET_HEADER_LEN] {
    let mut header = [0u8; layout::ETHERNET_HEADER_LEN];
    header[layout::ETH_DST_RANGE].copy_from_slice(&layout::ETH_DST_MAC);
    header[layout::ETH_SRC_RANGE].copy_from_slice(&layout::ETH_SRC_MAC);
    header[layout::ETHERTYPE_RANGE].copy_from_slice(&layout::ETHERTYPE_IPV4.to_be_bytes());
    header
}

/// Option-less IPv4 header carrying UDP, checksum filled in.
pub fn ipv4_header(src: [u8; 4], dst: [u8; 4], total_len: u16) -> [u8; layout::IPV4_HEADER_LEN] {
    let mut header = [0u8; layout::IPV4_HEADER_LEN];
    header[layout::IPV4_VERSION_IHL_OFFSET] = layout::IPV4_VERSION_IHL;
    header[layout::IPV4_DSCP_ECN_OFFSET] = layout::IPV4_DSCP_ECN;
    header[layout::IPV4_TOTAL_LEN_RANGE].copy_from_slice(&total_len.to_be_bytes());
    header[layout::IPV4_IDENTIFICATION_RANGE]
        .copy_from_slice(&layout::IPV4_IDENTIFICATION.to_be_bytes());
    header[layout::IPV4_FLAGS_RANGE]
        .copy_from_slice(&layout::IPV4_FLAGS_DONT_FRAGMENT.to_be_bytes());
    header[layout::IPV4_TTL_OFFSET] = layout::IPV4_TTL;
    header[layout::IPV4_PROTOCOL_OFFSET] = layout::IP_PROTO_UDP;
    header[layout::IPV4_SRC_RANGE].copy_from_slice(&src);
    header[layout::IPV4_DST_RANGE].copy_from_slice(&dst);
    let checksum = ipv4_checksum(&header);
    header[layout::IPV4_CHECKSUM_RANGE].copy_from_slice(&checksum.to_be_bytes());
    header
}

/// RFC 1071 one's-complement checksum over 16-bit big-endian words.
///
/// The checksum field must be zero when computing a fresh checksum; over a
/// header that already carries a valid checksum the result is zero.
pub fn ipv4_checksum(header: &[u8]) -> u16 {
    let mut sum = 0u32;
    for chunk in header.chunks(2) {
        let word = match chunk {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [hi] => u16::from_be_bytes([*hi, 0]),
            _ => 0,
        };
        sum = sum.wrapping_add(u32::from(word));
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// UDP header; the checksum is left at zero (optional over IPv4).
pub fn udp_header(src_port: u16, dst_port: u16, len: u16) -> [u8; layout::UDP_HEADER_LEN] {
    let mut header = [0u8; layout::UDP_HEADER_LEN];
    header[layout::UDP_SRC_PORT_RANGE].copy_from_slice(&src_port.to_be_bytes());
    header[layout::UDP_DST_PORT_RANGE].copy_from_slice(&dst_port.to_be_bytes());
    header[layout::UDP_LENGTH_RANGE].copy_from_slice(&len.to_be_bytes());
    header[layout::UDP_CHECKSUM_RANGE].copy_from_slice(&0u16.to_be_bytes());
    header
}

/// Strict dotted-quad parsing.
pub fn parse_ipv4(value: &str) -> Result<[u8; 4], FrameError> {
    value
        .trim()
        .parse::<Ipv4Addr>()
        .map(|addr| addr.octets())
        .map_err(|_| FrameError::InvalidIpv4 {
            value: value.to_string(),
        })
}
