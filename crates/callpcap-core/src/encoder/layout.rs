//! Wire layout of the synthesized capture: sizes, offsets and fixed values.

use std::ops::Range;

// pcap global header (little-endian)
pub const GLOBAL_HEADER_LEN: usize = 24;
pub const PCAP_MAGIC: u32 = 0xA1B2_C3D4;
pub const PCAP_VERSION_MAJOR: u16 = 2;
pub const PCAP_VERSION_MINOR: u16 = 4;
pub const PCAP_THISZONE: i32 = 0;
pub const PCAP_SIGFIGS: u32 = 0;
pub const PCAP_SNAPLEN: u32 = 65_535;
pub const LINKTYPE_ETHERNET: u32 = 1;

pub const MAGIC_RANGE: Range<usize> = 0..4;
pub const VERSION_MAJOR_RANGE: Range<usize> = 4..6;
pub const VERSION_MINOR_RANGE: Range<usize> = 6..8;
pub const THISZONE_RANGE: Range<usize> = 8..12;
pub const SIGFIGS_RANGE: Range<usize> = 12..16;
pub const SNAPLEN_RANGE: Range<usize> = 16..20;
pub const LINKTYPE_RANGE: Range<usize> = 20..24;

// packet record header (little-endian)
pub const RECORD_HEADER_LEN: usize = 16;
pub const TS_SEC_RANGE: Range<usize> = 0..4;
pub const TS_USEC_RANGE: Range<usize> = 4..8;
pub const CAPLEN_RANGE: Range<usize> = 8..12;
pub const ORIGLEN_RANGE: Range<usize> = 12..16;

// Ethernet II
pub const ETHERNET_HEADER_LEN: usize = 14;
pub const ETH_DST_MAC: [u8; 6] = [0xFF; 6];
pub const ETH_SRC_MAC: [u8; 6] = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETH_DST_RANGE: Range<usize> = 0..6;
pub const ETH_SRC_RANGE: Range<usize> = 6..12;
pub const ETHERTYPE_RANGE: Range<usize> = 12..14;

// IPv4, no options (big-endian)
pub const IPV4_HEADER_LEN: usize = 20;
pub const IPV4_VERSION_IHL: u8 = 0x45;
pub const IPV4_DSCP_ECN: u8 = 0x00;
pub const IPV4_IDENTIFICATION: u16 = 0;
pub const IPV4_FLAGS_DONT_FRAGMENT: u16 = 0x4000;
pub const IPV4_TTL: u8 = 64;
pub const IP_PROTO_UDP: u8 = 17;
pub const IPV4_VERSION_IHL_OFFSET: usize = 0;
pub const IPV4_DSCP_ECN_OFFSET: usize = 1;
pub const IPV4_TOTAL_LEN_RANGE: Range<usize> = 2..4;
pub const IPV4_IDENTIFICATION_RANGE: Range<usize> = 4..6;
pub const IPV4_FLAGS_RANGE: Range<usize> = 6..8;
pub const IPV4_TTL_OFFSET: usize = 8;
pub const IPV4_PROTOCOL_OFFSET: usize = 9;
pub const IPV4_CHECKSUM_RANGE: Range<usize> = 10..12;
pub const IPV4_SRC_RANGE: Range<usize> = 12..16;
pub const IPV4_DST_RANGE: Range<usize> = 16..20;

// UDP (big-endian)
pub const UDP_HEADER_LEN: usize = 8;
pub const UDP_SRC_PORT_RANGE: Range<usize> = 0..2;
pub const UDP_DST_PORT_RANGE: Range<usize> = 2..4;
pub const UDP_LENGTH_RANGE: Range<usize> = 4..6;
pub const UDP_CHECKSUM_RANGE: Range<usize> = 6..8;

/// Largest UDP payload that still fits a 16-bit IPv4 total length.
pub const MAX_UDP_PAYLOAD: usize = u16::MAX as usize - IPV4_HEADER_LEN - UDP_HEADER_LEN;

/// Bytes every record adds on top of its UDP payload.
pub const RECORD_OVERHEAD: usize =
    RECORD_HEADER_LEN + ETHERNET_HEADER_LEN + IPV4_HEADER_LEN + UDP_HEADER_LEN;

// RTP fixed header (big-endian)
pub const RTP_HEADER_LEN: usize = 12;
pub const RTP_FLAGS_OFFSET: usize = 0;
pub const RTP_MARKER_PT_OFFSET: usize = 1;
pub const RTP_SEQUENCE_RANGE: Range<usize> = 2..4;
pub const RTP_TIMESTAMP_RANGE: Range<usize> = 4..8;
pub const RTP_SSRC_RANGE: Range<usize> = 8..12;
pub const RTP_VERSION_SHIFT: u8 = 6;
pub const RTP_PADDING_SHIFT: u8 = 5;
pub const RTP_EXTENSION_SHIFT: u8 = 4;
pub const RTP_MARKER_SHIFT: u8 = 7;
pub const RTP_VERSION_MAX: u8 = 0b11;
pub const RTP_FLAG_MAX: u8 = 1;
pub const RTP_CSRC_COUNT_MAX: u8 = 0x0F;
pub const RTP_PAYLOAD_TYPE_MAX: u8 = 0x7F;
