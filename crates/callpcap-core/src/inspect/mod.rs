//! Read a classic pcap back into a per-packet summary.
//!
//! This is the consumer-side check of what the encoder produces: frames are
//! read with `pcap-parser` and sliced with `etherparse`, independently of the
//! encoder's own header code. PCAPNG input is recognised and rejected.

pub mod error;
pub mod payload;
pub mod reader;
pub mod udp;

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use pcap_parser::traits::PcapReaderIterator;
use pcap_parser::{LegacyPcapReader, Linktype, PcapBlockOwned, PcapError};

use crate::timestamp::Timestamp;
use crate::{CaptureSummary, PacketSummary};

use error::InspectError;
use reader::{PCAP_READER_BUFFER_SIZE, is_pcapng_magic, read_magic_and_rewind, record_ts_nanos};
use udp::udp_datagram;

pub fn inspect_file(path: &Path) -> Result<CaptureSummary, InspectError> {
    let file = File::open(path)?;
    inspect_reader(file)
}

pub fn inspect_bytes(bytes: &[u8]) -> Result<CaptureSummary, InspectError> {
    inspect_reader(Cursor::new(bytes))
}

pub fn inspect_reader<R: Read + Seek>(mut source: R) -> Result<CaptureSummary, InspectError> {
    let magic = read_magic_and_rewind(&mut source)?;
    if is_pcapng_magic(&magic) {
        return Err(InspectError::UnsupportedFormat { format: "pcapng" });
    }

    let mut reader = LegacyPcapReader::new(PCAP_READER_BUFFER_SIZE, source).map_err(|e| {
        InspectError::Pcap {
            context: "pcap reader init",
            message: e.to_string(),
        }
    })?;

    let mut linktype = Linktype::ETHERNET;
    let mut summary = CaptureSummary::default();
    let mut first_ns: Option<u64> = None;
    let mut last_ns: Option<u64> = None;

    loop {
        match reader.next() {
            Ok((offset, block)) => {
                match block {
                    PcapBlockOwned::LegacyHeader(header) => {
                        linktype = header.network;
                        summary.link_type = header.network.0;
                        summary.snaplen = header.snaplen;
                    }
                    PcapBlockOwned::Legacy(packet) => {
                        let ts_ns = record_ts_nanos(packet.ts_sec, packet.ts_usec);
                        first_ns = Some(first_ns.map_or(ts_ns, |v| v.min(ts_ns)));
                        last_ns = Some(last_ns.map_or(ts_ns, |v| v.max(ts_ns)));
                        let index = summary.packets.len() as u64;
                        summary.packets.push(summarize_packet(
                            index,
                            linktype,
                            ts_ns,
                            packet.origlen,
                            packet.data,
                        ));
                    }
                    _ => {}
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader.refill().map_err(|e| InspectError::Pcap {
                    context: "pcap reader refill",
                    message: e.to_string(),
                })?;
            }
            Err(e) => {
                return Err(InspectError::Pcap {
                    context: "pcap reader next",
                    message: e.to_string(),
                });
            }
        }
    }

    summary.packets_total = summary.packets.len() as u64;
    summary.time_start = first_ns.and_then(|ns| Timestamp::from_nanos(ns).to_rfc3339());
    summary.time_end = last_ns.and_then(|ns| Timestamp::from_nanos(ns).to_rfc3339());
    Ok(summary)
}

fn summarize_packet(
    index: u64,
    linktype: Linktype,
    ts_ns: u64,
    original_len: u32,
    data: &[u8],
) -> PacketSummary {
    let mut summary = PacketSummary {
        index,
        timestamp: Timestamp::from_nanos(ts_ns).to_rfc3339(),
        timestamp_ns: ts_ns,
        captured_len: data.len() as u32,
        original_len,
        proto: "other".to_string(),
        src: None,
        dst: None,
        payload_len: None,
        sip_start_line: None,
        rtp: None,
        error: None,
    };

    let udp = match udp_datagram(linktype, data) {
        Ok(Some(udp)) => udp,
        Ok(None) => return summary,
        Err(err) => {
            summary.error = Some(err.to_string());
            return summary;
        }
    };

    summary.src = Some(format!("{}:{}", udp.src_ip, udp.src_port));
    summary.dst = Some(format!("{}:{}", udp.dst_ip, udp.dst_port));
    summary.payload_len = Some(udp.payload.len());
    if let Some(line) = payload::sip_start_line(udp.payload) {
        summary.proto = "sip".to_string();
        summary.sip_start_line = Some(line);
    } else if let Some(rtp) = payload::rtp_summary(udp.payload) {
        summary.proto = "rtp".to_string();
        summary.rtp = Some(rtp);
    } else {
        summary.proto = "udp".to_string();
    }
    summary
}
