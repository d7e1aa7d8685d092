use std::fs;
use std::path::{Path, PathBuf};

use callpcap_core::{CallCapture, encode, inspect_bytes};
use etherparse::{IpNumber, NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;
use pcap_parser::pcap::{LegacyPcapBlock, parse_pcap_frame, parse_pcap_header};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load(name: &str) -> CallCapture {
    let bytes = fs::read(fixture(name)).expect("read fixture");
    CallCapture::from_json_slice(&bytes).expect("parse fixture")
}

fn records(bytes: &[u8]) -> Vec<LegacyPcapBlock<'_>> {
    let (mut rest, header) = parse_pcap_header(bytes).expect("global header");
    assert_eq!(header.magic_number, 0xA1B2_C3D4);
    assert_eq!(header.version_major, 2);
    assert_eq!(header.version_minor, 4);
    assert_eq!(header.thiszone, 0);
    assert_eq!(header.sigfigs, 0);
    assert_eq!(header.snaplen, 65_535);
    assert_eq!(header.network, Linktype::ETHERNET);

    let mut blocks = Vec::new();
    while !rest.is_empty() {
        let (next, block) = parse_pcap_frame(rest).expect("packet record");
        blocks.push(block);
        rest = next;
    }
    blocks
}

fn udp_payload(block: &LegacyPcapBlock<'_>) -> Vec<u8> {
    let sliced = SlicedPacket::from_ethernet(block.data).expect("ethernet frame");
    match sliced.transport {
        Some(TransportSlice::Udp(udp)) => udp.payload().to_vec(),
        _ => panic!("expected UDP"),
    }
}

#[test]
fn fixture_call_encodes_in_message_order() {
    let capture = load("call_invite.json");
    // rtcp_flow has no framing and is dropped when loading.
    assert_eq!(capture.messages.len(), 4);

    let pcap = encode(&capture);
    assert_eq!(pcap.packet_count(), 5);

    let blocks = records(pcap.as_bytes());
    assert_eq!(blocks.len(), 5);
    let payloads: Vec<Vec<u8>> = blocks.iter().map(udp_payload).collect();
    assert!(payloads[0].starts_with(b"INVITE sip:1002@10.20.0.9 SIP/2.0\r\n"));
    assert!(payloads[1].starts_with(b"SIP/2.0 200 OK\r\n"));
    assert_eq!(&payloads[2][..2], &[0x80, 0x88]);
    assert_eq!(&payloads[3][..2], &[0x80, 0x08]);
    assert!(payloads[4].starts_with(b"BYE "));

    assert_eq!(blocks[0].ts_sec, 1_717_243_200);
    assert_eq!(blocks[1].ts_usec, 120_000);
    assert_eq!(blocks[4].ts_sec, 1_717_243_205);
    assert_eq!(blocks[4].ts_usec, 500_000);
}

#[test]
fn frames_carry_valid_ipv4_and_udp_headers() {
    let pcap = encode(&load("call_invite.json"));

    for block in records(pcap.as_bytes()) {
        assert_eq!(block.caplen, block.origlen);
        assert_eq!(block.caplen as usize, block.data.len());
        assert_eq!(&block.data[0..6], &[0xFF; 6]);
        assert_eq!(&block.data[6..12], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

        let sliced = SlicedPacket::from_ethernet(block.data).expect("ethernet frame");
        let ipv4 = match sliced.net {
            Some(NetSlice::Ipv4(ipv4)) => ipv4,
            _ => panic!("expected IPv4"),
        };
        let header = ipv4.header();
        assert_eq!(header.ttl(), 64);
        assert!(header.dont_fragment());
        assert_eq!(header.identification(), 0);
        assert_eq!(header.protocol(), IpNumber::UDP);
        assert_eq!(
            header.header_checksum(),
            header.to_header().calc_header_checksum()
        );
        assert_eq!(header.total_len() as usize, block.data.len() - 14);

        let udp = match sliced.transport {
            Some(TransportSlice::Udp(udp)) => udp,
            _ => panic!("expected UDP"),
        };
        assert_eq!(udp.checksum(), 0);
        assert_eq!(udp.length() as usize, block.data.len() - 14 - 20);
    }
}

#[test]
fn total_length_is_sum_of_records() {
    let capture = load("call_invite.json");
    let pcap = encode(&capture);
    let expected: usize = 24
        + records(pcap.as_bytes())
            .iter()
            .map(|block| 16 + block.data.len())
            .sum::<usize>();
    assert_eq!(pcap.len(), expected);
}

#[test]
fn stream_records_encode_one_packet_per_value() {
    let capture = load("stream_records.json");
    assert_eq!(capture.file_name(), "a84b4c76e66710@pc33.example.com.pcap");

    let pcap = encode(&capture);
    let summary = inspect_bytes(pcap.as_bytes()).expect("inspect");
    assert_eq!(summary.packets_total, 3);

    let lines: Vec<_> = summary
        .packets
        .iter()
        .map(|p| p.sip_start_line.clone().unwrap_or_default())
        .collect();
    assert_eq!(
        lines,
        vec![
            "INVITE sip:bob@example.com SIP/2.0",
            "ACK sip:bob@example.com SIP/2.0",
            "SIP/2.0 200 OK",
        ]
    );
    assert_eq!(summary.packets[2].src.as_deref(), Some("192.0.2.20:5080"));
    assert_eq!(summary.packets[2].dst.as_deref(), Some("192.0.2.10:5060"));
}

#[test]
fn inspector_reports_rtp_fields() {
    let pcap = encode(&load("call_invite.json"));
    let summary = inspect_bytes(pcap.as_bytes()).expect("inspect");

    let rtp: Vec<_> = summary.packets.iter().filter_map(|p| p.rtp).collect();
    assert_eq!(rtp.len(), 2);
    assert_eq!(rtp[0].sequence_number, 300);
    assert_eq!(rtp[0].ssrc, 0xDEAD_BEEF);
    assert!(rtp[0].marker);
    assert_eq!(rtp[1].rtp_timestamp, 123_616);
    assert_eq!(rtp[1].payload_len, 8);
}

#[test]
fn encoding_twice_is_byte_identical() {
    let capture = load("call_invite.json");
    assert_eq!(encode(&capture).into_bytes(), encode(&capture).into_bytes());
}
