//! Heuristic payload classification for inspected datagrams.

use crate::RtpSummary;
use crate::encoder::layout;

const SIP_VERSION: &str = "SIP/2.0";
const RTP_VERSION: u8 = 2;

/// First line of a SIP request or response, if the payload looks like one.
pub fn sip_start_line(payload: &[u8]) -> Option<String> {
    let end = payload
        .iter()
        .position(|b| *b == b'\r' || *b == b'\n')
        .unwrap_or(payload.len());
    let line = std::str::from_utf8(&payload[..end]).ok()?.trim();
    let is_response = line.starts_with(SIP_VERSION) && line[SIP_VERSION.len()..].starts_with(' ');
    let is_request = line
        .rsplit_once(' ')
        .is_some_and(|(head, version)| version == SIP_VERSION && head.contains(' '));
    if is_response || is_request {
        Some(line.to_string())
    } else {
        None
    }
}

/// Decode the RTP fixed header when the payload carries version 2.
pub fn rtp_summary(payload: &[u8]) -> Option<RtpSummary> {
    let header = payload.get(..layout::RTP_HEADER_LEN)?;
    let flags = header[layout::RTP_FLAGS_OFFSET];
    if flags >> layout::RTP_VERSION_SHIFT != RTP_VERSION {
        return None;
    }
    let marker_pt = header[layout::RTP_MARKER_PT_OFFSET];
    let word = |range: std::ops::Range<usize>| -> u32 {
        header[range]
            .iter()
            .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte))
    };
    Some(RtpSummary {
        payload_type: marker_pt & layout::RTP_PAYLOAD_TYPE_MAX,
        marker: marker_pt >> layout::RTP_MARKER_SHIFT == 1,
        sequence_number: word(layout::RTP_SEQUENCE_RANGE) as u16,
        rtp_timestamp: word(layout::RTP_TIMESTAMP_RANGE),
        ssrc: word(layout::RTP_SSRC_RANGE),
        payload_len: payload.len() - layout::RTP_HEADER_LEN,
    })
}

#[cfg(test)]
mod tests {
    use super::{rtp_summary, sip_start_line};

    #[test]
    fn sip_request_and_response() {
        assert_eq!(
            sip_start_line(b"INVITE sip:bob@biloxi.com SIP/2.0\r\nVia: x\r\n\r\n").as_deref(),
            Some("INVITE sip:bob@biloxi.com SIP/2.0")
        );
        assert_eq!(
            sip_start_line(b"SIP/2.0 180 Ringing\r\n\r\n").as_deref(),
            Some("SIP/2.0 180 Ringing")
        );
    }

    #[test]
    fn not_sip() {
        assert!(sip_start_line(b"").is_none());
        assert!(sip_start_line(b"GET / HTTP/1.1\r\n").is_none());
        assert!(sip_start_line(&[0x80, 0x08, 0x00]).is_none());
        assert!(sip_start_line(b"SIP/2.0").is_none());
    }

    #[test]
    fn rtp_fields() {
        let mut payload = vec![0x80, 0x88, 0x01, 0x2C, 0x00, 0x01, 0xE2, 0x40];
        payload.extend_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        payload.extend_from_slice(&[0xD5; 4]);
        let rtp = rtp_summary(&payload).unwrap();
        assert_eq!(rtp.payload_type, 8);
        assert!(rtp.marker);
        assert_eq!(rtp.sequence_number, 300);
        assert_eq!(rtp.rtp_timestamp, 123_456);
        assert_eq!(rtp.ssrc, 0xDEAD_BEEF);
        assert_eq!(rtp.payload_len, 4);
    }

    #[test]
    fn not_rtp() {
        assert!(rtp_summary(&[0x80; 11]).is_none());
        assert!(rtp_summary(&[0x40; 12]).is_none());
    }
}
