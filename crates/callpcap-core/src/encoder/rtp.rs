use super::error::FrameError;
use super::layout;
use crate::model::RtpHeaderFields;

/// Pack the 12-byte RTP fixed header (RFC 3550 §5.1).
///
/// Fields wider than their bit slot are rejected instead of masked.
pub fn rtp_header(fields: &RtpHeaderFields) -> Result<[u8; layout::RTP_HEADER_LEN], FrameError> {
    let version = bounded("version", fields.version, layout::RTP_VERSION_MAX)?;
    let padding = bounded("padding", fields.padding, layout::RTP_FLAG_MAX)?;
    let extension = bounded("extension", fields.extension, layout::RTP_FLAG_MAX)?;
    let csrc_count = bounded("csrc_count", fields.csrc_count, layout::RTP_CSRC_COUNT_MAX)?;
    let marker = bounded("marker", fields.marker, layout::RTP_FLAG_MAX)?;
    let payload_type = bounded(
        "payload_type",
        fields.payload_type,
        layout::RTP_PAYLOAD_TYPE_MAX,
    )?;

    let mut header = [0u8; layout::RTP_HEADER_LEN];
    header[layout::RTP_FLAGS_OFFSET] = (version << layout::RTP_VERSION_SHIFT)
        | (padding << layout::RTP_PADDING_SHIFT)
        | (extension << layout::RTP_EXTENSION_SHIFT)
        | csrc_count;
    header[layout::RTP_MARKER_PT_OFFSET] = (marker << layout::RTP_MARKER_SHIFT) | payload_type;
    header[layout::RTP_SEQUENCE_RANGE].copy_from_slice(&fields.sequence_number.to_be_bytes());
    header[layout::RTP_TIMESTAMP_RANGE].copy_from_slice(&fields.rtp_timestamp.to_be_bytes());
    header[layout::RTP_SSRC_RANGE].copy_from_slice(&fields.ssrc.to_be_bytes());
    Ok(header)
}

fn bounded(field: &'static str, value: u8, max: u8) -> Result<u8, FrameError> {
    if value > max {
        return Err(FrameError::RtpFieldOutOfRange { field, value, max });
    }
    Ok(value)
}
