use std::io::{Read, Seek, SeekFrom};

use super::error::InspectError;
use crate::encoder::layout;

/// Room for two of the largest records the encoder writes.
pub const PCAP_READER_BUFFER_SIZE: usize =
    2 * (layout::RECORD_OVERHEAD + layout::MAX_UDP_PAYLOAD);
pub const PCAPNG_MAGIC: [u8; 4] = [0x0a, 0x0d, 0x0d, 0x0a];

/// Read the magic bytes and rewind the reader to the start.
///
/// # Errors
/// Returns `InspectError::Io` when the reader cannot be read or rewound.
pub fn read_magic_and_rewind<R: Read + Seek>(reader: &mut R) -> Result<[u8; 4], InspectError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;
    Ok(magic)
}

pub fn is_pcapng_magic(magic: &[u8; 4]) -> bool {
    magic == &PCAPNG_MAGIC
}

/// Convert a classic pcap record timestamp to nanoseconds.
pub fn record_ts_nanos(ts_sec: u32, ts_usec: u32) -> u64 {
    u64::from(ts_sec) * 1_000_000_000 + u64::from(ts_usec) * 1_000
}
