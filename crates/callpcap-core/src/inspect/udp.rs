use std::net::IpAddr;

use etherparse::{NetSlice, SlicedPacket, TransportSlice};
use pcap_parser::Linktype;

use super::error::FrameSliceError;

/// Endpoints and payload of a UDP datagram found in a capture frame.
pub struct UdpDatagram<'a> {
    pub src_ip: IpAddr,
    pub src_port: u16,
    pub dst_ip: IpAddr,
    pub dst_port: u16,
    pub payload: &'a [u8],
}

/// Locate the UDP datagram inside an Ethernet frame.
///
/// Frames of another link type, non-IP frames and IP packets carrying
/// something other than UDP yield `Ok(None)`. Only frames that claim a
/// protocol and then fail to decode are errors.
pub fn udp_datagram(
    linktype: Linktype,
    frame: &[u8],
) -> Result<Option<UdpDatagram<'_>>, FrameSliceError> {
    if linktype != Linktype::ETHERNET {
        return Ok(None);
    }
    let sliced = SlicedPacket::from_ethernet(frame)
        .map_err(|e| FrameSliceError::Slice(e.to_string()))?;

    let Some(TransportSlice::Udp(udp)) = sliced.transport else {
        return Ok(None);
    };
    let (src_ip, dst_ip) = match sliced.net {
        Some(NetSlice::Ipv4(ipv4)) => (
            IpAddr::V4(ipv4.header().source_addr()),
            IpAddr::V4(ipv4.header().destination_addr()),
        ),
        Some(NetSlice::Ipv6(ipv6)) => (
            IpAddr::V6(ipv6.header().source_addr()),
            IpAddr::V6(ipv6.header().destination_addr()),
        ),
        _ => return Ok(None),
    };

    Ok(Some(UdpDatagram {
        src_ip,
        src_port: udp.source_port(),
        dst_ip,
        dst_port: udp.destination_port(),
        payload: udp.payload(),
    }))
}
