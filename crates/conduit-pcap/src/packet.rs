use std::net::IpAddr;

bitflags::bitflags! {
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TcpFlags: u8 {
        const FIN = 1 << 0;
        const SYN = 1 << 1;
        const RST = 1 << 2;
        const PSH = 1 << 3;
        const ACK = 1 << 4;
        const URG = 1 << 5;
    }
}

/// Largest single-segment TCP payload used when fabricating PCAP writes,
/// derived from `UInt16.max` minus the fixed IP+TCP header overhead for the
/// address family in play.
pub fn mtu_for(addr: IpAddr) -> usize {
    match addr {
        IpAddr::V4(_) => u16::MAX as usize - 40,
        IpAddr::V6(_) => u16::MAX as usize - 60,
    }
}

/// A well-formed TCP segment, optionally wrapped in an IPv4 or IPv6 header
/// depending on `src`/`dst`'s address family. Both sides must share a
/// family -- callers never mix v4 locals with v6 remotes.
pub fn build_segment(
    src: std::net::SocketAddr,
    dst: std::net::SocketAddr,
    seq: u32,
    ack: u32,
    flags: TcpFlags,
    payload: &[u8],
) -> Vec<u8> {
    let tcp = build_tcp_segment(src, dst, seq, ack, flags, payload);
    match (src.ip(), dst.ip()) {
        (IpAddr::V4(s), IpAddr::V4(d)) => wrap_ipv4(s, d, &tcp),
        (IpAddr::V6(s), IpAddr::V6(d)) => wrap_ipv6(s, d, &tcp),
        _ => panic!("src and dst address families must match"),
    }
}

fn build_tcp_segment(
    src: std::net::SocketAddr,
    dst: std::net::SocketAddr,
    seq: u32,
    ack: u32,
    flags: TcpFlags,
    payload: &[u8],
) -> Vec<u8> {
    const TCP_HEADER_LEN: usize = 20;
    let mut tcp = Vec::with_capacity(TCP_HEADER_LEN + payload.len());
    tcp.extend_from_slice(&src.port().to_be_bytes());
    tcp.extend_from_slice(&dst.port().to_be_bytes());
    tcp.extend_from_slice(&seq.to_be_bytes());
    tcp.extend_from_slice(&ack.to_be_bytes());
    let data_offset_and_reserved = ((TCP_HEADER_LEN / 4) as u8) << 4;
    tcp.push(data_offset_and_reserved);
    tcp.push(flags.bits());
    tcp.extend_from_slice(&65535u16.to_be_bytes()); // window
    tcp.extend_from_slice(&0u16.to_be_bytes()); // checksum placeholder
    tcp.extend_from_slice(&0u16.to_be_bytes()); // urgent pointer
    tcp.extend_from_slice(payload);

    let checksum = match (src.ip(), dst.ip()) {
        (IpAddr::V4(s), IpAddr::V4(d)) => tcp_checksum_v4(s, d, &tcp),
        (IpAddr::V6(s), IpAddr::V6(d)) => tcp_checksum_v6(s, d, &tcp),
        _ => panic!("src and dst address families must match"),
    };
    tcp[16..18].copy_from_slice(&checksum.to_be_bytes());
    tcp
}

fn wrap_ipv4(src: std::net::Ipv4Addr, dst: std::net::Ipv4Addr, tcp: &[u8]) -> Vec<u8> {
    const IP_HEADER_LEN: usize = 20;
    let total_len = IP_HEADER_LEN + tcp.len();
    let mut ip = Vec::with_capacity(total_len);
    ip.push(0x45); // version 4, IHL 5 (no options)
    ip.push(0); // DSCP/ECN
    ip.extend_from_slice(&(total_len as u16).to_be_bytes());
    ip.extend_from_slice(&0u16.to_be_bytes()); // identification
    ip.extend_from_slice(&0x4000u16.to_be_bytes()); // flags: don't fragment
    ip.push(64); // TTL
    ip.push(6); // protocol: TCP
    ip.extend_from_slice(&0u16.to_be_bytes()); // checksum placeholder
    ip.extend_from_slice(&src.octets());
    ip.extend_from_slice(&dst.octets());

    let checksum = ip_checksum(&ip);
    ip[10..12].copy_from_slice(&checksum.to_be_bytes());
    ip.extend_from_slice(tcp);
    ip
}

fn wrap_ipv6(src: std::net::Ipv6Addr, dst: std::net::Ipv6Addr, tcp: &[u8]) -> Vec<u8> {
    let mut ip = Vec::with_capacity(40 + tcp.len());
    ip.extend_from_slice(&0x6000_0000u32.to_be_bytes()); // version 6, traffic class/flow label 0
    ip.extend_from_slice(&(tcp.len() as u16).to_be_bytes());
    ip.push(6); // next header: TCP
    ip.push(64); // hop limit
    ip.extend_from_slice(&src.octets());
    ip.extend_from_slice(&dst.octets());
    ip.extend_from_slice(tcp);
    ip
}

/// Internet checksum (RFC 1071): one's-complement sum of 16-bit words,
/// folded and complemented.
fn ones_complement_sum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

fn ip_checksum(header: &[u8]) -> u16 {
    ones_complement_sum(header)
}

fn tcp_checksum_v4(src: std::net::Ipv4Addr, dst: std::net::Ipv4Addr, tcp: &[u8]) -> u16 {
    let mut pseudo = Vec::with_capacity(12 + tcp.len());
    pseudo.extend_from_slice(&src.octets());
    pseudo.extend_from_slice(&dst.octets());
    pseudo.push(0);
    pseudo.push(6); // protocol: TCP
    pseudo.extend_from_slice(&(tcp.len() as u16).to_be_bytes());
    pseudo.extend_from_slice(tcp);
    ones_complement_sum(&pseudo)
}

fn tcp_checksum_v6(src: std::net::Ipv6Addr, dst: std::net::Ipv6Addr, tcp: &[u8]) -> u16 {
    let mut pseudo = Vec::with_capacity(40 + tcp.len());
    pseudo.extend_from_slice(&src.octets());
    pseudo.extend_from_slice(&dst.octets());
    pseudo.extend_from_slice(&(tcp.len() as u32).to_be_bytes());
    pseudo.extend_from_slice(&[0, 0, 0]);
    pseudo.push(6); // next header: TCP
    pseudo.extend_from_slice(tcp);
    ones_complement_sum(&pseudo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddr};

    fn addr(ip: Ipv4Addr, port: u16) -> SocketAddr {
        SocketAddr::new(ip.into(), port)
    }

    #[test]
    fn ipv4_whole_packet_with_no_payload_is_40_bytes() {
        let src = addr(Ipv4Addr::new(255, 255, 255, 254), 65534);
        let dst = addr(Ipv4Addr::new(1, 2, 3, 4), 5678);
        let packet = build_segment(src, dst, 0, 0, TcpFlags::SYN, &[]);
        assert_eq!(packet.len(), 40);
        assert_eq!(packet[0], 0x45);
        assert_eq!(packet[9], 6); // protocol: TCP
    }

    #[test]
    fn tcp_checksum_is_nonzero_and_deterministic() {
        let src = addr(Ipv4Addr::new(10, 0, 0, 1), 1000);
        let dst = addr(Ipv4Addr::new(10, 0, 0, 2), 2000);
        let a = build_segment(src, dst, 5, 9, TcpFlags::ACK | TcpFlags::PSH, b"hello");
        let b = build_segment(src, dst, 5, 9, TcpFlags::ACK | TcpFlags::PSH, b"hello");
        assert_eq!(a, b);
        let checksum = u16::from_be_bytes([a[36], a[37]]);
        assert_ne!(checksum, 0);
    }
}
