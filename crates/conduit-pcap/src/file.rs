use conduit_bytes::{ByteBuffer, Endianness};

/// Magic number identifying a little-endian, microsecond-resolution pcap
/// file (as opposed to the nanosecond variant or a big-endian capture).
pub const MAGIC: u32 = 0xA1B2_C3D4;
pub const VERSION_MAJOR: u16 = 2;
pub const VERSION_MINOR: u16 = 4;
/// `LINKTYPE_NULL` -- BSD loopback encapsulation: each record's payload is
/// prefixed with a 4-byte host-order address-family id ahead of the raw
/// IP packet.
pub const LINKTYPE_NULL: u32 = 0;

/// BSD `AF_INET`/`AF_INET6` values used as the 4-byte family prefix inside
/// a `LINKTYPE_NULL` record.
pub const FAMILY_INET: u32 = 2;
pub const FAMILY_INET6: u32 = 24;

/// The 24-byte global header every pcap file opens with.
pub fn file_header() -> Vec<u8> {
    let mut buf = ByteBuffer::with_capacity(24);
    buf.write_u32(MAGIC, Endianness::Little);
    buf.write_u16(VERSION_MAJOR, Endianness::Little);
    buf.write_u16(VERSION_MINOR, Endianness::Little);
    buf.write_u32(0, Endianness::Little); // thiszone
    buf.write_u32(0, Endianness::Little); // sigfigs
    buf.write_u32(u32::MAX, Endianness::Little); // snaplen
    buf.write_u32(LINKTYPE_NULL, Endianness::Little); // network
    buf.readable_slice().to_vec()
}

/// One 16-byte per-record header plus payload: `{ts_sec, ts_usec,
/// captured_len, orig_len}`, followed by `family_id ++ ip_packet`.
pub fn encode_record(ts_sec: u32, ts_usec: u32, family_id: u32, ip_packet: &[u8]) -> Vec<u8> {
    let captured_len = (ip_packet.len() + 4) as u32;
    let mut buf = ByteBuffer::with_capacity(16 + captured_len as usize);
    buf.write_u32(ts_sec, Endianness::Little);
    buf.write_u32(ts_usec, Endianness::Little);
    buf.write_u32(captured_len, Endianness::Little);
    buf.write_u32(captured_len, Endianness::Little); // orig_len: we never truncate
    buf.write_u32(family_id, Endianness::Little);
    buf.write_bytes(ip_packet);
    buf.readable_slice().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_header_is_24_bytes_with_the_documented_fields() {
        let header = file_header();
        assert_eq!(header.len(), 24);
        assert_eq!(u32::from_le_bytes(header[0..4].try_into().unwrap()), MAGIC);
        assert_eq!(u16::from_le_bytes(header[4..6].try_into().unwrap()), VERSION_MAJOR);
        assert_eq!(u16::from_le_bytes(header[6..8].try_into().unwrap()), VERSION_MINOR);
        assert_eq!(u32::from_le_bytes(header[16..20].try_into().unwrap()), u32::MAX);
        assert_eq!(u32::from_le_bytes(header[20..24].try_into().unwrap()), LINKTYPE_NULL);
    }

    #[test]
    fn record_captured_len_accounts_for_the_family_prefix() {
        let record = encode_record(1, 2, FAMILY_INET, &[0xAA; 40]);
        assert_eq!(record.len(), 16 + 4 + 40);
        let captured_len = u32::from_le_bytes(record[8..12].try_into().unwrap());
        assert_eq!(captured_len, 44);
    }
}
