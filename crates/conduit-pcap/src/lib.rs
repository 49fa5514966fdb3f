//! PCAP capture middleware (spec component F): synthesizes a well-formed
//! packet capture of inbound/outbound application bytes by fabricating a
//! TCP/IP handshake, per-write MTU-sized segments, and a teardown, plus a
//! bounded ring buffer that retains the last N fragments / M bytes for
//! on-demand emission. The middleware performs no I/O of its own -- bytes
//! are handed to a caller-supplied sink.

mod file;
mod packet;
mod ring;
mod session;

pub use file::{FAMILY_INET, FAMILY_INET6, LINKTYPE_NULL, MAGIC, encode_record, file_header};
pub use packet::{TcpFlags, build_segment, mtu_for};
pub use ring::RingBuffer;
pub use session::{Closer, EmitPolicy, Mode, PcapSession};
