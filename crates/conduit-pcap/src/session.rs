use std::net::SocketAddr;

use crate::file::{FAMILY_INET, FAMILY_INET6, encode_record};
use crate::packet::{TcpFlags, build_segment, mtu_for};

/// Which side dialed the connection -- decides the direction of the
/// synthesized 3-way handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Client,
    Server,
}

/// Which side tears the connection down first -- decides the direction of
/// the synthesized FIN/FIN-ACK/ACK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closer {
    Local,
    Remote,
}

/// When an outbound write is recorded relative to the real I/O it
/// represents. Default is `WhenCompleted` (spec.md §4.F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitPolicy {
    WhenIssued,
    #[default]
    WhenCompleted,
}

/// Per-connection TCP pseudo-state plus the handshake/teardown synthesis
/// spec.md's PCAP middleware requires. Bytes are handed to a caller-supplied
/// `sink` -- this type performs no I/O of its own.
pub struct PcapSession<S: FnMut(&[u8])> {
    mode: Mode,
    emit_policy: EmitPolicy,
    local: SocketAddr,
    remote: SocketAddr,
    seq_out: u32,
    seq_in: u32,
    handshake_emitted: bool,
    torn_down: bool,
    sink: S,
}

impl<S: FnMut(&[u8])> PcapSession<S> {
    pub fn new(mode: Mode, local: SocketAddr, remote: SocketAddr, emit_policy: EmitPolicy, sink: S) -> Self {
        assert_eq!(
            local.is_ipv4(),
            remote.is_ipv4(),
            "local and remote addresses must share an address family"
        );
        Self {
            mode,
            emit_policy,
            local,
            remote,
            seq_out: 0,
            seq_in: 0,
            handshake_emitted: false,
            torn_down: false,
            sink,
        }
    }

    fn family_id(&self) -> u32 {
        if self.local.is_ipv4() { FAMILY_INET } else { FAMILY_INET6 }
    }

    fn emit(&mut self, ts_sec: u32, ts_usec: u32, ip_packet: &[u8]) {
        let record = encode_record(ts_sec, ts_usec, self.family_id(), ip_packet);
        (self.sink)(&record);
    }

    /// Synthesizes the 3-way handshake, idempotently -- safe to call once
    /// per event source (channel-active for clients, just-before-first-read
    /// for servers) without risking a duplicate.
    pub fn ensure_handshake(&mut self, ts_sec: u32, ts_usec: u32) {
        if self.handshake_emitted {
            return;
        }
        self.handshake_emitted = true;

        let (dialer, acceptor) = match self.mode {
            Mode::Client => (self.local, self.remote),
            Mode::Server => (self.remote, self.local),
        };

        let syn = build_segment(dialer, acceptor, 0, 0, TcpFlags::SYN, &[]);
        let syn_ack = build_segment(acceptor, dialer, 0, 1, TcpFlags::SYN | TcpFlags::ACK, &[]);
        let ack = build_segment(dialer, acceptor, 1, 1, TcpFlags::ACK, &[]);

        self.emit(ts_sec, ts_usec, &syn);
        self.emit(ts_sec, ts_usec, &syn_ack);
        self.emit(ts_sec, ts_usec, &ack);

        // SYNs consume one sequence number each, regardless of who dialed.
        match self.mode {
            Mode::Client => {
                self.seq_out = 1;
                self.seq_in = 1;
            }
            Mode::Server => {
                self.seq_in = 1;
                self.seq_out = 1;
            }
        }
    }

    /// Application bytes leaving this side, split into MTU-sized segments.
    fn emit_outbound(&mut self, ts_sec: u32, ts_usec: u32, payload: &[u8]) {
        self.ensure_handshake(ts_sec, ts_usec);
        let mtu = mtu_for(self.local.ip());
        for chunk in chunk_payload(payload, mtu) {
            let segment = build_segment(self.local, self.remote, self.seq_out, self.seq_in, TcpFlags::ACK, chunk);
            self.emit(ts_sec, ts_usec, &segment);
            self.seq_out = self.seq_out.wrapping_add(chunk.len() as u32);
        }
    }

    /// Record a write as soon as the pipeline accepts it. A no-op unless
    /// `emit_policy` is `WhenIssued`.
    pub fn write_issued(&mut self, ts_sec: u32, ts_usec: u32, payload: &[u8]) {
        if self.emit_policy == EmitPolicy::WhenIssued {
            self.emit_outbound(ts_sec, ts_usec, payload);
        }
    }

    /// Record a write once its flush actually succeeds. A no-op unless
    /// `emit_policy` is `WhenCompleted`.
    pub fn write_completed(&mut self, ts_sec: u32, ts_usec: u32, payload: &[u8]) {
        if self.emit_policy == EmitPolicy::WhenCompleted {
            self.emit_outbound(ts_sec, ts_usec, payload);
        }
    }

    /// Application bytes arriving at this side.
    pub fn read(&mut self, ts_sec: u32, ts_usec: u32, payload: &[u8]) {
        self.ensure_handshake(ts_sec, ts_usec);
        let mtu = mtu_for(self.remote.ip());
        for chunk in chunk_payload(payload, mtu) {
            let segment = build_segment(self.remote, self.local, self.seq_in, self.seq_out, TcpFlags::ACK, chunk);
            self.emit(ts_sec, ts_usec, &segment);
            self.seq_in = self.seq_in.wrapping_add(chunk.len() as u32);
        }
    }

    /// Synthesizes the FIN/FIN-ACK/ACK teardown in the direction `closer`
    /// initiated it. Idempotent: a channel can only go inactive once.
    pub fn channel_inactive(&mut self, ts_sec: u32, ts_usec: u32, closer: Closer) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.ensure_handshake(ts_sec, ts_usec);

        let (initiator, responder, init_seq, init_ack) = match closer {
            Closer::Local => (self.local, self.remote, self.seq_out, self.seq_in),
            Closer::Remote => (self.remote, self.local, self.seq_in, self.seq_out),
        };

        let fin = build_segment(initiator, responder, init_seq, init_ack, TcpFlags::FIN | TcpFlags::ACK, &[]);
        let fin_ack =
            build_segment(responder, initiator, init_ack, init_seq + 1, TcpFlags::FIN | TcpFlags::ACK, &[]);
        let ack = build_segment(initiator, responder, init_seq + 1, init_ack + 1, TcpFlags::ACK, &[]);

        self.emit(ts_sec, ts_usec, &fin);
        self.emit(ts_sec, ts_usec, &fin_ack);
        self.emit(ts_sec, ts_usec, &ack);

        match closer {
            Closer::Local => {
                self.seq_out = init_seq + 1;
                self.seq_in = init_ack + 1;
            }
            Closer::Remote => {
                self.seq_in = init_seq + 1;
                self.seq_out = init_ack + 1;
            }
        }
    }
}

fn chunk_payload(payload: &[u8], mtu: usize) -> Vec<&[u8]> {
    if payload.is_empty() {
        return Vec::new();
    }
    payload.chunks(mtu).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(ip: Ipv4Addr, port: u16) -> SocketAddr {
        SocketAddr::new(ip.into(), port)
    }

    #[test]
    fn client_mode_handshake_is_three_records_local_initiated() {
        let local = addr(Ipv4Addr::new(255, 255, 255, 254), 65534);
        let remote = addr(Ipv4Addr::new(1, 2, 3, 4), 5678);
        let mut records = Vec::new();
        let mut session = PcapSession::new(Mode::Client, local, remote, EmitPolicy::default(), |record: &[u8]| {
            records.push(record.to_vec());
        });
        session.ensure_handshake(0, 0);
        assert_eq!(records.len(), 3);
        for record in &records {
            // 16-byte record header + 4-byte family prefix + 40-byte IPv4/TCP packet
            assert_eq!(record.len(), 16 + 4 + 40);
        }
    }

    #[test]
    fn write_when_issued_records_immediately_write_when_completed_defers() {
        let local = addr(Ipv4Addr::new(10, 0, 0, 1), 1000);
        let remote = addr(Ipv4Addr::new(10, 0, 0, 2), 2000);

        let mut issued_records = Vec::new();
        let mut issued = PcapSession::new(Mode::Client, local, remote, EmitPolicy::WhenIssued, |r: &[u8]| {
            issued_records.push(r.to_vec())
        });
        issued.ensure_handshake(0, 0);
        issued.write_issued(0, 0, b"hello");
        assert_eq!(issued_records.len(), 4); // 3 handshake + 1 data

        let mut completed_records = Vec::new();
        let mut completed =
            PcapSession::new(Mode::Client, local, remote, EmitPolicy::WhenCompleted, |r: &[u8]| {
                completed_records.push(r.to_vec())
            });
        completed.ensure_handshake(0, 0);
        completed.write_issued(0, 0, b"hello");
        assert_eq!(completed_records.len(), 3); // issued write not recorded yet
        completed.write_completed(0, 0, b"hello");
        assert_eq!(completed_records.len(), 4);
    }

    #[test]
    fn teardown_emits_fin_fin_ack_ack() {
        let local = addr(Ipv4Addr::new(10, 0, 0, 1), 1000);
        let remote = addr(Ipv4Addr::new(10, 0, 0, 2), 2000);
        let mut records = Vec::new();
        let mut session = PcapSession::new(Mode::Client, local, remote, EmitPolicy::default(), |r: &[u8]| {
            records.push(r.to_vec())
        });
        session.ensure_handshake(0, 0);
        session.channel_inactive(1, 0, Closer::Local);
        assert_eq!(records.len(), 6); // 3 handshake + 3 teardown
    }

    #[test]
    fn channel_inactive_is_idempotent() {
        let local = addr(Ipv4Addr::new(10, 0, 0, 1), 1000);
        let remote = addr(Ipv4Addr::new(10, 0, 0, 2), 2000);
        let mut records = Vec::new();
        let mut session = PcapSession::new(Mode::Client, local, remote, EmitPolicy::default(), |r: &[u8]| {
            records.push(r.to_vec())
        });
        session.channel_inactive(0, 0, Closer::Local);
        let after_first = records.len();
        session.channel_inactive(0, 0, Closer::Local);
        assert_eq!(records.len(), after_first);
    }

    #[test]
    fn large_write_is_split_into_mtu_sized_segments() {
        let local = addr(Ipv4Addr::new(10, 0, 0, 1), 1000);
        let remote = addr(Ipv4Addr::new(10, 0, 0, 2), 2000);
        let mut records = Vec::new();
        let mut session = PcapSession::new(Mode::Client, local, remote, EmitPolicy::default(), |r: &[u8]| {
            records.push(r.to_vec())
        });
        session.ensure_handshake(0, 0);
        let mtu = mtu_for(local.ip());
        let payload = vec![7u8; mtu + 10];
        session.write_completed(0, 0, &payload);
        assert_eq!(records.len(), 3 + 2); // handshake + two segments
    }
}
