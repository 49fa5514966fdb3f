use std::time::Duration;

use conduit_pipeline::TestChannel;
use conduit_proxy::{ConnectHandshake, InstantDeadline, ProxyError, ReadOutcome};

fn addr(port: u16) -> std::net::SocketAddr {
    std::net::SocketAddr::from(([127, 0, 0, 1], port))
}

/// Full happy-path handshake: the request head goes out with the supplied
/// `Proxy-Authorization` header, the response head is drip-fed byte by
/// byte (as it would arrive off a real socket, one at a time), and only
/// once the final blank line lands does the future resolve and
/// `payload_start` point exactly at the end of the buffer.
#[test]
fn byte_at_a_time_response_only_establishes_once_the_full_head_has_arrived() {
    let mut channel = TestChannel::new(addr(1), addr(2));
    let headers = vec![("Proxy-Authorization".to_string(), "Basic dXNlcjpwYXNz".to_string())];
    let mut handshake =
        ConnectHandshake::new("upstream.example", 8443, headers, InstantDeadline::new(Duration::from_secs(10)));

    handshake.on_active(&mut channel);
    let sent = channel.take_writes();
    assert_eq!(sent.len(), 1);
    let request = String::from_utf8(sent[0].clone()).unwrap();
    assert!(request.starts_with("CONNECT upstream.example:8443 HTTP/1.1\r\n"));
    assert!(request.contains("Proxy-Authorization: Basic dXNlcjpwYXNz\r\n"));

    let future = handshake.established_future();
    let mut established = false;
    future.on_complete(move |r| established = r.is_ok());

    let full_response = b"HTTP/1.1 200 Connection established\r\nProxy-Agent: conduit\r\n\r\n";
    for (i, _) in full_response.iter().enumerate().take(full_response.len() - 1) {
        match handshake.on_read(&mut channel, &full_response[i..i + 1]).unwrap() {
            ReadOutcome::Pending => {}
            ReadOutcome::Established { .. } => panic!("should not establish before the full head arrives"),
        }
    }
    let last = full_response.len() - 1;
    let outcome = handshake.on_read(&mut channel, &full_response[last..]).unwrap();

    match outcome {
        ReadOutcome::Established { payload_start } => assert_eq!(payload_start, full_response.len()),
        ReadOutcome::Pending => panic!("the full head has arrived, handshake should be established"),
    }
    assert!(established);
    assert!(!channel.closed);
}

/// Mirrors spec.md's seed scenario 7: a CONNECT answered with a bare 500
/// fails the established future with `invalid-proxy-response` and closes
/// the channel, without ever calling back into the handshake again.
#[test]
fn non_2xx_status_fails_the_future_and_closes_the_channel_once() {
    let mut channel = TestChannel::new(addr(1), addr(2));
    let mut handshake =
        ConnectHandshake::new("swift.org", 443, Vec::new(), InstantDeadline::new(Duration::from_secs(10)));
    handshake.on_active(&mut channel);

    let future = handshake.established_future();
    let mut failure = None;
    future.on_complete(move |r| failure = Some(r.is_err()));

    let err = handshake.on_read(&mut channel, b"HTTP/1.1 500 Internal Server Error\r\n\r\n").unwrap_err();
    assert!(matches!(err, ProxyError::InvalidProxyResponse(_)));
    assert_eq!(failure, Some(true));
    assert!(channel.closed);
}
