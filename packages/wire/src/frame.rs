//! Length-prefixed message framing over a stream socket.
//!
//! One frame is `[4-byte little-endian length][payload]`. Sends are best
//! effort; receives retry short reads a bounded number of times before
//! reporting a transport failure.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use treefs_core::Error;

/// Retries for a short or interrupted read before giving up.
const RECV_RETRIES: u32 = 3;

/// Backoff between receive retries.
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Send one frame: length prefix then payload, in a single write.
///
/// Transport errors are swallowed; the peer detecting a missing frame is
/// the failure path.
pub fn send_frame(stream: &mut impl Write, payload: &[u8]) {
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    if let Err(e) = stream.write_all(&frame) {
        log::debug!("send_frame: dropped {} bytes: {}", payload.len(), e);
    }
}

/// Read exactly `size` bytes, retrying interrupted or short reads.
fn recv_exact(stream: &mut impl Read, size: usize) -> Result<Vec<u8>, Error> {
    let mut data = vec![0u8; size];
    let mut filled = 0;
    let mut retries = RECV_RETRIES;

    while filled < size {
        match stream.read(&mut data[filled..]) {
            Ok(0) => {
                return Err(Error::transport(format!(
                    "peer closed after {} of {} bytes",
                    filled, size
                )));
            }
            Ok(n) => filled += n,
            Err(e) => {
                if retries == 0 {
                    return Err(Error::transport(format!("receive retries exhausted: {}", e)));
                }
                retries -= 1;
                thread::sleep(RETRY_BACKOFF);
            }
        }
    }
    Ok(data)
}

/// Receive one frame: the 4-byte length, then exactly that many payload
/// bytes.
pub fn recv_frame(stream: &mut impl Read) -> Result<Vec<u8>, Error> {
    let header = recv_exact(stream, 4)?;
    let size = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    recv_exact(stream, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    #[test]
    fn send_then_recv_roundtrip() {
        let mut wire = Vec::new();
        send_frame(&mut wire, b"hello");

        assert_eq!(&wire[..4], &5u32.to_le_bytes());
        let mut cursor = Cursor::new(wire);
        assert_eq!(recv_frame(&mut cursor).unwrap(), b"hello");
    }

    #[test]
    fn empty_payload_roundtrip() {
        let mut wire = Vec::new();
        send_frame(&mut wire, b"");
        let mut cursor = Cursor::new(wire);
        assert_eq!(recv_frame(&mut cursor).unwrap(), b"");
    }

    #[test]
    fn truncated_payload_is_transport_failure() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&10u32.to_le_bytes());
        wire.extend_from_slice(b"short");
        let mut cursor = Cursor::new(wire);
        assert!(matches!(
            recv_frame(&mut cursor),
            Err(Error::Transport { .. })
        ));
    }

    #[test]
    fn closed_before_header_is_transport_failure() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(matches!(
            recv_frame(&mut cursor),
            Err(Error::Transport { .. })
        ));
    }

    /// Reader that fails transiently before delivering its data.
    struct Flaky {
        data: Vec<u8>,
        pos: usize,
        errors_left: u32,
    }

    impl io::Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.errors_left > 0 {
                self.errors_left -= 1;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.pos >= self.data.len() {
                return Ok(0);
            }
            // One byte at a time, to exercise the short-read loop too.
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn transient_errors_and_short_reads_are_retried() {
        let mut wire = Vec::new();
        send_frame(&mut wire, b"ab");
        let mut flaky = Flaky {
            data: wire,
            pos: 0,
            errors_left: 2,
        };
        assert_eq!(recv_frame(&mut flaky).unwrap(), b"ab");
    }

    #[test]
    fn send_swallows_write_errors() {
        struct Broken;
        impl io::Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        // Must not panic or report.
        send_frame(&mut Broken, b"lost");
    }
}
