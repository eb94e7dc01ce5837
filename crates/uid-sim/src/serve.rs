//! Blocking read-eval-reply loop
//!
//! Reads `\n`-terminated lines, feeds them to a [`Responder`], and writes
//! each reply followed by a newline and a flush. Read timeouts (as raised
//! by serial ports) are retried; end of input ends the loop.

use std::io::{self, BufRead, Write};

use tracing::{debug, info, trace};

use crate::Responder;

/// Serve `responder` until `reader` reaches end of input
///
/// Returns the number of lines processed. A peer that disappears while a
/// reply is being written ends the loop without error.
pub fn serve<R, W>(responder: &mut Responder, mut reader: R, mut writer: W) -> io::Result<u64>
where
    R: BufRead,
    W: Write,
{
    let mut buf = Vec::with_capacity(64);
    let mut lines = 0u64;

    info!("Responding for {} UID(s)", responder.known().len());

    loop {
        let eof = match reader.read_until(b'\n', &mut buf) {
            Ok(0) => true,
            Ok(_) => !buf.ends_with(b"\n"),
            Err(e) if is_retryable(&e) => continue,
            Err(e) => return Err(e),
        };

        if !buf.is_empty() {
            lines += 1;
            let reply = {
                let raw = String::from_utf8_lossy(&buf);
                let line = raw.trim_end_matches(['\n', '\r']);
                let reply = responder.handle_line(line);
                trace!("{:?} -> {:?}", line, reply);
                reply
            };
            buf.clear();

            if let Some(reply) = reply {
                match write_line(&mut writer, &reply) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                        debug!("Peer closed while replying");
                        return Ok(lines);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        if eof {
            break;
        }
    }

    info!("Input closed after {} line(s)", lines);
    Ok(lines)
}

fn write_line<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn is_retryable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    const A: &str = "CB0000000000000000A";
    const B: &str = "CB0000000000000000B";

    fn run(uids: &[&str], input: &str) -> (String, u64) {
        let mut responder = Responder::new(uids.iter().copied());
        let mut out = Vec::new();
        let lines = serve(&mut responder, Cursor::new(input.as_bytes()), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), lines)
    }

    #[test]
    fn test_single_reply() {
        let (out, lines) = run(&[A], "CB\n");
        assert_eq!(out, format!("{A}\n"));
        assert_eq!(lines, 1);
    }

    #[test]
    fn test_silence_writes_nothing() {
        let (out, _) = run(&[A], "HS\nCBZ\n");
        assert_eq!(out, "");
    }

    #[test]
    fn test_collision_writes_empty_line() {
        let (out, _) = run(&[A, B], "CB\n");
        assert_eq!(out, "\n");
    }

    #[test]
    fn test_control_lines_are_never_answered() {
        let (out, lines) = run(&[A], &format!("SETADDR:{A}\nCB\nRESETALL\nCB\n"));
        assert_eq!(out, format!("{A}\n"));
        assert_eq!(lines, 4);
    }

    #[test]
    fn test_crlf_and_unterminated_last_line() {
        let (out, _) = run(&[A, B], "CBA\r\nCBB");
        assert_eq!(out, format!("{A}\n{B}\n"));
    }

    /// Reader that times out once before yielding its data
    struct Flaky {
        inner: Cursor<Vec<u8>>,
        timed_out: bool,
    }

    impl io::Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.timed_out {
                self.timed_out = true;
                return Err(io::Error::from(io::ErrorKind::TimedOut));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_read_timeouts_are_retried() {
        let mut responder = Responder::new([A]);
        let reader = io::BufReader::new(Flaky {
            inner: Cursor::new(b"CB\n".to_vec()),
            timed_out: false,
        });
        let mut out = Vec::new();
        serve(&mut responder, reader, &mut out).unwrap();
        assert_eq!(out, format!("{A}\n").into_bytes());
    }
}
