//! Text logging over a serial transmitter.
//!
//! Use it with `write!`/`writeln!`. Output is best-effort: callers ignore the
//! `fmt::Result`. A transmitter error is reported as `fmt::Error`.

use core::fmt;

use embedded_io::Write;

pub struct DebugLink<S> {
    tx: S,
}

impl<S: Write> DebugLink<S> {
    pub fn new(tx: S) -> Self {
        DebugLink { tx }
    }
}

impl<S: Write> fmt::Write for DebugLink<S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx.write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimBus, Trace};
    use core::fmt::Write as _;

    #[test]
    fn formats_verbatim() {
        let trace = Trace::default();
        let mut link = DebugLink::new(SimBus(trace.clone()));
        writeln!(link, "Counter: {}", 3).unwrap();
        assert_eq!(trace.bytes(), b"Counter: 3\n");
    }

    /// Accepts a few bytes, then fails.
    struct Flaky {
        room: usize,
        sent: Vec<u8>,
    }

    impl embedded_io::ErrorType for Flaky {
        type Error = embedded_io::ErrorKind;
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.room == 0 {
                return Err(embedded_io::ErrorKind::Other);
            }
            let n = buf.len().min(self.room);
            self.sent.extend_from_slice(&buf[..n]);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn transmit_failure_is_a_format_error() {
        let mut link = DebugLink::new(Flaky {
            room: 4,
            sent: vec![],
        });
        assert!(write!(link, "Counter: {}", 3).is_err());
        assert_eq!(link.tx.sent, b"Coun");
    }
}
