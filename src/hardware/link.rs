//! Byte transport under the console protocol.
//!
//! `SerialLink` is the seam between the bridge and the device so the bridge
//! logic can be exercised against an in-memory link in tests, the same way
//! the input processor is tested against a virtual keyboard backend.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serialport::SerialPort;

/// Read timeout of the device handle; bounds reader-thread liveness checks.
pub const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// One directional endpoint of the console connection.
pub trait SerialLink: Send {
    /// Return the next complete line, `None` if no full line arrived within
    /// the read timeout. Errors other than timeouts surface as `Err`.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Write one line plus terminator.
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

/// Real serial-port link. Reader and writer sides are separate clones of
/// the same handle so the reader thread never shares state with LED writes.
pub struct PortLink {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl PortLink {
    /// Open `port_name` and split it into (reader, writer) links.
    pub fn open(port_name: &str, baud_rate: u32) -> serialport::Result<(PortLink, PortLink)> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(READ_TIMEOUT)
            .open()?;
        let writer = port.try_clone()?;
        Ok((
            PortLink {
                port,
                pending: Vec::new(),
            },
            PortLink {
                port: writer,
                pending: Vec::new(),
            },
        ))
    }

    fn take_pending_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.pending.drain(..=pos).collect();
        let line = String::from_utf8_lossy(&raw).trim().to_string();
        Some(line)
    }
}

impl SerialLink for PortLink {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        if let Some(line) = self.take_pending_line() {
            return Ok(Some(line));
        }

        let mut buf = [0u8; 256];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.pending.extend_from_slice(&buf[..n]);
                Ok(self.take_pending_line())
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.write_all(b"\n")?;
        Ok(())
    }
}

/// In-memory link for tests: lines pushed from the outside appear on
/// `read_line`, written lines are captured for inspection.
#[derive(Clone)]
pub struct LoopbackLink {
    incoming: Arc<Mutex<VecDeque<String>>>,
    outgoing: Arc<Mutex<Vec<String>>>,
    read_error: Arc<Mutex<Option<io::ErrorKind>>>,
}

impl LoopbackLink {
    pub fn new() -> Self {
        Self {
            incoming: Arc::new(Mutex::new(VecDeque::new())),
            outgoing: Arc::new(Mutex::new(Vec::new())),
            read_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue a line as if the console sent it.
    pub fn push_line(&self, line: &str) {
        self.incoming.lock().unwrap().push_back(line.to_string());
    }

    /// Lines written by the bridge so far.
    pub fn sent(&self) -> Vec<String> {
        self.outgoing.lock().unwrap().clone()
    }

    /// Make the next `read_line` fail with the given kind.
    pub fn fail_next_read(&self, kind: io::ErrorKind) {
        *self.read_error.lock().unwrap() = Some(kind);
    }
}

impl Default for LoopbackLink {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialLink for LoopbackLink {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        if let Some(kind) = self.read_error.lock().unwrap().take() {
            return Err(io::Error::new(kind, "injected read failure"));
        }
        if let Some(line) = self.incoming.lock().unwrap().pop_front() {
            return Ok(Some(line));
        }
        // Behave like a quiet port: block for the timeout, report no line.
        std::thread::sleep(Duration::from_millis(1));
        Ok(None)
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.outgoing.lock().unwrap().push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_round_trip() {
        let link = LoopbackLink::new();
        link.push_line("Button 1 Pressed");

        let mut reader = link.clone();
        assert_eq!(
            reader.read_line().unwrap(),
            Some("Button 1 Pressed".to_string())
        );
        assert_eq!(reader.read_line().unwrap(), None);

        let mut writer = link.clone();
        writer.write_line("LED1 ON").unwrap();
        assert_eq!(link.sent(), vec!["LED1 ON".to_string()]);
    }

    #[test]
    fn test_loopback_injected_failure() {
        let link = LoopbackLink::new();
        link.fail_next_read(io::ErrorKind::BrokenPipe);

        let mut reader = link.clone();
        assert_eq!(
            reader.read_line().unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
        // One-shot: the next read is quiet again.
        assert_eq!(reader.read_line().unwrap(), None);
    }
}
