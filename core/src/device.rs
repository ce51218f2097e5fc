//! Device connection
//!
//! [`DeviceLink`] is the seam between the acquisition loop and the serial
//! controller. Dropping a link closes it; the loop owns at most one link at
//! a time, so each connection is closed exactly once.

use crate::config::DeviceConfig;
use crate::error::{Error, ParseError, Result};
use serialport::SerialPort;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// A line-oriented, bidirectional device connection
pub trait DeviceLink {
    /// Human-readable endpoint name, e.g. the port path
    fn name(&self) -> &str;

    /// Next complete line without its terminator
    ///
    /// Returns `Ok(None)` when the read timeout passes without a full line.
    /// A line longer than the link accepts is dropped and reported as
    /// [`Error::Line`].
    fn read_line(&mut self) -> Result<Option<Vec<u8>>>;

    /// Send `line` followed by a newline
    fn write_line(&mut self, line: &str) -> Result<()>;
}

/// Opens device links on demand
pub trait DeviceConnector {
    fn connect(&self) -> Result<Box<dyn DeviceLink>>;

    /// Where the connector points, for operator messages
    fn describe(&self) -> String;
}

/// Read cap per line, terminator included
pub const MAX_LINE_BYTES: usize = 1024;

/// Line reader over any byte stream
///
/// After a read error or end of stream the link waits `idle_pause` before
/// returning, so a dead stream cannot spin the acquisition loop.
pub struct LineDevice<S> {
    name: String,
    reader: BufReader<S>,
    pending: Vec<u8>,
    idle_pause: Duration,
}

/// Serial port link
pub type SerialDevice = LineDevice<Box<dyn SerialPort>>;

impl SerialDevice {
    /// Open `config.port` and wait for the controller to settle
    pub fn open(config: &DeviceConfig) -> Result<Self> {
        let port = serialport::new(config.port.as_str(), config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .map_err(|e| Error::DeviceOpen {
                port: config.port.clone(),
                reason: e.to_string(),
            })?;

        // Opening the port resets most boards; give them time to boot
        thread::sleep(config.settle_delay());
        info!("Connected to {} at {} baud", config.port, config.baud_rate);

        Ok(LineDevice::new(config.port.clone(), port, config.read_timeout()))
    }
}

impl<S: Read + Write> LineDevice<S> {
    pub fn new(name: impl Into<String>, stream: S, idle_pause: Duration) -> Self {
        Self {
            name: name.into(),
            reader: BufReader::new(stream),
            pending: Vec::new(),
            idle_pause,
        }
    }

    fn idle(&self) {
        thread::sleep(self.idle_pause);
    }
}

impl<S: Read + Write> DeviceLink for LineDevice<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(line) = take_line(&mut self.pending) {
            return Ok(Some(line));
        }

        // pending is always shorter than the cap here, so room is at least 1
        let room = (MAX_LINE_BYTES - self.pending.len()) as u64;
        let read = (&mut self.reader)
            .take(room)
            .read_until(b'\n', &mut self.pending);
        match read {
            Ok(0) => {
                debug!("End of stream on {}", self.name);
                self.idle();
                return Ok(None);
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                self.idle();
                return Err(Error::Device(e));
            }
        }

        if let Some(line) = take_line(&mut self.pending) {
            return Ok(Some(line));
        }
        if self.pending.len() >= MAX_LINE_BYTES {
            self.pending.clear();
            return Err(Error::Line(ParseError::TooLong {
                limit: MAX_LINE_BYTES,
            }));
        }
        Ok(None)
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(line.as_bytes()).map_err(Error::Device)?;
        stream.write_all(b"\n").map_err(Error::Device)?;
        stream.flush().map_err(Error::Device)
    }
}

impl<S> Drop for LineDevice<S> {
    fn drop(&mut self) {
        debug!("Closing device link {}", self.name);
    }
}

/// Take one newline-terminated line out of `buffer`, leaving the rest
///
/// Partial data stays buffered until its newline arrives.
fn take_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let end = buffer.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=end).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(line)
}

/// Connects to the configured serial port
pub struct SerialConnector {
    config: DeviceConfig,
}

impl SerialConnector {
    pub fn new(config: DeviceConfig) -> Self {
        Self { config }
    }
}

impl DeviceConnector for SerialConnector {
    fn connect(&self) -> Result<Box<dyn DeviceLink>> {
        Ok(Box::new(SerialDevice::open(&self.config)?))
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.config.port, self.config.baud_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Instant;

    const PAUSE: Duration = Duration::from_millis(30);

    fn memory_device(bytes: &[u8]) -> LineDevice<Cursor<Vec<u8>>> {
        LineDevice::new("memory", Cursor::new(bytes.to_vec()), PAUSE)
    }

    /// A stream whose every read fails, like an unplugged adapter
    struct Unplugged;

    impl Read for Unplugged {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "device removed"))
        }
    }

    impl Write for Unplugged {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_lines_then_waits_at_end_of_stream() {
        let mut device = memory_device(b"550,28,72\r\nSTATUS:ready\n");
        assert_eq!(device.read_line().unwrap(), Some(b"550,28,72".to_vec()));
        assert_eq!(device.read_line().unwrap(), Some(b"STATUS:ready".to_vec()));

        let start = Instant::now();
        assert_eq!(device.read_line().unwrap(), None);
        assert!(start.elapsed() >= PAUSE);
    }

    #[test]
    fn test_read_error_waits_before_returning() {
        let mut device = LineDevice::new("unplugged", Unplugged, PAUSE);

        let start = Instant::now();
        for _ in 0..3 {
            assert!(matches!(device.read_line(), Err(Error::Device(_))));
        }
        assert!(start.elapsed() >= PAUSE * 3);
    }

    #[test]
    fn test_overlong_line_is_dropped_and_reading_resumes() {
        let mut bytes = vec![b'x'; MAX_LINE_BYTES + 476];
        bytes.extend_from_slice(b"\n120,30,40\n");
        let mut device = memory_device(&bytes);

        match device.read_line() {
            Err(Error::Line(ParseError::TooLong { limit })) => assert_eq!(limit, MAX_LINE_BYTES),
            other => panic!("unexpected result: {:?}", other),
        }
        // The tail of the oversized line surfaces as its own (malformed) line
        assert_eq!(device.read_line().unwrap(), Some(vec![b'x'; 476]));
        assert_eq!(device.read_line().unwrap(), Some(b"120,30,40".to_vec()));
    }

    #[test]
    fn test_write_line_appends_newline() {
        let mut device = memory_device(b"");
        device.write_line("MOTOR_ON").unwrap();
        assert_eq!(device.reader.get_ref().get_ref(), &b"MOTOR_ON\n".to_vec());
    }

    #[test]
    fn test_take_line_keeps_partial_tail() {
        let mut buffer = b"550,28,72\r\n12,3".to_vec();
        assert_eq!(take_line(&mut buffer), Some(b"550,28,72".to_vec()));
        assert_eq!(buffer, b"12,3".to_vec());
        assert_eq!(take_line(&mut buffer), None);

        buffer.extend_from_slice(b",4\n");
        assert_eq!(take_line(&mut buffer), Some(b"12,3,4".to_vec()));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_open_missing_port_reports_port() {
        let config = DeviceConfig {
            port: "/dev/pumpwise-does-not-exist".to_string(),
            settle_delay_ms: 0,
            ..Default::default()
        };
        match SerialDevice::open(&config) {
            Err(Error::DeviceOpen { port, .. }) => assert_eq!(port, config.port),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("opened a port that does not exist"),
        }
    }
}
