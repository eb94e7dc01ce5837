//! Serial port transport
//!
//! Runs the protocol over a real line: a USB-serial adapter wired to the
//! device bus, or a null-modem pair with `uidresp` on the far end.

use std::io::{self, BufRead, BufReader, Write};
use std::time::{Duration, Instant};

use serialport::{available_ports, SerialPort, SerialPortType};
use tracing::{debug, info, trace};
use uid_protocol::{Bus, BusError, Incoming};

use crate::error::ScanError;

/// Shortest read timeout handed to the port driver
const MIN_READ_SLICE: Duration = Duration::from_millis(1);

/// Line bus over a serial port
pub struct SerialBus {
    name: String,
    reader: BufReader<Box<dyn SerialPort>>,
    writer: Box<dyn SerialPort>,
    /// Bytes of a line that has not been terminated yet
    partial: Vec<u8>,
}

impl SerialBus {
    /// Open `port` at `baud_rate`
    pub fn open(port: &str, baud_rate: u32) -> Result<Self, ScanError> {
        debug!("Opening {} at {} baud", port, baud_rate);

        let open_failed = |e: serialport::Error| ScanError::OpenFailed {
            port: port.to_string(),
            reason: e.to_string(),
        };
        let reader = serialport::new(port, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(open_failed)?;
        let writer = reader.try_clone().map_err(open_failed)?;

        Ok(Self {
            name: port.to_string(),
            reader: BufReader::new(reader),
            writer,
            partial: Vec::with_capacity(32),
        })
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.partial)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        self.partial.clear();
        line
    }
}

impl Bus for SerialBus {
    fn send(&mut self, line: &str) -> Result<(), BusError> {
        trace!("{} -> {}", self.name, line);
        write_line(&mut self.writer, line).map_err(BusError::from_write)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<Incoming, BusError> {
        let deadline = Instant::now() + timeout;

        loop {
            let slice = deadline
                .saturating_duration_since(Instant::now())
                .max(MIN_READ_SLICE);
            self.reader
                .get_mut()
                .set_timeout(slice)
                .map_err(|e| BusError::Io(e.into()))?;

            match self.reader.read_until(b'\n', &mut self.partial) {
                Ok(0) => return Ok(Incoming::Closed),
                Ok(_) if self.partial.ends_with(b"\n") => {
                    let line = self.take_line();
                    trace!("{} <- {:?}", self.name, line);
                    return Ok(Incoming::Line(line));
                }
                Ok(_) => {}
                Err(e) if is_timeout(&e) => {}
                Err(e) => return Err(BusError::Io(e)),
            }

            if Instant::now() >= deadline {
                return Ok(Incoming::Timeout);
            }
        }
    }
}

fn write_line<W: Write + ?Sized>(writer: &mut W, line: &str) -> io::Result<()> {
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// A serial port that could carry the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., /dev/ttyUSB0, COM3)
    pub name: String,
    /// USB vendor and product ID, for USB adapters
    pub usb_id: Option<(u16, u16)>,
    /// USB product string
    pub product: Option<String>,
}

impl SerialPortInfo {
    fn from_serialport(name: String, port_type: &SerialPortType) -> Self {
        match port_type {
            SerialPortType::UsbPort(usb) => Self {
                name,
                usb_id: Some((usb.vid, usb.pid)),
                product: usb.product.clone(),
            },
            _ => Self {
                name,
                usb_id: None,
                product: None,
            },
        }
    }

    /// One-line description for listings
    pub fn describe(&self) -> String {
        match (self.usb_id, &self.product) {
            (Some((vid, pid)), Some(product)) => {
                format!("{} [{:04x}:{:04x}] {}", self.name, vid, pid, product)
            }
            (Some((vid, pid)), None) => format!("{} [{:04x}:{:04x}]", self.name, vid, pid),
            (None, _) => self.name.clone(),
        }
    }
}

/// Enumerate serial ports present on this machine
pub fn list_ports() -> Result<Vec<SerialPortInfo>, ScanError> {
    let ports = available_ports().map_err(|e| ScanError::EnumerationFailed(e.to_string()))?;

    let result: Vec<_> = ports
        .into_iter()
        .map(|p| SerialPortInfo::from_serialport(p.port_name, &p.port_type))
        .collect();

    info!("Found {} serial port(s)", result.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    #[test]
    fn test_port_info_from_usb() {
        let usb = SerialPortType::UsbPort(UsbPortInfo {
            vid: 0x0403,
            pid: 0x6001,
            serial_number: None,
            manufacturer: Some("FTDI".to_string()),
            product: Some("FT232R".to_string()),
        });

        let info = SerialPortInfo::from_serialport("/dev/ttyUSB0".to_string(), &usb);
        assert_eq!(info.usb_id, Some((0x0403, 0x6001)));
        assert_eq!(info.describe(), "/dev/ttyUSB0 [0403:6001] FT232R");
    }

    #[test]
    fn test_port_info_non_usb() {
        let info =
            SerialPortInfo::from_serialport("/dev/ttyS0".to_string(), &SerialPortType::Unknown);
        assert_eq!(info.usb_id, None);
        assert_eq!(info.describe(), "/dev/ttyS0");
    }
}
