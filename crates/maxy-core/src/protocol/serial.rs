//! Serial port handling
//!
//! Opens and configures the serial link the module chain hangs off.

use serialport::{SerialPort, SerialPortInfo, SerialPortType};
use std::time::Duration;

use super::{ConnectionConfig, ProtocolError};

/// A serial port the bus adapter could be plugged into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM7")
    pub name: String,

    /// USB product name, for USB adapters
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let product = match info.port_type {
            SerialPortType::UsbPort(usb_info) => usb_info.product,
            _ => None,
        };

        Self {
            name: info.port_name,
            product,
        }
    }
}

/// Serial ports reported by the OS, sorted by name
pub fn list_ports() -> Result<Vec<PortInfo>, ProtocolError> {
    let mut ports: Vec<PortInfo> = serialport::available_ports()
        .map_err(map_serial_error)?
        .into_iter()
        .map(PortInfo::from)
        .collect();
    ports.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(ports)
}

/// Open and configure the port described by `config`
pub fn open_port(config: &ConnectionConfig) -> Result<Box<dyn SerialPort>, ProtocolError> {
    tracing::debug!(
        port = %config.port_name,
        baud = config.baud_rate,
        timeout_ms = config.timeout_ms,
        "opening serial port"
    );

    let mut port = serialport::new(config.port_name.as_str(), config.baud_rate)
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()
        .map_err(map_serial_error)?;

    configure_port(port.as_mut())?;
    Ok(port)
}

/// Standard 8N1, no flow control
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(map_serial_error)?;
    port.set_parity(serialport::Parity::None)
        .map_err(map_serial_error)?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(map_serial_error)?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(map_serial_error)?;
    Ok(())
}

fn map_serial_error(e: serialport::Error) -> ProtocolError {
    match e.kind() {
        serialport::ErrorKind::Io(std::io::ErrorKind::TimedOut) => ProtocolError::Timeout,
        _ => ProtocolError::SerialError(e.to_string()),
    }
}
