use crate::error::LaunchError;
use line_laser_data::{ParameterLiteral, ResolvedLaunch};
use std::path::Path;
use tracing::warn;

/// Parameters holding a serial device path.
pub const SERIAL_PORT_PARAMETERS: [&str; 2] = ["port", "uart_port"];

/// Names of the serial ports found on this machine.
pub fn available_ports() -> Result<Vec<String>, LaunchError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Returns `(node_name, port)` for every serial port parameter that names a
/// device neither listed in `available` nor present on the filesystem.
pub fn missing_serial_ports(
    resolved: &ResolvedLaunch,
    available: &[String],
) -> Vec<(String, String)> {
    let mut missing = Vec::new();
    for process in &resolved.processes {
        for key in SERIAL_PORT_PARAMETERS {
            let port = match process.parameter(key) {
                Some(ParameterLiteral::String(port)) => port,
                _ => continue,
            };
            if available.iter().any(|a| a == port) || Path::new(port).exists() {
                continue;
            }
            missing.push((process.node_name.clone(), port.clone()));
        }
    }
    missing
}

/// Logs a warning for every serial port the launched nodes will not find.
/// Opening the port remains the job of the nodes themselves.
pub fn warn_missing_ports(resolved: &ResolvedLaunch) {
    let available = match available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            warn!("Failed to enumerate serial ports: {e}");
            Vec::new()
        }
    };
    for (node_name, port) in missing_serial_ports(resolved, &available) {
        warn!(node = %node_name, port = %port, "serial port not found");
    }
}
