use crate::builder::LaunchDescriptionBuilder;
use crate::error::LaunchError;
use line_laser_data::{
    ArgumentKind, ConfigurationArgument, DeviceVersion, LaunchDescription, OutputMode,
    ParameterValue,
};

pub const PACKAGE: &str = "line_laser_ros";
pub const PUBLISHER_EXECUTABLE: &str = "n301n_serial_publisher";
pub const PUBLISHER_NODE: &str = "line_laser";
pub const PROCESSOR_EXECUTABLE: &str = "lidar_processor";
pub const PROCESSOR_NODE: &str = "lidar_processor";

pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUD_RATE: &str = "115200";
pub const DEFAULT_FRAME_ID: &str = "base_laser_link";
pub const DEFAULT_VERSION_NUM: &str = "1";

// Fixed UART link of the processor
pub const PROCESSOR_UART_PORT: &str = "/dev/ttyUSB1";
pub const PROCESSOR_UART_BAUD_RATE: i64 = 115200;

/// Launch of the line-laser serial publisher and the LiDAR processor.
pub fn line_laser_description() -> Result<LaunchDescription, LaunchError> {
    let mut builder = LaunchDescriptionBuilder::new();

    let port = builder.declare("port", DEFAULT_PORT, "Serial port for the LiDAR device")?;
    let baud_rate = builder.declare_argument(
        ConfigurationArgument::new(
            "baud_rate",
            DEFAULT_BAUD_RATE,
            "Baud rate for the LiDAR serial communication",
        )
        .with_kind(ArgumentKind::Integer),
    )?;
    let frame_id = builder.declare(
        "frame_id",
        DEFAULT_FRAME_ID,
        "Frame ID for the LaserScan messages",
    )?;
    let version_num = builder.declare_argument(
        ConfigurationArgument::new(
            "version_num",
            DEFAULT_VERSION_NUM,
            "Version number: 0 for n301 TOF, 1 for line laser 1 deg, 2 for line laser 0.5 deg",
        )
        .with_kind(ArgumentKind::Integer)
        .with_choices(DeviceVersion::ALL.iter().map(|v| v.number().to_string())),
    )?;

    builder.build_process_spec(
        PACKAGE,
        PUBLISHER_EXECUTABLE,
        PUBLISHER_NODE,
        OutputMode::Screen,
        [port, baud_rate, frame_id, version_num]
            .into_iter()
            .map(|arg| (arg.name.clone(), ParameterValue::reference(arg.name)))
            .collect(),
    )?;

    builder.build_process_spec(
        PACKAGE,
        PROCESSOR_EXECUTABLE,
        PROCESSOR_NODE,
        OutputMode::Screen,
        vec![
            (
                "uart_port".to_string(),
                ParameterValue::literal(PROCESSOR_UART_PORT),
            ),
            (
                "uart_baud_rate".to_string(),
                ParameterValue::literal(PROCESSOR_UART_BAUD_RATE),
            ),
        ],
    )?;

    Ok(builder.build())
}
