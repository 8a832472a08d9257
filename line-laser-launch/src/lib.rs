//! Launch description of the line-laser LiDAR stack.
//!
//! The description declares the arguments of the launch and the two
//! processes it starts: the `n301n_serial_publisher` driver and the
//! `lidar_processor`. [`resolve`] fixes the argument values and [`launch`]
//! starts the processes.

mod builder;
mod config;
mod description;
mod error;
mod executable;
mod ports;
mod resolve;
mod supervisor;
mod time;

pub use crate::builder::LaunchDescriptionBuilder;
pub use crate::config::{LaunchOverrides, LaunchSettings, PREFIX_PATH_VAR};
pub use crate::description::{
    line_laser_description, PACKAGE, PROCESSOR_NODE, PUBLISHER_NODE,
};
pub use crate::error::LaunchError;
pub use crate::executable::locate_executable;
pub use crate::ports::{available_ports, missing_serial_ports, warn_missing_ports};
pub use crate::resolve::resolve;
pub use crate::supervisor::{launch, ProcessExit, Supervisor};
pub use line_laser_data;
