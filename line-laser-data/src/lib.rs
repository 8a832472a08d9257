pub mod argument;
pub mod device_version;
pub mod parameter;
pub mod process;
pub mod resolved;

pub use argument::{ArgumentKind, ConfigurationArgument};
pub use device_version::DeviceVersion;
pub use parameter::{ParameterLiteral, ParameterValue};
pub use process::{LaunchDescription, OutputMode, ProcessSpec};
pub use resolved::{ArgumentSource, ResolvedArgument, ResolvedLaunch, ResolvedProcess};
