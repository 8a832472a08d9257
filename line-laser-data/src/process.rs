use crate::argument::ConfigurationArgument;
use crate::parameter::ParameterValue;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the output of a launched process goes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OutputMode {
    /// Printed to the terminal of the launcher
    #[default]
    Screen,
    /// Written to a per-node log file
    Log,
    /// Printed to the terminal and written to the log file
    Both,
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OutputMode::Screen => write!(f, "screen"),
            OutputMode::Log => write!(f, "log"),
            OutputMode::Both => write!(f, "both"),
        }
    }
}

/// Description of one process to start.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProcessSpec {
    pub package: String,
    pub executable: String,
    pub node_name: String,
    pub output_mode: OutputMode,
    /// Parameters in declaration order.
    pub parameters: Vec<(String, ParameterValue)>,
}

impl ProcessSpec {
    pub fn parameter(&self, key: &str) -> Option<&ParameterValue> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }
}

/// Arguments and processes of one launch.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LaunchDescription {
    pub arguments: Vec<ConfigurationArgument>,
    pub processes: Vec<ProcessSpec>,
}

impl LaunchDescription {
    pub fn argument(&self, name: &str) -> Option<&ConfigurationArgument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn process(&self, node_name: &str) -> Option<&ProcessSpec> {
        self.processes.iter().find(|p| p.node_name == node_name)
    }
}
