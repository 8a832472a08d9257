use crate::parameter::ParameterLiteral;
use crate::process::OutputMode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where a resolved argument value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ArgumentSource {
    Default,
    Override,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedArgument {
    pub name: String,
    pub value: String,
    pub source: ArgumentSource,
}

/// Process description with every argument reference substituted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedProcess {
    pub package: String,
    pub executable: String,
    pub node_name: String,
    pub output_mode: OutputMode,
    pub parameters: Vec<(String, ParameterLiteral)>,
}

impl ResolvedProcess {
    pub fn parameter(&self, key: &str) -> Option<&ParameterLiteral> {
        self.parameters
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Command line arguments passing the node name and parameters to the
    /// executable.
    pub fn ros_args(&self) -> Vec<String> {
        let mut args = vec![
            "--ros-args".to_string(),
            "-r".to_string(),
            format!("__node:={}", self.node_name),
        ];
        for (key, value) in &self.parameters {
            args.push("-p".to_string());
            args.push(format!("{}:={}", key, value));
        }
        args
    }
}

/// Launch with all values fixed, ready to be started.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedLaunch {
    pub arguments: Vec<ResolvedArgument>,
    pub processes: Vec<ResolvedProcess>,
}

impl ResolvedLaunch {
    pub fn argument(&self, name: &str) -> Option<&ResolvedArgument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    pub fn process(&self, node_name: &str) -> Option<&ResolvedProcess> {
        self.processes.iter().find(|p| p.node_name == node_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ros_args() {
        let process = ResolvedProcess {
            package: "line_laser_ros".to_string(),
            executable: "lidar_processor".to_string(),
            node_name: "lidar_processor".to_string(),
            output_mode: OutputMode::Screen,
            parameters: vec![
                ("uart_port".to_string(), ParameterLiteral::from("/dev/ttyUSB1")),
                ("uart_baud_rate".to_string(), ParameterLiteral::from(115200)),
            ],
        };
        assert_eq!(
            process.ros_args(),
            vec![
                "--ros-args",
                "-r",
                "__node:=lidar_processor",
                "-p",
                "uart_port:=/dev/ttyUSB1",
                "-p",
                "uart_baud_rate:=115200",
            ]
        );
    }

    #[test]
    fn test_ros_args_without_parameters() {
        let process = ResolvedProcess {
            package: "pkg".to_string(),
            executable: "exe".to_string(),
            node_name: "node".to_string(),
            output_mode: OutputMode::Log,
            parameters: Vec::new(),
        };
        assert_eq!(process.ros_args(), vec!["--ros-args", "-r", "__node:=node"]);
    }
}
