use crate::error::LaunchError;
use line_laser_data::{
    ArgumentKind, ConfigurationArgument, LaunchDescription, OutputMode, ParameterValue,
    ProcessSpec,
};
use std::collections::HashSet;

/// Collects arguments and processes of one launch.
///
/// Every check runs when an item is added, so a built description never
/// holds duplicate names or references to undeclared arguments.
#[derive(Debug, Default)]
pub struct LaunchDescriptionBuilder {
    arguments: Vec<ConfigurationArgument>,
    processes: Vec<ProcessSpec>,
}

impl LaunchDescriptionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a string argument.
    pub fn declare(
        &mut self,
        name: &str,
        default_value: &str,
        description: &str,
    ) -> Result<ConfigurationArgument, LaunchError> {
        self.declare_argument(ConfigurationArgument::new(name, default_value, description))
    }

    /// Declares an argument with its kind and choices.
    pub fn declare_argument(
        &mut self,
        argument: ConfigurationArgument,
    ) -> Result<ConfigurationArgument, LaunchError> {
        if argument.name.is_empty() {
            return Err(LaunchError::EmptyName);
        }
        if self.arguments.iter().any(|a| a.name == argument.name) {
            return Err(LaunchError::DuplicateArgument(argument.name));
        }
        if let Err(reason) = check_value(&argument, &argument.default_value) {
            return Err(LaunchError::MalformedDefault(
                argument.name,
                argument.default_value,
                reason,
            ));
        }
        self.arguments.push(argument.clone());
        Ok(argument)
    }

    /// Adds a process to the launch.
    pub fn build_process_spec(
        &mut self,
        package: &str,
        executable: &str,
        node_name: &str,
        output_mode: OutputMode,
        parameters: Vec<(String, ParameterValue)>,
    ) -> Result<ProcessSpec, LaunchError> {
        if package.is_empty() || executable.is_empty() || node_name.is_empty() {
            return Err(LaunchError::EmptyName);
        }
        if self.processes.iter().any(|p| p.node_name == node_name) {
            return Err(LaunchError::DuplicateNodeName(node_name.to_string()));
        }

        let mut keys = HashSet::new();
        for (key, value) in &parameters {
            if key.is_empty() {
                return Err(LaunchError::EmptyName);
            }
            if !keys.insert(key.as_str()) {
                return Err(LaunchError::DuplicateParameter(
                    node_name.to_string(),
                    key.clone(),
                ));
            }
            if let Some(argument_name) = value.referenced_argument() {
                if !self.arguments.iter().any(|a| a.name == argument_name) {
                    return Err(LaunchError::UnresolvedReference(
                        node_name.to_string(),
                        key.clone(),
                        argument_name.to_string(),
                    ));
                }
            }
        }

        let spec = ProcessSpec {
            package: package.to_string(),
            executable: executable.to_string(),
            node_name: node_name.to_string(),
            output_mode,
            parameters,
        };
        self.processes.push(spec.clone());
        Ok(spec)
    }

    pub fn build(self) -> LaunchDescription {
        LaunchDescription {
            arguments: self.arguments,
            processes: self.processes,
        }
    }
}

/// Checks `value` against the kind and choices of `argument`. The error is a
/// human readable reason.
pub(crate) fn check_value(argument: &ConfigurationArgument, value: &str) -> Result<(), String> {
    if argument.kind == ArgumentKind::Integer && value.trim().parse::<i64>().is_err() {
        return Err("expected an integer".to_string());
    }
    if !argument.choices.is_empty() && !argument.choices.iter().any(|c| c == value) {
        return Err(format!("expected one of {}", argument.choices.join(", ")));
    }
    Ok(())
}
