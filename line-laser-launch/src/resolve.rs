use crate::builder::check_value;
use crate::config::LaunchOverrides;
use crate::error::LaunchError;
use line_laser_data::{
    ArgumentSource, LaunchDescription, ParameterLiteral, ParameterValue, ResolvedArgument,
    ResolvedLaunch, ResolvedProcess,
};
use std::collections::HashMap;

/// Fixes the value of every argument and substitutes argument references in
/// all processes.
///
/// An override is used verbatim. Arguments without an override take their
/// default value.
pub fn resolve(
    description: &LaunchDescription,
    overrides: &LaunchOverrides,
) -> Result<ResolvedLaunch, LaunchError> {
    for (name, _) in overrides.iter() {
        if description.argument(name).is_none() {
            return Err(LaunchError::UnknownArgument(name.to_string()));
        }
    }

    let mut arguments = Vec::with_capacity(description.arguments.len());
    for argument in &description.arguments {
        let resolved = match overrides.get(&argument.name) {
            Some(value) => {
                if let Err(reason) = check_value(argument, value) {
                    return Err(LaunchError::InvalidValue(
                        argument.name.clone(),
                        value.to_string(),
                        reason,
                    ));
                }
                ResolvedArgument {
                    name: argument.name.clone(),
                    value: value.to_string(),
                    source: ArgumentSource::Override,
                }
            }
            None => ResolvedArgument {
                name: argument.name.clone(),
                value: argument.default_value.clone(),
                source: ArgumentSource::Default,
            },
        };
        arguments.push(resolved);
    }

    let values: HashMap<&str, &str> = arguments
        .iter()
        .map(|a| (a.name.as_str(), a.value.as_str()))
        .collect();

    let mut processes = Vec::with_capacity(description.processes.len());
    for spec in &description.processes {
        let mut parameters = Vec::with_capacity(spec.parameters.len());
        for (key, value) in &spec.parameters {
            let literal = match value {
                ParameterValue::Literal(literal) => literal.clone(),
                ParameterValue::Reference(name) => match values.get(name.as_str()) {
                    Some(value) => ParameterLiteral::String(value.to_string()),
                    None => {
                        return Err(LaunchError::UnresolvedReference(
                            spec.node_name.clone(),
                            key.clone(),
                            name.clone(),
                        ))
                    }
                },
            };
            parameters.push((key.clone(), literal));
        }
        processes.push(ResolvedProcess {
            package: spec.package.clone(),
            executable: spec.executable.clone(),
            node_name: spec.node_name.clone(),
            output_mode: spec.output_mode,
            parameters,
        });
    }

    Ok(ResolvedLaunch {
        arguments,
        processes,
    })
}
