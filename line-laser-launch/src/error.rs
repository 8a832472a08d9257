use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Names of arguments, nodes and parameters must not be empty.")]
    EmptyName,
    #[error("Argument \"{0}\" is already declared.")]
    DuplicateArgument(String),
    #[error("Parameter \"{1}\" is set twice on node \"{0}\".")]
    DuplicateParameter(String, String),
    #[error("Node name \"{0}\" is used by more than one process.")]
    DuplicateNodeName(String),
    #[error("Parameter \"{1}\" of node \"{0}\" refers to undeclared argument \"{2}\".")]
    UnresolvedReference(String, String, String),
    #[error("Default value \"{1}\" of argument \"{0}\" is invalid: {2}.")]
    MalformedDefault(String, String, String),
    #[error("Argument \"{0}\" is not declared by this launch.")]
    UnknownArgument(String),
    #[error("Value \"{1}\" is not valid for argument \"{0}\": {2}.")]
    InvalidValue(String, String, String),
    #[error("Override \"{0}\" must be written as <name>:=<value>.")]
    InvalidOverride(String),
    #[error("Failed to read overrides from {0}: {1}")]
    OverridesFile(PathBuf, String),
    #[error("Executable \"{1}\" of package \"{0}\" was not found under any install prefix.")]
    ExecutableNotFound(String, String),
    #[error("Failed to start node \"{0}\": {1}")]
    SpawnError(String, io::Error),
    #[error(transparent)]
    IoError(#[from] io::Error),
    #[error(transparent)]
    SerialError(#[from] serialport::Error),
    #[error("Failed to install the signal handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),
}
