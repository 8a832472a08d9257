use crate::error::LaunchError;
use std::path::{Path, PathBuf};

/// Returns the first `<prefix>/lib/<package>/<executable>` that exists.
pub fn locate_executable(
    prefixes: &[PathBuf],
    package: &str,
    executable: &str,
) -> Result<PathBuf, LaunchError> {
    prefixes
        .iter()
        .map(|prefix| executable_path(prefix, package, executable))
        .find(|path| path.is_file())
        .ok_or_else(|| LaunchError::ExecutableNotFound(package.to_string(), executable.to_string()))
}

fn executable_path(prefix: &Path, package: &str, executable: &str) -> PathBuf {
    prefix.join("lib").join(package).join(executable)
}
