//! Locating the ffprobe executable.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Name of the prober executable on `PATH`.
pub const FFPROBE: &str = "ffprobe";

/// Availability report for an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the tool's `-version` output.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Run `<program> -version` and report what it says.
///
/// `program` is a bare name looked up on `PATH` or an explicit path.
pub fn check_tool(program: &Path) -> ToolInfo {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());

    let version = Command::new(program)
        .arg("-version")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| {
            String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(str::to_string)
        });

    let path = version.as_ref().and_then(|_| which::which(program).ok());

    ToolInfo {
        name,
        available: version.is_some(),
        version,
        path,
    }
}

/// Check every tool the server shells out to.
pub fn check_tools(ffprobe: Option<&Path>) -> Vec<ToolInfo> {
    vec![check_tool(ffprobe.unwrap_or(Path::new(FFPROBE)))]
}

/// Resolve the ffprobe to run: the configured path when it exists,
/// otherwise the one on `PATH`.
pub fn locate_ffprobe(configured: Option<&Path>) -> Result<PathBuf> {
    match configured {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        _ => which::which(FFPROBE).map_err(|_| Error::tool_not_found(FFPROBE)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_is_unavailable() {
        let info = check_tool(Path::new("vidstream_missing_tool_12345"));
        assert_eq!(info.name, "vidstream_missing_tool_12345");
        assert!(!info.available);
        assert!(info.version.is_none());
        assert!(info.path.is_none());
    }

    #[test]
    fn test_check_tools_reports_ffprobe() {
        let tools = check_tools(Some(Path::new("/no/such/bin/ffprobe")));
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "ffprobe");
        assert!(!tools[0].available);
    }

    #[test]
    fn test_locate_prefers_existing_configured_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(locate_ffprobe(Some(file.path())).unwrap(), file.path());
    }
}
