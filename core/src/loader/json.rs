//! Reading problem files from disk

use super::{GeometryProblem, LoadError, LoadResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Parse one problem from JSON text
pub fn parse_problem(text: &str) -> LoadResult<GeometryProblem> {
    serde_json::from_str(text).map_err(|e| LoadError::ParseError(e.to_string()))
}

/// Load a single problem from a JSON file
pub fn load_problem<P: AsRef<Path>>(path: P) -> LoadResult<GeometryProblem> {
    let path = path.as_ref();

    let contents = fs::read_to_string(path)
        .map_err(|e| LoadError::FileNotFound(format!("{}: {}", path.display(), e)))?;

    parse_problem(&contents).map_err(|e| match e {
        LoadError::ParseError(msg) => LoadError::ParseError(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Load every `.json` problem in a directory, sorted by file name.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_problems<P: AsRef<Path>>(dir: P) -> LoadResult<Vec<(PathBuf, GeometryProblem)>> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(LoadError::FileNotFound(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| LoadError::FileNotFound(format!("{}: {}", dir.display(), e)))?
    {
        let entry = entry.map_err(|e| LoadError::FileNotFound(e.to_string()))?;
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut problems = Vec::new();
    for path in paths {
        match load_problem(&path) {
            Ok(problem) => problems.push((path, problem)),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping problem file"),
        }
    }
    Ok(problems)
}
