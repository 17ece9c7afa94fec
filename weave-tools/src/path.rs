//! Path resolution shared by the file/directory tools (spec.md §4.4).
//!
//! Distinguishes *system-absolute* paths (start with `/`, first segment is
//! not a known project directory name) from *project-relative-absolute*
//! paths (start with `/` but the first segment matches a configured
//! project directory name, e.g. `src`) which get rebased onto the
//! session's working directory. Per spec.md §9 Open Questions, the
//! project-directory-name list is configurable, not a hard-coded contract.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

/// Default project directory names recognized when rebasing an
/// absolute-looking path onto the working directory. A starting point,
/// not a contract — override via [`PathResolverConfig::project_dirs`].
pub fn default_project_dirs() -> Vec<String> {
    [
        "src", "lib", "components", "test", "tests", "package.json", "Cargo.toml",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Clone, Debug)]
pub struct PathResolverConfig {
    pub project_dirs: Vec<String>,
    /// When true, a resolved path that lexically escapes the working
    /// directory (via `..` traversal) is rejected.
    pub strict: bool,
}

impl Default for PathResolverConfig {
    fn default() -> Self {
        Self {
            project_dirs: default_project_dirs(),
            strict: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path escapes the working directory: {0}")]
    Escapes(String),
    #[error("empty path")]
    Empty,
}

/// Lexically normalizes a path: collapses `.` components and resolves
/// `..` against what's accumulated so far (never climbing past the root
/// of `base`). Does not touch the filesystem.
fn normalize(base: &Path, input: &Path) -> PathBuf {
    let mut out = base.to_path_buf();
    for component in input.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(seg) => out.push(seg),
            Component::RootDir | Component::Prefix(_) => {
                out = PathBuf::from(component.as_os_str());
            }
        }
    }
    out
}

/// Resolves `input` (as written by the LM) against `working_dir`.
///
/// - Relative paths (`"x"`, `"./x"`) are joined onto `working_dir` and
///   normalized; `config.strict` rejects traversal that escapes it.
/// - Absolute paths whose first segment matches `config.project_dirs`
///   are rebased onto `working_dir` (project-relative-absolute).
/// - All other absolute paths are system-absolute and returned as-is.
pub fn resolve_path(working_dir: &Path, input: &str, config: &PathResolverConfig) -> Result<PathBuf, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }
    let raw = Path::new(input);

    if raw.is_absolute() {
        let first_segment = raw
            .components()
            .find_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().to_string()),
                _ => None,
            });
        let is_project_relative = first_segment
            .as_deref()
            .map(|seg| config.project_dirs.iter().any(|p| p == seg))
            .unwrap_or(false);

        if is_project_relative {
            let stripped = raw.strip_prefix("/").unwrap_or(raw);
            let resolved = normalize(working_dir, stripped);
            return check_escape(working_dir, resolved, config.strict);
        }
        // system-absolute: used as written, no rebase, no escape check.
        return Ok(raw.to_path_buf());
    }

    let resolved = normalize(working_dir, raw);
    check_escape(working_dir, resolved, config.strict)
}

fn check_escape(working_dir: &Path, resolved: PathBuf, strict: bool) -> Result<PathBuf, PathError> {
    if strict && !resolved.starts_with(working_dir) {
        return Err(PathError::Escapes(resolved.display().to_string()));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_absolute_path_resolves_unchanged() {
        let cfg = PathResolverConfig::default();
        let resolved = resolve_path(Path::new("/workdir"), "/etc/passwd", &cfg).unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn project_relative_absolute_path_is_rebased() {
        let cfg = PathResolverConfig::default();
        let resolved = resolve_path(Path::new("/workdir"), "/src/main.rs", &cfg).unwrap();
        assert_eq!(resolved, PathBuf::from("/workdir/src/main.rs"));
    }

    #[test]
    fn relative_dot_slash_and_bare_match() {
        let cfg = PathResolverConfig::default();
        let a = resolve_path(Path::new("/workdir"), "./x", &cfg).unwrap();
        let b = resolve_path(Path::new("/workdir"), "x", &cfg).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, PathBuf::from("/workdir/x"));
    }

    #[test]
    fn strict_mode_rejects_traversal_escape() {
        let cfg = PathResolverConfig::default();
        let err = resolve_path(Path::new("/workdir"), "../../etc/passwd", &cfg).unwrap_err();
        assert!(matches!(err, PathError::Escapes(_)));
    }

    #[test]
    fn non_strict_mode_allows_traversal_escape() {
        let cfg = PathResolverConfig {
            strict: false,
            ..PathResolverConfig::default()
        };
        let resolved = resolve_path(Path::new("/workdir"), "../../etc/passwd", &cfg).unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn empty_path_is_rejected() {
        let cfg = PathResolverConfig::default();
        assert_eq!(resolve_path(Path::new("/workdir"), "", &cfg).unwrap_err(), PathError::Empty);
    }

    #[test]
    fn custom_project_dirs_list_is_honored() {
        let cfg = PathResolverConfig {
            project_dirs: vec!["app".to_string()],
            ..PathResolverConfig::default()
        };
        let resolved = resolve_path(Path::new("/workdir"), "/app/main.rs", &cfg).unwrap();
        assert_eq!(resolved, PathBuf::from("/workdir/app/main.rs"));
        // "src" is no longer special with this custom list.
        let resolved = resolve_path(Path::new("/workdir"), "/src/main.rs", &cfg).unwrap();
        assert_eq!(resolved, PathBuf::from("/src/main.rs"));
    }
}
