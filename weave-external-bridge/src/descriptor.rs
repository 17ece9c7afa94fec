//! Configuration shape for one external tool server (spec.md §3
//! "External-tool server descriptor").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Common short package names mapped onto their canonical npm package,
/// so configuration can say `"fetch"` instead of the full package path.
fn canonical_package(short_name: &str) -> &str {
    match short_name {
        "fetch" => "@modelcontextprotocol/server-fetch",
        "filesystem" => "@modelcontextprotocol/server-filesystem",
        "git" => "@modelcontextprotocol/server-git",
        other => other,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnKind {
    PackageRunner,
    Direct,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerDescriptor {
    pub id: String,
    pub name: String,
    pub kind: SpawnKind,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default = "default_true")]
    pub auto_start: bool,
    #[serde(default = "default_true")]
    pub auto_restart: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("server id must not be empty")]
    EmptyId,
    #[error("server name must not be empty")]
    EmptyName,
    #[error("package-runner server '{0}' requires a non-empty command naming the package")]
    MissingPackageCommand(String),
    #[error("direct server '{0}' requires a non-empty command")]
    MissingDirectCommand(String),
    #[error("server '{0}' timeout must be positive")]
    NonPositiveTimeout(String),
}

impl ServerDescriptor {
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.id.is_empty() {
            return Err(DescriptorError::EmptyId);
        }
        if self.name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        match self.kind {
            SpawnKind::PackageRunner if self.command.is_empty() => {
                return Err(DescriptorError::MissingPackageCommand(self.id.clone()));
            }
            SpawnKind::Direct if self.command.is_empty() => {
                return Err(DescriptorError::MissingDirectCommand(self.id.clone()));
            }
            _ => {}
        }
        if self.timeout_ms == 0 {
            return Err(DescriptorError::NonPositiveTimeout(self.id.clone()));
        }
        Ok(())
    }

    /// Resolves the process to spawn: `(program, args)`.
    pub fn spawn_command(&self, runner: &str) -> (String, Vec<String>) {
        match self.kind {
            SpawnKind::Direct => (self.command.clone(), self.args.clone()),
            SpawnKind::PackageRunner => {
                let mut args = vec!["-y".to_string(), canonical_package(&self.command).to_string()];
                args.extend(self.args.clone());
                (runner.to_string(), args)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(kind: SpawnKind, command: &str) -> ServerDescriptor {
        ServerDescriptor {
            id: "s1".to_string(),
            name: "server one".to_string(),
            kind,
            command: command.to_string(),
            args: vec![],
            env: HashMap::new(),
            working_dir: None,
            auto_start: true,
            auto_restart: true,
            timeout_ms: 5000,
            enabled: true,
        }
    }

    #[test]
    fn empty_command_rejected_for_package_runner() {
        let d = base(SpawnKind::PackageRunner, "");
        assert_eq!(d.validate().unwrap_err(), DescriptorError::MissingPackageCommand("s1".to_string()));
    }

    #[test]
    fn empty_command_rejected_for_direct() {
        let d = base(SpawnKind::Direct, "");
        assert_eq!(d.validate().unwrap_err(), DescriptorError::MissingDirectCommand("s1".to_string()));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut d = base(SpawnKind::Direct, "my-server");
        d.timeout_ms = 0;
        assert_eq!(d.validate().unwrap_err(), DescriptorError::NonPositiveTimeout("s1".to_string()));
    }

    #[test]
    fn package_runner_maps_short_name_to_canonical_package() {
        let d = base(SpawnKind::PackageRunner, "fetch");
        let (program, args) = d.spawn_command("npx");
        assert_eq!(program, "npx");
        assert_eq!(args, vec!["-y".to_string(), "@modelcontextprotocol/server-fetch".to_string()]);
    }

    #[test]
    fn direct_kind_uses_command_and_args_unchanged() {
        let mut d = base(SpawnKind::Direct, "my-server");
        d.args = vec!["--port".to_string(), "9000".to_string()];
        let (program, args) = d.spawn_command("npx");
        assert_eq!(program, "my-server");
        assert_eq!(args, vec!["--port".to_string(), "9000".to_string()]);
    }
}
