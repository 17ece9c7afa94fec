//! Loads a fixed set of prompt templates embedded in the binary and
//! substitutes `{{Name}}` placeholders (spec.md §4.2).
//!
//! Grounded in `loom::prompts::load`'s `embed_prompt_yaml!` macro and
//! `load_or_default` fallback pattern (`loom/src/prompts/load.rs`), and
//! in `loom::cli_run::load_agents_md`/`load_soul_md`'s
//! memory-file-with-fallback contract: a missing or unreadable project
//! memory file is never an error, only a reason to use the default.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

/// Canonical default name for the project-memory file, overridable via
/// `WEAVE_MEMORY_FILE`.
const DEFAULT_MEMORY_FILE: &str = "AGENTS.md";
const MEMORY_FILE_ENV: &str = "WEAVE_MEMORY_FILE";

const TEMPLATE_REACT_SYSTEM: &str = include_str!("templates/react_system.md");
const TEMPLATE_REFLECT: &str = include_str!("templates/reflect.md");
const DEFAULT_MEMORY: &str = include_str!("templates/default_memory.md");

/// The fixed set of templates embedded in the binary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateName {
    /// The ReAct loop's system prompt: role, working directory, tool
    /// catalog, project memory.
    ReactSystem,
    /// Second-pass reflection prompt the think tool's deep/ultra depths use.
    Reflect,
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("unknown template name")]
    UnknownTemplate,
}

impl TemplateName {
    fn source(self) -> &'static str {
        match self {
            TemplateName::ReactSystem => TEMPLATE_REACT_SYSTEM,
            TemplateName::Reflect => TEMPLATE_REFLECT,
        }
    }
}

/// Plain textual `{{Name}}` substitution; a placeholder with no entry
/// in `vars` is left untouched (spec.md §4.2: "undefined placeholders
/// are left as-is").
pub fn render(name: TemplateName, vars: &HashMap<String, String>) -> String {
    let mut out = name.source().to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{{{}}}}}", key), value);
    }
    out
}

/// Reads the project-memory file from `working_dir`. Returns the
/// built-in default when the file is absent, empty, or unreadable —
/// read failure is logged at debug level and never surfaced as an
/// error (spec.md §4.2: "Failure to read the memory file is non-fatal
/// and falls back to default").
pub fn load_project_memory(working_dir: &Path) -> String {
    let file_name = std::env::var(MEMORY_FILE_ENV).unwrap_or_else(|_| DEFAULT_MEMORY_FILE.to_string());
    let path = working_dir.join(&file_name);

    match std::fs::read_to_string(&path) {
        Ok(contents) if !contents.trim().is_empty() => contents,
        Ok(_) => {
            tracing::debug!(path = %path.display(), "project memory file empty, using default");
            DEFAULT_MEMORY.to_string()
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "project memory file unreadable, using default");
            DEFAULT_MEMORY.to_string()
        }
    }
}

/// Builds the ReAct system prompt: working directory, a pre-rendered
/// tool catalog, and project memory, all substituted into
/// [`TemplateName::ReactSystem`].
pub fn render_system_prompt(working_dir: &Path, tool_catalog: &str) -> String {
    let mut vars = HashMap::new();
    vars.insert("WorkingDirectory".to_string(), working_dir.display().to_string());
    vars.insert("ToolCatalog".to_string(), tool_catalog.to_string());
    vars.insert("ProjectMemory".to_string(), load_project_memory(working_dir));
    render(TemplateName::ReactSystem, &vars)
}

/// Builds the think tool's reflection prompt.
pub fn render_reflect_prompt(thought: &str, depth: &str) -> String {
    let mut vars = HashMap::new();
    vars.insert("Thought".to_string(), thought.to_string());
    vars.insert("Depth".to_string(), depth.to_string());
    render(TemplateName::Reflect, &vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("WorkingDirectory".to_string(), "/tmp/proj".to_string());
        vars.insert("ToolCatalog".to_string(), "- file_read".to_string());
        vars.insert("ProjectMemory".to_string(), "remember this".to_string());
        let rendered = render(TemplateName::ReactSystem, &vars);
        assert!(rendered.contains("/tmp/proj"));
        assert!(rendered.contains("- file_read"));
        assert!(rendered.contains("remember this"));
        assert!(!rendered.contains("{{WorkingDirectory}}"));
    }

    #[test]
    fn undefined_placeholder_left_as_is() {
        let vars = HashMap::new();
        let rendered = render(TemplateName::ReactSystem, &vars);
        assert!(rendered.contains("{{WorkingDirectory}}"));
    }

    #[test]
    fn missing_memory_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let memory = load_project_memory(dir.path());
        assert_eq!(memory, DEFAULT_MEMORY);
    }

    #[test]
    fn present_memory_file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_MEMORY_FILE), "custom memory text").unwrap();
        let memory = load_project_memory(dir.path());
        assert_eq!(memory, "custom memory text");
    }

    #[test]
    fn empty_memory_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_MEMORY_FILE), "   \n").unwrap();
        let memory = load_project_memory(dir.path());
        assert_eq!(memory, DEFAULT_MEMORY);
    }

    #[test]
    fn custom_memory_file_name_via_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SOUL.md"), "soul text").unwrap();
        std::env::set_var(MEMORY_FILE_ENV, "SOUL.md");
        let memory = load_project_memory(dir.path());
        std::env::remove_var(MEMORY_FILE_ENV);
        assert_eq!(memory, "soul text");
    }

    #[test]
    fn render_system_prompt_includes_working_dir_and_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let prompt = render_system_prompt(dir.path(), "- think\n- file_read");
        assert!(prompt.contains("- think"));
        assert!(prompt.contains(&dir.path().display().to_string()));
    }

    #[test]
    fn render_reflect_prompt_includes_thought_and_depth() {
        let prompt = render_reflect_prompt("consider edge cases", "ultra");
        assert!(prompt.contains("consider edge cases"));
        assert!(prompt.contains("ultra"));
    }
}
