//! `recommend(task) -> ranked tool list`: a static task-type → tool-set
//! mapping combined with two dynamic signals (moving-average duration,
//! keyword overlap between the task description and per-tool hints).

use weave_tool_registry::ToolSchema;

#[derive(Clone, Debug)]
pub struct Recommendation {
    pub tool_name: String,
    pub confidence: f64,
    pub rationale: String,
}

const MAX_RECOMMENDATIONS: usize = 5;

/// A small static map from task-type keywords to tool name hints; a
/// starting point, not an exhaustive taxonomy.
fn static_hints(tool_name: &str) -> &'static [&'static str] {
    match tool_name {
        "file_read" => &["read", "inspect", "view", "show"],
        "file_update" => &["write", "create", "save"],
        "file_replace" => &["replace", "edit", "modify", "fix"],
        "file_list" => &["list", "ls", "directory", "contents"],
        "directory_create" => &["mkdir", "create directory", "folder"],
        "shell_execute" => &["run", "execute", "command", "build", "test"],
        "search_grep" => &["search", "find", "grep", "look for"],
        "search_find" => &["find file", "locate"],
        "todo_write" | "todo_read" => &["task", "todo", "plan", "track"],
        "web_search" => &["web", "internet", "lookup", "research"],
        "think" => &["think", "reason", "reflect", "plan"],
        _ => &[],
    }
}

fn keyword_overlap_score(task: &str, tool_name: &str) -> f64 {
    let task_lower = task.to_lowercase();
    let hints = static_hints(tool_name);
    if hints.is_empty() {
        return 0.0;
    }
    let hits = hints.iter().filter(|h| task_lower.contains(*h)).count();
    (hits as f64 / hints.len() as f64).min(1.0)
}

/// Faster tools (lower moving-average duration) get a small positive
/// bias, capped so it cannot dominate the keyword signal.
fn speed_bias(avg_duration_ms: Option<f64>) -> f64 {
    match avg_duration_ms {
        Some(ms) if ms > 0.0 => (50.0 / ms).min(0.2),
        _ => 0.0,
    }
}

pub fn recommend(task: &str, schemas: &[ToolSchema], usage: &[(String, f64)]) -> Vec<Recommendation> {
    let mut scored: Vec<Recommendation> = schemas
        .iter()
        .map(|schema| {
            let keyword_score = keyword_overlap_score(task, &schema.name);
            let avg_duration = usage
                .iter()
                .find(|(name, _)| name == &schema.name)
                .map(|(_, d)| *d);
            let bias = speed_bias(avg_duration);
            let confidence = (keyword_score + bias).min(1.0);
            Recommendation {
                tool_name: schema.name.clone(),
                confidence,
                rationale: format!(
                    "keyword overlap {:.2}, speed bias {:.2}",
                    keyword_score, bias
                ),
            }
        })
        .filter(|r| r.confidence > 0.0)
        .collect();

    scored.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(MAX_RECOMMENDATIONS);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_tool_registry::ToolSchema;

    fn schema(name: &str) -> ToolSchema {
        ToolSchema::new(name, "d", "cat")
    }

    #[test]
    fn keyword_match_ranks_above_no_match() {
        let schemas = vec![schema("file_read"), schema("shell_execute")];
        let recs = recommend("please read the file", &schemas, &[]);
        assert_eq!(recs[0].tool_name, "file_read");
    }

    #[test]
    fn returns_at_most_five() {
        let schemas: Vec<ToolSchema> = (0..10).map(|i| schema(&format!("file_read_{}", i))).collect();
        let schemas: Vec<ToolSchema> = schemas
            .into_iter()
            .map(|mut s| {
                s.name = "file_read".to_string();
                s
            })
            .collect();
        let recs = recommend("read the file", &schemas, &[]);
        assert!(recs.len() <= 5);
    }

    #[test]
    fn no_keyword_match_and_no_usage_yields_empty() {
        let schemas = vec![schema("directory_create")];
        let recs = recommend("completely unrelated text", &schemas, &[]);
        assert!(recs.is_empty());
    }
}
