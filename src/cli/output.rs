use std::fmt::Write as FmtWrite;

use crate::models::{Chunk, OutputFormat, TaskStatus};

pub trait Formatter {
    fn format_chunks(&self, chunks: &[Chunk], content_only: bool) -> String;
    fn format_search_results(&self, query: &str, chunks: &[Chunk], content_only: bool) -> String;
    fn format_task(&self, task: &TaskStatus) -> String;
    fn format_tasks(&self, tasks: &[TaskStatus]) -> String;
    fn format_names(&self, names: &[String]) -> String;
    fn format_tags(&self, tags: &[String]) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub provider: String,
    pub model: String,
    pub provider_reachable: bool,
    pub persist_dir: String,
    pub collections: Vec<String>,
    pub task_db: String,
    pub tasks_total: usize,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_chunks(&self, chunks: &[Chunk], content_only: bool) -> String {
        if content_only {
            let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            return format!("{}\n", contents.join("\n"));
        }

        let mut output = String::new();
        writeln!(output, "Total chunks: {}\n", chunks.len()).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            writeln!(output, "{}. [{} chars]", i + 1, chunk.len()).unwrap();
            for line in chunk.content.lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }
        output
    }

    fn format_search_results(&self, query: &str, chunks: &[Chunk], content_only: bool) -> String {
        if chunks.is_empty() {
            return format!("No results found for: {}\n", query);
        }
        if content_only {
            return self.format_chunks(chunks, true);
        }

        let mut output = String::new();
        writeln!(output, "Search results for: \"{}\"", query).unwrap();
        writeln!(output, "Found {} results\n", chunks.len()).unwrap();

        for (i, chunk) in chunks.iter().enumerate() {
            let score = chunk.metadata.get("score").map(String::as_str).unwrap_or("-");
            writeln!(output, "{}. [Score: {}]", i + 1, score).unwrap();
            if let Some(source) = chunk.source() {
                writeln!(output, "   Source: {}", source).unwrap();
            }
            writeln!(output, "   ---").unwrap();

            let preview: String = chunk.content.chars().take(200).collect();
            let preview = if chunk.content.chars().count() > 200 {
                format!("{}...", preview)
            } else {
                preview
            };
            for line in preview.lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }

        output
    }

    fn format_task(&self, task: &TaskStatus) -> String {
        format!(
            "Task {}\n  status: {}\n  progress: {:.1}%\n  estimated time left: {:.1}s\n",
            task.task_id,
            task.status,
            task.progress * 100.0,
            task.estimated_time_left
        )
    }

    fn format_tasks(&self, tasks: &[TaskStatus]) -> String {
        if tasks.is_empty() {
            return "No tasks found.\n".to_string();
        }
        let mut output = String::new();
        for task in tasks {
            writeln!(
                output,
                "{}  {:<12} {:>5.1}%  eta {:.1}s",
                task.task_id,
                task.status.to_string(),
                task.progress * 100.0,
                task.estimated_time_left
            )
            .unwrap();
        }
        output
    }

    fn format_names(&self, names: &[String]) -> String {
        if names.is_empty() {
            return "No collections found.\n".to_string();
        }
        format!("{}\n", names.join("\n"))
    }

    fn format_tags(&self, tags: &[String]) -> String {
        if tags.is_empty() {
            return "No tags found.\n".to_string();
        }
        format!("{}\n", tags.join("\n"))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();
        let reachable = if status.provider_reachable {
            console::style("reachable").green().to_string()
        } else {
            console::style("unreachable").red().to_string()
        };
        writeln!(
            output,
            "Provider:    {} ({}) - {}",
            status.provider, status.model, reachable
        )
        .unwrap();
        writeln!(output, "Persist dir: {}", status.persist_dir).unwrap();
        writeln!(
            output,
            "Collections: {}",
            if status.collections.is_empty() {
                "(none)".to_string()
            } else {
                status.collections.join(", ")
            }
        )
        .unwrap();
        writeln!(output, "Task store:  {}", status.task_db).unwrap();
        writeln!(output, "Tasks known: {}", status.tasks_total).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter;

impl JsonFormatter {
    fn to_json(value: &impl serde::Serialize) -> String {
        serde_json::to_string_pretty(value)
            .map(|s| format!("{}\n", s))
            .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}\n", e))
    }
}

impl Formatter for JsonFormatter {
    fn format_chunks(&self, chunks: &[Chunk], content_only: bool) -> String {
        if content_only {
            let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            return Self::to_json(&contents);
        }
        let summaries: Vec<serde_json::Value> = chunks
            .iter()
            .map(|c| {
                serde_json::json!({
                    "length": c.len(),
                    "content": c.content,
                })
            })
            .collect();
        Self::to_json(&serde_json::json!({
            "total": summaries.len(),
            "chunks": summaries,
        }))
    }

    fn format_search_results(&self, _query: &str, chunks: &[Chunk], content_only: bool) -> String {
        if content_only {
            let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
            return Self::to_json(&contents);
        }
        Self::to_json(&serde_json::json!({
            "total": chunks.len(),
            "contents": chunks,
        }))
    }

    fn format_task(&self, task: &TaskStatus) -> String {
        Self::to_json(task)
    }

    fn format_tasks(&self, tasks: &[TaskStatus]) -> String {
        Self::to_json(&tasks)
    }

    fn format_names(&self, names: &[String]) -> String {
        Self::to_json(&names)
    }

    fn format_tags(&self, tags: &[String]) -> String {
        Self::to_json(&tags)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        Self::to_json(&serde_json::json!({
            "provider": status.provider,
            "model": status.model,
            "provider_reachable": status.provider_reachable,
            "persist_dir": status.persist_dir,
            "collections": status.collections,
            "task_db": status.task_db,
            "tasks_total": status.tasks_total,
        }))
    }

    fn format_message(&self, message: &str) -> String {
        Self::to_json(&serde_json::json!({ "message": message }))
    }

    fn format_error(&self, error: &str) -> String {
        Self::to_json(&serde_json::json!({ "error": error }))
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskRecord, TaskState};

    #[test]
    fn test_text_formatter_chunks() {
        let chunks = vec![Chunk::new("hello world")];
        let output = TextFormatter.format_chunks(&chunks, false);
        assert!(output.contains("Total chunks: 1"));
        assert!(output.contains("hello world"));
    }

    #[test]
    fn test_content_only_lists_raw_content() {
        let chunks = vec![Chunk::new("first"), Chunk::new("second")];
        let output = TextFormatter.format_chunks(&chunks, true);
        assert_eq!(output, "first\nsecond\n");
    }

    #[test]
    fn test_json_formatter_task() {
        let record = TaskRecord {
            progress: 0.5,
            status: TaskState::Running,
            estimated_time_left: 3.0,
        };
        let task = TaskStatus::from_record("t1", &record);
        let output = JsonFormatter.format_task(&task);
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["task_id"], "t1");
        assert_eq!(parsed["status"], "running");
    }
}
