//! Directory listing tool

use async_trait::async_trait;

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolArguments, ToolResult, ToolSchema};

use crate::error::{optional_i64, optional_str, Result, ToolError};

const DEFAULT_LIMIT: i64 = 50;

pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "ListFiles".into(),
            description: "List the entries of a directory, sorted by name. Directories end with '/'".into(),
            parameters: vec![
                ParameterSchema::new("path", "string", "Directory to list").with_default(serde_json::json!(".")),
                ParameterSchema::new("limit", "integer", "Maximum number of entries to return")
                    .with_default(DEFAULT_LIMIT.into()),
            ],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> CoreResult<ToolResult> {
        Ok(super::finish("ListFiles", list(arguments).await))
    }
}

async fn list(arguments: &ToolArguments) -> Result<String> {
    let path = optional_str(arguments, "path")?.unwrap_or(".");
    let limit = optional_i64(arguments, "limit")?.unwrap_or(DEFAULT_LIMIT);
    let limit = usize::try_from(limit)
        .ok()
        .filter(|l| *l > 0)
        .ok_or_else(|| ToolError::invalid("limit", format!("{limit} is not a positive integer")))?;

    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(path).await?;
    while let Some(entry) = dir.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    if entries.is_empty() {
        return Ok(format!("{path} is empty"));
    }

    let total = entries.len();
    entries.truncate(limit);
    let mut output = entries.join("\n");
    if total > limit {
        output.push_str(&format!("\n... and {} more", total - limit));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svckit::args;

    fn scratch_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        for file in ["b.txt", "a.txt", "c.txt"] {
            std::fs::write(dir.path().join(file), "x").unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn test_sorted_listing() {
        let dir = scratch_dir();
        let out = list(&args(serde_json::json!({"path": dir.path()}))).await.unwrap();
        assert_eq!(out, "a.txt\nb.txt\nc.txt\nsub/");
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let dir = scratch_dir();
        let out = list(&args(serde_json::json!({"path": dir.path(), "limit": 2})))
            .await
            .unwrap();
        assert_eq!(out, "a.txt\nb.txt\n... and 2 more");
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let out = list(&args(serde_json::json!({"path": dir.path()}))).await.unwrap();
        assert!(out.ends_with(" is empty"));
    }

    #[tokio::test]
    async fn test_missing_directory_is_error_result() {
        let result = ListFilesTool
            .execute(&args(serde_json::json!({"path": "/definitely/not/here"})))
            .await
            .unwrap();
        assert!(result.is_error);

        let result = ListFilesTool.execute(&args(serde_json::json!({"limit": 0}))).await.unwrap();
        assert!(result.is_error);
    }
}
