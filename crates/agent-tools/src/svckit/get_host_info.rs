//! Host information tool

use async_trait::async_trait;
use serde::Serialize;
use sysinfo::System;

use agent_core::{Result as CoreResult, Tool, ToolArguments, ToolResult, ToolSchema};

pub struct GetHostInfoTool;

#[derive(Debug, Serialize)]
struct HostInfo {
    hostname: String,
    os: String,
    os_version: Option<String>,
    architecture: &'static str,
    cpu_count: usize,
}

impl HostInfo {
    fn collect() -> Self {
        Self {
            hostname: System::host_name().unwrap_or_else(|| "unknown".into()),
            os: std::env::consts::OS.into(),
            os_version: System::long_os_version(),
            architecture: std::env::consts::ARCH,
            cpu_count: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
        }
    }
}

#[async_trait]
impl Tool for GetHostInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "GetHostInfo".into(),
            description: "Get information about the host machine: hostname, operating system, architecture and CPU count".into(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _arguments: &ToolArguments) -> CoreResult<ToolResult> {
        let outcome = serde_json::to_string_pretty(&HostInfo::collect()).map_err(Into::into);
        Ok(super::finish("GetHostInfo", outcome))
    }
}
