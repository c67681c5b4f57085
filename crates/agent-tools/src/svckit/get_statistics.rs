//! Descriptive statistics tool

use async_trait::async_trait;
use serde::Serialize;

use agent_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolArguments, ToolResult, ToolSchema};

use crate::error::{Result, ToolError};

pub struct GetStatisticsTool;

/// Summary of a non-empty number list
#[derive(Debug, PartialEq, Serialize)]
struct Summary {
    count: usize,
    sum: f64,
    mean: f64,
    median: f64,
    min: f64,
    max: f64,
    std_dev: f64,
}

#[async_trait]
impl Tool for GetStatisticsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "GetStatistics".into(),
            description: "Compute count, sum, mean, median, min, max and standard deviation of a list of numbers".into(),
            parameters: vec![ParameterSchema::new("numbers", "array", "Numbers to summarize")
                .with_items(serde_json::json!({"type": "number"}))
                .required()],
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> CoreResult<ToolResult> {
        let outcome = numbers(arguments)
            .and_then(|values| summarize(&values))
            .and_then(|summary| serde_json::to_string_pretty(&summary).map_err(Into::into));
        Ok(super::finish("GetStatistics", outcome))
    }
}

fn numbers(arguments: &ToolArguments) -> Result<Vec<f64>> {
    let values = arguments
        .get("numbers")
        .ok_or(ToolError::MissingArgument("numbers"))?
        .as_array()
        .ok_or_else(|| ToolError::invalid("numbers", "expected an array of numbers"))?;

    values
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| ToolError::invalid("numbers", format!("{v} is not a number")))
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn summarize(values: &[f64]) -> Result<Summary> {
    if values.is_empty() {
        return Err(ToolError::invalid("numbers", "the list is empty"));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    let sum: f64 = sorted.iter().sum();
    let mean = sum / count as f64;
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    Ok(Summary {
        count,
        sum,
        mean,
        median,
        min: sorted[0],
        max: sorted[count - 1],
        std_dev: variance.sqrt(),
    })
}
