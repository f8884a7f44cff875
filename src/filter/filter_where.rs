use serde_json::Value;

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Renders row conditions as PostgREST query pairs (`column=op.value`)
pub struct FilterWhere;

impl FilterWhere {
    pub fn generate(conditions: &[FilterWhereInfo]) -> Result<Vec<(String, String)>, FilterError> {
        conditions
            .iter()
            .map(|condition| {
                let value = Self::render(condition, false)?;
                Ok((condition.column.clone(), format!("{}.{}", condition.operator.to_postgrest(), value)))
            })
            .collect()
    }

    /// Builds a single `or=(a.op.v,b.op.v)` pair. Values are always quoted so that
    /// commas and parentheses inside user input cannot break the group.
    pub fn generate_or(group: &[FilterWhereInfo]) -> Result<(String, String), FilterError> {
        if group.is_empty() {
            return Err(FilterError::InvalidOperatorData("or group requires at least one condition".to_string()));
        }
        let mut parts = Vec::with_capacity(group.len());
        for condition in group {
            let value = Self::render(condition, true)?;
            parts.push(format!("{}.{}.{}", condition.column, condition.operator.to_postgrest(), value));
        }
        Ok(("or".to_string(), format!("({})", parts.join(","))))
    }

    pub fn validate_column(column: &str) -> Result<(), FilterError> {
        if column.is_empty() {
            return Err(FilterError::InvalidColumn("Column name cannot be empty".to_string()));
        }
        let first = column.chars().next().unwrap_or('0');
        if !column.chars().all(|c| c.is_alphanumeric() || c == '_') || (!first.is_alphabetic() && first != '_') {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        Ok(())
    }

    fn render(condition: &FilterWhereInfo, quote: bool) -> Result<String, FilterError> {
        match condition.operator {
            FilterOp::Is => match &condition.data {
                Value::Null => Ok("null".to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                other => Err(FilterError::InvalidOperatorData(format!("is requires null or boolean, got {}", other))),
            },
            _ => {
                let value = Self::scalar(&condition.data)?;
                Ok(if quote { Self::quote(&value) } else { value })
            }
        }
    }

    fn scalar(value: &Value) -> Result<String, FilterError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            other => Err(FilterError::InvalidOperatorData(format!("expected scalar value, got {}", other))),
        }
    }

    fn quote(value: &str) -> String {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    }
}
