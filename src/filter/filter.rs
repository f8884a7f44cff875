use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, QueryParams, SortDirection};

/// Builder for a single PostgREST row query against one table
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    select: Option<String>,
    where_data: Vec<FilterWhereInfo>,
    or_groups: Vec<Vec<FilterWhereInfo>>,
    order_data: Vec<FilterOrderInfo>,
    single: bool,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            select: None,
            where_data: vec![],
            or_groups: vec![],
            order_data: vec![],
            single: false,
        })
    }

    pub fn table(&self) -> &str {
        &self.table_name
    }

    /// Column list with optional embedded relations, e.g. `*, authors (*)`
    pub fn select(mut self, columns: &str) -> Result<Self, FilterError> {
        self.select = Some(Self::normalize_select(columns)?);
        Ok(self)
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Result<Self, FilterError> {
        self.condition(column, FilterOp::Eq, value.into())
    }

    pub fn is_null(self, column: &str) -> Result<Self, FilterError> {
        self.condition(column, FilterOp::Is, Value::Null)
    }

    fn condition(mut self, column: &str, operator: FilterOp, value: Value) -> Result<Self, FilterError> {
        FilterWhere::validate_column(column)?;
        self.where_data.push(FilterWhereInfo::new(column, operator, value));
        Ok(self)
    }

    /// Conditions joined with OR; successive groups are ANDed with everything else
    fn or(mut self, group: Vec<FilterWhereInfo>) -> Result<Self, FilterError> {
        for condition in &group {
            FilterWhere::validate_column(&condition.column)?;
        }
        if group.is_empty() {
            return Err(FilterError::InvalidOperatorData("or group requires at least one condition".to_string()));
        }
        self.or_groups.push(group);
        Ok(self)
    }

    /// Case-insensitive substring match on any of `columns`
    pub fn ilike_any(self, columns: &[&str], needle: &str) -> Result<Self, FilterError> {
        let pattern = format!("*{}*", needle);
        let group = columns
            .iter()
            .map(|c| FilterWhereInfo::new(*c, FilterOp::ILike, pattern.clone()))
            .collect();
        self.or(group)
    }

    pub fn order(mut self, column: &str, sort: SortDirection) -> Result<Self, FilterError> {
        FilterWhere::validate_column(column)?;
        self.order_data.push(FilterOrderInfo { column: column.to_string(), sort });
        Ok(self)
    }

    /// Expect exactly one row back as an object
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    pub fn to_params(&self) -> Result<QueryParams, FilterError> {
        let mut pairs = Vec::new();
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        pairs.extend(FilterWhere::generate(&self.where_data)?);
        for group in &self.or_groups {
            pairs.push(FilterWhere::generate_or(group)?);
        }
        if let Some(order) = FilterOrder::generate(&self.order_data) {
            pairs.push(order);
        }
        Ok(QueryParams { pairs, single: self.single })
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if name.is_empty() {
            return Err(FilterError::InvalidTableName("Table name cannot be empty".to_string()));
        }
        let first = name.chars().next().unwrap_or('0');
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_') || (!first.is_alphabetic() && first != '_') {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    // Whitespace is insignificant to PostgREST, so strip it and check the parens balance
    fn normalize_select(columns: &str) -> Result<String, FilterError> {
        let compact: String = columns.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(FilterError::InvalidSelect("Select cannot be empty".to_string()));
        }
        let mut depth = 0i32;
        for c in compact.chars() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(FilterError::InvalidSelect(format!("Unbalanced parentheses: {}", columns)));
                    }
                }
                c if c.is_alphanumeric() || matches!(c, '_' | '*' | ',' | ':' | '!') => {}
                other => {
                    return Err(FilterError::InvalidSelect(format!("Unexpected character '{}' in: {}", other, columns)));
                }
            }
        }
        if depth != 0 {
            return Err(FilterError::InvalidSelect(format!("Unbalanced parentheses: {}", columns)));
        }
        Ok(compact)
    }
}
