use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid table name: {0}")]
    InvalidTableName(String),

    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid select expression: {0}")]
    InvalidSelect(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),
}
