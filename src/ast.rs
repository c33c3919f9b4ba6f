// Query plan produced by the parser. Column references are still unresolved here.

use std::fmt;

use crate::expression::ExpressionTree;

/// A column reference as written in the query, or a column of a loaded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub table_name: Option<String>,
    pub column_name: String,
}

impl Column {
    pub fn new(column_name: impl Into<String>) -> Self {
        Column {
            table_name: None,
            column_name: column_name.into(),
        }
    }

    pub fn qualified(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Column {
            table_name: Some(table_name.into()),
            column_name: column_name.into(),
        }
    }

    /// ASCII case-insensitive match. The table name is only compared when this
    /// reference carries a non-empty one.
    pub fn matches(&self, candidate: &Column) -> bool {
        if !self
            .column_name
            .eq_ignore_ascii_case(&candidate.column_name)
        {
            return false;
        }
        match self.table_name.as_deref() {
            None | Some("") => true,
            Some(table) => candidate
                .table_name
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case(table)),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table_name {
            Some(table) => write!(f, "{table}.{}", self.column_name),
            None => f.write_str(&self.column_name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByItem {
    pub column: Column,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Default)]
pub struct QueryPlan {
    pub table_names: Vec<String>,
    /// Empty means `SELECT *`.
    pub select_columns: Vec<Column>,
    pub order_by: Vec<OrderByItem>,
    pub where_clause: Option<ExpressionTree>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_matches_by_name_only() {
        let reference = Column::new("integer");
        assert!(reference.matches(&Column::qualified("TABLE1", "Integer")));
        assert!(reference.matches(&Column::qualified("TABLE2", "INTEGER")));
        assert!(!reference.matches(&Column::qualified("TABLE1", "Integer1")));
    }

    #[test]
    fn test_column_matches_with_table() {
        let reference = Column::qualified("table1", "String");
        assert!(reference.matches(&Column::qualified("TABLE1", "string")));
        assert!(!reference.matches(&Column::qualified("TABLE2", "String")));
        assert!(!reference.matches(&Column::qualified("TABLE", "String")));
    }

    #[test]
    fn test_empty_table_name_is_unqualified() {
        let reference = Column {
            table_name: Some(String::new()),
            column_name: "Id".into(),
        };
        assert!(reference.matches(&Column::qualified("PARENTS", "Id")));
    }

    #[test]
    fn test_column_display() {
        assert_eq!(Column::qualified("T", "c").to_string(), "T.c");
        assert_eq!(Column::new("c").to_string(), "c");
    }
}
