// Binds the names in a QueryPlan to positions in the combined row of the FROM tables.

use tracing::debug;

use crate::ast::{Column, QueryPlan, SortDirection};
use crate::error::{Error, Result};
use crate::expression::ExpressionTree;
use crate::table::InputTable;
use crate::tuple::DataType;

#[derive(Debug, Clone)]
pub struct SchemaColumn {
    pub column: Column,
    pub data_type: DataType,
}

/// Columns of every FROM table, concatenated in FROM order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub columns: Vec<SchemaColumn>,
}

impl Schema {
    pub fn from_tables(tables: &[&InputTable]) -> Self {
        let columns = tables
            .iter()
            .flat_map(|table| {
                table
                    .columns
                    .iter()
                    .zip(&table.column_types)
                    .map(|(column, data_type)| SchemaColumn {
                        column: column.clone(),
                        data_type: *data_type,
                    })
            })
            .collect();
        Schema { columns }
    }

    pub fn resolve(&self, reference: &Column) -> Result<usize> {
        resolve_among(reference, self.columns.iter().map(|c| &c.column))
    }
}

/// Finds the single candidate matching `reference`. No match and several matches are
/// both errors.
pub fn resolve(reference: &Column, candidates: &[Column]) -> Result<usize> {
    resolve_among(reference, candidates.iter())
}

fn resolve_among<'c>(
    reference: &Column,
    candidates: impl Iterator<Item = &'c Column>,
) -> Result<usize> {
    let mut found = None;
    for (i, candidate) in candidates.enumerate() {
        if reference.matches(candidate) {
            if found.is_some() {
                return Err(Error::BadColumnName(format!("{reference} is ambiguous")));
            }
            found = Some(i);
        }
    }
    found.ok_or_else(|| Error::BadColumnName(format!("{reference} does not exist")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    /// Header text, taken from the table's own spelling of the column.
    pub name: String,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub index: usize,
    pub data_type: DataType,
    pub direction: SortDirection,
}

#[derive(Debug, Clone)]
pub struct AnalyzedQuery {
    pub output_columns: Vec<OutputColumn>,
    pub sort_keys: Vec<SortKey>,
    /// WHERE leaves are bound later, when the first row reaches the filter.
    pub where_clause: Option<ExpressionTree>,
}

impl AnalyzedQuery {
    pub fn header(&self) -> Vec<String> {
        self.output_columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn projection(&self) -> Vec<usize> {
        self.output_columns.iter().map(|c| c.index).collect()
    }
}

pub struct Analyzer<'a> {
    schema: &'a Schema,
}

impl<'a> Analyzer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Analyzer { schema }
    }

    pub fn analyze(&self, plan: QueryPlan) -> Result<AnalyzedQuery> {
        let output_columns: Vec<OutputColumn> = if plan.select_columns.is_empty() {
            self.schema
                .columns
                .iter()
                .enumerate()
                .map(|(index, c)| OutputColumn {
                    name: c.column.column_name.clone(),
                    index,
                })
                .collect()
        } else {
            plan.select_columns
                .iter()
                .map(|column| self.output_column(column))
                .collect::<Result<Vec<_>>>()?
        };

        let sort_keys = plan
            .order_by
            .iter()
            .map(|item| {
                let index = self.schema.resolve(&item.column)?;
                Ok(SortKey {
                    index,
                    data_type: self.schema.columns[index].data_type,
                    direction: item.direction,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            output = ?output_columns.iter().map(|c| c.index).collect::<Vec<_>>(),
            sort_keys = sort_keys.len(),
            "analyzed query"
        );

        Ok(AnalyzedQuery {
            output_columns,
            sort_keys,
            where_clause: plan.where_clause,
        })
    }

    fn output_column(&self, column: &Column) -> Result<OutputColumn> {
        let index = self.schema.resolve(column)?;
        Ok(OutputColumn {
            name: self.schema.columns[index].column.column_name.clone(),
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::OrderByItem;
    use crate::parser::parse;

    fn table(name: &str, columns: &[(&str, DataType)]) -> InputTable {
        InputTable {
            name: name.to_string(),
            columns: columns
                .iter()
                .map(|(c, _)| Column::qualified(name, *c))
                .collect(),
            column_types: columns.iter().map(|(_, t)| *t).collect(),
            rows: Vec::new(),
        }
    }

    fn two_tables() -> (InputTable, InputTable) {
        let schema = [("Integer", DataType::Integer), ("String", DataType::String)];
        (table("TABLE1", &schema), table("TABLE2", &schema))
    }

    #[test]
    fn test_resolve_unique_match() {
        let candidates = vec![
            Column::qualified("PARENTS", "Id"),
            Column::qualified("PARENTS", "Name"),
            Column::qualified("CHILDREN", "ParentId"),
        ];
        assert_eq!(resolve(&Column::new("parentid"), &candidates).unwrap(), 2);
        assert_eq!(
            resolve(&Column::qualified("parents", "NAME"), &candidates).unwrap(),
            1
        );
    }

    #[test]
    fn test_resolve_errors() {
        let candidates = vec![
            Column::qualified("TABLE1", "Integer"),
            Column::qualified("TABLE2", "Integer"),
        ];
        assert!(matches!(
            resolve(&Column::new("Integer"), &candidates),
            Err(Error::BadColumnName(_))
        ));
        assert!(matches!(
            resolve(&Column::new("Missing"), &candidates),
            Err(Error::BadColumnName(_))
        ));
        assert!(matches!(
            resolve(&Column::qualified("TABLE3", "Integer"), &candidates),
            Err(Error::BadColumnName(_))
        ));
    }

    #[test]
    fn test_schema_concatenates_in_from_order() {
        let (t1, t2) = two_tables();
        let schema = Schema::from_tables(&[&t2, &t1]);
        assert_eq!(schema.columns.len(), 4);
        assert_eq!(
            schema.columns[0].column,
            Column::qualified("TABLE2", "Integer")
        );
        assert_eq!(
            schema.resolve(&Column::qualified("TABLE1", "String")).unwrap(),
            3
        );
    }

    #[test]
    fn test_ambiguous_select_column() {
        let (t1, t2) = two_tables();
        let schema = Schema::from_tables(&[&t1, &t2]);
        let plan = parse("SELECT Integer FROM TABLE1, TABLE2").unwrap();
        assert!(matches!(
            Analyzer::new(&schema).analyze(plan),
            Err(Error::BadColumnName(_))
        ));

        let plan = parse("SELECT TABLE1.Integer FROM TABLE1, TABLE2").unwrap();
        let query = Analyzer::new(&schema).analyze(plan).unwrap();
        assert_eq!(query.projection(), vec![0]);
    }

    #[test]
    fn test_select_all_expands_schema() {
        let (t1, t2) = two_tables();
        let schema = Schema::from_tables(&[&t1, &t2]);
        let plan = parse("SELECT * FROM TABLE1, TABLE2").unwrap();
        let query = Analyzer::new(&schema).analyze(plan).unwrap();
        assert_eq!(query.projection(), vec![0, 1, 2, 3]);
        assert_eq!(query.header(), vec!["Integer", "String", "Integer", "String"]);
    }

    #[test]
    fn test_header_uses_table_spelling() {
        let (t1, _) = two_tables();
        let schema = Schema::from_tables(&[&t1]);
        let plan = parse("SELECT string, table1.INTEGER FROM TABLE1").unwrap();
        let query = Analyzer::new(&schema).analyze(plan).unwrap();
        assert_eq!(query.header(), vec!["String", "Integer"]);
        assert_eq!(query.projection(), vec![1, 0]);
    }

    #[test]
    fn test_order_by_binding() {
        let (t1, t2) = two_tables();
        let schema = Schema::from_tables(&[&t1, &t2]);
        let mut plan = QueryPlan {
            table_names: vec!["TABLE1".into(), "TABLE2".into()],
            ..QueryPlan::default()
        };
        plan.order_by.push(OrderByItem {
            column: Column::qualified("TABLE2", "String"),
            direction: SortDirection::Desc,
        });
        let query = Analyzer::new(&schema).analyze(plan.clone()).unwrap();
        assert_eq!(
            query.sort_keys,
            vec![SortKey {
                index: 3,
                data_type: DataType::String,
                direction: SortDirection::Desc
            }]
        );

        plan.order_by[0].column = Column::new("String");
        assert!(matches!(
            Analyzer::new(&schema).analyze(plan),
            Err(Error::BadColumnName(_))
        ));
    }
}
