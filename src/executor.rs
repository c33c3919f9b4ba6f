mod cross_join;
mod filter;
mod projection;
mod sort;

use tracing::debug;

use crate::analyzer::{AnalyzedQuery, Schema};
use crate::error::{Error, Result};
use crate::table::InputTable;
use crate::tuple::Value;

pub use cross_join::CrossJoinExecutor;
pub use filter::FilterExecutor;
pub use projection::ProjectionExecutor;
pub use sort::SortExecutor;

// Runtime representation of a row during query execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    pub values: Vec<Value>,
}

impl Tuple {
    pub fn new(values: Vec<Value>) -> Self {
        Tuple { values }
    }
}

// Volcano model: open/next interface
pub trait Executor {
    fn open(&mut self) -> Result<()>;
    fn next(&mut self) -> Result<Option<Tuple>>;
}

/// Appends `tuple`, failing once `rows` already holds `limit` rows or the
/// allocation cannot be made.
pub(crate) fn push_bounded(
    rows: &mut Vec<Tuple>,
    tuple: Tuple,
    limit: Option<usize>,
) -> Result<()> {
    if let Some(limit) = limit {
        if rows.len() >= limit {
            return Err(Error::MemoryOver { limit });
        }
    }
    rows.try_reserve(1).map_err(|_| Error::MemoryAllocate)?;
    rows.push(tuple);
    Ok(())
}

pub struct ExecutionEngine<'a> {
    tables: &'a [&'a InputTable],
    schema: &'a Schema,
    max_rows: Option<usize>,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(
        tables: &'a [&'a InputTable],
        schema: &'a Schema,
        max_rows: Option<usize>,
    ) -> Self {
        ExecutionEngine {
            tables,
            schema,
            max_rows,
        }
    }

    /// CrossJoin -> Filter -> Sort -> Projection
    fn build_plan(&self, query: &'a AnalyzedQuery) -> Box<dyn Executor + 'a> {
        let mut plan: Box<dyn Executor + 'a> =
            Box::new(CrossJoinExecutor::new(self.tables.to_vec()));

        if let Some(tree) = &query.where_clause {
            plan = Box::new(FilterExecutor::new(plan, tree, self.schema));
        }

        if !query.sort_keys.is_empty() {
            plan = Box::new(SortExecutor::new(
                plan,
                query.sort_keys.clone(),
                self.max_rows,
            ));
        }

        Box::new(ProjectionExecutor::new(plan, query.projection()))
    }

    pub fn execute(&self, query: &'a AnalyzedQuery) -> Result<Vec<Tuple>> {
        let mut plan = self.build_plan(query);
        plan.open()?;

        let mut rows = Vec::new();
        while let Some(tuple) = plan.next()? {
            push_bounded(&mut rows, tuple, self.max_rows)?;
        }
        debug!(rows = rows.len(), "query produced rows");
        Ok(rows)
    }
}
