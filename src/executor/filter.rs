use tracing::trace;

use crate::analyzer::Schema;
use crate::error::Result;
use crate::evaluator::Evaluator;
use crate::expression::ExpressionTree;

use super::{Executor, Tuple};

/// Filter executor for the WHERE clause
pub struct FilterExecutor<'a> {
    child: Box<dyn Executor + 'a>,
    schema: &'a Schema,
    evaluator: Evaluator<'a>,
}

impl<'a> FilterExecutor<'a> {
    pub fn new(
        child: Box<dyn Executor + 'a>,
        predicate: &'a ExpressionTree,
        schema: &'a Schema,
    ) -> Self {
        FilterExecutor {
            child,
            schema,
            evaluator: Evaluator::new(predicate),
        }
    }
}

impl Executor for FilterExecutor<'_> {
    fn open(&mut self) -> Result<()> {
        self.child.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        while let Some(tuple) = self.child.next()? {
            // Column leaves are bound once, when the first row arrives.
            if !self.evaluator.is_bound() {
                self.evaluator.bind(self.schema)?;
            }
            let keep = self.evaluator.evaluate(&tuple)?;
            trace!(keep, "where verdict");
            if keep {
                return Ok(Some(tuple));
            }
        }
        Ok(None)
    }
}
