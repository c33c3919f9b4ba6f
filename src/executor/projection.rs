use crate::error::Result;

use super::{Executor, Tuple};

/// Projection executor for the SELECT list
pub struct ProjectionExecutor<'a> {
    child: Box<dyn Executor + 'a>,
    indices: Vec<usize>,
}

impl<'a> ProjectionExecutor<'a> {
    pub fn new(child: Box<dyn Executor + 'a>, indices: Vec<usize>) -> Self {
        ProjectionExecutor { child, indices }
    }
}

impl Executor for ProjectionExecutor<'_> {
    fn open(&mut self) -> Result<()> {
        self.child.open()
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if let Some(tuple) = self.child.next()? {
            let projected = self
                .indices
                .iter()
                .map(|&i| tuple.values[i].clone())
                .collect();
            return Ok(Some(Tuple::new(projected)));
        }
        Ok(None)
    }
}
