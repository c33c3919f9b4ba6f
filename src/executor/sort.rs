use std::cmp::Ordering;

use crate::analyzer::SortKey;
use crate::ast::SortDirection;
use crate::error::Result;
use crate::tuple::{DataType, Value};

use super::{push_bounded, Executor, Tuple};

/// Sort executor for ORDER BY.
///
/// Buffers every row of its child on `open`, then sorts by the keys in order. The sort
/// is stable, so rows whose keys are all equal keep their arrival order.
pub struct SortExecutor<'a> {
    child: Box<dyn Executor + 'a>,
    keys: Vec<SortKey>,
    max_rows: Option<usize>,
    sorted: std::vec::IntoIter<Tuple>,
}

impl<'a> SortExecutor<'a> {
    pub fn new(
        child: Box<dyn Executor + 'a>,
        keys: Vec<SortKey>,
        max_rows: Option<usize>,
    ) -> Self {
        SortExecutor {
            child,
            keys,
            max_rows,
            sorted: Vec::new().into_iter(),
        }
    }
}

fn compare_key(key: &SortKey, a: &Value, b: &Value) -> Ordering {
    let ordering = match (key.data_type, a, b) {
        (DataType::Integer, Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (DataType::String, Value::String(x), Value::String(y)) => {
            x.as_bytes().cmp(y.as_bytes())
        }
        _ => Ordering::Equal,
    };
    match key.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

pub fn compare_rows(keys: &[SortKey], a: &Tuple, b: &Tuple) -> Ordering {
    keys.iter()
        .map(|key| compare_key(key, &a.values[key.index], &b.values[key.index]))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl Executor for SortExecutor<'_> {
    fn open(&mut self) -> Result<()> {
        self.child.open()?;
        let mut buffer = Vec::new();
        while let Some(tuple) = self.child.next()? {
            push_bounded(&mut buffer, tuple, self.max_rows)?;
        }
        buffer.sort_by(|a, b| compare_rows(&self.keys, a, b));
        self.sorted = buffer.into_iter();
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        Ok(self.sorted.next())
    }
}
