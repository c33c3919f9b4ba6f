use crate::error::Result;
use crate::table::InputTable;

use super::{Executor, Tuple};

/// Cross join over any number of tables.
///
/// Keeps one row cursor per table and advances them like the digits of a counter: the
/// last table moves fastest, and a cursor that runs past its table's last row resets to
/// the first row and carries into the table before it. Enumeration ends when the first
/// table's cursor runs out. Each output tuple concatenates the current row of every
/// table in FROM order.
pub struct CrossJoinExecutor<'a> {
    tables: Vec<&'a InputTable>,
    cursors: Vec<usize>,
    exhausted: bool,
}

impl<'a> CrossJoinExecutor<'a> {
    pub fn new(tables: Vec<&'a InputTable>) -> Self {
        let cursors = vec![0; tables.len()];
        CrossJoinExecutor {
            tables,
            cursors,
            exhausted: true,
        }
    }

    fn combine(&self) -> Tuple {
        let width = self.tables.iter().map(|t| t.columns.len()).sum();
        let mut values = Vec::with_capacity(width);
        for (table, &cursor) in self.tables.iter().zip(&self.cursors) {
            values.extend(table.rows[cursor].values.iter().cloned());
        }
        Tuple::new(values)
    }

    fn advance(&mut self) {
        for i in (0..self.tables.len()).rev() {
            self.cursors[i] += 1;
            if self.cursors[i] < self.tables[i].rows.len() {
                return;
            }
            self.cursors[i] = 0;
        }
        // Carried out of the first table.
        self.exhausted = true;
    }
}

impl Executor for CrossJoinExecutor<'_> {
    fn open(&mut self) -> Result<()> {
        self.cursors.fill(0);
        // Any empty table empties the whole product.
        self.exhausted =
            self.tables.is_empty() || self.tables.iter().any(|t| t.rows.is_empty());
        Ok(())
    }

    fn next(&mut self) -> Result<Option<Tuple>> {
        if self.exhausted {
            return Ok(None);
        }
        let tuple = self.combine();
        self.advance();
        Ok(Some(tuple))
    }
}
