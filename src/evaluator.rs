//! Per-row evaluation of a WHERE tree.
//!
//! The tree is shared and never mutated. Each [`Evaluator`] owns the scratch state for one
//! evaluation stream (the value computed at every node and whether it is done yet), so
//! several evaluators may run over the same tree at once.

use std::cmp::Ordering;

use crate::analyzer::Schema;
use crate::error::{Error, Result};
use crate::executor::Tuple;
use crate::expression::{BinaryOperator, ExpressionTree, NodeId};
use crate::tuple::Value;

#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    tree: &'a ExpressionTree,
    // Combined-row index for every column leaf, filled by `bind`.
    bindings: Option<Vec<Option<usize>>>,
    values: Vec<Option<Value>>,
    calculated: Vec<bool>,
}

impl<'a> Evaluator<'a> {
    pub fn new(tree: &'a ExpressionTree) -> Self {
        Evaluator {
            tree,
            bindings: None,
            values: vec![None; tree.len()],
            calculated: vec![false; tree.len()],
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bindings.is_some()
    }

    /// Resolves every column leaf against `schema`.
    pub fn bind(&mut self, schema: &Schema) -> Result<()> {
        let bindings = self
            .tree
            .iter()
            .map(|(_, node)| match &node.column {
                Some(column) if !column.column_name.is_empty() => {
                    schema.resolve(column).map(Some)
                }
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;
        self.bindings = Some(bindings);
        Ok(())
    }

    /// Evaluates the tree against one combined row. The root must produce a boolean.
    pub fn evaluate(&mut self, row: &Tuple) -> Result<bool> {
        self.calculated.fill(false);

        // Post-order walk over the parent links; no stack.
        let tree = self.tree;
        let mut id = tree.root();
        loop {
            let node = tree.node(id);
            if let Some(left) = node.left.filter(|l| !self.calculated[l.index()]) {
                id = left;
                continue;
            }
            if let Some(right) = node.right.filter(|r| !self.calculated[r.index()]) {
                id = right;
                continue;
            }

            let value = self.compute(id, row)?;
            self.values[id.index()] = Some(value);
            self.calculated[id.index()] = true;

            match node.parent {
                Some(parent) => id = parent,
                None => break,
            }
        }

        match &self.values[tree.root().index()] {
            Some(Value::Boolean(b)) => Ok(*b),
            Some(other) => Err(Error::WhereOperandType(format!(
                "WHERE must be boolean, got {}",
                other.data_type()
            ))),
            None => Err(Error::WhereOperandType("WHERE produced no value".into())),
        }
    }

    fn operand(&self, id: Option<NodeId>) -> Result<&Value> {
        id.and_then(|id| self.values[id.index()].as_ref())
            .ok_or_else(|| Error::WhereOperandType("missing operand".into()))
    }

    fn compute(&self, id: NodeId, row: &Tuple) -> Result<Value> {
        let node = self.tree.node(id);
        let Some(op) = node.operator else {
            return self.leaf_value(id, row);
        };
        let left = self.operand(node.left)?;
        let right = self.operand(node.right)?;
        apply(op, left, right)
    }

    fn leaf_value(&self, id: NodeId, row: &Tuple) -> Result<Value> {
        let node = self.tree.node(id);
        let binding = self
            .bindings
            .as_ref()
            .and_then(|bindings| bindings[id.index()]);

        match (&node.column, binding) {
            (Some(_), Some(index)) => match &row.values[index] {
                Value::Integer(n) if node.sign < 0 => n
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or_else(|| Error::WhereOperandType(format!("-({n}) overflows"))),
                value => Ok(value.clone()),
            },
            (Some(column), None) if !column.column_name.is_empty() => Err(
                Error::BadColumnName(format!("{column} was not bound before evaluation")),
            ),
            _ => node
                .literal
                .clone()
                .ok_or_else(|| Error::WhereOperandType("empty operand".into())),
        }
    }
}

fn apply(op: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    use BinaryOperator::*;

    match op {
        Eq | Ne | Lt | Le | Gt | Ge => {
            let ordering = match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
                (Value::String(a), Value::String(b)) => a.as_bytes().cmp(b.as_bytes()),
                _ => return Err(mismatch(op, left, right)),
            };
            let result = match op {
                Eq => ordering == Ordering::Equal,
                Ne => ordering != Ordering::Equal,
                Lt => ordering == Ordering::Less,
                Le => ordering != Ordering::Greater,
                Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Boolean(result))
        }
        Add | Sub | Mul | Div => {
            let (Value::Integer(a), Value::Integer(b)) = (left, right) else {
                return Err(mismatch(op, left, right));
            };
            let result = match op {
                Add => a.checked_add(*b),
                Sub => a.checked_sub(*b),
                Mul => a.checked_mul(*b),
                _ => {
                    if *b == 0 {
                        return Err(Error::WhereOperandType(format!("{a} / 0")));
                    }
                    a.checked_div(*b)
                }
            };
            result
                .map(Value::Integer)
                .ok_or_else(|| Error::WhereOperandType(format!("{a} {op} {b} overflows")))
        }
        And | Or => {
            let (Value::Boolean(a), Value::Boolean(b)) = (left, right) else {
                return Err(mismatch(op, left, right));
            };
            Ok(Value::Boolean(if op == And { *a && *b } else { *a || *b }))
        }
    }
}

fn mismatch(op: BinaryOperator, left: &Value, right: &Value) -> Error {
    Error::WhereOperandType(format!(
        "cannot apply {op} to {} and {}",
        left.data_type(),
        right.data_type()
    ))
}
