//! WHERE expression trees.
//!
//! Nodes live in a flat arena owned by the tree and point at each other through
//! [`NodeId`]s, so the parent/left/right links never form ownership cycles.
//!
//! The tree is built without an operator stack. Each operand is hung as the right
//! child of the current node. Each binary operator then climbs from the current
//! leaf towards the root while the parent binds at least as tightly (or is a closed
//! parenthesized group), and is spliced in above the node where climbing stopped.
//! An open parenthesis that is still unmatched on the left spine of the climbing
//! node is a hard boundary.

use std::fmt;

use crate::ast::Column;
use crate::lexer::Token;
use crate::tuple::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Mul,
    Div,
    Add,
    Sub,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOperator {
    pub fn from_token(token: &Token) -> Option<Self> {
        let op = match token {
            Token::Asterisk => BinaryOperator::Mul,
            Token::Slash => BinaryOperator::Div,
            Token::Plus => BinaryOperator::Add,
            Token::Minus => BinaryOperator::Sub,
            Token::Eq => BinaryOperator::Eq,
            Token::Ne => BinaryOperator::Ne,
            Token::Lt => BinaryOperator::Lt,
            Token::Le => BinaryOperator::Le,
            Token::Gt => BinaryOperator::Gt,
            Token::Ge => BinaryOperator::Ge,
            Token::And => BinaryOperator::And,
            Token::Or => BinaryOperator::Or,
            _ => return None,
        };
        Some(op)
    }

    /// Lower binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Mul | BinaryOperator::Div => 1,
            BinaryOperator::Add | BinaryOperator::Sub => 2,
            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => 3,
            BinaryOperator::And => 4,
            BinaryOperator::Or => 5,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One operand or operator of a WHERE expression.
///
/// A leaf has no operator and no children; it holds either a column reference or a
/// literal. An internal node has an operator and both children.
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub operator: Option<BinaryOperator>,
    pub column: Option<Column>,
    /// +1 or -1, applied to integer column values. Literals are stored already signed.
    pub sign: i64,
    pub literal: Option<Value>,
    // Builder bookkeeping.
    pub(crate) open_parens: u32,
    pub(crate) in_paren: bool,
}

impl ExpressionNode {
    fn leaf() -> Self {
        ExpressionNode {
            parent: None,
            left: None,
            right: None,
            operator: None,
            column: None,
            sign: 1,
            literal: None,
            open_parens: 0,
            in_paren: false,
        }
    }

    fn operator(op: BinaryOperator) -> Self {
        ExpressionNode {
            operator: Some(op),
            ..ExpressionNode::leaf()
        }
    }
}

/// Incrementally builds an [`ExpressionTree`] while the parser walks the tokens.
#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    nodes: Vec<ExpressionNode>,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        ExpressionBuilder { nodes: Vec::new() }
    }

    fn push(&mut self, node: ExpressionNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> &ExpressionNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut ExpressionNode {
        &mut self.nodes[id.0]
    }

    /// Allocates a leaf and hangs it as the right child of `current`.
    pub fn attach_operand(&mut self, current: Option<NodeId>) -> NodeId {
        let id = self.push(ExpressionNode::leaf());
        if let Some(current) = current {
            self.node_mut(current).right = Some(id);
            self.node_mut(id).parent = Some(current);
        }
        id
    }

    pub fn open_paren(&mut self, leaf: NodeId) {
        self.node_mut(leaf).open_parens += 1;
    }

    // First node on the left spine starting at `start` that still has an unmatched `(`.
    fn unmatched_open(&self, start: NodeId) -> Option<NodeId> {
        let mut searched = Some(start);
        while let Some(id) = searched {
            if self.node(id).open_parens > 0 {
                return Some(id);
            }
            searched = self.node(id).left;
        }
        None
    }

    /// Matches one `)` read after `leaf` with the nearest enclosing unmatched `(`.
    /// A `)` without a partner is ignored.
    pub fn close_paren(&mut self, leaf: NodeId) {
        // `(x)` around a single operand.
        if self.node(leaf).open_parens > 0 {
            self.node_mut(leaf).open_parens -= 1;
            return;
        }
        let mut ancestor = self.node(leaf).parent;
        while let Some(id) = ancestor {
            if let Some(open) = self.unmatched_open(id) {
                self.node_mut(open).open_parens -= 1;
                self.node_mut(id).in_paren = true;
                return;
            }
            ancestor = self.node(id).parent;
        }
    }

    /// Splices a new operator node above the point found by climbing from `current`,
    /// which becomes its left child. Returns the new node.
    pub fn insert_operator(&mut self, current: NodeId, op: BinaryOperator) -> NodeId {
        let mut tmp = current;
        while self.unmatched_open(tmp).is_none() {
            let Some(parent) = self.node(tmp).parent else {
                break;
            };
            let parent_node = self.node(parent);
            let climbs = parent_node.in_paren
                || parent_node
                    .operator
                    .is_some_and(|p| p.precedence() <= op.precedence());
            if !climbs {
                break;
            }
            tmp = parent;
        }

        let new = self.push(ExpressionNode::operator(op));
        let old_parent = self.node(tmp).parent;
        self.node_mut(new).parent = old_parent;
        if let Some(parent) = old_parent {
            self.node_mut(parent).right = Some(new);
        }
        self.node_mut(new).left = Some(tmp);
        self.node_mut(tmp).parent = Some(new);
        new
    }

    /// Finds the root by walking up from `current`.
    pub fn finish(self, current: NodeId) -> ExpressionTree {
        let mut root = current;
        while let Some(parent) = self.node(root).parent {
            root = parent;
        }
        ExpressionTree {
            nodes: self.nodes,
            root,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionTree {
    nodes: Vec<ExpressionNode>,
    root: NodeId,
}

impl ExpressionTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ExpressionNode {
        &self.nodes[id.0]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ExpressionNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId(i), node))
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node(id);
        match (node.operator, node.left, node.right) {
            (Some(op), Some(left), Some(right)) => {
                f.write_str("(")?;
                self.fmt_node(left, f)?;
                write!(f, " {op} ")?;
                self.fmt_node(right, f)?;
                f.write_str(")")
            }
            _ => {
                if let Some(column) = &node.column {
                    if node.sign < 0 {
                        f.write_str("-")?;
                    }
                    write!(f, "{column}")
                } else {
                    match &node.literal {
                        Some(Value::String(s)) => write!(f, "'{s}'"),
                        Some(value) => write!(f, "{value}"),
                        None => f.write_str("?"),
                    }
                }
            }
        }
    }
}

/// Fully parenthesized infix form, e.g. `(Integer = ((2 * 1) + 1))`.
impl fmt::Display for ExpressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(builder: &mut ExpressionBuilder, current: Option<NodeId>, n: i64) -> NodeId {
        let id = builder.attach_operand(current);
        builder.node_mut(id).literal = Some(Value::Integer(n));
        id
    }

    #[test]
    fn test_precedence_table() {
        assert!(BinaryOperator::Mul.precedence() < BinaryOperator::Add.precedence());
        assert_eq!(
            BinaryOperator::Mul.precedence(),
            BinaryOperator::Div.precedence()
        );
        assert!(BinaryOperator::Sub.precedence() < BinaryOperator::Ge.precedence());
        assert!(BinaryOperator::Ne.precedence() < BinaryOperator::And.precedence());
        assert!(BinaryOperator::And.precedence() < BinaryOperator::Or.precedence());
        assert_eq!(BinaryOperator::from_token(&Token::Comma), None);
        assert_eq!(
            BinaryOperator::from_token(&Token::Asterisk),
            Some(BinaryOperator::Mul)
        );
    }

    #[test]
    fn test_tighter_operator_goes_below() {
        // 1 + 2 * 3
        let mut b = ExpressionBuilder::new();
        let one = literal(&mut b, None, 1);
        let plus = b.insert_operator(one, BinaryOperator::Add);
        let two = literal(&mut b, Some(plus), 2);
        let mul = b.insert_operator(two, BinaryOperator::Mul);
        let three = literal(&mut b, Some(mul), 3);
        let tree = b.finish(three);
        assert_eq!(tree.root(), plus);
        assert_eq!(tree.to_string(), "(1 + (2 * 3))");
    }

    #[test]
    fn test_equal_precedence_is_left_associative() {
        // 1 - 2 + 3
        let mut b = ExpressionBuilder::new();
        let one = literal(&mut b, None, 1);
        let sub = b.insert_operator(one, BinaryOperator::Sub);
        let two = literal(&mut b, Some(sub), 2);
        let add = b.insert_operator(two, BinaryOperator::Add);
        let three = literal(&mut b, Some(add), 3);
        let tree = b.finish(three);
        assert_eq!(tree.root(), add);
        assert_eq!(tree.to_string(), "((1 - 2) + 3)");
    }

    #[test]
    fn test_open_paren_stops_climbing() {
        // 1 * (2 + 3)
        let mut b = ExpressionBuilder::new();
        let one = literal(&mut b, None, 1);
        let mul = b.insert_operator(one, BinaryOperator::Mul);
        let two = literal(&mut b, Some(mul), 2);
        b.open_paren(two);
        let add = b.insert_operator(two, BinaryOperator::Add);
        let three = literal(&mut b, Some(add), 3);
        b.close_paren(three);
        let tree = b.finish(three);
        assert_eq!(tree.to_string(), "(1 * (2 + 3))");
        assert!(tree.node(add).in_paren);
        assert_eq!(tree.node(two).open_parens, 0);
    }

    #[test]
    fn test_closed_group_is_climbed_past() {
        // (1 + 2) * 3
        let mut b = ExpressionBuilder::new();
        let one = literal(&mut b, None, 1);
        b.open_paren(one);
        let add = b.insert_operator(one, BinaryOperator::Add);
        let two = literal(&mut b, Some(add), 2);
        b.close_paren(two);
        let mul = b.insert_operator(two, BinaryOperator::Mul);
        let three = literal(&mut b, Some(mul), 3);
        let tree = b.finish(three);
        assert_eq!(tree.root(), mul);
        assert_eq!(tree.to_string(), "((1 + 2) * 3)");
    }

    #[test]
    fn test_parenthesized_single_operand() {
        // (1) * 2 + 3
        let mut b = ExpressionBuilder::new();
        let one = literal(&mut b, None, 1);
        b.open_paren(one);
        b.close_paren(one);
        let mul = b.insert_operator(one, BinaryOperator::Mul);
        let two = literal(&mut b, Some(mul), 2);
        let add = b.insert_operator(two, BinaryOperator::Add);
        let three = literal(&mut b, Some(add), 3);
        let tree = b.finish(three);
        assert_eq!(tree.root(), add);
        assert_eq!(tree.to_string(), "((1 * 2) + 3)");
    }

    #[test]
    fn test_unmatched_close_paren_is_ignored() {
        let mut b = ExpressionBuilder::new();
        let one = literal(&mut b, None, 1);
        b.close_paren(one);
        let tree = b.finish(one);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(tree.root()).operator, None);
    }
}
