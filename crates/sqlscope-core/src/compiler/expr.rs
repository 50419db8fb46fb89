//! Expression compiler.
//!
//! Walks an [`Expr`] tree, resolving bare columns against the current table
//! and qualified references against the tables in scope, checking operand
//! kinds and assigning parameter positions.

use std::panic::Location;

use super::arena::ParamArena;
use super::node::{precedence, Node};
use crate::builder::{BinaryOp, Expr, ExprNode, Function, NullTest, SqlValue, SubQuery};
use crate::error::{Error, Result};
use crate::schema::{Kind, SchemaDescriptor, SchemaRegistry, TableRef};

type Site = &'static Location<'static>;

/// Tables whose columns are reachable from the subtree being compiled.
///
/// Each nested query pushes a frame on the stack; frames are dropped when the
/// recursion unwinds.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    table: TableRef,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    pub const fn root(table: TableRef) -> Self {
        Self {
            table,
            parent: None,
        }
    }

    fn push(&self, table: TableRef) -> Scope<'_> {
        Scope {
            table,
            parent: Some(self),
        }
    }

    fn contains(&self, table: &TableRef) -> bool {
        self.table == *table || self.parent.is_some_and(|parent| parent.contains(table))
    }
}

pub struct Compiler<'r> {
    registry: &'r SchemaRegistry,
    arena: ParamArena,
}

impl<'r> Compiler<'r> {
    pub const fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            arena: ParamArena::new(),
        }
    }

    pub fn into_arena(self) -> ParamArena {
        self.arena
    }

    /// Compiles a complete filter: a boolean expression that is not a bare
    /// boolean literal.
    pub fn compile_filter(
        &mut self,
        filter: &Expr,
        current: &SchemaDescriptor,
        scope: &Scope<'_>,
    ) -> Result<Node> {
        if is_bare_boolean(filter) {
            return Err(Error::Guard {
                message: String::from("a boolean literal cannot be used as a complete filter"),
                location: filter.location,
            });
        }
        let node = self.compile(filter, current, scope)?;
        expect_boolean(&node, "filter", filter.location)?;
        Ok(node)
    }

    fn compile(
        &mut self,
        expr: &Expr,
        current: &SchemaDescriptor,
        scope: &Scope<'_>,
    ) -> Result<Node> {
        let location = expr.location;
        match &expr.node {
            ExprNode::Literal(value) => literal(value, location),
            ExprNode::Column(name) => resolve_column(name, current, location),
            ExprNode::Qualified { table, inner } => {
                if !scope.contains(table) {
                    return Err(Error::NotAccessible {
                        table: table.name().to_string(),
                        location,
                    });
                }
                let descriptor = self.registry.register_table(*table)?;
                self.compile(inner, &descriptor, scope)
            }
            ExprNode::Param(marker) => {
                let position = self.arena.slot(marker, location)?;
                Ok(Node::Parameter {
                    position,
                    kind: marker.kind,
                })
            }
            ExprNode::Not(operand) => {
                let operand = self.compile(operand, current, scope)?;
                expect_boolean(&operand, "NOT", location)?;
                let kind = carry_null(Kind::Boolean, &[&operand]);
                Ok(Node::formatted(
                    "NOT {}",
                    vec![operand.operand(precedence::NOT)],
                    kind,
                    precedence::NOT,
                ))
            }
            ExprNode::Binary { op, lhs, rhs } => {
                let lhs = self.compile(lhs, current, scope)?;
                let rhs = self.compile(rhs, current, scope)?;
                binary(*op, lhs, rhs, location)
            }
            ExprNode::NullCheck { test, operand } => {
                let operand = self.compile(operand, current, scope)?;
                null_check(*test, operand, location)
            }
            ExprNode::Like {
                operand,
                pattern,
                negated,
            } => self.like(operand, pattern, *negated, current, scope, location),
            ExprNode::Between {
                operand,
                low,
                high,
                negated,
            } => {
                let operand = self.compile(operand, current, scope)?;
                let low = self.compile(low, current, scope)?;
                let high = self.compile(high, current, scope)?;
                between(operand, low, high, *negated, location)
            }
            ExprNode::InList {
                operand,
                items,
                negated,
            } => self.in_list(operand, items, *negated, current, scope, location),
            ExprNode::Function { func, arg } => {
                let arg = self.compile(arg, current, scope)?;
                function(*func, arg, location)
            }
            ExprNode::Exists(query) => self.exists(query, scope),
        }
    }

    fn like(
        &mut self,
        operand: &Expr,
        pattern: &Expr,
        negated: bool,
        current: &SchemaDescriptor,
        scope: &Scope<'_>,
        location: Site,
    ) -> Result<Node> {
        let operand = self.compile(operand, current, scope)?;
        let pattern = self.compile(pattern, current, scope)?;
        let context = if negated { "NOT LIKE" } else { "LIKE" };
        expect_base(&operand, context, Kind::Text, location)?;
        expect_base(&pattern, context, Kind::Text, location)?;
        let kind = carry_null(Kind::Boolean, &[&operand, &pattern]);
        Ok(Node::formatted(
            if negated { "{} NOT LIKE {}" } else { "{} LIKE {}" },
            vec![comparison_operand(operand), comparison_operand(pattern)],
            kind,
            precedence::COMPARISON,
        ))
    }

    fn in_list(
        &mut self,
        operand: &Expr,
        items: &[Expr],
        negated: bool,
        current: &SchemaDescriptor,
        scope: &Scope<'_>,
        location: Site,
    ) -> Result<Node> {
        let context = if negated { "NOT IN" } else { "IN" };
        if items.is_empty() {
            return Err(Error::Guard {
                message: format!("{context} needs at least one item"),
                location,
            });
        }
        let operand = self.compile(operand, current, scope)?;
        let mut args = Vec::with_capacity(items.len() + 1);
        let mut kind = carry_null(Kind::Boolean, &[&operand]);
        for item in items {
            let item = self.compile(item, current, scope)?;
            expect_comparable(&operand, &item, context, location)?;
            kind = carry_null(kind, &[&item]);
            args.push(item);
        }
        let holes = vec!["{}"; args.len()].join(", ");
        args.insert(0, comparison_operand(operand));
        Ok(Node::formatted(
            format!("{{}} {context} ({holes})"),
            args,
            kind,
            precedence::COMPARISON,
        ))
    }

    fn exists(&mut self, query: &SubQuery, scope: &Scope<'_>) -> Result<Node> {
        let descriptor = self.registry.register_table(query.table)?;
        let nested = scope.push(query.table);
        let filter = self.compile_filter(&query.filter, &descriptor, &nested)?;
        Ok(Node::formatted(
            format!(
                "EXISTS(SELECT 1 FROM {} WHERE {{}} LIMIT 1)",
                descriptor.name()
            ),
            vec![filter],
            Kind::Boolean,
            precedence::ATOM,
        ))
    }
}

fn is_bare_boolean(expr: &Expr) -> bool {
    match &expr.node {
        ExprNode::Literal(SqlValue::Bool(_)) => true,
        ExprNode::Column(name) => is_boolean_keyword(name),
        ExprNode::Qualified { inner, .. } => is_bare_boolean(inner),
        _ => false,
    }
}

fn is_boolean_keyword(name: &str) -> bool {
    name == "true" || name == "false"
}

fn literal(value: &SqlValue, location: Site) -> Result<Node> {
    let kind = match value {
        SqlValue::Bool(_) => Kind::Boolean,
        SqlValue::Int(_) => Kind::Integer,
        SqlValue::Float(f) if !f.is_finite() => {
            return Err(Error::Guard {
                message: format!("the REAL literal {f} has no SQL spelling, use a parameter"),
                location,
            })
        }
        SqlValue::Float(_) => Kind::Real,
        SqlValue::Text(_) => Kind::Text,
        SqlValue::Blob(_) => Kind::Blob,
        SqlValue::Null => {
            return Err(Error::Guard {
                message: String::from(
                    "an untyped NULL literal cannot be compiled, use a nullable parameter",
                ),
                location,
            })
        }
    };
    Ok(Node::Literal {
        kind,
        text: value.to_sql_inline(),
    })
}

fn resolve_column(name: &str, current: &SchemaDescriptor, location: Site) -> Result<Node> {
    if is_boolean_keyword(name) {
        return literal(&SqlValue::Bool(name == "true"), location);
    }
    let column = current.column(name).ok_or_else(|| Error::UnknownColumn {
        column: name.to_string(),
        table: current.name().to_string(),
        location,
    })?;
    Ok(Node::Column {
        table: current.name(),
        column: column.name,
        kind: column.kind,
    })
}

fn binary(op: BinaryOp, lhs: Node, rhs: Node, location: Site) -> Result<Node> {
    let context = op.symbol();
    let (kind, precedence) = match op {
        BinaryOp::Eq | BinaryOp::Ne => {
            expect_comparable(&lhs, &rhs, context, location)?;
            (Kind::Boolean, precedence::COMPARISON)
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            expect_orderable(&lhs, context, location)?;
            expect_comparable(&lhs, &rhs, context, location)?;
            (Kind::Boolean, precedence::COMPARISON)
        }
        BinaryOp::And | BinaryOp::Or => {
            expect_boolean(&lhs, context, location)?;
            expect_boolean(&rhs, context, location)?;
            let precedence = if op == BinaryOp::And {
                precedence::AND
            } else {
                precedence::OR
            };
            (Kind::Boolean, precedence)
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            expect_numeric(&lhs, context, location)?;
            expect_numeric(&rhs, context, location)?;
            let kind = if lhs.kind().base() == Kind::Real || rhs.kind().base() == Kind::Real {
                Kind::Real
            } else {
                Kind::Integer
            };
            let precedence = if matches!(op, BinaryOp::Add | BinaryOp::Sub) {
                precedence::ADDITIVE
            } else {
                precedence::MULTIPLICATIVE
            };
            (kind, precedence)
        }
        BinaryOp::Concat => {
            expect_base(&lhs, context, Kind::Text, location)?;
            expect_base(&rhs, context, Kind::Text, location)?;
            (Kind::Text, precedence::CONCAT)
        }
    };

    let kind = carry_null(kind, &[&lhs, &rhs]);
    // Comparisons do not chain; everything else is left-associative.
    let (lhs_min, rhs_min) = if precedence == precedence::COMPARISON {
        (precedence + 1, precedence + 1)
    } else {
        (precedence, precedence + 1)
    };
    Ok(Node::formatted(
        format!("{{}} {context} {{}}"),
        vec![lhs.operand(lhs_min), rhs.operand(rhs_min)],
        kind,
        precedence,
    ))
}

fn between(operand: Node, low: Node, high: Node, negated: bool, location: Site) -> Result<Node> {
    let context = if negated { "NOT BETWEEN" } else { "BETWEEN" };
    expect_orderable(&operand, context, location)?;
    expect_comparable(&operand, &low, context, location)?;
    expect_comparable(&operand, &high, context, location)?;
    let kind = carry_null(Kind::Boolean, &[&operand, &low, &high]);
    Ok(Node::formatted(
        if negated {
            "{} NOT BETWEEN {} AND {}"
        } else {
            "{} BETWEEN {} AND {}"
        },
        vec![
            comparison_operand(operand),
            comparison_operand(low),
            comparison_operand(high),
        ],
        kind,
        precedence::COMPARISON,
    ))
}

fn null_check(test: NullTest, operand: Node, location: Site) -> Result<Node> {
    if !operand.kind().is_nullable() {
        return Err(Error::NotNullable {
            column: operand.describe(),
            location,
        });
    }
    // `is_some`/`is_none` keep their historical, inverted rendering.
    let pattern = match test {
        NullTest::IsSome | NullTest::IsNull => "{} IS NULL",
        NullTest::IsNone | NullTest::IsNotNull => "{} IS NOT NULL",
    };
    Ok(Node::formatted(
        pattern,
        vec![comparison_operand(operand)],
        Kind::Boolean,
        precedence::COMPARISON,
    ))
}

fn function(func: Function, arg: Node, location: Site) -> Result<Node> {
    let context = func.name();
    let kind = match func {
        Function::Lower | Function::Upper => {
            expect_base(&arg, context, Kind::Text, location)?;
            Kind::Text
        }
        Function::Length => {
            if !matches!(arg.kind().base(), Kind::Text | Kind::Blob) {
                return Err(type_error(context, "text or blob", arg.kind(), location));
            }
            Kind::Integer
        }
        Function::Abs => {
            expect_numeric(&arg, context, location)?;
            arg.kind().base()
        }
    };
    let kind = carry_null(kind, &[&arg]);
    Ok(Node::formatted(
        format!("{context}({{}})"),
        vec![arg],
        kind,
        precedence::ATOM,
    ))
}

fn comparison_operand(node: Node) -> Node {
    node.operand(precedence::COMPARISON + 1)
}

/// Makes `kind` nullable if any input is.
fn carry_null(kind: Kind, inputs: &[&Node]) -> Kind {
    if inputs.iter().any(|node| node.kind().is_nullable()) {
        kind.nullable()
    } else {
        kind
    }
}

fn type_error(context: &str, expected: &str, found: Kind, location: Site) -> Error {
    Error::Type {
        context: format!("`{context}`"),
        expected: expected.to_string(),
        found: found.to_string(),
        location,
    }
}

fn expect_base(node: &Node, context: &str, expected: Kind, location: Site) -> Result<()> {
    if node.kind().base() == expected {
        Ok(())
    } else {
        Err(type_error(context, &expected.to_string(), node.kind(), location))
    }
}

fn expect_boolean(node: &Node, context: &str, location: Site) -> Result<()> {
    expect_base(node, context, Kind::Boolean, location)
}

fn expect_numeric(node: &Node, context: &str, location: Site) -> Result<()> {
    if node.kind().is_numeric() {
        Ok(())
    } else {
        Err(type_error(context, "integer or real", node.kind(), location))
    }
}

fn expect_orderable(node: &Node, context: &str, location: Site) -> Result<()> {
    if node.kind().is_orderable() {
        Ok(())
    } else {
        Err(type_error(context, "an orderable kind", node.kind(), location))
    }
}

fn expect_comparable(lhs: &Node, rhs: &Node, context: &str, location: Site) -> Result<()> {
    if lhs.kind().is_comparable_with(rhs.kind()) {
        Ok(())
    } else {
        Err(type_error(
            context,
            &lhs.kind().base().to_string(),
            rhs.kind(),
            location,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! for_schema {
        ($ty:ident, $name:literal) => {
            impl crate::schema::Schema for $ty {
                const TABLE: &'static str = $name;
                const COLUMNS: &'static [crate::schema::ColumnDescriptor] =
                    &[crate::schema::ColumnDescriptor::new("id", Kind::Integer)];

                fn to_values(&self) -> Vec<SqlValue> {
                    vec![]
                }

                fn from_values(_: Vec<SqlValue>) -> Result<Self> {
                    Ok(Self)
                }
            }
        };
    }

    #[test]
    fn test_scope_lookup_walks_parents() {
        struct A;
        struct B;
        struct C;
        for_schema!(A, "a");
        for_schema!(B, "b");
        for_schema!(C, "c");

        let root = Scope::root(TableRef::of::<A>());
        let nested = root.push(TableRef::of::<B>());
        assert!(nested.contains(&TableRef::of::<A>()));
        assert!(nested.contains(&TableRef::of::<B>()));
        assert!(!nested.contains(&TableRef::of::<C>()));
        assert!(!root.contains(&TableRef::of::<B>()));
    }

    #[test]
    fn test_literal_kinds() {
        let here = Location::caller();
        assert_eq!(
            literal(&SqlValue::Text(String::from("it's")), here).unwrap(),
            Node::Literal {
                kind: Kind::Text,
                text: String::from("'it''s'"),
            }
        );
        assert_eq!(
            literal(&SqlValue::Bool(true), here).unwrap().kind(),
            Kind::Boolean
        );
        assert!(literal(&SqlValue::Null, here).is_err());
        assert!(matches!(
            literal(&SqlValue::Float(f64::NAN), here),
            Err(Error::Guard { .. })
        ));
    }

    #[test]
    fn test_arithmetic_widens_to_real() {
        let here = Location::caller();
        let int = Node::Parameter {
            position: 1,
            kind: Kind::Integer,
        };
        let real = Node::Parameter {
            position: 2,
            kind: Kind::Real.nullable(),
        };
        let node = binary(BinaryOp::Mul, int, real, here).unwrap();
        assert_eq!(node.kind(), Kind::Real.nullable());
        assert_eq!(node.render(), "?1 * ?2");
    }
}
