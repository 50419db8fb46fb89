//! Filter expression builder.
//!
//! Expressions are plain values describing a boolean filter. Nothing is
//! resolved or rendered here; the compiler walks the tree later against a
//! schema registry. Every constructor records the caller's source location
//! so compile errors point at the offending builder call.

use std::panic::Location;

use crate::schema::{Kind, Schema, SqlKind, TableRef};

use super::value::{SqlValue, ToSqlValue};

type Site = &'static Location<'static>;

/// A filter or value expression over declared schemas.
#[derive(Debug, Clone)]
pub struct Expr {
    pub(crate) node: ExprNode,
    pub(crate) location: Site,
}

#[derive(Debug, Clone)]
pub enum ExprNode {
    Literal(SqlValue),
    Column(String),
    Qualified {
        table: TableRef,
        inner: Box<Expr>,
    },
    Param(ParamMarker),
    Not(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    NullCheck {
        test: NullTest,
        operand: Box<Expr>,
    },
    Like {
        operand: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    Between {
        operand: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    InList {
        operand: Box<Expr>,
        items: Vec<Expr>,
        negated: bool,
    },
    Function {
        func: Function,
        arg: Box<Expr>,
    },
    Exists(Box<SubQuery>),
}

/// A runtime parameter marker.
#[derive(Debug, Clone)]
pub struct ParamMarker {
    /// Identifier used for reuse detection; anonymous markers never merge.
    pub(crate) name: Option<String>,
    pub(crate) kind: Kind,
    /// Captured value; `None` means the value is supplied at call time.
    pub(crate) value: Option<SqlValue>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Concat,
}

impl BinaryOp {
    pub(crate) const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Concat => "||",
        }
    }
}

/// Null tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullTest {
    IsSome,
    IsNone,
    IsNull,
    IsNotNull,
}

/// Scalar functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Lower,
    Upper,
    Length,
    Abs,
}

impl Function {
    pub(crate) const fn name(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Length => "length",
            Self::Abs => "abs",
        }
    }
}

/// A nested `where` over another schema, used inside [`exists`].
#[derive(Debug, Clone)]
pub struct SubQuery {
    pub(crate) table: TableRef,
    pub(crate) filter: Expr,
    pub(crate) location: Site,
}

impl SubQuery {
    /// Returns the name of the nested table.
    #[must_use]
    pub const fn table(&self) -> &'static str {
        self.table.name()
    }

    /// Returns where the nested query was built.
    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

/// Conversion into an expression operand.
///
/// Implemented for [`Expr`] and for literal Rust values, which become inline
/// SQL literals.
pub trait IntoExpr {
    /// Converts `self`, attributing literals to `location`.
    fn into_expr(self, location: &'static Location<'static>) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self, _location: Site) -> Expr {
        self
    }
}

macro_rules! impl_into_expr_literal {
    ($($ty:ty),+) => {
        $(
            impl IntoExpr for $ty {
                fn into_expr(self, location: Site) -> Expr {
                    Expr::new(ExprNode::Literal(self.to_sql_value()), location)
                }
            }
        )+
    };
}

impl_into_expr_literal!(&str, String, i64, i32, f64, bool);

/// Creates a bare column reference, resolved against the current table.
///
/// The names `true` and `false` are reserved and always mean the boolean
/// literals.
#[track_caller]
#[must_use]
pub fn col(name: &str) -> Expr {
    Expr::new(ExprNode::Column(String::from(name)), Location::caller())
}

/// Creates a column reference qualified by table `T`.
///
/// `T` must be in scope wherever the reference is compiled.
#[track_caller]
#[must_use]
pub fn column<T: Schema>(name: &str) -> Expr {
    qualified::<T>(col(name))
}

/// Resolves `expr` against table `T` instead of the current table.
#[track_caller]
#[must_use]
pub fn qualified<T: Schema>(expr: Expr) -> Expr {
    Expr::new(
        ExprNode::Qualified {
            table: TableRef::of::<T>(),
            inner: Box::new(expr),
        },
        Location::caller(),
    )
}

/// Creates an inline literal.
#[track_caller]
#[must_use]
pub fn lit(value: impl IntoExpr) -> Expr {
    value.into_expr(Location::caller())
}

/// Creates a named runtime parameter of kind `T::KIND`.
///
/// Its value is supplied when the query is bound. Every use of the same name
/// within one query shares a single position.
#[track_caller]
#[must_use]
pub fn param<T: SqlKind>(name: &str) -> Expr {
    Expr::param(Some(String::from(name)), T::KIND, None)
}

/// Captures a value under a name.
///
/// Later uses of the same name reuse the first position (and its value).
#[track_caller]
#[must_use]
pub fn var<T: SqlKind + ToSqlValue>(name: &str, value: T) -> Expr {
    Expr::param(Some(String::from(name)), T::KIND, Some(value.to_sql_value()))
}

/// Captures an anonymous value. Each call gets its own position.
#[track_caller]
#[must_use]
pub fn val<T: SqlKind + ToSqlValue>(value: T) -> Expr {
    Expr::param(None, T::KIND, Some(value.to_sql_value()))
}

/// Starts a nested `where` over table `T`.
///
/// Inside `filter`, bare columns resolve against `T` and the enclosing tables
/// stay reachable through qualified references.
#[track_caller]
#[must_use]
pub fn filter<T: Schema>(filter: Expr) -> SubQuery {
    SubQuery {
        table: TableRef::of::<T>(),
        filter,
        location: Location::caller(),
    }
}

/// Tests whether a nested query matches at least one row.
#[track_caller]
#[must_use]
pub fn exists(query: SubQuery) -> Expr {
    Expr::new(ExprNode::Exists(Box::new(query)), Location::caller())
}

/// `lower(expr)`.
#[track_caller]
#[must_use]
pub fn lower(expr: impl IntoExpr) -> Expr {
    Expr::function(Function::Lower, expr, Location::caller())
}

/// `upper(expr)`.
#[track_caller]
#[must_use]
pub fn upper(expr: impl IntoExpr) -> Expr {
    Expr::function(Function::Upper, expr, Location::caller())
}

/// `length(expr)`.
#[track_caller]
#[must_use]
pub fn length(expr: impl IntoExpr) -> Expr {
    Expr::function(Function::Length, expr, Location::caller())
}

/// `abs(expr)`.
#[track_caller]
#[must_use]
pub fn abs(expr: impl IntoExpr) -> Expr {
    Expr::function(Function::Abs, expr, Location::caller())
}

impl Expr {
    const fn new(node: ExprNode, location: Site) -> Self {
        Self { node, location }
    }

    #[track_caller]
    fn param(name: Option<String>, kind: Kind, value: Option<SqlValue>) -> Self {
        Self::new(ExprNode::Param(ParamMarker { name, kind, value }), Location::caller())
    }

    fn function(func: Function, arg: impl IntoExpr, location: Site) -> Self {
        Self::new(
            ExprNode::Function {
                func,
                arg: Box::new(arg.into_expr(location)),
            },
            location,
        )
    }

    fn binary(self, op: BinaryOp, rhs: impl IntoExpr, location: Site) -> Self {
        Self::new(
            ExprNode::Binary {
                op,
                lhs: Box::new(self),
                rhs: Box::new(rhs.into_expr(location)),
            },
            location,
        )
    }

    fn null_check(self, test: NullTest, location: Site) -> Self {
        Self::new(
            ExprNode::NullCheck {
                test,
                operand: Box::new(self),
            },
            location,
        )
    }

    fn like_impl(self, pattern: impl IntoExpr, negated: bool, location: Site) -> Self {
        Self::new(
            ExprNode::Like {
                operand: Box::new(self),
                pattern: Box::new(pattern.into_expr(location)),
                negated,
            },
            location,
        )
    }

    fn between_impl(
        self,
        low: impl IntoExpr,
        high: impl IntoExpr,
        negated: bool,
        location: Site,
    ) -> Self {
        Self::new(
            ExprNode::Between {
                operand: Box::new(self),
                low: Box::new(low.into_expr(location)),
                high: Box::new(high.into_expr(location)),
                negated,
            },
            location,
        )
    }

    fn in_list_impl<V: IntoExpr>(
        self,
        items: impl IntoIterator<Item = V>,
        negated: bool,
        location: Site,
    ) -> Self {
        Self::new(
            ExprNode::InList {
                operand: Box::new(self),
                items: items.into_iter().map(|v| v.into_expr(location)).collect(),
                negated,
            },
            location,
        )
    }

    /// Returns where this expression was built.
    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Creates an equality expression.
    #[track_caller]
    #[must_use]
    pub fn eq(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Eq, rhs, Location::caller())
    }

    /// Creates an inequality expression.
    #[track_caller]
    #[must_use]
    pub fn ne(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Ne, rhs, Location::caller())
    }

    /// Creates a less-than expression.
    #[track_caller]
    #[must_use]
    pub fn lt(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Lt, rhs, Location::caller())
    }

    /// Creates a less-than-or-equal expression.
    #[track_caller]
    #[must_use]
    pub fn le(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Le, rhs, Location::caller())
    }

    /// Creates a greater-than expression.
    #[track_caller]
    #[must_use]
    pub fn gt(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Gt, rhs, Location::caller())
    }

    /// Creates a greater-than-or-equal expression.
    #[track_caller]
    #[must_use]
    pub fn ge(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Ge, rhs, Location::caller())
    }

    /// Creates an AND expression.
    #[track_caller]
    #[must_use]
    pub fn and(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::And, rhs, Location::caller())
    }

    /// Creates an OR expression.
    #[track_caller]
    #[must_use]
    pub fn or(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Or, rhs, Location::caller())
    }

    /// Negates the expression with NOT.
    #[track_caller]
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(ExprNode::Not(Box::new(self)), Location::caller())
    }

    /// Creates an addition.
    #[track_caller]
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Add, rhs, Location::caller())
    }

    /// Creates a subtraction.
    #[track_caller]
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn sub(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Sub, rhs, Location::caller())
    }

    /// Creates a multiplication.
    #[track_caller]
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn mul(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Mul, rhs, Location::caller())
    }

    /// Creates a division.
    #[track_caller]
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn div(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Div, rhs, Location::caller())
    }

    /// Creates a remainder.
    #[track_caller]
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn rem(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Rem, rhs, Location::caller())
    }

    /// Creates a text concatenation (`||`).
    #[track_caller]
    #[must_use]
    pub fn concat(self, rhs: impl IntoExpr) -> Self {
        self.binary(BinaryOp::Concat, rhs, Location::caller())
    }

    /// Creates a LIKE expression.
    #[track_caller]
    #[must_use]
    pub fn like(self, pattern: impl IntoExpr) -> Self {
        self.like_impl(pattern, false, Location::caller())
    }

    /// Creates a NOT LIKE expression.
    #[track_caller]
    #[must_use]
    pub fn not_like(self, pattern: impl IntoExpr) -> Self {
        self.like_impl(pattern, true, Location::caller())
    }

    /// Creates a BETWEEN expression.
    #[track_caller]
    #[must_use]
    pub fn between(self, low: impl IntoExpr, high: impl IntoExpr) -> Self {
        self.between_impl(low, high, false, Location::caller())
    }

    /// Creates a NOT BETWEEN expression.
    #[track_caller]
    #[must_use]
    pub fn not_between(self, low: impl IntoExpr, high: impl IntoExpr) -> Self {
        self.between_impl(low, high, true, Location::caller())
    }

    /// Creates an IN expression.
    #[track_caller]
    #[must_use]
    pub fn in_list<V: IntoExpr>(self, items: impl IntoIterator<Item = V>) -> Self {
        self.in_list_impl(items, false, Location::caller())
    }

    /// Creates a NOT IN expression.
    #[track_caller]
    #[must_use]
    pub fn not_in_list<V: IntoExpr>(self, items: impl IntoIterator<Item = V>) -> Self {
        self.in_list_impl(items, true, Location::caller())
    }

    /// Null check on a nullable column, rendered as `IS NULL`.
    ///
    /// The polarity is inverted relative to the name: this mirrors how
    /// nullable columns have always been queried by this builder and must not
    /// be "fixed". Use [`Expr::is_not_null`] for the plain SQL meaning.
    #[track_caller]
    #[must_use]
    pub fn is_some(self) -> Self {
        self.null_check(NullTest::IsSome, Location::caller())
    }

    /// Null check on a nullable column, rendered as `IS NOT NULL`.
    ///
    /// Inverted relative to the name, see [`Expr::is_some`].
    #[track_caller]
    #[must_use]
    pub fn is_none(self) -> Self {
        self.null_check(NullTest::IsNone, Location::caller())
    }

    /// Creates an IS NULL expression.
    #[track_caller]
    #[must_use]
    pub fn is_null(self) -> Self {
        self.null_check(NullTest::IsNull, Location::caller())
    }

    /// Creates an IS NOT NULL expression.
    #[track_caller]
    #[must_use]
    pub fn is_not_null(self) -> Self {
        self.null_check(NullTest::IsNotNull, Location::caller())
    }
}
