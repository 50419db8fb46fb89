//! Compiled expression fragments.

use std::borrow::Cow;
use std::fmt::Write;

use crate::schema::Kind;

/// Binding strength used to decide where parentheses are needed.
pub mod precedence {
    pub const OR: u8 = 1;
    pub const AND: u8 = 2;
    pub const NOT: u8 = 3;
    pub const COMPARISON: u8 = 4;
    pub const ADDITIVE: u8 = 6;
    pub const MULTIPLICATIVE: u8 = 7;
    pub const CONCAT: u8 = 8;
    pub const ATOM: u8 = 10;
}

/// A compiled fragment together with its result kind.
///
/// Composition is textual: a `Formatted` node interpolates its already
/// compiled arguments into `{}` holes of its pattern, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal {
        kind: Kind,
        text: String,
    },
    Column {
        table: &'static str,
        column: &'static str,
        kind: Kind,
    },
    Parameter {
        position: usize,
        kind: Kind,
    },
    Formatted {
        pattern: Cow<'static, str>,
        args: Vec<Node>,
        kind: Kind,
        precedence: u8,
    },
}

impl Node {
    pub fn formatted(
        pattern: impl Into<Cow<'static, str>>,
        args: Vec<Self>,
        kind: Kind,
        precedence: u8,
    ) -> Self {
        Self::Formatted {
            pattern: pattern.into(),
            args,
            kind,
            precedence,
        }
    }

    pub const fn kind(&self) -> Kind {
        match self {
            Self::Literal { kind, .. }
            | Self::Column { kind, .. }
            | Self::Parameter { kind, .. }
            | Self::Formatted { kind, .. } => *kind,
        }
    }

    pub const fn precedence(&self) -> u8 {
        match self {
            Self::Formatted { precedence, .. } => *precedence,
            _ => precedence::ATOM,
        }
    }

    /// Wraps the node in parentheses if it binds looser than `min`.
    pub fn operand(self, min: u8) -> Self {
        if self.precedence() >= min {
            return self;
        }
        let kind = self.kind();
        Self::formatted("({})", vec![self], kind, precedence::ATOM)
    }

    /// Short name for diagnostics: the column name, or the rendered text.
    pub fn describe(&self) -> String {
        match self {
            Self::Column { column, .. } => (*column).to_string(),
            other => other.render(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Self::Literal { text, .. } => out.push_str(text),
            Self::Column { table, column, .. } => {
                out.push_str(table);
                out.push('.');
                out.push_str(column);
            }
            Self::Parameter { position, .. } => {
                let _ = write!(out, "?{position}");
            }
            Self::Formatted { pattern, args, .. } => {
                let mut pieces = pattern.split("{}");
                if let Some(head) = pieces.next() {
                    out.push_str(head);
                }
                for (piece, arg) in pieces.zip(args) {
                    arg.write_to(out);
                    out.push_str(piece);
                }
            }
        }
    }
}
