use crate::interpreter::Value;

use std::fmt;

use itertools::Itertools;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statements.iter().join(" "))
    }
}

/// A statement plus the source line it starts on; the line is what runtime
/// errors inside the statement are attributed to.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StmtKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Assign {
        slot: usize,
        expr: Expression,
    },
    Print(Expression),
    Read {
        slot: usize,
    },
    If {
        cond: Condition,
        then_body: Vec<Statement>,
        else_body: Vec<Statement>,
    },
    While {
        cond: Condition,
        body: Vec<Statement>,
    },
    Halt,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StmtKind::Assign { slot, expr } => write!(f, "DING {} = {}", slot, expr),
            StmtKind::Print(expr) => write!(f, "VORSTELLUNG {}", expr),
            StmtKind::Read { slot } => write!(f, "WILLE {}", slot),
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                if else_body.is_empty() {
                    write!(f, "WENN {} DANN {} ENDE", cond, then_body.iter().join(" "))
                } else {
                    write!(
                        f,
                        "WENN {} DANN {} SONST {} ENDE",
                        cond,
                        then_body.iter().join(" "),
                        else_body.iter().join(" ")
                    )
                }
            }
            StmtKind::While { cond, body } => {
                write!(f, "SOLANGE {} {} ENDE", cond, body.iter().join(" "))
            }
            StmtKind::Halt => write!(f, "VERNEINUNG"),
        }
    }
}

/// Exactly one comparison per condition; comparisons never appear inside
/// expressions and do not chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub left: Expression,
    pub op: CmpOp,
    pub right: Expression,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[rustfmt::skip]
        let pretty = match self {
            CmpOp::Eq  => "=",
            CmpOp::Neq => "!=",
            CmpOp::Lt  => "<",
            CmpOp::Gt  => ">",
            CmpOp::Le  => "<=",
            CmpOp::Ge  => ">=",
        };

        write!(f, "{}", pretty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Slot(usize),
    Binary {
        op: BinOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(Value::Text(s)) => write!(f, "\"{}\"", s),
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Slot(index) => write!(f, "DING {}", index),
            Expression::Binary { op, left, right } => write!(f, "{} {} {}", left, op, right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        #[rustfmt::skip]
        let pretty = match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "MOD",
        };

        write!(f, "{}", pretty)
    }
}

// Program
pub fn program(statements: Vec<Statement>) -> Program {
    Program { statements }
}

// Statement
pub fn assign(slot: usize, expr: Expression, line: u32) -> Statement {
    Statement {
        kind: StmtKind::Assign { slot, expr },
        line,
    }
}

pub fn print_stmt(expr: Expression, line: u32) -> Statement {
    Statement {
        kind: StmtKind::Print(expr),
        line,
    }
}

pub fn read_stmt(slot: usize, line: u32) -> Statement {
    Statement {
        kind: StmtKind::Read { slot },
        line,
    }
}

pub fn if_stmt(
    cond: Condition,
    then_body: Vec<Statement>,
    else_body: Vec<Statement>,
    line: u32,
) -> Statement {
    Statement {
        kind: StmtKind::If {
            cond,
            then_body,
            else_body,
        },
        line,
    }
}

pub fn while_stmt(cond: Condition, body: Vec<Statement>, line: u32) -> Statement {
    Statement {
        kind: StmtKind::While { cond, body },
        line,
    }
}

pub fn halt(line: u32) -> Statement {
    Statement {
        kind: StmtKind::Halt,
        line,
    }
}

// Condition
pub fn condition(left: Expression, op: CmpOp, right: Expression) -> Condition {
    Condition { left, op, right }
}

// Expression
pub fn number(n: f64) -> Expression {
    Expression::Literal(Value::Number(n))
}

pub fn text<S: Into<String>>(s: S) -> Expression {
    Expression::Literal(Value::Text(s.into()))
}

pub fn slot(index: usize) -> Expression {
    Expression::Slot(index)
}

pub fn binary(left: Expression, op: BinOp, right: Expression) -> Expression {
    Expression::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}
