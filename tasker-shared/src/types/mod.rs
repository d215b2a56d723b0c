//! Domain types shared by the orchestration engine, the dispatch client, and
//! the compute worker: [`Task`], [`Expression`], their status enums, and the
//! narrow [`ShortExpression`] view used at the persistence boundary (spec §3,
//! design note "Deep interface hierarchies").

use std::time::Duration;

/// One of the four supported primitive binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    /// Parse a single-character operator token.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Sub),
            '*' => Some(Operator::Mul),
            '/' => Some(Operator::Div),
            _ => None,
        }
    }

    /// The symbol used on the wire and in diagnostics (spec §6: `"+" "-" "*" "/"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }

    /// Shunting-yard precedence: `{+,-} = 1`, `{*,/} = 2` (spec §4.A).
    pub fn precedence(&self) -> u8 {
        match self {
            Operator::Add | Operator::Sub => 1,
            Operator::Mul | Operator::Div => 2,
        }
    }

    /// Apply the operator to two resolved operands. Integer `/` truncates
    /// toward zero per Rust's default signed division (spec §9 open question,
    /// resolved to the platform default).
    pub fn apply(&self, a: i64, b: i64) -> i64 {
        match self {
            Operator::Add => a + b,
            Operator::Sub => a - b,
            Operator::Mul => a * b,
            Operator::Div => a / b,
        }
    }
}

/// A single token in a postfix (Reverse Polish) sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixToken {
    Number(i64),
    Op(Operator),
}

/// One primitive binary operation argument: either a resolved integer or the
/// "unresolved" sentinel awaiting an upstream task's result (spec §3,
/// design note "Dynamic typing of arg1/arg2").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Known(i64),
    Unresolved,
}

impl Operand {
    pub fn is_known(&self) -> bool {
        matches!(self, Operand::Known(_))
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            Operand::Known(v) => Some(*v),
            Operand::Unresolved => None,
        }
    }
}

/// Task lifecycle state (spec §3 "Lifecycles").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TaskStatus {
    ReadyToCompute,
    Dispatched,
    WaitingOnPredecessors,
    Computed,
}

/// One primitive binary operation (spec §3 "Task").
#[derive(Debug, Clone)]
pub struct Task {
    pub pair_id: i64,
    pub arg1: Operand,
    pub arg2: Operand,
    pub op: Operator,
    pub deadline: Duration,
    pub status: TaskStatus,
    pub result: Option<i64>,
}

impl Task {
    /// Convert a ready task's resolved arguments into a computed result.
    ///
    /// Panics if called on a task whose arguments are not both known; callers
    /// are expected to only invoke this on `ReadyToCompute` tasks, which the
    /// Task Graph guarantees via I2.
    pub fn compute(&self) -> i64 {
        let a = self
            .arg1
            .value()
            .expect("ReadyToCompute task must have a known arg1 (I2)");
        let b = self
            .arg2
            .value()
            .expect("ReadyToCompute task must have a known arg2 (I2)");
        self.op.apply(a, b)
    }
}

/// Expression lifecycle state (spec §3 "Lifecycles").
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ExpressionStatus {
    HasReady,
    NoReady,
    Completed,
    Cancelled,
}

/// One user-submitted formula and its task graph (spec §3 "Expression").
#[derive(Debug, Clone)]
pub struct Expression {
    pub id: i64,
    pub owner_id: i64,
    pub postfix: Vec<PostfixToken>,
    pub status: ExpressionStatus,
    pub result: Option<i64>,
}

/// Narrow view of an [`Expression`] used only at the persistence boundary, to
/// decouple listing/snapshotting from the live task graph (spec §4.G, design
/// note "Deep interface hierarchies").
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ShortExpression {
    pub id: i64,
    pub owner_id: i64,
    pub status: ExpressionStatus,
    pub result: Option<i64>,
}

impl From<&Expression> for ShortExpression {
    fn from(expr: &Expression) -> Self {
        ShortExpression {
            id: expr.id,
            owner_id: expr.owner_id,
            status: expr.status,
            result: expr.result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_precedence_matches_spec() {
        assert_eq!(Operator::Add.precedence(), Operator::Sub.precedence());
        assert_eq!(Operator::Mul.precedence(), Operator::Div.precedence());
        assert!(Operator::Mul.precedence() > Operator::Add.precedence());
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(Operator::Div.apply(-7, 2), -3);
        assert_eq!(Operator::Div.apply(7, 2), 3);
    }

    #[test]
    fn short_expression_projects_live_expression() {
        let expr = Expression {
            id: 5,
            owner_id: 9,
            postfix: vec![],
            status: ExpressionStatus::Completed,
            result: Some(42),
        };
        let short: ShortExpression = (&expr).into();
        assert_eq!(short.id, 5);
        assert_eq!(short.owner_id, 9);
        assert_eq!(short.result, Some(42));
    }
}
