//! Walks a postfix sequence belonging to a fresh expression and emits its
//! ordered Task buffer, classifying each task as ReadyToCompute or
//! WaitingOnPredecessors based on how many of its two operands are already
//! known values versus still-pending results of an earlier task.

use tasker_shared::config::OrchestratorConfig;
use tasker_shared::pairing::pair;
use tasker_shared::types::{Operand, PostfixToken, Task, TaskStatus};

/// Build the ordered Task buffer for `expression_id`'s postfix sequence.
///
/// One Task is emitted per operator, in the order operators are encountered
/// while scanning postfix left to right. A literal number pushes a known
/// value onto an operand stack; an operator pops its two most recent operand
/// slots and, once done, leaves behind a single placeholder slot standing in
/// for its own not-yet-computed result. Whichever of the two popped slots
/// still holds a placeholder becomes that Task's unresolved argument; the
/// Task Graph later fills it in once the predecessor Task completes.
pub fn build_tasks(
    expression_id: i64,
    postfix: &[PostfixToken],
    config: &OrchestratorConfig,
) -> Vec<Task> {
    let mut operand_stack: Vec<Operand> = Vec::new();
    let mut tasks = Vec::new();
    let mut ordinal: i64 = 0;

    for token in postfix {
        match token {
            PostfixToken::Number(n) => operand_stack.push(Operand::Known(*n)),
            PostfixToken::Op(op) => {
                let pair_id = pair(expression_id, ordinal);
                ordinal += 1;
                let deadline = config.deadline_for(*op);

                let b = operand_stack
                    .pop()
                    .expect("well-formed postfix keeps operand depth >= 2 at every operator");
                let a = operand_stack
                    .pop()
                    .expect("well-formed postfix keeps operand depth >= 2 at every operator");

                let known_count = [&a, &b]
                    .into_iter()
                    .filter(|slot| matches!(slot, Operand::Known(_)))
                    .count();

                let (arg1, arg2, status) = match known_count {
                    2 => {
                        let (Operand::Known(a), Operand::Known(b)) = (a, b) else {
                            unreachable!("known_count == 2 implies both slots are Known")
                        };
                        (
                            Operand::Known(a),
                            Operand::Known(b),
                            TaskStatus::ReadyToCompute,
                        )
                    }
                    1 => {
                        let known = match (a, b) {
                            (Operand::Known(v), _) | (_, Operand::Known(v)) => v,
                            _ => unreachable!("known_count == 1 implies one slot is Known"),
                        };
                        (
                            Operand::Unresolved,
                            Operand::Known(known),
                            TaskStatus::WaitingOnPredecessors,
                        )
                    }
                    _ => (
                        Operand::Unresolved,
                        Operand::Unresolved,
                        TaskStatus::WaitingOnPredecessors,
                    ),
                };

                tasks.push(Task {
                    pair_id,
                    arg1,
                    arg2,
                    op: *op,
                    deadline,
                    status,
                    result: None,
                });

                // This task hasn't run yet, so its eventual result is a
                // placeholder on the stack until a later operator consumes it.
                operand_stack.push(Operand::Unresolved);
            }
        }
    }

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::translate;
    use tasker_shared::types::Operator::*;

    fn tasks_for(expr: &str) -> Vec<Task> {
        let postfix = translate(expr).unwrap();
        build_tasks(0, &postfix, &OrchestratorConfig::default())
    }

    #[test]
    fn simple_precedence() {
        let tasks = tasks_for("2+2*4");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].op, Mul);
        assert_eq!(tasks[0].arg1, Operand::Known(2));
        assert_eq!(tasks[0].arg2, Operand::Known(4));
        assert_eq!(tasks[0].status, TaskStatus::ReadyToCompute);

        assert_eq!(tasks[1].op, Add);
        assert_eq!(tasks[1].arg1, Operand::Unresolved);
        assert_eq!(tasks[1].arg2, Operand::Known(2));
        assert_eq!(tasks[1].status, TaskStatus::WaitingOnPredecessors);
    }

    #[test]
    fn two_independent_products() {
        let tasks = tasks_for("4*2+3*5");
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].status, TaskStatus::ReadyToCompute);
        assert_eq!(tasks[1].status, TaskStatus::ReadyToCompute);
        assert_eq!(tasks[2].status, TaskStatus::WaitingOnPredecessors);
        assert_eq!(tasks[2].arg1, Operand::Unresolved);
        assert_eq!(tasks[2].arg2, Operand::Unresolved);
    }

    #[test]
    fn parenthesized_subexpression() {
        let tasks = tasks_for("32+(4*2)/4");
        assert_eq!(tasks.len(), 3);

        assert_eq!(tasks[0].op, Mul);
        assert_eq!(tasks[0].arg1, Operand::Known(4));
        assert_eq!(tasks[0].arg2, Operand::Known(2));
        assert_eq!(tasks[0].status, TaskStatus::ReadyToCompute);

        assert_eq!(tasks[1].op, Div);
        assert_eq!(tasks[1].arg1, Operand::Unresolved);
        assert_eq!(tasks[1].arg2, Operand::Known(4));
        assert_eq!(tasks[1].status, TaskStatus::WaitingOnPredecessors);

        assert_eq!(tasks[2].op, Add);
        assert_eq!(tasks[2].arg1, Operand::Unresolved);
        assert_eq!(tasks[2].arg2, Operand::Known(32));
        assert_eq!(tasks[2].status, TaskStatus::WaitingOnPredecessors);
    }

    #[test]
    fn task_count_matches_operator_count() {
        for expr in ["2+2*4", "4*2+3*5", "32+(4*2)/4", "2*3+4*10", "1+2+3+4+5"] {
            let operator_count = expr.chars().filter(|c| "+-*/".contains(*c)).count();
            assert_eq!(tasks_for(expr).len(), operator_count, "expr={expr}");
        }
    }

    #[test]
    fn empty_postfix_yields_no_tasks() {
        assert_eq!(tasks_for("").len(), 0);
    }

    #[test]
    fn pair_ids_are_assigned_sequentially_per_expression() {
        let postfix = translate("4*2+3*5").unwrap();
        let tasks = build_tasks(7, &postfix, &OrchestratorConfig::default());
        assert_eq!(tasks[0].pair_id, pair(7, 0));
        assert_eq!(tasks[1].pair_id, pair(7, 1));
        assert_eq!(tasks[2].pair_id, pair(7, 2));
    }

    #[test]
    fn long_chain_resolves_exactly_one_ready_task_up_front() {
        let tasks = tasks_for("1+2+3+4+5");
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[0].status, TaskStatus::ReadyToCompute);
        for task in &tasks[1..] {
            assert_eq!(task.status, TaskStatus::WaitingOnPredecessors);
        }
    }
}
