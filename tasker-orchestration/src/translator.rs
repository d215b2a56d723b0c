//! # Postfix Translator (spec §4.A)
//!
//! Tokenizes an infix arithmetic string and emits it in postfix (Reverse
//! Polish) order via the shunting-yard algorithm, or rejects malformed input.

use tasker_shared::types::{Operator, PostfixToken};

/// A single lexical token of an infix expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfixToken {
    Number(i64),
    Op(Operator),
    LParen,
    RParen,
}

/// Translate an infix expression into postfix, or reject it.
///
/// Empty input is accepted and yields an empty postfix sequence (spec §4.A:
/// "caller may reject at a higher layer").
pub fn translate(input: &str) -> Result<Vec<PostfixToken>, tasker_shared::TaskerError> {
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    shunting_yard(&tokens)
}

fn lex(input: &str) -> Result<Vec<InfixToken>, tasker_shared::TaskerError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let literal: String = chars[start..i].iter().collect();
            let value: i64 = literal.parse().map_err(|_| {
                tasker_shared::TaskerError::InvalidExpression(format!(
                    "numeral too large: {literal}"
                ))
            })?;
            tokens.push(InfixToken::Number(value));
            continue;
        }
        match c {
            '(' => tokens.push(InfixToken::LParen),
            ')' => tokens.push(InfixToken::RParen),
            _ => {
                if let Some(op) = Operator::from_char(c) {
                    tokens.push(InfixToken::Op(op));
                } else {
                    return Err(tasker_shared::TaskerError::InvalidExpression(format!(
                        "unexpected character: {c}"
                    )));
                }
            }
        }
        i += 1;
    }
    Ok(tokens)
}

/// Validate that a token following a completed operand — a numeral or a `)`
/// — is itself an operator, `)`, or end-of-input (spec §4.A validation
/// rule). Without this, a numeral or `)` directly juxtaposed with another
/// numeral or `(` (no intervening operator, e.g. `"2(3)"`) would slip past
/// the shunting-yard unrejected and leave the emitted postfix with a
/// stack-depth deficit the Task Factory isn't built to handle.
fn validate_follows_operand(next: Option<&InfixToken>) -> Result<(), tasker_shared::TaskerError> {
    match next {
        None => Ok(()),
        Some(InfixToken::Op(_)) | Some(InfixToken::RParen) => Ok(()),
        Some(_) => Err(tasker_shared::TaskerError::InvalidExpression(
            "token following a number or ')' must be an operator, ')', or end-of-input"
                .to_string(),
        )),
    }
}

fn shunting_yard(
    tokens: &[InfixToken],
) -> Result<Vec<PostfixToken>, tasker_shared::TaskerError> {
    let mut output = Vec::new();
    let mut op_stack: Vec<InfixToken> = Vec::new();
    let mut operand_count: usize = 0;
    let mut operator_count: usize = 0;

    for (idx, tok) in tokens.iter().enumerate() {
        match tok {
            InfixToken::Number(n) => {
                output.push(PostfixToken::Number(*n));
                operand_count += 1;
                validate_follows_operand(tokens.get(idx + 1))?;
            }
            InfixToken::Op(op) => {
                while let Some(InfixToken::Op(top)) = op_stack.last() {
                    if top.precedence() >= op.precedence() {
                        output.push(PostfixToken::Op(*top));
                        op_stack.pop();
                    } else {
                        break;
                    }
                }
                op_stack.push(InfixToken::Op(*op));
                operator_count += 1;
            }
            InfixToken::LParen => {
                op_stack.push(InfixToken::LParen);
            }
            InfixToken::RParen => {
                let mut found_matching = false;
                while let Some(top) = op_stack.pop() {
                    match top {
                        InfixToken::LParen => {
                            found_matching = true;
                            break;
                        }
                        InfixToken::Op(op) => output.push(PostfixToken::Op(op)),
                        InfixToken::RParen => unreachable!("')' never pushed to op_stack"),
                    }
                }
                if !found_matching {
                    return Err(tasker_shared::TaskerError::MismatchedParentheses);
                }
                validate_follows_operand(tokens.get(idx + 1))?;
            }
        }
    }

    while let Some(top) = op_stack.pop() {
        match top {
            InfixToken::LParen => {
                return Err(tasker_shared::TaskerError::MismatchedParentheses);
            }
            InfixToken::Op(op) => output.push(PostfixToken::Op(op)),
            InfixToken::RParen => unreachable!("')' never pushed to op_stack"),
        }
    }

    if operator_count + 1 != operand_count {
        return Err(tasker_shared::TaskerError::InvalidExpression(format!(
            "operator count ({operator_count}) must equal operand count ({operand_count}) minus one"
        )));
    }

    Ok(output)
}
