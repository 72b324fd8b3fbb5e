//! The grammar: token stream → syntax tree.
//!
//! Top level is a block of statements separated by end-of-line tokens; a
//! statement is a comment or a command. A command's head may be a word,
//! braced block, variable reference, subcommand, or quoted string; its
//! arguments follow until end of line. Subcommand bodies are parsed by
//! pushing the token back into the tokenizer and re-entering the grammar,
//! which keeps absolute source positions intact.
//!
//! Quoted strings get a second pass here: literal runs, `$name` / `${name}`
//! substitutions, `[…]` subcommand substitutions, and backslash escapes.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{
    ast::{Node, NodeRef, StringPart},
    exception::{CutletError, SyntaxError},
    lexer::Tokenizer,
    token::{Token, TokenKind},
    utf8::Cursor,
};

/// Parses an entire source into a block of statements.
pub fn parse_script(tokens: &mut Tokenizer) -> Result<NodeRef, CutletError> {
    let mut children = Vec::new();

    loop {
        while tokens.expect(TokenKind::Eol) {
            tokens.next();
        }
        if tokens.expect(TokenKind::Eof) || !tokens.is_more() {
            break;
        }

        if tokens.expect(TokenKind::Comment) {
            children.push(Rc::new(Node::Comment(tokens.get_token()?)));
        } else {
            children.push(parse_command(tokens)?);
        }
    }

    Ok(Rc::new(Node::Block(children)))
}

/// Parses a single command: head plus arguments up to end of line.
pub fn parse_command(tokens: &mut Tokenizer) -> Result<NodeRef, CutletError> {
    let head = match tokens.front()?.kind {
        TokenKind::Word | TokenKind::Block => Rc::new(Node::Value(tokens.get_token()?)),
        TokenKind::Variable => variable_node(tokens.get_token()?),
        TokenKind::Subcommand => parse_subcommand(tokens)?,
        TokenKind::String => {
            let token = tokens.get_token()?;
            parse_string(tokens, token)?
        }
        _ => {
            let token = tokens.get_token()?;
            return Err(SyntaxError::new("Invalid token", token).into());
        }
    };

    let mut args: SmallVec<[NodeRef; 4]> = SmallVec::new();
    while !tokens.expect(TokenKind::Eol) && !tokens.expect(TokenKind::Eof) && tokens.is_more() {
        match tokens.front()?.kind {
            TokenKind::Word | TokenKind::Block => {
                args.push(Rc::new(Node::Value(tokens.get_token()?)));
            }
            TokenKind::String => {
                let token = tokens.get_token()?;
                args.push(parse_string(tokens, token)?);
            }
            TokenKind::Variable => args.push(variable_node(tokens.get_token()?)),
            TokenKind::Subcommand => args.push(parse_subcommand(tokens)?),
            _ => {
                let token = tokens.get_token()?;
                return Err(SyntaxError::new("Invalid token", token).into());
            }
        }
    }

    Ok(Rc::new(Node::Command { head, args }))
}

/// Builds a variable node, unwrapping the `${name}` form.
fn variable_node(token: Token) -> NodeRef {
    let name = token
        .text
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(&token.text)
        .to_owned();
    Rc::new(Node::Variable { token, name })
}

/// Re-enters the grammar on a subcommand token's body.
fn parse_subcommand(tokens: &mut Tokenizer) -> Result<NodeRef, CutletError> {
    let token = tokens.get_token()?;
    tokens.push_source_token(&token)?;
    let result = parse_command(tokens);
    tokens.pop_source();
    result
}

/// Second pass over a quoted string's body: splits it into literal runs and
/// substitution nodes, resolving backslash escapes. Subcommand substitutions
/// re-enter the grammar on the same tokenizer stack.
pub fn parse_string(tokens: &mut Tokenizer, token: Token) -> Result<NodeRef, CutletError> {
    let body = token.text.clone();
    let base = token.content_position();
    let mut parts: SmallVec<[StringPart; 4]> = SmallVec::new();
    let mut literal = String::new();

    let mut index = Cursor::new(&body);
    while !index.at_end() {
        match index.ch().expect("cursor is not at the end") {
            '$' => {
                flush_literal(&mut parts, &mut literal);
                let start = index.clone();
                index.advance();

                if index.ch() == Some('{') {
                    // Braced variable name.
                    index.advance();
                    while index.ch().is_some_and(|c| c != '}') {
                        index.advance();
                    }
                    if index.at_end() {
                        return Err(SyntaxError::new("Unmatched ${ in string", token).into());
                    }
                    let mut name_start = start.clone();
                    name_start.step(2);
                    let name = name_start
                        .substr(&index)
                        .expect("forward scan stays in range")
                        .to_owned();
                    let var_token = Token::with_offset(
                        TokenKind::Variable,
                        name.clone(),
                        base + start.position(),
                        2,
                    );
                    parts.push(StringPart::Substitution(Rc::new(Node::Variable {
                        token: var_token,
                        name,
                    })));
                    index.advance(); // Closing brace.
                } else {
                    // Bare variable name: runs to whitespace or the next
                    // substitution.
                    while index
                        .ch()
                        .is_some_and(|c| c != '$' && !c.is_whitespace())
                    {
                        index.advance();
                    }
                    let mut name_start = start.clone();
                    name_start.advance();
                    let name = name_start
                        .substr(&index)
                        .expect("forward scan stays in range")
                        .to_owned();
                    let var_token = Token::with_offset(
                        TokenKind::Variable,
                        name.clone(),
                        base + start.position(),
                        1,
                    );
                    parts.push(StringPart::Substitution(Rc::new(Node::Variable {
                        token: var_token,
                        name,
                    })));
                    continue; // Already positioned on the terminator.
                }
            }

            '[' => {
                flush_literal(&mut parts, &mut literal);
                let start = index.clone();
                index.advance();
                while index.ch().is_some_and(|c| c != ']') {
                    index.advance();
                }
                if index.at_end() {
                    return Err(SyntaxError::new("Unmatched [ in string", token).into());
                }
                let mut body_start = start.clone();
                body_start.advance();
                let mut text = body_start
                    .substr(&index)
                    .expect("forward scan stays in range")
                    .to_owned();
                text.push('\n');
                let sub_token = Token::with_offset(
                    TokenKind::Subcommand,
                    text,
                    base + start.position(),
                    1,
                );
                tokens.push_source_token(&sub_token)?;
                let sub = parse_command(tokens);
                tokens.pop_source();
                parts.push(StringPart::Substitution(sub?));
                index.advance(); // Closing bracket.
            }

            '\\' => {
                index.advance();
                match index.ch() {
                    Some('$') => literal.push('$'),
                    Some('"') => literal.push('"'),
                    Some('\'') => literal.push('\''),
                    Some('[') => literal.push('['),
                    Some(']') => literal.push(']'),
                    Some('\\') => literal.push('\\'),
                    Some('a') => literal.push('\x07'),
                    Some('b') => literal.push('\x08'),
                    Some('e') => literal.push('\x1b'),
                    Some('f') => literal.push('\x0c'),
                    Some('n') => literal.push('\n'),
                    Some('r') => literal.push('\r'),
                    Some('t') => literal.push('\t'),
                    Some('v') => literal.push('\x0b'),
                    Some('x') => {
                        index.advance();
                        let mut digits = String::new();
                        for _ in 0..2 {
                            match index.ch() {
                                Some(ch) if ch.is_ascii_hexdigit() => {
                                    digits.push(ch);
                                    index.advance();
                                }
                                _ => {
                                    if let Some(ch) = index.ch() {
                                        digits.push(ch);
                                    }
                                    return Err(SyntaxError::new(
                                        format!("Invalid escaped hex value \\x{digits}"),
                                        token,
                                    )
                                    .into());
                                }
                            }
                        }
                        let byte = u8::from_str_radix(&digits, 16)
                            .expect("two hex digits parse as a byte");
                        literal.push(char::from(byte));
                        continue; // Already positioned past the digits.
                    }
                    // Unrecognized escapes drop both characters.
                    _ => {}
                }
                index.advance();
            }

            ch => {
                literal.push(ch);
                index.advance();
            }
        }
    }

    flush_literal(&mut parts, &mut literal);
    Ok(Rc::new(Node::StringInterp { token, parts }))
}

fn flush_literal(parts: &mut SmallVec<[StringPart; 4]>, literal: &mut String) {
    if !literal.is_empty() {
        parts.push(StringPart::Literal(std::mem::take(literal)));
    }
}
