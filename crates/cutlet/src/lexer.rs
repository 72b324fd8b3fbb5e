//! The cutlet tokenizer.
//!
//! The tokenizer is a push-down automaton over sources: `push_source_*` makes
//! a new string, stream, or token body the current source, and `pop_source`
//! restores the previous one. Subcommands, string interpolation, and braced
//! list bodies are all re-lexed through the same machine, so nested parses
//! keep absolute byte positions (a pushed token starts lexing at
//! `position + content_offset`).
//!
//! Stream sources refill lazily: an unterminated `{…}` block requests more
//! input instead of failing, which is what makes multi-line braced bodies
//! work when reading from a pipe or a file.

use std::{collections::VecDeque, fmt, io::BufRead};

use crate::{
    exception::SyntaxError,
    token::{Token, TokenKind},
    utf8::Cursor,
};

fn is_space(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\r'
}

/// Command terminators: a newline or a `;` separator.
fn is_eol(ch: char) -> bool {
    ch == '\n' || ch == ';'
}

/// Only a real newline is illegal inside quoted strings; `;` is ordinary
/// text there.
fn is_newline(ch: char) -> bool {
    ch == '\n'
}

/// One suspended lexing source, restored by `pop_source`.
struct SavedSource {
    tokens: VecDeque<Token>,
    code: String,
    stream: Option<Box<dyn BufRead>>,
    position: usize,
}

/// Tokenizer over a stack of sources.
pub struct Tokenizer {
    tokens: VecDeque<Token>,
    code: String,
    stream: Option<Box<dyn BufRead>>,
    position: usize,
    need_more: bool,
    saved: Vec<SavedSource>,
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("tokens", &self.tokens.len())
            .field("position", &self.position)
            .field("stacked", &self.saved.len())
            .finish_non_exhaustive()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    pub fn new() -> Self {
        Self {
            tokens: VecDeque::new(),
            code: String::new(),
            stream: None,
            position: 0,
            need_more: false,
            saved: Vec::new(),
        }
    }

    /// Makes `code` the current source, suspending the previous one.
    /// A push that fails to lex restores the previous source itself.
    pub fn push_source_str(&mut self, code: &str) -> Result<(), SyntaxError> {
        self.save_state();
        self.position = 0;
        self.code = code.to_owned();
        self.finish_push()
    }

    /// Makes a token's body the current source. Lexing starts at the token's
    /// content position so nested tokens keep absolute offsets.
    pub fn push_source_token(&mut self, token: &Token) -> Result<(), SyntaxError> {
        self.save_state();
        self.position = token.content_position();
        self.code = token.text.clone();
        self.finish_push()
    }

    /// Makes a stream the current source; it is read to exhaustion as tokens
    /// are produced, one line at a time.
    pub fn push_source_stream(&mut self, stream: Box<dyn BufRead>) -> Result<(), SyntaxError> {
        self.save_state();
        self.position = 0;
        self.stream = Some(stream);
        self.finish_push()
    }

    fn finish_push(&mut self) -> Result<(), SyntaxError> {
        match self.parse_tokens() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.pop_source();
                Err(err)
            }
        }
    }

    /// Discards the current source and restores the one pushed before it.
    pub fn pop_source(&mut self) {
        if let Some(saved) = self.saved.pop() {
            self.tokens = saved.tokens;
            self.code = saved.code;
            self.stream = saved.stream;
            self.position = saved.position;
        } else {
            self.reset();
        }
    }

    fn save_state(&mut self) {
        self.saved.push(SavedSource {
            tokens: std::mem::take(&mut self.tokens),
            code: std::mem::take(&mut self.code),
            stream: self.stream.take(),
            position: self.position,
        });
        self.need_more = false;
    }

    fn reset(&mut self) {
        self.tokens.clear();
        self.code.clear();
        self.stream = None;
        self.position = 0;
        self.need_more = false;
    }

    /// True while tokens remain in the current source.
    pub fn is_more(&mut self) -> bool {
        !self.tokens.is_empty()
    }

    /// The next token without consuming it.
    pub fn front(&mut self) -> Result<Token, SyntaxError> {
        match self.tokens.front() {
            Some(token) => Ok(token.clone()),
            None => Err(SyntaxError::new(
                "Incomplete syntax",
                Token::invalid("", self.position),
            )),
        }
    }

    /// Consumes and returns the next token.
    pub fn get_token(&mut self) -> Result<Token, SyntaxError> {
        match self.tokens.pop_front() {
            Some(token) => Ok(token),
            None => Err(SyntaxError::new(
                "Incomplete syntax",
                Token::invalid("", self.position),
            )),
        }
    }

    /// True when the next token has the given kind.
    pub fn expect(&mut self, kind: TokenKind) -> bool {
        self.tokens.front().is_some_and(|token| token.kind == kind)
    }

    /// Consumes the next token, failing unless it has the given kind.
    pub fn permit(&mut self, kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.expect(kind) {
            self.get_token()
        } else {
            let front = self.front()?;
            Err(SyntaxError::new(
                format!("Got unexpected value of {}", front.text),
                front,
            ))
        }
    }

    /// Discards the next token, if any.
    pub fn next(&mut self) {
        self.tokens.pop_front();
    }

    /// Pulls another chunk from the stream into the working buffer.
    /// Returns false once the stream is exhausted (and drops it).
    fn refill(&mut self) -> bool {
        let Some(stream) = &mut self.stream else {
            return false;
        };
        let mut line = String::new();
        match stream.read_line(&mut line) {
            Ok(0) | Err(_) => {
                self.stream = None;
                false
            }
            Ok(_) => {
                self.code.push_str(&line);
                true
            }
        }
    }

    /// Tokenizes everything available from the current source, following the
    /// stream until it runs dry. Ends with an EOF token once the source is
    /// fully consumed.
    fn parse_tokens(&mut self) -> Result<(), SyntaxError> {
        loop {
            if self.code.is_empty() && !self.refill() {
                break;
            }
            while !self.code.is_empty() || self.need_more {
                if self.need_more {
                    self.need_more = false;
                    self.refill();
                    if self.code.is_empty() {
                        break;
                    }
                    continue;
                }
                self.parse_next_token()?;
            }
            if self.stream.is_none() {
                break;
            }
        }
        self.tokens.push_back(Token::eof(self.position));
        Ok(())
    }

    /// Lexes one token (or a continuation/whitespace run) off the front of
    /// the working buffer.
    fn parse_next_token(&mut self) -> Result<(), SyntaxError> {
        let code = std::mem::take(&mut self.code);
        let result = self.lex_one(&code);
        match result {
            Ok(consumed) => {
                self.code = code[consumed..].to_owned();
                Ok(())
            }
            Err(err) => {
                self.code = code;
                Err(err)
            }
        }
    }

    /// Scans one token from `code`, returning how many bytes were consumed.
    /// When a brace block needs more input the buffer is left whole,
    /// `need_more` is set, and 0 is returned.
    fn lex_one(&mut self, code: &str) -> Result<usize, SyntaxError> {
        let start_pos = self.position;
        let mut it = Cursor::new(code);

        // Skip any whitespace.
        while it.ch().is_some_and(is_space) {
            it.advance();
            self.position += 1;
        }
        if it.at_end() {
            self.position = start_pos + it.position();
            return Ok(it.position());
        }

        let first = it.ch().expect("cursor is not at the end");

        if first == '\\' {
            let mut peek = it.clone();
            peek.advance();
            if peek.ch().is_some_and(is_newline) {
                // Line continuation: drop the backslash and the newline and
                // ask for more input before emitting anything.
                it.step(2);
                self.position += 2;
                self.need_more = true;
                return Ok(it.position());
            }
        }

        match first {
            '$' => {
                it.advance();
                let start = it.clone();
                while it.ch().is_some_and(|c| !is_space(c) && !is_eol(c)) {
                    it.advance();
                }
                let text = start.substr(&it).expect("forward scan stays in range");
                self.add_token(Token::with_offset(
                    TokenKind::Variable,
                    text,
                    self.position,
                    1,
                ));
            }

            '"' | '\'' => {
                let quote = first;
                it.advance();
                let start = it.clone();
                let mut ignore = false;
                loop {
                    match it.ch() {
                        Some(ch) if ch == quote && !ignore => break,
                        Some(ch) if is_newline(ch) => {
                            return Err(self.unmatched(quote, &start, &it, TokenKind::String));
                        }
                        Some(ch) => {
                            ignore = ch == '\\' && !ignore;
                            it.advance();
                        }
                        None => {
                            return Err(self.unmatched(quote, &start, &it, TokenKind::String));
                        }
                    }
                }
                let text = start.substr(&it).expect("forward scan stays in range");
                self.add_token(Token::with_offset(TokenKind::String, text, self.position, 1));
                it.advance(); // Trailing quote.
            }

            '[' => {
                it.advance();
                let start = it.clone();
                let mut closing = start.clone();
                let mut count = 1u32;
                let mut blocks = 0i32;
                while count > 0 {
                    match it.ch() {
                        Some(ch) if is_eol(ch) && blocks == 0 => {
                            return Err(self.unmatched('[', &start, &it, TokenKind::Subcommand));
                        }
                        Some(']') => {
                            count -= 1;
                            closing = it.clone();
                            it.advance();
                        }
                        Some('[') => {
                            count += 1;
                            it.advance();
                        }
                        Some('}') => {
                            blocks -= 1;
                            it.advance();
                        }
                        Some('{') => {
                            blocks += 1;
                            it.advance();
                        }
                        Some(_) => it.advance(),
                        None => {
                            return Err(self.unmatched('[', &start, &it, TokenKind::Subcommand));
                        }
                    }
                }
                let mut text = start
                    .substr(&closing)
                    .expect("forward scan stays in range")
                    .to_owned();
                // A trailing newline terminates the nested command when the
                // body is re-lexed.
                text.push('\n');
                self.add_token(Token::with_offset(
                    TokenKind::Subcommand,
                    text,
                    self.position,
                    1,
                ));
            }

            '{' => {
                it.advance();
                let start = it.clone();
                let mut closing = start.clone();
                let mut count = 1u32;
                while count > 0 {
                    match it.ch() {
                        Some('}') => {
                            count -= 1;
                            closing = it.clone();
                            it.advance();
                        }
                        Some('{') => {
                            count += 1;
                            it.advance();
                        }
                        Some(_) => it.advance(),
                        None => {
                            if self.stream.is_some() {
                                // More input may complete the block; rewind
                                // and ask for it.
                                self.position = start_pos;
                                self.need_more = true;
                                return Ok(0);
                            }
                            let mut opener = start.clone();
                            opener.retreat();
                            return Err(self.unmatched('{', &opener, &it, TokenKind::Block));
                        }
                    }
                }
                let text = start.substr(&closing).expect("forward scan stays in range");
                self.add_token(Token::with_offset(TokenKind::Block, text, self.position, 1));
            }

            _ => {
                if is_eol(first) {
                    self.add_token(Token::new(
                        TokenKind::Eol,
                        first.to_string(),
                        self.position,
                    ));
                    it.advance();
                } else if first == '#' && self.at_line_start() {
                    let start = it.clone();
                    while it.ch().is_some_and(|c| !is_newline(c)) {
                        it.advance();
                    }
                    let mut content = start.clone();
                    content.advance(); // Skip the '#'.
                    let text = content.substr(&it).expect("forward scan stays in range");
                    self.add_token(Token::with_offset(
                        TokenKind::Comment,
                        text,
                        self.position,
                        1,
                    ));
                } else {
                    let start = it.clone();
                    while it.ch().is_some_and(|c| !is_space(c) && !is_eol(c)) {
                        it.advance();
                    }
                    let text = start.substr(&it).expect("forward scan stays in range");
                    self.add_token(Token::new(TokenKind::Word, text, self.position));
                }
            }
        }

        self.position = start_pos + it.position();
        Ok(it.position())
    }

    fn at_line_start(&self) -> bool {
        self.tokens
            .back()
            .is_none_or(|token| token.kind == TokenKind::Eol)
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    fn unmatched(
        &self,
        opener: char,
        start: &Cursor<'_>,
        it: &Cursor<'_>,
        kind: TokenKind,
    ) -> SyntaxError {
        let partial = start.substr(it).unwrap_or_default();
        SyntaxError::new(
            format!("Unmatched {opener}"),
            Token::with_offset(kind, partial, self.position, 1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(code: &str) -> Vec<Token> {
        let mut tokens = Tokenizer::new();
        tokens.push_source_str(code).expect("lexes cleanly");
        let mut out = Vec::new();
        while tokens.is_more() {
            out.push(tokens.get_token().expect("token available"));
        }
        out
    }

    #[test]
    fn words_and_eol() {
        let out = lex_all("print hello\n");
        let kinds: Vec<TokenKind> = out.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Word, TokenKind::Word, TokenKind::Eol, TokenKind::Eof]
        );
        assert_eq!(out[0].text, "print");
        assert_eq!(out[1].text, "hello");
        assert_eq!(out[1].position, 6);
    }

    #[test]
    fn variable_token_strips_dollar() {
        let out = lex_all("print $name");
        assert_eq!(out[1].kind, TokenKind::Variable);
        assert_eq!(out[1].text, "name");
        assert_eq!(out[1].position, 6);
        assert_eq!(out[1].content_offset, 1);
    }

    #[test]
    fn string_token_body() {
        let out = lex_all("print \"a b\"");
        assert_eq!(out[1].kind, TokenKind::String);
        assert_eq!(out[1].text, "a b");
        assert_eq!(out[1].content_offset, 1);
    }

    #[test]
    fn single_quoted_string() {
        let out = lex_all("print 'x y'");
        assert_eq!(out[1].kind, TokenKind::String);
        assert_eq!(out[1].text, "x y");
    }

    #[test]
    fn escaped_quote_does_not_terminate() {
        let out = lex_all(r#"print "a\"b""#);
        assert_eq!(out[1].text, r#"a\"b"#);
    }

    #[test]
    fn block_token_tracks_nesting() {
        let out = lex_all("if {a {b} c}");
        assert_eq!(out[1].kind, TokenKind::Block);
        assert_eq!(out[1].text, "a {b} c");
    }

    #[test]
    fn subcommand_token_gets_trailing_newline() {
        let out = lex_all("print [get x]");
        assert_eq!(out[1].kind, TokenKind::Subcommand);
        assert_eq!(out[1].text, "get x\n");
    }

    #[test]
    fn comment_only_at_line_start() {
        let out = lex_all("# note\nprint x#y\n");
        assert_eq!(out[0].kind, TokenKind::Comment);
        assert_eq!(out[0].text, " note");
        // '#' mid-line is part of the word.
        assert_eq!(out[3].text, "x#y");
    }

    #[test]
    fn semicolon_separates_commands() {
        let out = lex_all("print a; print b\n");
        let kinds: Vec<TokenKind> = out.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Eol,
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Eol,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn semicolon_inside_quotes_is_text() {
        let out = lex_all("print \"a;b\"");
        assert_eq!(out[1].kind, TokenKind::String);
        assert_eq!(out[1].text, "a;b");
    }

    #[test]
    fn line_continuation_joins_lines() {
        let out = lex_all("print a \\\nb\n");
        let kinds: Vec<TokenKind> = out.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Eol,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unmatched_brace_reports_opener_position() {
        let mut tokens = Tokenizer::new();
        let err = tokens.push_source_str("proc {a b").expect_err("must fail");
        assert!(err.message.contains("Unmatched {"));
        assert_eq!(err.token.position, 5);
    }

    #[test]
    fn unmatched_quote_fails() {
        let mut tokens = Tokenizer::new();
        let err = tokens.push_source_str("print \"oops\n").expect_err("must fail");
        assert!(err.message.contains("Unmatched \""));
    }

    #[test]
    fn multiline_brace_refills_from_stream() {
        let source = "def f {} {\nprint hi\n}\n";
        let mut tokens = Tokenizer::new();
        tokens
            .push_source_stream(Box::new(std::io::Cursor::new(source.to_owned())))
            .expect("stream lexes cleanly");
        let mut kinds = Vec::new();
        while tokens.is_more() {
            kinds.push(tokens.get_token().expect("token available").kind);
        }
        assert!(kinds.contains(&TokenKind::Block));
    }

    #[test]
    fn token_positions_round_trip() {
        let source = "local greeting \"hi $name\"\nprint [x] {y z}\n";
        for token in lex_all(source) {
            if token.kind == TokenKind::Eof || token.kind == TokenKind::Subcommand {
                continue;
            }
            let start = token.content_position();
            let end = start + token.text.len();
            assert_eq!(&source[start..end], token.text, "token {token:?}");
        }
    }

    #[test]
    fn pushed_token_keeps_absolute_positions() {
        let source = "print [add 2 3]\n";
        let mut tokens = Tokenizer::new();
        tokens.push_source_str(source).expect("lexes cleanly");
        tokens.next(); // print
        let sub = tokens.get_token().expect("subcommand token");
        assert_eq!(sub.kind, TokenKind::Subcommand);
        tokens.push_source_token(&sub).expect("body lexes cleanly");
        let head = tokens.get_token().expect("inner head");
        assert_eq!(head.text, "add");
        assert_eq!(&source[head.position..head.position + 3], "add");
        tokens.pop_source();
    }
}
