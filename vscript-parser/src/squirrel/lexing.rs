//! The Squirrel tokenizer.
//!
//! `tokenize` turns source text into a flat token sequence plus lexical
//! diagnostics. It never fails: unrecognised characters become `Invalid`
//! tokens, unterminated literals produce a single diagnostic and a
//! best-effort token spanning to end of input. Token spans, trivia included,
//! partition `[0, len]` and end with a zero-width `Eof` token.
//!
//! String scanning records one pre-decode source offset per decoded
//! character (plus a trailing sentinel), so positions inside a decoded
//! string value can be mapped back to the original text even though escape
//! decoding changes lengths. The same mapping seeds the recursive
//! tokenization of script embedded in `RunScriptCode` string arguments:
//! tokens and diagnostics of the embedded tokenization carry offsets into
//! the outer file, not into the decoded string.

use serde::Serialize;

use super::diagnostics::Diagnostic;
use super::token::{StringData, Token, TokenKind, KEYWORDS};

/// The result of tokenizing one piece of text. Owned and immutable once
/// produced; embedded tokenizations hang off their string token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tokenization {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Tokenization {
    /// Binary search for the token whose span contains `offset`. Recurses
    /// into embedded tokenizations; a string token with embedded script
    /// is returned itself when `offset` falls between embedded tokens.
    pub fn find_token_at_position(&self, offset: usize) -> Option<&Token> {
        let mut lo = 0usize;
        let mut hi = self.tokens.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            let token = &self.tokens[mid];
            if offset < token.start {
                hi = mid;
            } else if offset >= token.end {
                lo = mid + 1;
            } else {
                if let Some(data) = token.string.as_deref() {
                    if let Some(embedded) = &data.embedded {
                        if let Some(inner) = embedded.find_token_at_position(offset) {
                            return Some(inner);
                        }
                    }
                }
                return Some(token);
            }
        }
        None
    }
}

/// Tokenize `text`, deterministic and pure.
pub fn tokenize(text: &str) -> Tokenization {
    tokenize_impl(text, None)
}

fn tokenize_impl(text: &str, positions: Option<&[usize]>) -> Tokenization {
    let mut lexer = Lexer {
        text,
        bytes: text.as_bytes(),
        positions,
        offset: 0,
        tokens: Vec::new(),
        diagnostics: Vec::new(),
    };
    lexer.run();
    let mut result = Tokenization {
        tokens: lexer.tokens,
        diagnostics: lexer.diagnostics,
    };
    attach_embedded(&mut result);
    result
}

/// Post-pass over a token stream: a string literal spelled `RunScriptCode`
/// (case-insensitive), optionally followed by a comma, then a second string
/// literal, marks that second string as embedded script. Its decoded value
/// is tokenized recursively, seeded with the string's source positions so
/// all offsets land in the outer file. Embedded diagnostics are surfaced on
/// the outer tokenization.
fn attach_embedded(result: &mut Tokenization) {
    let len = result.tokens.len();
    let mut i = 0;
    while i < len {
        if !is_marker(&result.tokens[i]) {
            i += 1;
            continue;
        }
        let mut k = i + 1;
        while k < len && result.tokens[k].kind.is_trivia() {
            k += 1;
        }
        if k < len && result.tokens[k].kind == TokenKind::Comma {
            k += 1;
            while k < len && result.tokens[k].kind.is_trivia() {
                k += 1;
            }
        }
        if k >= len || !result.tokens[k].kind.is_string() {
            i += 1;
            continue;
        }
        let source = {
            let token = &result.tokens[k];
            match (&token.value, &token.string) {
                (Some(value), Some(data)) => {
                    Some((value.clone(), data.source_positions.clone()))
                }
                _ => None,
            }
        };
        if let Some((value, positions)) = source {
            let mut child = tokenize_impl(&value, Some(&positions));
            result.diagnostics.append(&mut child.diagnostics);
            if let Some(data) = result.tokens[k].string.as_mut() {
                data.embedded = Some(child);
            }
        }
        i = k + 1;
    }
}

fn is_marker(token: &Token) -> bool {
    token.kind.is_string()
        && token
            .value
            .as_deref()
            .is_some_and(|v| v.eq_ignore_ascii_case("runscriptcode"))
}

struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    /// When tokenizing a decoded string value, maps value offsets back to
    /// offsets in the original file. `None` for top-level text (identity).
    positions: Option<&'a [usize]>,
    offset: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    fn pos(&self, offset: usize) -> usize {
        match self.positions {
            Some(positions) => positions[offset.min(positions.len() - 1)],
            None => offset,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.offset + ahead).copied()
    }

    fn char_at(&self, offset: usize) -> char {
        self.text[offset..].chars().next().unwrap_or('\0')
    }

    /// Adjacent diagnostics sharing a start are collapsed to the first one,
    /// so a single malformed construct does not cascade.
    fn report(&mut self, diagnostic: Diagnostic) {
        if self.diagnostics.last().map(|d| d.start) == Some(diagnostic.start) {
            return;
        }
        self.diagnostics.push(diagnostic);
    }

    fn op(&mut self, kind: TokenKind, length: usize) {
        let start = self.offset;
        self.offset += length;
        self.tokens
            .push(Token::new(kind, self.pos(start), self.pos(self.offset)));
    }

    fn run(&mut self) {
        while self.offset < self.bytes.len() {
            match self.bytes[self.offset] {
                b' ' | b'\t' | b'\r' => self.scan_whitespace(),
                b'\n' => self.op(TokenKind::LineFeed, 1),
                b'(' => self.op(TokenKind::OpenRound, 1),
                b')' => self.op(TokenKind::CloseRound, 1),
                b'{' => self.op(TokenKind::OpenCurly, 1),
                b'}' => self.op(TokenKind::CloseCurly, 1),
                b'[' => self.op(TokenKind::OpenSquare, 1),
                b']' => self.op(TokenKind::CloseSquare, 1),
                b';' => self.op(TokenKind::Semicolon, 1),
                b',' => self.op(TokenKind::Comma, 1),
                b'?' => self.op(TokenKind::Question, 1),
                b'^' => self.op(TokenKind::Caret, 1),
                b'~' => self.op(TokenKind::Tilde, 1),
                b':' => match self.peek(1) {
                    Some(b':') => self.op(TokenKind::DoubleColon, 2),
                    _ => self.op(TokenKind::Colon, 1),
                },
                b'=' => match self.peek(1) {
                    Some(b'=') => self.op(TokenKind::Equals, 2),
                    _ => self.op(TokenKind::Assign, 1),
                },
                b'!' => match self.peek(1) {
                    Some(b'=') => self.op(TokenKind::NotEquals, 2),
                    _ => self.op(TokenKind::Exclamation, 1),
                },
                b'&' => match self.peek(1) {
                    Some(b'&') => self.op(TokenKind::AmpersandAmpersand, 2),
                    _ => self.op(TokenKind::Ampersand, 1),
                },
                b'|' => match self.peek(1) {
                    Some(b'|') => self.op(TokenKind::PipePipe, 2),
                    _ => self.op(TokenKind::Pipe, 1),
                },
                b'*' => match self.peek(1) {
                    Some(b'=') => self.op(TokenKind::AsteriskAssign, 2),
                    _ => self.op(TokenKind::Asterisk, 1),
                },
                b'%' => match self.peek(1) {
                    Some(b'=') => self.op(TokenKind::PercentAssign, 2),
                    _ => self.op(TokenKind::Percent, 1),
                },
                b'+' => match self.peek(1) {
                    Some(b'+') => self.op(TokenKind::PlusPlus, 2),
                    Some(b'=') => self.op(TokenKind::PlusAssign, 2),
                    _ => self.op(TokenKind::Plus, 1),
                },
                b'-' => match self.peek(1) {
                    Some(b'-') => self.op(TokenKind::MinusMinus, 2),
                    Some(b'=') => self.op(TokenKind::MinusAssign, 2),
                    _ => self.op(TokenKind::Minus, 1),
                },
                b'<' => match (self.peek(1), self.peek(2)) {
                    (Some(b'='), Some(b'>')) => self.op(TokenKind::ThreeWayCompare, 3),
                    (Some(b'='), _) => self.op(TokenKind::LessEquals, 2),
                    (Some(b'-'), _) => self.op(TokenKind::NewSlot, 2),
                    (Some(b'<'), _) => self.op(TokenKind::ShiftLeft, 2),
                    (Some(b'/'), _) => self.op(TokenKind::AttrOpen, 2),
                    _ => self.op(TokenKind::Less, 1),
                },
                b'>' => match (self.peek(1), self.peek(2)) {
                    (Some(b'>'), Some(b'>')) => self.op(TokenKind::UnsignedShiftRight, 3),
                    (Some(b'>'), _) => self.op(TokenKind::ShiftRight, 2),
                    (Some(b'='), _) => self.op(TokenKind::GreaterEquals, 2),
                    _ => self.op(TokenKind::Greater, 1),
                },
                b'/' => match self.peek(1) {
                    Some(b'/') => self.scan_line_comment(),
                    Some(b'*') => self.scan_block_comment(),
                    Some(b'=') => self.op(TokenKind::SlashAssign, 2),
                    Some(b'>') => self.op(TokenKind::AttrClose, 2),
                    _ => self.op(TokenKind::Slash, 1),
                },
                b'.' => match (self.peek(1), self.peek(2)) {
                    (Some(b'.'), Some(b'.')) => self.op(TokenKind::Varparams, 3),
                    (Some(b'.'), _) => {
                        let (start, end) = (self.pos(self.offset), self.pos(self.offset + 2));
                        self.report(Diagnostic::error("Invalid token '..'", start, end));
                        self.tokens.push(Token::with_value(
                            TokenKind::Invalid,
                            start,
                            end,
                            "..".to_string(),
                        ));
                        self.offset += 2;
                    }
                    _ => self.op(TokenKind::Dot, 1),
                },
                b'#' => self.scan_line_comment(),
                b'@' => match self.peek(1) {
                    Some(b'"') | Some(b'`') => self.scan_verbatim_string(),
                    _ => self.op(TokenKind::At, 1),
                },
                b'"' => self.scan_string(b'"'),
                b'\'' => self.scan_string(b'\''),
                b'0'..=b'9' => self.scan_number(),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),
                _ => self.scan_invalid(),
            }
        }
        let end = self.pos(self.bytes.len());
        self.tokens.push(Token::new(TokenKind::Eof, end, end));
    }

    fn scan_whitespace(&mut self) {
        let start = self.offset;
        while matches!(self.bytes.get(self.offset), Some(b' ') | Some(b'\t') | Some(b'\r')) {
            self.offset += 1;
        }
        self.tokens.push(Token::new(
            TokenKind::Whitespace,
            self.pos(start),
            self.pos(self.offset),
        ));
    }

    fn scan_invalid(&mut self) {
        let c = self.char_at(self.offset);
        let width = c.len_utf8();
        let (start, end) = (self.pos(self.offset), self.pos(self.offset + width));
        self.report(Diagnostic::error("Invalid character.", start, end));
        self.tokens
            .push(Token::with_value(TokenKind::Invalid, start, end, c.to_string()));
        self.offset += width;
    }

    fn scan_identifier(&mut self) {
        let start = self.offset;
        while matches!(self.bytes.get(self.offset), Some(b) if b.is_ascii_alphanumeric() || *b == b'_')
        {
            self.offset += 1;
        }
        let text = &self.text[start..self.offset];
        let (start, end) = (self.pos(start), self.pos(self.offset));
        match KEYWORDS.get(text) {
            Some(&kind) => self.tokens.push(Token::new(kind, start, end)),
            None => self.tokens.push(Token::with_value(
                TokenKind::Identifier,
                start,
                end,
                text.to_string(),
            )),
        }
    }

    fn scan_line_comment(&mut self) {
        let start = self.offset;
        while self.offset < self.bytes.len() && self.bytes[self.offset] != b'\n' {
            self.offset += 1;
        }
        let value = self.text[start..self.offset].to_string();
        self.tokens.push(Token::with_value(
            TokenKind::LineComment,
            self.pos(start),
            self.pos(self.offset),
            value,
        ));
    }

    fn scan_block_comment(&mut self) {
        let start = self.offset;
        self.offset += 2;
        let mut kind = TokenKind::BlockComment;
        // "/**" not immediately closed is a doc comment; "/**/" is not.
        if self.peek(0) == Some(b'*') && self.peek(1) != Some(b'/') {
            kind = TokenKind::DocComment;
            self.offset += 1;
        }
        let mut closed = false;
        while self.offset < self.bytes.len() {
            if self.bytes[self.offset] == b'*' && self.peek(1) == Some(b'/') {
                self.offset += 2;
                closed = true;
                break;
            }
            self.offset += 1;
        }
        if !closed {
            let at = self.pos(self.bytes.len());
            self.report(Diagnostic::error("'*/' expected.", at, at));
        }
        let value = self.text[start..self.offset].to_string();
        self.tokens.push(Token::with_value(
            kind,
            self.pos(start),
            self.pos(self.offset),
            value,
        ));
    }

    fn scan_number(&mut self) {
        let start = self.offset;
        let first = self.bytes[self.offset];
        self.offset += 1;
        if first == b'0' {
            match self.bytes.get(self.offset) {
                Some(b'0'..=b'7') => return self.scan_octal(start),
                Some(b'x') | Some(b'X') => return self.scan_hexadecimal(start),
                _ => {}
            }
        }
        let leading_zero = first == b'0' && matches!(self.bytes.get(self.offset), Some(b'8'..=b'9'));
        let mut kind = TokenKind::Integer;
        let mut found_exponent = false;
        let mut trailing_from: Option<usize> = None;
        while let Some(&b) = self.bytes.get(self.offset) {
            match b {
                b'0'..=b'9' => self.offset += 1,
                b'.' => {
                    if kind == TokenKind::Integer {
                        kind = TokenKind::Float;
                    } else if trailing_from.is_none() {
                        trailing_from = Some(self.offset);
                    }
                    self.offset += 1;
                }
                b'e' | b'E' => {
                    if found_exponent {
                        trailing_from.get_or_insert(self.offset);
                        self.offset += 1;
                        if matches!(self.bytes.get(self.offset), Some(b'+') | Some(b'-')) {
                            self.offset += 1;
                        }
                        continue;
                    }
                    kind = TokenKind::Float;
                    found_exponent = true;
                    self.offset += 1;
                    if matches!(self.bytes.get(self.offset), Some(b'+') | Some(b'-')) {
                        self.offset += 1;
                    }
                    if !matches!(self.bytes.get(self.offset), Some(b'0'..=b'9')) {
                        let (s, e) = (self.pos(start), self.pos(self.offset));
                        self.report(Diagnostic::error("Exponent expected.", s, e));
                    }
                }
                _ => break,
            }
        }
        let (token_start, token_end) = (self.pos(start), self.pos(self.offset));
        if leading_zero {
            self.report(Diagnostic::warning(
                "Leading 0 in a number literal.",
                token_start,
                token_end,
            ));
        }
        if let Some(from) = trailing_from {
            self.report(Diagnostic::warning(
                "Trailing part in a number literal.",
                self.pos(from),
                token_end,
            ));
        }
        let value = self.text[start..self.offset].to_string();
        self.tokens
            .push(Token::with_value(kind, token_start, token_end, value));
    }

    /// Octal run after a leading `0`. The decoded decimal value becomes the
    /// token value; a digit past 7 poisons the literal but the whole digit
    /// run is still consumed.
    fn scan_octal(&mut self, start: usize) {
        let mut value: u64 = 0;
        while let Some(&b) = self.bytes.get(self.offset) {
            match b {
                b'0'..=b'7' => {
                    value = value.wrapping_mul(8).wrapping_add(u64::from(b - b'0'));
                    self.offset += 1;
                }
                b'8' | b'9' => {
                    while matches!(self.bytes.get(self.offset), Some(b'0'..=b'9')) {
                        self.offset += 1;
                    }
                    let (s, e) = (self.pos(start), self.pos(self.offset));
                    self.report(Diagnostic::error("Invalid octal number.", s, e));
                    break;
                }
                _ => break,
            }
        }
        self.tokens.push(Token::with_value(
            TokenKind::Integer,
            self.pos(start),
            self.pos(self.offset),
            value.to_string(),
        ));
    }

    fn scan_hexadecimal(&mut self, start: usize) {
        self.offset += 1; // past the x
        let mut value: u64 = 0;
        while let Some(&b) = self.bytes.get(self.offset) {
            if let Some(digit) = hex_value(b) {
                value = value.wrapping_mul(16).wrapping_add(digit);
                self.offset += 1;
            } else if b.is_ascii_alphanumeric() {
                while matches!(self.bytes.get(self.offset), Some(b) if b.is_ascii_alphanumeric()) {
                    self.offset += 1;
                }
                let (s, e) = (self.pos(start), self.pos(self.offset));
                self.report(Diagnostic::error("Invalid hexadecimal number.", s, e));
                break;
            } else {
                break;
            }
        }
        self.tokens.push(Token::with_value(
            TokenKind::Integer,
            self.pos(start),
            self.pos(self.offset),
            value.to_string(),
        ));
    }

    /// Double-quoted strings and single-quoted character literals share one
    /// scanner keyed by the delimiter. Character literals come out as an
    /// `Integer` token holding the decimal character code.
    fn scan_string(&mut self, delimiter: u8) {
        let start = self.offset;
        let is_char = delimiter == b'\'';
        self.offset += 1;
        let mut value = String::new();
        let mut positions: Vec<usize> = Vec::new();
        let mut closed = false;
        let mut sentinel = self.bytes.len();
        while let Some(&b) = self.bytes.get(self.offset) {
            if b == delimiter {
                sentinel = self.offset;
                self.offset += 1;
                closed = true;
                break;
            }
            match b {
                b'\n' => {
                    let literal = if is_char { "character" } else { "string" };
                    let at = self.pos(self.offset);
                    self.report(Diagnostic::error(
                        format!("Multiline in a {literal} literal."),
                        at,
                        at,
                    ));
                    self.offset += 1;
                }
                b'`' => {
                    // A doubled back-tick is an alternate quote escape.
                    positions.push(self.pos(self.offset));
                    if self.peek(1) == Some(b'`') {
                        value.push('"');
                        self.offset += 2;
                    } else {
                        value.push('`');
                        self.offset += 1;
                    }
                }
                b'\\' => self.scan_escape(&mut value, &mut positions),
                _ => {
                    let c = self.char_at(self.offset);
                    positions.push(self.pos(self.offset));
                    value.push(c);
                    self.offset += c.len_utf8();
                }
            }
        }
        positions.push(self.pos(sentinel));
        let (token_start, token_end) = (self.pos(start), self.pos(self.offset));
        if !closed {
            let literal = if is_char { "character" } else { "string" };
            let at = self.pos(self.bytes.len());
            self.report(Diagnostic::error(
                format!("Unterminated {literal} literal."),
                at,
                at,
            ));
        }
        if is_char {
            let value = if closed {
                let mut chars = value.chars();
                match chars.next() {
                    None => {
                        self.report(Diagnostic::error(
                            "Character literal should contain a character.",
                            token_start,
                            token_end,
                        ));
                        "0".to_string()
                    }
                    Some(first) => {
                        if chars.next().is_some() {
                            self.report(Diagnostic::error(
                                "Character literal can only contain a single character.",
                                token_start,
                                token_end,
                            ));
                        }
                        (first as u32).to_string()
                    }
                }
            } else {
                value
            };
            self.tokens.push(Token::with_value(
                TokenKind::Integer,
                token_start,
                token_end,
                value,
            ));
            return;
        }
        let mut token = Token::with_value(TokenKind::String, token_start, token_end, value);
        token.string = Some(Box::new(StringData {
            source_positions: positions,
            embedded: None,
        }));
        self.tokens.push(token);
    }

    fn scan_escape(&mut self, value: &mut String, positions: &mut Vec<usize>) {
        let escape_start = self.offset;
        self.offset += 1;
        let Some(&b) = self.bytes.get(self.offset) else {
            let at = self.pos(escape_start);
            self.report(Diagnostic::error(
                "Unrecognised escape character.",
                at,
                self.pos(self.offset),
            ));
            return;
        };
        match b {
            b'x' => self.scan_hex_escape(escape_start, 2, value, positions),
            b'u' => self.scan_hex_escape(escape_start, 4, value, positions),
            b'U' => self.scan_hex_escape(escape_start, 8, value, positions),
            b'`' => {
                // \` decodes to a backslash-quote pair, so re-escaping the
                // value yields a plain escaped quote.
                positions.push(self.pos(escape_start));
                value.push('\\');
                positions.push(self.pos(self.offset));
                value.push('"');
                self.offset += 1;
            }
            _ => {
                let decoded = match b {
                    b't' => Some('\t'),
                    b'a' => Some('\x07'),
                    b'b' => Some('\x08'),
                    b'n' => Some('\n'),
                    b'r' => Some('\r'),
                    b'v' => Some('\x0B'),
                    b'f' => Some('\x0C'),
                    b'0' => Some('\0'),
                    b'\\' => Some('\\'),
                    b'\'' => Some('\''),
                    b'"' => Some('"'),
                    _ => None,
                };
                match decoded {
                    Some(c) => {
                        positions.push(self.pos(escape_start));
                        value.push(c);
                        self.offset += 1;
                    }
                    None => {
                        let width = self.char_at(self.offset).len_utf8();
                        let (s, e) = (self.pos(escape_start), self.pos(self.offset + width));
                        self.report(Diagnostic::error("Unrecognised escape character.", s, e));
                        self.offset += width;
                    }
                }
            }
        }
    }

    fn scan_hex_escape(
        &mut self,
        escape_start: usize,
        max_digits: usize,
        value: &mut String,
        positions: &mut Vec<usize>,
    ) {
        self.offset += 1; // past the x/u/U marker
        let digits_start = self.offset;
        while self.offset - digits_start < max_digits
            && matches!(self.bytes.get(self.offset), Some(b) if b.is_ascii_hexdigit())
        {
            self.offset += 1;
        }
        if self.offset == digits_start {
            let (s, e) = (self.pos(escape_start), self.pos(self.offset));
            self.report(Diagnostic::error("Hexadecimal number expected.", s, e));
            return;
        }
        let code = u32::from_str_radix(&self.text[digits_start..self.offset], 16).unwrap_or(0);
        positions.push(self.pos(escape_start));
        value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    }

    /// `@"…"` and `` @`…` `` verbatim strings: no escapes, a doubled
    /// delimiter stands for a literal delimiter character.
    fn scan_verbatim_string(&mut self) {
        let start = self.offset;
        let delimiter = self.bytes[self.offset + 1];
        self.offset += 2;
        let mut value = String::new();
        let mut positions: Vec<usize> = Vec::new();
        let mut closed = false;
        let mut sentinel = self.bytes.len();
        while let Some(&b) = self.bytes.get(self.offset) {
            if b == delimiter {
                if self.peek(1) == Some(delimiter) {
                    positions.push(self.pos(self.offset));
                    value.push(delimiter as char);
                    self.offset += 2;
                } else {
                    sentinel = self.offset;
                    self.offset += 1;
                    closed = true;
                    break;
                }
            } else {
                let c = self.char_at(self.offset);
                positions.push(self.pos(self.offset));
                value.push(c);
                self.offset += c.len_utf8();
            }
        }
        positions.push(self.pos(sentinel));
        if !closed {
            let at = self.pos(self.bytes.len());
            self.report(Diagnostic::error("Unterminated string literal.", at, at));
        }
        let mut token = Token::with_value(
            TokenKind::VerbatimString,
            self.pos(start),
            self.pos(self.offset),
            value,
        );
        token.string = Some(Box::new(StringData {
            source_positions: positions,
            embedded: None,
        }));
        self.tokens.push(token);
    }
}

fn hex_value(b: u8) -> Option<u64> {
    match b {
        b'0'..=b'9' => Some(u64::from(b - b'0')),
        b'a'..=b'f' => Some(u64::from(b - b'a' + 10)),
        b'A'..=b'F' => Some(u64::from(b - b'A' + 10)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squirrel::diagnostics::Severity;
    use proptest::prelude::*;
    use rstest::rstest;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_text_yields_single_eof() {
        let result = tokenize("");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].kind, TokenKind::Eof);
        assert_eq!((result.tokens[0].start, result.tokens[0].end), (0, 0));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_local_declaration_sequence() {
        assert_eq!(
            kinds("local x = 10;"),
            vec![
                TokenKind::LocalKeyword,
                TokenKind::Whitespace,
                TokenKind::Identifier,
                TokenKind::Whitespace,
                TokenKind::Assign,
                TokenKind::Whitespace,
                TokenKind::Integer,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[rstest]
    #[case("<=>", TokenKind::ThreeWayCompare)]
    #[case("<=", TokenKind::LessEquals)]
    #[case("<-", TokenKind::NewSlot)]
    #[case("<<", TokenKind::ShiftLeft)]
    #[case("</", TokenKind::AttrOpen)]
    #[case("/>", TokenKind::AttrClose)]
    #[case(">>>", TokenKind::UnsignedShiftRight)]
    #[case(">>", TokenKind::ShiftRight)]
    #[case(">=", TokenKind::GreaterEquals)]
    #[case("==", TokenKind::Equals)]
    #[case("!=", TokenKind::NotEquals)]
    #[case("&&", TokenKind::AmpersandAmpersand)]
    #[case("||", TokenKind::PipePipe)]
    #[case("::", TokenKind::DoubleColon)]
    #[case("...", TokenKind::Varparams)]
    #[case("++", TokenKind::PlusPlus)]
    #[case("+=", TokenKind::PlusAssign)]
    #[case("--", TokenKind::MinusMinus)]
    #[case("-=", TokenKind::MinusAssign)]
    #[case("*=", TokenKind::AsteriskAssign)]
    #[case("/=", TokenKind::SlashAssign)]
    #[case("%=", TokenKind::PercentAssign)]
    #[case("@", TokenKind::At)]
    fn test_operator(#[case] text: &str, #[case] expected: TokenKind) {
        assert_eq!(kinds(text), vec![expected, TokenKind::Eof]);
    }

    #[rstest]
    #[case("while", TokenKind::WhileKeyword)]
    #[case("foreach", TokenKind::ForeachKeyword)]
    #[case("instanceof", TokenKind::InstanceOfKeyword)]
    #[case("constructor", TokenKind::ConstructorKeyword)]
    #[case("rawcall", TokenKind::RawCallKeyword)]
    #[case("__FILE__", TokenKind::FileMacro)]
    fn test_keyword(#[case] text: &str, #[case] expected: TokenKind) {
        assert_eq!(kinds(text), vec![expected, TokenKind::Eof]);
    }

    #[test]
    fn test_identifier_value() {
        let result = tokenize("health_1");
        assert_eq!(result.tokens[0].kind, TokenKind::Identifier);
        assert_eq!(result.tokens[0].value.as_deref(), Some("health_1"));
    }

    #[test]
    fn test_escape_decoding_records_source_positions() {
        let result = tokenize("\"a\\nb\"");
        let token = &result.tokens[0];
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.value.as_deref(), Some("a\nb"));
        let data = token.string.as_deref().unwrap();
        assert_eq!(data.source_positions, vec![1, 2, 4, 5]);
        assert_eq!(
            data.source_positions.len(),
            token.value.as_deref().unwrap().len() + 1
        );
        assert!(data.source_positions.windows(2).all(|w| w[0] <= w[1]));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_unterminated_string() {
        let text = "local s = \"abc";
        let result = tokenize(text);
        assert_eq!(result.diagnostics.len(), 1);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.message, "Unterminated string literal.");
        assert_eq!(diagnostic.severity, Severity::Error);
        let token = &result.tokens[result.tokens.len() - 2];
        assert_eq!(token.kind, TokenKind::String);
        assert_eq!(token.value.as_deref(), Some("abc"));
        assert_eq!(token.end, text.len());
    }

    #[test]
    fn test_multiline_string() {
        let result = tokenize("\"a\nb\"");
        assert_eq!(result.tokens[0].value.as_deref(), Some("ab"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "Multiline in a string literal.");
    }

    #[test]
    fn test_backtick_quote_escape() {
        let result = tokenize("\"a``b\"");
        assert_eq!(result.tokens[0].value.as_deref(), Some("a\"b"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_octal_literal() {
        let result = tokenize("0755");
        assert_eq!(result.tokens[0].kind, TokenKind::Integer);
        assert_eq!(result.tokens[0].value.as_deref(), Some("493"));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_invalid_octal_consumes_full_run() {
        let result = tokenize("0759");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "Invalid octal number.");
        assert_eq!(result.tokens[0].end, 4);
        assert_eq!(result.tokens[0].value.as_deref(), Some("61"));
    }

    #[test]
    fn test_hexadecimal_literal() {
        let result = tokenize("0xFF");
        assert_eq!(result.tokens[0].value.as_deref(), Some("255"));
        assert!(result.diagnostics.is_empty());

        let result = tokenize("0xFG");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "Invalid hexadecimal number.");
    }

    #[test]
    fn test_leading_zero_warning() {
        let result = tokenize("08");
        assert_eq!(result.tokens[0].kind, TokenKind::Integer);
        assert_eq!(result.tokens[0].value.as_deref(), Some("08"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "Leading 0 in a number literal.");
        assert_eq!(result.diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_trailing_part_warning() {
        let result = tokenize("1.2.3");
        let token = &result.tokens[0];
        assert_eq!(token.kind, TokenKind::Float);
        assert_eq!(token.value.as_deref(), Some("1.2.3"));
        assert_eq!(result.diagnostics.len(), 1);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.message, "Trailing part in a number literal.");
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!((diagnostic.start, diagnostic.end), (3, 5));
    }

    #[test]
    fn test_exponent_expected() {
        let result = tokenize("1e+");
        assert_eq!(result.tokens[0].kind, TokenKind::Float);
        assert_eq!(result.tokens[0].value.as_deref(), Some("1e+"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "Exponent expected.");
    }

    #[test]
    fn test_char_literal_is_integer() {
        let result = tokenize("'A'");
        assert_eq!(result.tokens[0].kind, TokenKind::Integer);
        assert_eq!(result.tokens[0].value.as_deref(), Some("65"));
        assert!(result.tokens[0].string.is_none());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_empty_char_literal() {
        let result = tokenize("''");
        assert_eq!(result.tokens[0].value.as_deref(), Some("0"));
        assert_eq!(
            result.diagnostics[0].message,
            "Character literal should contain a character."
        );
    }

    #[test]
    fn test_multi_char_literal() {
        let result = tokenize("'ab'");
        assert_eq!(result.tokens[0].value.as_deref(), Some("97"));
        assert_eq!(
            result.diagnostics[0].message,
            "Character literal can only contain a single character."
        );
    }

    #[test]
    fn test_verbatim_string() {
        let result = tokenize("@\"a\"\"b\"");
        let token = &result.tokens[0];
        assert_eq!(token.kind, TokenKind::VerbatimString);
        assert_eq!(token.value.as_deref(), Some("a\"b"));
        assert!(result.diagnostics.is_empty());

        let result = tokenize("@\"oops");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "Unterminated string literal.");
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("// hi\n# there"),
            vec![
                TokenKind::LineComment,
                TokenKind::LineFeed,
                TokenKind::LineComment,
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("/* x */"), vec![TokenKind::BlockComment, TokenKind::Eof]);
        assert_eq!(kinds("/** doc */"), vec![TokenKind::DocComment, TokenKind::Eof]);
        assert_eq!(kinds("/**/"), vec![TokenKind::BlockComment, TokenKind::Eof]);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let result = tokenize("/* x");
        assert_eq!(result.tokens[0].kind, TokenKind::BlockComment);
        assert_eq!(result.tokens[0].end, 4);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "'*/' expected.");
    }

    #[test]
    fn test_invalid_character() {
        let result = tokenize("$");
        assert_eq!(result.tokens[0].kind, TokenKind::Invalid);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "Invalid character.");
    }

    #[test]
    fn test_double_dot_is_invalid() {
        let result = tokenize("..");
        assert_eq!(result.tokens[0].kind, TokenKind::Invalid);
        assert_eq!((result.tokens[0].start, result.tokens[0].end), (0, 2));
        assert_eq!(result.diagnostics[0].message, "Invalid token '..'");
    }

    #[test]
    fn test_find_token_at_position() {
        let result = tokenize("local x");
        assert_eq!(
            result.find_token_at_position(3).map(|t| t.kind),
            Some(TokenKind::LocalKeyword)
        );
        assert_eq!(
            result.find_token_at_position(6).map(|t| t.kind),
            Some(TokenKind::Identifier)
        );
        assert_eq!(result.find_token_at_position(7), None);
    }

    #[test]
    fn test_embedded_script_tokenization() {
        let text = "F(\"RunScriptCode\", \"local x = 5\")";
        let result = tokenize(text);
        assert!(result.diagnostics.is_empty());
        let script = result
            .tokens
            .iter()
            .find(|t| t.value.as_deref() == Some("local x = 5"))
            .unwrap();
        let embedded = script.string.as_deref().unwrap().embedded.as_ref().unwrap();
        assert_eq!(embedded.tokens[0].kind, TokenKind::LocalKeyword);
        // Embedded spans are outer-file offsets.
        assert_eq!(embedded.tokens[0].start, text.find("local").unwrap());

        let x = text.find("x =").unwrap();
        let token = result.find_token_at_position(x).unwrap();
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.value.as_deref(), Some("x"));

        // The opening quote is inside the string token but before any
        // embedded token; the lookup falls back to the string itself.
        let quote = text.rfind("\"local").unwrap();
        let token = result.find_token_at_position(quote).unwrap();
        assert_eq!(token.kind, TokenKind::String);
    }

    #[test]
    fn test_embedded_diagnostics_map_to_outer_file() {
        let text = "F(\"RunScriptCode\", \"local s = \\\"abc\")";
        let result = tokenize(text);
        assert_eq!(result.diagnostics.len(), 1);
        let diagnostic = &result.diagnostics[0];
        assert_eq!(diagnostic.message, "Unterminated string literal.");
        // The embedded string never closes, so the diagnostic lands on the
        // outer string's closing quote, not at decoded-value offset 14.
        assert_eq!(diagnostic.start, text.rfind('"').unwrap());
    }

    #[test]
    fn test_embedded_script_without_comma() {
        // The comma between the marker and the code string is optional.
        let text = "F(\"RunScriptCode\" \"local x = 5\")";
        let result = tokenize(text);
        let script = result
            .tokens
            .iter()
            .find(|t| t.value.as_deref() == Some("local x = 5"))
            .unwrap();
        let embedded = script.string.as_deref().unwrap().embedded.as_ref().unwrap();
        assert_eq!(embedded.tokens[0].kind, TokenKind::LocalKeyword);
        assert_eq!(embedded.tokens[0].start, text.find("local").unwrap());
    }

    #[test]
    fn test_marker_case_insensitive() {
        let text = "F(\"runscriptcode\", \"x\")";
        let result = tokenize(text);
        let script = result
            .tokens
            .iter()
            .find(|t| t.value.as_deref() == Some("x"))
            .unwrap();
        assert!(script.string.as_deref().unwrap().embedded.is_some());
    }

    proptest! {
        #[test]
        fn prop_token_spans_partition_input(text in "[ -~\t\n]{0,80}") {
            let result = tokenize(&text);
            let mut offset = 0;
            for token in &result.tokens[..result.tokens.len() - 1] {
                prop_assert_eq!(token.start, offset);
                prop_assert!(token.end > token.start);
                offset = token.end;
            }
            let eof = result.tokens.last().unwrap();
            prop_assert_eq!(eof.kind, TokenKind::Eof);
            prop_assert_eq!(offset, text.len());
            prop_assert_eq!((eof.start, eof.end), (text.len(), text.len()));
        }

        #[test]
        fn prop_tokenization_is_deterministic(text in "[ -~\t\n]{0,80}") {
            prop_assert_eq!(tokenize(&text), tokenize(&text));
        }
    }
}
