//! Require specifier scanner.
//!
//! Tokenizes JavaScript source just far enough to find `require`/`import`/
//! `export ... from` specifiers. Strings, template literals, comments and
//! regular expression literals are skipped as whole tokens so that
//! look-alike text inside them is never reported.

use std::collections::HashSet;
use thiserror::Error;

/// How a specifier was referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireKind {
    /// `require("x")`
    CjsRequire,
    /// `import ... from "x"` or `import "x"`
    EsmImport,
    /// `import("x")`
    EsmDynamicImport,
    /// `export ... from "x"`
    EsmExport,
}

impl RequireKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CjsRequire => "cjs_require",
            Self::EsmImport => "esm_import",
            Self::EsmDynamicImport => "esm_dynamic_import",
            Self::EsmExport => "esm_export",
        }
    }
}

/// Specifier found in source code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireSpec {
    /// Specifier exactly as written between the quotes.
    pub raw: String,
    pub kind: RequireKind,
    /// Line of the string literal (1-indexed).
    pub line: u32,
}

/// The scan could not get past some construct in the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("unterminated string literal starting on line {line}")]
    UnterminatedString { line: u32 },

    #[error("unterminated template literal starting on line {line}")]
    UnterminatedTemplate { line: u32 },

    #[error("unterminated block comment starting on line {line}")]
    UnterminatedComment { line: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    /// String literal, or a template literal without interpolations.
    Str(String),
    Punct(char),
    /// Numbers, regexes, interpolated templates.
    Other,
}

#[derive(Debug)]
struct Lexed {
    token: Token,
    line: u32,
}

/// Identifiers after which a `/` starts a regex rather than a division.
const REGEX_PREFIX_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
];

struct Lexer<'a> {
    chars: &'a [char],
    pos: usize,
    line: u32,
    tokens: Vec<Lexed>,
    /// Open-brace counts for each `${` we are currently inside.
    templates: Vec<u32>,
}

impl<'a> Lexer<'a> {
    fn new(chars: &'a [char]) -> Self {
        Self {
            chars,
            pos: 0,
            line: 1,
            tokens: Vec::new(),
            templates: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, token: Token, line: u32) {
        self.tokens.push(Lexed { token, line });
    }

    fn regex_allowed(&self) -> bool {
        match self.tokens.last().map(|t| &t.token) {
            None => true,
            Some(Token::Punct(c @ ('+' | '-'))) if self.ends_with_postfix_update(*c) => false,
            Some(Token::Punct(c)) => !matches!(c, ')' | ']'),
            Some(Token::Ident(name)) => REGEX_PREFIX_KEYWORDS.contains(&name.as_str()),
            Some(Token::Str(_) | Token::Other) => false,
        }
    }

    /// `x++` or `a[i]--` at the end of the token list. After a postfix
    /// update a `/` divides.
    fn ends_with_postfix_update(&self, op: char) -> bool {
        let n = self.tokens.len();
        if n < 3 || self.tokens[n - 2].token != Token::Punct(op) {
            return false;
        }
        match &self.tokens[n - 3].token {
            Token::Ident(name) => !REGEX_PREFIX_KEYWORDS.contains(&name.as_str()),
            Token::Punct(')' | ']') => true,
            _ => false,
        }
    }

    /// Width of the line terminator at the cursor (`\r\n` is one), or 0.
    fn line_terminator_len(&self) -> usize {
        match self.peek(0) {
            Some('\r') if self.peek(1) == Some('\n') => 2,
            Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => 1,
            _ => 0,
        }
    }

    /// Skip a backslash and the character it escapes. An escaped line
    /// terminator is a line continuation.
    fn skip_escape(&mut self) {
        self.pos += 1;
        match self.line_terminator_len() {
            0 => self.pos += 1,
            width => {
                self.line += 1;
                self.pos += width;
            }
        }
    }

    fn run(mut self) -> Result<Vec<Lexed>, ExtractError> {
        if self.peek(0) == Some('#') && self.peek(1) == Some('!') {
            self.skip_line();
        }

        while let Some(c) = self.peek(0) {
            match c {
                '\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                c if c.is_whitespace() => self.pos += 1,
                '/' if self.peek(1) == Some('/') => self.skip_line(),
                '/' if self.peek(1) == Some('*') => self.skip_block_comment()?,
                '/' if self.regex_allowed() => {
                    if !self.skip_regex() {
                        self.pos += 1;
                        self.push(Token::Punct('/'), self.line);
                    }
                }
                '"' | '\'' => {
                    let line = self.line;
                    let value = self.read_string(c)?;
                    self.push(Token::Str(value), line);
                }
                '`' => {
                    self.pos += 1;
                    self.read_template(self.line)?;
                }
                '{' => {
                    if let Some(depth) = self.templates.last_mut() {
                        *depth += 1;
                    }
                    self.pos += 1;
                    self.push(Token::Punct('{'), self.line);
                }
                '}' => {
                    self.pos += 1;
                    match self.templates.last_mut() {
                        Some(0) => {
                            self.templates.pop();
                            self.read_template(self.line)?;
                        }
                        Some(depth) => {
                            *depth -= 1;
                            self.push(Token::Punct('}'), self.line);
                        }
                        None => self.push(Token::Punct('}'), self.line),
                    }
                }
                c if is_ident_start(c) => {
                    let start = self.pos;
                    while self.peek(0).is_some_and(is_ident_part) {
                        self.pos += 1;
                    }
                    let name: String = self.chars[start..self.pos].iter().collect();
                    self.push(Token::Ident(name), self.line);
                }
                c if c.is_ascii_digit() => {
                    while self
                        .peek(0)
                        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
                    {
                        self.pos += 1;
                    }
                    self.push(Token::Other, self.line);
                }
                c => {
                    self.pos += 1;
                    self.push(Token::Punct(c), self.line);
                }
            }
        }

        Ok(self.tokens)
    }

    fn skip_line(&mut self) {
        while self.peek(0).is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), ExtractError> {
        let line = self.line;
        self.pos += 2;
        loop {
            match self.peek(0) {
                None => return Err(ExtractError::UnterminatedComment { line }),
                Some('*') if self.peek(1) == Some('/') => {
                    self.pos += 2;
                    return Ok(());
                }
                Some('\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    /// Skip a regex literal. Returns false (position untouched) when the
    /// slash does not start a single-line regex.
    fn skip_regex(&mut self) -> bool {
        let mut i = self.pos + 1;
        let mut in_class = false;
        loop {
            match self.chars.get(i) {
                None | Some('\n') => return false,
                Some('\\') => i += 2,
                Some('[') => {
                    in_class = true;
                    i += 1;
                }
                Some(']') => {
                    in_class = false;
                    i += 1;
                }
                Some('/') if !in_class => {
                    i += 1;
                    break;
                }
                Some(_) => i += 1,
            }
        }
        while self.chars.get(i).is_some_and(|c| c.is_ascii_alphabetic()) {
            i += 1;
        }
        self.pos = i;
        self.push(Token::Other, self.line);
        true
    }

    fn read_string(&mut self, quote: char) -> Result<String, ExtractError> {
        let line = self.line;
        self.pos += 1;
        let start = self.pos;
        loop {
            match self.peek(0) {
                None | Some('\n') => return Err(ExtractError::UnterminatedString { line }),
                Some('\\') => self.skip_escape(),
                Some(c) if c == quote => break,
                Some(_) => self.pos += 1,
            }
        }
        let end = self.pos.min(self.chars.len());
        let value: String = self.chars[start..end].iter().collect();
        self.pos += 1;
        Ok(value)
    }

    /// Read template text up to the closing backtick or the next `${`.
    /// The opening backtick (or closing `}` of an interpolation) has already
    /// been consumed.
    fn read_template(&mut self, line: u32) -> Result<(), ExtractError> {
        let start = self.pos;
        let resumed = !matches!(self.chars.get(start.wrapping_sub(1)), Some('`'));
        loop {
            match self.peek(0) {
                None => return Err(ExtractError::UnterminatedTemplate { line }),
                Some('\\') => self.skip_escape(),
                Some('\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some('`') => {
                    let end = self.pos;
                    self.pos += 1;
                    if resumed {
                        self.push(Token::Other, line);
                    } else {
                        let value: String = self.chars[start..end].iter().collect();
                        self.push(Token::Str(value), line);
                    }
                    return Ok(());
                }
                Some('$') if self.peek(1) == Some('{') => {
                    self.pos += 2;
                    self.templates.push(0);
                    self.push(Token::Other, line);
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Maximum tokens between `import`/`export` and `from`.
const MAX_CLAUSE_TOKENS: usize = 512;

/// Scan source code for require/import specifiers.
///
/// Returns specifiers in first-appearance order, deduplicated by `raw`.
pub fn scan_requires(source: &str) -> Result<Vec<RequireSpec>, ExtractError> {
    let chars: Vec<char> = source.chars().collect();
    let tokens = Lexer::new(&chars).run()?;

    let mut results = Vec::new();
    let mut seen = HashSet::new();
    let mut record = |raw: &str, kind: RequireKind, line: u32| {
        if !raw.is_empty() && seen.insert(raw.to_string()) {
            results.push(RequireSpec {
                raw: raw.to_string(),
                kind,
                line,
            });
        }
    };

    let at = |i: usize| tokens.get(i).map(|t| &t.token);

    for i in 0..tokens.len() {
        let Token::Ident(name) = &tokens[i].token else {
            continue;
        };
        // `obj.require(...)`, `import.meta`
        if i > 0 && at(i - 1) == Some(&Token::Punct('.')) {
            continue;
        }

        match name.as_str() {
            "require" => {
                if let (Some(Token::Punct('(')), Some(Token::Str(spec)), Some(Token::Punct(')'))) =
                    (at(i + 1), at(i + 2), at(i + 3))
                {
                    record(spec, RequireKind::CjsRequire, tokens[i + 2].line);
                }
            }
            "import" => match (at(i + 1), at(i + 2)) {
                (Some(Token::Punct('(')), Some(Token::Str(spec)))
                    if matches!(at(i + 3), Some(Token::Punct(')' | ','))) =>
                {
                    record(spec, RequireKind::EsmDynamicImport, tokens[i + 2].line);
                }
                (Some(Token::Str(spec)), _) => {
                    record(spec, RequireKind::EsmImport, tokens[i + 1].line);
                }
                (Some(Token::Ident(_) | Token::Punct('{' | '*')), _) => {
                    if let Some(j) = find_from_clause(&tokens, i + 1) {
                        if let Token::Str(spec) = &tokens[j].token {
                            record(spec, RequireKind::EsmImport, tokens[j].line);
                        }
                    }
                }
                _ => {}
            },
            "export" => {
                if matches!(at(i + 1), Some(Token::Punct('{' | '*'))) {
                    if let Some(j) = find_from_clause(&tokens, i + 1) {
                        if let Token::Str(spec) = &tokens[j].token {
                            record(spec, RequireKind::EsmExport, tokens[j].line);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok(results)
}

/// Find the string token following `from` in an import/export clause.
///
/// Only identifiers, braces, commas and `*` may appear before `from`.
fn find_from_clause(tokens: &[Lexed], start: usize) -> Option<usize> {
    let end = (start + MAX_CLAUSE_TOKENS).min(tokens.len());
    for j in start..end {
        match &tokens[j].token {
            // `import { from } from "x"` has a `from` that is not followed by a string.
            Token::Ident(name)
                if name == "from"
                    && matches!(tokens.get(j + 1).map(|t| &t.token), Some(Token::Str(_))) =>
            {
                return Some(j + 1);
            }
            Token::Ident(name) if name == "import" || name == "export" => return None,
            Token::Ident(_) | Token::Punct('{' | '}' | ',' | '*') => {}
            _ => return None,
        }
    }
    None
}
