//! A forgiving JSON reader for the mistakes small models tend to make.
//!
//! Accepted on top of strict JSON:
//!
//! - single-quoted and smart-quoted strings;
//! - unquoted object keys, and bare words as string values;
//! - Python literals `True`, `False` and `None`;
//! - trailing commas, missing commas between members;
//! - `//` and `/* */` comments;
//! - a leading `+` or `.` in numbers;
//! - any text after the first complete value.
//!
//! Containers may nest at most [`MAX_DEPTH`] levels deep.
//!
//! This is not a full repair parser. It never guesses at structure: an
//! unclosed container or string is an error here, and recovering from
//! truncation is left to the caller.

use serde_json::{Map, Number, Value};

/// The deepest nesting of objects and arrays accepted, matching the
/// recursion limit of `serde_json`.
pub const MAX_DEPTH: usize = 128;

/// Position and reason of a lenient decode failure.
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    /// Character offset where decoding stopped.
    pub offset: usize,
    /// What was expected at that offset.
    pub message: &'static str,
}

/// Decodes the first value in `text`, ignoring whatever follows it.
pub fn parse(text: &str) -> Result<Value, Error> {
    let mut parser = Parser {
        chars: text.chars().collect(),
        pos: 0,
        depth: 0,
    };
    parser.skip_trivia();
    parser.parse_value()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    #[inline]
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    #[inline]
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    #[inline]
    fn error(&self, message: &'static str) -> Error {
        Error {
            offset: self.pos,
            message,
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while self.pos < self.chars.len() {
                        if self.peek() == Some('*') && self.peek_at(1) == Some('/')
                        {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, Error> {
        let Some(c) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };
        match c {
            '{' | '[' => {
                if self.depth == MAX_DEPTH {
                    return Err(self.error("nesting too deep"));
                }
                self.depth += 1;
                let value = if c == '{' {
                    self.parse_object()
                } else {
                    self.parse_array()
                };
                self.depth -= 1;
                value
            }
            c if closing_quote(c).is_some() => {
                self.parse_string().map(Value::String)
            }
            c if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.parse_number()
            }
            c if is_word_start(c) => {
                let word = self.parse_word();
                Ok(match word.as_str() {
                    "true" | "True" => Value::Bool(true),
                    "false" | "False" => Value::Bool(false),
                    "null" | "None" => Value::Null,
                    _ => Value::String(word),
                })
            }
            _ => Err(self.error("unexpected character")),
        }
    }

    fn parse_object(&mut self) -> Result<Value, Error> {
        self.pos += 1;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(self.error("unclosed object")),
                Some('}') => {
                    self.pos += 1;
                    return Ok(Value::Object(map));
                }
                Some(',') => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }

            let key = self.parse_key()?;
            self.skip_trivia();
            if self.peek() != Some(':') {
                return Err(self.error("expected `:` after object key"));
            }
            self.pos += 1;
            self.skip_trivia();
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_trivia();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                None => return Err(self.error("unclosed object")),
                // A missing comma is tolerated as long as another key
                // follows.
                Some(c) if closing_quote(c).is_some() || is_word_start(c) => {}
                Some(_) => return Err(self.error("expected `,` or `}`")),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, Error> {
        match self.peek() {
            Some(c) if closing_quote(c).is_some() => self.parse_string(),
            Some(c) if is_word_start(c) => Ok(self.parse_word()),
            _ => Err(self.error("expected object key")),
        }
    }

    fn parse_array(&mut self) -> Result<Value, Error> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return Err(self.error("unclosed array")),
                Some(']') => {
                    self.pos += 1;
                    return Ok(Value::Array(items));
                }
                Some(',') => {
                    self.pos += 1;
                    continue;
                }
                _ => {}
            }
            items.push(self.parse_value()?);
        }
    }

    fn parse_string(&mut self) -> Result<String, Error> {
        let Some(close) = self.peek().and_then(closing_quote) else {
            return Err(self.error("expected string"));
        };
        let open = self.chars[self.pos];
        self.pos += 1;

        let mut out = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            // Smart-quoted strings may be closed by either quote of the pair.
            if c == close || (open == '\u{201C}' && c == '"') {
                return Ok(out);
            }
            if c != '\\' {
                out.push(c);
                continue;
            }

            let Some(escaped) = self.peek() else {
                break;
            };
            self.pos += 1;
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'u' => out.push(self.parse_unicode_escape()?),
                other => out.push(other),
            }
        }
        Err(self.error("unterminated string"))
    }

    fn parse_unicode_escape(&mut self) -> Result<char, Error> {
        let high = self.read_hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return Ok(
                char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER)
            );
        }
        // Surrogate pair.
        if self.peek() == Some('\\') && self.peek_at(1) == Some('u') {
            self.pos += 2;
            let low = self.read_hex4()?;
            if (0xDC00..0xE000).contains(&low) {
                let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                return Ok(
                    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                );
            }
        }
        Ok(char::REPLACEMENT_CHARACTER)
    }

    fn read_hex4(&mut self) -> Result<u32, Error> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("invalid unicode escape"))?;
            code = code * 16 + digit;
            self.pos += 1;
        }
        Ok(code)
    }

    fn parse_number(&mut self) -> Result<Value, Error> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw: String = self.chars[start..self.pos].iter().collect();
        let mut literal = raw.strip_prefix('+').unwrap_or(&raw).to_owned();
        if literal.starts_with('.') {
            literal.insert(0, '0');
        } else if literal.starts_with("-.") {
            literal.insert(1, '0');
        }

        if let Ok(n) = literal.parse::<i64>() {
            return Ok(Value::Number(n.into()));
        }
        if let Ok(n) = literal.parse::<u64>() {
            return Ok(Value::Number(n.into()));
        }
        literal
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or(Error {
                offset: start,
                message: "invalid number",
            })
    }

    fn parse_word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '$' | '.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.chars[start..self.pos].iter().collect()
    }
}

#[inline]
fn closing_quote(open: char) -> Option<char> {
    match open {
        '"' => Some('"'),
        '\'' => Some('\''),
        '\u{201C}' => Some('\u{201D}'),
        '\u{2018}' => Some('\u{2019}'),
        _ => None,
    }
}

#[inline]
fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}
