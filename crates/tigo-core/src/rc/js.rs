//! Restricted reader and writer for `.tigorc.js`.
//!
//! The reader accepts a single exported literal (`module.exports = {...};`
//! or `export default {...};`) built from objects, arrays, strings, numbers,
//! booleans and `null`. Unquoted keys, single quotes, trailing commas and
//! comments are allowed. Nothing is executed: any other expression is an
//! `InvalidConfig` error.

use crate::error::{Result, TigoError};
use serde_json::{Map, Number, Value};

const INDENT: &str = "  ";

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// Render `doc` as a CommonJS module.
pub fn render_module(doc: &Value) -> String {
    let mut out = String::from("module.exports = ");
    render_value(doc, 0, &mut out);
    out.push_str(";\n");
    out
}

fn render_value(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => push_quoted(s, out),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for item in items {
                push_indent(depth + 1, out);
                render_value(item, depth + 1, out);
                out.push_str(",\n");
            }
            push_indent(depth, out);
            out.push(']');
        }
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            for (key, item) in map {
                push_indent(depth + 1, out);
                if is_identifier(key) {
                    out.push_str(key);
                } else {
                    push_quoted(key, out);
                }
                out.push_str(": ");
                render_value(item, depth + 1, out);
                out.push_str(",\n");
            }
            push_indent(depth, out);
            out.push('}');
        }
    }
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn push_quoted(s: &str, out: &mut String) {
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
}

fn is_identifier(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Parse a `.tigorc.js` module into a document.
pub fn parse_module(source: &str) -> Result<Value> {
    let mut p = Parser::new(source);
    p.skip_trivia()?;
    if p.eat_word("module") {
        p.skip_trivia()?;
        p.expect('.')?;
        p.skip_trivia()?;
        if !p.eat_word("exports") {
            return Err(p.error("expected 'module.exports'"));
        }
        p.skip_trivia()?;
        p.expect('=')?;
    } else if p.eat_word("export") {
        p.skip_trivia()?;
        if !p.eat_word("default") {
            return Err(p.error("expected 'export default'"));
        }
    } else {
        return Err(p.error("expected 'module.exports =' or 'export default'"));
    }
    p.skip_trivia()?;
    let value = p.parse_value()?;
    p.skip_trivia()?;
    if p.peek() == Some(';') {
        p.pos += 1;
    }
    p.skip_trivia()?;
    if p.peek().is_some() {
        return Err(p.error("unexpected content after the exported value"));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.trim_start_matches('\u{feff}').chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, msg: &str) -> TigoError {
        let line = self.chars[..self.pos.min(self.chars.len())]
            .iter()
            .filter(|c| **c == '\n')
            .count()
            + 1;
        TigoError::InvalidConfig(format!(".tigorc.js line {line}: {msg}"))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        let len = word.chars().count();
        let matches = self
            .chars
            .get(self.pos..self.pos + len)
            .is_some_and(|s| s.iter().copied().eq(word.chars()));
        let boundary = !self
            .peek_at(len)
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        if matches && boundary {
            self.pos += len;
            true
        } else {
            false
        }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => self.pos += 1,
                            (None, _) => return Err(self.error("unterminated comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some(q @ ('\'' | '"')) => Ok(Value::String(self.parse_string(q)?)),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => {
                self.parse_number()
            }
            Some(_) => {
                if self.eat_word("true") {
                    Ok(Value::Bool(true))
                } else if self.eat_word("false") {
                    Ok(Value::Bool(false))
                } else if self.eat_word("null") {
                    Ok(Value::Null)
                } else {
                    Err(self.error("only literal values are supported"))
                }
            }
            None => Err(self.error("unexpected end of file")),
        }
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.expect('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.pos += 1;
                return Ok(Value::Object(map));
            }
            let key = self.parse_key()?;
            self.skip_trivia()?;
            self.expect(':')?;
            self.skip_trivia()?;
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {}
                _ => return Err(self.error("expected ',' or '}'")),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String> {
        match self.peek() {
            Some(q @ ('\'' | '"')) => self.parse_string(q),
            Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '$' => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
                {
                    self.pos += 1;
                }
                Ok(self.chars[start..self.pos].iter().collect())
            }
            _ => Err(self.error("expected an object key")),
        }
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {}
                _ => return Err(self.error("expected ',' or ']'")),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String> {
        self.expect(quote)?;
        let mut out = String::new();
        loop {
            let c = self
                .peek()
                .ok_or_else(|| self.error("unterminated string"))?;
            self.pos += 1;
            match c {
                c if c == quote => return Ok(out),
                '\n' => return Err(self.error("unterminated string")),
                '\\' => {
                    let esc = self
                        .peek()
                        .ok_or_else(|| self.error("unterminated string"))?;
                    self.pos += 1;
                    match esc {
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        '0' => out.push('\0'),
                        'u' => out.push(self.parse_unicode_escape()?),
                        '\n' => {}
                        other => out.push(other),
                    }
                }
                c => out.push(c),
            }
        }
    }

    fn parse_hex4(&mut self) -> Result<u32> {
        let hex: String = self
            .chars
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.error("truncated unicode escape"))?
            .iter()
            .collect();
        let code =
            u32::from_str_radix(&hex, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.pos += 4;
        Ok(code)
    }

    /// Body of a `\uXXXX` escape. A high surrogate must be followed by a
    /// `\uXXXX` low surrogate; the pair encodes one character.
    fn parse_unicode_escape(&mut self) -> Result<char> {
        let code = self.parse_hex4()?;
        let code = match code {
            0xD800..=0xDBFF => {
                if self.chars.get(self.pos..self.pos + 2) != Some(&['\\', 'u'][..]) {
                    return Err(self.error("unpaired surrogate in unicode escape"));
                }
                self.pos += 2;
                let low = self.parse_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(self.error("unpaired surrogate in unicode escape"));
                }
                0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00)
            }
            _ => code,
        };
        char::from_u32(code).ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn parse_number(&mut self) -> Result<Value> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E'))
            || (matches!(self.peek(), Some('-' | '+'))
                && self.pos > start
                && matches!(self.chars.get(self.pos - 1), Some('e' | 'E')))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let text = text.trim_start_matches('+');
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Number(Number::from(i)));
        }
        if let Ok(u) = text.parse::<u64>() {
            return Ok(Value::Number(Number::from(u)));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| self.error(&format!("invalid number '{text}'")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
