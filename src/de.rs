//! Decoding.
//!
//! The decoder turns text into a [`Document`], whose root is a [`Value`] tree.
//! Parsing is line-oriented: the input is split into lines, each line's
//! indentation is measured once, and a recursive descent over the line list
//! builds the tree. Each block is either a map (`key: value` lines), a sequence
//! (`- ` lines) or a single inline value.
//!
//! Rules enforced here:
//!
//! - indentation uses a single character (spaces or tabs) across the whole
//!   document;
//! - a block's lines share one indentation level; a dedent must return to the
//!   level of an enclosing block;
//! - keys are unique within a map and never empty;
//! - nesting deeper than [`ToonOptions::max_depth`] is rejected.
//!
//! Every failure is a parse error with the byte offset of the problem.
//!
//! ```rust
//! use toon_codec::de::parse_document;
//! use toon_codec::{ToonOptions, Value};
//!
//! let doc = parse_document(b"name: Ann\ntags: a, b\n", &ToonOptions::default()).unwrap();
//! let root = doc.root().as_map().unwrap();
//! assert_eq!(root.get("name"), Some(&Value::from("Ann")));
//! assert_eq!(doc.span(), 0..20);
//! ```

use crate::error::ParseErrorKind;
use crate::scalar::{classify_bare, parse_quoted};
use crate::{Error, Map, Result, ToonOptions, Value};
use std::ops::Range;
use tracing::trace;

/// A decoded document: the root value plus the byte range it spans.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
    span: Range<usize>,
}

impl Document {
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Byte range from the first to the last non-blank character of the input.
    /// Empty for a document without content.
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    pub fn into_value(self) -> Value {
        self.root
    }
}

/// Parses `input` into a [`Document`].
///
/// Input without any non-blank line decodes to [`Value::Null`].
///
/// # Errors
///
/// Returns [`Error::Parse`] for invalid UTF-8, malformed tokens, bad
/// indentation, duplicate or empty keys and nesting beyond the depth limit.
pub fn parse_document(input: &[u8], options: &ToonOptions) -> Result<Document> {
    let text = std::str::from_utf8(input).map_err(|err| {
        Error::parse(
            input,
            err.valid_up_to(),
            ParseErrorKind::InvalidUtf8,
            "input is not valid UTF-8",
        )
    })?;

    let lines = scan_lines(input, text)?;
    trace!(lines = lines.len(), bytes = input.len(), "scanned document");

    let (first, last) = match (lines.first(), lines.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Ok(Document {
                root: Value::Null,
                span: 0..0,
            })
        }
    };

    let mut parser = Parser {
        input,
        lines,
        pos: 0,
        max_depth: options.max_depth,
    };
    let root = parser.parse_block(1)?;

    if let Some(extra) = parser.peek() {
        let (kind, message) = if extra.indent > first.indent {
            (ParseErrorKind::UnexpectedIndentation, "line is indented deeper than its block")
        } else if extra.indent < first.indent {
            (ParseErrorKind::DedentToUnknownLevel, "dedent below the document's indentation")
        } else {
            (ParseErrorKind::MalformedToken, "unexpected line after the document root")
        };
        return Err(Error::parse(input, extra.content_start, kind, message));
    }

    Ok(Document {
        root,
        span: first.content_start..last.content_start + last.content.len(),
    })
}

/// A non-blank input line.
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Offset of the line's first byte.
    start: usize,
    /// Width of the leading indentation, one unit per space or tab.
    indent: usize,
    /// The line without indentation, line terminator or trailing whitespace.
    content: &'a str,
    content_start: usize,
}

fn is_indent(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn scan_lines<'a>(input: &[u8], text: &'a str) -> Result<Vec<Line<'a>>> {
    let mut lines = Vec::new();
    let mut indent_char = None;
    let mut start = 0;

    for raw in text.split('\n') {
        let line_start = start;
        start += raw.len() + 1;

        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let body = raw.trim_start_matches(is_indent);
        let content = body.trim_end();
        if content.is_empty() {
            continue;
        }

        let indent = raw.len() - body.len();
        let lead = &raw.as_bytes()[..indent];
        if let Some(&ch) = lead.first() {
            if lead.iter().any(|&b| b != ch) {
                return Err(Error::parse(
                    input,
                    line_start,
                    ParseErrorKind::MixedIndentation,
                    "line indentation mixes tabs and spaces",
                ));
            }
            match indent_char {
                None => indent_char = Some(ch),
                Some(doc_char) if doc_char != ch => {
                    return Err(Error::parse(
                        input,
                        line_start,
                        ParseErrorKind::MixedIndentation,
                        "indentation character differs from earlier lines",
                    ))
                }
                Some(_) => {}
            }
        }

        lines.push(Line {
            start: line_start,
            indent,
            content,
            content_start: line_start + indent,
        });
    }

    Ok(lines)
}

fn is_list_item(content: &str) -> bool {
    content == "-" || content.starts_with("- ") || content.starts_with("-\t")
}

struct Parser<'a> {
    input: &'a [u8],
    lines: Vec<Line<'a>>,
    pos: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Line<'a>> {
        self.lines.get(self.pos).copied()
    }

    fn error(&self, offset: usize, kind: ParseErrorKind, message: &str) -> Error {
        Error::parse(self.input, offset, kind, message)
    }

    fn check_depth(&self, depth: usize, offset: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(self.error(
                offset,
                ParseErrorKind::DepthLimitExceeded,
                &format!("nesting exceeds the limit of {}", self.max_depth),
            ));
        }
        Ok(())
    }

    /// Parses the block starting at the current line, at that line's indent.
    fn parse_block(&mut self, depth: usize) -> Result<Value> {
        let Some(line) = self.peek() else {
            return Ok(Value::Null);
        };

        if is_list_item(line.content) {
            self.parse_sequence(line.indent, depth)
        } else if self.split_key(line.content, line.content_start)?.is_some() {
            self.parse_map(line.indent, depth)
        } else {
            self.pos += 1;
            self.parse_inline(line.content, line.content_start, depth)
        }
    }

    /// After a child block at `child` indent, the next line must either stay
    /// at `child`, return to `parent` or go further out.
    fn check_dedent(&self, parent: usize, child: usize) -> Result<()> {
        match self.peek() {
            Some(next) if next.indent > child => Err(self.error(
                next.content_start,
                ParseErrorKind::UnexpectedIndentation,
                "line is indented deeper than its block",
            )),
            Some(next) if next.indent > parent && next.indent < child => Err(self.error(
                next.start,
                ParseErrorKind::DedentToUnknownLevel,
                "dedent does not match any enclosing block",
            )),
            _ => Ok(()),
        }
    }

    /// Splits `key: rest`. Returns `None` when `content` is not a map entry.
    fn split_key<'s>(&self, content: &'s str, at: usize) -> Result<Option<(String, &'s str, usize)>> {
        let (key, after) = if content.starts_with('"') {
            let (key, end) = parse_quoted(content, 0, at, self.input)?;
            if !content[end..].starts_with(':') {
                return Ok(None);
            }
            (key, end + 1)
        } else {
            let bytes = content.as_bytes();
            match bytes.iter().position(|&b| matches!(b, b':' | b',' | b'"')) {
                Some(idx) if bytes[idx] == b':' => (content[..idx].trim_end().to_string(), idx + 1),
                _ => return Ok(None),
            }
        };

        let rest = &content[after..];
        if !(rest.is_empty() || rest.starts_with(is_indent)) {
            return Ok(None);
        }
        if key.is_empty() {
            return Err(self.error(at, ParseErrorKind::EmptyKey, "map keys must not be empty"));
        }

        let value = rest.trim_start_matches(is_indent);
        Ok(Some((key, value, at + after + (rest.len() - value.len()))))
    }

    fn parse_map(&mut self, indent: usize, depth: usize) -> Result<Value> {
        if let Some(line) = self.peek() {
            self.check_depth(depth, line.content_start)?;
        }

        let mut map = Map::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(self.error(
                    line.content_start,
                    ParseErrorKind::UnexpectedIndentation,
                    "line is indented deeper than its block",
                ));
            }
            if is_list_item(line.content) {
                return Err(self.error(
                    line.content_start,
                    ParseErrorKind::MalformedToken,
                    "list item inside a map",
                ));
            }
            let Some((key, rest, rest_at)) = self.split_key(line.content, line.content_start)? else {
                return Err(self.error(
                    line.content_start,
                    ParseErrorKind::MalformedToken,
                    "expected `key: value`",
                ));
            };
            if map.contains_key(&key) {
                return Err(self.error(
                    line.content_start,
                    ParseErrorKind::DuplicateKey,
                    &format!("key `{}` appears more than once", key),
                ));
            }

            self.pos += 1;
            let value = if rest.is_empty() {
                self.parse_nested(indent, depth + 1, rest_at)?
            } else {
                self.parse_inline(rest, rest_at, depth + 1)?
            };
            map.insert(key, value);
        }

        Ok(Value::Map(map))
    }

    /// Value of a `key:` line with nothing after the colon: the deeper block
    /// that follows, or an empty map when there is none.
    fn parse_nested(&mut self, indent: usize, depth: usize, at: usize) -> Result<Value> {
        match self.peek() {
            Some(next) if next.indent > indent => {
                let value = self.parse_block(depth)?;
                self.check_dedent(indent, next.indent)?;
                Ok(value)
            }
            _ => {
                self.check_depth(depth, at)?;
                Ok(Value::Map(Map::new()))
            }
        }
    }

    fn parse_sequence(&mut self, indent: usize, depth: usize) -> Result<Value> {
        if let Some(line) = self.peek() {
            self.check_depth(depth, line.content_start)?;
        }

        let mut items = Vec::new();
        while let Some(line) = self.peek() {
            if line.indent < indent {
                break;
            }
            if line.indent > indent {
                return Err(self.error(
                    line.content_start,
                    ParseErrorKind::UnexpectedIndentation,
                    "line is indented deeper than its block",
                ));
            }
            if !is_list_item(line.content) {
                break;
            }

            let rest = line.content[1..].trim_start_matches(is_indent);
            let rest_at = line.content_start + (line.content.len() - rest.len());
            self.pos += 1;

            let item = if rest.is_empty() {
                match self.peek() {
                    Some(next) if next.indent > indent => {
                        let value = self.parse_block(depth + 1)?;
                        self.check_dedent(indent, next.indent)?;
                        value
                    }
                    _ => {
                        return Err(self.error(
                            line.content_start,
                            ParseErrorKind::MalformedToken,
                            "list item has no value",
                        ))
                    }
                }
            } else if is_list_item(rest) || self.split_key(rest, rest_at)?.is_some() {
                // The item's block starts on the marker line; re-read the rest
                // of that line as the first line of a block at its own column.
                let child = indent + (rest_at - line.content_start);
                self.pos -= 1;
                self.lines[self.pos] = Line {
                    indent: child,
                    content: rest,
                    content_start: rest_at,
                    ..line
                };
                let value = self.parse_block(depth + 1)?;
                self.check_dedent(indent, child)?;
                value
            } else {
                self.parse_inline(rest, rest_at, depth + 1)?
            };
            items.push(item);
        }

        Ok(Value::Sequence(items))
    }

    /// Parses a value written on one line: `[]`, `{}`, a scalar or a compact
    /// list of scalars. `at` is the offset of `text` in the input.
    fn parse_inline(&self, text: &str, at: usize, depth: usize) -> Result<Value> {
        match text {
            "[]" => {
                self.check_depth(depth, at)?;
                return Ok(Value::Sequence(Vec::new()));
            }
            "{}" => {
                self.check_depth(depth, at)?;
                return Ok(Value::Map(Map::new()));
            }
            _ => {}
        }

        let bytes = text.as_bytes();
        let skip_blank = |mut i: usize| {
            while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
                i += 1;
            }
            i
        };

        let mut items = Vec::new();
        let mut separated = false;
        let mut i = 0;
        loop {
            i = skip_blank(i);
            let start = i;
            if bytes.get(i) == Some(&b'"') {
                let (s, end) = parse_quoted(text, i, at, self.input)?;
                i = skip_blank(end);
                if i < bytes.len() && bytes[i] != b',' {
                    return Err(self.error(
                        at + i,
                        ParseErrorKind::MalformedToken,
                        "unexpected characters after closing quote",
                    ));
                }
                items.push(Value::String(s));
            } else {
                let end = text[i..].find(',').map_or(bytes.len(), |p| i + p);
                let token = text[i..end].trim_end();
                if token.is_empty() {
                    return Err(self.error(
                        at + start,
                        ParseErrorKind::MalformedToken,
                        "empty list element",
                    ));
                }
                if let Some(quote) = token.find('"') {
                    return Err(self.error(
                        at + start + quote,
                        ParseErrorKind::MalformedToken,
                        "unexpected quote inside a bare token",
                    ));
                }
                items.push(classify_bare(token));
                i = end;
            }

            if i >= bytes.len() {
                break;
            }
            separated = true;
            i += 1;
        }

        if !separated {
            return Ok(items.pop().unwrap_or(Value::Null));
        }
        self.check_depth(depth, at)?;
        Ok(Value::Sequence(items))
    }
}
