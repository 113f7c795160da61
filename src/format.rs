//! The text format.
//!
//! This module has no code; it documents what the encoder writes and the
//! decoder accepts.
//!
//! # Documents
//!
//! A document is UTF-8 text holding exactly one value. Lines end in `\n`
//! (a trailing `\r` is ignored on input), blank lines are ignored, and
//! trailing whitespace on a line is not significant. An input with no
//! non-blank line decodes to `null`.
//!
//! # Maps
//!
//! One `key: value` line per entry, in insertion order:
//!
//! ```text
//! id: 1
//! name: Ann
//! active: true
//! ```
//!
//! A value that does not fit on the line goes in an indented block below a
//! `key:` line. The encoder indents by two spaces per level unless configured
//! otherwise:
//!
//! ```text
//! user:
//!   name: Ann
//!   address:
//!     city: Oslo
//! ```
//!
//! Keys are unique within a map and never empty. A `key:` line with no block
//! below it decodes to an empty map.
//!
//! # Sequences
//!
//! Two or more scalars are written on one line, separated by `, `:
//!
//! ```text
//! tags: a, b, c
//! ```
//!
//! Every other sequence puts each element on its own `- ` line. A map element
//! starts on the marker line and continues two columns in; a nested sequence
//! element is a bare `-` with its block below:
//!
//! ```text
//! items:
//!   - sku: A1
//!     qty: 2
//!   - solo
//!   -
//!     - x
//!     - y
//! ```
//!
//! The empty sequence is `[]` and the empty map is `{}`.
//!
//! # Scalars
//!
//! | Value   | Text                                     |
//! |---------|------------------------------------------|
//! | null    | `null`                                   |
//! | bool    | `true`, `false`                          |
//! | integer | `-?[0-9]+`, within `i64`                 |
//! | float   | always has a `.` or exponent: `3.0`, `1e-7` |
//! | string  | bare, or quoted when ambiguous           |
//!
//! Non-finite floats cannot be encoded. Integers outside `i64` decode as
//! floats. Timestamps travel as RFC 3339 strings.
//!
//! A string is quoted when it is empty, has leading or trailing whitespace,
//! contains `:`, `,`, `"`, `\` or a control character, is exactly `[]`, `{}`
//! or `-`, starts with `- `, or would otherwise read as `null`, a bool or a
//! number. Map keys follow the same rule. Quoted strings use the escapes
//! `\"`, `\\`, `\/`, `\n`, `\r`, `\t`, `\b`, `\f`, `\0` and `\uXXXX`.
//!
//! # Indentation
//!
//! Indentation is spaces or tabs, never both in one document; each tab or
//! space is one unit. All lines of a block share its indentation, and a
//! dedent must land on the level of an enclosing block.
//!
//! # Limits
//!
//! Containers nest at most [`ToonOptions::max_depth`](crate::ToonOptions)
//! levels deep (128 by default), counting the root container as level 1.
//! Both directions enforce the limit.
