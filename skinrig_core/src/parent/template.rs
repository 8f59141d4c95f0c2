// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `$`-placeholder expression templates.
//!
//! Syntax:
//!
//! - `$$` is an escaped `$`.
//! - `$name` and `${name}` are placeholders, where `name` matches
//!   `[_A-Za-z][_A-Za-z0-9]*`.
//! - Any other `$` is an error.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// Error produced while parsing or substituting a [`Template`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateError {
    /// A `$` not followed by `$`, an identifier, or `{identifier}`.
    InvalidPlaceholder {
        /// Byte offset of the offending `$`.
        offset: usize,
    },
    /// A placeholder with no value supplied.
    UnknownVariable {
        /// The placeholder name.
        name: String,
        /// Byte offset of the placeholder's `$`.
        offset: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPlaceholder { offset } => {
                write!(f, "invalid placeholder at byte {offset}")
            }
            Self::UnknownVariable { name, offset } => {
                write!(f, "undeclared variable `{name}` at byte {offset}")
            }
        }
    }
}

impl core::error::Error for TemplateError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Piece<'a> {
    Text(&'a str),
    Dollar,
    Placeholder { name: &'a str, offset: usize },
}

/// A parsed expression template borrowing its source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template<'a> {
    pieces: Vec<Piece<'a>>,
}

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

fn is_ident_continue(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Length of the identifier at the start of `bytes`, or 0.
fn ident_len(bytes: &[u8]) -> usize {
    match bytes.first() {
        Some(&b) if is_ident_start(b) => {
            1 + bytes[1..].iter().take_while(|&&b| is_ident_continue(b)).count()
        }
        _ => 0,
    }
}

impl<'a> Template<'a> {
    /// Parses `source`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidPlaceholder`] for a malformed `$`.
    pub fn parse(source: &'a str) -> Result<Self, TemplateError> {
        let bytes = source.as_bytes();
        let mut pieces = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }
            if start < i {
                pieces.push(Piece::Text(&source[start..i]));
            }
            let offset = i;
            let rest = &bytes[i + 1..];
            if rest.first() == Some(&b'$') {
                pieces.push(Piece::Dollar);
                i += 2;
            } else if rest.first() == Some(&b'{') {
                let len = ident_len(&rest[1..]);
                if len == 0 || rest.get(1 + len) != Some(&b'}') {
                    return Err(TemplateError::InvalidPlaceholder { offset });
                }
                pieces.push(Piece::Placeholder {
                    name: &source[i + 2..i + 2 + len],
                    offset,
                });
                i += len + 3;
            } else {
                let len = ident_len(rest);
                if len == 0 {
                    return Err(TemplateError::InvalidPlaceholder { offset });
                }
                pieces.push(Piece::Placeholder {
                    name: &source[i + 1..i + 1 + len],
                    offset,
                });
                i += len + 1;
            }
            start = i;
        }
        if start < bytes.len() {
            pieces.push(Piece::Text(&source[start..]));
        }

        Ok(Self { pieces })
    }

    /// Placeholder names in order of appearance, with repeats.
    pub fn placeholders(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.pieces.iter().filter_map(|piece| match piece {
            Piece::Placeholder { name, .. } => Some(*name),
            _ => None,
        })
    }

    /// Whether `name` appears as a placeholder.
    #[must_use]
    pub fn references(&self, name: &str) -> bool {
        self.placeholders().any(|p| p == name)
    }

    /// Replaces every placeholder with the value returned by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UnknownVariable`] for the first placeholder
    /// `lookup` has no value for.
    pub fn substitute<'v>(
        &self,
        lookup: impl Fn(&str) -> Option<&'v str>,
    ) -> Result<String, TemplateError> {
        let mut out = String::new();
        for piece in &self.pieces {
            match *piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Dollar => out.push('$'),
                Piece::Placeholder { name, offset } => match lookup(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(TemplateError::UnknownVariable {
                            name: name.into(),
                            offset,
                        });
                    }
                },
            }
        }
        Ok(out)
    }
}
