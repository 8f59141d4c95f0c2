// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bone name parsing and derivation.
//!
//! Names follow the usual rig conventions:
//!
//! ```text
//!   [PREFIX-]base[.T|.B][.L|.R][.NNN]
//! ```
//!
//! The optional upper-case prefix marks the bone role (`ORG-`, `MCH-`,
//! `DEF-`; controls have none). The front/back side uses `T`/`B` tokens and
//! the left/right side uses `L`/`R` tokens, each introduced by `.`, `_` or
//! `-`. A trailing numeric suffix is kept last when names are rebuilt.

use alloc::format;
use alloc::string::{String, ToString};

/// Left/right side of a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    /// `.R`
    Right = -1,
    /// No side token.
    Middle = 0,
    /// `.L`
    Left = 1,
}

/// Front/back (top/bottom) side of a name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SideZ {
    /// `.B`
    Bottom = -2,
    /// No side token.
    Middle = 0,
    /// `.T`
    Top = 2,
}

impl Side {
    /// The opposite side; `Middle` maps to itself.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Middle => Self::Middle,
        }
    }

    /// Distance from the central axis (0 or 1).
    #[must_use]
    pub const fn magnitude(self) -> u8 {
        match self {
            Self::Middle => 0,
            _ => 1,
        }
    }

    const fn token(self) -> &'static str {
        match self {
            Self::Left => ".L",
            Self::Right => ".R",
            Self::Middle => "",
        }
    }
}

impl SideZ {
    /// The opposite side; `Middle` maps to itself.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Middle => Self::Middle,
        }
    }

    /// Distance from the central axis (0 or 2).
    #[must_use]
    pub const fn magnitude(self) -> u8 {
        match self {
            Self::Middle => 0,
            _ => 2,
        }
    }

    const fn token(self) -> &'static str {
        match self {
            Self::Top => ".T",
            Self::Bottom => ".B",
            Self::Middle => "",
        }
    }
}

/// Role prefix used by [`make_derived_name`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NameSubtype {
    /// Original metarig bone (`ORG-`).
    Org,
    /// Mechanism bone (`MCH-`).
    Mch,
    /// Deform bone (`DEF-`).
    Def,
    /// User-facing control (no prefix).
    Ctrl,
}

impl NameSubtype {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Org => "ORG",
            Self::Mch => "MCH",
            Self::Def => "DEF",
            Self::Ctrl => "",
        }
    }
}

/// A name decomposed into its base and side components.
///
/// Two names are mirror images of each other when their `base` matches.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameSides {
    /// The name with both side tokens removed.
    pub base: String,
    /// Left/right side.
    pub side: Side,
    /// Front/back side.
    pub side_z: SideZ,
}

impl NameSides {
    /// The same base with the given sides.
    #[must_use]
    pub fn with_sides(&self, side: Side, side_z: SideZ) -> Self {
        Self {
            base: self.base.clone(),
            side,
            side_z,
        }
    }
}

/// Every component of a parsed name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameParts {
    /// Role prefix without the dash, if present.
    pub prefix: Option<String>,
    /// The bare base name.
    pub base: String,
    /// Parsed front/back side.
    pub side_z: SideZ,
    /// Parsed left/right side.
    pub side: Side,
    /// Trailing numeric suffix including its dot, e.g. `.001`.
    pub number: Option<String>,
    side_z_token: Option<String>,
    side_token: Option<String>,
}

impl NameParts {
    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(prefix) = &self.prefix {
            out.push_str(prefix);
            out.push('-');
        }
        out.push_str(&self.base);
        out.push_str(self.side_z_token.as_deref().unwrap_or(self.side_z.token()));
        out.push_str(self.side_token.as_deref().unwrap_or(self.side.token()));
        if let Some(number) = &self.number {
            out.push_str(number);
        }
        out
    }

    fn set_side(&mut self, side: Side) {
        if side != self.side {
            self.side = side;
            self.side_token = None;
        }
    }

    fn set_side_z(&mut self, side_z: SideZ) {
        if side_z != self.side_z {
            self.side_z = side_z;
            self.side_z_token = None;
        }
    }
}

fn is_separator(c: u8) -> bool {
    matches!(c, b'.' | b'_' | b'-')
}

/// Strips a trailing `<sep><token>` and returns the token's position.
fn strip_token<'a>(name: &'a str, tokens: &[&str]) -> Option<(&'a str, &'a str, &'a str)> {
    for token in tokens {
        if let Some(head) = name.strip_suffix(token) {
            let bytes = head.as_bytes();
            if bytes.len() > 1 && is_separator(bytes[bytes.len() - 1]) {
                let split = bytes.len() - 1;
                return Some((&name[..split], &name[split..], token));
            }
        }
    }
    None
}

const SIDE_TOKENS: &[&str] = &["Left", "Right", "left", "right", "LEFT", "RIGHT", "L", "R", "l", "r"];
const SIDE_Z_TOKENS: &[&str] = &[
    "Bottom", "bottom", "BOTTOM", "Top", "top", "TOP", "Bot", "bot", "T", "B", "t", "b",
];

/// Splits a name into prefix, base, sides and numeric suffix.
#[must_use]
pub fn split_name(name: &str) -> NameParts {
    let mut rest = name;

    let mut prefix = None;
    if let Some(dash) = rest.find('-') {
        let head = &rest[..dash];
        if !head.is_empty()
            && dash + 1 < rest.len()
            && head.bytes().all(|b| b.is_ascii_uppercase())
        {
            prefix = Some(head.to_string());
            rest = &rest[dash + 1..];
        }
    }

    let mut number = None;
    if let Some(dot) = rest.rfind('.') {
        let digits = &rest[dot + 1..];
        if dot > 0 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            number = Some(rest[dot..].to_string());
            rest = &rest[..dot];
        }
    }

    let mut side = Side::Middle;
    let mut side_token = None;
    if let Some((head, token, word)) = strip_token(rest, SIDE_TOKENS) {
        side = if word.starts_with(['L', 'l']) {
            Side::Left
        } else {
            Side::Right
        };
        side_token = Some(token.to_string());
        rest = head;
    }

    let mut side_z = SideZ::Middle;
    let mut side_z_token = None;
    if let Some((head, token, word)) = strip_token(rest, SIDE_Z_TOKENS) {
        side_z = if word.starts_with(['T', 't']) {
            SideZ::Top
        } else {
            SideZ::Bottom
        };
        side_z_token = Some(token.to_string());
        rest = head;
    }

    NameParts {
        prefix,
        base: rest.to_string(),
        side_z,
        side,
        number,
        side_z_token,
        side_token,
    }
}

/// Decomposes a name into its mirror-invariant base and its sides.
///
/// The base keeps the role prefix and numeric suffix, so `ORG-lip.L` and
/// `lip.R` do not mirror each other.
#[must_use]
pub fn name_sides(name: &str) -> NameSides {
    let mut parts = split_name(name);
    parts.set_side(Side::Middle);
    parts.set_side_z(SideZ::Middle);
    let (side, side_z) = {
        let parsed = split_name(name);
        (parsed.side, parsed.side_z)
    };
    NameSides {
        base: parts.render(),
        side,
        side_z,
    }
}

/// Rebuilds `name` with different side tokens.
#[must_use]
pub fn change_name_side(name: &str, side: Side, side_z: SideZ) -> String {
    let mut parts = split_name(name);
    parts.set_side(side);
    parts.set_side_z(side_z);
    parts.render()
}

/// Derives a related bone name with a new role prefix.
///
/// The optional `suffix` is appended to the base, before any side tokens:
/// `make_derived_name("lip.T.L", Mch, "_mix")` gives `MCH-lip_mix.T.L`.
#[must_use]
pub fn make_derived_name(name: &str, subtype: NameSubtype, suffix: &str) -> String {
    let mut parts = split_name(name);
    parts.prefix = match subtype.prefix() {
        "" => None,
        prefix => Some(prefix.to_string()),
    };
    parts.base = format!("{}{suffix}", parts.base);
    parts.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_all_components() {
        let parts = split_name("ORG-lip.T.L.001");
        assert_eq!(parts.prefix.as_deref(), Some("ORG"));
        assert_eq!(parts.base, "lip");
        assert_eq!(parts.side_z, SideZ::Top);
        assert_eq!(parts.side, Side::Left);
        assert_eq!(parts.number.as_deref(), Some(".001"));
    }

    #[test]
    fn plain_name_has_no_sides() {
        let parts = split_name("jaw");
        assert_eq!(parts.prefix, None);
        assert_eq!(parts.base, "jaw");
        assert_eq!(parts.side, Side::Middle);
        assert_eq!(parts.side_z, SideZ::Middle);
    }

    #[test]
    fn alternative_separators_are_recognized() {
        assert_eq!(split_name("brow_R").side, Side::Right);
        assert_eq!(split_name("brow-Left").side, Side::Left);
        assert_eq!(split_name("lid_bottom.L").side_z, SideZ::Bottom);
    }

    #[test]
    fn lone_letter_is_not_a_side() {
        let parts = split_name("L");
        assert_eq!(parts.base, "L");
        assert_eq!(parts.side, Side::Middle);
    }

    #[test]
    fn mirror_names_share_a_base() {
        let left = name_sides("lip.T.L");
        let right = name_sides("lip.T.R");
        assert_eq!(left.base, right.base);
        assert_eq!(left.side, Side::Left);
        assert_eq!(right.side, Side::Right);
        assert_eq!(left.side_z, SideZ::Top);
    }

    #[test]
    fn change_side_collapses_to_middle() {
        assert_eq!(change_name_side("lip.T.L", Side::Middle, SideZ::Top), "lip.T");
        assert_eq!(change_name_side("lip.T.L", Side::Middle, SideZ::Middle), "lip");
        assert_eq!(change_name_side("lip.001", Side::Right, SideZ::Middle), "lip.R.001");
    }

    #[test]
    fn unchanged_sides_keep_their_spelling() {
        assert_eq!(change_name_side("brow_L", Side::Left, SideZ::Middle), "brow_L");
    }

    #[test]
    fn derived_names_insert_suffix_before_sides() {
        assert_eq!(
            make_derived_name("lip.T.L", NameSubtype::Mch, "_mix_parent"),
            "MCH-lip_mix_parent.T.L"
        );
        assert_eq!(make_derived_name("ORG-jaw", NameSubtype::Ctrl, ""), "jaw");
        assert_eq!(make_derived_name("jaw", NameSubtype::Def, ""), "DEF-jaw");
    }

    #[test]
    fn flips() {
        assert_eq!(Side::Left.flip(), Side::Right);
        assert_eq!(SideZ::Middle.flip(), SideZ::Middle);
        assert_eq!(SideZ::Bottom.magnitude(), 2);
    }
}
