// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! User-facing generation errors.
//!
//! Broken rig configuration surfaces as a [`RigError`] and aborts the pass.
//! Broken engine invariants (stale handles, empty blend targets, a control
//! node on a rig that cannot own one) panic instead.

use alloc::string::String;
use core::fmt;

use crate::parent::TemplateError;

/// A configuration error that aborts generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RigError {
    /// A driver expression contributed by a rig could not be compiled.
    InvalidDriverExpression {
        /// Name of the rig that owns the offending mechanism.
        rig: String,
        /// The expression as written.
        expression: String,
        /// The underlying template error.
        source: TemplateError,
    },
    /// A bone referenced by name does not exist.
    UnknownBone {
        /// The missing name.
        name: String,
    },
}

impl fmt::Display for RigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDriverExpression {
                rig,
                expression,
                source,
            } => write!(
                f,
                "rig `{rig}`: invalid driver expression: {expression}\nerror: {source}"
            ),
            Self::UnknownBone { name } => write!(f, "bone `{name}` does not exist"),
        }
    }
}

impl core::error::Error for RigError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::InvalidDriverExpression { source, .. } => Some(source),
            Self::UnknownBone { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_names_rig_and_expression() {
        let err = RigError::InvalidDriverExpression {
            rig: "lips".into(),
            expression: "$a +".into(),
            source: TemplateError::UnknownVariable {
                name: "a".into(),
                offset: 0,
            },
        };
        let text = err.to_string();
        assert!(text.contains("lips"));
        assert!(text.contains("$a +"));
        assert!(text.contains("undeclared variable `a`"));
    }

    #[test]
    fn unknown_bone_has_no_source() {
        use core::error::Error as _;
        let err = RigError::UnknownBone {
            name: "ORG-nose".into(),
        };
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "bone `ORG-nose` does not exist");
    }
}
