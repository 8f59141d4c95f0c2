// Copyright 2026 the Skinrig Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Merging of several driver expressions into one.
//!
//! Each contribution is an expression template plus the variables it
//! declares. Variables with equal descriptors share one name in the output,
//! clashing names with different descriptors are renamed `name_1`, `name_2`,
//! and so on, and the expressions are summed as `(a)+(b)`.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use super::template::{Template, TemplateError};

/// One driver contribution: an expression template and its declared
/// variables.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverTerm<V> {
    /// Expression template over `$name` placeholders.
    pub expression: String,
    /// Declared variables, in declaration order.
    pub variables: Vec<(String, V)>,
}

impl<V> DriverTerm<V> {
    /// A term with no variables, such as a literal influence.
    #[must_use]
    pub fn constant(expression: String) -> Self {
        Self {
            expression,
            variables: Vec::new(),
        }
    }
}

/// The result of [`compile_driver`].
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledDriver<V> {
    /// The final expression with placeholders replaced by variable names.
    pub expression: String,
    /// Deduplicated variables used by `expression`.
    pub variables: Vec<(String, V)>,
}

/// A malformed expression encountered by [`compile_driver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpressionError {
    /// The expression as written by its contributor.
    pub expression: String,
    /// What is wrong with it.
    pub source: TemplateError,
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid driver expression `{}`: {}", self.expression, self.source)
    }
}

impl core::error::Error for ExpressionError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Merges `terms` into a single expression and variable set.
///
/// Variables a term declares but never references are dropped. Descriptor
/// equality is checked by linear scan since descriptors need not be
/// hashable.
///
/// # Errors
///
/// Returns an [`ExpressionError`] for the first term whose template is
/// malformed or references an undeclared variable.
///
/// # Panics
///
/// Panics if `terms` is empty.
pub fn compile_driver<V: Clone + PartialEq>(
    terms: &[DriverTerm<V>],
) -> Result<CompiledDriver<V>, ExpressionError> {
    assert!(!terms.is_empty(), "compile_driver needs at least one term");

    let mut variables: Vec<(String, V)> = Vec::new();
    let mut expressions: Vec<String> = Vec::with_capacity(terms.len());

    for term in terms {
        let fail = |source| ExpressionError {
            expression: term.expression.clone(),
            source,
        };
        let template = Template::parse(&term.expression).map_err(fail)?;
        template
            .substitute(|name| {
                term.variables
                    .iter()
                    .any(|(declared, _)| declared == name)
                    .then_some("")
            })
            .map_err(fail)?;

        let mut renames: Vec<(&str, String)> = Vec::new();
        for (name, desc) in &term.variables {
            if !template.references(name) {
                continue;
            }
            if let Some((existing, _)) = variables.iter().find(|(_, d)| d == desc) {
                renames.push((name.as_str(), existing.clone()));
                continue;
            }
            let mut new_name = name.clone();
            let mut counter = 1_u32;
            while variables.iter().any(|(n, _)| *n == new_name) {
                new_name = format!("{name}_{counter}");
                counter += 1;
            }
            variables.push((new_name.clone(), desc.clone()));
            renames.push((name.as_str(), new_name));
        }

        let expression = template
            .substitute(|name| {
                renames
                    .iter()
                    .find(|(from, _)| *from == name)
                    .map(|(_, to)| to.as_str())
            })
            .map_err(fail)?;
        expressions.push(expression);
    }

    let expression = if expressions.len() > 1 {
        expressions
            .iter()
            .map(|e| format!("({e})"))
            .collect::<Vec<_>>()
            .join("+")
    } else {
        expressions.swap_remove(0)
    };

    Ok(CompiledDriver {
        expression,
        variables,
    })
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    fn term(expression: &str, vars: &[(&str, u32)]) -> DriverTerm<u32> {
        DriverTerm {
            expression: expression.to_string(),
            variables: vars.iter().map(|&(n, d)| (n.to_string(), d)).collect(),
        }
    }

    #[test]
    fn single_term_passes_through() {
        let out = compile_driver(&[term("$x * 2", &[("x", 1)])]).unwrap();
        assert_eq!(out.expression, "x * 2");
        assert_eq!(out.variables, vec![("x".to_string(), 1)]);
    }

    #[test]
    fn equal_descriptors_share_a_name() {
        let out = compile_driver(&[term("$a", &[("a", 7)]), term("-$b", &[("b", 7)])]).unwrap();
        assert_eq!(out.expression, "(a)+(-a)");
        assert_eq!(out.variables, vec![("a".to_string(), 7)]);
    }

    #[test]
    fn clashing_names_get_suffixes() {
        let out = compile_driver(&[
            term("$v", &[("v", 1)]),
            term("$v", &[("v", 2)]),
            term("$v", &[("v", 3)]),
        ])
        .unwrap();
        assert_eq!(out.expression, "(v)+(v_1)+(v_2)");
        assert_eq!(
            out.variables,
            vec![
                ("v".to_string(), 1),
                ("v_1".to_string(), 2),
                ("v_2".to_string(), 3)
            ]
        );
    }

    #[test]
    fn unused_variables_are_dropped() {
        let out = compile_driver(&[term("0.5", &[("unused", 9)]), term("$x", &[("x", 1)])])
            .unwrap();
        assert_eq!(out.expression, "(0.5)+(x)");
        assert_eq!(out.variables, vec![("x".to_string(), 1)]);
    }

    #[test]
    fn undeclared_reference_is_an_error() {
        let err = compile_driver(&[term("$x + $y", &[("x", 1)])]).unwrap_err();
        assert_eq!(err.expression, "$x + $y");
        assert_eq!(
            err.source,
            TemplateError::UnknownVariable {
                name: "y".to_string(),
                offset: 5
            }
        );
    }

    #[test]
    fn malformed_template_is_an_error() {
        let err = compile_driver(&[term("1 + $", &[])]).unwrap_err();
        assert_eq!(err.source, TemplateError::InvalidPlaceholder { offset: 4 });
    }

    #[test]
    #[should_panic(expected = "at least one term")]
    fn empty_input_panics() {
        let _ = compile_driver::<u32>(&[]);
    }
}
