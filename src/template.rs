// SPDX-FileCopyrightText: 2026 pmxdeploy contributors
// SPDX-License-Identifier: MIT

//! Template rendering.
//!
//! Configuration and unit templates carry `%(name)s` placeholders, the same
//! interpolation syntax the files were originally written against. Rendering
//! is a single pass with no recursion: substituted values are never scanned
//! for further placeholders. `%%` produces a literal percent sign, and a `%`
//! followed by anything other than `(` or `%` passes through verbatim.
//!
//! The template and the substitution context must agree on placeholder
//! names. A placeholder without a matching key is a caller error, not a
//! silently empty value.

use std::collections::HashMap;

/// Substitution context: placeholder name to replacement value.
pub type Context = HashMap<String, String>;

/// Build a [`Context`] from name/value pairs.
pub fn context<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Context {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Render `template`, substituting every `%(name)s` from `context`.
pub fn render(template: &str, context: &Context) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if ch != '%' {
            output.push(ch);
            continue;
        }

        match chars.peek().map(|(_, next)| *next) {
            Some('%') => {
                chars.next();
                output.push('%');
            }
            Some('(') => {
                chars.next();
                let name: String = chars
                    .by_ref()
                    .map(|(_, c)| c)
                    .take_while(|c| *c != ')')
                    .collect();
                match chars.next().map(|(_, c)| c) {
                    Some('s') => {}
                    _ => {
                        return Err(TemplateError::MalformedPlaceholder {
                            offset: start,
                            name,
                        })
                    }
                }
                let value = context
                    .get(name.as_str())
                    .ok_or(TemplateError::UnresolvedPlaceholder { name })?;
                output.push_str(value);
            }
            // Lone percent, as in a shell format string. Pass it through.
            _ => output.push('%'),
        }
    }

    Ok(output)
}

/// Template rendering error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// Placeholder has no matching key in the substitution context.
    #[error("placeholder %({name})s has no value in the substitution context")]
    UnresolvedPlaceholder { name: String },

    /// Placeholder is unterminated or uses an unsupported conversion.
    #[error("malformed placeholder %({name} at byte {offset}; only %(name)s is supported")]
    MalformedPlaceholder { offset: usize, name: String },
}

/// Friendly result alias :3
pub type Result<T, E = TemplateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("password = %(password)s", "password = hunter2"; "single placeholder")]
    #[test_case("%(password)s%(password)s", "hunter2hunter2"; "repeated placeholder")]
    #[test_case("50%% done", "50% done"; "escaped percent")]
    #[test_case("date +%Y", "date +%Y"; "lone percent passes through")]
    #[test_case("no placeholders", "no placeholders"; "literal text")]
    #[test]
    fn render_substitutes(template: &str, expect: &str) {
        let ctx = context([("password", "hunter2")]);
        pretty_assertions::assert_eq!(render(template, &ctx).unwrap(), expect);
    }

    #[test]
    fn render_is_deterministic() {
        let ctx = context([("token", "abc123"), ("key", "xyz")]);
        let template = "token=%(token)s key=%(key)s";

        let first = render(template, &ctx).unwrap();
        let second = render(template, &ctx).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, "token=abc123 key=xyz");
    }

    #[test]
    fn render_does_not_recurse_into_values() {
        let ctx = context([("a", "%(b)s"), ("b", "nope")]);
        assert_eq!(render("%(a)s", &ctx).unwrap(), "%(b)s");
    }

    #[test]
    fn unresolved_placeholder_is_an_error() {
        let result = render("password = %(password)s", &Context::new());
        assert_eq!(
            result,
            Err(TemplateError::UnresolvedPlaceholder {
                name: "password".into()
            })
        );
    }

    #[test_case("%(password)d"; "unsupported conversion")]
    #[test_case("%(password"; "unterminated placeholder")]
    #[test]
    fn malformed_placeholder_is_an_error(template: &str) {
        let ctx = context([("password", "hunter2")]);
        assert!(matches!(
            render(template, &ctx),
            Err(TemplateError::MalformedPlaceholder { .. })
        ));
    }
}
