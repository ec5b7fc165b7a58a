//! Parsing of entry-point specification strings (`name(args...)`).
//!
//! Both the CLI's `-m <module-spec>` flag and a project's default `entry`
//! field name a module instantiation the same way: a bare module name,
//! optionally followed by a parenthesised, comma-separated argument list of
//! integer constants, each optionally prefixed with `name=`. This mirrors
//! the argument-matching shape `bv_elaborate::elaborate::match_args`
//! consumes (positional and keyword arguments over a parameter list).

use crate::error::ConfigError;

/// A single argument in an entry-point specification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigArg {
    /// The keyword name, if the argument was written as `name=value`.
    pub kw_name: Option<String>,
    /// The constant integer value.
    pub value: i64,
}

/// Parses an entry-point specification string into a module name and its
/// argument list.
///
/// Accepts `name`, `name()`, and `name(arg, arg, kw=arg, ...)`. Arguments are
/// plain decimal integers (optionally negative); this parser does not
/// evaluate arbitrary constant expressions — that is `bv_elaborate`'s job
/// once the arguments are folded against the caller's scope.
pub fn parse_entry_point(spec: &str) -> Result<(String, Vec<ConfigArg>), ConfigError> {
    let spec = spec.trim();
    let Some(open) = spec.find('(') else {
        if spec.is_empty() || !is_ident(spec) {
            return Err(ConfigError::BadEntryPoint(
                spec.to_string(),
                "expected a module name".to_string(),
            ));
        }
        return Ok((spec.to_string(), Vec::new()));
    };

    if !spec.ends_with(')') {
        return Err(ConfigError::BadEntryPoint(
            spec.to_string(),
            "unbalanced parentheses".to_string(),
        ));
    }

    let name = &spec[..open];
    if !is_ident(name) {
        return Err(ConfigError::BadEntryPoint(
            spec.to_string(),
            "expected a module name before '('".to_string(),
        ));
    }

    let body = &spec[open + 1..spec.len() - 1];
    let body = body.trim();
    if body.is_empty() {
        return Ok((name.to_string(), Vec::new()));
    }

    let mut args = Vec::new();
    for part in body.split(',') {
        let part = part.trim();
        if let Some((kw, value)) = part.split_once('=') {
            let kw = kw.trim();
            if !is_ident(kw) {
                return Err(ConfigError::BadEntryPoint(
                    spec.to_string(),
                    format!("invalid argument name '{kw}'"),
                ));
            }
            let value = parse_int(value.trim(), spec)?;
            args.push(ConfigArg {
                kw_name: Some(kw.to_string()),
                value,
            });
        } else {
            let value = parse_int(part, spec)?;
            args.push(ConfigArg {
                kw_name: None,
                value,
            });
        }
    }

    Ok((name.to_string(), args))
}

fn parse_int(s: &str, whole_spec: &str) -> Result<i64, ConfigError> {
    s.parse::<i64>().map_err(|_| {
        ConfigError::BadEntryPoint(
            whole_spec.to_string(),
            format!("'{s}' is not an integer argument"),
        )
    })
}

fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name() {
        let (name, args) = parse_entry_point("top").unwrap();
        assert_eq!(name, "top");
        assert!(args.is_empty());
    }

    #[test]
    fn positional_args() {
        let (name, args) = parse_entry_point("top(8)").unwrap();
        assert_eq!(name, "top");
        assert_eq!(
            args,
            vec![ConfigArg {
                kw_name: None,
                value: 8
            }]
        );
    }

    #[test]
    fn keyword_args() {
        let (name, args) = parse_entry_point("top(width=8)").unwrap();
        assert_eq!(name, "top");
        assert_eq!(
            args,
            vec![ConfigArg {
                kw_name: Some("width".to_string()),
                value: 8
            }]
        );
    }

    #[test]
    fn multiple_mixed_args() {
        let (name, args) = parse_entry_point("bus(8, depth=4)").unwrap();
        assert_eq!(name, "bus");
        assert_eq!(args.len(), 2);
        assert_eq!(args[0].value, 8);
        assert_eq!(args[1].kw_name.as_deref(), Some("depth"));
    }

    #[test]
    fn empty_parens() {
        let (name, args) = parse_entry_point("top()").unwrap();
        assert_eq!(name, "top");
        assert!(args.is_empty());
    }

    #[test]
    fn negative_argument() {
        let (_, args) = parse_entry_point("m(-1)").unwrap();
        assert_eq!(args[0].value, -1);
    }

    #[test]
    fn unbalanced_parens_rejected() {
        assert!(parse_entry_point("top(8").is_err());
    }

    #[test]
    fn non_integer_argument_rejected() {
        assert!(parse_entry_point("top(eight)").is_err());
    }

    #[test]
    fn empty_spec_rejected() {
        assert!(parse_entry_point("").is_err());
    }
}
