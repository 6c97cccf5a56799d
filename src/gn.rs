//! GN argument handling
//!
//! Build actions receive list-valued options as GN list literals
//! (`["a", "b"]`) and may reference values stored in JSON build-config files
//! through `@FileArg(path:key[:subkey...])` placeholders. This module expands
//! both into concrete argument and path lists.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;

use serde_json::Value;

use crate::error::{Error, Result};

/// Parse a GN list value into its elements.
///
/// Accepts a GN list literal (`["a", "b"]`, with `\"`, `\\` and `\$`
/// escapes and an optional trailing comma), a whitespace-separated string of
/// bare tokens, or an empty string for the empty list.
pub fn parse_list(value: &str) -> Result<Vec<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if !trimmed.starts_with('[') {
        return Ok(trimmed.split_whitespace().map(str::to_string).collect());
    }
    parse_list_literal(trimmed)
}

/// Render elements back into a GN list literal.
///
/// Inverse of [`parse_list`] for the literal form; used when splicing
/// list-valued `@FileArg` lookups back into an argument.
pub fn to_gn_list(elements: &[String]) -> String {
    let mut out = String::from("[");
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('"');
        for c in element.chars() {
            if matches!(c, '"' | '\\' | '$') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('"');
    }
    out.push(']');
    out
}

fn parse_list_literal(input: &str) -> Result<Vec<String>> {
    let mut chars = input.chars().peekable();
    let mut elements = Vec::new();

    // Leading '[' is guaranteed by the caller.
    chars.next();

    loop {
        skip_whitespace(&mut chars);
        match chars.peek() {
            Some(']') => {
                chars.next();
                break;
            }
            Some('"') => {
                chars.next();
                elements.push(parse_string_body(&mut chars, input)?);
                skip_whitespace(&mut chars);
                match chars.peek() {
                    Some(',') => {
                        chars.next();
                    }
                    Some(']') => {}
                    _ => {
                        return Err(Error::GnList(format!(
                            "expected ',' or ']' in {input:?}"
                        )))
                    }
                }
            }
            _ => {
                return Err(Error::GnList(format!(
                    "expected string element or ']' in {input:?}"
                )))
            }
        }
    }

    skip_whitespace(&mut chars);
    if chars.next().is_some() {
        return Err(Error::GnList(format!("trailing characters in {input:?}")));
    }
    Ok(elements)
}

fn parse_string_body(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    input: &str,
) -> Result<String> {
    let mut out = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                // GN only escapes these three; any other backslash is literal.
                Some(c @ ('"' | '\\' | '$')) => out.push(c),
                Some(c) => {
                    out.push('\\');
                    out.push(c);
                }
                None => return Err(Error::GnList(format!("unterminated string in {input:?}"))),
            },
            Some(c) => out.push(c),
            None => return Err(Error::GnList(format!("unterminated string in {input:?}"))),
        }
    }
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

const FILE_ARG_PREFIX: &str = "@FileArg(";

/// Expand `@FileArg(path:key[:subkey...])` placeholders in an argument list.
///
/// The referenced file is read as JSON and the value at the key path is
/// spliced back in place of the placeholder: lists become GN list literals,
/// strings and numbers their plain text. The placeholder must extend to the
/// end of its argument; any prefix (`--jars=`) is preserved. Each file is
/// read at most once per call.
pub fn expand_file_args(args: &[String]) -> Result<Vec<String>> {
    let mut expanded = Vec::with_capacity(args.len());
    let mut cache: HashMap<String, Value> = HashMap::new();

    for arg in args {
        let Some(start) = arg.find(FILE_ARG_PREFIX) else {
            expanded.push(arg.clone());
            continue;
        };
        let body_start = start + FILE_ARG_PREFIX.len();
        let Some(close) = arg[body_start..].find(')') else {
            return Err(Error::FileArg(format!("unterminated placeholder in {arg:?}")));
        };
        if body_start + close + 1 != arg.len() {
            return Err(Error::FileArg(format!(
                "unexpected characters after placeholder in {arg:?}"
            )));
        }

        let lookup = &arg[body_start..body_start + close];
        let mut parts = lookup.split(':');
        let file_path = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::FileArg(format!("missing file path in {arg:?}")))?;

        let root = match cache.entry(file_path.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let text = fs::read_to_string(file_path)?;
                let json: Value = serde_json::from_str(&text)
                    .map_err(|e| Error::FileArg(format!("{file_path}: {e}")))?;
                entry.insert(json)
            }
        };

        let mut value: &Value = root;
        for key in parts {
            value = value.get(key).ok_or_else(|| {
                Error::FileArg(format!("{file_path}: no key {key:?} in {lookup}"))
            })?;
        }

        let rendered = render_value(value)
            .ok_or_else(|| Error::FileArg(format!("{file_path}: unsupported value at {lookup}")))?;
        expanded.push(format!("{}{}", &arg[..start], rendered));
    }

    Ok(expanded)
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let elements: Option<Vec<String>> = items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect();
            Some(to_gn_list(&elements?))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_empty() {
        assert!(parse_list("").unwrap().is_empty());
        assert!(parse_list("   ").unwrap().is_empty());
        assert!(parse_list("[]").unwrap().is_empty());
        assert!(parse_list("[ ]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_bare_tokens() {
        assert_eq!(
            parse_list("a.jar b.jar").unwrap(),
            vec!["a.jar".to_string(), "b.jar".to_string()]
        );
    }

    #[test]
    fn test_parse_literal() {
        assert_eq!(
            parse_list(r#"["a.jar", "b.jar"]"#).unwrap(),
            vec!["a.jar".to_string(), "b.jar".to_string()]
        );
        // Trailing comma is valid GN.
        assert_eq!(
            parse_list(r#"["a.jar",]"#).unwrap(),
            vec!["a.jar".to_string()]
        );
    }

    #[test]
    fn test_parse_escapes() {
        assert_eq!(
            parse_list(r#"["with\"quote", "back\\slash"]"#).unwrap(),
            vec!["with\"quote".to_string(), "back\\slash".to_string()]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_list(r#"["a" "b"]"#).is_err());
        assert!(parse_list(r#"["a"] x"#).is_err());
        assert!(parse_list(r#"["a"#).is_err());
    }

    #[test]
    fn test_gn_list_roundtrip() {
        let elements = vec!["a b".to_string(), "c\"d".to_string()];
        assert_eq!(parse_list(&to_gn_list(&elements)).unwrap(), elements);
    }

    #[test]
    fn test_expand_file_args() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(
            config,
            r#"{{"deps_info": {{"jars": ["a.jar", "b.jar"], "abi": "arm64-v8a"}}}}"#
        )
        .unwrap();
        let path = config.path().to_str().unwrap();

        let args = vec![
            format!("--jars=@FileArg({path}:deps_info:jars)"),
            format!("--abi=@FileArg({path}:deps_info:abi)"),
            "--plain".to_string(),
        ];
        let expanded = expand_file_args(&args).unwrap();
        assert_eq!(expanded[0], r#"--jars=["a.jar", "b.jar"]"#);
        assert_eq!(expanded[1], "--abi=arm64-v8a");
        assert_eq!(expanded[2], "--plain");

        assert_eq!(
            parse_list(expanded[0].strip_prefix("--jars=").unwrap()).unwrap(),
            vec!["a.jar".to_string(), "b.jar".to_string()]
        );
    }

    #[test]
    fn test_expand_rejects_trailing_text() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, r#"{{"k": "v"}}"#).unwrap();
        let path = config.path().to_str().unwrap();

        let args = vec![format!("@FileArg({path}:k)/suffix")];
        assert!(expand_file_args(&args).is_err());
    }

    #[test]
    fn test_expand_missing_key() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, r#"{{"k": "v"}}"#).unwrap();
        let path = config.path().to_str().unwrap();

        let args = vec![format!("@FileArg({path}:absent)")];
        assert!(expand_file_args(&args).is_err());
    }
}
