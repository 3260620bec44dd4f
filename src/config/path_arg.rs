// ABOUTME: Path arguments that may arrive base64-encoded, plus lexical normalization.
// ABOUTME: Encoding is decided once at the boundary and never re-sniffed downstream.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::path::{Component, Path, PathBuf};

use super::ConfigError;

/// A path argument as received from the CLI or an HTTP path segment.
///
/// Callers that transport paths through URL path components base64-encode
/// them; everything else passes a literal path. The variant is decided
/// exactly once, here, by a round-trip check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathArg {
    Literal(String),
    Encoded(String),
}

impl PathArg {
    /// Classify a raw argument. A string that survives decode-then-encode
    /// unchanged is treated as encoded; anything else is a literal path.
    pub fn detect(raw: &str) -> Self {
        if is_base64_encoded(raw) {
            PathArg::Encoded(raw.to_string())
        } else {
            PathArg::Literal(raw.to_string())
        }
    }

    /// The literal path this argument denotes, decoding if necessary.
    ///
    /// A payload that decodes but is not valid UTF-8 is an
    /// `InvalidEncoding` error; the raw bytes cannot name a path portably.
    pub fn into_path(self) -> Result<String, ConfigError> {
        match self {
            PathArg::Literal(s) => Ok(s),
            PathArg::Encoded(s) => {
                let bytes = BASE64
                    .decode(s.as_bytes())
                    .map_err(|_| ConfigError::InvalidEncoding(s.clone()))?;
                String::from_utf8(bytes).map_err(|_| ConfigError::InvalidEncoding(s))
            }
        }
    }
}

fn is_base64_encoded(data: &str) -> bool {
    match BASE64.decode(data.as_bytes()) {
        Ok(decoded) => BASE64.encode(&decoded) == data,
        Err(_) => false,
    }
}

/// Lexically normalize a path: expand `$VAR`/`${VAR}` and a leading `~`,
/// absolutize against `base`, and collapse `.`/`..` segments.
///
/// Purely textual; the filesystem is never consulted, so the result is
/// deterministic for a given environment and base. Idempotent: normalizing
/// an already-normalized path returns it unchanged.
pub fn normalize_path(input: &str, base: &Path) -> PathBuf {
    let expanded = expand_env_vars(input);
    let expanded = expand_tilde(&expanded);

    let absolute = if Path::new(&expanded).is_absolute() {
        PathBuf::from(expanded)
    } else {
        base.join(expanded)
    };

    collapse_dots(&absolute)
}

/// Normalize `input`, then express it relative to the (already normalized)
/// `context` directory. Absolutizing first means relative and absolute
/// spellings of the same path produce identical output.
pub fn normalize_relative_to(input: &str, base: &Path, context: &Path) -> PathBuf {
    let absolute = normalize_path(input, base);
    relative_from(&absolute, context)
}

fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some((_, '{')) => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if closed {
                    out.push_str(&std::env::var(&name).unwrap_or_default());
                } else {
                    // Unterminated ${ passes through verbatim.
                    out.push_str("${");
                    out.push_str(&name);
                }
            }
            Some((_, c)) if c.is_ascii_alphanumeric() || *c == '_' => {
                let mut name = String::new();
                while let Some((_, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }

    out
}

fn expand_tilde(input: &str) -> String {
    if input == "~" || input.starts_with("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return format!("{}{}", home, &input[1..]);
        }
    }
    input.to_string()
}

fn collapse_dots(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never pop past the root.
                if !out.pop() {
                    out.push(Component::RootDir);
                }
                if out.as_os_str().is_empty() {
                    out.push(Component::RootDir);
                }
            }
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(Component::RootDir);
    }
    out
}

fn relative_from(path: &Path, context: &Path) -> PathBuf {
    let path_components: Vec<Component> = path.components().collect();
    let context_components: Vec<Component> = context.components().collect();

    let common = path_components
        .iter()
        .zip(context_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..context_components.len() {
        out.push("..");
    }
    for component in &path_components[common..] {
        out.push(component);
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_passes_through() {
        let arg = PathArg::detect("./models/mnist");
        assert_eq!(arg, PathArg::Literal("./models/mnist".to_string()));
        assert_eq!(arg.into_path().unwrap(), "./models/mnist");
    }

    #[test]
    fn encoded_round_trips() {
        // "tensorflow/mnist/model" base64-encoded
        let arg = PathArg::detect("dGVuc29yZmxvdy9tbmlzdC9tb2RlbA==");
        assert!(matches!(arg, PathArg::Encoded(_)));
        assert_eq!(arg.into_path().unwrap(), "tensorflow/mnist/model");
    }

    #[test]
    fn normalize_collapses_dots() {
        let p = normalize_path("a/./b/../c", Path::new("/work"));
        assert_eq!(p, PathBuf::from("/work/a/c"));
    }

    #[test]
    fn normalize_is_idempotent() {
        let base = Path::new("/work");
        let once = normalize_path("x/../y/z", base);
        let twice = normalize_path(once.to_str().unwrap(), base);
        assert_eq!(once, twice);
    }

    #[test]
    fn relative_and_absolute_spellings_agree() {
        let base = Path::new("/work");
        let context = Path::new("/work/build");
        let from_relative = normalize_relative_to("models/mnist", base, context);
        let from_absolute = normalize_relative_to("/work/models/mnist", base, context);
        assert_eq!(from_relative, from_absolute);
        assert_eq!(from_relative, PathBuf::from("../models/mnist"));
    }

    #[test]
    fn parent_dir_cannot_escape_root() {
        let p = normalize_path("../../..", Path::new("/"));
        assert_eq!(p, PathBuf::from("/"));
    }
}
