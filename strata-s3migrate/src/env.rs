//! Environment variable expansion for migration bodies.
//!
//! Supported syntax:
//! - `$VAR` and `${VAR}`; unset variables expand to an empty string
//! - `${VAR:-default}`; `default` is used when `VAR` is unset or empty
//! - `$\` expands to a literal `$`
//!
//! A `$` not followed by a name or `{` is kept as is.

use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvSource for StdEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment backed by a map.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// An empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Expand variables in `input` from `env`.
pub fn expand(input: &str, env: &dyn EnvSource) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('{') => {
                chars.next();
                out.push_str(&expand_braced(&mut chars, env));
            }
            Some(&next) if next.is_ascii_alphabetic() || next == '_' => {
                let name = take_name(&mut chars);
                out.push_str(&env.get(&name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }

    out.replace("$\\", "$")
}

fn take_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !(c.is_ascii_alphanumeric() || c == '_') {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

fn expand_braced(chars: &mut Peekable<Chars<'_>>, env: &dyn EnvSource) -> String {
    let mut name = String::new();
    let mut default = None::<String>;

    for c in chars.by_ref() {
        if c == '}' {
            break;
        }
        match default.as_mut() {
            Some(text) => text.push(c),
            None if c == ':' => default = Some(String::new()),
            None => name.push(c),
        }
    }

    let value = env.get(&name).filter(|v| !v.is_empty());
    match (value, default) {
        (Some(value), _) => value,
        (None, Some(default)) => default.strip_prefix('-').unwrap_or(&default).to_string(),
        (None, None) => String::new(),
    }
}
