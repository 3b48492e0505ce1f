//! Template tokenizer.
//!
//! A template is split into literal text and [`Key`] tokens:
//!
//! - `:name` matches one segment and binds it to `name`
//! - `:name(\\d+)` constrains the segment with a custom regex
//! - `(.*)` is an unnamed group, bound to its index
//! - `?`, `+` and `*` make a key optional, repeating, or both
//!
//! A delimiter directly in front of a key becomes its prefix, so `/:id?`
//! matches both `/` and `/42`.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// The default segment delimiter.
pub const DEFAULT_DELIMITER: &str = "/";

/// Characters that may prefix a key.
pub const DEFAULT_DELIMITERS: &str = "./";

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\\.)|(?::(\w+)(?:\(((?:\\.|[^\\()])+)\))?|\(((?:\\.|[^\\()])+)\))([+*?])?")
        .expect("Invalid token regex")
});

/// Name of a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyName {
    /// `:name`
    Named(String),
    /// Unnamed `(regex)` group, numbered from zero.
    Index(usize),
}

impl KeyName {
    /// The name used in [`Params`](crate::Params).
    pub fn as_param_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for KeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A parameter slot in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Key name.
    pub name: KeyName,
    /// Delimiter consumed in front of the key, or empty.
    pub prefix: String,
    /// Delimiter between repeated segments.
    pub delimiter: String,
    /// `?` or `*`.
    pub optional: bool,
    /// `+` or `*`.
    pub repeat: bool,
    /// The key is followed by literal text that is not its prefix.
    pub partial: bool,
    /// Regex source for one segment.
    pub pattern: String,
}

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text.
    Literal(String),
    /// A parameter slot.
    Key(Key),
}

/// Tokenizer options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseOptions {
    /// Default delimiter for keys without a prefix.
    pub delimiter: String,
    /// Characters recognised as key prefixes.
    pub delimiters: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            delimiters: DEFAULT_DELIMITERS.to_string(),
        }
    }
}

/// Splits `template` into tokens.
///
/// # Example
///
/// ```
/// use waypoint_path::{parse, Token};
///
/// let tokens = parse("/users/:id", &Default::default());
/// assert_eq!(tokens.len(), 2);
/// assert!(matches!(&tokens[0], Token::Literal(s) if s == "/users"));
/// ```
pub fn parse(template: &str, options: &ParseOptions) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut next_index = 0;
    let mut index = 0;
    let mut path = String::new();
    let mut path_escaped = false;

    for caps in TOKEN_REGEX.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        path.push_str(&template[index..whole.start()]);
        index = whole.end();

        if let Some(escaped) = caps.get(1) {
            path.push_str(&escaped.as_str()[1..]);
            path_escaped = true;
            continue;
        }

        let next = template[index..].chars().next();
        let mut prev = None;

        if !path_escaped {
            if let Some(last) = path.chars().last() {
                if options.delimiters.contains(last) {
                    prev = Some(last);
                    path.pop();
                }
            }
        }

        if !path.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut path)));
            path_escaped = false;
        }

        let modifier = caps.get(5).map(|m| m.as_str());
        let name = match caps.get(2) {
            Some(name) => KeyName::Named(name.as_str().to_string()),
            None => {
                next_index += 1;
                KeyName::Index(next_index - 1)
            }
        };
        let prefix = prev.map(String::from).unwrap_or_default();
        let delimiter = if prefix.is_empty() {
            options.delimiter.clone()
        } else {
            prefix.clone()
        };
        let pattern = match caps.get(3).or_else(|| caps.get(4)) {
            Some(custom) => escape_group(custom.as_str()),
            None => format!("[^{}]+?", regex::escape(&delimiter)),
        };

        tokens.push(Token::Key(Key {
            name,
            partial: prev.is_some() && next.is_some() && next != prev,
            prefix,
            delimiter,
            optional: matches!(modifier, Some("?" | "*")),
            repeat: matches!(modifier, Some("+" | "*")),
            pattern,
        }));
    }

    if !path.is_empty() || index < template.len() {
        path.push_str(&template[index..]);
        tokens.push(Token::Literal(path));
    }

    tokens
}

/// `$` inside a custom group is a literal, not an anchor.
fn escape_group(group: &str) -> String {
    group.replace('$', "\\$")
}
