//! Path pattern matching.

use regex::Regex;

use crate::encode::decode_component;
use crate::error::{PathError, Result};
use crate::params::{ParamValue, Params};
use crate::token::{parse, Key, ParseOptions, Token, DEFAULT_DELIMITER, DEFAULT_DELIMITERS};

/// Options controlling how a template is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternOptions {
    /// Match the whole path. When false, the template matches a prefix that
    /// ends on a delimiter boundary.
    pub end: bool,
    /// Do not accept an optional trailing delimiter.
    pub strict: bool,
    /// Case-sensitive matching.
    pub sensitive: bool,
    /// Segment delimiter.
    pub delimiter: String,
    /// Characters recognised as key prefixes.
    pub delimiters: String,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            end: true,
            strict: false,
            sensitive: false,
            delimiter: DEFAULT_DELIMITER.to_string(),
            delimiters: DEFAULT_DELIMITERS.to_string(),
        }
    }
}

impl PatternOptions {
    /// Prefix matching, as used for routes that have children.
    #[must_use]
    pub fn prefix() -> Self {
        Self {
            end: false,
            ..Self::default()
        }
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            delimiter: self.delimiter.clone(),
            delimiters: self.delimiters.clone(),
        }
    }
}

/// A successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// The matched prefix of the input.
    pub path: String,
    /// Captured parameters, layered over any inherited ones.
    pub params: Params,
}

/// Capture-group layout of one template alternative.
#[derive(Debug, Clone)]
struct Alternative {
    /// Group index of each key, parallel to the pattern's keys.
    key_groups: Vec<(usize, usize)>,
    /// Group that holds the trailing boundary.
    tail_group: usize,
}

/// A compiled path pattern for matching URLs.
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The original template strings.
    templates: Vec<String>,
    /// Compiled regex for matching.
    regex: Regex,
    /// Keys of every alternative, in order.
    keys: Vec<Key>,
    alternatives: Vec<Alternative>,
    /// Whether a trailing delimiter at the end of input belongs to the match.
    consume_trailing: bool,
    delimiter: String,
}

impl PathPattern {
    /// Compiles a template with default options.
    ///
    /// # Example
    ///
    /// ```
    /// use waypoint_path::PathPattern;
    ///
    /// let pattern = PathPattern::new("/posts/:id/comments/:comment_id").unwrap();
    /// let params = pattern.match_path("/posts/123/comments/456").unwrap();
    /// assert_eq!(params.get("id"), Some("123"));
    /// assert_eq!(params.get("comment_id"), Some("456"));
    /// ```
    pub fn new(template: &str) -> Result<Self> {
        Self::compile(template, &PatternOptions::default())
    }

    /// Compiles a single template.
    pub fn compile(template: &str, options: &PatternOptions) -> Result<Self> {
        Self::compile_many(&[template], options)
    }

    /// Compiles alternative templates into one pattern; the first matching
    /// alternative wins.
    pub fn compile_many<S: AsRef<str>>(templates: &[S], options: &PatternOptions) -> Result<Self> {
        let parse_options = options.parse_options();
        let delimiter = regex::escape(&options.delimiter);

        let mut sources = Vec::with_capacity(templates.len());
        let mut keys = Vec::new();
        let mut alternatives = Vec::with_capacity(templates.len());
        let mut next_group = 1;

        for template in templates {
            let tokens = parse(template.as_ref(), &parse_options);
            let mut source = String::from("^");
            let mut is_end_delimited = tokens.is_empty();
            let mut key_groups = Vec::new();

            for (i, token) in tokens.iter().enumerate() {
                match token {
                    Token::Literal(text) => {
                        source.push_str(&regex::escape(text));
                        is_end_delimited = i == tokens.len() - 1
                            && text
                                .chars()
                                .last()
                                .is_some_and(|c| options.delimiters.contains(c));
                    }
                    Token::Key(key) => {
                        source.push_str(&key_source(key));
                        key_groups.push((keys.len(), next_group));
                        keys.push(key.clone());
                        next_group += 1;
                    }
                }
            }

            source.push_str(&tail_source(options, &delimiter, is_end_delimited));
            alternatives.push(Alternative {
                key_groups,
                tail_group: next_group,
            });
            next_group += 1;
            sources.push(source);
        }

        let flags = if options.sensitive { "" } else { "(?i)" };
        let source = format!("{flags}(?:{})", sources.join("|"));
        let templates: Vec<String> = templates.iter().map(|t| t.as_ref().to_string()).collect();
        let regex = Regex::new(&source).map_err(|e| PathError::InvalidPattern {
            template: templates.join(","),
            message: e.to_string(),
        })?;

        Ok(Self {
            templates,
            regex,
            keys,
            alternatives,
            consume_trailing: !options.end && !options.strict,
            delimiter: options.delimiter.clone(),
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// Returns extracted parameters if the path matches.
    pub fn match_path(&self, path: &str) -> Option<Params> {
        self.exec(path, None).map(|m| m.params)
    }

    /// Returns whether the path matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches `path`, layering captured values over `inherited`.
    ///
    /// A key that did not participate keeps its inherited value.
    pub fn exec(&self, path: &str, inherited: Option<&Params>) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let alternative = self
            .alternatives
            .iter()
            .find(|alt| caps.get(alt.tail_group).is_some())?;
        let tail = caps.get(alternative.tail_group)?;

        let end = if self.consume_trailing && tail.as_str() == self.delimiter && tail.end() == path.len()
        {
            tail.end()
        } else {
            tail.start()
        };

        let mut params = inherited.cloned().unwrap_or_default();
        for &(key_index, group) in &alternative.key_groups {
            let key = &self.keys[key_index];
            let name = key.name.as_param_key();
            match caps.get(group) {
                Some(value) if key.repeat => {
                    let segments = value
                        .as_str()
                        .split(key.delimiter.as_str())
                        .map(|s| decode_component(s).into_owned())
                        .collect();
                    params.insert(name, ParamValue::Repeated(segments));
                }
                Some(value) => {
                    params.insert(name, decode_component(value.as_str()).into_owned());
                }
                None if key.repeat && !params.contains(&name) => {
                    params.insert(name, ParamValue::Repeated(Vec::new()));
                }
                None => {}
            }
        }

        Some(PathMatch {
            path: path[..end].to_string(),
            params,
        })
    }

    /// Returns the original template strings.
    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    /// Returns the keys in capture order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Returns the parameter names in capture order.
    pub fn param_names(&self) -> Vec<String> {
        self.keys.iter().map(|k| k.name.as_param_key()).collect()
    }

    /// Returns the generated regex source.
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

fn key_source(key: &Key) -> String {
    let prefix = regex::escape(&key.prefix);
    let capture = if key.repeat {
        format!(
            "(?:{p})(?:{d}(?:{p}))*",
            p = key.pattern,
            d = regex::escape(&key.delimiter)
        )
    } else {
        key.pattern.clone()
    };

    match (key.optional, key.partial) {
        (true, true) => format!("{prefix}({capture})?"),
        (true, false) => format!("(?:{prefix}({capture}))?"),
        (false, _) => format!("{prefix}({capture})"),
    }
}

/// The trailing boundary, always a single capture group.
fn tail_source(options: &PatternOptions, delimiter: &str, is_end_delimited: bool) -> String {
    if options.end {
        let trailing = if options.strict {
            String::new()
        } else {
            format!("(?:{delimiter})?")
        };
        return format!("{trailing}()$");
    }

    match (options.strict, is_end_delimited) {
        (false, false) => format!("({delimiter}$|{delimiter}|$)"),
        (false, true) => format!("({delimiter}$|)"),
        (true, false) => format!("({delimiter}|$)"),
        (true, true) => "()".to_string(),
    }
}
