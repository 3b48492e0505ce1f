//! Reverse URL building.

use regex::Regex;

use crate::encode::encode_component;
use crate::error::{PathError, Result};
use crate::params::{ParamValue, Params};
use crate::token::{parse, Key, ParseOptions, Token};

/// Builds concrete paths from a template and a set of params.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    template: String,
    tokens: Vec<Token>,
    /// Anchored segment matcher for every key token.
    matchers: Vec<Option<Regex>>,
}

impl PathBuilder {
    /// Parses `template` for building.
    ///
    /// # Example
    ///
    /// ```
    /// use waypoint_path::{Params, PathBuilder};
    ///
    /// let builder = PathBuilder::new("/posts/:id").unwrap();
    /// let params: Params = [("id", "123")].into_iter().collect();
    /// assert_eq!(builder.build(&params).unwrap(), "/posts/123");
    /// ```
    pub fn new(template: &str) -> Result<Self> {
        let tokens = parse(template, &ParseOptions::default());
        let matchers = tokens
            .iter()
            .map(|token| match token {
                Token::Key(key) => Regex::new(&format!("^(?:{})$", key.pattern))
                    .map(Some)
                    .map_err(|e| PathError::InvalidPattern {
                        template: template.to_string(),
                        message: e.to_string(),
                    }),
                Token::Literal(_) => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            template: template.to_string(),
            tokens,
            matchers,
        })
    }

    /// Returns the template this builder was created from.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the names of all keys.
    pub fn key_names(&self) -> Vec<String> {
        self.tokens
            .iter()
            .filter_map(|token| match token {
                Token::Key(key) => Some(key.name.as_param_key()),
                Token::Literal(_) => None,
            })
            .collect()
    }

    /// Substitutes `params` into the template.
    ///
    /// Values are percent-encoded and checked against each key's pattern.
    pub fn build(&self, params: &Params) -> Result<String> {
        let mut path = String::new();

        for (token, matcher) in self.tokens.iter().zip(&self.matchers) {
            let (key, matcher) = match (token, matcher) {
                (Token::Literal(text), _) => {
                    path.push_str(text);
                    continue;
                }
                (Token::Key(key), Some(matcher)) => (key, matcher),
                (Token::Key(_), None) => continue,
            };
            let name = key.name.as_param_key();

            match params.value(&name) {
                Some(ParamValue::Repeated(values)) => {
                    if !key.repeat {
                        return Err(PathError::UnexpectedRepeat(name));
                    }
                    if values.is_empty() {
                        if key.optional {
                            continue;
                        }
                        return Err(PathError::EmptyRepeat(name));
                    }
                    for (i, value) in values.iter().enumerate() {
                        let segment = checked_segment(key, matcher, value)?;
                        path.push_str(if i == 0 { &key.prefix } else { &key.delimiter });
                        path.push_str(&segment);
                    }
                }
                Some(ParamValue::Single(value)) => {
                    let segment = checked_segment(key, matcher, value)?;
                    path.push_str(&key.prefix);
                    path.push_str(&segment);
                }
                None if key.optional => {
                    if key.partial {
                        path.push_str(&key.prefix);
                    }
                }
                None => {
                    return Err(PathError::MissingParam {
                        name,
                        expected: if key.repeat { "an array" } else { "a string" },
                    });
                }
            }
        }

        Ok(path)
    }
}

fn checked_segment(key: &Key, matcher: &Regex, value: &str) -> Result<String> {
    let segment = encode_component(value).into_owned();
    if matcher.is_match(&segment) {
        Ok(segment)
    } else {
        Err(PathError::PatternMismatch {
            name: key.name.as_param_key(),
            pattern: key.pattern.clone(),
            value: segment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_reverse() {
        let builder = PathBuilder::new("/posts/:id").unwrap();
        assert_eq!(builder.build(&params(&[("id", "123")])).unwrap(), "/posts/123");
    }

    #[test]
    fn test_reverse_missing_param() {
        let builder = PathBuilder::new("/posts/:id").unwrap();
        let err = builder.build(&Params::new()).unwrap_err();
        assert_eq!(
            err,
            PathError::MissingParam {
                name: "id".into(),
                expected: "a string"
            }
        );
    }

    #[test]
    fn test_optional_omitted() {
        let builder = PathBuilder::new("/posts/:id?").unwrap();
        assert_eq!(builder.build(&Params::new()).unwrap(), "/posts");
    }

    #[test]
    fn test_repeating() {
        let builder = PathBuilder::new("/docs/:path+").unwrap();
        let mut p = Params::new();
        p.insert("path", vec!["guide".to_string(), "intro".to_string()]);
        assert_eq!(builder.build(&p).unwrap(), "/docs/guide/intro");

        p.insert("path", Vec::<String>::new());
        assert_eq!(
            builder.build(&p).unwrap_err(),
            PathError::EmptyRepeat("path".into())
        );
    }

    #[test]
    fn test_array_for_single_key() {
        let builder = PathBuilder::new("/users/:id").unwrap();
        let mut p = Params::new();
        p.insert("id", vec!["1".to_string()]);
        assert_eq!(
            builder.build(&p).unwrap_err(),
            PathError::UnexpectedRepeat("id".into())
        );
    }

    #[test]
    fn test_pattern_mismatch() {
        let builder = PathBuilder::new("/posts/:id(\\d+)").unwrap();
        let err = builder.build(&params(&[("id", "abc")])).unwrap_err();
        assert!(matches!(err, PathError::PatternMismatch { .. }));
    }

    #[test]
    fn test_encodes_values() {
        let builder = PathBuilder::new("/search/:q").unwrap();
        assert_eq!(
            builder.build(&params(&[("q", "a b")])).unwrap(),
            "/search/a%20b"
        );
    }
}
