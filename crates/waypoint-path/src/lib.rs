//! # waypoint-path
//!
//! Path templates compiled into matchers and reverse builders.
//!
//! This crate provides:
//! - Named parameters (`/users/:id`)
//! - Optional and repeating parameters (`:id?`, `:path+`, `:path*`)
//! - Custom segment constraints (`:id(\\d+)`) and unnamed groups (`(.*)`)
//! - Prefix matching for nested routes
//! - Reverse URL building from params
//!
//! ## Quick Start
//!
//! ```
//! use waypoint_path::{PathBuilder, PathPattern};
//!
//! let pattern = PathPattern::new("/users/:id").unwrap();
//! let params = pattern.match_path("/users/42").unwrap();
//! assert_eq!(params.get("id"), Some("42"));
//!
//! let builder = PathBuilder::new("/users/:id").unwrap();
//! assert_eq!(builder.build(&params).unwrap(), "/users/42");
//! ```

mod builder;
mod cache;
mod encode;
mod error;
mod params;
mod pattern;
mod token;

pub use builder::PathBuilder;
pub use cache::PatternCache;
pub use encode::{decode_component, encode_component};
pub use error::{PathError, Result};
pub use params::{ParamValue, Params};
pub use pattern::{PathMatch, PathPattern, PatternOptions};
pub use token::{parse, Key, KeyName, ParseOptions, Token, DEFAULT_DELIMITER, DEFAULT_DELIMITERS};
