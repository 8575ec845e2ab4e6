//! # indi-lang
//!
//! Statement model and parser for INDI, the implementation-neutral data
//! language. An INDI statement selects rows with at most one equality
//! predicate (or `ALL RECORDS`) and carries positionally-paired field and
//! value lists:
//!
//! ```text
//! READ IN inventory ALL RECORDS FIELDS (name, qty)
//! CREATE IN inventory FIELDS (name, qty) VALUES ("bolt", 40)
//! UPDATE IN inventory id 1 FIELDS (qty) VALUES (39)
//! DELETE IN inventory id 1
//! ```
//!
//! This crate parses raw statement text into a [`Statement`] and defines the
//! scalar/row value model shared by every backend adapter. It knows nothing
//! about stores; translation lives in `indi-store`.
//!
//! # Usage
//!
//! ```
//! use indi_lang::{Parser, Verb};
//!
//! let stmt = Parser::parse("READ IN users id 3 FIELDS (name)").unwrap();
//! assert_eq!(stmt.verb, Verb::Read);
//! assert_eq!(stmt.table, "users");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod parser;
mod statement;
mod value;

pub use parser::{ParseError, ParseResult, Parser};
pub use statement::{looks_like_indi, Predicate, Statement, Verb};
pub use value::{PrimaryKeySet, ResultSet, Row, Scalar};
