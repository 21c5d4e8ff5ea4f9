//! # oxide-sql-core
//!
//! A hand-written lexer, AST, and recursive-descent parser for a
//! PostgreSQL-flavored SQL subset.
//!
//! ```rust
//! use oxide_sql_core::Parser;
//!
//! let statement = Parser::new("SELECT id, name FROM users WHERE active = TRUE").parse_statement();
//! assert!(statement.is_ok());
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Expr, Statement};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, Parser};
