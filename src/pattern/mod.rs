//! Parser for the placeholder grammar of template patterns

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::parse;
