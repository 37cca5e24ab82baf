//! Tokenization of the restricted Python grammar
//!
//! The scanner produces a flat token stream with synthetic
//! `Indent`/`Dedent`/`Newline` tokens so the parser can treat block
//! structure like ordinary delimiters.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};
