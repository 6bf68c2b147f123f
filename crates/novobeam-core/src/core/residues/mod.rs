//! Residue masses and the token vocabulary shared by the scorer, the knapsack
//! index and the search engine.

pub mod masses;
pub mod set;

pub use set::{ControlToken, ResidueError, ResidueSet, Token, TokenKind};
