//! # Game Implementations
//!
//! Rules engines the search is played against. Each game implements the
//! `Game` trait from `utils` with its own action type.

pub mod ultimate;
