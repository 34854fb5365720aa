//! Local filesystem helpers for the output tree.

pub mod digest;
pub mod walker;
