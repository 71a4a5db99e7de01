//! Specific named methods in the single cell space are implemented here.
//! Currently the SEACells meta cell detection.

pub mod seacells;
