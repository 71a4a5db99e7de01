//! Core data structures and numeric building blocks shared by the methods.

pub mod base;
pub mod data;
