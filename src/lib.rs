#![recursion_limit = "256"]

pub mod application;
pub mod cli;
pub mod data;
pub mod domain;
pub mod infra;
pub mod ml;
pub mod text;
