#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

pub mod clips;
pub mod compose;
pub mod config;
pub mod cursor;
pub mod delta;
pub mod publish;
pub mod runner;
pub mod votes;
