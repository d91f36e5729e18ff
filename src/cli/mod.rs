//! Command-line front end: argument parsing, logging setup and the actions
//! that drive the session store and router.

pub mod actions;
pub mod commands;
pub mod dispatch;
mod start;

pub use start::start;
