//! Lua-backed atomic writes for the Redis store.

pub mod commands;
pub mod executor;
pub mod scripts;

pub use commands::ScriptCommand;
pub use executor::{execute_command, reply_branch};
