//! CLI subcommands.

pub mod check;
pub mod init;
pub mod list_sniffs;
pub mod output;
