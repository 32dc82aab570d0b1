//! One module per CLI subcommand, mirroring the teacher's `ui/*.rs` layout:
//! a `Parser`-derived `Args` and a `run` function per file.

pub mod add;
pub mod blame;
pub mod branch;
pub mod checkout;
pub mod clean;
pub mod clone;
pub mod commit;
pub mod config;
pub mod diff;
pub mod fetch;
pub mod gc;
pub mod init;
pub mod log;
pub mod login;
pub mod merge;
pub mod pull;
pub mod push;
pub mod reflog;
pub mod remote;
pub mod repo_admin;
pub mod reset;
pub mod restore;
pub mod show;
pub mod status;
