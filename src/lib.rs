//! PAM limits fragment manager.
//!
//! Renders `/etc/security/limits.d/<name>.conf` fragments from declarations
//! in `limits.toml` (a literal `list` of limit lines, or a `source` file) and
//! applies them idempotently, together with the `limits.d` directory and the
//! packages that provide it.
//!
//! The public API is organised into these layers:
//!
//! - **[`fragment`]**: the pure render function and its data model
//! - **[`platform`]** and **[`packages`]**: target platform facts and the
//!   per-platform package table
//! - **[`config`]**: load and validate `limits.toml`
//! - **[`resources`]**: idempotent `check + apply` primitives (files, the directory, packages)
//! - **[`tasks`]**: named, dependency-ordered units of work wired to resources
//! - **[`commands`]**: subcommand orchestration (`render`, `validate`, `apply`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod fragment;
pub mod logging;
pub mod packages;
pub mod platform;
pub mod resources;
pub mod tasks;
