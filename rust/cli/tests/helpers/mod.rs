//! Shared test helpers.
//!
//! - `cli_runner`: `CliRunner` drives the built `bgo` binary, or `bgo_cli::run`
//!   directly when no binary is around, and captures exit code and output.
//! - `temp_files`: `TempFileManager` hands out unique paths under `target/`
//!   and removes them on drop.
pub mod cli_runner;
pub mod temp_files;
