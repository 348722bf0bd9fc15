//! Command handler layer.
//!
//! This module owns CLI-oriented orchestration and output wiring.
//!
//! ## Files
//! - `gen.rs` — generate/convert: commands that write documents.
//! - `check.rs` — validate/lint: commands that judge documents.
//!
//! ## Principles
//! - Parse/match CLI inputs here.
//! - Delegate business logic to `services/*`.
//! - Handlers return the process exit code; usage errors bubble as `Err`.

use crate::cli::{Cli, Commands};

pub mod check;
pub mod gen;

pub fn dispatch(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Gen {
            input,
            target,
            output,
        } => gen::handle_gen(cli.json, input, *target, output),
        Commands::Validate { file, strict } => check::handle_validate(cli.json, file, *strict),
        Commands::Lint { dir, strict } => check::handle_lint(cli.json, dir, *strict),
        Commands::Convert { file, output } => {
            gen::handle_convert(cli.json, file, output.as_deref())
        }
    }
}
