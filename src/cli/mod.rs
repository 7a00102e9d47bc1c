//! CLI argument parsing.

mod args;

pub use args::{Cli, CleanArgs, Command, ConfigAction, ExtractArgs, GlobalArgs, LinkArgs};
