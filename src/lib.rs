pub mod cli;
pub mod executor;
pub mod history;
pub mod registry;
pub mod resolver;
pub mod taskfile;

/// Run the command line interface and return an exit code.
pub fn run_cli() -> i32 {
    cli::run()
}
