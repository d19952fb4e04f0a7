mod cli;
mod executor;
mod history;
mod registry;
mod resolver;
mod taskfile;

fn main() {
    let code = cli::run();
    if code != 0 {
        std::process::exit(code);
    }
}
