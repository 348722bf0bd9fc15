use clap::Parser;

mod cli;
mod commands;
mod domain;
mod services;

fn main() {
    let cli = cli::Cli::parse();
    let code = match commands::dispatch(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {:#}", err);
            2
        }
    };
    std::process::exit(code);
}
