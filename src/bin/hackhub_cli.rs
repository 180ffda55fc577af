// src/bin/hackhub_cli.rs

use hackhub::commands::cli::parse_cli_args;
use hackhub::{initialize_environment, run_script_commands};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    initialize_environment();

    let args: Vec<String> = env::args().collect();
    let command = parse_cli_args(&args)?;
    run_script_commands(command)
}
