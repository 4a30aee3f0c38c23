use std::process::ExitCode;
use colored::Colorize;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let command_line_interface = nbt_depth::cli::CommandLineInterface::load();
    match command_line_interface.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{} {error}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
