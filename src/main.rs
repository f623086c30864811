use agri_survey_processor::cli::{self, Args, EXIT_FAILURE};
use clap::Parser;
use std::process;

fn main() {
    let args = Args::parse();

    match cli::run(args) {
        Ok(code) => process::exit(code),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(EXIT_FAILURE);
        }
    }
}
