use std::process;

use clap::Parser;
use gempipe::commands::ask::{self, AskArgs};

#[derive(Debug, Parser)]
#[command(
    name = "gemask",
    about = "Ask Gemini a single question",
    disable_version_flag = true
)]
struct Cli {
    #[command(flatten)]
    ask: AskArgs,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = ask::run(cli.ask) {
        eprintln!("{err}");
        process::exit(1);
    }
}
