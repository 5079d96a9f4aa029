use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use gempipe::commands::ask::{self, AskArgs};
use gempipe::commands::chat::{self, ChatArgs};
use gempipe::commands::config::{self, ConfigArgs};
use gempipe::commands::models::{self, ModelsArgs};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit: ",
    env!("GP_GIT_SHA"),
    ", built: ",
    env!("GP_BUILD_TS"),
    ")"
);

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  gempipe ask --model gemini-pro \"2+2?\"\n  echo \"2+2?\" | gempipe ask --model gemini-pro\n  gempipe ask --model gemini-pro photo.png \"what is in this picture?\"\n  gempipe config check\n  gempipe completion bash > ~/.local/share/bash-completion/completions/gempipe";

const ASK_HELP_EXAMPLES: &str = "Examples:\n  gempipe ask --model gemini-pro \"2+2?\"\n  gempipe ask --model gemini-pro --safety high --temperature 0.2 \"Explain nucleus sampling\"\n  gempipe ask --model gemini-pro --dry-run --json \"Explain stop sequences\"";

#[derive(Debug, Parser)]
#[command(
    name = "gempipe",
    about = "Gemini prompt and chat CLI",
    version = VERSION,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Ask the model a single question", after_help = ASK_HELP_EXAMPLES)]
    Ask(AskArgs),
    #[command(about = "Chat with the model, reading turns from stdin")]
    Chat(ChatArgs),
    #[command(about = "List the provider model catalog")]
    Models(ModelsArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "gempipe", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "gempipe", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "gempipe", &mut io::stdout()),
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask(args) => ask::run(args),
        Commands::Chat(args) => chat::run(args),
        Commands::Models(args) => models::run(args),
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
