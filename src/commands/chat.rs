use std::io::{self, BufRead, Write};

use clap::Args;

use crate::config::{self, ProfileConfig};
use crate::genai::client::{ClientOptions, GeminiClient};
use crate::genai::fetch::HttpFetcher;
use crate::genai::normalize::Normalizer;
use crate::genai::settings::SafetyPolicy;
use crate::render;

#[derive(Debug, Args, Clone)]
pub struct ChatArgs {
    /// Model name, short or full.
    #[arg(long)]
    model: Option<String>,

    /// Profile name from the config file.
    #[arg(long)]
    profile: Option<String>,

    /// API key value or path to a key file.
    #[arg(long)]
    api_key: Option<String>,

    /// Safety preset: low, medium, high, none.
    #[arg(long)]
    safety: Option<String>,

    /// Transport timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

/// Reads turns from stdin until end-of-input and drives a single chat
/// session, one send per line.
pub fn run(args: ChatArgs) -> Result<(), String> {
    let profile = match &args.profile {
        Some(name) => config::load_profile(name)?,
        None => ProfileConfig::default(),
    };

    let model = args
        .model
        .clone()
        .or_else(|| trimmed_env("GP_MODEL"))
        .or(profile.model.clone())
        .ok_or_else(|| "No model provided. Use --model or set GP_MODEL.".to_string())?;
    let api_key = args
        .api_key
        .clone()
        .or_else(|| trimmed_env("GEMINI_API_KEY"))
        .or(profile.api_key.clone())
        .ok_or_else(|| "No API key provided. Use --api-key or set GEMINI_API_KEY.".to_string())?;
    let safety_name = args
        .safety
        .clone()
        .or(profile.safety.clone())
        .unwrap_or_else(|| "none".to_string());
    let safety = SafetyPolicy::preset(&safety_name).map_err(|err| err.to_string())?;

    let mut client = GeminiClient::connect(ClientOptions {
        api_key,
        model,
        settings: profile.settings_update(),
        safety: Some(safety),
        timeout_secs: args.timeout.or(profile.timeout),
    })
    .map_err(|err| err.to_string())?;

    client.start_session();
    let fetcher = HttpFetcher::new();
    let mut normalizer = Normalizer::new(&fetcher);

    let stdin = io::stdin();
    loop {
        render::print_user_marker();
        io::stdout().flush().ok();

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|err| format!("Failed to read input: {err}"))?;
        if read == 0 {
            println!("End of chat");
            return Ok(());
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let prompt = normalizer
            .normalize(vec![line.into()])
            .map_err(|err| err.to_string())?;
        let response = client.send_latest(prompt).map_err(|err| err.to_string())?;
        render::print_model_marker();
        render::print_answer(&response);
    }
}

fn trimmed_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
