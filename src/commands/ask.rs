use std::env;
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;

use clap::Args;
use serde_json::json;

use crate::config::{self, ProfileConfig};
use crate::genai::client::{ClientOptions, GeminiClient};
use crate::genai::fetch::HttpFetcher;
use crate::genai::normalize::{Normalizer, PromptArg};
use crate::genai::settings::{SafetyPolicy, SettingsUpdate, StopSequences};
use crate::render;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit: ",
    env!("GP_GIT_SHA"),
    ", built: ",
    env!("GP_BUILD_TS"),
    ")"
);

#[derive(Debug, Args, Clone)]
pub struct AskArgs {
    /// Prompt arguments: literal text, image file paths, or URLs. Reads
    /// stdin when omitted.
    #[arg(value_name = "PROMPT")]
    prompt: Vec<String>,

    /// Model name, short or full (e.g. gemini-pro or models/gemini-pro).
    #[arg(long)]
    model: Option<String>,

    /// Profile name from the config file.
    #[arg(long)]
    profile: Option<String>,

    /// API key value or path to a key file.
    #[arg(long)]
    api_key: Option<String>,

    /// Sampling temperature, 0.0..=1.0.
    #[arg(long)]
    temperature: Option<f32>,

    /// Top-k sampling bound.
    #[arg(long)]
    top_k: Option<u32>,

    /// Nucleus sampling bound, 0.0..=1.0.
    #[arg(long)]
    top_p: Option<f32>,

    /// Number of candidates requested per call.
    #[arg(long)]
    candidates: Option<u32>,

    /// Response length cap in tokens.
    #[arg(long)]
    max_output_tokens: Option<u32>,

    /// Stop sequence; repeat the flag for several.
    #[arg(long)]
    stop: Vec<String>,

    /// Safety preset: low, medium, high, none.
    #[arg(long)]
    safety: Option<String>,

    /// Transport timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Output mode: text or json.
    #[arg(long)]
    output: Option<String>,

    /// Shorthand for --output json.
    #[arg(long)]
    json: bool,

    /// Write the response to a file as well.
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,

    /// Assemble and print the request without sending it.
    #[arg(long)]
    dry_run: bool,

    /// Print resolution details to stderr.
    #[arg(long)]
    verbose: bool,

    /// Suppress everything on stderr except fatal errors.
    #[arg(long)]
    quiet: bool,

    /// Print token usage to stderr.
    #[arg(long)]
    show_usage: bool,

    /// Print version and build metadata.
    #[arg(long)]
    version: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Text,
    Json,
}

impl OutputMode {
    fn parse(value: &str, origin: &str) -> Result<Self, String> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "Invalid {origin} '{other}'. Supported values: text, json."
            )),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

pub fn run(args: AskArgs) -> Result<(), String> {
    if args.version {
        println!("gempipe {VERSION}");
        return Ok(());
    }

    let profile = match &args.profile {
        Some(name) => config::load_profile(name)?,
        None => ProfileConfig::default(),
    };

    let model = args
        .model
        .clone()
        .or(env_value("GP_MODEL"))
        .or(profile.model.clone())
        .ok_or_else(|| "No model provided. Use --model or set GP_MODEL.".to_string())?;

    let update = SettingsUpdate {
        temperature: first_of(
            args.temperature,
            env_parsed("GP_TEMPERATURE")?,
            profile.temperature,
        ),
        top_k: first_of(args.top_k, env_parsed("GP_TOP_K")?, profile.top_k),
        top_p: first_of(args.top_p, env_parsed("GP_TOP_P")?, profile.top_p),
        candidate_count: first_of(
            args.candidates,
            env_parsed("GP_CANDIDATES")?,
            profile.candidate_count,
        ),
        max_output_tokens: first_of(
            args.max_output_tokens,
            env_parsed("GP_MAX_OUTPUT_TOKENS")?,
            profile.max_output_tokens,
        ),
        stop_sequences: if args.stop.is_empty() {
            profile.stop_sequences.clone()
        } else {
            Some(StopSequences::Many(args.stop.clone()))
        },
    };
    update.validate().map_err(|err| err.to_string())?;

    let safety_name = args
        .safety
        .clone()
        .or(env_value("GP_SAFETY"))
        .or(profile.safety.clone())
        .unwrap_or_else(|| "none".to_string());
    let safety = SafetyPolicy::preset(&safety_name).map_err(|err| err.to_string())?;

    let timeout = first_of(args.timeout, env_parsed("GP_TIMEOUT")?, profile.timeout);

    let output = if args.json {
        OutputMode::Json
    } else if let Some(value) = &args.output {
        OutputMode::parse(value, "--output")?
    } else if let Some(value) = &profile.output {
        OutputMode::parse(value, "profile output")?
    } else {
        OutputMode::Text
    };

    let show_usage = args.show_usage || profile.show_usage.unwrap_or(false);
    let api_key = args
        .api_key
        .clone()
        .or(env_value("GEMINI_API_KEY"))
        .or(profile.api_key.clone());

    let prompt_args = gather_prompt(&args.prompt)?;

    if args.verbose && !args.quiet {
        eprintln!(
            "model={model} output={} safety={safety_name} api_key_present={}",
            output.as_str(),
            api_key.is_some()
        );
    }

    let fetcher = HttpFetcher::new();
    let mut normalizer = Normalizer::new(&fetcher);
    let prompt = normalizer
        .normalize(prompt_args)
        .map_err(|err| err.to_string())?;
    if args.verbose && !args.quiet {
        for url in normalizer.fallback_urls() {
            eprintln!("url_fallback={url}");
        }
    }

    if args.dry_run {
        let request = json!({
            "dry_run": true,
            "model": model,
            "output": output.as_str(),
            "timeout_secs": timeout,
            "request": {
                "contents": [prompt.to_content()],
                "generationConfig": update.to_wire(),
                "safetySettings": safety.to_wire(),
            },
        });
        println!("{request}");
        if show_usage && !args.quiet {
            eprintln!("usage: unavailable (dry-run)");
        }
        if let Some(path) = &args.save {
            save_output(path, &request.to_string())?;
        }
        return Ok(());
    }

    let api_key = api_key
        .ok_or_else(|| "No API key provided. Use --api-key or set GEMINI_API_KEY.".to_string())?;

    let mut client = GeminiClient::connect(ClientOptions {
        api_key,
        model,
        settings: update,
        safety: Some(safety),
        timeout_secs: timeout,
    })
    .map_err(|err| err.to_string())?;

    let response = client.ask(prompt).map_err(|err| err.to_string())?;

    if show_usage && !args.quiet {
        match &response.usage_metadata {
            Some(usage) => eprintln!(
                "usage: prompt={} candidates={} total={}",
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0),
                usage.total_token_count.unwrap_or(0)
            ),
            None => eprintln!("usage: unavailable"),
        }
    }

    match output {
        OutputMode::Json => {
            let raw = serde_json::to_string(&response).map_err(|err| err.to_string())?;
            println!("{raw}");
            if let Some(path) = &args.save {
                save_output(path, &raw)?;
            }
        }
        OutputMode::Text => {
            render::print_answer(&response);
            if let Some(path) = &args.save {
                let text = response.text().unwrap_or_else(|| {
                    serde_json::to_string(&response.prompt_feedback).unwrap_or_default()
                });
                save_output(path, &text)?;
            }
        }
    }
    Ok(())
}

fn first_of<T>(cli: Option<T>, env: Option<T>, profile: Option<T>) -> Option<T> {
    cli.or(env).or(profile)
}

fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parsed<T: FromStr>(name: &str) -> Result<Option<T>, String> {
    match env_value(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| format!("Invalid {name} '{raw}'.")),
    }
}

fn gather_prompt(args: &[String]) -> Result<Vec<PromptArg>, String> {
    if !args.is_empty() {
        return Ok(args.iter().map(|arg| PromptArg::from(arg.clone())).collect());
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("Failed to read prompt from stdin: {err}"))?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Err("No prompt provided. Pass arguments or pipe stdin.".to_string());
    }
    Ok(vec![PromptArg::from(trimmed.to_string())])
}

fn save_output(path: &PathBuf, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create output directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    fs::write(path, contents)
        .map_err(|err| format!("Failed to write output file '{}': {err}", path.display()))
}
