use clap::Args;

use crate::config::{self, ProfileConfig};
use crate::genai::client::{HttpApi, ModelApi, resolve_credential};

#[derive(Debug, Args, Clone)]
pub struct ModelsArgs {
    /// Profile name from the config file.
    #[arg(long)]
    profile: Option<String>,

    /// API key value or path to a key file.
    #[arg(long)]
    api_key: Option<String>,

    /// Print the raw catalog JSON.
    #[arg(long)]
    json: bool,

    /// Transport timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,
}

pub fn run(args: ModelsArgs) -> Result<(), String> {
    let profile = match &args.profile {
        Some(name) => config::load_profile(name)?,
        None => ProfileConfig::default(),
    };

    let api_key = args
        .api_key
        .clone()
        .or_else(|| {
            std::env::var("GEMINI_API_KEY")
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .or(profile.api_key.clone())
        .ok_or_else(|| "No API key provided. Use --api-key or set GEMINI_API_KEY.".to_string())?;

    let api = HttpApi::new(resolve_credential(&api_key), args.timeout.or(profile.timeout))
        .map_err(|err| err.to_string())?;
    let catalog = api.list_models().map_err(|err| err.to_string())?;

    if args.json {
        let raw = serde_json::to_string_pretty(&catalog).map_err(|err| err.to_string())?;
        println!("{raw}");
        return Ok(());
    }

    for model in &catalog.models {
        println!(
            "{}  in={} out={} temperature={} top_p={} top_k={}",
            model.short_name(),
            fmt_opt(model.input_token_limit),
            fmt_opt(model.output_token_limit),
            fmt_opt(model.temperature),
            fmt_opt(model.top_p),
            fmt_opt(model.top_k),
        );
    }
    Ok(())
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|value| value.to_string())
        .unwrap_or_else(|| "-".to_string())
}
