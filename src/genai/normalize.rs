//! Argument classification into prompt content.
//!
//! Classification is an ordered predicate chain; the first matching rule
//! wins. A failed fetch for a well-formed URL falls back to treating the
//! argument as literal text, which masks genuine network errors for
//! URL-shaped arguments. The fallback is deliberate and observable via
//! [`Normalizer::fallback_urls`]; tightening it changes documented
//! behavior.

use std::path::Path;

use image::DynamicImage;
use serde_json::Value;
use url::Url;

use crate::genai::codec;
use crate::genai::content::{ContentItem, Prompt};
use crate::genai::error::GenAiError;
use crate::genai::fetch::{RemoteFetch, media_type};

/// One raw prompt argument before classification.
#[derive(Debug, Clone)]
pub enum PromptArg {
    /// An already-decoded image.
    Image(DynamicImage),
    /// A literal string: file path, URL, or plain text.
    Text(String),
    /// A JSON value from scripted input; only strings are accepted.
    Raw(Value),
}

impl From<&str> for PromptArg {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PromptArg {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Resolves raw arguments into an ordered prompt.
pub struct Normalizer<'a> {
    fetcher: &'a dyn RemoteFetch,
    fallback_urls: Vec<String>,
}

impl<'a> Normalizer<'a> {
    pub fn new(fetcher: &'a dyn RemoteFetch) -> Self {
        Self {
            fetcher,
            fallback_urls: Vec::new(),
        }
    }

    /// URLs from the last `normalize` call whose fetch failed and fell
    /// back to literal text.
    pub fn fallback_urls(&self) -> &[String] {
        &self.fallback_urls
    }

    /// Classifies every argument in order: decoded image, local image
    /// file, fetchable URL, literal text.
    pub fn normalize(&mut self, args: Vec<PromptArg>) -> Result<Prompt, GenAiError> {
        self.fallback_urls.clear();
        let mut items = Vec::with_capacity(args.len());
        for arg in args {
            items.push(self.classify(arg)?);
        }
        Ok(Prompt::new(items))
    }

    fn classify(&mut self, arg: PromptArg) -> Result<ContentItem, GenAiError> {
        match arg {
            PromptArg::Image(image) => Ok(ContentItem::Image(codec::encode_png(&image)?)),
            PromptArg::Text(text) => self.classify_text(text),
            PromptArg::Raw(Value::String(text)) => self.classify_text(text),
            PromptArg::Raw(other) => Err(GenAiError::InvalidArgument {
                kind: json_kind(&other).to_string(),
            }),
        }
    }

    fn classify_text(&mut self, text: String) -> Result<ContentItem, GenAiError> {
        if Path::new(&text).is_file() {
            if let Some(blob) = codec::load_image_file(Path::new(&text)) {
                return Ok(ContentItem::Image(blob));
            }
        }
        if let Some(url) = parse_web_url(&text) {
            match self.resolve_url(&url)? {
                Some(item) => return Ok(item),
                None => self.fallback_urls.push(url.to_string()),
            }
        }
        Ok(ContentItem::Text(text))
    }

    /// Fetches and classifies a URL by its content type. `Ok(None)` means
    /// the fetch itself failed and the argument falls through to literal
    /// text.
    fn resolve_url(&self, url: &Url) -> Result<Option<ContentItem>, GenAiError> {
        let fetched = match self.fetcher.get(url) {
            Ok(fetched) => fetched,
            Err(_) => return Ok(None),
        };
        let content_type = media_type(&fetched.content_type);
        if content_type.starts_with("image/") {
            return match codec::decode_or_rasterize(&fetched.body) {
                Some(blob) => Ok(Some(ContentItem::Image(blob))),
                None => Err(GenAiError::UnsupportedMedia {
                    content_type,
                    url: url.to_string(),
                }),
            };
        }
        if content_type.starts_with("text/") || content_type == "application/json" {
            let body = String::from_utf8_lossy(&fetched.body).into_owned();
            return Ok(Some(ContentItem::Fetched(body)));
        }
        Err(GenAiError::UnsupportedMedia {
            content_type,
            url: url.to_string(),
        })
    }
}

/// Accepts only absolute http(s) URLs.
fn parse_web_url(text: &str) -> Option<Url> {
    let url = Url::parse(text).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
