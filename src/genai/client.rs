//! Client context, credential resolution, and the blocking HTTP backend.

use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::genai::chat::{ChatSession, Turn};
use crate::genai::content::Prompt;
use crate::genai::error::GenAiError;
use crate::genai::models::{ModelCatalog, ModelInfo};
use crate::genai::settings::{
    GenerationSettings, ReconfigureOptions, SafetyPolicy, SettingsUpdate,
};
use crate::genai::wire::{Content, GenerateContentRequest, GenerateContentResponse};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Resolves a credential string: a path to a readable file yields the
/// trimmed file contents, anything else is used as-is.
pub fn resolve_credential(raw: &str) -> String {
    let trimmed = raw.trim();
    if Path::new(trimmed).is_file() {
        if let Ok(contents) = fs::read_to_string(trimmed) {
            return contents.trim().to_string();
        }
    }
    raw.to_string()
}

/// Provider operations the client depends on.
pub trait ModelApi {
    fn list_models(&self) -> Result<ModelCatalog, GenAiError>;

    fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError>;

    /// Multi-turn variant. The REST API serves both operations from the
    /// same endpoint, so this defaults to [`Self::generate`].
    fn send_chat(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        self.generate(model, request)
    }
}

/// Blocking HTTP backend for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpApi {
    /// Creates a backend with the resolved credential. The transport
    /// timeout is the only deadline any call gets.
    pub fn new(api_key: String, timeout_secs: Option<u64>) -> Result<Self, GenAiError> {
        let mut builder = Client::builder();
        if let Some(timeout_secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|source| GenAiError::Request { source })?;
        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            api_key,
        })
    }

    /// Points the backend at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn check(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, GenAiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().unwrap_or_default();
            Err(GenAiError::Api { status, body })
        }
    }
}

impl ModelApi for HttpApi {
    fn list_models(&self) -> Result<ModelCatalog, GenAiError> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .map_err(|source| GenAiError::Request { source })?;
        Self::check(response)?
            .json()
            .map_err(|source| GenAiError::Request { source })
    }

    fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenAiError> {
        let response = self
            .client
            .post(format!(
                "{}/models/{model}:generateContent",
                self.base_url
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .map_err(|source| GenAiError::Request { source })?;
        Self::check(response)?
            .json()
            .map_err(|source| GenAiError::Request { source })
    }
}

/// Construction parameters for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Credential string or path to a credential file.
    pub api_key: String,
    /// Model to select from the provider catalog, short or full name.
    pub model: String,
    /// Overrides applied on top of the model's published defaults.
    pub settings: SettingsUpdate,
    /// Safety policy; blocks nothing when unset.
    pub safety: Option<SafetyPolicy>,
    /// Transport timeout in seconds.
    pub timeout_secs: Option<u64>,
}

/// One Gemini conversation context: selected model, validated settings,
/// safety policy, flat history, and chat sessions.
///
/// The client owns its state exclusively. It is not synchronized;
/// concurrent use from multiple threads must be serialized by the
/// caller. History and session turn lists are append-only and never
/// trimmed.
pub struct GeminiClient {
    api: Box<dyn ModelApi>,
    catalog: ModelCatalog,
    model: ModelInfo,
    settings: GenerationSettings,
    safety: SafetyPolicy,
    history: Vec<Turn>,
    sessions: Vec<ChatSession>,
}

impl GeminiClient {
    /// Connects over HTTP: resolves the credential, loads the model
    /// catalog, selects the model, and seeds settings from its published
    /// defaults.
    pub fn connect(options: ClientOptions) -> Result<Self, GenAiError> {
        let credential = resolve_credential(&options.api_key);
        let api = HttpApi::new(credential, options.timeout_secs)?;
        Self::with_api(Box::new(api), options)
    }

    /// Same construction against any backend; tests use a stub.
    pub fn with_api(api: Box<dyn ModelApi>, options: ClientOptions) -> Result<Self, GenAiError> {
        let catalog = api.list_models()?;
        let model = catalog.find(&options.model)?.clone();
        let mut settings = GenerationSettings::model_defaults(&model);
        settings.apply(&options.settings)?;
        Ok(Self {
            api,
            catalog,
            model,
            settings,
            safety: options.safety.unwrap_or_default(),
            history: Vec::new(),
            sessions: Vec::new(),
        })
    }

    pub fn model(&self) -> &ModelInfo {
        &self.model
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Immutable settings snapshot.
    pub fn snapshot(&self) -> GenerationSettings {
        self.settings.snapshot()
    }

    /// See [`GenerationSettings::reconfigure`].
    pub fn reconfigure(&mut self, options: ReconfigureOptions) -> Result<(), GenAiError> {
        self.settings.reconfigure(options)
    }

    /// Restores every field to the selected model's published defaults.
    pub fn reset_defaults(&mut self) {
        self.settings = GenerationSettings::model_defaults(&self.model);
    }

    pub fn safety(&self) -> &SafetyPolicy {
        &self.safety
    }

    pub fn set_safety(&mut self, policy: SafetyPolicy) {
        self.safety = policy;
    }

    /// Flat prompt/response history across all standalone asks.
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    fn request_for(&self, contents: Vec<Content>) -> GenerateContentRequest {
        GenerateContentRequest {
            contents,
            generation_config: Some(self.settings.to_wire()),
            safety_settings: Some(self.safety.to_wire()),
        }
    }

    /// Sends one standalone prompt with no retained context and records
    /// the exchange in the flat history. A refusal is a normal result:
    /// the response then carries feedback instead of text.
    pub fn ask(&mut self, prompt: Prompt) -> Result<GenerateContentResponse, GenAiError> {
        let request = self.request_for(vec![prompt.to_content()]);
        let response = self.api.generate(self.model.short_name(), &request)?;
        self.history.push(Turn::Prompt(prompt));
        self.history.push(Turn::Response(response.clone()));
        Ok(response)
    }

    /// Opens a new chat session and returns its index.
    pub fn start_session(&mut self) -> usize {
        self.sessions.push(ChatSession::new());
        self.sessions.len() - 1
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn session(&self, index: usize) -> Result<&ChatSession, GenAiError> {
        self.sessions
            .get(index)
            .ok_or_else(|| session_index_error(index))
    }

    /// Sends the next turn of a session with the session's full history
    /// as context. Fails before any mutation when the session is closed.
    pub fn send(
        &mut self,
        index: usize,
        prompt: Prompt,
    ) -> Result<GenerateContentResponse, GenAiError> {
        let session = self
            .sessions
            .get(index)
            .ok_or_else(|| session_index_error(index))?;
        if session.is_closed() {
            return Err(GenAiError::SessionClosed { session: index });
        }
        let mut contents = session.context_contents();
        contents.push(prompt.to_content());
        let request = self.request_for(contents);
        let response = self.api.send_chat(self.model.short_name(), &request)?;
        self.sessions[index].record_exchange(prompt, response.clone());
        Ok(response)
    }

    /// Sends to the most recently created session.
    pub fn send_latest(&mut self, prompt: Prompt) -> Result<GenerateContentResponse, GenAiError> {
        let index = self
            .sessions
            .len()
            .checked_sub(1)
            .ok_or_else(|| GenAiError::Validation {
                field: "session",
                message: "no chat session started".to_string(),
            })?;
        self.send(index, prompt)
    }

    /// Caller-driven close; further sends fail with a session-closed
    /// error.
    pub fn close_session(&mut self, index: usize) -> Result<(), GenAiError> {
        let session = self
            .sessions
            .get_mut(index)
            .ok_or_else(|| session_index_error(index))?;
        session.close();
        Ok(())
    }
}

fn session_index_error(index: usize) -> GenAiError {
    GenAiError::Validation {
        field: "session",
        message: format!("no chat session at index {index}"),
    }
}
