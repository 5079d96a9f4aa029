//! Validated generation settings and the safety policy presets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::genai::error::GenAiError;
use crate::genai::models::ModelInfo;
use crate::genai::wire::{BlockThreshold, GenerationConfig, HarmCategory, SafetySetting};

const DEFAULT_TEMPERATURE: f32 = 1.0;
const DEFAULT_TOP_K: u32 = 32;
const DEFAULT_TOP_P: f32 = 1.0;
const DEFAULT_CANDIDATE_COUNT: u32 = 1;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Stop sequences accept a bare string or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopSequences {
    One(String),
    Many(Vec<String>),
}

impl StopSequences {
    /// Normalizes to the ordered list form.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(sequence) => vec![sequence],
            Self::Many(sequences) => sequences,
        }
    }
}

/// Partial update of individual settings fields. Unset fields are left
/// unchanged; restoring a model's published defaults is the explicit
/// [`GenerationSettings::model_defaults`] path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub candidate_count: Option<u32>,
    pub max_output_tokens: Option<u32>,
    pub stop_sequences: Option<StopSequences>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Range-checks the fields that carry one, without touching state.
    pub fn validate(&self) -> Result<(), GenAiError> {
        if let Some(value) = self.temperature {
            check_unit_range("temperature", value)?;
        }
        if let Some(value) = self.top_p {
            check_unit_range("top_p", value)?;
        }
        Ok(())
    }

    /// Partial wire config for requests that let the model fill in the
    /// unset fields itself.
    pub fn to_wire(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            candidate_count: self.candidate_count,
            max_output_tokens: self.max_output_tokens,
            stop_sequences: self.stop_sequences.clone().map(StopSequences::into_vec),
        }
    }
}

/// Reconfiguration request: either a complete settings snapshot or
/// individual fields, never both.
#[derive(Debug, Clone, Default)]
pub struct ReconfigureOptions {
    pub config: Option<GenerationSettings>,
    pub fields: SettingsUpdate,
}

impl ReconfigureOptions {
    /// Replaces the settings with a complete snapshot.
    pub fn config(config: GenerationSettings) -> Self {
        Self {
            config: Some(config),
            fields: SettingsUpdate::default(),
        }
    }

    /// Updates individual fields.
    pub fn fields(fields: SettingsUpdate) -> Self {
        Self {
            config: None,
            fields,
        }
    }
}

/// Validated generation parameters for one selected model.
///
/// `top_k`, `candidate_count`, and `max_output_tokens` are unsigned, so
/// the non-negativity invariant holds at every parse boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    candidate_count: u32,
    max_output_tokens: u32,
    stop_sequences: Vec<String>,
}

impl GenerationSettings {
    /// Settings seeded from the model's published defaults. Catalog
    /// entries may omit a field or publish a default outside the accepted
    /// range; omissions fall back to crate constants and out-of-range
    /// defaults are clamped.
    pub fn model_defaults(model: &ModelInfo) -> Self {
        Self {
            temperature: model
                .temperature
                .unwrap_or(DEFAULT_TEMPERATURE)
                .clamp(0.0, 1.0),
            top_k: model.top_k.unwrap_or(DEFAULT_TOP_K),
            top_p: model.top_p.unwrap_or(DEFAULT_TOP_P).clamp(0.0, 1.0),
            candidate_count: DEFAULT_CANDIDATE_COUNT,
            max_output_tokens: model.output_token_limit.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
            stop_sequences: Vec::new(),
        }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    pub fn top_p(&self) -> f32 {
        self.top_p
    }

    pub fn candidate_count(&self) -> u32 {
        self.candidate_count
    }

    pub fn max_output_tokens(&self) -> u32 {
        self.max_output_tokens
    }

    pub fn stop_sequences(&self) -> &[String] {
        &self.stop_sequences
    }

    /// Applies a partial update. The update is staged on a copy and
    /// committed only once every field has passed validation, so a
    /// failure leaves the previous settings untouched.
    pub fn apply(&mut self, update: &SettingsUpdate) -> Result<(), GenAiError> {
        let mut staged = self.clone();
        if let Some(value) = update.temperature {
            staged.temperature = check_unit_range("temperature", value)?;
        }
        if let Some(value) = update.top_p {
            staged.top_p = check_unit_range("top_p", value)?;
        }
        if let Some(value) = update.top_k {
            staged.top_k = value;
        }
        if let Some(value) = update.candidate_count {
            staged.candidate_count = value;
        }
        if let Some(value) = update.max_output_tokens {
            staged.max_output_tokens = value;
        }
        if let Some(sequences) = update.stop_sequences.clone() {
            staged.stop_sequences = sequences.into_vec();
        }
        *self = staged;
        Ok(())
    }

    /// Replaces the settings wholesale or applies individual fields;
    /// passing both is an error and mutates nothing.
    pub fn reconfigure(&mut self, options: ReconfigureOptions) -> Result<(), GenAiError> {
        match options.config {
            Some(_) if !options.fields.is_empty() => Err(GenAiError::Validation {
                field: "reconfigure",
                message: "specify a full config or individual fields, not both".to_string(),
            }),
            Some(config) => {
                *self = config;
                Ok(())
            }
            None => self.apply(&options.fields),
        }
    }

    /// Immutable snapshot handed to the wire layer.
    pub fn snapshot(&self) -> GenerationSettings {
        self.clone()
    }

    /// Complete wire config for a request.
    pub fn to_wire(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            top_k: Some(self.top_k),
            candidate_count: Some(self.candidate_count),
            max_output_tokens: Some(self.max_output_tokens),
            stop_sequences: if self.stop_sequences.is_empty() {
                None
            } else {
                Some(self.stop_sequences.clone())
            },
        }
    }
}

fn check_unit_range(field: &'static str, value: f32) -> Result<f32, GenAiError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(GenAiError::Validation {
            field,
            message: format!("must be within 0.0..=1.0 (given: {value})"),
        })
    }
}

/// Per-category block thresholds sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyPolicy {
    thresholds: BTreeMap<HarmCategory, BlockThreshold>,
}

impl Default for SafetyPolicy {
    /// Blocks nothing unless the caller opts into a stricter preset.
    fn default() -> Self {
        Self::block_none()
    }
}

impl SafetyPolicy {
    fn uniform(threshold: BlockThreshold) -> Self {
        Self {
            thresholds: HarmCategory::ALL
                .iter()
                .map(|category| (*category, threshold))
                .collect(),
        }
    }

    /// Most restrictive preset: blocks low severity and above.
    pub fn low_and_above() -> Self {
        Self::uniform(BlockThreshold::BlockLowAndAbove)
    }

    /// Blocks medium severity and above.
    pub fn medium_and_above() -> Self {
        Self::uniform(BlockThreshold::BlockMediumAndAbove)
    }

    /// Blocks only high severity.
    pub fn only_high() -> Self {
        Self::uniform(BlockThreshold::BlockOnlyHigh)
    }

    /// Least restrictive preset; the default.
    pub fn block_none() -> Self {
        Self::uniform(BlockThreshold::BlockNone)
    }

    /// Looks a preset up by its short name.
    pub fn preset(name: &str) -> Result<Self, GenAiError> {
        match name {
            "low" => Ok(Self::low_and_above()),
            "medium" => Ok(Self::medium_and_above()),
            "high" => Ok(Self::only_high()),
            "none" => Ok(Self::block_none()),
            other => Err(GenAiError::Validation {
                field: "safety",
                message: format!("unknown preset '{other}' (use: low, medium, high, none)"),
            }),
        }
    }

    /// Overrides the threshold for one category.
    pub fn set(&mut self, category: HarmCategory, threshold: BlockThreshold) {
        self.thresholds.insert(category, threshold);
    }

    pub fn threshold(&self, category: HarmCategory) -> Option<BlockThreshold> {
        self.thresholds.get(&category).copied()
    }

    pub fn to_wire(&self) -> Vec<SafetySetting> {
        self.thresholds
            .iter()
            .map(|(category, threshold)| SafetySetting {
                category: *category,
                threshold: *threshold,
            })
            .collect()
    }
}
