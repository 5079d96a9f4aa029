//! Terminal output helpers. A sink for response text and refusal
//! feedback; nothing here carries logic beyond formatting.

use owo_colors::OwoColorize;

use crate::genai::wire::{GenerateContentResponse, PromptFeedback};

/// Prints the generated text, or the refusal feedback when the provider
/// returned no displayable content.
pub fn print_answer(response: &GenerateContentResponse) {
    match response.text() {
        Some(text) => println!("{text}"),
        None => print_feedback(response.prompt_feedback.as_ref()),
    }
}

/// Prints a refusal banner with whatever feedback the provider attached.
pub fn print_feedback(feedback: Option<&PromptFeedback>) {
    println!("{}", "RESPONSE REFUSED: SEE FEEDBACK".red().bold());
    match feedback.and_then(|feedback| serde_json::to_string_pretty(feedback).ok()) {
        Some(raw) => println!("{raw}"),
        None => println!("(no feedback attached)"),
    }
}

/// Prompt marker for the interactive chat loop.
pub fn print_user_marker() {
    println!("{}:", "USER".green().bold());
}

/// Response marker for the interactive chat loop.
pub fn print_model_marker() {
    println!("{}:", "MODEL".red().bold());
}
