//! Known conversation providers.

/// Providers the feed knows how to label. Others render with neutral styling.
pub const KNOWN_PROVIDERS: [&str; 4] = ["openai", "anthropic", "perplexity", "gemini"];

/// Badge color class for a provider id.
pub fn color_class(provider_id: &str) -> &'static str {
    match provider_id {
        "openai" => "primary",
        "anthropic" => "success",
        "perplexity" => "info",
        "gemini" => "warning",
        _ => "secondary",
    }
}

/// Human label for a provider id.
pub fn label(provider_id: &str) -> String {
    match provider_id {
        "openai" => "OpenAI".to_string(),
        "anthropic" => "Anthropic".to_string(),
        "perplexity" => "Perplexity".to_string(),
        "gemini" => "Gemini".to_string(),
        other => other.to_uppercase(),
    }
}
