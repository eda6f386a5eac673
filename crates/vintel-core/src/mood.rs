//! Mood colour palettes derived by the backend from a conversation's tone.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Colour theme for one conversation, as returned by
/// `GET /conversation/{id}/colors`.
///
/// Every colour is a `#rrggbb` hex string; anything else is rejected while
/// decoding so the values can go straight into a style attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoodPalette {
    pub mood: String,
    /// 0..=100
    #[serde(deserialize_with = "clamped_intensity")]
    pub intensity: f32,
    #[serde(deserialize_with = "hex_color")]
    pub primary: String,
    #[serde(deserialize_with = "hex_color")]
    pub secondary: String,
    #[serde(deserialize_with = "hex_color")]
    pub accent: String,
    #[serde(deserialize_with = "hex_color")]
    pub background: String,
    #[serde(deserialize_with = "hex_color")]
    pub text: String,
    #[serde(deserialize_with = "hex_color")]
    pub primary_light: String,
    #[serde(deserialize_with = "hex_color")]
    pub primary_dark: String,
    #[serde(deserialize_with = "hex_color")]
    pub secondary_light: String,
}

impl MoodPalette {
    /// "Professional", "Urgent", ...
    pub fn mood_label(&self) -> String {
        let mut chars = self.mood.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => "Neutral".to_string(),
        }
    }

    /// CSS custom properties for the theme, in a fixed order.
    pub fn css_variables(&self) -> String {
        [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("accent", &self.accent),
            ("background", &self.background),
            ("text", &self.text),
            ("primary-light", &self.primary_light),
            ("primary-dark", &self.primary_dark),
            ("secondary-light", &self.secondary_light),
        ]
        .iter()
        .map(|(name, value)| format!("--mood-{}: {};", name, value))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn hex_color<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if is_hex_color(&raw) {
        Ok(raw.to_ascii_lowercase())
    } else {
        Err(D::Error::custom(format!("invalid colour '{}'", raw)))
    }
}

fn clamped_intensity<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f32::deserialize(deserializer)?;
    Ok(if raw.is_finite() {
        raw.clamp(0.0, 100.0)
    } else {
        0.0
    })
}
