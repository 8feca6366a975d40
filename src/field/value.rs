//! Field Values
//!
//! The unified value a rendered control hands back to the form, whatever
//! the chosen strategy was. Only formatting lives here; capturing and
//! storing the value is the renderer's business.

use base64::Engine as _;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Dates(Vec<NaiveDate>),
    Color(ColorValue),
    Signature(SignatureValue),
    Toggle(bool),
    Selection(String),
}

impl FieldValue {
    /// Renders the value the way it is written back into a text field.
    pub fn string_value(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Number(n) => format!("{:.2}", n),
            FieldValue::Date(date) => date.format("%d/%m/%Y").to_string(),
            FieldValue::Dates(dates) => dates
                .iter()
                .map(|d| d.format("%d/%m").to_string())
                .collect::<Vec<_>>()
                .join(", "),
            FieldValue::Color(color) => color.hex.clone(),
            FieldValue::Signature(signature) => signature.description(),
            FieldValue::Toggle(true) => "[X]".to_string(),
            FieldValue::Toggle(false) => "[ ]".to_string(),
            FieldValue::Selection(choice) => choice.clone(),
        }
    }
}

const NAMED_COLORS: &[(&str, &str)] = &[
    ("#FF3B30", "Red"),
    ("#FF9500", "Orange"),
    ("#FFCC00", "Yellow"),
    ("#34C759", "Green"),
    ("#007AFF", "Blue"),
    ("#AF52DE", "Purple"),
    ("#FF2D55", "Pink"),
    ("#00C7BE", "Mint"),
    ("#32ADE6", "Cyan"),
    ("#5856D6", "Indigo"),
    ("#A2845E", "Brown"),
    ("#8E8E93", "Gray"),
];

/// A picked colour. Equality is by hex code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorValue {
    pub hex: String,
    pub name: String,
}

impl PartialEq for ColorValue {
    fn eq(&self, other: &Self) -> bool {
        self.hex == other.hex
    }
}

impl ColorValue {
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        let hex = format!("#{:02X}{:02X}{:02X}", r, g, b);
        let name = NAMED_COLORS
            .iter()
            .find(|(code, _)| *code == hex)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| hex.clone());
        Self { hex, name }
    }

    /// Parses `#RRGGBB` or `RRGGBB`. Unparseable input reads as black.
    pub fn from_hex(input: &str) -> Self {
        let digits = input.trim().trim_start_matches('#');
        let rgb = u32::from_str_radix(digits, 16).unwrap_or(0);
        Self::from_rgb(
            ((rgb >> 16) & 0xFF) as u8,
            ((rgb >> 8) & 0xFF) as u8,
            (rgb & 0xFF) as u8,
        )
    }
}

/// Raw signature image bytes, kept in memory only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureValue {
    pub image_data: Option<Vec<u8>>,
}

impl SignatureValue {
    pub fn new(image_data: Option<Vec<u8>>) -> Self {
        Self { image_data }
    }

    pub fn is_empty(&self) -> bool {
        self.image_data.as_ref().map_or(true, |d| d.is_empty())
    }

    pub fn description(&self) -> String {
        match &self.image_data {
            Some(data) if !data.is_empty() => format!("[Signature: {} bytes]", data.len()),
            _ => "[No signature]".to_string(),
        }
    }

    pub fn base64(&self) -> Option<String> {
        self.image_data
            .as_ref()
            .map(|data| base64::engine::general_purpose::STANDARD.encode(data))
    }
}
