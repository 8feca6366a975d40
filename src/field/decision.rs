//! Decision Model
//!
//! The structured output of classification. A `Decision` always carries
//! exactly one configuration block and that block always matches its
//! strategy: the pairing lives in the `InputSpec` enum, so a native strategy
//! with a webview block cannot be represented.
//!
//! On the wire the decision keeps the flat shape language models are asked
//! to produce:
//!
//! ```json
//! { "strategy": "native", "label": "Rating", "native": { "control": "slider", "range": [1, 5, 1] } }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The category of input control chosen for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    Keyboard,
    Native,
    Signature,
    #[serde(
        rename = "webview",
        alias = "embedded-content",
        alias = "embeddedContent",
        alias = "embedded_content"
    )]
    EmbeddedContent,
    Map,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Keyboard => "keyboard",
            Strategy::Native => "native",
            Strategy::Signature => "signature",
            Strategy::EmbeddedContent => "webview",
            Strategy::Map => "map",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardType {
    #[default]
    Default,
    #[serde(alias = "emailAddress")]
    Email,
    #[serde(alias = "phonePad", alias = "tel")]
    Phone,
    #[serde(alias = "numberPad")]
    Number,
    #[serde(alias = "decimalPad")]
    Decimal,
    Url,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Autocapitalization {
    None,
    #[default]
    Sentences,
    Words,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardConfig {
    #[serde(rename = "type", default)]
    pub keyboard_type: KeyboardType,
    /// Semantic hint for autofill, e.g. `emailAddress` or `telephoneNumber`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub autocapitalization: Autocapitalization,
}

impl KeyboardConfig {
    pub fn new(keyboard_type: KeyboardType) -> Self {
        Self {
            keyboard_type,
            ..Self::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_autocapitalization(mut self, autocapitalization: Autocapitalization) -> Self {
        self.autocapitalization = autocapitalization;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NativeControl {
    DatePicker,
    ColorPicker,
    Toggle,
    Slider,
    Picker,
    Stepper,
}

impl NativeControl {
    pub fn takes_range(&self) -> bool {
        matches!(self, NativeControl::Slider | NativeControl::Stepper)
    }

    pub fn takes_options(&self) -> bool {
        matches!(self, NativeControl::Picker)
    }
}

/// `[min, max, step]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }
}

impl From<[f64; 3]> for ValueRange {
    fn from([min, max, step]: [f64; 3]) -> Self {
        Self { min, max, step }
    }
}

impl From<ValueRange> for [f64; 3] {
    fn from(range: ValueRange) -> Self {
        [range.min, range.max, range.step]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeConfig {
    pub control: NativeControl,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<ValueRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl NativeConfig {
    pub fn new(control: NativeControl) -> Self {
        Self {
            control,
            options: None,
            range: None,
            unit: None,
        }
    }

    pub fn date_picker() -> Self {
        Self::new(NativeControl::DatePicker)
    }

    pub fn color_picker() -> Self {
        Self::new(NativeControl::ColorPicker)
    }

    pub fn toggle() -> Self {
        Self::new(NativeControl::Toggle)
    }

    pub fn slider(range: ValueRange) -> Self {
        Self {
            range: Some(range),
            ..Self::new(NativeControl::Slider)
        }
    }

    pub fn stepper(range: ValueRange) -> Self {
        Self {
            range: Some(range),
            ..Self::new(NativeControl::Stepper)
        }
    }

    pub fn picker<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: Some(options.into_iter().map(Into::into).collect()),
            ..Self::new(NativeControl::Picker)
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Drops options and ranges the control cannot use.
    pub fn normalized(mut self) -> Self {
        if !self.control.takes_options() {
            self.options = None;
        }
        if !self.control.takes_range() {
            self.range = None;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedContentConfig {
    /// Self-contained interactive widget markup.
    pub html: String,
}

/// `[latitude, longitude, spanLatitude, spanLongitude]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct MapRegion {
    pub latitude: f64,
    pub longitude: f64,
    pub span_latitude: f64,
    pub span_longitude: f64,
}

impl From<[f64; 4]> for MapRegion {
    fn from([latitude, longitude, span_latitude, span_longitude]: [f64; 4]) -> Self {
        Self {
            latitude,
            longitude,
            span_latitude,
            span_longitude,
        }
    }
}

impl From<MapRegion> for [f64; 4] {
    fn from(region: MapRegion) -> Self {
        [
            region.latitude,
            region.longitude,
            region.span_latitude,
            region.span_longitude,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_region: Option<MapRegion>,
    #[serde(default = "default_show_user_location")]
    pub show_user_location: bool,
}

fn default_show_user_location() -> bool {
    true
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_region: None,
            show_user_location: true,
        }
    }
}

/// A strategy together with the only configuration block it may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum InputSpec {
    Keyboard(KeyboardConfig),
    Native(NativeConfig),
    Signature,
    EmbeddedContent(EmbeddedContentConfig),
    Map(MapConfig),
}

impl InputSpec {
    pub fn strategy(&self) -> Strategy {
        match self {
            InputSpec::Keyboard(_) => Strategy::Keyboard,
            InputSpec::Native(_) => Strategy::Native,
            InputSpec::Signature => Strategy::Signature,
            InputSpec::EmbeddedContent(_) => Strategy::EmbeddedContent,
            InputSpec::Map(_) => Strategy::Map,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecision", into = "RawDecision")]
pub struct Decision {
    pub label: Option<String>,
    pub placeholder: Option<String>,
    input: InputSpec,
}

#[derive(Debug, Error, PartialEq)]
pub enum DecisionError {
    #[error("strategy '{0}' requires a '{0}' configuration block")]
    MissingConfig(Strategy),
}

/// Flat wire shape of a decision, every block optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDecision {
    pub strategy: Strategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<KeyboardConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native: Option<NativeConfig>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "embeddedContent",
        alias = "embedded_content"
    )]
    pub webview: Option<EmbeddedContentConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapConfig>,
}

impl TryFrom<RawDecision> for Decision {
    type Error = DecisionError;

    fn try_from(raw: RawDecision) -> Result<Self, Self::Error> {
        // Blocks that do not belong to the declared strategy are dropped here.
        let input = match raw.strategy {
            Strategy::Keyboard => InputSpec::Keyboard(raw.keyboard.unwrap_or_default()),
            Strategy::Native => InputSpec::Native(
                raw.native
                    .ok_or(DecisionError::MissingConfig(Strategy::Native))?
                    .normalized(),
            ),
            Strategy::Signature => InputSpec::Signature,
            Strategy::EmbeddedContent => InputSpec::EmbeddedContent(
                raw.webview
                    .ok_or(DecisionError::MissingConfig(Strategy::EmbeddedContent))?,
            ),
            Strategy::Map => InputSpec::Map(raw.map.unwrap_or_default()),
        };

        Ok(Decision {
            label: raw.label,
            placeholder: raw.placeholder,
            input,
        })
    }
}

impl From<Decision> for RawDecision {
    fn from(decision: Decision) -> Self {
        let mut raw = RawDecision {
            strategy: decision.strategy(),
            label: decision.label,
            placeholder: decision.placeholder,
            keyboard: None,
            native: None,
            webview: None,
            map: None,
        };
        match decision.input {
            InputSpec::Keyboard(config) => raw.keyboard = Some(config),
            InputSpec::Native(config) => raw.native = Some(config),
            InputSpec::Signature => {}
            InputSpec::EmbeddedContent(config) => raw.webview = Some(config),
            InputSpec::Map(config) => raw.map = Some(config),
        }
        raw
    }
}

impl Decision {
    /// Native configs are normalized so the decision survives a round trip.
    pub fn new(input: InputSpec) -> Self {
        let input = match input {
            InputSpec::Native(config) => InputSpec::Native(config.normalized()),
            other => other,
        };
        Self {
            label: None,
            placeholder: None,
            input,
        }
    }

    pub fn keyboard(config: KeyboardConfig) -> Self {
        Self::new(InputSpec::Keyboard(config))
    }

    pub fn native(config: NativeConfig) -> Self {
        Self::new(InputSpec::Native(config))
    }

    pub fn input(&self) -> &InputSpec {
        &self.input
    }

    pub fn signature() -> Self {
        Self::new(InputSpec::Signature)
    }

    pub fn embedded(html: impl Into<String>) -> Self {
        Self::new(InputSpec::EmbeddedContent(EmbeddedContentConfig { html: html.into() }))
    }

    pub fn map(config: MapConfig) -> Self {
        Self::new(InputSpec::Map(config))
    }

    /// The safe default: plain keyboard entry labelled with the raw field name.
    pub fn fallback(field_name: &str) -> Self {
        Self::keyboard(KeyboardConfig::default())
            .with_label(field_name)
            .with_placeholder(format!("Enter {}", field_name))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.input.strategy()
    }

    pub fn keyboard_config(&self) -> Option<&KeyboardConfig> {
        match &self.input {
            InputSpec::Keyboard(config) => Some(config),
            _ => None,
        }
    }

    pub fn native_config(&self) -> Option<&NativeConfig> {
        match &self.input {
            InputSpec::Native(config) => Some(config),
            _ => None,
        }
    }

    pub fn embedded_config(&self) -> Option<&EmbeddedContentConfig> {
        match &self.input {
            InputSpec::EmbeddedContent(config) => Some(config),
            _ => None,
        }
    }

    pub fn map_config(&self) -> Option<&MapConfig> {
        match &self.input {
            InputSpec::Map(config) => Some(config),
            _ => None,
        }
    }
}
