//! Rule-Based Classifier
//!
//! Offline keyword matching over the lower-cased field name. Rules are tried
//! in a fixed priority order and the first hit wins, so "Sign date" is a
//! signature field and never a date field. Keyword lists cover English and
//! Italian form labels.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Classifier, ClassifierResult};
use crate::field::{
    Autocapitalization, Decision, FieldDescriptor, KeyboardConfig, KeyboardType, MapConfig,
    NativeConfig, ValueRange,
};

const SIGNATURE_KEYWORDS: &[&str] = &["firma", "signature", "sign"];
const DATE_KEYWORDS: &[&str] = &["data", "date", "nascita", "birth"];
const COLOR_KEYWORDS: &[&str] = &["colore", "color", "aura"];
const EMBEDDED_KEYWORDS: &[&str] = &["web", "html", "custom"];
const GEO_KEYWORDS: &[&str] = &["map", "location", "indirizzo"];
const SELECTION_KEYWORDS: &[&str] = &[
    "select", "country", "paese", "city", "città", "choose", "region", "province", "stato",
];
const RATING_KEYWORDS: &[&str] = &["rating", "valut", "stars", "stelle", "score", "level"];
const CONSENT_KEYWORDS: &[&str] = &["[ ]", "[x]", "accept", "agree", "consent", "terms"];
const EMAIL_KEYWORDS: &[&str] = &["email", "e-mail", "mail"];
const PHONE_KEYWORDS: &[&str] = &["phone", "telefono", "cell", "mobile"];
const NUMBER_KEYWORDS: &[&str] = &["number", "quantity", "amount", "età", "age", "numero"];
const PASSWORD_KEYWORDS: &[&str] = &["password", "pwd", "secret"];
const NAME_KEYWORDS: &[&str] = &["name", "nome", "cognome", "surname"];

const COUNTRY_OPTIONS: &[&str] = &["Italy", "USA", "UK", "France", "Germany", "Spain"];
const CITY_OPTIONS: &[&str] = &["Milan", "Rome", "Turin", "Naples", "Florence"];
const GENERIC_OPTIONS: &[&str] = &["Option 1", "Option 2", "Option 3"];

/// Where geographic keywords ("map", "location", "indirizzo") are routed.
///
/// The keyword table has always sent them to an embedded widget, while the
/// generative prompt makes the map strategy mandatory for the same fields.
/// Both behaviours are kept; pick one per deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoPolicy {
    #[default]
    EmbeddedContent,
    Map,
}

fn contains_any(name: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| name.contains(k))
}

/// Strips one trailing colon and surrounding whitespace.
pub fn clean_label(label: &str) -> String {
    let label = label.trim();
    label.strip_suffix(':').unwrap_or(label).trim().to_string()
}

/// Deterministic keyword classifier. Never fails and never waits.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedClassifier {
    geo_policy: GeoPolicy,
}

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_geo_policy(mut self, geo_policy: GeoPolicy) -> Self {
        self.geo_policy = geo_policy;
        self
    }

    pub fn geo_policy(&self) -> GeoPolicy {
        self.geo_policy
    }

    /// Synchronous entry point; `classify` is a thin async wrapper around it.
    pub fn decide(&self, descriptor: &FieldDescriptor) -> Decision {
        let name = descriptor.name.to_lowercase();
        debug!(target: "contextual::brain", "[Rules] Analyzing field: '{}' (original: '{}')", name, descriptor.name);

        let decision = self.match_rules(&name, &descriptor.name);

        info!(
            target: "contextual::brain",
            "[Rules] Decision: {} | Label: {}",
            decision.strategy(),
            decision.label.as_deref().unwrap_or("nil")
        );
        decision
    }

    fn match_rules(&self, name: &str, raw_name: &str) -> Decision {
        let label = clean_label(raw_name);

        if contains_any(name, SIGNATURE_KEYWORDS) {
            return Decision::signature()
                .with_label("Signature")
                .with_placeholder("Draw here");
        }

        if contains_any(name, DATE_KEYWORDS) {
            return Decision::native(NativeConfig::date_picker())
                .with_label(label)
                .with_placeholder("Select date");
        }

        if contains_any(name, COLOR_KEYWORDS) {
            return Decision::native(NativeConfig::color_picker())
                .with_label(label)
                .with_placeholder("Pick color");
        }

        let geographic = contains_any(name, GEO_KEYWORDS);
        if geographic && self.geo_policy == GeoPolicy::Map {
            return Decision::map(MapConfig::default()).with_label(label);
        }
        if geographic || contains_any(name, EMBEDDED_KEYWORDS) {
            return Decision::embedded(placeholder_widget(name)).with_label(label);
        }

        if contains_any(name, SELECTION_KEYWORDS) {
            return Decision::embedded(select_widget(infer_options(name)))
                .with_label(label)
                .with_placeholder("Select option");
        }

        if contains_any(name, RATING_KEYWORDS) {
            return Decision::native(NativeConfig::slider(infer_range(name))).with_label(label);
        }

        if contains_any(name, CONSENT_KEYWORDS) {
            return Decision::native(NativeConfig::toggle()).with_label(label);
        }

        if contains_any(name, EMAIL_KEYWORDS) {
            return Decision::keyboard(
                KeyboardConfig::new(KeyboardType::Email)
                    .with_content_type("emailAddress")
                    .with_autocapitalization(Autocapitalization::None),
            )
            .with_label(label)
            .with_placeholder("email@example.com");
        }

        if contains_any(name, PHONE_KEYWORDS) {
            return Decision::keyboard(
                KeyboardConfig::new(KeyboardType::Phone)
                    .with_content_type("telephoneNumber")
                    .with_autocapitalization(Autocapitalization::None),
            )
            .with_label(label)
            .with_placeholder("+1...");
        }

        if contains_any(name, NUMBER_KEYWORDS) {
            return Decision::keyboard(
                KeyboardConfig::new(KeyboardType::Number)
                    .with_autocapitalization(Autocapitalization::None),
            )
            .with_label(label)
            .with_placeholder("0");
        }

        if contains_any(name, PASSWORD_KEYWORDS) {
            return Decision::keyboard(
                KeyboardConfig::new(KeyboardType::Default)
                    .with_content_type("password")
                    .with_autocapitalization(Autocapitalization::None),
            )
            .with_label(label)
            .with_placeholder("••••••••");
        }

        if contains_any(name, NAME_KEYWORDS) {
            return Decision::keyboard(
                KeyboardConfig::new(KeyboardType::Default)
                    .with_content_type("name")
                    .with_autocapitalization(Autocapitalization::Words),
            )
            .with_label(label)
            .with_placeholder("John Doe");
        }

        Decision::keyboard(
            KeyboardConfig::new(KeyboardType::Default)
                .with_autocapitalization(Autocapitalization::Sentences),
        )
        .with_label(label)
        .with_placeholder("Enter value")
    }
}

#[async_trait]
impl Classifier for RuleBasedClassifier {
    fn name(&self) -> &str {
        "RuleBased"
    }

    async fn classify(&self, descriptor: &FieldDescriptor) -> ClassifierResult<Decision> {
        Ok(self.decide(descriptor))
    }
}

fn infer_options(name: &str) -> &'static [&'static str] {
    if contains_any(name, &["country", "paese"]) {
        COUNTRY_OPTIONS
    } else if contains_any(name, &["city", "città"]) {
        CITY_OPTIONS
    } else {
        GENERIC_OPTIONS
    }
}

fn infer_range(name: &str) -> ValueRange {
    if contains_any(name, &["star", "stell"]) {
        ValueRange::new(1.0, 5.0, 1.0)
    } else {
        ValueRange::new(0.0, 100.0, 1.0)
    }
}

fn placeholder_widget(name: &str) -> String {
    format!(
        r#"<div style="padding: 20px; text-align: center; color: white; font-family: -apple-system;">
    <h3>🌍 WebView</h3>
    <p>Showing custom HTML for <b>{}</b></p>
    <button onclick="sendValue('Confirmed')" style="padding: 10px 20px; font-size: 16px; border-radius: 8px;">Confirm</button>
</div>"#,
        html_escape::encode_text(name)
    )
}

fn select_widget(options: &[&str]) -> String {
    let options_html: String = options
        .iter()
        .map(|option| {
            format!(
                "<option value=\"{}\">{}</option>",
                html_escape::encode_double_quoted_attribute(option),
                html_escape::encode_text(option)
            )
        })
        .collect();

    format!(
        r#"<div style="font-family: -apple-system, sans-serif; padding: 10px; color: white;">
    <label style="font-size: 14px; color: #888;">Select Option</label>
    <select onchange="sendValue(this.value)" style="width: 100%; font-size: 18px; padding: 12px; margin-top: 8px; background: #1c1c1e; color: white; border: 1px solid #333; border-radius: 8px; -webkit-appearance: none;">
        <option value="">Choose...</option>
        {}
    </select>
</div>"#,
        options_html
    )
}
