use serde::{Deserialize, Serialize};

use super::token_count::TokenTotals;

/// Response of `/describe`.
///
/// The plain `description` form is the canonical contract. The structured
/// website-analysis fields are accepted alongside it because some service
/// deployments answer with those instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageDescription {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub hero_text: Option<String>,
    #[serde(default)]
    pub website_description: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub website_content: Option<String>,
    #[serde(default)]
    pub color_palette: Option<Vec<String>>,
    #[serde(default)]
    pub font_palette: Option<Vec<String>>,

    #[serde(default)]
    pub input_token_count: Option<u64>,
    #[serde(default)]
    pub output_token_count: Option<u64>,
    #[serde(default)]
    pub total_token_count: Option<u64>,
}

impl ImageDescription {
    /// Whether any of the website-analysis fields are present.
    pub fn is_structured(&self) -> bool {
        self.hero_text.is_some()
            || self.website_description.is_some()
            || self.call_to_action.is_some()
            || self.website_content.is_some()
            || self.color_palette.is_some()
            || self.font_palette.is_some()
    }

    /// Token counts, when the service reported all three.
    pub fn tokens(&self) -> Option<TokenTotals> {
        Some(TokenTotals {
            input_tokens: self.input_token_count?,
            output_tokens: self.output_token_count?,
            total_tokens: self.total_token_count?,
        })
    }
}
