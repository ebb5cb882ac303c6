use serde::{Deserialize, Serialize};

/// Token counting method. `ExactBpe` invokes a bundled BPE tokenizer;
/// the provider-specific estimates and `CharDivide` are closed-form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenCountMethod {
    ExactBpe,
    ProviderAEstimate,
    ProviderBEstimate,
    CharDivide,
}

impl TokenCountMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenCountMethod::ExactBpe => "exact-bpe",
            TokenCountMethod::ProviderAEstimate => "provider-a-estimate",
            TokenCountMethod::ProviderBEstimate => "provider-b-estimate",
            TokenCountMethod::CharDivide => "char-divide",
        }
    }
}

/// How trustworthy a token count is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAccuracy {
    Exact,
    Estimated,
    Approximate,
}

impl TokenCountMethod {
    pub fn accuracy(&self) -> TokenAccuracy {
        match self {
            TokenCountMethod::ExactBpe => TokenAccuracy::Exact,
            TokenCountMethod::ProviderAEstimate | TokenCountMethod::ProviderBEstimate => {
                TokenAccuracy::Estimated
            }
            TokenCountMethod::CharDivide => TokenAccuracy::Approximate,
        }
    }
}

/// Result of counting tokens for a piece of text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenCount {
    pub tokens: usize,
    pub method: TokenCountMethod,
    pub accuracy: TokenAccuracy,
}
