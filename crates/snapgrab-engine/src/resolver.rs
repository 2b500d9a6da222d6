//! Picks the best download URL for one image element.
//!
//! Attributes are inspected in a fixed priority order, each step being one
//! [`AttributeStrategy`]. The first step that yields a URL wins; the URL is then
//! checked for unexpanded templates and scheme-normalized.

use crate::session::ElementHandle;
use crate::srcset;
use std::fmt;

/// A resolved download target. The URL is absolute-scheme and template-free.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCandidate {
    pub source_url: String,
    /// 1-based position of the originating element in selection order.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoImageAttribute,
    UnresolvedPlaceholder { url: String },
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoImageAttribute => write!(f, "no image attribute found"),
            SkipReason::UnresolvedPlaceholder { url } => {
                write!(f, "unresolved placeholder: {}", url)
            }
            SkipReason::Unreadable(e) => write!(f, "element unreadable: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(ImageCandidate),
    Skipped(SkipReason),
}

/// One step of the attribute priority chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeStrategy {
    /// A `srcset`-style attribute, always run through the responsive picker.
    /// A value without commas is a single entry: its width descriptor is
    /// stripped, so `x.jpg 800w` yields `x.jpg` rather than the raw string.
    Responsive(&'static str),
    /// A plain URL attribute.
    Direct(&'static str),
}

impl AttributeStrategy {
    pub fn attribute(&self) -> &'static str {
        match self {
            AttributeStrategy::Responsive(name) | AttributeStrategy::Direct(name) => name,
        }
    }

    /// Apply this step to the raw attribute value.
    pub fn extract(&self, raw: &str) -> Option<String> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        match self {
            AttributeStrategy::Responsive(_) => srcset::pick_largest(value),
            AttributeStrategy::Direct(_) => Some(value.to_string()),
        }
    }
}

pub const ATTRIBUTE_PRIORITY: [AttributeStrategy; 6] = [
    AttributeStrategy::Responsive("srcset"),
    AttributeStrategy::Responsive("data-srcset"),
    AttributeStrategy::Responsive("data-lazy"),
    AttributeStrategy::Direct("src"),
    AttributeStrategy::Direct("data-src"),
    AttributeStrategy::Direct("data-photoswipe-src"),
];

/// Run the priority chain over an attribute lookup.
pub fn first_url<F>(mut lookup: F) -> Option<String>
where
    F: FnMut(&str) -> Option<String>,
{
    ATTRIBUTE_PRIORITY.iter().find_map(|strategy| {
        lookup(strategy.attribute()).and_then(|raw| strategy.extract(&raw))
    })
}

/// Reject unexpanded templates and give scheme-relative URLs an explicit scheme.
pub fn normalize(url: &str, placeholder_tokens: &[String]) -> Result<String, SkipReason> {
    let url = url.trim();
    let lowered = url.to_ascii_lowercase();
    if placeholder_tokens
        .iter()
        .any(|token| !token.is_empty() && lowered.contains(&token.to_ascii_lowercase()))
    {
        return Err(SkipReason::UnresolvedPlaceholder {
            url: url.to_string(),
        });
    }
    if url.starts_with("//") {
        return Ok(format!("https:{}", url));
    }
    Ok(url.to_string())
}

/// Resolve one element into a candidate or a skip reason.
pub async fn resolve(
    element: &dyn ElementHandle,
    index: usize,
    placeholder_tokens: &[String],
) -> Resolution {
    let mut found = None;
    for strategy in ATTRIBUTE_PRIORITY.iter() {
        let raw = match element.attribute(strategy.attribute()).await {
            Ok(raw) => raw,
            Err(e) => return Resolution::Skipped(SkipReason::Unreadable(e.to_string())),
        };
        if let Some(url) = raw.and_then(|raw| strategy.extract(&raw)) {
            tracing::debug!(index, attribute = strategy.attribute(), "resolved {}", url);
            found = Some(url);
            break;
        }
    }

    let Some(url) = found else {
        return Resolution::Skipped(SkipReason::NoImageAttribute);
    };

    match normalize(&url, placeholder_tokens) {
        Ok(source_url) => Resolution::Found(ImageCandidate { source_url, index }),
        Err(reason) => Resolution::Skipped(reason),
    }
}
