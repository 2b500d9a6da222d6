//! Offline selector suggestions for a pasted HTML snippet.
//!
//! Helps a user find the CSS selector to hand to a scrape: the outer block of
//! the snippet, the plausible product images inside it, and the longer text
//! runs that usually hold a description.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::fmt::Write;

const MIN_TEXT_LEN: usize = 30;
const PREVIEW_LEN: usize = 60;
const MAX_TEXT_BLOCKS: usize = 5;

#[derive(Debug, Clone)]
pub struct AdvisorOptions {
    /// Declared `width`/`height` attributes must both reach this.
    pub min_size: u32,
    /// Parent classes (exact names) that mark thumbnails and carousels.
    pub decoy_classes: Vec<String>,
}

impl Default for AdvisorOptions {
    fn default() -> Self {
        Self {
            min_size: 500,
            decoy_classes: vec![
                "thumbnail".to_string(),
                "product-gallery__thumbnail".to_string(),
                "scroll-area".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSuggestion {
    pub selector: String,
    pub src: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSuggestion {
    pub selector: String,
    pub preview: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorAdvice {
    pub main_block: Option<String>,
    pub images: Vec<ImageSuggestion>,
    pub text_blocks: Vec<TextSuggestion>,
}

impl SelectorAdvice {
    pub fn is_empty(&self) -> bool {
        self.main_block.is_none() && self.images.is_empty() && self.text_blocks.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(block) = &self.main_block {
            let _ = writeln!(out, "Main block: {}\n", block);
        }
        if !self.images.is_empty() {
            let _ = writeln!(out, "Images detected ({}):", self.images.len());
            for (i, image) in self.images.iter().enumerate() {
                let _ = writeln!(out, "  {}. {} -> src: {}", i + 1, image.selector, image.src);
            }
            out.push('\n');
        }
        if !self.text_blocks.is_empty() {
            let _ = writeln!(out, "Text / description blocks:");
            for (i, block) in self.text_blocks.iter().enumerate() {
                let _ = writeln!(out, "  {}. {} -> \"{}\"", i + 1, block.selector, block.preview);
            }
        }
        out
    }
}

pub fn advise(html: &str, options: &AdvisorOptions) -> SelectorAdvice {
    if html.trim().is_empty() {
        return SelectorAdvice::default();
    }
    let fragment = Html::parse_fragment(html);
    let root = fragment.root_element();

    let main_block = root
        .descendants()
        .skip(1)
        .find_map(ElementRef::wrap)
        .map(|el| css_path(&el));

    let images = select(&root, "img")
        .into_iter()
        .filter(|img| is_plausible_image(img, options))
        .filter_map(|img| {
            Some(ImageSuggestion {
                selector: css_path(&img),
                src: img.value().attr("src")?.to_string(),
            })
        })
        .collect();

    let text_blocks = select(&root, "p, span, div")
        .into_iter()
        .filter_map(|el| {
            let text = single_string(&el)?;
            let text = text.trim();
            if text.chars().count() <= MIN_TEXT_LEN {
                return None;
            }
            let preview: String = text.chars().take(PREVIEW_LEN).collect();
            Some(TextSuggestion {
                selector: css_path(&el),
                preview: format!("{}...", preview),
            })
        })
        .take(MAX_TEXT_BLOCKS)
        .collect();

    SelectorAdvice {
        main_block,
        images,
        text_blocks,
    }
}

fn select<'a>(root: &ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => root.select(&selector).collect(),
        Err(e) => {
            tracing::warn!("invalid selector {}: {:?}", css, e);
            Vec::new()
        }
    }
}

/// `tag.class1.class2`, classes in document order.
fn css_path(el: &ElementRef<'_>) -> String {
    let mut path = el.value().name().to_string();
    for class in el.value().attr("class").unwrap_or_default().split_whitespace() {
        path.push('.');
        path.push_str(class);
    }
    path
}

fn is_plausible_image(img: &ElementRef<'_>, options: &AdvisorOptions) -> bool {
    let src = img.value().attr("src").unwrap_or_default();
    if src.is_empty() || src.contains("data:") {
        return false;
    }
    if !(src.starts_with("//") || src.starts_with("http")) {
        return false;
    }

    let decoy_parent = img
        .parent()
        .and_then(ElementRef::wrap)
        .is_some_and(|parent| {
            parent
                .value()
                .classes()
                .any(|c| options.decoy_classes.iter().any(|d| d == c))
        });
    if decoy_parent {
        return false;
    }

    let dimension = |name: &str| {
        img.value()
            .attr(name)
            .unwrap_or("0")
            .trim()
            .parse::<u32>()
            .ok()
    };
    match (dimension("width"), dimension("height")) {
        (Some(w), Some(h)) => w >= options.min_size && h >= options.min_size,
        _ => false,
    }
}

/// The text of an element whose content is one text run, possibly nested in
/// single-child wrappers.
fn single_string(el: &ElementRef<'_>) -> Option<String> {
    let mut children = el.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match only.value() {
        Node::Text(text) => Some(String::from(&**text)),
        Node::Element(_) => ElementRef::wrap(only).and_then(|child| single_string(&child)),
        _ => None,
    }
}
