//! Responsive image descriptor (`srcset`) parsing.

/// One `<url> [<width>w]` entry of a descriptor string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetEntry<'a> {
    pub url: &'a str,
    /// Declared width, `0` when absent or unparseable.
    pub width: u32,
}

/// Parse every entry that carries at least a URL.
pub fn parse(descriptor: &str) -> Vec<SrcsetEntry<'_>> {
    descriptor
        .split(',')
        .filter_map(|entry| {
            let mut tokens = entry.split_whitespace();
            let url = tokens.next()?;
            let width = tokens.next().map(parse_width).unwrap_or(0);
            Some(SrcsetEntry { url, width })
        })
        .collect()
}

fn parse_width(token: &str) -> u32 {
    token
        .strip_suffix('w')
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

/// The URL with the largest width descriptor.
///
/// Ties go to the last entry with that width, so a list where nothing declares
/// a width yields its final URL. `None` when nothing parses.
pub fn pick_largest(descriptor: &str) -> Option<String> {
    let mut best: Option<SrcsetEntry<'_>> = None;
    for entry in parse(descriptor) {
        match &best {
            Some(current) if entry.width < current.width => {}
            _ => best = Some(entry),
        }
    }
    best.map(|entry| entry.url.to_string())
}
