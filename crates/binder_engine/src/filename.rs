use url::Url;

const MAX_STEM_CHARS: usize = 80;

/// Last non-empty path segment of a series URL.
pub fn series_slug(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// Windows-safe `<slug>.epub`.
pub fn epub_filename(slug: &str) -> String {
    format!("{}.epub", sanitize_stem(slug))
}

fn sanitize_stem(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let trimmed = compacted.trim_matches(&['_', ' ', '.'][..]);
    let mut stem: String = trimmed.chars().take(MAX_STEM_CHARS).collect();
    if stem.is_empty() {
        stem = "series".to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
