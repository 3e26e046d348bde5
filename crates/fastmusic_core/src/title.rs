use std::sync::LazyLock;

use regex::Regex;

/// Noise phrases stripped from the start and end of titles.
///
/// Order matters: within each pass the first phrase that matches wins, so
/// e.g. "official music video" must be tried before "music video".
pub const BOILERPLATE_PHRASES: [&str; 20] = [
    "official music video",
    "official video",
    "music video",
    "official audio",
    "official lyric video",
    "lyric video",
    "lyrics video",
    "official",
    "hd",
    "hq",
    "4k",
    "live",
    "live performance",
    "acoustic version",
    "acoustic",
    "remix",
    "extended version",
    "radio edit",
    "clean version",
    "explicit version",
];

/// `_` plus the first eight characters of a UUID, appended by the backend.
static ID_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_[a-fA-F0-9-]{8}$").expect("valid id suffix regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

static DANGLING_BRACKET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[(\[{][)\]}]*\s*$").expect("valid dangling bracket regex")
});

struct PhrasePatterns {
    prefix: Regex,
    suffix: Regex,
}

static PHRASE_PATTERNS: LazyLock<Vec<PhrasePatterns>> = LazyLock::new(|| {
    let separator = format!(r"(?:{}|{}|:|-|\s)", ascii_caseless("for"), ascii_caseless("of"));
    BOILERPLATE_PHRASES
        .iter()
        .map(|phrase| {
            let phrase = ascii_caseless(phrase);
            PhrasePatterns {
                prefix: Regex::new(&format!(r"^\s*\(?{phrase}\)?\s*{separator}+"))
                    .expect("valid prefix regex"),
                suffix: Regex::new(&format!(r"\s*\(?{phrase}\)?\s*$"))
                    .expect("valid suffix regex"),
            }
        })
        .collect()
});

/// Pattern matching `literal` with ASCII-only case folding. `(?i)` would
/// also fold e.g. U+212A KELVIN SIGN into `k`.
fn ascii_caseless(literal: &str) -> String {
    literal
        .chars()
        .map(|c| {
            if c.is_ascii_alphabetic() {
                format!("[{}{}]", c.to_ascii_lowercase(), c.to_ascii_uppercase())
            } else {
                regex::escape(c.encode_utf8(&mut [0; 4]))
            }
        })
        .collect()
}

/// Cleans a raw video title into a human-friendly name.
///
/// Steps, each applied to the previous output:
/// 1. strip a trailing `_xxxxxxxx` identifier suffix (hex digits or `-`),
/// 2. turn underscores into spaces and collapse whitespace,
/// 3. drop boilerplate phrases at the start (followed by a separator),
///    then at the end, walking [`BOILERPLATE_PHRASES`] in order each time,
/// 4. drop an empty or unclosed bracket left at the end,
/// 5. collapse whitespace again and trim.
///
/// The pass is repeated until the output stops changing, so a cleaned title
/// always normalizes to itself. Every pass after the first only removes
/// text, which bounds the loop.
///
/// Empty input is returned unchanged. A title made only of boilerplate can
/// come back empty; callers that need a filename must substitute one.
///
/// ```
/// use fastmusic_core::normalize_title;
///
/// assert_eq!(normalize_title("Artist_-_Song_(Official_Audio)"), "Artist - Song");
/// ```
pub fn normalize_title(raw: &str) -> String {
    if raw.is_empty() {
        return raw.to_string();
    }

    let mut current = normalize_pass(raw);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(raw: &str) -> String {
    let cleaned = ID_SUFFIX.replace(raw, "");
    let cleaned = cleaned.replace('_', " ");
    let mut cleaned = WHITESPACE.replace_all(&cleaned, " ").into_owned();

    for patterns in PHRASE_PATTERNS.iter() {
        cleaned = patterns.prefix.replace(&cleaned, "").into_owned();
    }
    for patterns in PHRASE_PATTERNS.iter() {
        cleaned = patterns.suffix.replace(&cleaned, "").into_owned();
    }

    let cleaned = DANGLING_BRACKET.replace(&cleaned, "");
    let cleaned = WHITESPACE.replace_all(&cleaned, " ");
    cleaned.trim().to_string()
}
