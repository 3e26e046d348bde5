use fastmusic_core::normalize_title;

/// Base name used when normalization leaves nothing usable.
pub const PLACEHOLDER_BASE: &str = "audio";
const DEFAULT_EXTENSION: &str = "mp3";
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "ogg", "opus", "wav", "flac", "webm"];
const MAX_BASE_CHARS: usize = 120;

/// Name to save a downloaded payload under.
///
/// Prefers the `Content-Disposition` hint: its base name is normalized and
/// its extension kept (`.mp3` when missing or not an audio extension).
/// Without a hint the display title is normalized and `.mp3` appended.
/// The base is then made filesystem-safe; an empty base becomes `audio`.
pub fn derive_filename(content_disposition: Option<&str>, display_title: Option<&str>) -> String {
    let hinted = content_disposition.and_then(parse_content_disposition_filename);
    let (base, extension) = match hinted.as_deref() {
        Some(name) => split_extension(strip_directories(name)),
        None => (display_title.unwrap_or_default(), None),
    };

    let mut base = sanitize_base(&normalize_title(base));
    if base.is_empty() {
        base = PLACEHOLDER_BASE.to_string();
    }
    let extension = extension.unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{base}.{extension}")
}

/// Extracts the filename from a raw `Content-Disposition` value.
///
/// Handles `filename="quoted"`, `filename=token` and RFC 5987
/// `filename*=UTF-8''percent%20encoded`; the latter wins when both appear.
/// Semicolons inside quotes do not split parameters.
pub fn parse_content_disposition_filename(header_value: &str) -> Option<String> {
    let mut plain: Option<String> = None;

    for param in split_params(header_value) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        if name == "filename*" {
            let encoded = value
                .split_once("''")
                .filter(|(charset, _)| charset.eq_ignore_ascii_case("utf-8"))
                .map(|(_, rest)| rest);
            if let Some(decoded) = encoded.map(percent_decode) {
                if !decoded.is_empty() {
                    return Some(decoded);
                }
            }
        } else if name == "filename" {
            let unquoted = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
                Some(inner) => unescape_quoted(inner),
                None => value.trim_matches('"').to_string(),
            };
            if !unquoted.is_empty() {
                plain = Some(unquoted);
            }
        }
    }

    plain
}

fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(value[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    params.push(value[start..].trim());
    params
}

fn unescape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn strip_directories(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Splits `name.ext` when `ext` is a known audio extension. Anything else
/// is treated as part of the base name.
fn split_extension(name: &str) -> (&str, Option<String>) {
    if let Some((base, ext)) = name.rsplit_once('.') {
        let ext = ext.to_ascii_lowercase();
        if !base.is_empty() && AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            return (base, Some(ext));
        }
    }
    (name, None)
}

fn sanitize_base(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();

    let mut compacted = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let trimmed = compacted.trim_matches(&['_', ' ', '.'][..]);
    let mut name: String = trimmed.chars().take(MAX_BASE_CHARS).collect();
    name = name.trim_end_matches(&['_', ' ', '.'][..]).to_string();
    if is_reserved_windows_name(&name) {
        name.push('_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}' | '\u{7F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quoted() {
        let r = parse_content_disposition_filename("attachment; filename=\"song.mp3\"");
        assert_eq!(r.as_deref(), Some("song.mp3"));
    }

    #[test]
    fn parse_token() {
        let r = parse_content_disposition_filename("attachment; filename=song.mp3");
        assert_eq!(r.as_deref(), Some("song.mp3"));
    }

    #[test]
    fn parse_quoted_with_semicolon_and_escapes() {
        let r = parse_content_disposition_filename(
            r#"attachment; filename="A; B \"C\".mp3"; size=10"#,
        );
        assert_eq!(r.as_deref(), Some(r#"A; B "C".mp3"#));
    }

    #[test]
    fn parse_filename_star_precedence() {
        let r = parse_content_disposition_filename(
            "attachment; filename=\"fallback.mp3\"; filename*=UTF-8''caf%C3%A9%20song.m4a",
        );
        assert_eq!(r.as_deref(), Some("café song.m4a"));
    }

    #[test]
    fn parse_without_filename() {
        assert_eq!(parse_content_disposition_filename("inline"), None);
        assert_eq!(parse_content_disposition_filename("attachment; filename=\"\""), None);
    }

    #[test]
    fn percent_decode_keeps_malformed_escapes() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("a%zzb"), "a%zzb");
        assert_eq!(percent_decode("a%20b"), "a b");
    }

    #[test]
    fn hint_base_is_normalized_and_extension_kept() {
        assert_eq!(
            derive_filename(
                Some("attachment; filename=\"Artist - Song (Official Video)_1a2b3c4d.m4a\""),
                Some("ignored")
            ),
            "Artist - Song.m4a"
        );
        assert_eq!(
            derive_filename(
                Some("attachment; filename=\"Artist_-_Song_(Official_Audio)_1a2b3c4d.mp3\""),
                None
            ),
            "Artist - Song.mp3"
        );
    }

    #[test]
    fn hint_without_audio_extension_gets_mp3() {
        assert_eq!(
            derive_filename(Some("attachment; filename=\"Mr. Brightside\""), None),
            "Mr. Brightside.mp3"
        );
        assert_eq!(
            derive_filename(Some("attachment; filename=\"clip.EXE\""), None),
            "clip.EXE.mp3"
        );
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(
            derive_filename(Some("attachment; filename=\"Song.MP3\""), None),
            "Song.mp3"
        );
    }

    #[test]
    fn falls_back_to_display_title() {
        assert_eq!(
            derive_filename(None, Some("Official Music Video: Artist - Song")),
            "Artist - Song.mp3"
        );
        assert_eq!(
            derive_filename(Some("attachment"), Some("Artist - Song")),
            "Artist - Song.mp3"
        );
    }

    #[test]
    fn empty_base_becomes_placeholder() {
        assert_eq!(derive_filename(None, Some("   ")), "audio.mp3");
        assert_eq!(derive_filename(None, None), "audio.mp3");
        assert_eq!(
            derive_filename(Some("attachment; filename=\"(Remix).opus\""), None),
            "audio.opus"
        );
    }

    #[test]
    fn illegal_characters_replaced() {
        assert_eq!(
            derive_filename(None, Some("AC/DC - Back In Black?")),
            "AC_DC - Back In Black.mp3"
        );
        assert_eq!(
            derive_filename(Some("attachment; filename=\"../../etc/passwd.mp3\""), None),
            "passwd.mp3"
        );
    }

    #[test]
    fn reserved_and_long_names_patched() {
        assert_eq!(derive_filename(None, Some("con")), "con_.mp3");
        let long = "x".repeat(300);
        let name = derive_filename(None, Some(&long));
        assert_eq!(name.len(), MAX_BASE_CHARS + ".mp3".len());
    }
}
