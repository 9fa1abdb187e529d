//! Splitting long replies to fit Telegram's message size limit.

/// Telegram's maximum length for a text message, in UTF-16 code units.
pub const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

const CONTINUED_PREFIX: &str = "(continued)\n\n";
const CONTINUES_SUFFIX: &str = "\n\n(continues...)";

/// Split `text` into messages no longer than [`TELEGRAM_MAX_MESSAGE_LENGTH`].
///
/// Lengths are measured the way Telegram measures them, in UTF-16 code units,
/// so characters outside the Basic Multilingual Plane count twice.
///
/// Text that fits is returned unchanged as a single message. Otherwise the
/// text is cut at the last newline in the back half of each window, else the
/// last space, else hard at the window edge, and continuation markers are
/// added.
pub fn split_message(text: &str) -> Vec<String> {
    split_message_with_limit(text, TELEGRAM_MAX_MESSAGE_LENGTH)
}

/// [`split_message`] with an explicit limit.
pub fn split_message_with_limit(text: &str, limit: usize) -> Vec<String> {
    if utf16_len(text) <= limit {
        return vec![text.to_string()];
    }

    let reserve = utf16_len(CONTINUED_PREFIX) + utf16_len(CONTINUES_SUFFIX);
    let window = limit.saturating_sub(reserve);
    if window == 0 {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        let edge = byte_offset_at_units(remaining, window);
        if edge == remaining.len() {
            pieces.push(remaining);
            break;
        }
        let cut = split_point(&remaining[..edge], window);
        pieces.push(&remaining[..cut]);
        remaining = &remaining[cut..];
    }

    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, piece)| decorate(piece, index, total))
        .collect()
}

fn decorate(piece: &str, index: usize, total: usize) -> String {
    match (index == 0, index + 1 == total) {
        (true, true) => piece.to_string(),
        (true, false) => format!("{piece}{CONTINUES_SUFFIX}"),
        (false, true) => format!("{CONTINUED_PREFIX}{piece}"),
        (false, false) => format!("{CONTINUED_PREFIX}{piece}{CONTINUES_SUFFIX}"),
    }
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Byte offset of the longest prefix of `text` that fits in `units` UTF-16
/// code units. Always covers at least one character of non-empty text.
fn byte_offset_at_units(text: &str, units: usize) -> usize {
    let mut used = 0;
    for (idx, ch) in text.char_indices() {
        used += ch.len_utf16();
        if used > units {
            return if idx == 0 { ch.len_utf8() } else { idx };
        }
    }
    text.len()
}

fn split_point(window_text: &str, window_units: usize) -> usize {
    if let Some(pos) = window_text.rfind('\n') {
        if utf16_len(&window_text[..pos]) >= window_units / 2 {
            return pos + 1;
        }
    }
    match window_text.rfind(' ') {
        Some(pos) if pos > 0 => pos + 1,
        _ => window_text.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_message_unchanged() {
        assert_eq!(split_message("hello"), vec!["hello".to_string()]);
        let exact = "a".repeat(TELEGRAM_MAX_MESSAGE_LENGTH);
        assert_eq!(split_message(&exact), vec![exact.clone()]);
    }

    #[test]
    fn test_long_message_respects_limit() {
        let text = "word ".repeat(3000);
        let chunks = split_message(&text);

        assert!(chunks.len() >= 4);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= TELEGRAM_MAX_MESSAGE_LENGTH);
        }
        assert!(chunks[0].ends_with("(continues...)"));
        assert!(chunks.last().unwrap().starts_with("(continued)"));
    }

    #[test]
    fn test_prefers_newline_boundary() {
        let first = "x".repeat(70);
        let second = "y".repeat(70);
        let text = format!("{first}\n{second}");
        let chunks = split_message_with_limit(&text, 100);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], format!("{first}\n{CONTINUES_SUFFIX}"));
        assert_eq!(chunks[1], format!("{CONTINUED_PREFIX}{second}"));
    }

    #[test]
    fn test_hard_split_without_whitespace() {
        let text = "z".repeat(250);
        let chunks = split_message_with_limit(&text, 100);

        let rejoined: String = chunks
            .iter()
            .map(|c| {
                c.trim_start_matches(CONTINUED_PREFIX)
                    .trim_end_matches(CONTINUES_SUFFIX)
                    .to_string()
            })
            .collect();
        assert_eq!(rejoined, text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
        }
    }

    #[test]
    fn test_multibyte_text_splits_on_char_boundaries() {
        let text = "é".repeat(5000);
        let chunks = split_message(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= TELEGRAM_MAX_MESSAGE_LENGTH);
        }
    }

    #[test]
    fn test_astral_characters_count_as_two_units() {
        // 3000 chars, 6000 UTF-16 units.
        let text = "\u{1F600}".repeat(3000);
        let chunks = split_message(&text);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.encode_utf16().count() <= TELEGRAM_MAX_MESSAGE_LENGTH);
        }
        let emoji: usize = chunks
            .iter()
            .map(|c| c.chars().filter(|ch| *ch == '\u{1F600}').count())
            .sum();
        assert_eq!(emoji, 3000);
    }
}
