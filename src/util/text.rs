use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended to truncated card titles and flavor text.
const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Display width of a string in terminal columns.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncates a string to fit within `max_width` terminal columns.
///
/// Appends "..." when text is cut. For widths of three columns or less there
/// is no room for an ellipsis, so as many characters as fit are returned.
/// Strings that already fit are returned borrowed.
///
/// ```
/// use dexterm::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("bulbasaur", 20), "bulbasaur");
/// assert_eq!(truncate_to_width("fletchinder", 8), "fletc...");
/// assert_eq!(truncate_to_width("mew", 0), "");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut used = 0;
    let mut cut = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        cut = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..cut].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    }
}

/// Strip terminal control characters and ANSI escape sequences.
///
/// Catalog text (flavor text, genus, names) comes from a remote API and is
/// rendered straight into the terminal, so escape sequences must not reach
/// the backend. Tabs, newlines and carriage returns are kept; CSI and OSC
/// sequences are removed whole.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    fn is_control(b: u8) -> bool {
        b == 0x1b || b == 0x7f || (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
    }

    let bytes = s.as_bytes();
    if !bytes.iter().any(|&b| is_control(b)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == 0x1b {
            match bytes.get(i + 1) {
                Some(b'[') => {
                    i += 2;
                    while i < bytes.len() {
                        let c = bytes[i];
                        i += 1;
                        if (0x40..=0x7e).contains(&c) {
                            break;
                        }
                    }
                }
                Some(b']') => {
                    i += 2;
                    while i < bytes.len() {
                        if bytes[i] == 0x07 {
                            i += 1;
                            break;
                        }
                        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        } else if is_control(b) {
            i += 1;
        } else {
            let start = i;
            while i < bytes.len() && !is_control(bytes[i]) {
                i += 1;
            }
            // Only ASCII control bytes end a run, so the slice stays on char boundaries.
            out.push_str(&s[start..i]);
        }
    }

    Cow::Owned(out)
}

/// Format a numeric catalog identifier as `#0025`.
pub fn format_id(id: u32) -> String {
    format!("#{:04}", id)
}

/// Uppercase the first character of a name.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Turn an API slug like `solar-beam` into `solar beam`.
pub fn humanize(slug: &str) -> String {
    slug.replace('-', " ")
}
