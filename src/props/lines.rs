//! Line-level helpers shared by the parser and the synthesizer.

/// Marker that opens a `PRODUCT_PROPERTY_OVERRIDES += \` continuation list.
pub const OVERRIDES_VAR: &str = "PRODUCT_PROPERTY_OVERRIDES";

/// Indentation used when a section has no line to borrow it from.
pub const DEFAULT_INDENT: &str = "    ";

/// Blank lines and `#` comment lines carry no property.
pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// True for the line introducing an override group.
pub fn is_override_intro(line: &str) -> bool {
    line.contains(OVERRIDES_VAR) && line.contains("+=")
}

/// Split a line into its content and its line ending (`\n`, `\r\n` or empty).
pub fn split_eol(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else {
        (line, "")
    }
}

pub fn leading_indent(content: &str) -> &str {
    &content[..content.len() - content.trim_start().len()]
}

/// Strip one trailing `\` continuation marker. Returns the remaining text and
/// whether the marker was present.
pub fn strip_continuation(trimmed: &str) -> (&str, bool) {
    match trimmed.strip_suffix('\\') {
        Some(rest) => (rest.trim_end(), true),
        None => (trimmed, false),
    }
}

/// Split `key=value` once on the first `=`. Keys must be non-empty.
pub fn split_assignment(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Separate an inline `# comment` from a raw value.
///
/// The value comes back trimmed. The comment keeps the spacing that preceded
/// the `#` so a rewritten line lines up the way the original did.
pub fn split_inline_comment(raw: &str) -> (&str, String) {
    match raw.find('#') {
        Some(pos) => {
            let value_part = &raw[..pos];
            let value = value_part.trim();
            let spacing = &value_part[value_part.trim_end().len()..];
            let comment = format!("{}{}", spacing, raw[pos..].trim_end());
            (value, comment)
        }
        None => (raw.trim(), String::new()),
    }
}

/// Line ending to use for freshly generated lines.
pub fn preferred_eol<S: AsRef<str>>(lines: &[S]) -> &'static str {
    for line in lines {
        let (_, eol) = split_eol(line.as_ref());
        match eol {
            "\r\n" => return "\r\n",
            "\n" => return "\n",
            _ => {}
        }
    }
    "\n"
}
