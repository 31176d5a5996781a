use super::lines::{preferred_eol, split_eol, DEFAULT_INDENT};
use super::types::{OverrideGroup, PropertyMap, SectionBody, Segment};

/// Rewrite a section so its properties match `new_mapping` exactly.
///
/// `new_mapping` is the complete desired state: keys missing from it are
/// deleted, existing keys are updated in place and new keys are appended to
/// the first override group, or after the last ordinary property when the
/// section has no group. Header, comments, blank lines, indentation and
/// inline comments are carried over.
pub fn synthesize<S: AsRef<str>>(section_lines: &[S], new_mapping: &PropertyMap) -> Vec<String> {
    if section_lines.is_empty() {
        return Vec::new();
    }

    let body = SectionBody::parse(section_lines);
    let eol = preferred_eol(section_lines);
    let new_keys: Vec<(&str, &str)> = new_mapping
        .iter()
        .filter(|(key, _)| !body.contains_key(key))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();

    let host_group = body
        .segments
        .iter()
        .position(|s| matches!(s, Segment::Group(_)));
    let last_property = body
        .segments
        .iter()
        .rposition(|s| matches!(s, Segment::Property(_)));
    let plain_indent = body
        .segments
        .iter()
        .find_map(|s| match s {
            Segment::Property(p) => Some(p.indent.as_str()),
            _ => None,
        })
        .unwrap_or(DEFAULT_INDENT);

    let plain_new_lines = || -> Vec<String> {
        new_keys
            .iter()
            .map(|(k, v)| format!("{}{}={}{}", plain_indent, k, v, eol))
            .collect()
    };

    let mut out = vec![body.header.clone()];
    if host_group.is_none() && last_property.is_none() {
        out.extend(plain_new_lines());
    }

    for (idx, segment) in body.segments.iter().enumerate() {
        match segment {
            Segment::Verbatim(line) => out.push(line.clone()),
            Segment::Property(p) => {
                if let Some(value) = new_mapping.get(&p.key) {
                    out.push(format!("{}{}={}{}{}", p.indent, p.key, value, p.comment, p.eol));
                } else {
                    tracing::debug!(key = %p.key, "dropping deleted property");
                }
            }
            Segment::Group(group) => {
                let extra: &[(&str, &str)] = if host_group == Some(idx) { new_keys.as_slice() } else { &[] };
                out.extend(render_group(group, new_mapping, extra, eol));
            }
        }

        if host_group.is_none() && last_property == Some(idx) {
            out.extend(plain_new_lines());
        }
    }

    let original_unterminated = section_lines
        .last()
        .map(|l| split_eol(l.as_ref()).1.is_empty())
        .unwrap_or(false);
    normalize_endings(&mut out, eol, original_unterminated);
    out
}

/// Re-emit an override group: survivors in original order, then `extra`.
/// Every line but the last carries the ` \` continuation marker.
fn render_group(
    group: &OverrideGroup,
    new_mapping: &PropertyMap,
    extra: &[(&str, &str)],
    eol: &str,
) -> Vec<String> {
    let indent = group
        .members
        .first()
        .map(|m| m.indent.as_str())
        .unwrap_or(DEFAULT_INDENT);

    let mut items: Vec<(&str, &str, &str)> = group
        .members
        .iter()
        .filter_map(|m| {
            new_mapping.get(&m.key).map(|v| {
                let line_eol = if m.eol.is_empty() { eol } else { m.eol.as_str() };
                (m.key.as_str(), v.as_str(), line_eol)
            })
        })
        .collect();
    items.extend(extra.iter().map(|(k, v)| (*k, *v, eol)));

    let mut out = Vec::with_capacity(items.len() + 1);
    out.push(render_intro(group, !items.is_empty(), eol));

    let last = items.len().saturating_sub(1);
    for (i, (key, value, line_eol)) in items.iter().enumerate() {
        if i < last {
            out.push(format!("{}{}={} \\{}", indent, key, value, line_eol));
        } else {
            out.push(format!("{}{}={}{}", indent, key, value, line_eol));
        }
    }
    out
}

/// The intro line only changes when its continuation marker disagrees with
/// what follows it.
fn render_intro(group: &OverrideGroup, has_members: bool, eol: &str) -> String {
    let (content, intro_eol) = split_eol(&group.intro);
    let intro_eol = if intro_eol.is_empty() { eol } else { intro_eol };
    let trimmed = content.trim_end();
    let continues = trimmed.ends_with('\\');

    if has_members && !continues {
        format!("{} \\{}", trimmed, intro_eol)
    } else if !has_members && continues && !group.members.is_empty() {
        let bare = trimmed.trim_end_matches('\\').trim_end();
        format!("{}{}", bare, intro_eol)
    } else {
        group.intro.clone()
    }
}

/// Terminate every line that is followed by another one; the last line keeps
/// the unterminated state of the original last line.
fn normalize_endings(out: &mut [String], eol: &str, keep_last_unterminated: bool) {
    let count = out.len();
    for (i, line) in out.iter_mut().enumerate() {
        let terminated = !split_eol(line).1.is_empty();
        let is_last = i + 1 == count;
        if is_last && keep_last_unterminated {
            let len = split_eol(line).0.len();
            line.truncate(len);
        } else if !terminated {
            line.push_str(eol);
        }
    }
}
