use super::lines::{
    is_comment, is_override_intro, leading_indent, split_assignment, split_eol,
    split_inline_comment, strip_continuation,
};
use super::types::{GroupMember, OverrideGroup, PropertyLine, PropertyMap, Section, SectionBody, Segment};

impl SectionBody {
    /// Split section lines (header first) into verbatim lines, ordinary
    /// properties and override groups. Never fails: anything that does not
    /// look like a property is kept verbatim.
    pub fn parse<S: AsRef<str>>(section_lines: &[S]) -> Self {
        let header = section_lines
            .first()
            .map(|l| l.as_ref().to_string())
            .unwrap_or_default();
        let mut segments = Vec::new();
        let mut i = 1usize;

        while i < section_lines.len() {
            let line = section_lines[i].as_ref();

            if is_comment(line) {
                segments.push(Segment::Verbatim(line.to_string()));
                i += 1;
                continue;
            }

            if is_override_intro(line) {
                let mut group = OverrideGroup {
                    intro: line.to_string(),
                    members: Vec::new(),
                };
                i += 1;

                // Members run until one lacks the trailing `\` or a
                // non-property line shows up (which is left for the outer loop).
                while i < section_lines.len() {
                    let (content, eol) = split_eol(section_lines[i].as_ref());
                    if is_comment(content) || is_override_intro(content) {
                        break;
                    }
                    let (body, continues) = strip_continuation(content.trim());
                    let Some((key, value)) = split_assignment(body) else {
                        break;
                    };
                    group.members.push(GroupMember {
                        indent: leading_indent(content).to_string(),
                        key: key.to_string(),
                        value: value.trim().to_string(),
                        eol: eol.to_string(),
                    });
                    i += 1;
                    if !continues {
                        break;
                    }
                }

                segments.push(Segment::Group(group));
                continue;
            }

            let (content, eol) = split_eol(line);
            match split_assignment(content.trim_start()) {
                Some((key, raw)) => {
                    let (value, comment) = split_inline_comment(raw);
                    segments.push(Segment::Property(PropertyLine {
                        indent: leading_indent(content).to_string(),
                        key: key.to_string(),
                        value: value.to_string(),
                        comment,
                        eol: eol.to_string(),
                    }));
                }
                None => segments.push(Segment::Verbatim(line.to_string())),
            }
            i += 1;
        }

        Self { header, segments }
    }

    /// Key/value pairs in file order, duplicates included.
    pub fn entries(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Verbatim(_) => {}
                Segment::Property(p) => out.push((p.key.as_str(), p.value.as_str())),
                Segment::Group(g) => {
                    out.extend(g.members.iter().map(|m| (m.key.as_str(), m.value.as_str())))
                }
            }
        }
        out
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries().iter().any(|(k, _)| *k == key)
    }

    /// Collapse into a mapping; a later duplicate overwrites an earlier one.
    pub fn to_map(&self) -> PropertyMap {
        let mut map = PropertyMap::new();
        for (key, value) in self.entries() {
            map.insert(key.to_string(), value.to_string());
        }
        map
    }
}

/// Parse the key/value content of a section (header line first).
pub fn parse_section<S: AsRef<str>>(section_lines: &[S]) -> PropertyMap {
    SectionBody::parse(section_lines).to_map()
}

/// Parse the section located at `section` inside a whole Line Sequence.
pub fn parse_range<S: AsRef<str>>(lines: &[S], section: Section) -> PropertyMap {
    parse_section(&lines[section.start..section.end])
}
