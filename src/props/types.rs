use indexmap::IndexMap;

/// Ordered key -> value state of one property category.
pub type PropertyMap = IndexMap<String, String>;

/// Half-open `[start, end)` line range; `start` is the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub end: usize,
}

impl Section {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One parsed line of a section body (everything after the header).
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Comment, blank or unparseable line, replayed as-is.
    Verbatim(String),
    /// Ordinary `key=value` line.
    Property(PropertyLine),
    /// `PRODUCT_PROPERTY_OVERRIDES += \` and its continuation members.
    Group(OverrideGroup),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyLine {
    pub indent: String,
    pub key: String,
    pub value: String,
    /// Inline comment including the spacing before `#`, empty when absent.
    pub comment: String,
    pub eol: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverrideGroup {
    pub intro: String,
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub indent: String,
    pub key: String,
    pub value: String,
    pub eol: String,
}

/// Structural view of a section: header plus body segments.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBody {
    pub header: String,
    pub segments: Vec<Segment>,
}
