mod category;
mod lines;
mod locator;
mod parser;
mod synth;
mod table;
mod types;

pub use category::{properties_present, Category, HeaderSpec, UnknownCategory};
pub use lines::{is_comment, is_override_intro, split_eol, OVERRIDES_VAR};
pub use locator::{extract_block, locate};
pub use parser::{parse_range, parse_section};
pub use synth::synthesize;
pub use table::{PropertyTable, TableEdit, TableError};
pub use types::{GroupMember, OverrideGroup, PropertyLine, PropertyMap, Section, SectionBody, Segment};
