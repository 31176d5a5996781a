use std::fmt;
use std::str::FromStr;

use super::locator::{extract_block, locate};
use super::parser::parse_range;
use super::types::{PropertyMap, Section};

/// A header line together with the markers that end its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSpec {
    pub header: &'static str,
    pub terminators: &'static [&'static str],
}

const LMKD_HEADERS: &[HeaderSpec] = &[
    HeaderSpec {
        header: "# LMKD property",
        terminators: &["# Chimera property", "# DHA property"],
    },
    // Some files name the same block after DHA.
    HeaderSpec {
        header: "# DHA property",
        terminators: &["# Chimera property"],
    },
];

const CHIMERA_HEADERS: &[HeaderSpec] = &[HeaderSpec {
    header: "# Chimera property",
    terminators: &["# Nandswap", "#", ""],
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Lmkd,
    Chimera,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Lmkd, Category::Chimera];

    pub fn name(self) -> &'static str {
        match self {
            Category::Lmkd => "LMKD",
            Category::Chimera => "Chimera",
        }
    }

    /// Candidate headers, preferred first.
    pub fn headers(self) -> &'static [HeaderSpec] {
        match self {
            Category::Lmkd => LMKD_HEADERS,
            Category::Chimera => CHIMERA_HEADERS,
        }
    }

    /// Locate this category's section, falling back to synonym headers.
    pub fn locate<S: AsRef<str>>(self, lines: &[S]) -> Option<(HeaderSpec, Section)> {
        self.headers()
            .iter()
            .find_map(|spec| locate(lines, spec.header, spec.terminators).map(|s| (*spec, s)))
    }

    pub fn is_present<S: AsRef<str>>(self, lines: &[S]) -> bool {
        self.locate(lines).is_some()
    }

    /// The category's block, header included; empty when absent.
    pub fn extract_block<S: AsRef<str>>(self, lines: &[S]) -> Vec<String> {
        match self.locate(lines) {
            Some((spec, _)) => extract_block(lines, spec.header, spec.terminators),
            None => Vec::new(),
        }
    }

    /// Parsed properties, `None` when the section is absent.
    pub fn extract<S: AsRef<str>>(self, lines: &[S]) -> Option<PropertyMap> {
        self.locate(lines).map(|(_, section)| parse_range(lines, section))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown property category '{}' (expected LMKD or Chimera)", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lmkd" | "dha" => Ok(Category::Lmkd),
            "chimera" => Ok(Category::Chimera),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Which categories a file carries: `(lmkd, chimera)`.
pub fn properties_present<S: AsRef<str>>(lines: &[S]) -> (bool, bool) {
    (
        Category::Lmkd.is_present(lines),
        Category::Chimera.is_present(lines),
    )
}
