use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::category::{Category, UnknownCategory};
use super::types::PropertyMap;

const MISSING: &str = "<missing>";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("Property name cannot be empty.")]
    EmptyKey,
    #[error("Property name '{0}' cannot contain '=' or whitespace.")]
    InvalidKey(String),
    #[error("Value of '{key}' cannot contain '#', '\\' or line breaks, nor start or end with whitespace: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("Property '{key}' not found in {category}.")]
    NotFound { category: Category, key: String },
    #[error("Malformed property edit '{0}'")]
    MalformedEdit(String),
    #[error(transparent)]
    Category(#[from] UnknownCategory),
}

/// One edit of a table, written `CATEGORY:key=value` to set,
/// `CATEGORY:key` to remove and `CATEGORY:old=new` to rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEdit {
    Set {
        category: Category,
        key: String,
        value: String,
    },
    Unset { category: Category, key: String },
    Rename {
        category: Category,
        from: String,
        to: String,
    },
}

impl TableEdit {
    pub fn parse_set(text: &str) -> Result<Self, TableError> {
        let (category, rest) = split_category(text)?;
        let (key, value) = rest
            .split_once('=')
            .ok_or_else(|| TableError::MalformedEdit(text.to_string()))?;
        Ok(TableEdit::Set {
            category,
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        })
    }

    pub fn parse_unset(text: &str) -> Result<Self, TableError> {
        let (category, key) = split_category(text)?;
        Ok(TableEdit::Unset {
            category,
            key: key.trim().to_string(),
        })
    }

    /// `CATEGORY:old=new`
    pub fn parse_rename(text: &str) -> Result<Self, TableError> {
        let (category, rest) = split_category(text)?;
        let (from, to) = rest
            .split_once('=')
            .ok_or_else(|| TableError::MalformedEdit(text.to_string()))?;
        Ok(TableEdit::Rename {
            category,
            from: from.trim().to_string(),
            to: to.trim().to_string(),
        })
    }
}

/// A key the parser would read back unchanged.
fn check_key(key: &str) -> Result<(), TableError> {
    if key.is_empty() {
        return Err(TableError::EmptyKey);
    }
    if key.contains('=') || key.contains(char::is_whitespace) {
        return Err(TableError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// A value that reads back unchanged after a write and re-parse.
fn check_value(key: &str, value: &str) -> Result<(), TableError> {
    let bad = value.contains(['#', '\\', '\r', '\n']) || value.trim() != value;
    if bad {
        return Err(TableError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn split_category(text: &str) -> Result<(Category, &str), TableError> {
    let (category, rest) = text
        .split_once(':')
        .ok_or_else(|| TableError::MalformedEdit(text.to_string()))?;
    Ok((Category::from_str(category)?, rest))
}

/// Editable LMKD/Chimera property table, the state a user tunes between
/// loading target files and writing them back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTable {
    #[serde(rename = "LMKD", default)]
    pub lmkd: PropertyMap,
    #[serde(rename = "Chimera", default)]
    pub chimera: PropertyMap,
}

impl PropertyTable {
    /// Read both categories out of a Line Sequence. `None` when neither
    /// category yields a single property.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Option<Self> {
        let table = Self {
            lmkd: Category::Lmkd.extract(lines).unwrap_or_default(),
            chimera: Category::Chimera.extract(lines).unwrap_or_default(),
        };
        if table.is_empty() {
            None
        } else {
            Some(table)
        }
    }

    pub fn category(&self, category: Category) -> &PropertyMap {
        match category {
            Category::Lmkd => &self.lmkd,
            Category::Chimera => &self.chimera,
        }
    }

    pub fn category_mut(&mut self, category: Category) -> &mut PropertyMap {
        match category {
            Category::Lmkd => &mut self.lmkd,
            Category::Chimera => &mut self.chimera,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lmkd.is_empty() && self.chimera.is_empty()
    }

    /// Add a property or change its value. Existing keys keep their position.
    pub fn set(&mut self, category: Category, key: &str, value: &str) -> Result<(), TableError> {
        let (key, value) = (key.trim(), value.trim());
        check_key(key)?;
        check_value(key, value)?;
        self.category_mut(category)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Give a property a new name, keeping its value and position. A
    /// property already named `new_key` is replaced.
    pub fn rename(&mut self, category: Category, old_key: &str, new_key: &str) -> Result<(), TableError> {
        let new_key = new_key.trim();
        check_key(new_key)?;
        let map = self.category_mut(category);
        let Some((index, _, value)) = map.shift_remove_full(old_key) else {
            return Err(TableError::NotFound {
                category,
                key: old_key.to_string(),
            });
        };
        let mut index = index;
        if let Some((pos, _, _)) = map.shift_remove_full(new_key) {
            if pos < index {
                index -= 1;
            }
        }
        map.shift_insert(index.min(map.len()), new_key.to_string(), value);
        Ok(())
    }

    /// Check every key and value against the rules `set` enforces. Tables
    /// that arrive through deserialization never went through `set`.
    pub fn validate(&self) -> Result<(), TableError> {
        for category in Category::ALL {
            for (key, value) in self.category(category) {
                check_key(key)?;
                check_value(key, value)?;
            }
        }
        Ok(())
    }

    /// Delete a property, keeping the order of the remaining ones.
    pub fn remove(&mut self, category: Category, key: &str) -> Result<String, TableError> {
        self.category_mut(category)
            .shift_remove(key)
            .ok_or_else(|| TableError::NotFound {
                category,
                key: key.to_string(),
            })
    }

    pub fn apply(&mut self, edit: &TableEdit) -> Result<(), TableError> {
        match edit {
            TableEdit::Set {
                category,
                key,
                value,
            } => self.set(*category, key, value),
            TableEdit::Unset { category, key } => self.remove(*category, key).map(|_| ()),
            TableEdit::Rename { category, from, to } => self.rename(*category, from, to),
        }
    }

    /// Human-readable differences between two tables, one line per key whose
    /// value differs (`<missing>` when a side lacks it), sorted by key.
    pub fn differences(&self, other: &PropertyTable, left: &str, right: &str) -> Vec<String> {
        let mut out = Vec::new();
        for category in Category::ALL {
            let a = self.category(category);
            let b = other.category(category);
            let keys: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
            for key in keys {
                let va = a.get(key).map(String::as_str).unwrap_or(MISSING);
                let vb = b.get(key).map(String::as_str).unwrap_or(MISSING);
                if va != vb {
                    out.push(format!(
                        "{}.{}: {}='{}' vs {}='{}'",
                        category, key, left, va, right, vb
                    ));
                }
            }
        }
        out
    }
}
