use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// Bijective class index ↔ name table. Fixed for the lifetime of a trained
/// model and persisted with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    /// `{0: negative, 1: neutral, 2: positive}`.
    pub fn sentiment() -> LabelTable {
        LabelTable {
            names: vec!["negative".into(), "neutral".into(), "positive".into()],
        }
    }

    /// Builds a table from names in index order. Names are case-insensitive
    /// and must be unique and non-empty.
    pub fn from_names(names: Vec<String>) -> Result<LabelTable> {
        if names.is_empty() {
            return Err(Error::Input("label table must not be empty".into()));
        }
        let names: Vec<String> = names.into_iter().map(|n| n.trim().to_lowercase()).collect();
        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::Input(format!("label {i} has an empty name")));
            }
            if names[..i].contains(name) {
                return Err(Error::Input(format!("label name '{name}' appears twice")));
            }
        }
        Ok(LabelTable { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.names.iter().position(|n| n.eq_ignore_ascii_case(name))
    }

    /// Accepts either a class name or a class index.
    pub fn parse(&self, raw: &str) -> Result<usize> {
        if let Some(i) = self.index_of(raw) {
            return Ok(i);
        }
        match raw.trim().parse::<usize>() {
            Ok(i) if i < self.len() => Ok(i),
            Ok(i) => Err(Error::Input(format!("label index {i} outside 0..{}", self.len()))),
            Err(_) => Err(Error::Input(format!("unknown label '{}'", raw.trim()))),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        LabelTable::sentiment()
    }
}

impl TryFrom<Vec<String>> for LabelTable {
    type Error = Error;

    fn try_from(names: Vec<String>) -> Result<Self> {
        LabelTable::from_names(names)
    }
}

impl From<LabelTable> for Vec<String> {
    fn from(table: LabelTable) -> Self {
        table.names
    }
}
