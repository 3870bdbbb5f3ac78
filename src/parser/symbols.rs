//! Case-insensitive symbol table shared by keywords and marker names

use std::collections::HashMap;
use std::fmt;

/// Small integer id assigned to a keyword or marker name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameId(pub u32);

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maps names to ids. The first spelling placed is kept for display;
/// lookups ignore letter case.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    ids: HashMap<String, NameId>,
    names: Vec<String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, registering it if it is new
    pub fn place_name(&mut self, name: &str) -> NameId {
        let key = name.to_lowercase();
        if let Some(id) = self.ids.get(&key) {
            return *id;
        }
        let id = NameId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(key, id);
        id
    }

    pub fn seek_name(&self, name: &str) -> Option<NameId> {
        self.ids.get(&name.to_lowercase()).copied()
    }

    pub fn name(&self, id: NameId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
