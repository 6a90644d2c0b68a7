use zenith_core::collections::hashmap::HashMap;

/// Interned resource name, unique within one render graph frame.
///
/// ## Safety
/// Used in the same render graph context. Should NOT be used across multiple render graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceName(u32);

impl ResourceName {
    pub const INVALID: ResourceName = ResourceName(u32::MAX);

    #[inline]
    pub fn valid(&self) -> bool {
        self.0 != u32::MAX
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Default)]
pub struct SymbolTable {
    ids: HashMap<String, ResourceName>,
    names: Vec<String>,
}

impl SymbolTable {
    pub fn intern(&mut self, name: &str) -> ResourceName {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }

        let id = ResourceName(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<ResourceName> {
        self.ids.get(name).copied()
    }

    #[inline]
    pub fn name_of(&self, id: ResourceName) -> &str {
        self.names.get(id.index()).expect("Resource name out of bound!")
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.names.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_stable() {
        let mut symbols = SymbolTable::default();
        let albedo = symbols.intern("albedo");
        let depth = symbols.intern("depth");

        assert_ne!(albedo, depth);
        assert_eq!(symbols.intern("albedo"), albedo);
        assert_eq!(symbols.lookup("depth"), Some(depth));
        assert_eq!(symbols.lookup("normal"), None);
        assert_eq!(symbols.name_of(depth), "depth");
        assert_eq!(symbols.len(), 2);
    }

    #[test]
    fn clear_forgets_names() {
        let mut symbols = SymbolTable::default();
        symbols.intern("albedo");
        symbols.clear();

        assert!(symbols.is_empty());
        assert_eq!(symbols.lookup("albedo"), None);
        assert!(!ResourceName::INVALID.valid());
    }
}
