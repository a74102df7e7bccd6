//! Identifier allocation and the document's id registry.

use std::collections::{HashMap, HashSet};

use crate::metadata::TypeRef;
use crate::validate::{CompilerError, ERR_DUPLICATE_ID, ERR_UNKNOWN_ID};

/// Document-scoped names. Counters and the registry are mutated strictly in
/// document order.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    counters: HashMap<String, usize>,
    ids: HashMap<String, TypeRef>,
    generated: HashSet<String>,
}

/// `VBox` → `vBox`, `URL` → `uRL`.
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh identifier derived from the type's simple name.
    pub fn unique_name(&mut self, ty: &TypeRef) -> String {
        self.unique_name_for(&ty.simple_name())
    }

    /// Fresh identifier `base` + counter, skipping anything already taken.
    pub fn unique_name_for(&mut self, base: &str) -> String {
        let base = decapitalize(base);
        let counter = self.counters.entry(base.clone()).or_insert(0);
        loop {
            let candidate = format!("{}{}", base, counter);
            *counter += 1;
            if !self.ids.contains_key(&candidate) && !self.generated.contains(&candidate) {
                self.generated.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Claims an exact name for a local (e.g. a cached getter result) if it
    /// is still free, else falls back to a counted one.
    pub fn claim_name(&mut self, name: &str) -> String {
        if self.is_taken(name) {
            self.unique_name_for(name)
        } else {
            self.generated.insert(name.to_string());
            name.to_string()
        }
    }

    pub fn is_taken(&self, name: &str) -> bool {
        self.ids.contains_key(name) || self.generated.contains(name)
    }

    pub fn store_id_type(&mut self, id: &str, ty: TypeRef) -> Result<(), CompilerError> {
        if self.is_taken(id) {
            return Err(CompilerError::new(
                ERR_DUPLICATE_ID,
                format!("Id '{}' is already registered", id),
            ));
        }
        self.ids.insert(id.to_string(), ty);
        Ok(())
    }

    pub fn resolve_type_by_id(&self, id: &str) -> Result<&TypeRef, CompilerError> {
        self.ids.get(id).ok_or_else(|| {
            CompilerError::new(ERR_UNKNOWN_ID, format!("Unknown id '{}'", id))
                .with_hint("Ids must be declared before they are referenced")
        })
    }

    pub fn has_id(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Primitive;

    #[test]
    fn test_sequential_suffixes() {
        let mut names = NameResolver::new();
        assert_eq!(names.unique_name(&TypeRef::object()), "object0");
        assert_eq!(names.unique_name(&TypeRef::object()), "object1");
        assert_eq!(names.unique_name(&TypeRef::Primitive(Primitive::Int)), "int0");
        assert_eq!(names.unique_name(&TypeRef::class("javafx.scene.layout.VBox")), "vBox0");
    }

    #[test]
    fn test_duplicate_id_fails() {
        let mut names = NameResolver::new();
        names.store_id_type("label", TypeRef::string()).unwrap();
        let err = names.store_id_type("label", TypeRef::string()).unwrap_err();
        assert_eq!(err.code, ERR_DUPLICATE_ID);
    }

    #[test]
    fn test_unknown_id_fails() {
        let names = NameResolver::new();
        assert_eq!(names.resolve_type_by_id("missing").unwrap_err().code, ERR_UNKNOWN_ID);
    }

    #[test]
    fn test_generated_names_skip_stored_ids() {
        let mut names = NameResolver::new();
        names.store_id_type("object0", TypeRef::object()).unwrap();
        assert_eq!(names.unique_name(&TypeRef::object()), "object1");
        assert!(names.store_id_type("object1", TypeRef::object()).is_err());
    }

    #[test]
    fn test_claim_name_prefers_exact() {
        let mut names = NameResolver::new();
        assert_eq!(names.claim_name("vBox0Children"), "vBox0Children");
        assert_eq!(names.claim_name("vBox0Children"), "vBox0Children0");
    }
}
