//! Document identifiers and collection scoping.
//!
//! An [`Id`] is an opaque string key. Before it reaches a backend it is resolved
//! into a [`DocumentPath`] by splitting at its last `/`, so `users/alice` names
//! document `alice` in collection `users`. A [`Scope`] rewrites caller-visible
//! ids to and from that fully qualified form.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{StoreError, StoreResult};

/// Separator between a collection name and a document id.
pub const SEPARATOR: char = '/';

/// Opaque string key addressing one document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Joins a collection name and a document id into a fully qualified id.
    pub fn from_parts(collection: &str, document: &str) -> Self {
        Self(format!("{collection}{SEPARATOR}{document}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for Id {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A fully qualified id split into its collection and document parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPath<'a> {
    pub collection: &'a str,
    pub document: &'a str,
}

impl<'a> DocumentPath<'a> {
    /// Splits a fully qualified id at its last separator.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidId`] if the id has no separator or either
    /// side of it is empty.
    pub fn parse(id: &'a Id) -> StoreResult<Self> {
        let (collection, document) = id
            .as_str()
            .rsplit_once(SEPARATOR)
            .ok_or_else(|| StoreError::InvalidId(format!("{id} is not of the form <collection>/<document>")))?;

        if collection.is_empty() || document.is_empty() {
            return Err(StoreError::InvalidId(format!("{id} has an empty collection or document part")));
        }

        Ok(Self { collection, document })
    }
}

/// Optional collection namespace a store operates under.
///
/// Scoping is a pure string transform: [`Scope::apply`] prefixes a relative id
/// with the collection and [`Scope::strip`] removes exactly that prefix again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    collection: Option<String>,
}

impl Scope {
    /// A scope that leaves ids untouched.
    pub fn unscoped() -> Self {
        Self { collection: None }
    }

    /// A scope bound to one collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Configuration`] if the name is empty or contains
    /// the separator.
    pub fn collection(name: impl Into<String>) -> StoreResult<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(StoreError::Configuration("collection scope must not be empty".into()));
        }
        if name.contains(SEPARATOR) {
            return Err(StoreError::Configuration(format!(
                "collection scope {name} must not contain '{SEPARATOR}'"
            )));
        }

        Ok(Self { collection: Some(name) })
    }

    pub fn name(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn is_scoped(&self) -> bool {
        self.collection.is_some()
    }

    /// Expands a caller-visible id into the id the backend sees.
    pub fn apply(&self, id: &Id) -> Id {
        match &self.collection {
            Some(collection) => Id::from_parts(collection, id.as_str()),
            None => id.clone(),
        }
    }

    /// Expands a caller-visible id, refusing ids the scope could not list again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidId`] if the store is scoped and `id`
    /// contains the separator.
    pub fn qualify(&self, id: &Id) -> StoreResult<Id> {
        if self.is_scoped() && id.as_str().contains(SEPARATOR) {
            return Err(StoreError::InvalidId(format!(
                "{id} must not contain '{SEPARATOR}' in a collection-scoped store"
            )));
        }

        Ok(self.apply(id))
    }

    /// Collapses a backend id back into the caller-visible form.
    ///
    /// Ids that do not carry this scope's prefix are returned unchanged.
    pub fn strip(&self, id: &Id) -> Id {
        let Some(collection) = &self.collection else {
            return id.clone();
        };

        id.as_str()
            .strip_prefix(collection.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .map(Id::from)
            .unwrap_or_else(|| id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unscoped_is_identity() {
        let scope = Scope::unscoped();
        let id = Id::from("users/alice");

        assert_eq!(scope.apply(&id), id);
        assert_eq!(scope.strip(&id), id);
    }

    #[test]
    fn scoped_prefixes_and_strips() {
        let scope = Scope::collection("testing").unwrap();
        let id = Id::from("test1");

        let qualified = scope.apply(&id);
        assert_eq!(qualified.as_str(), "testing/test1");
        assert_eq!(scope.strip(&qualified), id);
    }

    #[test]
    fn strip_inverts_apply() {
        let scope = Scope::collection("c").unwrap();

        for raw in ["a", "c", "c/", "/x", "nested/doc", "", "cc/d"] {
            let id = Id::from(raw);
            assert_eq!(scope.strip(&scope.apply(&id)), id, "{raw:?}");
        }
    }

    #[test]
    fn scoped_ids_cannot_nest() {
        let scope = Scope::collection("C").unwrap();

        assert_eq!(scope.qualify(&Id::from("x")).unwrap().as_str(), "C/x");
        for raw in ["x/y", "/x", "x/"] {
            assert!(matches!(scope.qualify(&Id::from(raw)), Err(StoreError::InvalidId(_))), "{raw:?}");
        }

        let unscoped = Scope::unscoped();
        assert_eq!(unscoped.qualify(&Id::from("a/b/c")).unwrap().as_str(), "a/b/c");
    }

    #[test]
    fn strip_leaves_foreign_ids_alone() {
        let scope = Scope::collection("users").unwrap();

        assert_eq!(scope.strip(&Id::from("usersx/a")).as_str(), "usersx/a");
        assert_eq!(scope.strip(&Id::from("other/a")).as_str(), "other/a");
    }

    #[test]
    fn rejects_bad_scopes() {
        assert!(matches!(Scope::collection(""), Err(StoreError::Configuration(_))));
        assert!(matches!(Scope::collection("a/b"), Err(StoreError::Configuration(_))));
    }

    #[test]
    fn parses_at_last_separator() {
        let id = Id::from("a/b/c");
        let path = DocumentPath::parse(&id).unwrap();

        assert_eq!(path.collection, "a/b");
        assert_eq!(path.document, "c");
        assert_eq!(Id::from_parts(path.collection, path.document), id);
    }

    #[test]
    fn rejects_unqualified_ids() {
        for raw in ["plain", "/doc", "col/", ""] {
            let id = Id::from(raw);
            assert!(matches!(DocumentPath::parse(&id), Err(StoreError::InvalidId(_))), "{raw:?}");
        }
    }
}
