//! Single-inheritance type chains.
//!
//! Column, filter and table types each name an optional parent. A
//! [`TypeChain`] is the explicit root-first list of types from the family
//! root down to a leaf, computed once and then walked by the schema, view
//! and data builders.

use std::sync::Arc;

use crate::error::{ConfigurationError, DatagridError, Result};
use crate::options::{Options, OptionsSchema, ResolvedOptions};

/// A named type with an optional parent, looked up by name.
pub trait HierarchicalType: Send + Sync {
    /// Registry key of this type.
    fn name(&self) -> &str;

    /// Registry key of the parent type, `None` for a family root.
    fn parent(&self) -> Option<&str>;
}

/// Root-first ancestor chain of a type.
pub struct TypeChain<T: ?Sized> {
    types: Vec<Arc<T>>,
}

impl<T: ?Sized> Clone for TypeChain<T> {
    fn clone(&self) -> Self {
        TypeChain {
            types: self.types.clone(),
        }
    }
}

impl<T: ?Sized + HierarchicalType> std::fmt::Debug for TypeChain<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<T: ?Sized + HierarchicalType> TypeChain<T> {
    /// Builds the chain ending at `leaf`.
    ///
    /// Fails when a name along the chain is unknown or when the parent
    /// links loop.
    pub fn build<F>(family: &'static str, leaf: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<Arc<T>>,
    {
        let mut types: Vec<Arc<T>> = Vec::new();
        let mut visited: Vec<String> = Vec::new();
        let mut next = Some(leaf.to_string());

        while let Some(name) = next {
            if visited.contains(&name) {
                visited.push(name);
                return Err(DatagridError::TypeCycle {
                    family,
                    path: visited,
                });
            }
            let ty = lookup(&name).ok_or_else(|| DatagridError::UnknownType {
                family,
                name: name.clone(),
            })?;
            next = ty.parent().map(str::to_string);
            visited.push(name);
            types.push(ty);
        }

        types.reverse();
        Ok(TypeChain { types })
    }

    /// Types from the root to the leaf.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<T>> {
        self.types.iter()
    }

    /// The most specific type.
    pub fn leaf(&self) -> &Arc<T> {
        // A chain always holds at least the leaf it was built from.
        &self.types[self.types.len() - 1]
    }

    pub fn names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.name()).collect()
    }

    /// Whether a type of the given name is part of the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name() == name)
    }

    /// Merges every type's declarations into one schema, root first.
    pub fn build_schema<F>(&self, mut configure: F) -> OptionsSchema
    where
        F: FnMut(&T, &mut OptionsSchema),
    {
        let mut schema = OptionsSchema::new();
        for ty in &self.types {
            configure(ty, &mut schema);
        }
        schema
    }

    /// Builds the merged schema and resolves `input` against it.
    pub fn resolve_options<F>(
        &self,
        configure: F,
        input: Options,
    ) -> std::result::Result<ResolvedOptions, ConfigurationError>
    where
        F: FnMut(&T, &mut OptionsSchema),
    {
        self.build_schema(configure).resolve(input)
    }
}
