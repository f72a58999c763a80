use crate::{ModelError, Record, Result, Table, compiler};
use log::trace;
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

#[derive(Default)]
struct Models {
    /// Final table name to the type that registered it.
    by_name: HashMap<String, (TypeId, Arc<Table>)>,
    /// Type and prefix to the compiled table, covers tables renamed by their meta tag.
    by_type: HashMap<(TypeId, String), Arc<Table>>,
}

/// Cache of compiled tables.
///
/// Lookups of compiled models only take the read lock, compilation runs under the
/// write lock so that one type is compiled at most once. Failed compilations leave
/// nothing behind.
#[derive(Default)]
pub struct Registry {
    models: RwLock<Models>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Models> {
        self.models.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Models> {
        self.models.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Compiled table of `T`, named `prefix` + its table name.
    ///
    /// Fails with [`ModelError::DuplicateModel`] when another type already owns the
    /// resulting table name.
    pub fn compile<T: Record>(&self, prefix: &str) -> Result<Arc<Table>> {
        let key = (T::base_type(), prefix.to_string());
        if let Some(table) = self.read().by_type.get(&key) {
            trace!("Model cache hit for `{}`", table.name);
            return Ok(table.clone());
        }
        let mut models = self.write();
        if let Some(table) = models.by_type.get(&key) {
            return Ok(table.clone());
        }
        let table = Arc::new(compiler::compile::<T>(prefix)?);
        let table = match models.by_name.get(&table.name) {
            Some((id, existing)) if *id == key.0 => existing.clone(),
            Some(..) => {
                return Err(ModelError::DuplicateModel {
                    name: table.name.clone(),
                }
                .into());
            }
            None => {
                models
                    .by_name
                    .insert(table.name.clone(), (key.0, table.clone()));
                table
            }
        };
        models.by_type.insert(key, table.clone());
        Ok(table)
    }

    /// Already compiled table by its final name.
    pub fn get(&self, name: &str) -> Option<Arc<Table>> {
        self.read().by_name.get(name).map(|(_, table)| table.clone())
    }

    pub fn len(&self) -> usize {
        self.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every compiled table, later compilations build new instances.
    pub fn clear(&self) {
        let mut models = self.write();
        models.by_name.clear();
        models.by_type.clear();
    }
}
