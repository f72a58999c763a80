use crate::{Action, Column, ConstraintKind, ModelError, Result};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    #[default]
    Table,
    /// Backed by a `SELECT` statement instead of storage.
    View,
}

/// Single column reference to another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub name: String,
    /// Index of the local column in [`Table::columns`].
    pub column: usize,
    pub table: String,
    pub references: String,
    pub on_update: Option<Action>,
    pub on_delete: Option<Action>,
}

/// Compiled model of a record type: columns plus table level constraints.
///
/// Constraints refer to columns by their index in [`Table::columns`]. Unique,
/// index, foreign key and check constraints share one namespace, their names are
/// stored lower-cased so that collisions ignore case.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub kind: TableKind,
    /// The `SELECT` statement of a view.
    pub view: Option<String>,
    pub columns: Vec<Column>,
    /// Ordered primary key columns, empty when the table has none.
    pub primary_key: Vec<usize>,
    pub auto_increment: Option<usize>,
    pub occ: Option<usize>,
    pub uniques: BTreeMap<String, Vec<usize>>,
    pub indexes: BTreeMap<String, Vec<usize>>,
    pub foreign_keys: BTreeMap<String, ForeignKey>,
    pub checks: BTreeMap<String, String>,
    /// Table level properties a dialect may interpret, like `engine(innodb)`.
    pub meta: BTreeMap<String, Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_view(&self) -> bool {
        self.kind == TableKind::View
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key_columns(&self) -> impl ExactSizeIterator<Item = &Column> {
        self.primary_key.iter().map(|&i| &self.columns[i])
    }

    pub fn auto_increment_column(&self) -> Option<&Column> {
        self.auto_increment.map(|i| &self.columns[i])
    }

    pub fn occ_column(&self) -> Option<&Column> {
        self.occ.map(|i| &self.columns[i])
    }

    /// Constraint columns resolved to their names.
    pub fn column_names(&self, indexes: &[usize]) -> Vec<&str> {
        indexes
            .iter()
            .filter_map(|&i| self.columns.get(i))
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn constraint_kind(&self, name: &str) -> Option<ConstraintKind> {
        let name = name.to_lowercase();
        if self.uniques.contains_key(&name) {
            Some(ConstraintKind::Unique)
        } else if self.indexes.contains_key(&name) {
            Some(ConstraintKind::Index)
        } else if self.foreign_keys.contains_key(&name) {
            Some(ConstraintKind::ForeignKey)
        } else if self.checks.contains_key(&name) {
            Some(ConstraintKind::Check)
        } else {
            None
        }
    }

    fn claim(&self, name: &str, kind: ConstraintKind) -> Result<String> {
        match self.constraint_kind(name) {
            Some(existing) if existing != kind || !kind.is_composite() => {
                Err(ModelError::ConstraintNameCollision {
                    name: name.to_string(),
                    existing,
                }
                .into())
            }
            _ => Ok(name.to_lowercase()),
        }
    }

    /// Appends a column and returns its index.
    pub fn add_column(&mut self, mut column: Column) -> Result<usize> {
        if self.column(&column.name).is_some() {
            return Err(ModelError::DuplicateColumn {
                table: self.name.clone(),
                column: column.name,
            }
            .into());
        }
        column.table = self.name.clone();
        self.columns.push(column);
        Ok(self.columns.len() - 1)
    }

    /// Adds `column` to the unique constraint `name`, repeated names build a composite key.
    pub fn add_unique(&mut self, name: &str, column: usize) -> Result<()> {
        let name = self.claim(name, ConstraintKind::Unique)?;
        let columns = self.uniques.entry(name).or_default();
        if !columns.contains(&column) {
            columns.push(column);
        }
        Ok(())
    }

    /// Adds `column` to the index `name`, repeated names build a composite index.
    pub fn add_index(&mut self, name: &str, column: usize) -> Result<()> {
        let name = self.claim(name, ConstraintKind::Index)?;
        let columns = self.indexes.entry(name).or_default();
        if !columns.contains(&column) {
            columns.push(column);
        }
        Ok(())
    }

    pub fn add_foreign_key(&mut self, mut foreign_key: ForeignKey) -> Result<()> {
        foreign_key.name = self.claim(&foreign_key.name, ConstraintKind::ForeignKey)?;
        self.foreign_keys
            .insert(foreign_key.name.clone(), foreign_key);
        Ok(())
    }

    pub fn add_check(&mut self, name: &str, expression: impl Into<String>) -> Result<()> {
        let name = self.claim(name, ConstraintKind::Check)?;
        self.checks.insert(name, expression.into());
        Ok(())
    }

    /// Changes the table name, columns follow.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        for column in &mut self.columns {
            column.table = self.name.clone();
        }
    }

    /// Cross field checks that can only run once every column is known.
    pub fn validate(&self) -> Result<()> {
        for foreign_key in self.foreign_keys.values() {
            if foreign_key.column >= self.columns.len() {
                return Err(ModelError::MissingForeignKeyColumn {
                    name: foreign_key.name.clone(),
                    column: foreign_key.column.to_string(),
                }
                .into());
            }
        }
        let occ = self.columns.iter().filter(|c| c.occ).count();
        if occ > 1 {
            return Err(ModelError::MultipleOcc {
                table: self.name.clone(),
            }
            .into());
        }
        if let Some(auto_increment) = self.auto_increment {
            let column = &self.columns[auto_increment];
            if column.nullable {
                return Err(ModelError::NullableConflict {
                    field: column.field_name.clone(),
                }
                .into());
            }
            if self.primary_key != [auto_increment] {
                return Err(ModelError::PrimaryKeyConflict {
                    field: column.field_name.clone(),
                    reason: "the table has an auto increment column",
                }
                .into());
            }
        }
        Ok(())
    }
}

impl ConstraintKind {
    /// Whether declaring the same name again extends the constraint.
    pub fn is_composite(&self) -> bool {
        matches!(self, ConstraintKind::Unique | ConstraintKind::Index)
    }
}
