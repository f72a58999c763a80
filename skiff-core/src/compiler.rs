use crate::{
    Action, Column, FieldDef, ForeignKey, ModelError, Record, Result, Table, TableKind, Tag,
};
use anyhow::Context;
use log::debug;

/// Turns the field description of `T` into a validated [`Table`].
///
/// Nothing is cached here, see [`crate::Registry::compile`].
pub fn compile<T: Record>(prefix: &str) -> Result<Table> {
    let mut table = Table::new(format!("{prefix}{}", T::table_name()));
    walk(&mut table, T::fields())?;
    if let Some(meta) = T::meta() {
        apply_meta(&mut table, prefix, meta)
            .with_context(|| format!("While reading the table tag of `{}`", table.name))?;
    }
    if let Some(view) = T::view() {
        table.kind = TableKind::View;
        table.view = Some(view.to_string());
    } else if table.columns.is_empty() {
        return Err(ModelError::NotAStruct {
            type_name: T::base_type_name().to_string(),
        }
        .into());
    }
    table.validate()?;
    debug!(
        "Compiled `{}` into table `{}` with {} columns",
        T::base_type_name(),
        table.name,
        table.columns.len()
    );
    Ok(table)
}

fn walk(table: &mut Table, fields: Vec<FieldDef>) -> Result<()> {
    for field in fields {
        match field {
            FieldDef::Embedded(fields) => walk(table, fields())?,
            FieldDef::Column {
                name,
                value,
                nullable,
                tag,
                parse_default,
            } => {
                if name.starts_with('_') || tag.trim() == "-" {
                    continue;
                }
                let mut column = Column::new(name, value);
                column.nullable = nullable;
                let index = table.columns.len();
                let mut setter = Setter {
                    table: &mut *table,
                    index,
                    column: &mut column,
                    parse_default,
                };
                for property in Tag::parse(tag)? {
                    setter.apply(&property.name, &property.args)?;
                }
                table.add_column(column)?;
            }
        }
    }
    Ok(())
}

fn apply_meta(table: &mut Table, prefix: &str, meta: &str) -> Result<()> {
    for property in Tag::parse(meta)? {
        let args = property.args;
        match property.name.as_str() {
            "name" => {
                let [name] = arity::<1>(&table.name, "name", args, "1")?;
                table.rename(format!("{prefix}{name}"));
            }
            "check" => {
                let [name, expression] = arity::<2>(&table.name, "check", args, "2")?;
                table.add_check(&name, expression)?;
            }
            _ => {
                table.meta.insert(property.name, args);
            }
        }
    }
    Ok(())
}

fn arity<const N: usize>(
    field: &str,
    property: &str,
    args: Vec<String>,
    expected: &'static str,
) -> Result<[String; N]> {
    let found = args.len();
    args.try_into().map_err(|_| {
        ModelError::PropertyArity {
            field: field.to_string(),
            property: property.to_string(),
            expected,
            found,
        }
        .into()
    })
}

/// Applies the properties of one field tag, `index` is the position the column will take.
struct Setter<'a> {
    table: &'a mut Table,
    index: usize,
    column: &'a mut Column,
    parse_default: Option<crate::ParseDefault>,
}

impl Setter<'_> {
    fn apply(&mut self, name: &str, args: &[String]) -> Result<()> {
        match name {
            "name" => self.name(args),
            "len" => self.len(args),
            "nullable" => self.nullable(args),
            "default" => self.default(args),
            "ai" => self.auto_increment(args),
            "pk" => self.primary_key(args),
            "unique" => self.unique(args),
            "index" => self.index(args),
            "fk" => self.foreign_key(args),
            "occ" => self.occ(args),
            _ => Err(ModelError::UnknownProperty {
                field: self.column.field_name.clone(),
                property: name.to_string(),
            }
            .into()),
        }
    }

    fn check_arity(
        &self,
        property: &str,
        args: &[String],
        range: std::ops::RangeInclusive<usize>,
        expected: &'static str,
    ) -> Result<()> {
        if !range.contains(&args.len()) {
            return Err(ModelError::PropertyArity {
                field: self.column.field_name.clone(),
                property: property.to_string(),
                expected,
                found: args.len(),
            }
            .into());
        }
        Ok(())
    }

    fn invalid(&self, property: &str, value: &str) -> crate::Error {
        ModelError::InvalidArgument {
            field: self.column.field_name.clone(),
            property: property.to_string(),
            value: value.to_string(),
        }
        .into()
    }

    fn name(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("name", args, 1..=1, "1")?;
        if args[0].is_empty() {
            return Err(self.invalid("name", &args[0]));
        }
        self.column.name = args[0].clone();
        Ok(())
    }

    fn len(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("len", args, 0..=2, "0 to 2")?;
        let length = args
            .iter()
            .map(|v| v.parse::<i64>().map_err(|_| self.invalid("len", v)))
            .collect::<Result<_>>()?;
        self.column.length = length;
        Ok(())
    }

    fn nullable(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("nullable", args, 0..=1, "0 or 1")?;
        let nullable = match args.first().map(|v| v.to_ascii_lowercase()) {
            None => true,
            Some(v) if v == "true" => true,
            Some(v) if v == "false" => false,
            Some(_) => return Err(self.invalid("nullable", &args[0])),
        };
        if nullable && self.column.auto_increment {
            return Err(ModelError::NullableConflict {
                field: self.column.field_name.clone(),
            }
            .into());
        }
        self.column.nullable = nullable;
        Ok(())
    }

    fn default(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("default", args, 1..=1, "1")?;
        let reason = if self.column.auto_increment {
            Some("it is auto increment")
        } else if self.table.primary_key.contains(&self.index) {
            Some("it is part of the primary key")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ModelError::DefaultConflict {
                field: self.column.field_name.clone(),
                reason,
            }
            .into());
        }
        let value = match self.parse_default {
            Some(parse) => parse(&args[0]),
            None => self.column.value.parse_as(&args[0]),
        }
        .map_err(|_| self.invalid("default", &args[0]))?;
        self.column.default = Some(value);
        Ok(())
    }

    fn auto_increment(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("ai", args, 0..=0, "0")?;
        let field = self.column.field_name.clone();
        if !self.column.value.is_integer() {
            return Err(ModelError::InvalidAutoIncrementType { field }.into());
        }
        let reason = if self.column.nullable {
            Some("it is nullable")
        } else if self.column.has_default() {
            Some("it has a default value")
        } else if self.table.auto_increment.is_some() {
            Some("the table already has an auto increment column")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ModelError::AutoIncrementConflict { field, reason }.into());
        }
        self.column.auto_increment = true;
        self.table.auto_increment = Some(self.index);
        self.table.primary_key = vec![self.index];
        Ok(())
    }

    fn primary_key(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("pk", args, 0..=0, "0")?;
        let reason = if self.column.has_default() {
            Some("it has a default value")
        } else if self.table.auto_increment.is_some() {
            Some("the table has an auto increment column")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(ModelError::PrimaryKeyConflict {
                field: self.column.field_name.clone(),
                reason,
            }
            .into());
        }
        if !self.table.primary_key.contains(&self.index) {
            self.table.primary_key.push(self.index);
        }
        Ok(())
    }

    fn unique(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("unique", args, 1..=1, "1")?;
        self.table.add_unique(&args[0], self.index)
    }

    fn index(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("index", args, 1..=1, "1")?;
        self.table.add_index(&args[0], self.index)
    }

    fn foreign_key(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("fk", args, 3..=5, "3 to 5")?;
        let action = |v: Option<&String>| {
            v.map(|v| Action::parse(v).ok_or_else(|| self.invalid("fk", v)))
                .transpose()
        };
        let foreign_key = ForeignKey {
            name: args[0].clone(),
            column: self.index,
            table: args[1].clone(),
            references: args[2].clone(),
            on_update: action(args.get(3))?,
            on_delete: action(args.get(4))?,
        };
        self.table.add_foreign_key(foreign_key)
    }

    fn occ(&mut self, args: &[String]) -> Result<()> {
        self.check_arity("occ", args, 0..=0, "0")?;
        if !self.column.value.is_integer() {
            return Err(ModelError::InvalidOccType {
                field: self.column.field_name.clone(),
            }
            .into());
        }
        if self.table.occ.is_some() {
            return Err(ModelError::MultipleOcc {
                table: self.table.name.clone(),
            }
            .into());
        }
        self.column.occ = true;
        self.table.occ = Some(self.index);
        Ok(())
    }
}
