//! Abstract table descriptions consumed by DDL generation.
//!
//! Callers (model layers, migrations) describe tables with these types; a
//! [`Dialect`](crate::dialect::Dialect) maps them to database-specific DDL.

use std::fmt;
use std::str::FromStr;

use crate::error::{DbalError, Result};

/// Abstract column type vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Auto-generated 64-bit identity.
    Serial,
    TinyInt,
    SmallInt,
    Int,
    Integer,
    BigInt,
    Double,
    Float,
    Date,
    DateTime,
    Timestamp,
    Time,
    Text,
    Varchar,
    String,
    Bool,
    Boolean,
    /// Any other type name, emitted verbatim.
    Other(std::string::String),
}

impl FieldType {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::Serial | Self::TinyInt | Self::SmallInt | Self::Int | Self::Integer | Self::BigInt
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Double | Self::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Timestamp | Self::Time)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::Text | Self::Varchar | Self::String)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool | Self::Boolean)
    }

    /// The upper-case type name as written in the vocabulary.
    pub fn name(&self) -> &str {
        match self {
            Self::Serial => "SERIAL",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Int => "INT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Float => "FLOAT",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Time => "TIME",
            Self::Text => "TEXT",
            Self::Varchar => "VARCHAR",
            Self::String => "STRING",
            Self::Bool => "BOOL",
            Self::Boolean => "BOOLEAN",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = DbalError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_uppercase();
        let field_type = match name.as_str() {
            "" => return Err(DbalError::Schema("field type not specified".to_string())),
            "SERIAL" => Self::Serial,
            "TINYINT" => Self::TinyInt,
            "SMALLINT" => Self::SmallInt,
            "INT" => Self::Int,
            "INTEGER" => Self::Integer,
            "BIGINT" => Self::BigInt,
            "DOUBLE" => Self::Double,
            "FLOAT" => Self::Float,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            "TIMESTAMP" => Self::Timestamp,
            "TIME" => Self::Time,
            "TEXT" => Self::Text,
            "VARCHAR" => Self::Varchar,
            "STRING" => Self::String,
            "BOOL" => Self::Bool,
            "BOOLEAN" => Self::Boolean,
            _ => Self::Other(name),
        };
        Ok(field_type)
    }
}

/// Definition of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field_type: FieldType,
    pub size: Option<u32>,
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub unsigned: bool,
    pub auto_increment: bool,
    /// Raw SQL default expression, emitted verbatim.
    pub default: Option<String>,
}

impl FieldDescriptor {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            size: None,
            not_null: false,
            unique: false,
            primary_key: false,
            unsigned: false,
            auto_increment: false,
            default: None,
        }
    }

    /// Parses the type name; fails when it is empty.
    pub fn parse(type_name: &str) -> Result<Self> {
        Ok(Self::new(type_name.parse()?))
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }
}

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ForeignKeyAction {
    #[default]
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    NoAction,
}

impl ForeignKeyAction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::NoAction => "NO ACTION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub ref_table: String,
    pub ref_columns: Vec<String>,
    pub on_update: ForeignKeyAction,
    pub on_delete: ForeignKeyAction,
}

impl ForeignKey {
    /// A foreign key with RESTRICT on update and delete.
    pub fn new<C, R>(columns: C, ref_table: impl Into<String>, ref_columns: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ref_table: ref_table.into(),
            ref_columns: ref_columns.into_iter().map(Into::into).collect(),
            on_update: ForeignKeyAction::default(),
            on_delete: ForeignKeyAction::default(),
        }
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = action;
        self
    }
}

/// Kind of a stand-alone index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IndexKind {
    #[default]
    Index,
    Unique,
}

impl IndexKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Index => "INDEX",
            Self::Unique => "UNIQUE INDEX",
        }
    }
}

/// Everything needed to emit one CREATE TABLE statement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Field definitions in declaration order.
    pub fields: Vec<(String, FieldDescriptor)>,
    pub primary_key: Vec<String>,
    pub unique_indexes: Vec<Vec<String>>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Trailing table options, e.g. `ENGINE=InnoDB`.
    pub options: Option<String>,
}

impl TableDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing an earlier definition with the same name in place.
    pub fn field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = field,
            None => self.fields.push((name, field)),
        }
        self
    }

    /// Declares the table-level (possibly composite) primary key.
    /// A table has at most one; a second declaration is a schema error.
    pub fn primary_key<I>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        if !self.primary_key.is_empty() {
            return Err(DbalError::Schema("primary key already declared".to_string()));
        }
        self.primary_key = columns.into_iter().map(Into::into).collect();
        Ok(self)
    }

    pub fn unique<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.unique_indexes
            .push(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field_type() {
        assert_eq!(" serial ".parse::<FieldType>().unwrap(), FieldType::Serial);
        assert_eq!("Boolean".parse::<FieldType>().unwrap(), FieldType::Boolean);
        assert_eq!(
            "decimal(10,2)".parse::<FieldType>().unwrap(),
            FieldType::Other("DECIMAL(10,2)".to_string())
        );
        assert!(matches!(
            "  ".parse::<FieldType>(),
            Err(DbalError::Schema(_))
        ));
    }

    #[test]
    fn test_type_families() {
        assert!(FieldType::BigInt.is_integer());
        assert!(FieldType::Serial.is_integer());
        assert!(FieldType::String.is_string());
        assert!(FieldType::Bool.is_bool());
        assert!(FieldType::DateTime.is_temporal());
        assert!(FieldType::Double.is_float());
        assert!(!FieldType::Text.is_integer());
    }

    #[test]
    fn test_second_primary_key_rejected() {
        let table = TableDescriptor::new()
            .field("id", FieldDescriptor::new(FieldType::Int))
            .primary_key(["id"])
            .unwrap();
        assert!(matches!(
            table.primary_key(["id"]),
            Err(DbalError::Schema(_))
        ));
    }

    #[test]
    fn test_field_redefinition_keeps_position() {
        let table = TableDescriptor::new()
            .field("a", FieldDescriptor::new(FieldType::Int))
            .field("b", FieldDescriptor::new(FieldType::Text))
            .field("a", FieldDescriptor::new(FieldType::BigInt));
        assert_eq!(table.fields[0].0, "a");
        assert_eq!(table.fields[0].1.field_type, FieldType::BigInt);
        assert_eq!(table.fields.len(), 2);
    }

    #[test]
    fn test_foreign_key_defaults_to_restrict() {
        let fk = ForeignKey::new(["city_id"], "cities", ["id"]);
        assert_eq!(fk.on_update, ForeignKeyAction::Restrict);
        assert_eq!(fk.on_delete, ForeignKeyAction::Restrict);
    }
}
