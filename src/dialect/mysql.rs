use super::{push_constraints, Dialect, InsertIdStrategy};
use crate::error::Result;
use crate::escape;
use crate::schema::{FieldDescriptor, FieldType};

/// MySQL / MariaDB dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn escape_bool(&self, value: bool) -> &'static str {
        if value {
            "1"
        } else {
            "0"
        }
    }

    /// Backslashes are doubled as well, since the default sql_mode reads
    /// them as escapes inside string literals.
    fn escape_string(&self, value: &str, like: bool) -> String {
        escape::escape_string(&escape::escape_backslashes(value), like)
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        match (limit, offset) {
            (None, _) => String::new(),
            (Some(limit), Some(offset)) if offset > 0 => format!(" LIMIT {offset}, {limit}"),
            (Some(limit), _) => format!(" LIMIT {limit}"),
        }
    }

    fn returning_clause(&self, _id_column: &str) -> Option<String> {
        None
    }

    fn insert_id_strategy(&self) -> InsertIdStrategy {
        InsertIdStrategy::LastInsertId
    }

    fn field_definition(&self, name: &str, field: &FieldDescriptor) -> Result<String> {
        let mut definition = name.to_string();
        let field_type = &field.field_type;

        if *field_type == FieldType::Serial {
            definition.push_str(" BIGINT UNSIGNED NOT NULL AUTO_INCREMENT");
            definition.push_str(if field.primary_key {
                " PRIMARY KEY"
            } else {
                " UNIQUE"
            });
            return Ok(definition);
        }

        if field_type.is_string() {
            match field.size {
                Some(size) => definition.push_str(&format!(" VARCHAR({size})")),
                None => definition.push_str(" TEXT"),
            }
        } else if field_type.is_bool() {
            definition.push_str(" TINYINT(1)");
        } else {
            definition.push(' ');
            definition.push_str(field_type.name());
        }

        // MySQL only accepts UNSIGNED directly after the type.
        if field_type.is_integer() {
            if field.unsigned {
                definition.push_str(" UNSIGNED");
            }
            if field.auto_increment {
                definition.push_str(" AUTO_INCREMENT");
            }
        }

        push_constraints(&mut definition, field);
        Ok(definition)
    }
}
