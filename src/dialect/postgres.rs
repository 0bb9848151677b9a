use super::{push_constraints, Dialect, InsertIdStrategy};
use crate::error::Result;
use crate::schema::{FieldDescriptor, FieldType};

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }

    fn column_type(field: &FieldDescriptor) -> String {
        let field_type = &field.field_type;
        if field_type.is_string() {
            return match field.size {
                Some(size) => format!("VARCHAR({size})"),
                None => "TEXT".to_string(),
            };
        }
        match field_type {
            FieldType::Bool | FieldType::Boolean => "BOOLEAN".to_string(),
            FieldType::DateTime => "timestamp without time zone".to_string(),
            FieldType::Double => "DOUBLE PRECISION".to_string(),
            FieldType::TinyInt => "SMALLINT".to_string(),
            other => other.name().to_string(),
        }
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn escape_bool(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String {
        let Some(limit) = limit else {
            return String::new();
        };
        match offset {
            Some(offset) if offset > 0 => format!(" LIMIT {limit} OFFSET {offset}"),
            _ => format!(" LIMIT {limit}"),
        }
    }

    fn returning_clause(&self, id_column: &str) -> Option<String> {
        Some(format!(" RETURNING {id_column}"))
    }

    fn insert_id_strategy(&self) -> InsertIdStrategy {
        InsertIdStrategy::Returning
    }

    fn field_definition(&self, name: &str, field: &FieldDescriptor) -> Result<String> {
        let mut definition = name.to_string();

        // Any auto-incrementing column becomes a sequence-backed BIGSERIAL.
        if field.field_type == FieldType::Serial || field.auto_increment {
            definition.push_str(" BIGSERIAL");
            definition.push_str(if field.primary_key {
                " PRIMARY KEY"
            } else {
                " UNIQUE"
            });
            return Ok(definition);
        }

        definition.push(' ');
        definition.push_str(&Self::column_type(field));
        if field.field_type.is_integer() && field.unsigned {
            definition.push_str(&format!(" CHECK ({name} > 0)"));
        }

        push_constraints(&mut definition, field);
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn define(field: FieldDescriptor) -> String {
        PostgresDialect::new().field_definition("col", &field).unwrap()
    }

    #[test]
    fn test_limit_syntax() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.limit_clause(Some(10), None), " LIMIT 10");
        assert_eq!(dialect.limit_clause(Some(10), Some(20)), " LIMIT 10 OFFSET 20");
        assert_eq!(dialect.limit_clause(None, Some(20)), "");
    }

    #[test]
    fn test_returning() {
        assert_eq!(
            PostgresDialect::new().returning_clause("id").as_deref(),
            Some(" RETURNING id")
        );
    }

    #[test]
    fn test_auto_increment_unsigned_primary_key() {
        let field = FieldDescriptor::new(FieldType::BigInt)
            .unsigned()
            .auto_increment()
            .primary_key();
        assert_eq!(define(field), "col BIGSERIAL PRIMARY KEY");
        assert_eq!(
            define(FieldDescriptor::new(FieldType::Serial)),
            "col BIGSERIAL UNIQUE"
        );
    }

    #[test]
    fn test_unsigned_becomes_check() {
        assert_eq!(
            define(FieldDescriptor::new(FieldType::Int).unsigned().not_null()),
            "col INT CHECK (col > 0) NOT NULL"
        );
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(define(FieldDescriptor::new(FieldType::Boolean)), "col BOOLEAN");
        assert_eq!(
            define(FieldDescriptor::new(FieldType::DateTime)),
            "col timestamp without time zone"
        );
        assert_eq!(define(FieldDescriptor::new(FieldType::String)), "col TEXT");
        assert_eq!(
            define(FieldDescriptor::new(FieldType::String).size(64).unique()),
            "col VARCHAR(64) UNIQUE"
        );
        assert_eq!(
            define(FieldDescriptor::new(FieldType::Double)),
            "col DOUBLE PRECISION"
        );
        assert_eq!(
            define(FieldDescriptor::new(FieldType::Other("JSONB".to_string()))),
            "col JSONB"
        );
    }
}
