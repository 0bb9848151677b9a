use super::template::SqlTemplate;
use crate::types::SqlValue;

/// Boolean operator placed in front of a condition that follows another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn as_sql(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// One parenthesized WHERE condition with the values for its placeholders.
#[derive(Debug, Clone)]
pub struct WhereClause {
    conjunction: Conjunction,
    condition: SqlTemplate,
    binds: Vec<SqlValue>,
}

impl WhereClause {
    /// A condition written by the caller, e.g. `age > ?`.
    pub fn new(expr: &str, binds: Vec<SqlValue>, conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            condition: SqlTemplate::parse(expr),
            binds,
        }
    }

    /// `expr IN (?,?,...)` with one placeholder per value. A single list
    /// value is expanded into its elements.
    /// An empty value list produces a condition that never matches.
    pub fn in_list(expr: &str, mut values: Vec<SqlValue>, conjunction: Conjunction) -> Self {
        if let [SqlValue::List(_)] = values.as_slice() {
            if let Some(SqlValue::List(items)) = values.pop() {
                values = items;
            }
        }
        let mut condition = SqlTemplate::new();
        if values.is_empty() {
            condition.push_text("1 = 0");
        } else {
            condition
                .push_sql(expr)
                .push_text(" IN (")
                .push_markers(values.len(), ",")
                .push_text(")");
        }
        Self {
            conjunction,
            condition,
            binds: values,
        }
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    pub fn binds(&self) -> &[SqlValue] {
        &self.binds
    }
}

/// Appends ` WHERE (a) AND (b) ...` to `template` and the clause binds to
/// `binds`, in call order. Operators apply left to right as written.
pub(crate) fn build_where(
    clauses: &[WhereClause],
    template: &mut SqlTemplate,
    binds: &mut Vec<SqlValue>,
) {
    for (i, clause) in clauses.iter().enumerate() {
        if i == 0 {
            template.push_text(" WHERE (");
        } else {
            template
                .push_text(" ")
                .push_text(clause.conjunction.as_sql())
                .push_text(" (");
        }
        template.append(&clause.condition).push_text(")");
        binds.extend(clause.binds.iter().cloned());
    }
}
