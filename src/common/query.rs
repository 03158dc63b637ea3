// src/common/query.rs

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::assignment::ContextType;

// Parâmetros possíveis de uma consulta montada dinamicamente.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Uuid(Uuid),
    Context(ContextType),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    Int(i64),
}

/// Lista ordenada de cláusulas + lista paralela de parâmetros.
/// Cada `{}` do template vira o próximo placeholder `$n`.
#[derive(Debug, Clone)]
pub struct ClauseBuilder {
    clauses: Vec<String>,
    params: Vec<SqlParam>,
    first_index: usize,
}

impl ClauseBuilder {
    /// `first_index` é o número do primeiro placeholder livre
    /// (ex.: 3 quando $1 e $2 já estão fixos na consulta).
    pub fn starting_at(first_index: usize) -> Self {
        Self {
            clauses: Vec::new(),
            params: Vec::new(),
            first_index,
        }
    }

    pub fn push(&mut self, template: &str, param: SqlParam) -> &mut Self {
        let placeholder = self.placeholder(param);
        self.clauses.push(template.replacen("{}", &placeholder, 1));
        self
    }

    pub fn push_raw(&mut self, clause: &str) -> &mut Self {
        self.clauses.push(clause.to_string());
        self
    }

    /// Reserva um placeholder sem criar cláusula (LIMIT/OFFSET, por exemplo).
    pub fn placeholder(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.first_index + self.params.len() - 1)
    }

    pub fn join(&self, separator: &str) -> String {
        self.clauses.join(separator)
    }

    pub fn params(&self) -> &[SqlParam] {
        &self.params
    }
}

/// Aplica `bind` na ordem dos parâmetros. Funciona com `query`, `query_as` e `query_scalar`.
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut q = $query;
        for param in $params.iter().cloned() {
            q = match param {
                $crate::common::query::SqlParam::Uuid(v) => q.bind(v),
                $crate::common::query::SqlParam::Context(v) => q.bind(v),
                $crate::common::query::SqlParam::Bool(v) => q.bind(v),
                $crate::common::query::SqlParam::Text(v) => q.bind(v),
                $crate::common::query::SqlParam::Date(v) => q.bind(v),
                $crate::common::query::SqlParam::Int(v) => q.bind(v),
            };
        }
        q
    }};
}

pub(crate) use bind_params;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_follow_fixed_parameters() {
        let mut sets = ClauseBuilder::starting_at(3);
        sets.push("is_primary = {}", SqlParam::Bool(true));
        sets.push("updated_by = {}", SqlParam::Uuid(Uuid::nil()));
        sets.push_raw("updated_at = NOW()");

        assert_eq!(sets.join(", "), "is_primary = $3, updated_by = $4, updated_at = NOW()");
        assert_eq!(sets.params().len(), 2);
    }

    #[test]
    fn reserved_placeholders_continue_the_sequence() {
        let mut where_ = ClauseBuilder::starting_at(1);
        where_.push("a.organization_id = {}", SqlParam::Uuid(Uuid::nil()));
        let limit = where_.placeholder(SqlParam::Int(50));
        let offset = where_.placeholder(SqlParam::Int(0));

        assert_eq!(where_.join(" AND "), "a.organization_id = $1");
        assert_eq!((limit.as_str(), offset.as_str()), ("$2", "$3"));
        assert_eq!(where_.params()[1], SqlParam::Int(50));
    }
}
