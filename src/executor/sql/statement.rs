use crate::types::Value;

/// SQL text with positional `$n` placeholders and their values.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(Value::to_sql_literal).collect();
            write!(f, " -- [{}]", params.join(", "))?;
        }
        Ok(())
    }
}

/// Collects bind parameters while clauses are rendered.
#[derive(Debug, Default)]
pub struct Params {
    values: Vec<Value>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a value and returns its placeholder.
    pub fn bind(&mut self, value: Value) -> String {
        self.values.push(value);
        format!("${}", self.values.len())
    }

    /// Joins the non-empty clauses with spaces and terminates with `;`.
    #[must_use]
    pub fn finish(self, clauses: &[String]) -> Statement {
        let sql = clauses
            .iter()
            .filter(|c| !c.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        Statement {
            sql: format!("{sql};"),
            params: self.values,
        }
    }
}
