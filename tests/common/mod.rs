// Shared helpers for integration tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fluentdb::{Connection, ConnectionPool, DatabaseError, Row, Statement, Value};

/// Column as the scripted catalog reports it.
#[derive(Debug, Clone)]
pub struct ScriptedColumn {
    pub name: &'static str,
    pub data_type: &'static str,
    pub nullable: bool,
    pub default: Option<&'static str>,
}

pub fn column(name: &'static str, data_type: &'static str, nullable: bool, default: Option<&'static str>) -> ScriptedColumn {
    ScriptedColumn {
        name,
        data_type,
        nullable,
        default,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedTable {
    pub columns: Vec<ScriptedColumn>,
    pub primary_keys: Vec<&'static str>,
}

#[derive(Default)]
struct PoolState {
    tables: HashMap<String, ScriptedTable>,
    responses: VecDeque<Vec<Row>>,
    log: Vec<(usize, Statement)>,
    acquired: usize,
    released: usize,
}

/// In-memory pool answering the catalog queries from scripted tables and
/// every other statement from a response queue (empty result when the
/// queue is empty). Every statement is logged with the id of the
/// connection that ran it.
#[derive(Clone, Default)]
pub struct ScriptedPool {
    state: Arc<Mutex<PoolState>>,
}

impl ScriptedPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, name: &str, table: ScriptedTable) -> Self {
        self.state.lock().unwrap().tables.insert(name.to_string(), table);
        self
    }

    pub fn respond(&self, rows: Vec<Row>) {
        self.state.lock().unwrap().responses.push_back(rows);
    }

    /// Statements other than catalog lookups, with their connection ids.
    pub fn statements(&self) -> Vec<(usize, Statement)> {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|(_, st)| !is_catalog(&st.sql))
            .cloned()
            .collect()
    }

    pub fn sql(&self) -> Vec<String> {
        self.statements().into_iter().map(|(_, st)| st.sql).collect()
    }

    pub fn last(&self) -> Option<Statement> {
        self.statements().pop().map(|(_, st)| st)
    }

    pub fn total_queries(&self) -> usize {
        self.state.lock().unwrap().log.len()
    }

    pub fn acquired(&self) -> usize {
        self.state.lock().unwrap().acquired
    }

    pub fn released(&self) -> usize {
        self.state.lock().unwrap().released
    }

    pub fn into_pool(self) -> Arc<dyn ConnectionPool> {
        Arc::new(self)
    }
}

fn is_catalog(sql: &str) -> bool {
    sql.contains("information_schema")
}

#[async_trait]
impl ConnectionPool for ScriptedPool {
    async fn acquire(&self) -> Result<Box<dyn Connection>, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        state.acquired += 1;
        Ok(Box::new(ScriptedConnection {
            id: state.acquired,
            state: Arc::clone(&self.state),
        }))
    }

    fn release(&self, _conn: Box<dyn Connection>) {
        self.state.lock().unwrap().released += 1;
    }
}

struct ScriptedConnection {
    id: usize,
    state: Arc<Mutex<PoolState>>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn query(&mut self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        let mut state = self.state.lock().unwrap();
        state.log.push((self.id, statement.clone()));

        let table_param = statement
            .params
            .first()
            .and_then(Value::as_text)
            .map(str::to_string);

        if statement.sql.starts_with("SELECT column_name, data_type") {
            let Some(table) = table_param.and_then(|t| state.tables.get(&t).cloned()) else {
                return Ok(Vec::new());
            };
            return Ok(table
                .columns
                .iter()
                .map(|c| {
                    Row::new()
                        .with("column_name", c.name)
                        .with("data_type", c.data_type)
                        .with("is_nullable", if c.nullable { "YES" } else { "NO" })
                        .with("column_default", c.default)
                })
                .collect());
        }
        if statement.sql.starts_with("SELECT kcu.column_name") {
            let keys = table_param
                .and_then(|t| state.tables.get(&t).cloned())
                .map(|t| t.primary_keys)
                .unwrap_or_default();
            return Ok(keys
                .into_iter()
                .map(|k| Row::new().with("column_name", k))
                .collect());
        }
        if statement.sql.starts_with("SELECT EXISTS") {
            let exists = table_param.is_some_and(|t| state.tables.contains_key(&t));
            return Ok(vec![Row::new().with("exists", exists)]);
        }

        Ok(state.responses.pop_front().unwrap_or_default())
    }
}

/// `people(id serial pk, name text not null, job text default 'chemist', age int)`
pub fn people() -> ScriptedTable {
    ScriptedTable {
        columns: vec![
            column("id", "integer", false, Some("nextval('people_id_seq'::regclass)")),
            column("name", "text", false, None),
            column("job", "character varying", true, Some("'chemist'::character varying")),
            column("age", "integer", true, None),
        ],
        primary_keys: vec!["id"],
    }
}

/// Same columns, no primary key.
pub fn log_table() -> ScriptedTable {
    ScriptedTable {
        columns: vec![
            column("message", "text", true, None),
            column("level", "text", true, None),
        ],
        primary_keys: Vec::new(),
    }
}
