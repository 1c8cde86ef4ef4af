//! Fakes shared by the gateway integration tests: a scripted model and a
//! small school database.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use sq_database::{QueryExecutor, Record, SchemaIntrospector};
use sq_domain::config::d_excluded_schemas;
use sq_domain::error::{Error, Result};
use sq_domain::tool::ToolCall;
use sq_gateway::{TurnRunner, TurnSettings};
use sq_providers::{ChatRequest, ChatResponse, LlmProvider};
use sq_sessions::{ConversationStore, InMemoryStore};
use sq_tools::{RunDatabaseCall, ToolRegistry, RUN_DATABASE_CALL};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub enum Step {
    Reply(ChatResponse),
    Fail(Error),
    Slow(Duration, ChatResponse),
}

/// Plays back one step per call and records every request.
pub struct ScriptedProvider {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn chat(&self, req: &ChatRequest) -> Result<ChatResponse> {
        self.requests.lock().unwrap().push(req.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(resp)) => Ok(resp),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Slow(delay, resp)) => {
                tokio::time::sleep(delay).await;
                Ok(resp)
            }
            None => Err(Error::Other("script exhausted".into())),
        }
    }

    fn provider_id(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

pub fn text(content: &str) -> Step {
    Step::Reply(ChatResponse {
        content: content.into(),
        model: "scripted-model".into(),
        finish_reason: Some("stop".into()),
        ..Default::default()
    })
}

pub fn sql_call(call_id: &str, sql: &str) -> Step {
    Step::Reply(ChatResponse {
        tool_calls: vec![ToolCall {
            call_id: call_id.into(),
            tool_name: RUN_DATABASE_CALL.into(),
            arguments: json!({ "sql_query": sql }),
        }],
        model: "scripted-model".into(),
        finish_reason: Some("tool_calls".into()),
        ..Default::default()
    })
}

pub fn rejected_by_provider() -> Step {
    Step::Fail(Error::Provider {
        provider: "scripted".into(),
        message: "invalid request".into(),
        status: Some(400),
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Database
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbHealth {
    Up,
    /// The catalog answers but every other statement fails to connect.
    DownAfterCatalog,
    Down,
}

/// `students(id, name)` and `modules(id, title, professor)`, 42 students.
pub struct SchoolDb {
    health: DbHealth,
    ran: Mutex<Vec<String>>,
}

impl SchoolDb {
    pub fn new(health: DbHealth) -> Arc<Self> {
        Arc::new(Self {
            health,
            ran: Mutex::new(Vec::new()),
        })
    }

    /// Non-catalog statements that reached the executor.
    pub fn ran(&self) -> Vec<String> {
        self.ran.lock().unwrap().clone()
    }
}

fn record(v: Value) -> Record {
    v.as_object().cloned().unwrap()
}

fn connection_refused() -> Error {
    Error::Connection("Can't connect to MySQL server on 'db:3306' (111)".into())
}

#[async_trait::async_trait]
impl QueryExecutor for SchoolDb {
    async fn execute(&self, sql: &str) -> Result<Vec<Record>> {
        if self.health == DbHealth::Down {
            return Err(connection_refused());
        }
        if sql.contains("information_schema.columns") {
            return Ok([
                ("school", "students", "id"),
                ("school", "students", "name"),
                ("school", "modules", "id"),
                ("school", "modules", "title"),
                ("school", "modules", "professor"),
                ("mysql", "user", "Host"),
            ]
            .into_iter()
            .map(|(s, t, c)| record(json!({ "table_schema": s, "table_name": t, "column_name": c })))
            .collect());
        }

        self.ran.lock().unwrap().push(sql.to_string());
        if self.health == DbHealth::DownAfterCatalog {
            return Err(connection_refused());
        }
        if sql.to_uppercase().contains("COUNT(*)") {
            return Ok(vec![record(json!({ "COUNT(*)": 42 }))]);
        }
        Ok(Vec::new())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Runner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn settings() -> TurnSettings {
    TurnSettings {
        temperature: 0.0,
        agent_max_tokens: 250,
        generate_max_tokens: None,
        max_retries: 0,
        turn_timeout: Duration::from_secs(5),
    }
}

pub struct Harness {
    pub runner: Arc<TurnRunner>,
    pub schema: Arc<SchemaIntrospector>,
    pub provider: Arc<ScriptedProvider>,
    pub db: Arc<SchoolDb>,
    pub store: Arc<dyn ConversationStore>,
}

pub fn harness(steps: Vec<Step>, health: DbHealth) -> Harness {
    harness_with(steps, health, Arc::new(InMemoryStore::new()), settings())
}

pub fn harness_with(
    steps: Vec<Step>,
    health: DbHealth,
    store: Arc<dyn ConversationStore>,
    settings: TurnSettings,
) -> Harness {
    let provider = ScriptedProvider::new(steps);
    let db = SchoolDb::new(health);
    let executor: Arc<dyn QueryExecutor> = db.clone();
    let schema = Arc::new(SchemaIntrospector::new(executor.clone(), d_excluded_schemas()));
    let tools = Arc::new(ToolRegistry::new().register(Arc::new(RunDatabaseCall::new(executor, 200))));
    let runner = Arc::new(TurnRunner::new(
        provider.clone(),
        schema.clone(),
        tools,
        store.clone(),
        settings,
    ));
    Harness {
        runner,
        schema,
        provider,
        db,
        store,
    }
}
