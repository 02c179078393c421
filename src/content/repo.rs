use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ModuleList {
    pub modules: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleDetail {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeDetail {
    pub id: String,
    pub title: String,
    pub description: String,
    pub starter_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub output: String,
    pub success: bool,
}

/// Read-only content catalog.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn list_modules(&self) -> anyhow::Result<ModuleList>;
    async fn module(&self, id: &str) -> anyhow::Result<ModuleDetail>;
    async fn challenge(&self, id: &str) -> anyhow::Result<ChallengeDetail>;
}

/// Runs submitted code.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    async fn run(&self, user_id: Uuid, code: &str) -> anyhow::Result<ExecutionResult>;
}

/// Placeholder catalog until content is persisted.
pub struct StaticContent;

#[async_trait]
impl ContentRepository for StaticContent {
    async fn list_modules(&self) -> anyhow::Result<ModuleList> {
        Ok(ModuleList {
            modules: vec!["Sample Module 1".into(), "Sample Module 2".into()],
        })
    }

    async fn module(&self, id: &str) -> anyhow::Result<ModuleDetail> {
        Ok(ModuleDetail {
            id: id.to_string(),
            title: "Sample Module".into(),
            description: "This is a sample module description".into(),
        })
    }

    async fn challenge(&self, id: &str) -> anyhow::Result<ChallengeDetail> {
        Ok(ChallengeDetail {
            id: id.to_string(),
            title: "Sample Challenge".into(),
            description: "This is a sample challenge description".into(),
            starter_code: "package main\n\nfunc main() {\n\t// Your code here\n}".into(),
        })
    }
}

/// Returns a canned result; nothing is executed.
pub struct StubRunner;

#[async_trait]
impl CodeRunner for StubRunner {
    async fn run(&self, _user_id: Uuid, _code: &str) -> anyhow::Result<ExecutionResult> {
        Ok(ExecutionResult {
            output: "Sample output".into(),
            success: true,
        })
    }
}
