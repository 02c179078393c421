use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct ModuleProgress {
    pub id: String,
    pub title: String,
    pub progress: u8,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressOverview {
    pub modules: Vec<ModuleProgress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeProgress {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleProgressDetail {
    pub id: String,
    pub progress: u8,
    pub challenges: Vec<ChallengeProgress>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeCompletion {
    pub id: String,
    pub completed: bool,
    pub points: i32,
    pub message: String,
}

/// Per-user progress through modules and challenges.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn overview(&self, user_id: Uuid) -> anyhow::Result<ProgressOverview>;
    async fn module(&self, user_id: Uuid, module_id: &str) -> anyhow::Result<ModuleProgressDetail>;
    async fn complete_challenge(
        &self,
        user_id: Uuid,
        challenge_id: &str,
    ) -> anyhow::Result<ChallengeCompletion>;
}

/// Placeholder progress; nothing is persisted yet.
pub struct StaticProgress;

fn module_progress(id: &str, title: &str, progress: u8) -> ModuleProgress {
    ModuleProgress {
        id: id.into(),
        title: title.into(),
        progress,
        completed: progress == 100,
    }
}

#[async_trait]
impl ProgressRepository for StaticProgress {
    async fn overview(&self, _user_id: Uuid) -> anyhow::Result<ProgressOverview> {
        Ok(ProgressOverview {
            modules: vec![
                module_progress("basic-syntax", "Go Basics", 100),
                module_progress("functions-packages", "Functions and Packages", 50),
                module_progress("data-structures", "Data Structures", 0),
            ],
        })
    }

    async fn module(&self, _user_id: Uuid, module_id: &str) -> anyhow::Result<ModuleProgressDetail> {
        let challenges = (1..=3)
            .map(|n| ChallengeProgress {
                id: format!("challenge{n}"),
                title: format!("Sample Challenge {n}"),
                completed: n < 3,
            })
            .collect();
        Ok(ModuleProgressDetail {
            id: module_id.to_string(),
            progress: 75,
            challenges,
        })
    }

    async fn complete_challenge(
        &self,
        _user_id: Uuid,
        challenge_id: &str,
    ) -> anyhow::Result<ChallengeCompletion> {
        Ok(ChallengeCompletion {
            id: challenge_id.to_string(),
            completed: true,
            points: 10,
            message: "Challenge completed successfully!".into(),
        })
    }
}
