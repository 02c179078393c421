use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub points: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievements {
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub points: i32,
    pub level: i32,
    pub streak: i32,
    pub challenges: u32,
    pub achievements: u32,
}

/// Points, achievements and leaderboard.
#[async_trait]
pub trait GamificationRepository: Send + Sync {
    async fn leaderboard(&self) -> anyhow::Result<Leaderboard>;
    async fn achievements(&self, user_id: Uuid) -> anyhow::Result<Achievements>;
    async fn stats(&self, user_id: Uuid) -> anyhow::Result<UserStats>;
}

pub struct StaticGamification;

#[async_trait]
impl GamificationRepository for StaticGamification {
    async fn leaderboard(&self) -> anyhow::Result<Leaderboard> {
        let leaderboard = [("user1", 100), ("user2", 75), ("user3", 50)]
            .into_iter()
            .zip(1..)
            .map(|((username, points), rank)| LeaderboardEntry {
                rank,
                username: username.into(),
                points,
            })
            .collect();
        Ok(Leaderboard { leaderboard })
    }

    async fn achievements(&self, _user_id: Uuid) -> anyhow::Result<Achievements> {
        Ok(Achievements {
            achievements: vec![
                Achievement {
                    id: "first-steps".into(),
                    title: "First Steps".into(),
                    description: "Complete your first Go challenge".into(),
                    unlocked: true,
                    unlocked_at: Some("2025-03-01T12:00:00Z".into()),
                },
                Achievement {
                    id: "syntax-master".into(),
                    title: "Syntax Master".into(),
                    description: "Complete all challenges in the Go Basics module".into(),
                    unlocked: false,
                    unlocked_at: None,
                },
            ],
        })
    }

    async fn stats(&self, _user_id: Uuid) -> anyhow::Result<UserStats> {
        Ok(UserStats {
            points: 75,
            level: 2,
            streak: 3,
            challenges: 5,
            achievements: 2,
        })
    }
}
