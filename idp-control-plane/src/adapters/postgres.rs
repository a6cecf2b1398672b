//! Postgres-backed Team store.
//!
//! Teams are the only entity persisted durably in production today; the other
//! kinds stay in memory. Swapping this in for the memory variant must not
//! change observable command semantics, which is why it implements the exact
//! same [`TeamRepository`] contract.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS teams (
//!     id         TEXT PRIMARY KEY,
//!     name       TEXT NOT NULL,
//!     state      TEXT NOT NULL,
//!     created_by TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::application::{RepoResult, RepositoryError, TeamRepository};
use crate::domain::{Metadata, Team, TeamState};

pub struct PgTeamRepository {
    pool: PgPool,
}

impl PgTeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects and verifies reachability with a ping query. Callers fall back
    /// to the memory store when this fails.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl TeamRepository for PgTeamRepository {
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Team>> {
        let row = sqlx::query(
            "SELECT id, name, state, created_by, created_at FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError(format!("loading team: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state: String = row
            .try_get("state")
            .map_err(|e| RepositoryError(format!("scanning team state: {e}")))?;
        let state: TeamState = state
            .parse()
            .map_err(|e: String| RepositoryError(format!("scanning team state: {e}")))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| RepositoryError(format!("scanning team created_at: {e}")))?;

        Ok(Some(Team {
            id: row
                .try_get("id")
                .map_err(|e| RepositoryError(format!("scanning team id: {e}")))?,
            name: row
                .try_get("name")
                .map_err(|e| RepositoryError(format!("scanning team name: {e}")))?,
            state,
            metadata: Metadata {
                created_by: row
                    .try_get("created_by")
                    .map_err(|e| RepositoryError(format!("scanning team created_by: {e}")))?,
                created_at,
                tags: None,
            },
        }))
    }

    async fn save(&self, team: &Team) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO teams (id, name, state, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE \
             SET name = EXCLUDED.name, \
                 state = EXCLUDED.state",
        )
        .bind(&team.id)
        .bind(&team.name)
        .bind(team.state.to_string())
        .bind(&team.metadata.created_by)
        .bind(team.metadata.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError(format!("saving team: {e}")))?;

        Ok(())
    }
}
