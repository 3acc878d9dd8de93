use thiserror::Error;

use crate::model::{ScoreboardEntry, Task};

#[cfg(feature = "ssr")]
mod rest;
#[cfg(feature = "ssr")]
mod sqlite;

#[cfg(feature = "ssr")]
pub use rest::RestStore;
#[cfg(feature = "ssr")]
pub use sqlite::{establish_connection, init_schema, load_tasks, DbPool, SqliteOptions};
#[cfg(all(test, feature = "ssr"))]
pub(crate) use sqlite::tests as sqlite_test_support;

#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "ssr")]
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[cfg(feature = "ssr")]
    #[error("could not connect to database: {0}")]
    Connect(#[from] diesel::ConnectionError),

    #[cfg(feature = "ssr")]
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[cfg(feature = "ssr")]
    #[error("request to data API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("data API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("could not decode row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no scoreboard row for team {0:?}")]
    MissingTeam(String),
}

/// The handful of queries the event needs from its backing tables.
pub trait EventStore {
    /// All scoreboard rows, highest score first.
    fn scoreboard(&mut self) -> Result<Vec<ScoreboardEntry>, StoreError>;

    /// All tasks, lowest id first.
    fn tasks(&mut self) -> Result<Vec<Task>, StoreError>;

    fn task(&mut self, id: i32) -> Result<Option<Task>, StoreError>;

    /// The row whose team name matches exactly, if any.
    fn entry(&mut self, team: &str) -> Result<Option<ScoreboardEntry>, StoreError>;

    fn insert_entry(&mut self, entry: &ScoreboardEntry) -> Result<(), StoreError>;

    /// Overwrites score and completed tasks of the row matching `entry.team`.
    fn update_entry(&mut self, entry: &ScoreboardEntry) -> Result<(), StoreError>;

    /// Deletes every scoreboard row. Returns the number of rows removed when known.
    fn clear_scoreboard(&mut self) -> Result<usize, StoreError>;
}

/// Orders rows by score descending, then team name, so the rendered ranking never goes up.
pub fn rank(mut entries: Vec<ScoreboardEntry>) -> Vec<ScoreboardEntry> {
    entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.team.cmp(&b.team)));
    entries
}

/// Either backing store, chosen at startup.
#[cfg(feature = "ssr")]
#[derive(Clone)]
pub enum Backend {
    Sqlite(DbPool),
    Rest(RestStore),
}

#[cfg(feature = "ssr")]
impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite(_) => "SQLite",
            Backend::Rest(_) => "hosted REST",
        }
    }

    /// Runs `f` against the store. With SQLite the whole closure is one immediate transaction, so
    /// a read-then-write sequence can't interleave with another submission.
    pub fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut dyn EventStore) -> Result<T, StoreError>,
    {
        match self {
            Backend::Sqlite(pool) => {
                let mut conn = pool.get()?;
                conn.immediate_transaction(|conn| f(conn))
            }
            Backend::Rest(rest) => f(&mut rest.clone()),
        }
    }
}

/// In-memory store for exercising game logic without a database.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub tasks: Vec<Task>,
    pub rows: Vec<ScoreboardEntry>,
    pub fail_writes: bool,
}

#[cfg(test)]
impl EventStore for MemoryStore {
    fn scoreboard(&mut self) -> Result<Vec<ScoreboardEntry>, StoreError> {
        Ok(rank(self.rows.clone()))
    }

    fn tasks(&mut self) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.tasks.clone();
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    fn task(&mut self, id: i32) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.iter().find(|t| t.id == id).cloned())
    }

    fn entry(&mut self, team: &str) -> Result<Option<ScoreboardEntry>, StoreError> {
        Ok(self.rows.iter().find(|r| r.team == team).cloned())
    }

    fn insert_entry(&mut self, entry: &ScoreboardEntry) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.rows.push(entry.clone());
        Ok(())
    }

    fn update_entry(&mut self, entry: &ScoreboardEntry) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.team == entry.team)
            .ok_or_else(|| StoreError::MissingTeam(entry.team.clone()))?;
        *row = entry.clone();
        Ok(())
    }

    fn clear_scoreboard(&mut self) -> Result<usize, StoreError> {
        let removed = self.rows.len();
        self.rows.clear();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(team: &str, score: i32) -> ScoreboardEntry {
        ScoreboardEntry {
            team: team.to_string(),
            score,
            completed_tasks: vec![],
        }
    }

    #[test]
    fn test_rank_non_increasing() {
        let ranked = rank(vec![
            entry("Elves", 10),
            entry("Yeti", 50),
            entry("Grinch", -3),
            entry("Carolers", 50),
            entry("Sleigh", 0),
        ]);
        let teams: Vec<&str> = ranked.iter().map(|e| e.team.as_str()).collect();
        assert_eq!(teams, vec!["Carolers", "Yeti", "Elves", "Sleigh", "Grinch"]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(vec![]).is_empty());
    }
}
