use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::SqliteConnection;

use super::{EventStore, StoreError};
use crate::model::{DbScoreboardEntry, DbTask, NewDbTask, ScoreboardEntry, Task};
use crate::schema::{scoreboard, task};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

// Enable WAL mode to allow concurrent reads during writes, and a timeout to retry locked
// operations.
const PRAGMAS: &str = "PRAGMA journal_mode = WAL; \
    PRAGMA synchronous = NORMAL; \
    PRAGMA busy_timeout = 10000;";

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS task ( \
        id INTEGER PRIMARY KEY NOT NULL, \
        points INTEGER NOT NULL DEFAULT 0, \
        password TEXT, \
        active BOOLEAN DEFAULT 1 \
    ); \
    CREATE TABLE IF NOT EXISTS scoreboard ( \
        team TEXT PRIMARY KEY NOT NULL, \
        score INTEGER NOT NULL DEFAULT 0, \
        completed_tasks TEXT \
    );";

/// Applies the connection PRAGMAs and the schema to every new pooled connection. An in-memory
/// database is private to its connection, so each one needs its own tables.
#[derive(Debug, Clone, Copy)]
pub struct SqliteOptions;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqliteOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(PRAGMAS)
            .and_then(|_| conn.batch_execute(SCHEMA))
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn establish_connection(database_url: &str) -> Result<SqliteConnection, StoreError> {
    let mut conn = SqliteConnection::establish(database_url)?;
    conn.batch_execute(PRAGMAS)?;
    Ok(conn)
}

/// Creates both tables if they don't exist yet.
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    conn.batch_execute(SCHEMA)?;
    Ok(())
}

/// Replaces the task table with the given tasks. Returns the number of rows written.
pub fn load_tasks(conn: &mut SqliteConnection, tasks: &[Task]) -> Result<usize, StoreError> {
    conn.transaction(|conn| {
        diesel::delete(task::table).execute(conn)?;
        if tasks.is_empty() {
            return Ok(0);
        }
        let rows: Vec<NewDbTask> = tasks.iter().map(NewDbTask::from).collect();
        let written = diesel::insert_into(task::table)
            .values(&rows)
            .execute(conn)?;
        Ok(written)
    })
}

impl EventStore for SqliteConnection {
    fn scoreboard(&mut self) -> Result<Vec<ScoreboardEntry>, StoreError> {
        let rows: Vec<DbScoreboardEntry> = scoreboard::table
            .order((scoreboard::score.desc(), scoreboard::team.asc()))
            .select(DbScoreboardEntry::as_select())
            .load(self)?;
        Ok(rows.into_iter().map(ScoreboardEntry::from).collect())
    }

    fn tasks(&mut self) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<DbTask> = task::table
            .order(task::id.asc())
            .select(DbTask::as_select())
            .load(self)?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    fn task(&mut self, id: i32) -> Result<Option<Task>, StoreError> {
        let row: Option<DbTask> = task::table
            .filter(task::id.eq(id))
            .select(DbTask::as_select())
            .first(self)
            .optional()?;
        Ok(row.map(Task::from))
    }

    fn entry(&mut self, team: &str) -> Result<Option<ScoreboardEntry>, StoreError> {
        let row: Option<DbScoreboardEntry> = scoreboard::table
            .filter(scoreboard::team.eq(team))
            .select(DbScoreboardEntry::as_select())
            .first(self)
            .optional()?;
        Ok(row.map(ScoreboardEntry::from))
    }

    fn insert_entry(&mut self, entry: &ScoreboardEntry) -> Result<(), StoreError> {
        diesel::insert_into(scoreboard::table)
            .values(DbScoreboardEntry::from(entry))
            .execute(self)?;
        Ok(())
    }

    fn update_entry(&mut self, entry: &ScoreboardEntry) -> Result<(), StoreError> {
        let row = DbScoreboardEntry::from(entry);
        let updated = diesel::update(scoreboard::table.filter(scoreboard::team.eq(&row.team)))
            .set((
                scoreboard::score.eq(row.score),
                scoreboard::completed_tasks.eq(row.completed_tasks),
            ))
            .execute(self)?;
        if updated == 0 {
            return Err(StoreError::MissingTeam(entry.team.clone()));
        }
        Ok(())
    }

    fn clear_scoreboard(&mut self) -> Result<usize, StoreError> {
        Ok(diesel::delete(scoreboard::table).execute(self)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::TaskPassword;

    // Helper to run a test against a fresh in-memory database inside a transaction. The
    // transaction is always rolled back at the end of the test.
    pub(crate) fn run_test_in_transaction<F>(test_fn: F)
    where
        F: FnOnce(&mut SqliteConnection) -> Result<(), StoreError>,
    {
        let mut conn = establish_connection(":memory:").expect("in-memory database");
        init_schema(&mut conn).expect("schema");
        let _result: Result<(), StoreError> = conn.transaction(|conn| {
            // Run the test. Propagate real errors.
            test_fn(conn)?;
            // Force rollback on test success by returning an error.
            Err(diesel::result::Error::RollbackTransaction.into())
        });
        // Ignore the returned error. If the test failed, we would've already panicked.
    }

    pub(crate) fn sample_tasks() -> Vec<Task> {
        vec![
            Task {
                id: 3,
                points: 50,
                password: TaskPassword::Many(vec!["Rudolf".to_string(), "Reindeer".to_string()]),
                active: true,
            },
            Task {
                id: 1,
                points: 10,
                password: TaskPassword::One("SnowAngel".to_string()),
                active: true,
            },
            Task {
                id: 2,
                points: 20,
                password: TaskPassword::One("Mistletoe".to_string()),
                active: false,
            },
        ]
    }

    #[test]
    fn test_load_and_read_tasks() {
        run_test_in_transaction(|conn| {
            assert_eq!(load_tasks(conn, &sample_tasks())?, 3);

            let tasks = conn.tasks()?;
            let ids: Vec<i32> = tasks.iter().map(|t| t.id).collect();
            assert_eq!(ids, vec![1, 2, 3]);
            assert!(!tasks[1].active);
            assert_eq!(
                tasks[2].password.accepted(),
                vec!["Rudolf".to_string(), "Reindeer".to_string()]
            );

            let task = conn.task(1)?.expect("task 1");
            assert_eq!(task.points, 10);
            assert!(conn.task(99)?.is_none());

            // Loading again replaces the table.
            assert_eq!(load_tasks(conn, &sample_tasks()[..1])?, 1);
            assert_eq!(conn.tasks()?.len(), 1);

            Ok(())
        });
    }

    #[test]
    fn test_null_columns() {
        run_test_in_transaction(|conn| {
            conn.batch_execute(
                "INSERT INTO task (id, points, password, active) VALUES (7, 5, NULL, NULL); \
                 INSERT INTO scoreboard (team, score, completed_tasks) VALUES ('Yeti', 50, NULL);",
            )?;

            let task = conn.task(7)?.expect("task 7");
            assert!(task.active);
            assert!(task.password.accepted().iter().all(|a| a.is_empty()));

            let entry = conn.entry("Yeti")?.expect("Yeti");
            assert_eq!(entry.score, 50);
            assert!(entry.completed_tasks.is_empty());

            Ok(())
        });
    }

    #[test]
    fn test_scoreboard_order() {
        run_test_in_transaction(|conn| {
            for (team, score) in [("Elves", 10), ("Yeti", 50), ("Grinch", -1), ("Carolers", 50)] {
                conn.insert_entry(&ScoreboardEntry {
                    team: team.to_string(),
                    score,
                    completed_tasks: vec![],
                })?;
            }

            let rows = conn.scoreboard()?;
            let teams: Vec<&str> = rows.iter().map(|r| r.team.as_str()).collect();
            assert_eq!(teams, vec!["Carolers", "Yeti", "Elves", "Grinch"]);

            Ok(())
        });
    }

    #[test]
    fn test_entry_insert_update() {
        run_test_in_transaction(|conn| {
            assert!(conn.entry("Yeti")?.is_none());

            let mut entry = ScoreboardEntry {
                team: "Yeti".to_string(),
                score: 50,
                completed_tasks: vec![3],
            };
            conn.insert_entry(&entry)?;
            assert_eq!(conn.entry("Yeti")?, Some(entry.clone()));

            // Team names match exactly.
            assert!(conn.entry("yeti")?.is_none());
            assert!(conn.entry("Yeti ")?.is_none());

            entry.score = 60;
            entry.completed_tasks.push(1);
            conn.update_entry(&entry)?;
            assert_eq!(conn.entry("Yeti")?, Some(entry));

            // Inserting the same team twice violates the key.
            let err = conn
                .insert_entry(&ScoreboardEntry {
                    team: "Yeti".to_string(),
                    score: 0,
                    completed_tasks: vec![],
                })
                .expect_err("duplicate team");
            assert!(matches!(err, StoreError::Database(_)));

            // Updating a team without a row is an error, not a silent no-op.
            let err = conn
                .update_entry(&ScoreboardEntry {
                    team: "Ghost".to_string(),
                    score: -1,
                    completed_tasks: vec![],
                })
                .expect_err("missing team");
            assert!(matches!(err, StoreError::MissingTeam(_)));

            Ok(())
        });
    }

    #[test]
    fn test_clear_scoreboard() {
        run_test_in_transaction(|conn| {
            for team in ["Elves", "Yeti"] {
                conn.insert_entry(&ScoreboardEntry {
                    team: team.to_string(),
                    score: 1,
                    completed_tasks: vec![],
                })?;
            }
            assert_eq!(conn.clear_scoreboard()?, 2);
            assert!(conn.scoreboard()?.is_empty());

            Ok(())
        });
    }
}
