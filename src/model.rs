#[cfg(feature = "ssr")]
use diesel::prelude::*;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accepted answers for a task. The store may hold a plain string, a JSON array, or a string that
/// itself contains a JSON-encoded array. Numbers and other scalars are read as their text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskPassword {
    Many(Vec<String>),
    One(String),
}

impl Default for TaskPassword {
    fn default() -> Self {
        TaskPassword::One(String::new())
    }
}

impl<'de> Deserialize<'de> for TaskPassword {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => TaskPassword::default(),
            Value::Array(items) => TaskPassword::Many(items.into_iter().map(scalar_text).collect()),
            other => TaskPassword::One(scalar_text(other)),
        })
    }
}

fn scalar_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

impl TaskPassword {
    /// Parses the raw text form used by the SQLite store.
    pub fn from_text(raw: &str) -> Self {
        match serde_json::from_str::<Vec<String>>(raw) {
            Ok(list) => TaskPassword::Many(list),
            Err(_) => TaskPassword::One(raw.to_string()),
        }
    }

    /// Returns every accepted answer, expanding a JSON-encoded list stored as a single string.
    pub fn accepted(&self) -> Vec<String> {
        match self {
            TaskPassword::Many(list) => list.clone(),
            TaskPassword::One(raw) => match TaskPassword::from_text(raw) {
                TaskPassword::Many(list) => list,
                TaskPassword::One(single) => vec![single],
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub points: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub password: TaskPassword,
    #[serde(default = "default_active", deserialize_with = "null_as_active")]
    pub active: bool,
}

impl Task {
    pub fn tile(&self) -> TaskTile {
        TaskTile {
            id: self.id,
            points: self.points,
            active: self.active,
        }
    }
}

/// What the browser gets to see of a task. Passwords stay on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTile {
    pub id: i32,
    pub points: i32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub team: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_tasks: Vec<i32>,
}

impl ScoreboardEntry {
    pub fn has_completed(&self, task_id: i32) -> bool {
        self.completed_tasks.contains(&task_id)
    }
}

fn default_active() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_active<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

// Row shapes for the SQLite store. JSON-ish columns are kept as text and converted on the way in
// and out.

#[cfg(feature = "ssr")]
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::task)]
pub struct DbTask {
    pub id: i32,
    pub points: i32,
    pub password: Option<String>,
    pub active: Option<bool>,
}

#[cfg(feature = "ssr")]
impl From<DbTask> for Task {
    fn from(row: DbTask) -> Self {
        Task {
            id: row.id,
            points: row.points,
            password: row
                .password
                .as_deref()
                .map(TaskPassword::from_text)
                .unwrap_or_default(),
            active: row.active.unwrap_or(true),
        }
    }
}

#[cfg(feature = "ssr")]
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::task)]
pub struct NewDbTask {
    pub id: i32,
    pub points: i32,
    pub password: Option<String>,
    pub active: Option<bool>,
}

#[cfg(feature = "ssr")]
impl From<&Task> for NewDbTask {
    fn from(task: &Task) -> Self {
        let password = match &task.password {
            TaskPassword::One(raw) => raw.clone(),
            TaskPassword::Many(list) => {
                serde_json::to_string(list).unwrap_or_else(|_| String::from("[]"))
            }
        };
        NewDbTask {
            id: task.id,
            points: task.points,
            password: Some(password),
            active: Some(task.active),
        }
    }
}

#[cfg(feature = "ssr")]
#[derive(Queryable, Selectable, Insertable, Debug)]
#[diesel(table_name = crate::schema::scoreboard)]
pub struct DbScoreboardEntry {
    pub team: String,
    pub score: i32,
    pub completed_tasks: Option<String>,
}

#[cfg(feature = "ssr")]
impl From<DbScoreboardEntry> for ScoreboardEntry {
    fn from(row: DbScoreboardEntry) -> Self {
        let completed_tasks = row
            .completed_tasks
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Option<Vec<i32>>>(raw).ok())
            .flatten()
            .unwrap_or_default();
        ScoreboardEntry {
            team: row.team,
            score: row.score,
            completed_tasks,
        }
    }
}

#[cfg(feature = "ssr")]
impl From<&ScoreboardEntry> for DbScoreboardEntry {
    fn from(entry: &ScoreboardEntry) -> Self {
        DbScoreboardEntry {
            team: entry.team.clone(),
            score: entry.score,
            completed_tasks: serde_json::to_string(&entry.completed_tasks).ok(),
        }
    }
}
