use serde::{Deserialize, Serialize};

use crate::answer::is_correct;
use crate::model::ScoreboardEntry;
use crate::store::{EventStore, StoreError};

/// Points taken from a team with an existing row for every wrong password.
pub const WRONG_ANSWER_PENALTY: i32 = 1;

/// How long the success message stays up before the modal closes.
pub const CLOSE_DELAY_MS: u32 = 1000;

/// The result of pressing "Send" in the task modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionOutcome {
    MissingTeam,
    MissingPassword,
    TaskNotFound,
    TaskInactive,
    Incorrect { penalized: bool },
    AlreadyCompleted,
    Correct { points: i32, team: String },
}

impl SubmissionOutcome {
    pub fn message(&self) -> String {
        match self {
            SubmissionOutcome::MissingTeam => "Please enter your team name first.".to_string(),
            SubmissionOutcome::MissingPassword => "Please enter a password.".to_string(),
            SubmissionOutcome::TaskNotFound => "Task not found. Please try again.".to_string(),
            SubmissionOutcome::TaskInactive => "This task is not open right now.".to_string(),
            SubmissionOutcome::Incorrect { penalized: true } => format!(
                "Incorrect password. Try again. (-{} point)",
                WRONG_ANSWER_PENALTY
            ),
            SubmissionOutcome::Incorrect { penalized: false } => {
                "Incorrect password. Try again.".to_string()
            }
            SubmissionOutcome::AlreadyCompleted => {
                "You have already completed this task.".to_string()
            }
            SubmissionOutcome::Correct { points, team } => {
                format!("✅ Correct! +{} points awarded to {}.", points, team)
            }
        }
    }

    /// Only a fresh correct answer closes the modal.
    pub fn closes_modal(&self) -> bool {
        matches!(self, SubmissionOutcome::Correct { .. })
    }
}

/// Blank-field checks, run in the browser before any round trip and again on the server.
pub fn check_fields(team: &str, password: &str) -> Option<SubmissionOutcome> {
    if team.trim().is_empty() {
        Some(SubmissionOutcome::MissingTeam)
    } else if password.trim().is_empty() {
        Some(SubmissionOutcome::MissingPassword)
    } else {
        None
    }
}

/// Checks a password for a task and updates the team's scoreboard row.
///
/// A wrong password costs a team with an existing row [`WRONG_ANSWER_PENALTY`] points; a team
/// without a row is left without one. A correct password for a task the team already completed
/// changes nothing. Otherwise the task's points are added and its id recorded, creating the row on
/// the team's first correct answer.
pub fn submit_answer(
    store: &mut dyn EventStore,
    team: &str,
    task_id: i32,
    password: &str,
) -> Result<SubmissionOutcome, StoreError> {
    if let Some(rejected) = check_fields(team, password) {
        return Ok(rejected);
    }
    let team = team.trim();

    // Re-fetch the task so a stale tile can't be scored against old values.
    let Some(task) = store.task(task_id)? else {
        return Ok(SubmissionOutcome::TaskNotFound);
    };
    if !task.active {
        return Ok(SubmissionOutcome::TaskInactive);
    }

    let correct = is_correct(password, &task.password);
    let existing = store.entry(team)?;

    if !correct {
        let penalized = match existing {
            Some(mut entry) => {
                entry.score = entry.score.saturating_sub(WRONG_ANSWER_PENALTY);
                store.update_entry(&entry)?;
                true
            }
            None => false,
        };
        return Ok(SubmissionOutcome::Incorrect { penalized });
    }

    match existing {
        Some(entry) if entry.has_completed(task.id) => Ok(SubmissionOutcome::AlreadyCompleted),
        Some(mut entry) => {
            entry.score = entry.score.saturating_add(task.points);
            entry.completed_tasks.push(task.id);
            store.update_entry(&entry)?;
            Ok(SubmissionOutcome::Correct {
                points: task.points,
                team: team.to_string(),
            })
        }
        None => {
            store.insert_entry(&ScoreboardEntry {
                team: team.to_string(),
                score: task.points,
                completed_tasks: vec![task.id],
            })?;
            Ok(SubmissionOutcome::Correct {
                points: task.points,
                team: team.to_string(),
            })
        }
    }
}
