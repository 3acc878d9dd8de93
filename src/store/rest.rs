use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::{EventStore, StoreError};
use crate::model::{ScoreboardEntry, Task};

/// Client for the hosted data API, which exposes each table under `/rest/v1/<table>` and takes
/// row filters as query parameters (`team=eq.Yeti`, `order=score.desc`).
///
/// The blocking client must be created and used off the async runtime. The server builds it inside
/// `spawn_blocking` and only touches it from store closures.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(project_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: table_base(project_url),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let request = self
            .client
            .get(self.table_url(table))
            .query(&[("select", "*")])
            .query(query);
        let body = checked(self.authorize(request).send()?)?.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Normalizes the project URL into the base for table endpoints.
fn table_base(project_url: &str) -> String {
    let trimmed = project_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/rest/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/rest/v1")
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

fn checked(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StoreError::Api {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        })
    }
}

impl EventStore for RestStore {
    fn scoreboard(&mut self) -> Result<Vec<ScoreboardEntry>, StoreError> {
        self.select(
            "scoreboard",
            &[("order", String::from("score.desc,team.asc"))],
        )
    }

    fn tasks(&mut self) -> Result<Vec<Task>, StoreError> {
        self.select("task", &[("order", String::from("id.asc"))])
    }

    fn task(&mut self, id: i32) -> Result<Option<Task>, StoreError> {
        let rows: Vec<Task> = self.select("task", &[("id", eq(id))])?;
        Ok(rows.into_iter().next())
    }

    fn entry(&mut self, team: &str) -> Result<Option<ScoreboardEntry>, StoreError> {
        let rows: Vec<ScoreboardEntry> = self.select("scoreboard", &[("team", eq(team))])?;
        Ok(rows.into_iter().next())
    }

    fn insert_entry(&mut self, entry: &ScoreboardEntry) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table_url("scoreboard"))
            .header("Prefer", "return=minimal")
            .json(entry);
        checked(self.authorize(request).send()?)?;
        Ok(())
    }

    fn update_entry(&mut self, entry: &ScoreboardEntry) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.table_url("scoreboard"))
            .query(&[("team", eq(&entry.team))])
            .header("Prefer", "return=representation")
            .json(&json!({
                "score": entry.score,
                "completed_tasks": entry.completed_tasks,
            }));
        let body = checked(self.authorize(request).send()?)?.text()?;
        let updated: Vec<ScoreboardEntry> = serde_json::from_str(&body)?;
        if updated.is_empty() {
            return Err(StoreError::MissingTeam(entry.team.clone()));
        }
        Ok(())
    }

    fn clear_scoreboard(&mut self) -> Result<usize, StoreError> {
        // The API refuses unfiltered deletes, so match every row explicitly.
        let request = self
            .client
            .delete(self.table_url("scoreboard"))
            .query(&[("team", "not.is.null")])
            .header("Prefer", "return=representation");
        let body = checked(self.authorize(request).send()?)?.text()?;
        let removed: Vec<serde_json::Value> = serde_json::from_str(&body)?;
        Ok(removed.len())
    }
}
