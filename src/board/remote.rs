//! Gateway that talks to a `ledgerboard serve` instance over HTTP.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::api::{AddColumnRequest, AddTaskRequest, ErrorBody, MoveTaskRequest, PurgeResult};
use super::gateway::Gateway;
use super::models::*;
use crate::errors::{BoardError, BoardResult};

const ENTITIES: [&str; 5] = ["Board", "Column", "Task", "Client", "Notification"];

#[derive(Clone)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/users/{user_id}/{tail..}` with every segment percent-encoded.
    fn user_url(&self, user_id: &str, tail: &[&str]) -> BoardResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid board server URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Board server URL cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["api", "users"])
            .push(user_id)
            .extend(tail);
        Ok(url)
    }

    /// Send a request and translate error statuses. `subject` names the
    /// entity a 404 refers to when the server message cannot be parsed.
    async fn send(
        &self,
        request: RequestBuilder,
        subject: (&'static str, i64),
    ) -> BoardResult<Response> {
        let resp = request
            .send()
            .await
            .with_context(|| format!("Failed to reach board server at {}", self.base_url))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = resp
            .json::<ErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_else(|_| status.to_string());

        Err(match status {
            StatusCode::BAD_REQUEST => BoardError::Validation(message),
            StatusCode::NOT_FOUND => parse_not_found(&message).unwrap_or(BoardError::NotFound {
                entity: subject.0,
                id: subject.1,
            }),
            _ => BoardError::Persistence(anyhow::anyhow!(
                "Board server returned {}: {}",
                status,
                message
            )),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        subject: (&'static str, i64),
    ) -> BoardResult<T> {
        let resp = self.send(request, subject).await?;
        Ok(resp
            .json::<T>()
            .await
            .context("Failed to parse board server response")?)
    }
}

/// Recover the typed error from a "<Entity> <id> not found" message.
fn parse_not_found(message: &str) -> Option<BoardError> {
    let mut words = message.split_whitespace();
    let entity = words.next()?;
    let id = words.next()?.parse::<i64>().ok()?;
    let entity = ENTITIES.into_iter().find(|e| *e == entity)?;
    Some(BoardError::NotFound { entity, id })
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_board(&self, user_id: &str) -> BoardResult<Board> {
        let req = self
            .client
            .get(self.user_url(user_id, &["board"])?);
        self.send_json(req, ("Board", 0)).await
    }

    async fn add_column(&self, board_id: i64, title: &str, position: i32) -> BoardResult<Column> {
        let req = self
            .client
            .post(self.url(&format!("/api/boards/{}/columns", board_id)))
            .json(&AddColumnRequest {
                title: title.to_string(),
                position,
            });
        self.send_json(req, ("Board", board_id)).await
    }

    async fn update_column(&self, column_id: i64, update: ColumnUpdate) -> BoardResult<()> {
        let req = self
            .client
            .patch(self.url(&format!("/api/columns/{}", column_id)))
            .json(&update);
        self.send(req, ("Column", column_id)).await?;
        Ok(())
    }

    async fn delete_column(&self, column_id: i64) -> BoardResult<()> {
        let req = self
            .client
            .delete(self.url(&format!("/api/columns/{}", column_id)));
        self.send(req, ("Column", column_id)).await?;
        Ok(())
    }

    async fn add_task(&self, column_id: i64, task: NewTask, position: i32) -> BoardResult<Task> {
        let req = self
            .client
            .post(self.url(&format!("/api/columns/{}/tasks", column_id)))
            .json(&AddTaskRequest { task, position });
        self.send_json(req, ("Column", column_id)).await
    }

    async fn delete_task(&self, task_id: i64) -> BoardResult<()> {
        let req = self
            .client
            .delete(self.url(&format!("/api/tasks/{}", task_id)));
        self.send(req, ("Task", task_id)).await?;
        Ok(())
    }

    async fn move_task(&self, task_id: i64, column_id: i64, position: i32) -> BoardResult<()> {
        let req = self
            .client
            .patch(self.url(&format!("/api/tasks/{}/move", task_id)))
            .json(&MoveTaskRequest {
                column_id,
                position,
            });
        self.send(req, ("Task", task_id)).await?;
        Ok(())
    }

    async fn get_clients(&self, user_id: &str) -> BoardResult<Vec<Client>> {
        let req = self
            .client
            .get(self.user_url(user_id, &["clients"])?);
        self.send_json(req, ("Client", 0)).await
    }

    async fn add_client(&self, user_id: &str, client: ClientFields) -> BoardResult<Client> {
        let req = self
            .client
            .post(self.user_url(user_id, &["clients"])?)
            .json(&client);
        self.send_json(req, ("Client", 0)).await
    }

    async fn update_client(&self, client_id: i64, client: ClientFields) -> BoardResult<()> {
        let req = self
            .client
            .put(self.url(&format!("/api/clients/{}", client_id)))
            .json(&client);
        self.send(req, ("Client", client_id)).await?;
        Ok(())
    }

    async fn delete_client(&self, client_id: i64) -> BoardResult<()> {
        let req = self
            .client
            .delete(self.url(&format!("/api/clients/{}", client_id)));
        self.send(req, ("Client", client_id)).await?;
        Ok(())
    }

    async fn get_notifications(&self, user_id: &str) -> BoardResult<Vec<Notification>> {
        let req = self
            .client
            .get(self.user_url(user_id, &["notifications"])?);
        self.send_json(req, ("Notification", 0)).await
    }

    async fn add_notification(
        &self,
        user_id: &str,
        notification: NewNotification,
    ) -> BoardResult<Notification> {
        let req = self
            .client
            .post(self.user_url(user_id, &["notifications"])?)
            .json(&notification);
        self.send_json(req, ("Notification", 0)).await
    }

    async fn mark_as_read(&self, notification_id: i64) -> BoardResult<()> {
        let req = self.client.post(self.url(&format!(
            "/api/notifications/{}/read",
            notification_id
        )));
        self.send(req, ("Notification", notification_id)).await?;
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: &str) -> BoardResult<()> {
        let req = self
            .client
            .post(self.user_url(user_id, &["notifications", "read-all"])?);
        self.send(req, ("Notification", 0)).await?;
        Ok(())
    }

    async fn delete_older_than(&self, user_id: &str, days: u32) -> BoardResult<usize> {
        let req = self
            .client
            .delete(self.user_url(user_id, &["notifications"])?)
            .query(&[("older_than_days", days)]);
        let result: PurgeResult = self.send_json(req, ("Notification", 0)).await?;
        Ok(result.deleted)
    }
}
