use tracing::{debug, info};
use uuid::Uuid;

use super::models::{CreateTodo, Pagination, Todo, TodoPage, UpdateTodo};
use super::view::TodoRow;
use crate::api::{ApiClient, RequestSpec};
use crate::error::{AppError, AuthError};
use crate::Result;

const OWNERSHIP_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct TodoService {
    client: ApiClient,
}

impl TodoService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// The caller's own todos.
    pub async fn list_mine(&self, page: Pagination) -> Result<TodoPage> {
        self.client.get_json(paged(RequestSpec::get("/todos"), page)).await
    }

    /// Every one of the caller's todos, fetched page by page.
    pub async fn all_mine(&self) -> Result<Vec<Todo>> {
        let mut page = Pagination {
            limit: OWNERSHIP_PAGE_SIZE,
            offset: 0,
        };
        let mut all = Vec::new();
        loop {
            let TodoPage { todos, total } = self.list_mine(page).await?;
            let fetched = todos.len();
            all.extend(todos);

            let done = match total {
                Some(total) => all.len() as u64 >= total,
                None => (fetched as u32) < page.limit,
            };
            if done || fetched == 0 {
                break;
            }
            page.offset += fetched as u32;
        }
        debug!(count = all.len(), "Fetched own todos");
        Ok(all)
    }

    /// Todos shared with the whole team, the caller's included.
    pub async fn list_public(&self, page: Pagination) -> Result<TodoPage> {
        self.client
            .get_json(paged(RequestSpec::get("/todos/public"), page))
            .await
    }

    pub async fn get(&self, id: Uuid) -> Result<Todo> {
        self.client.get_json(RequestSpec::get(todo_path(id))).await
    }

    pub async fn create(&self, input: CreateTodo) -> Result<Todo> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("Title is required".into()));
        }
        let input = CreateTodo {
            title: title.to_string(),
            ..input
        };

        let todo: Todo = self
            .client
            .send_json(RequestSpec::post("/todos"), &input)
            .await?;
        info!(todo_id = %todo.id, public = todo.is_public, "Created todo");
        Ok(todo)
    }

    pub async fn update(&self, id: Uuid, update: UpdateTodo) -> Result<Todo> {
        if update.is_empty() {
            return Err(AppError::ValidationError("Nothing to update".into()));
        }
        if matches!(update.title.as_deref(), Some(title) if title.trim().is_empty()) {
            return Err(AppError::ValidationError("Title must not be empty".into()));
        }

        let todo = self
            .client
            .send_json(RequestSpec::patch(todo_path(id)), &update)
            .await?;
        debug!(todo_id = %id, "Updated todo");
        Ok(todo)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.client.delete(&todo_path(id)).await?;
        info!(todo_id = %id, "Deleted todo");
        Ok(())
    }

    pub async fn toggle_complete(&self, row: &TodoRow) -> Result<Todo> {
        let todo = editable(row)?;
        self.update(
            todo.id,
            UpdateTodo {
                completed: Some(!todo.completed),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn toggle_public(&self, row: &TodoRow) -> Result<Todo> {
        let todo = editable(row)?;
        self.update(
            todo.id,
            UpdateTodo {
                is_public: Some(!todo.is_public),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn remove(&self, row: &TodoRow) -> Result<()> {
        let todo = editable(row)?;
        self.delete(todo.id).await
    }
}

// Non-owners never reach the network.
fn editable(row: &TodoRow) -> Result<&Todo> {
    if row.editable {
        Ok(&row.todo)
    } else {
        Err(AuthError::NotOwner.into())
    }
}

fn todo_path(id: Uuid) -> String {
    format!("/todos/{}", id)
}

fn paged(spec: RequestSpec, page: Pagination) -> RequestSpec {
    spec.query("limit", page.limit).query("offset", page.offset)
}
