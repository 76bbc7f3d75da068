//! Todo endpoints and the ownership rules for listing them.

mod models;
mod service;
mod view;

pub use models::{CreateTodo, Pagination, Todo, TodoPage, UpdateTodo};
pub use service::TodoService;
pub use view::{rows, EditScope, TodoRow};
