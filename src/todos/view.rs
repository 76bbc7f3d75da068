use std::collections::HashSet;

use uuid::Uuid;

use super::models::Todo;

/// Which todos in a listing the current user may change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditScope {
    /// Every row is the user's own ("my todos" listing).
    All,
    /// Only rows whose id is in the user's own todo ids (shared listing).
    Owned(HashSet<Uuid>),
}

impl EditScope {
    /// Scope for a shared listing, built from the user's own todos.
    pub fn owned_from(my_todos: &[Todo]) -> Self {
        EditScope::Owned(my_todos.iter().map(|todo| todo.id).collect())
    }

    pub fn allows(&self, todo: &Todo) -> bool {
        match self {
            EditScope::All => true,
            EditScope::Owned(ids) => ids.contains(&todo.id),
        }
    }
}

/// A todo as listed, with whether edit controls apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoRow {
    pub todo: Todo,
    pub editable: bool,
}

pub fn rows(todos: Vec<Todo>, scope: &EditScope) -> Vec<TodoRow> {
    todos
        .into_iter()
        .map(|todo| {
            let editable = scope.allows(&todo);
            TodoRow { todo, editable }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn todo(title: &str) -> Todo {
        let now = Utc::now();
        Todo {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            completed: false,
            is_public: true,
            due_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_all_scope_edits_everything() {
        let listed = rows(vec![todo("a"), todo("b")], &EditScope::All);
        assert!(listed.iter().all(|row| row.editable));
    }

    #[test]
    fn test_owned_scope_only_edits_own_rows() {
        let mine = todo("mine");
        let theirs = todo("theirs");
        let scope = EditScope::owned_from(std::slice::from_ref(&mine));

        let listed = rows(vec![theirs.clone(), mine.clone()], &scope);
        assert_eq!(listed[0].todo, theirs);
        assert!(!listed[0].editable);
        assert_eq!(listed[1].todo, mine);
        assert!(listed[1].editable);
    }

    #[test]
    fn test_empty_owned_scope() {
        let listed = rows(vec![todo("x")], &EditScope::Owned(HashSet::new()));
        assert!(!listed[0].editable);
    }
}
