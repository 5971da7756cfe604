//! # View projection: what is visible right now
//!
//! [`project`] is a pure function of an [`EntityStore`] and a [`ViewState`]. It
//! never mutates either; a renderer calls it after every event and draws the
//! resulting [`DirectoryModel`].
//!
//! ## Rules
//!
//! | Rule | Behaviour |
//! |------|-----------|
//! | Search | case-insensitive substring match on name or email; empty query keeps everyone; order preserved |
//! | Nested panel | todos and posts are projected only for expanded rows |
//! | Extra panel | address buffers are projected only while the panel is shown |
//! | Post bodies | cut to [`BODY_PREVIEW_CHARS`] characters, no ellipsis |
//! | Completed label | `"True"` / `"False"`: the boolean's string form with its first character uppercased |
//! | Tone | a row is [`CompletionTone::Complete`] while every todo of the user is completed |

use serde::Serialize;
use store::{EntityStore, Post, RecordKey, Todo, User, UserId};

use crate::view_state::{DraftPanel, ExtraPanel, RowState, UserView, ViewState};

/// Post bodies longer than this are cut for display.
pub const BODY_PREVIEW_CHARS: usize = 50;

/// Case-insensitive substring match of `query` against name or email.
pub fn matches_search(user: &User, query: &str) -> bool {
    let query = query.to_lowercase();
    user.name.to_lowercase().contains(&query) || user.email.to_lowercase().contains(&query)
}

/// Users matching `query`, in their original relative order.
pub fn filter_users<'a>(users: impl IntoIterator<Item = &'a User>, query: &str) -> Vec<&'a User> {
    users
        .into_iter()
        .filter(|user| matches_search(user, query))
        .collect()
}

/// Uppercase the first character only: `"true"` becomes `"True"`.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn completed_label(completed: bool) -> String {
    capitalize_first(&completed.to_string())
}

/// The first [`BODY_PREVIEW_CHARS`] characters of `body`.
pub fn truncate_body(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}

/// Border tone of a user row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionTone {
    Complete,
    Incomplete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TodoRow {
    #[serde(skip)]
    pub key: RecordKey,
    pub title: String,
    pub completed_label: String,
    /// Whether the "mark completed" action is offered.
    pub can_mark_completed: bool,
}

impl From<&Todo> for TodoRow {
    fn from(todo: &Todo) -> Self {
        Self {
            key: todo.id,
            title: todo.title.clone(),
            completed_label: completed_label(todo.completed),
            can_mark_completed: !todo.completed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostRow {
    #[serde(skip)]
    pub key: RecordKey,
    pub title: String,
    pub body: String,
}

impl From<&Post> for PostRow {
    fn from(post: &Post) -> Self {
        Self {
            key: post.id,
            title: post.title.clone(),
            body: truncate_body(&post.body),
        }
    }
}

/// The add form currently open under a row, with its typed input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftForm {
    Closed,
    Todo { title: String },
    Post { title: String, body: String },
}

/// Todos and posts of an expanded row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NestedPanel {
    pub todos: Vec<TodoRow>,
    pub posts: Vec<PostRow>,
    pub draft_form: DraftForm,
}

/// Address edit buffers, visible while the extra panel is shown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AddressFields {
    pub street: String,
    pub city: String,
    pub zipcode: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub id: UserId,
    /// Name edit buffer.
    pub name: String,
    /// Email edit buffer.
    pub email: String,
    pub tone: CompletionTone,
    /// Expanded rows are highlighted.
    pub highlighted: bool,
    pub extra: Option<AddressFields>,
    pub nested: Option<NestedPanel>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewUserFields {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DirectoryModel {
    pub search: String,
    pub rows: Vec<UserRow>,
    pub new_user_form: Option<NewUserFields>,
}

impl DirectoryModel {
    pub fn row(&self, id: UserId) -> Option<&UserRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn visible_ids(&self) -> Vec<UserId> {
        self.rows.iter().map(|row| row.id).collect()
    }
}

/// Derive the render model.
pub fn project(store: &EntityStore, view: &ViewState) -> DirectoryModel {
    let rows = filter_users(store.list_users(), view.search())
        .into_iter()
        .map(|user| match view.user(user.id) {
            Some(user_view) => project_row(store, user, user_view),
            None => project_row(store, user, &UserView::for_user(user)),
        })
        .collect();

    let form = view.new_user_form();
    DirectoryModel {
        search: view.search().to_string(),
        rows,
        new_user_form: form.open.then(|| NewUserFields {
            name: form.name.clone(),
            email: form.email.clone(),
        }),
    }
}

fn project_row(store: &EntityStore, user: &User, view: &UserView) -> UserRow {
    let tone = if store.is_fully_complete(user.id) {
        CompletionTone::Complete
    } else {
        CompletionTone::Incomplete
    };

    let extra = (view.extra == ExtraPanel::Shown).then(|| AddressFields {
        street: view.edit.street.clone(),
        city: view.edit.city.clone(),
        zipcode: view.edit.zipcode.clone(),
    });

    let expanded = view.row == RowState::Expanded;
    let nested = expanded.then(|| NestedPanel {
        todos: store.todos_for(user.id).map(TodoRow::from).collect(),
        posts: store.posts_for(user.id).map(PostRow::from).collect(),
        draft_form: match view.draft {
            DraftPanel::Closed => DraftForm::Closed,
            DraftPanel::Todo => DraftForm::Todo {
                title: view.new_todo.title.clone(),
            },
            DraftPanel::Post => DraftForm::Post {
                title: view.new_post.title.clone(),
                body: view.new_post.body.clone(),
            },
        },
    });

    UserRow {
        id: user.id,
        name: view.edit.name.clone(),
        email: view.edit.email.clone(),
        tone,
        highlighted: expanded,
        extra,
        nested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> (EntityStore, ViewState) {
        let mut store = EntityStore::new();
        store.replace_users(vec![
            User::new(1, "Leanne Graham", "Sincere@april.biz"),
            User::new(2, "Ervin Howell", "Shanna@melissa.tv"),
            User::new(3, "Clementine Bauch", "Nathan@yesenia.net"),
        ]);
        let mut view = ViewState::new();
        view.sync(&store);
        (store, view)
    }

    #[test]
    fn test_search_by_name() {
        let (store, mut view) = directory();

        view.set_search("leanne");
        assert_eq!(project(&store, &view).visible_ids(), vec![1]);

        view.set_search("xyz");
        assert!(project(&store, &view).rows.is_empty());
    }

    #[test]
    fn test_search_by_email_case_insensitive() {
        let (store, mut view) = directory();
        view.set_search("SHANNA@");
        assert_eq!(project(&store, &view).visible_ids(), vec![2]);
    }

    #[test]
    fn test_search_preserves_order() {
        let (store, mut view) = directory();

        view.set_search("");
        assert_eq!(project(&store, &view).visible_ids(), vec![1, 2, 3]);

        // "e" matches all three; order must follow the store
        view.set_search("E");
        assert_eq!(project(&store, &view).visible_ids(), vec![1, 2, 3]);

        view.set_search("an");
        let filtered = project(&store, &view).visible_ids();
        let expected: Vec<_> = store
            .list_users()
            .filter(|u| matches_search(u, "an"))
            .map(|u| u.id)
            .collect();
        assert_eq!(filtered, expected);
        assert_eq!(store.user_count(), 3);
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("true"), "True");
        assert_eq!(capitalize_first("false"), "False");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("éa"), "Éa");
        assert_eq!(completed_label(true), "True");
    }

    #[test]
    fn test_truncate_body() {
        let short = "quia et suscipit";
        assert_eq!(truncate_body(short), short);

        let long = "a".repeat(60);
        assert_eq!(truncate_body(&long).chars().count(), 50);

        let exact = "b".repeat(50);
        assert_eq!(truncate_body(&exact), exact);

        // Counts characters, not bytes
        let accented = "é".repeat(51);
        assert_eq!(truncate_body(&accented), "é".repeat(50));
    }

    #[test]
    fn test_nested_panel_follows_expansion() {
        let (mut store, mut view) = directory();
        store.replace_todos_for(
            1,
            vec![Todo {
                id: RecordKey::Identified(1),
                user_id: 1,
                title: "delectus aut autem".into(),
                completed: false,
            }],
        );
        store.replace_posts_for(
            1,
            vec![Post {
                id: RecordKey::Identified(1),
                user_id: 1,
                title: "sunt aut facere".into(),
                body: "quia et suscipit\nsuscipit recusandae consequuntur expedita et cum".into(),
            }],
        );

        let model = project(&store, &view);
        let row = model.row(1).unwrap();
        assert!(row.nested.is_none());
        assert!(!row.highlighted);
        assert_eq!(row.tone, CompletionTone::Incomplete);

        view.toggle_expanded(1);
        let model = project(&store, &view);
        let nested = model.row(1).unwrap().nested.as_ref().unwrap();
        assert_eq!(nested.todos[0].completed_label, "False");
        assert!(nested.todos[0].can_mark_completed);
        assert_eq!(nested.posts[0].body.chars().count(), 50);
        assert_eq!(nested.draft_form, DraftForm::Closed);
        assert!(model.row(1).unwrap().highlighted);

        // Users without todos are complete
        assert_eq!(model.row(2).unwrap().tone, CompletionTone::Complete);
    }

    #[test]
    fn test_extra_panel_projection() {
        let (store, mut view) = directory();
        assert!(project(&store, &view).row(1).unwrap().extra.is_none());

        view.hover_extra(1);
        view.edit_mut(1).unwrap().city = "Gwenborough".into();
        let model = project(&store, &view);
        assert_eq!(model.row(1).unwrap().extra.as_ref().unwrap().city, "Gwenborough");

        view.click_extra(1);
        assert!(project(&store, &view).row(1).unwrap().extra.is_none());
    }

    #[test]
    fn test_new_user_form_projection() {
        let (store, mut view) = directory();
        assert!(project(&store, &view).new_user_form.is_none());

        view.toggle_new_user_form();
        view.new_user_form_mut().name = "Kurtis".into();
        let model = project(&store, &view);
        assert_eq!(model.new_user_form.unwrap().name, "Kurtis");
    }

    #[test]
    fn test_projection_does_not_mutate_store() {
        let (store, mut view) = directory();
        view.set_search("xyz");
        let _ = project(&store, &view);
        assert_eq!(store.user_count(), 3);
    }
}
