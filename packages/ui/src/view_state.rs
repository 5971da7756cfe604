//! # Transient UI intent
//!
//! Everything the operator has typed or toggled that is not (yet) entity state:
//! the search query, per-user row state, edit buffers and the add forms.
//! [`crate::projection`] combines this with the [`EntityStore`] into what is shown.
//!
//! ## Per-user state
//!
//! | Field | Values | Changed by |
//! |-------|--------|-----------|
//! | `row` | [`RowState::Collapsed`] / [`RowState::Expanded`] | clicking the id label ([`ViewState::toggle_expanded`]) |
//! | `extra` | [`ExtraPanel::Hidden`] / [`ExtraPanel::Shown`] | pointer entering the "other data" button shows it, clicking it hides it |
//! | `draft` | [`DraftPanel::Closed`] / [`DraftPanel::Todo`] / [`DraftPanel::Post`] | the add buttons, cancel, submit |
//!
//! The extra panel pair is deliberately asymmetric: hovering never hides it and
//! clicking never shows it.

use std::collections::HashMap;

use store::{EntityStore, User, UserId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowState {
    #[default]
    Collapsed,
    Expanded,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtraPanel {
    #[default]
    Hidden,
    Shown,
}

/// Which add form is open under an expanded row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DraftPanel {
    #[default]
    Closed,
    Todo,
    Post,
}

/// Edit buffers for a user's details.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserEdit {
    pub name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub zipcode: String,
}

impl UserEdit {
    pub fn for_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            street: user.address.street.clone(),
            city: user.address.city.clone(),
            zipcode: user.address.zipcode.clone(),
        }
    }

    /// A copy of `user` with the buffered fields merged in.
    pub fn merge_into(&self, user: &User) -> User {
        let mut merged = user.clone();
        merged.name = self.name.clone();
        merged.email = self.email.clone();
        merged.address.street = self.street.clone();
        merged.address.city = self.city.clone();
        merged.address.zipcode = self.zipcode.clone();
        merged
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoInput {
    pub title: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub body: String,
}

/// Transient state of one user row.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserView {
    pub row: RowState,
    pub extra: ExtraPanel,
    pub draft: DraftPanel,
    pub edit: UserEdit,
    pub new_todo: TodoInput,
    pub new_post: PostInput,
}

impl UserView {
    pub fn for_user(user: &User) -> Self {
        Self {
            edit: UserEdit::for_user(user),
            ..Self::default()
        }
    }
}

/// The add-user form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewUserForm {
    pub open: bool,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Default)]
pub struct ViewState {
    search: String,
    users: HashMap<UserId, UserView>,
    new_user: NewUserForm,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    pub fn user(&self, id: UserId) -> Option<&UserView> {
        self.users.get(&id)
    }

    /// Track the store's users: new users get a row seeded from their record,
    /// rows of users that are gone are dropped.
    pub fn sync(&mut self, store: &EntityStore) {
        self.users.retain(|id, _| store.contains_user(*id));
        for user in store.list_users() {
            self.users
                .entry(user.id)
                .or_insert_with(|| UserView::for_user(user));
        }
    }

    /// Re-seed a row's edit buffers from `user`.
    pub fn reseed(&mut self, user: &User) {
        self.users.entry(user.id).or_default().edit = UserEdit::for_user(user);
    }

    pub fn toggle_expanded(&mut self, id: UserId) -> Option<RowState> {
        let view = self.users.get_mut(&id)?;
        view.row = match view.row {
            RowState::Collapsed => RowState::Expanded,
            RowState::Expanded => RowState::Collapsed,
        };
        Some(view.row)
    }

    /// Pointer entered the "other data" button.
    pub fn hover_extra(&mut self, id: UserId) {
        if let Some(view) = self.users.get_mut(&id) {
            view.extra = ExtraPanel::Shown;
        }
    }

    /// The "other data" button was clicked.
    pub fn click_extra(&mut self, id: UserId) {
        if let Some(view) = self.users.get_mut(&id) {
            view.extra = ExtraPanel::Hidden;
        }
    }

    pub fn open_draft(&mut self, id: UserId, panel: DraftPanel) {
        if let Some(view) = self.users.get_mut(&id) {
            view.draft = panel;
        }
    }

    /// Close the add form; typed input is left in the buffers.
    pub fn cancel_draft(&mut self, id: UserId) {
        self.open_draft(id, DraftPanel::Closed);
    }

    pub fn edit_mut(&mut self, id: UserId) -> Option<&mut UserEdit> {
        self.users.get_mut(&id).map(|view| &mut view.edit)
    }

    pub fn todo_input_mut(&mut self, id: UserId) -> Option<&mut TodoInput> {
        self.users.get_mut(&id).map(|view| &mut view.new_todo)
    }

    pub fn post_input_mut(&mut self, id: UserId) -> Option<&mut PostInput> {
        self.users.get_mut(&id).map(|view| &mut view.new_post)
    }

    /// Take the todo input, clearing it and closing the form.
    pub(crate) fn take_todo_input(&mut self, id: UserId) -> TodoInput {
        match self.users.get_mut(&id) {
            Some(view) => {
                view.draft = DraftPanel::Closed;
                std::mem::take(&mut view.new_todo)
            }
            None => TodoInput::default(),
        }
    }

    /// Take the post input, clearing it and closing the form.
    pub(crate) fn take_post_input(&mut self, id: UserId) -> PostInput {
        match self.users.get_mut(&id) {
            Some(view) => {
                view.draft = DraftPanel::Closed;
                std::mem::take(&mut view.new_post)
            }
            None => PostInput::default(),
        }
    }

    pub fn new_user_form(&self) -> &NewUserForm {
        &self.new_user
    }

    pub fn new_user_form_mut(&mut self) -> &mut NewUserForm {
        &mut self.new_user
    }

    /// The add-user button and the form's cancel button both toggle the form.
    pub fn toggle_new_user_form(&mut self) {
        self.new_user.open = !self.new_user.open;
    }

    /// Take the new user's name and email, clearing them and closing the form.
    pub(crate) fn take_new_user(&mut self) -> (String, String) {
        self.new_user.open = false;
        (
            std::mem::take(&mut self.new_user.name),
            std::mem::take(&mut self.new_user.email),
        )
    }
}
