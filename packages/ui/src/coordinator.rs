//! # Optimistic mutation coordinator
//!
//! [`Coordinator`] owns the [`Directory`] (entity store plus view state) and a
//! [`Gateway`], and runs every mutating action through the same three phases:
//!
//! 1. **Apply**: the store is changed synchronously, before the returned future
//!    is even polled, so a render right after dispatch already shows the result.
//! 2. **Confirm**: the gateway is called with the changed record.
//! 3. **Reconcile**: on success the server's record replaces the local one and
//!    listeners receive a [`DirectoryEvent`]. On failure the error is logged and,
//!    under the default [`ConfirmPolicy::FireAndForget`], the local change stays.
//!    [`ConfirmPolicy::RevertOnFailure`] restores the previous record instead.
//!
//! | Action | Apply | Confirm | Reconcile |
//! |--------|-------|---------|-----------|
//! | [`update_user`](Coordinator::update_user) | edit buffers merged into the user | `PUT users/{id}` with the whole record | adopt name, email and address from the response, re-seed the buffers |
//! | [`mark_todo_completed`](Coordinator::mark_todo_completed) | `completed = true` | `PUT todos/{id}` | adopt the response; the owner's aggregate is re-derived |
//! | [`delete_user`](Coordinator::delete_user) | nothing | `DELETE users/{id}` | remove the user only now |
//! | [`add_user`](Coordinator::add_user) | append with id `count + 1` | none | none |
//! | [`add_todo_draft`](Coordinator::add_todo_draft) / [`add_post_draft`](Coordinator::add_post_draft) | append a draft, clear the inputs | none | none |
//!
//! ## Concurrency
//!
//! Flows are plain futures borrowing the coordinator; any number may be in
//! flight at once and nothing serializes them. Two updates of the same record
//! race, and whichever response arrives last is what the store keeps. The
//! directory sits behind one [`Mutex`] that is only taken between await points,
//! which is the single place every mutation passes through.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use api::{Collection, ConfirmPolicy, Gateway, GatewayFailure};
use futures::future::join_all;
use store::{EntityStore, Post, RecordKey, Todo, User, UserId};

use crate::projection::{project, DirectoryModel};
use crate::view_state::{PostInput, TodoInput, ViewState};

/// Entity state plus the transient UI state layered over it.
#[derive(Clone, Debug, Default)]
pub struct Directory {
    pub store: EntityStore,
    pub view: ViewState,
}

impl Directory {
    pub fn render(&self) -> DirectoryModel {
        project(&self.store, &self.view)
    }
}

/// Result of a mutating flow.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationOutcome<T> {
    /// The gateway accepted the change; the store holds the server's record.
    Confirmed(T),
    /// The gateway call failed and the local change was kept.
    Failed(GatewayFailure),
    /// The gateway call failed and the store was restored to `previous`.
    Reverted {
        previous: T,
        failure: GatewayFailure,
    },
    /// The record was already in the requested state or never reached the
    /// backend; nothing was sent.
    Unchanged(T),
    /// No such record in the store; nothing was applied or sent.
    Missing,
}

impl<T> MutationOutcome<T> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, MutationOutcome::Confirmed(_))
    }
}

/// Change notification sent to listeners after reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryEvent {
    UsersLoaded { count: usize },
    RecordsLoaded { owner: UserId },
    UserUpdated { id: UserId },
    UserDeleted { id: UserId },
    TodoCompleted {
        owner: UserId,
        key: RecordKey,
        all_complete: bool,
    },
}

type Listener = Box<dyn Fn(&DirectoryEvent) + Send + Sync>;

pub struct Coordinator<G> {
    gateway: G,
    directory: Mutex<Directory>,
    policy: ConfirmPolicy,
    listeners: Vec<Listener>,
}

impl<G: Gateway> Coordinator<G> {
    pub fn new(gateway: G) -> Self {
        Self {
            gateway,
            directory: Mutex::new(Directory::default()),
            policy: ConfirmPolicy::default(),
            listeners: Vec::new(),
        }
    }

    /// Builder method to choose what a failed confirmation does.
    pub fn with_policy(mut self, policy: ConfirmPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder method to register a change listener.
    pub fn with_listener(mut self, listener: impl Fn(&DirectoryEvent) + Send + Sync + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn policy(&self) -> ConfirmPolicy {
        self.policy
    }

    fn directory(&self) -> MutexGuard<'_, Directory> {
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: DirectoryEvent) {
        for listener in &self.listeners {
            listener(&event);
        }
    }

    /// Read the entity store.
    pub fn with_store<R>(&self, f: impl FnOnce(&EntityStore) -> R) -> R {
        f(&self.directory().store)
    }

    /// Dispatch a UI intent that only touches view state.
    pub fn with_view<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        f(&mut self.directory().view)
    }

    /// Derive the current render model.
    pub fn render(&self) -> DirectoryModel {
        self.directory().render()
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Replace the users with the backend's list and re-seed every edit buffer.
    ///
    /// On failure the store is left as it was.
    pub async fn load_users(&self) -> Result<usize, GatewayFailure> {
        let users: Vec<User> = match self.gateway.fetch_all(Collection::Users).await {
            Ok(users) => users,
            Err(failure) => {
                tracing::error!("Error fetching users: {}", failure);
                return Err(failure);
            }
        };

        let count = users.len();
        {
            let mut directory = self.directory();
            let Directory { store, view } = &mut *directory;
            store.replace_users(users);
            view.sync(store);
            // Buffers of rows that survive the reload follow the fetched records
            for user in store.list_users() {
                view.reseed(user);
            }
        }
        tracing::info!("Loaded {} users", count);
        self.notify(DirectoryEvent::UsersLoaded { count });
        Ok(count)
    }

    /// Fetch the todos and posts owned by `owner`.
    ///
    /// The two requests run concurrently; each one that succeeds replaces the
    /// owner's confirmed records, a failure leaves that collection untouched.
    pub async fn load_records_for(&self, owner: UserId) {
        let (todos, posts) = futures::join!(
            self.gateway.fetch_by_owner::<Todo>(Collection::Todos, owner),
            self.gateway.fetch_by_owner::<Post>(Collection::Posts, owner),
        );

        {
            let mut directory = self.directory();
            if !directory.store.contains_user(owner) {
                tracing::debug!("User {} left before its records arrived", owner);
                return;
            }
            match todos {
                Ok(todos) => directory.store.replace_todos_for(owner, todos),
                Err(failure) => tracing::error!("Error fetching todos of user {}: {}", owner, failure),
            }
            match posts {
                Ok(posts) => directory.store.replace_posts_for(owner, posts),
                Err(failure) => tracing::error!("Error fetching posts of user {}: {}", owner, failure),
            }
        }
        self.notify(DirectoryEvent::RecordsLoaded { owner });
    }

    /// Load users, then every user's todos and posts concurrently.
    pub async fn load_all(&self) -> Result<usize, GatewayFailure> {
        let count = self.load_users().await?;
        let owners: Vec<UserId> = self.with_store(|store| store.list_users().map(|u| u.id).collect());
        join_all(owners.into_iter().map(|owner| self.load_records_for(owner))).await;
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Confirmed mutations
    // -----------------------------------------------------------------------

    /// Send the user's edit buffers to the backend.
    pub fn update_user(&self, id: UserId) -> impl Future<Output = MutationOutcome<User>> + '_ {
        let applied = {
            let mut directory = self.directory();
            let Directory { store, view } = &mut *directory;
            store.user(id).cloned().map(|previous| {
                let merged = match view.user(id) {
                    Some(row) => row.edit.merge_into(&previous),
                    None => previous.clone(),
                };
                store.upsert_user(merged.clone());
                (previous, merged)
            })
        };

        async move {
            let Some((previous, merged)) = applied else {
                tracing::warn!("Update of unknown user {}", id);
                return MutationOutcome::Missing;
            };

            match self.gateway.update(Collection::Users, id, &merged).await {
                Ok(returned) => {
                    let confirmed = {
                        let mut directory = self.directory();
                        let Directory { store, view } = &mut *directory;
                        let Some(mut current) = store.user(id).cloned() else {
                            tracing::debug!("User {} was removed before its update resolved", id);
                            return MutationOutcome::Confirmed(returned);
                        };
                        current.name = returned.name;
                        current.email = returned.email;
                        current.address = returned.address;
                        store.upsert_user(current.clone());
                        view.reseed(&current);
                        current
                    };
                    tracing::debug!("Updated user {}", id);
                    self.notify(DirectoryEvent::UserUpdated { id });
                    MutationOutcome::Confirmed(confirmed)
                }
                Err(failure) => {
                    tracing::error!("Error updating user data: {}", failure);
                    self.settle_failure(failure, previous, |directory, previous| {
                        if directory.store.contains_user(previous.id) {
                            directory.store.upsert_user(previous.clone());
                            directory.view.reseed(previous);
                        }
                    })
                }
            }
        }
    }

    /// Mark a todo completed. Completion only ever moves to `true`.
    pub fn mark_todo_completed(
        &self,
        owner: UserId,
        key: RecordKey,
    ) -> impl Future<Output = MutationOutcome<Todo>> + '_ {
        let applied = {
            let mut directory = self.directory();
            match directory.store.todo(owner, key).cloned() {
                None => None,
                Some(todo) if todo.completed => Some(Err(todo)),
                Some(previous) => {
                    let mut completed = previous.clone();
                    completed.completed = true;
                    directory.store.upsert_todo(completed.clone());
                    Some(Ok((previous, completed)))
                }
            }
        };

        async move {
            let (previous, completed) = match applied {
                None => return MutationOutcome::Missing,
                Some(Err(todo)) => return MutationOutcome::Unchanged(todo),
                Some(Ok(pair)) => pair,
            };
            let Some(id) = key.remote_id() else {
                // Drafts never reach the backend
                return MutationOutcome::Unchanged(completed);
            };

            match self.gateway.update(Collection::Todos, id, &completed).await {
                Ok(returned) => {
                    let (confirmed, all_complete) = {
                        let mut directory = self.directory();
                        let confirmed = Todo {
                            id: key,
                            user_id: owner,
                            title: returned.title,
                            completed: returned.completed,
                        };
                        if directory.store.todo(owner, key).is_some() {
                            directory.store.upsert_todo(confirmed.clone());
                        }
                        (confirmed, directory.store.is_fully_complete(owner))
                    };
                    tracing::debug!("Todo {} of user {} completed", id, owner);
                    self.notify(DirectoryEvent::TodoCompleted {
                        owner,
                        key,
                        all_complete,
                    });
                    MutationOutcome::Confirmed(confirmed)
                }
                Err(failure) => {
                    tracing::error!("Error updating todo data: {}", failure);
                    self.settle_failure(failure, previous, |directory, previous| {
                        if directory.store.todo(owner, key).is_some() {
                            directory.store.upsert_todo(previous.clone());
                        }
                    })
                }
            }
        }
    }

    /// Delete a user on the backend, then locally once the call has resolved.
    pub async fn delete_user(&self, id: UserId) -> MutationOutcome<User> {
        if !self.with_store(|store| store.contains_user(id)) {
            tracing::warn!("Delete of unknown user {}", id);
            return MutationOutcome::Missing;
        }

        if let Err(failure) = self.gateway.delete(Collection::Users, id).await {
            tracing::error!("Error deleting user from the backend: {}", failure);
            return MutationOutcome::Failed(failure);
        }

        let removed = {
            let mut directory = self.directory();
            let Directory { store, view } = &mut *directory;
            let removed = store.remove_user(id);
            view.sync(store);
            removed
        };
        match removed {
            Some(user) => {
                tracing::debug!("User {} deleted", id);
                self.notify(DirectoryEvent::UserDeleted { id });
                MutationOutcome::Confirmed(user)
            }
            None => MutationOutcome::Missing,
        }
    }

    /// Apply the confirm policy to a failed confirmation.
    fn settle_failure<T>(
        &self,
        failure: GatewayFailure,
        previous: T,
        restore: impl FnOnce(&mut Directory, &T),
    ) -> MutationOutcome<T> {
        match self.policy {
            ConfirmPolicy::FireAndForget => MutationOutcome::Failed(failure),
            ConfirmPolicy::RevertOnFailure => {
                restore(&mut self.directory(), &previous);
                MutationOutcome::Reverted { previous, failure }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Local-only additions
    // -----------------------------------------------------------------------

    /// Append a user built from the add-user form, with id `count + 1`.
    ///
    /// The id is not checked against existing users: after a deletion it can
    /// name a user that is still present, which this call then replaces.
    pub fn add_user(&self) -> User {
        let mut directory = self.directory();
        let Directory { store, view } = &mut *directory;

        let (name, email) = view.take_new_user();
        let user = User::new(store.next_user_id(), name, email);
        if store.contains_user(user.id) {
            tracing::warn!("New user id {} is already taken and will be replaced", user.id);
        }
        store.upsert_user(user.clone());
        view.reseed(&user);
        view.sync(store);
        tracing::info!("User added: {} <{}> (id {})", user.name, user.email, user.id);
        user
    }

    /// Append a draft todo from the owner's todo input. Drafts are created completed.
    pub fn add_todo_draft(&self, owner: UserId) -> Option<Todo> {
        let mut directory = self.directory();
        if !directory.store.contains_user(owner) {
            return None;
        }
        let TodoInput { title } = directory.view.take_todo_input(owner);
        let todo = Todo {
            id: directory.store.draft_key(),
            user_id: owner,
            title,
            completed: true,
        };
        directory.store.upsert_todo(todo.clone());
        Some(todo)
    }

    /// Append a draft post from the owner's post input.
    pub fn add_post_draft(&self, owner: UserId) -> Option<Post> {
        let mut directory = self.directory();
        if !directory.store.contains_user(owner) {
            return None;
        }
        let PostInput { title, body } = directory.view.take_post_input(owner);
        let post = Post {
            id: directory.store.draft_key(),
            user_id: owner,
            title,
            body,
        };
        directory.store.upsert_post(post.clone());
        Some(post)
    }
}
