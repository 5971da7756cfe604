//! # Entity store: the in-memory authoritative copy of the directory
//!
//! [`EntityStore`] holds every [`User`] in insertion order and, per user, the
//! todos and posts owned by that user. It performs no I/O: every method is a
//! synchronous mutation or read with immediate read-after-write consistency.
//! Network confirmation is layered on top by the coordinator in the `ui` crate.
//!
//! ## Users
//!
//! Users live in an [`IndexMap`] keyed by id, which gives the two properties the
//! directory needs at once: exactly one record per id, and a stable listing order.
//! [`upsert_user`](EntityStore::upsert_user) replaces in place (the row keeps its
//! position), [`remove_user`](EntityStore::remove_user) shifts later rows up.
//!
//! ## Owned records
//!
//! Todos and posts are stored apart from users and looked up by owner id. Each
//! owner keeps two sequences:
//!
//! | Sequence | Contents |
//! |----------|----------|
//! | confirmed | Records with [`RecordKey::Identified`], as fetched or updated through the gateway. |
//! | drafts | Records with [`RecordKey::Draft`], appended by the add forms and never sent. |
//!
//! Reads yield confirmed records first, then drafts, in the order they arrived.
//!
//! ## Aggregate
//!
//! [`is_fully_complete`](EntityStore::is_fully_complete) is computed from the
//! owner's todos on every call. Nothing caches it, so it cannot go stale.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::models::{DraftToken, Owned, Post, RecordKey, Todo, User, UserId};

/// Confirmed records and local drafts belonging to one owner.
#[derive(Clone, Debug)]
struct OwnedRecords<T> {
    confirmed: Vec<T>,
    drafts: Vec<T>,
}

impl<T> Default for OwnedRecords<T> {
    fn default() -> Self {
        Self {
            confirmed: Vec::new(),
            drafts: Vec::new(),
        }
    }
}

impl<T: Owned> OwnedRecords<T> {
    fn iter(&self) -> impl Iterator<Item = &T> {
        self.confirmed.iter().chain(self.drafts.iter())
    }

    fn get(&self, key: RecordKey) -> Option<&T> {
        self.iter().find(|record| record.key() == key)
    }

    fn upsert(&mut self, record: T) -> Option<T> {
        let bucket = if record.key().is_draft() {
            &mut self.drafts
        } else {
            &mut self.confirmed
        };
        match bucket.iter_mut().find(|existing| existing.key() == record.key()) {
            Some(existing) => Some(std::mem::replace(existing, record)),
            None => {
                bucket.push(record);
                None
            }
        }
    }
}

/// In-memory users plus their todos and posts.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    users: IndexMap<UserId, User>,
    todos: HashMap<UserId, OwnedRecords<Todo>>,
    posts: HashMap<UserId, OwnedRecords<Post>>,
    next_draft: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All users in insertion order.
    pub fn list_users(&self) -> impl ExactSizeIterator<Item = &User> {
        self.users.values()
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.get(&id)
    }

    pub fn contains_user(&self, id: UserId) -> bool {
        self.users.contains_key(&id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Id for a locally added user: the current count plus one.
    ///
    /// After a deletion this can equal the id of a user still in the store.
    pub fn next_user_id(&self) -> UserId {
        self.users.len() as UserId + 1
    }

    /// Replace the whole user set with a freshly fetched one.
    ///
    /// Owned records of users that are no longer present are dropped.
    pub fn replace_users(&mut self, users: impl IntoIterator<Item = User>) {
        self.users = users.into_iter().map(|user| (user.id, user)).collect();
        let users = &self.users;
        self.todos.retain(|owner, _| users.contains_key(owner));
        self.posts.retain(|owner, _| users.contains_key(owner));
    }

    /// Insert or replace a user, returning the record it replaced.
    pub fn upsert_user(&mut self, user: User) -> Option<User> {
        self.users.insert(user.id, user)
    }

    /// Remove a user together with the todos and posts it owns.
    pub fn remove_user(&mut self, id: UserId) -> Option<User> {
        let removed = self.users.shift_remove(&id)?;
        self.todos.remove(&id);
        self.posts.remove(&id);
        Some(removed)
    }

    /// Todos owned by `owner`: confirmed first, then drafts.
    pub fn todos_for(&self, owner: UserId) -> impl Iterator<Item = &Todo> {
        self.todos.get(&owner).into_iter().flat_map(|records| records.iter())
    }

    /// Posts owned by `owner`: confirmed first, then drafts.
    pub fn posts_for(&self, owner: UserId) -> impl Iterator<Item = &Post> {
        self.posts.get(&owner).into_iter().flat_map(|records| records.iter())
    }

    pub fn todo(&self, owner: UserId, key: RecordKey) -> Option<&Todo> {
        self.todos.get(&owner)?.get(key)
    }

    pub fn post(&self, owner: UserId, key: RecordKey) -> Option<&Post> {
        self.posts.get(&owner)?.get(key)
    }

    /// Replace the confirmed todos of `owner`; drafts are kept.
    pub fn replace_todos_for(&mut self, owner: UserId, todos: Vec<Todo>) {
        self.todos.entry(owner).or_default().confirmed = todos;
    }

    /// Replace the confirmed posts of `owner`; drafts are kept.
    pub fn replace_posts_for(&mut self, owner: UserId, posts: Vec<Post>) {
        self.posts.entry(owner).or_default().confirmed = posts;
    }

    /// Insert or replace a todo under its owner, returning the record it replaced.
    pub fn upsert_todo(&mut self, todo: Todo) -> Option<Todo> {
        self.todos.entry(todo.user_id).or_default().upsert(todo)
    }

    /// Insert or replace a post under its owner, returning the record it replaced.
    pub fn upsert_post(&mut self, post: Post) -> Option<Post> {
        self.posts.entry(post.user_id).or_default().upsert(post)
    }

    /// Allocate a key for a new local draft.
    pub fn draft_key(&mut self) -> RecordKey {
        let token = DraftToken(self.next_draft);
        self.next_draft += 1;
        RecordKey::Draft(token)
    }

    /// `true` iff every todo owned by `owner` is completed; `true` when it owns none.
    pub fn is_fully_complete(&self, owner: UserId) -> bool {
        self.todos_for(owner).all(|todo| todo.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(id: u64, owner: UserId, completed: bool) -> Todo {
        Todo {
            id: RecordKey::Identified(id),
            user_id: owner,
            title: format!("todo {id}"),
            completed,
        }
    }

    fn post(id: u64, owner: UserId) -> Post {
        Post {
            id: RecordKey::Identified(id),
            user_id: owner,
            title: format!("post {id}"),
            body: String::new(),
        }
    }

    #[test]
    fn test_users_keep_insertion_order() {
        let mut store = EntityStore::new();
        store.upsert_user(User::new(3, "C", "c@x.io"));
        store.upsert_user(User::new(1, "A", "a@x.io"));
        store.upsert_user(User::new(2, "B", "b@x.io"));

        let ids: Vec<_> = store.list_users().map(|u| u.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_upsert_user_replaces_in_place() {
        let mut store = EntityStore::new();
        store.upsert_user(User::new(1, "A", "a@x.io"));
        store.upsert_user(User::new(2, "B", "b@x.io"));

        let previous = store.upsert_user(User::new(1, "A2", "a2@x.io"));
        assert_eq!(previous.map(|u| u.name), Some("A".to_string()));

        assert_eq!(store.user_count(), 2);
        let names: Vec<_> = store.list_users().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["A2", "B"]);
    }

    #[test]
    fn test_remove_user_drops_owned_records() {
        let mut store = EntityStore::new();
        store.upsert_user(User::new(1, "A", "a@x.io"));
        store.upsert_user(User::new(2, "B", "b@x.io"));
        store.upsert_user(User::new(3, "C", "c@x.io"));
        store.upsert_todo(todo(1, 2, false));
        store.upsert_post(post(1, 2));

        assert!(store.remove_user(2).is_some());
        assert!(store.remove_user(2).is_none());

        let ids: Vec<_> = store.list_users().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(store.todos_for(2).count(), 0);
        assert_eq!(store.posts_for(2).count(), 0);
    }

    #[test]
    fn test_aggregate_tracks_owned_todos() {
        let mut store = EntityStore::new();
        store.upsert_user(User::new(1, "A", "a@x.io"));

        // Vacuously complete
        assert!(store.is_fully_complete(1));
        assert!(store.is_fully_complete(42));

        store.replace_todos_for(1, vec![todo(1, 1, false), todo(2, 1, true)]);
        assert!(!store.is_fully_complete(1));

        store.upsert_todo(todo(1, 1, true));
        assert!(store.is_fully_complete(1));

        // Another owner's todos do not count
        store.upsert_todo(todo(3, 2, false));
        assert!(store.is_fully_complete(1));
        assert!(!store.is_fully_complete(2));
    }

    #[test]
    fn test_drafts_follow_confirmed_records() {
        let mut store = EntityStore::new();
        store.replace_posts_for(1, vec![post(10, 1)]);

        let key = store.draft_key();
        store.upsert_post(Post {
            id: key,
            user_id: 1,
            title: "local".into(),
            body: "not sent".into(),
        });
        store.replace_posts_for(1, vec![post(11, 1), post(12, 1)]);

        let keys: Vec<_> = store.posts_for(1).map(|p| p.id).collect();
        assert_eq!(
            keys,
            vec![RecordKey::Identified(11), RecordKey::Identified(12), key]
        );
        assert_eq!(store.post(1, key).map(|p| p.title.as_str()), Some("local"));
    }

    #[test]
    fn test_draft_keys_are_unique() {
        let mut store = EntityStore::new();
        let first = store.draft_key();
        let second = store.draft_key();
        assert_ne!(first, second);
        assert!(first.is_draft());
    }

    #[test]
    fn test_next_user_id_counts_users() {
        let mut store = EntityStore::new();
        assert_eq!(store.next_user_id(), 1);

        store.replace_users(vec![
            User::new(1, "A", "a@x.io"),
            User::new(2, "B", "b@x.io"),
            User::new(3, "C", "c@x.io"),
        ]);
        assert_eq!(store.next_user_id(), 4);

        store.remove_user(1);
        // Collides with the user that still holds id 3
        assert_eq!(store.next_user_id(), 3);
        assert!(store.contains_user(store.next_user_id()));
    }

    #[test]
    fn test_replace_users_drops_orphaned_records() {
        let mut store = EntityStore::new();
        store.replace_users(vec![User::new(1, "A", "a@x.io"), User::new(2, "B", "b@x.io")]);
        store.upsert_todo(todo(1, 1, false));
        store.upsert_todo(todo(2, 2, false));

        store.replace_users(vec![User::new(2, "B", "b@x.io")]);
        assert_eq!(store.todos_for(1).count(), 0);
        assert_eq!(store.todos_for(2).count(), 1);
    }
}
