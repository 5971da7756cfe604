//! # Domain models for users, todos and posts
//!
//! Defines the records held by [`crate::EntityStore`] and exchanged with the
//! remote collections. All types are `Serialize + Deserialize` using the wire
//! field names of the backend (`userId`), so the same structs are decoded from
//! a fetch and encoded back into an update.
//!
//! ## Types
//!
//! | Type | Represents |
//! |------|-----------|
//! | [`User`] | A directory entry. Owns todos and posts by foreign key only. Unknown remote fields are kept in `extra` so an update sends the record back whole. |
//! | [`Address`] | The three editable address lines plus any remote extras (`suite`, `geo`). |
//! | [`Todo`] | A task owned by a user. `completed` only ever moves to `true` through the UI. |
//! | [`Post`] | A post owned by a user. |
//! | [`RecordKey`] | Identity of a todo or post: `Identified` once the backend knows it, `Draft` for local additions that were never sent. |
//!
//! ## Draft identity
//!
//! A draft never reaches the wire. [`RecordKey`] serializes through
//! `Option<u64>` and the owning structs skip the field for drafts, so a draft
//! encodes without an `id` and any decoded record is always `Identified`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a user, assigned by the backend or synthesized on add.
pub type UserId = u64;

/// Locally allocated token for a record that has not been persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DraftToken(pub u64);

/// Identity of a todo or post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "Option<u64>")]
pub enum RecordKey {
    /// Acknowledged by the backend under this id.
    Identified(u64),
    /// Local-only addition.
    Draft(DraftToken),
}

impl RecordKey {
    pub fn is_draft(&self) -> bool {
        matches!(self, RecordKey::Draft(_))
    }

    /// The backend id, if there is one.
    pub fn remote_id(&self) -> Option<u64> {
        match self {
            RecordKey::Identified(id) => Some(*id),
            RecordKey::Draft(_) => None,
        }
    }
}

impl From<u64> for RecordKey {
    fn from(id: u64) -> Self {
        RecordKey::Identified(id)
    }
}

impl From<RecordKey> for Option<u64> {
    fn from(key: RecordKey) -> Self {
        key.remote_id()
    }
}

/// Postal address of a user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zipcode: String,
    /// Remote fields this client does not edit ("suite", "geo").
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A directory entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: Address,
    /// Remote fields this client does not edit ("username", "phone", "company", ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// A user with only the fields the add-user form collects.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            address: Address::default(),
            extra: Map::new(),
        }
    }
}

/// A task owned by a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(skip_serializing_if = "RecordKey::is_draft")]
    pub id: RecordKey,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub title: String,
    pub completed: bool,
}

/// A post owned by a user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(skip_serializing_if = "RecordKey::is_draft")]
    pub id: RecordKey,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub title: String,
    pub body: String,
}

/// A record that belongs to a user through `userId`.
pub trait Owned {
    fn key(&self) -> RecordKey;
    fn owner(&self) -> UserId;
}

impl Owned for Todo {
    fn key(&self) -> RecordKey {
        self.id
    }

    fn owner(&self) -> UserId {
        self.user_id
    }
}

impl Owned for Post {
    fn key(&self) -> RecordKey {
        self.id
    }

    fn owner(&self) -> UserId {
        self.user_id
    }
}
