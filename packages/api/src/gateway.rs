//! # Remote data gateway: the only I/O boundary of the directory
//!
//! [`Gateway`] is the narrow interface the coordinator consumes. It knows three
//! [`Collection`]s, each a base resource path plus numeric ids, and four calls:
//!
//! | Method | Request | Result |
//! |--------|---------|--------|
//! | [`fetch_all`](Gateway::fetch_all) | `GET /{collection}` | every record |
//! | [`fetch_by_owner`](Gateway::fetch_by_owner) | `GET /{collection}?userId={owner}` | records owned by one user |
//! | [`update`](Gateway::update) | `PUT /{collection}/{id}` | the server's canonical record |
//! | [`delete`](Gateway::delete) | `DELETE /{collection}/{id}` | confirmation |
//!
//! Every call is asynchronous and may fail with a [`GatewayFailure`]; nothing
//! is retried here. Implementations live in sibling modules
//! ([`crate::http`], [`crate::memory`]).

use std::fmt;
use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use store::UserId;

use crate::error::GatewayFailure;

/// A remote collection endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Todos,
    Posts,
}

impl Collection {
    /// Path segment under the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Todos => "todos",
            Collection::Posts => "posts",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Query parameter naming the owner of todos and posts.
pub const OWNER_PARAM: &str = "userId";

/// Async access to the remote collections.
pub trait Gateway {
    fn fetch_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> impl Future<Output = Result<Vec<T>, GatewayFailure>>;

    fn fetch_by_owner<T: DeserializeOwned>(
        &self,
        collection: Collection,
        owner: UserId,
    ) -> impl Future<Output = Result<Vec<T>, GatewayFailure>>;

    /// Send `record` whole and return what the server stored.
    fn update<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        id: u64,
        record: &T,
    ) -> impl Future<Output = Result<T, GatewayFailure>>;

    fn delete(
        &self,
        collection: Collection,
        id: u64,
    ) -> impl Future<Output = Result<(), GatewayFailure>>;
}
