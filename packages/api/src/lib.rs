//! # API crate: the remote side of the user directory
//!
//! Everything that talks to, or stands in for, the REST backend that owns the
//! users, todos and posts collections.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`gateway`] | The [`Gateway`] trait and the [`Collection`] names it addresses |
//! | [`http`] | [`HttpGateway`], the `reqwest` implementation used against a live backend |
//! | [`memory`] | [`MemoryGateway`], an in-memory backend that records calls and can be made to fail |
//! | [`error`] | [`GatewayFailure`], the one failure kind every call can produce |
//! | [`settings`] | [`Settings`] loaded from defaults, `directory.toml` and the environment |

pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod settings;

pub use error::{GatewayFailure, Operation};
pub use gateway::{Collection, Gateway};
pub use http::HttpGateway;
pub use memory::{GatewayCall, MemoryGateway};
pub use settings::{ConfirmPolicy, GatewaySettings, Settings, SyncSettings};

pub use store::{Address, Post, RecordKey, Todo, User, UserId};
