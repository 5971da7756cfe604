//! This crate contains the client-side state of the directory: the optimistic
//! mutation coordinator and the render model derived from it. Rendering itself
//! belongs to whichever frontend consumes [`DirectoryModel`].

pub mod coordinator;
pub mod projection;
pub mod view_state;

pub use coordinator::{Coordinator, Directory, DirectoryEvent, MutationOutcome};
pub use projection::{
    capitalize_first, filter_users, project, truncate_body, CompletionTone, DirectoryModel,
    DraftForm, NestedPanel, PostRow, TodoRow, UserRow, BODY_PREVIEW_CHARS,
};
pub use view_state::{DraftPanel, ExtraPanel, RowState, UserEdit, UserView, ViewState};
