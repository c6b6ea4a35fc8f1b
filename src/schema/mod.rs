//! Plain data shared by the classifier, sessions and callers.
pub mod history;
pub mod segment;
pub mod session_id;
pub mod view;
