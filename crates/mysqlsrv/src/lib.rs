//! MySQL protocol front end.
//!
//! Each accepted connection gets a [`handler::MySqlHandler`] opened from a
//! shared [`handler::MySqlHandlerShared`]. The handler decodes commands,
//! tracks the session's schema and variables, and drives query jobs through
//! finalize, run and close, writing results through the writer matching the
//! statement.
pub mod bind_vars;
pub mod conn;
pub mod errors;
pub mod handler;
pub mod protocol;
pub mod recover;
pub mod session;
pub mod writers;
