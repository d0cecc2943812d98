//! Query execution contracts for the federation front ends.
//!
//! Front ends (see `mysqlsrv`) hold a shared [`context::ServerContext`] and
//! turn incoming SQL into a [`query::QueryContext`]. A [`planner::Planner`]
//! builds a [`job::Job`] from that, which the front end finalizes with a
//! result writer, runs, then closes.
pub mod config;
pub mod context;
pub mod errors;
pub mod job;
pub mod planner;
pub mod query;
pub mod schema;
pub mod session;
pub mod statement;
pub mod task;
pub mod value;

pub mod export {
    pub use sqlparser;
}
