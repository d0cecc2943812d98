use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

use crate::errors::{MySqlSrvError, Result};

/// Run a query future, converting any panic into a query error annotated
/// with the sql being handled.
pub async fn catch_faults<F>(sql: &str, fut: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(recovered(sql, payload)),
    }
}

/// Convert a caught panic payload into a query error.
pub fn recovered(sql: &str, payload: Box<dyn Any + Send>) -> MySqlSrvError {
    let fault = panic_message(payload.as_ref());
    error!(%sql, %fault, "recovered from fault while handling query");
    MySqlSrvError::Recovered {
        sql: sql.to_string(),
        fault,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown fault".to_string()
    }
}
