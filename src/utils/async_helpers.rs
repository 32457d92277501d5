//! Async operation helpers
//!
//! Provides the settle-all primitive used by every registration phase.

use futures::future::{join_all, FutureExt};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::module::traits::ModuleError;

/// Execute multiple async operations concurrently and wait for all of them
///
/// Every operation is started before any of them is awaited, and every one is
/// observed to completion regardless of sibling failures. A panic inside an
/// operation is caught and reported as `ModuleError::Panicked` for that slot.
/// Results are returned in input order.
pub async fn settle_all<I, Fut, T>(operations: I) -> Vec<Result<T, ModuleError>>
where
    I: IntoIterator<Item = Fut>,
    Fut: Future<Output = Result<T, ModuleError>>,
{
    join_all(operations.into_iter().map(|operation| async move {
        match AssertUnwindSafe(operation).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(ModuleError::Panicked(panic_message(panic.as_ref()))),
        }
    }))
    .await
}

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
