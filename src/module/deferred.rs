//! Deferred registration merging
//!
//! A module built from several sub-registrations can return a single deferred
//! registration that runs all of theirs.

use crate::module::traits::{DeferredRegistration, ModuleError};

/// Combine optional deferred registrations into one
///
/// - no candidate: `None`
/// - one candidate: that exact registration, not wrapped
/// - several: a new registration awaiting each candidate in input order with
///   the same data and phase, stopping at the first error
pub fn merge_deferred_registrations<D, I>(candidates: I) -> Option<DeferredRegistration<D>>
where
    D: Clone + Send + 'static,
    I: IntoIterator<Item = Option<DeferredRegistration<D>>>,
{
    let mut registrations: Vec<DeferredRegistration<D>> = candidates.into_iter().flatten().collect();

    match registrations.len() {
        0 => None,
        1 => registrations.pop(),
        _ => Some(DeferredRegistration::new(move |data: D, phase| {
            let registrations = registrations.clone();
            async move {
                for registration in &registrations {
                    registration.invoke(data.clone(), phase).await?;
                }
                Ok::<(), ModuleError>(())
            }
        })),
    }
}
