//! Hands launched instances back once injection is over.

use crate::error::InjectionError;

/// An instance whose primary thread can be resumed.
pub trait Resumable {
    /// Resume the primary thread, returning the previous suspend count.
    fn resume(&self) -> Result<u32, InjectionError>;
}

/// Resume suspended instances, run `shutdown`, then close the instances.
///
/// Injection results do not matter here: every instance is resumed and
/// closed either way. A failed resume is logged and the remaining instances
/// are still resumed.
///
/// # Errors
/// The `shutdown` error if there is one, otherwise the first resume failure.
pub fn release_instances<P, F>(
    processes: Vec<P>,
    suspended: bool,
    shutdown: F,
) -> Result<(), InjectionError>
where
    P: Resumable,
    F: FnOnce(&[P]) -> Result<(), InjectionError>,
{
    let mut resume_error = None;

    if suspended {
        for process in &processes {
            if let Err(e) = process.resume() {
                log::error!("{}", e);
                resume_error.get_or_insert(e);
            }
        }
    }

    let shutdown_result = shutdown(&processes);

    drop(processes);
    log::debug!("Process handles closed");

    shutdown_result?;
    match resume_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
