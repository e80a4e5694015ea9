//! The injection phase: an optional override, otherwise the default pass.

use crate::injection::{inject_all, InjectionReport, InjectionResult, LibraryInjector};
use std::path::PathBuf;

/// Whether an override performed the injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOutcome {
    Handled,
    NotHandled,
}

/// A collaborator able to replace the whole default injection pass.
pub trait InjectionOverride<T> {
    fn inject_libraries(&self, libraries: &[PathBuf], targets: &[T]) -> OverrideOutcome;
}

/// How the injection phase completed.
#[derive(Debug)]
pub enum InjectionPhase {
    /// The override handled injection; the default pass did not run.
    Overridden,
    /// The default pass ran.
    Completed(InjectionReport),
}

impl InjectionPhase {
    pub fn is_success(&self) -> bool {
        match self {
            Self::Overridden => true,
            Self::Completed(report) => report.is_success(),
        }
    }

    pub fn report(&self) -> Option<&InjectionReport> {
        match self {
            Self::Overridden => None,
            Self::Completed(report) => Some(report),
        }
    }
}

/// Run the injection phase.
///
/// When `override_hook` is present and reports [`OverrideOutcome::Handled`],
/// the default pass is skipped entirely. Otherwise every library is injected
/// into every target with `injector`.
pub fn run_injection_phase<T, I>(
    override_hook: Option<&dyn InjectionOverride<T>>,
    injector: &I,
    libraries: &[PathBuf],
    targets: &[T],
) -> InjectionResult<InjectionPhase>
where
    I: LibraryInjector<T> + ?Sized,
{
    if let Some(hook) = override_hook {
        match hook.inject_libraries(libraries, targets) {
            OverrideOutcome::Handled => {
                log::info!("Library injection handled by extension");
                return Ok(InjectionPhase::Overridden);
            }
            OverrideOutcome::NotHandled => {
                log::debug!("Extension did not handle injection, using default pass");
            }
        }
    }

    inject_all(injector, libraries, targets).map(InjectionPhase::Completed)
}
