//! Injects every library into every target.

use crate::injection::{InjectionOutcome, InjectionResult, LibraryInjector};
use std::path::PathBuf;

/// Outcome of one (library, target) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairOutcome {
    pub library_index: usize,
    pub target_index: usize,
    pub outcome: InjectionOutcome,
}

/// Per-library tally across all targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryReport {
    pub library: PathBuf,
    pub attempted: usize,
    pub succeeded: usize,
}

impl LibraryReport {
    /// True when every attempted pair for this library succeeded.
    pub fn is_success(&self) -> bool {
        self.attempted == self.succeeded
    }
}

impl std::fmt::Display for LibraryReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_success() {
            write!(f, "Successfully injected: {}", self.library.display())
        } else {
            write!(
                f,
                "Failed to inject: {} ({}/{} instances)",
                self.library.display(),
                self.succeeded,
                self.attempted
            )
        }
    }
}

/// Result of a full injection pass.
#[derive(Debug, Clone, Default)]
pub struct InjectionReport {
    libraries: Vec<LibraryReport>,
    pairs: Vec<PairOutcome>,
    environment_unsupported: bool,
}

impl InjectionReport {
    /// True when no pair failed and the pass was not aborted.
    pub fn is_success(&self) -> bool {
        !self.environment_unsupported && self.pairs.iter().all(|p| p.outcome.is_success())
    }

    /// Number of pairs the injector was called for.
    pub fn attempted_pairs(&self) -> usize {
        self.pairs.len()
    }

    pub fn pairs(&self) -> &[PairOutcome] {
        &self.pairs
    }

    /// Libraries whose targets were all attempted, in injection order.
    pub fn libraries(&self) -> &[LibraryReport] {
        &self.libraries
    }

    /// True when the pass stopped because remote allocation is unavailable.
    pub fn environment_unsupported(&self) -> bool {
        self.environment_unsupported
    }
}

/// Inject each library into each target, libraries outer, targets inner.
///
/// A failed pair does not stop the pass. An `EnvironmentUnsupported` pair
/// stops it immediately.
///
/// # Errors
/// Propagates the injector's fatal errors unchanged.
pub fn inject_all<T, I>(
    injector: &I,
    libraries: &[PathBuf],
    targets: &[T],
) -> InjectionResult<InjectionReport>
where
    I: LibraryInjector<T> + ?Sized,
{
    log::info!(
        "Injecting {} libraries into {} processes using {}",
        libraries.len(),
        targets.len(),
        injector.name()
    );

    let mut report = InjectionReport::default();

    for (library_index, library) in libraries.iter().enumerate() {
        let mut tally = LibraryReport {
            library: library.clone(),
            attempted: 0,
            succeeded: 0,
        };

        for (target_index, target) in targets.iter().enumerate() {
            let outcome = injector.inject_one(library, target)?;

            report.pairs.push(PairOutcome {
                library_index,
                target_index,
                outcome,
            });

            if outcome == InjectionOutcome::EnvironmentUnsupported {
                report.environment_unsupported = true;
                return Ok(report);
            }

            tally.attempted += 1;
            if outcome.is_success() {
                tally.succeeded += 1;
            }
        }

        if tally.is_success() {
            log::info!("{}", tally);
        } else {
            log::warn!("{}", tally);
        }
        report.libraries.push(tally);
    }

    Ok(report)
}
