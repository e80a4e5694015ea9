//! State resolved once at startup and torn down after the run.

use crate::error::InjectionError;
use crate::injection::ModuleLoader;
use crate::knowledge::{KnowledgeLibrary, KnowledgeOverride};
use crate::process::LaunchedProcess;
use std::path::Path;

/// The module loader address and the optional knowledge library.
pub struct LoaderContext {
    module_loader: ModuleLoader,
    knowledge: Option<KnowledgeLibrary>,
}

impl LoaderContext {
    /// Resolve the module loader and load the knowledge library, if any.
    ///
    /// `Knowledge_Init` is called with `game_path` once the library loads.
    ///
    /// # Errors
    /// Fails when `LoadLibraryW` cannot be resolved or the knowledge library
    /// exists but cannot be loaded.
    pub fn init(
        knowledge_path: Option<&Path>,
        game_path: &Path,
    ) -> Result<Self, InjectionError> {
        let module_loader = ModuleLoader::resolve()?;

        let knowledge = match knowledge_path {
            Some(path) => KnowledgeLibrary::load(path)?,
            None => None,
        };

        if let Some(knowledge) = &knowledge {
            knowledge.init(game_path);
        }

        Ok(Self {
            module_loader,
            knowledge,
        })
    }

    pub fn module_loader(&self) -> ModuleLoader {
        self.module_loader
    }

    pub fn knowledge(&self) -> Option<&KnowledgeLibrary> {
        self.knowledge.as_ref()
    }

    pub fn print_game_info(&self) {
        if let Some(knowledge) = &self.knowledge {
            knowledge.print_game_info();
        }
    }

    /// The knowledge library's injection override, if it exports one.
    pub fn injection_override(&self) -> Option<KnowledgeOverride<'_>> {
        self.knowledge
            .as_ref()
            .and_then(KnowledgeLibrary::injection_override)
    }

    /// Let the knowledge library clean up, then unload it.
    ///
    /// Call before the process handles are closed.
    pub fn shutdown(mut self, processes: &[LaunchedProcess]) -> Result<(), InjectionError> {
        if let Some(knowledge) = self.knowledge.take() {
            knowledge.deinit(processes);
            knowledge.unload()?;
        }

        Ok(())
    }
}
