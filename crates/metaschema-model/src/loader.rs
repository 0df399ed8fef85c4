//! # Module Loader
//!
//! Builds a module and its transitive imports from raw documents keyed by
//! location. Import hrefs resolve against the importing document's
//! location. Each location is built once; a module imported from several
//! places is the same `Arc` everywhere.
//!
//! The loader does no I/O. Callers parse documents with whatever serde
//! front-end they use and register the resulting [`RawModule`]s.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use metaschema_core::CoreError;

use crate::context::BuildContext;
use crate::error::{ModelError, ModelResult};
use crate::module::Module;
use crate::raw::RawModule;

#[derive(Debug, Default)]
pub struct ModuleLoader {
    context: BuildContext,
    documents: HashMap<Url, RawModule>,
    modules: HashMap<Url, Arc<Module>>,
}

impl ModuleLoader {
    pub fn new(context: BuildContext) -> Self {
        Self {
            context,
            documents: HashMap::new(),
            modules: HashMap::new(),
        }
    }

    /// Register a raw document. Replaces any earlier document at the same
    /// location; modules already built are unaffected.
    pub fn add_document(&mut self, location: Url, raw: RawModule) -> &mut Self {
        self.documents.insert(location, raw);
        self
    }

    /// The module built from `location`, if it has been loaded.
    pub fn module(&self, location: &Url) -> Option<&Arc<Module>> {
        self.modules.get(location)
    }

    /// Build the module at `location` and everything it imports.
    pub fn load(&mut self, location: &Url) -> ModelResult<Arc<Module>> {
        if !self.documents.contains_key(location) && !self.modules.contains_key(location) {
            return Err(ModelError::MissingImport {
                href: location.to_string(),
                module: "<loader>".to_string(),
            });
        }
        let mut stack = Vec::new();
        self.load_at(location, &mut stack)
    }

    fn load_at(&mut self, location: &Url, stack: &mut Vec<Url>) -> ModelResult<Arc<Module>> {
        if let Some(module) = self.modules.get(location) {
            return Ok(Arc::clone(module));
        }
        if let Some(at) = stack.iter().position(|u| u == location) {
            let chain = stack[at..]
                .iter()
                .chain(std::iter::once(location))
                .map(Url::as_str)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ModelError::ImportCycle { chain });
        }
        let raw = match self.documents.get(location) {
            Some(raw) => raw.clone(),
            None => {
                return Err(ModelError::MissingImport {
                    href: location.to_string(),
                    module: "<loader>".to_string(),
                })
            }
        };

        stack.push(location.clone());
        let mut imports = Vec::with_capacity(raw.imports.len());
        for import in &raw.imports {
            let href = location
                .join(&import.href)
                .map_err(|e| CoreError::InvalidUri {
                    uri: import.href.clone(),
                    reason: e.to_string(),
                })?;
            if !self.documents.contains_key(&href) && !self.modules.contains_key(&href) {
                return Err(ModelError::MissingImport {
                    href: import.href.clone(),
                    module: raw.short_name.clone(),
                });
            }
            imports.push(self.load_at(&href, stack)?);
        }
        stack.pop();

        let module = Module::build_at(raw, Some(location.clone()), imports, &self.context)?;
        debug!(
            module = module.short_name(),
            location = %location,
            "loaded module"
        );
        self.modules.insert(location.clone(), Arc::clone(&module));
        Ok(module)
    }
}
