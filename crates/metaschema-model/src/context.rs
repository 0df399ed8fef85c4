//! Inputs shared by every module build.

use std::sync::Arc;

use metaschema_core::{BuiltinDataTypes, DataTypeRegistry, ModelConfig};

use crate::error::ModelResult;

/// Configuration and datatype registry used to build modules.
#[derive(Debug, Clone)]
pub struct BuildContext {
    config: ModelConfig,
    datatypes: Arc<dyn DataTypeRegistry>,
}

impl BuildContext {
    pub fn new(config: ModelConfig, datatypes: Arc<dyn DataTypeRegistry>) -> Self {
        Self { config, datatypes }
    }

    /// Builtin datatypes with configuration read from the environment.
    ///
    /// See [`ModelConfig::from_env`] for the variables consulted.
    pub fn from_env() -> ModelResult<Self> {
        Ok(Self::new(
            ModelConfig::from_env()?,
            Arc::new(BuiltinDataTypes::new()),
        ))
    }

    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn datatypes(&self) -> &Arc<dyn DataTypeRegistry> {
        &self.datatypes
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(ModelConfig::default(), Arc::new(BuiltinDataTypes::new()))
    }
}
