//! Closure-backed serializer

use super::LogSerializer;
use crate::error::EmailResult;
use crate::log_model::LogModel;
use std::fmt;
use std::sync::Arc;

/// Function rendering a log event to text
pub type GeneratorFn = dyn Fn(&LogModel) -> String + Send + Sync;

/// Renders log events with a user-supplied function
#[derive(Clone)]
pub struct GeneratorFunctionLogSerializer {
    generator: Arc<GeneratorFn>,
}

impl GeneratorFunctionLogSerializer {
    pub fn new<F>(generator: F) -> Self
    where
        F: Fn(&LogModel) -> String + Send + Sync + 'static,
    {
        Self {
            generator: Arc::new(generator),
        }
    }
}

impl fmt::Debug for GeneratorFunctionLogSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorFunctionLogSerializer").finish_non_exhaustive()
    }
}

impl LogSerializer for GeneratorFunctionLogSerializer {
    fn serialize(&self, log: &LogModel) -> EmailResult<String> {
        Ok((self.generator)(log))
    }
}
