//! Schema registry.
//!
//! Compiles each dialect's bundled XSD at most once and hands out shared
//! handles to the compiled schema for the life of the process. Nothing is
//! ever evicted: the schemas are static resources baked into the binary.
//!
//! The registry is an explicitly constructed object, not a hidden global.
//! Build one at startup and pass it (usually behind an `Arc`) to every
//! [`Validator`](crate::Validator).

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::libxml2::{XmlEngine, XmlSchemaPtr};

/// Compile-once cache of the bundled dialect schemas.
///
/// The cache lock also serializes compilation, which matters beyond
/// avoiding duplicate work: libxml2 schema parsing is not thread-safe.
/// Lookups after the first clone an `Arc`-backed handle; compiled schemas
/// are read-only and safe to share across threads.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    engine: XmlEngine,
    cache: Mutex<HashMap<Dialect, XmlSchemaPtr>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self {
            engine: XmlEngine::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn engine(&self) -> XmlEngine {
        self.engine
    }

    /// The compiled schema for `dialect`, compiling it on first request.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaCompile`] when libxml2 rejects the bundled XSD. That
    /// is a build/deployment defect, so it surfaces as a hard error rather
    /// than a per-document finding.
    pub fn schema(&self, dialect: Dialect) -> Result<XmlSchemaPtr> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(schema) = cache.get(&dialect) {
            debug!(%dialect, "schema cache hit");
            return Ok(schema.clone());
        }

        debug!(%dialect, "compiling bundled schema");
        let schema = self
            .engine
            .compile_schema(dialect.schema_source())
            .map_err(|details| Error::SchemaCompile { dialect, details })?;
        cache.insert(dialect, schema.clone());
        Ok(schema)
    }

    /// Compile every dialect's schema up front, for fail-fast startup.
    pub fn preload(&self) -> Result<()> {
        for dialect in Dialect::ALL {
            self.schema(dialect)?;
        }
        Ok(())
    }
}
