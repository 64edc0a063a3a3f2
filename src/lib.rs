//! # pbcore-validate
//!
//! Schema and content validation for PBCore and Simple Dublin Core metadata
//! documents, built on libxml2.
//!
//! Each [`Validator`] owns one parsed document and one [`Dialect`]
//! selection, validates the document against the dialect's bundled XSD, and
//! layers heuristic content checks on top (picklist conformance,
//! delimiter-as-list detection, "Last, First" name-order suggestions, and
//! mixed digital/physical instantiation detection). Schema violations and
//! heuristic suggestions accumulate in one ordered [`Finding`] list, each
//! entry tagged with its [`FindingKind`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use pbcore_validate::{Dialect, SchemaRegistry, Validator};
//!
//! # fn main() -> pbcore_validate::Result<()> {
//! let registry = Arc::new(SchemaRegistry::new());
//! let xml = std::fs::read("description.xml")?;
//!
//! let mut validator = Validator::from_bytes(&xml, Dialect::Pbcore12, &registry)?;
//! validator.run_standard_checks();
//!
//! if !validator.is_valid() {
//!     for finding in validator.findings() {
//!         eprintln!("{finding}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod dialect;
pub mod error;
pub mod finding;
pub mod libxml2;
pub mod registry;
pub mod rules;
pub mod validator;

pub use dialect::{Dialect, METADATA_NAMESPACE};
pub use error::{Error, Result};
pub use finding::{Finding, FindingKind};
pub use libxml2::{XmlDocument, XmlEngine, XmlSchemaPtr};
pub use registry::SchemaRegistry;
pub use rules::{CREATOR_ROLES, DIGITAL_FORMATS, PHYSICAL_FORMATS, TITLE_TYPES};
pub use validator::Validator;
