//! Validator façade.
//!
//! A [`Validator`] owns one parsed document, one dialect selection, and one
//! ordered finding list. Construction parses the input (parse failures
//! become findings, not `Err`s) and resolves the dialect's compiled schema
//! from the registry (configuration failures do surface as `Err`s). The
//! schema check itself runs lazily, at most once, on the first call to
//! [`Validator::is_valid`] or [`Validator::findings`].

use std::io::Read;
use std::sync::Arc;

use tracing::debug;

use crate::bridge::ErrorCapture;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::finding::{Finding, FindingKind};
use crate::libxml2::{XmlDocument, XmlEngine, XmlSchemaPtr};
use crate::registry::SchemaRegistry;
use crate::rules;

/// Validates one metadata document against one dialect.
///
/// Intended for sequential use by a single caller; share the
/// [`SchemaRegistry`] across validators, not the validator itself.
#[derive(Debug)]
pub struct Validator {
    engine: XmlEngine,
    dialect: Dialect,
    schema: XmlSchemaPtr,
    document: Option<XmlDocument>,
    findings: Vec<Finding>,
    schema_checked: bool,
}

impl Validator {
    /// Build a validator from in-memory XML.
    ///
    /// The dialect's schema is resolved eagerly so that configuration
    /// problems (an uncompilable bundled schema) fail here rather than
    /// during a later query. A document that fails to parse does *not*
    /// produce an `Err`: the validator is returned with the parse findings
    /// recorded and [`Validator::is_well_formed`] reporting false.
    pub fn from_bytes(xml: &[u8], dialect: Dialect, registry: &Arc<SchemaRegistry>) -> Result<Self> {
        let schema = registry.schema(dialect)?;
        let engine = registry.engine();

        let mut capture = ErrorCapture::new(FindingKind::ParseError);
        let document = engine.parse_document(xml, &mut capture);
        let findings = capture.into_findings();
        debug!(
            %dialect,
            well_formed = document.is_some(),
            parse_findings = findings.len(),
            "document loaded"
        );

        Ok(Self {
            engine,
            dialect,
            schema,
            document,
            findings,
            schema_checked: false,
        })
    }

    /// Build a validator from a UTF-8 string.
    pub fn from_xml_str(xml: &str, dialect: Dialect, registry: &Arc<SchemaRegistry>) -> Result<Self> {
        Self::from_bytes(xml.as_bytes(), dialect, registry)
    }

    /// Build a validator by reading the input to the end.
    ///
    /// I/O failure is a hard error, not a finding: nothing was validated.
    pub fn from_reader<R: Read>(
        mut reader: R,
        dialect: Dialect,
        registry: &Arc<SchemaRegistry>,
    ) -> Result<Self> {
        let mut xml = Vec::new();
        reader.read_to_end(&mut xml)?;
        Self::from_bytes(&xml, dialect, registry)
    }

    /// The dialect this validator checks against.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// True iff the input parsed as XML, independent of schema and
    /// heuristic outcomes.
    pub fn is_well_formed(&self) -> bool {
        self.document.is_some()
    }

    /// Overall verdict: true iff the finding list is empty after the schema
    /// check has run. Any finding counts, including heuristic suggestions;
    /// use [`Validator::has_violations`] for a severity-aware verdict.
    pub fn is_valid(&mut self) -> bool {
        self.check_schema();
        self.findings.is_empty()
    }

    /// Severity-aware verdict: true iff any parse or schema finding was
    /// recorded. Heuristic suggestions do not count.
    pub fn has_violations(&mut self) -> bool {
        self.check_schema();
        self.findings.iter().any(Finding::is_violation)
    }

    /// All accumulated findings in discovery order, running the schema
    /// check first if it has not run yet.
    pub fn findings(&mut self) -> &[Finding] {
        self.check_schema();
        &self.findings
    }

    /// The parse and schema findings only.
    pub fn violations(&mut self) -> Vec<&Finding> {
        self.check_schema();
        self.findings.iter().filter(|f| f.is_violation()).collect()
    }

    /// The heuristic findings only.
    pub fn suggestions(&mut self) -> Vec<&Finding> {
        self.check_schema();
        self.findings
            .iter()
            .filter(|f| f.kind == FindingKind::Suggestion)
            .collect()
    }

    /// Validate the document against the dialect's schema.
    ///
    /// Idempotent: the check runs at most once per validator, no matter how
    /// many times this (or any query that triggers it) is called. A no-op
    /// when the document is absent. Internal libxml2 failures are recorded
    /// as findings rather than aborting the run.
    pub fn check_schema(&mut self) {
        if self.schema_checked {
            return;
        }
        self.schema_checked = true;

        let Some(document) = &self.document else {
            return;
        };

        let mut capture = ErrorCapture::new(FindingKind::SchemaViolation);
        match self.engine.validate_document(&self.schema, document, &mut capture) {
            Ok(conforms) => {
                debug!(dialect = %self.dialect, conforms, "schema check complete");
            }
            Err(err) => {
                capture.record(&format!("schema validation aborted: {err}"), None);
            }
        }
        self.findings.extend(capture.into_findings());
    }

    /// Run the conventional heuristic suite: format and type picklists,
    /// agent name checks, and the format-exclusivity check. No-op on a
    /// document that failed to parse.
    pub fn run_standard_checks(&mut self) {
        if let Some(document) = &self.document {
            rules::run_standard_checks(document, &mut self.findings);
        }
    }

    /// Picklist check for one element. Also runs the list check on it.
    pub fn check_picklist(&mut self, element: &str, allowed: &[&str]) {
        if let Some(document) = &self.document {
            rules::check_picklist(document, &mut self.findings, element, allowed);
        }
    }

    /// Delimited-list check for one element.
    pub fn check_list(&mut self, element: &str) {
        if let Some(document) = &self.document {
            rules::check_list(document, &mut self.findings, element);
        }
    }

    /// "Last, First" name-order check for one element.
    pub fn check_names(&mut self, element: &str) {
        if let Some(document) = &self.document {
            rules::check_names(document, &mut self.findings, element);
        }
    }

    /// Dual digital/physical format check over every instantiation.
    pub fn check_format_exclusivity(&mut self) {
        if let Some(document) = &self.document {
            rules::check_format_exclusivity(document, &mut self.findings);
        }
    }
}
