//! Heuristic content checks.
//!
//! These run over the parsed tree after (or independently of) schema
//! validation and report stylistic problems as [`FindingKind::Suggestion`]
//! findings: picklist mismatches, delimiter-separated values crammed into
//! one element, "First Last" names that PBCore convention wants as
//! "Last, First", and instantiations that claim to be both digital and
//! physical.
//!
//! Element selection is namespace-aware: a node matches when its local name
//! matches and it is either in the metadata namespace (whatever prefix the
//! document chose, including a default `xmlns`) or in no namespace at all,
//! so unqualified input is not silently skipped.

use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

use crate::dialect::METADATA_NAMESPACE;
use crate::finding::Finding;
use crate::libxml2::{NodeRef, XmlDocument};

/// Cached regex for "First [Middle] Last" name detection
static NAME_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Get or initialize the name-order regex.
///
/// Matches "word[.] word" and "word[.] word[.] word"; anything containing a
/// comma or other punctuation falls through (comma-delimited content is the
/// list check's business).
fn name_pattern() -> &'static Regex {
    NAME_PATTERN.get_or_init(|| {
        Regex::new(r"^(\w+\.?)\s+(?:\w+\.?\s+)?(\w+)$").expect("Failed to compile name regex")
    })
}

/// Suggested physical formats for `formatPhysical`.
pub const PHYSICAL_FORMATS: &[&str] = &[
    "Betacam",
    "Betacam SP",
    "Digital Betacam",
    "VHS",
    "S-VHS",
    "U-matic",
    "DVD",
    "Audio CD",
    "MiniDV",
    "DAT",
    "16mm film",
    "35mm film",
];

/// Suggested digital formats (MIME types) for `formatDigital`.
pub const DIGITAL_FORMATS: &[&str] = &[
    "video/mpeg",
    "video/quicktime",
    "video/x-ms-wmv",
    "audio/mpeg",
    "audio/wav",
    "audio/x-aiff",
    "application/pdf",
    "image/jpeg",
    "image/tiff",
];

/// Suggested title types for `titleType`.
pub const TITLE_TYPES: &[&str] = &[
    "Package",
    "Project",
    "Collection",
    "Series",
    "Episode",
    "Program",
    "Segment",
];

/// Suggested creator roles for `creatorRole`.
pub const CREATOR_ROLES: &[&str] = &[
    "Producer",
    "Director",
    "Writer",
    "Host",
    "Editor",
    "Interviewer",
    "Photographer",
];

/// Collect every element named `name` in the metadata namespace (or in no
/// namespace), in document order.
fn select<'d>(doc: &'d XmlDocument, name: &str) -> Vec<NodeRef<'d>> {
    let mut matches = Vec::new();
    if let Some(root) = doc.root() {
        collect(root, name, &mut matches);
    }
    matches
}

fn collect<'d>(node: NodeRef<'d>, name: &str, matches: &mut Vec<NodeRef<'d>>) {
    if !node.is_element() {
        return;
    }
    if node.name() == Some(name) && in_metadata_namespace(node) {
        matches.push(node);
    }
    for child in node.children() {
        collect(child, name, matches);
    }
}

fn in_metadata_namespace(node: NodeRef<'_>) -> bool {
    match node.namespace_href() {
        Some(href) => href == METADATA_NAMESPACE,
        None => true,
    }
}

/// True when `node` has a descendant element named `name` at any depth.
fn has_descendant(node: NodeRef<'_>, name: &str) -> bool {
    node.children().any(|child| {
        child.is_element()
            && ((child.name() == Some(name) && in_metadata_namespace(child))
                || has_descendant(child, name))
    })
}

/// Picklist check.
///
/// Empty content suggests omitting the element; non-empty content that is
/// not a case-insensitive match for any suggested value is flagged with the
/// offending value. Always also runs the list check for the same element,
/// since a delimited list can never be a picklist match.
pub(crate) fn check_picklist(
    doc: &XmlDocument,
    findings: &mut Vec<Finding>,
    element: &str,
    allowed: &[&str],
) {
    for node in select(doc, element) {
        let content = node.text_content();
        let value = content.trim();
        if value.is_empty() {
            findings.push(Finding::suggestion(
                format!("{element} is empty, consider omitting it"),
                node.line(),
            ));
        } else if !allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
            trace!(element, value, "picklist mismatch");
            findings.push(Finding::suggestion(
                format!("value \"{value}\" is not in the suggested picklist for {element}"),
                node.line(),
            ));
        }
    }
    check_list(doc, findings, element);
}

/// List-content check: a comma, pipe, or semicolon in the content usually
/// means several values were packed into one element.
pub(crate) fn check_list(doc: &XmlDocument, findings: &mut Vec<Finding>, element: &str) {
    for node in select(doc, element) {
        let content = node.text_content();
        if content.contains([',', '|', ';']) {
            findings.push(Finding::suggestion(
                format!(
                    "content of {element} looks like a delimited list; \
                     repeat the element instead"
                ),
                node.line(),
            ));
        }
    }
}

/// Name-format check: content that looks like "First [Middle] Last" gets a
/// "Last, First" suggestion. Best-effort only; short names produce false
/// positives and that is accepted.
pub(crate) fn check_names(doc: &XmlDocument, findings: &mut Vec<Finding>, element: &str) {
    for node in select(doc, element) {
        let content = node.text_content();
        let value = content.trim();
        if let Some(caps) = name_pattern().captures(value) {
            let first = &caps[1];
            let last = &caps[2];
            findings.push(Finding::suggestion(
                format!("{element} \"{value}\" looks like a name; consider \"{last}, {first}\""),
                node.line(),
            ));
        }
    }
}

/// Mutually-exclusive-format check: one finding per instantiation that has
/// both a digital and a physical format descendant, at any depth.
pub(crate) fn check_format_exclusivity(doc: &XmlDocument, findings: &mut Vec<Finding>) {
    for node in select(doc, "pbcoreInstantiation") {
        if has_descendant(node, "formatDigital") && has_descendant(node, "formatPhysical") {
            findings.push(Finding::suggestion(
                "instantiation contains both a digital and a physical format; \
                 likely unintended"
                    .to_string(),
                node.line(),
            ));
        }
    }
}

/// The conventional check suite applied to every document: picklists for
/// the format and type elements, name checks for the agent elements, and
/// the format-exclusivity check.
pub(crate) fn run_standard_checks(doc: &XmlDocument, findings: &mut Vec<Finding>) {
    check_picklist(doc, findings, "formatPhysical", PHYSICAL_FORMATS);
    check_picklist(doc, findings, "formatDigital", DIGITAL_FORMATS);
    check_picklist(doc, findings, "titleType", TITLE_TYPES);
    check_picklist(doc, findings, "creatorRole", CREATOR_ROLES);
    check_names(doc, findings, "creator");
    check_names(doc, findings, "contributor");
    check_names(doc, findings, "publisher");
    check_format_exclusivity(doc, findings);
}
