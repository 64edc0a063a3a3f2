//! LibXML2 FFI wrapper.
//!
//! Safe wrappers around the libxml2 calls this crate needs: parsing a
//! document from memory, compiling an XSD, validating a parsed document
//! against a compiled schema, and walking the resulting element tree for the
//! heuristic checks.
//!
//! The Rust ecosystem has no mature pure-Rust XSD validator (roxmltree,
//! quick-xml and friends parse but do not validate), so validation goes
//! through direct libxml2 FFI. Thread-safety rules from the libxml2
//! documentation (http://xmlsoft.org/threads.html) that shape this module:
//!
//! - **Schema parsing is NOT thread-safe** — callers must serialize it
//!   (the [`SchemaRegistry`](crate::SchemaRegistry) lock does this).
//! - **Validation is thread-safe** across documents; each call creates its
//!   own validation context and compiled schemas are read-only, so
//!   [`XmlSchemaPtr`] is `Send + Sync` behind an `Arc`.
//! - Error reporting for `xmlReadMemory` goes through a process-global
//!   structured-error slot; [`crate::bridge`] serializes access to it.

use std::ffi::CStr;
use std::marker::PhantomData;
use std::ptr;
use std::sync::{Arc, Once};

use libc::{c_char, c_int, c_long, c_uchar, c_void};

use crate::bridge::{ErrorCapture, capture_structured_error};
use crate::finding::FindingKind;

/// One-time libxml2 parser initialization.
///
/// libxml2's initialization functions are not thread-safe, so they are
/// guarded by `std::sync::Once`.
static LIBXML2_INIT: Once = Once::new();

/// `xmlElementType` value for element nodes.
const XML_ELEMENT_NODE: c_int = 1;

/// `xmlParserOption`: forbid network access during parsing.
const XML_PARSE_NONET: c_int = 1 << 11;

/// `xmlParserOption`: store line numbers above 65535 instead of capping
/// them, so findings in large documents keep real positions.
const XML_PARSE_BIG_LINES: c_int = 1 << 22;

/// `xmlErrorLevel`: recoverable error. Anything below this (warnings) is
/// not recorded as a finding.
pub(crate) const XML_ERR_ERROR: c_int = 2;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

/// Public `xmlNs` layout from libxml2's `tree.h`. Declared here the same way
/// [`xmlError`] is: the layout is part of libxml2's stable public ABI.
#[repr(C)]
pub struct XmlNs {
    pub next: *mut XmlNs,
    pub typ: c_int,
    pub href: *const c_uchar,
    pub prefix: *const c_uchar,
    pub _private: *mut c_void,
    pub context: *mut c_void,
}

/// Public `xmlNode` layout from libxml2's `tree.h`.
#[repr(C)]
pub struct XmlNode {
    pub _private: *mut c_void,
    pub typ: c_int,
    pub name: *const c_uchar,
    pub children: *mut XmlNode,
    pub last: *mut XmlNode,
    pub parent: *mut XmlNode,
    pub next: *mut XmlNode,
    pub prev: *mut XmlNode,
    pub doc: *mut XmlDoc,
    pub ns: *mut XmlNs,
    pub content: *mut c_uchar,
    pub properties: *mut c_void,
    pub ns_def: *mut XmlNs,
    pub psvi: *mut c_void,
    pub line: u16,
    pub extra: u16,
}

/// Public `xmlError` layout.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut xmlError)>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();

    // Document parsing and tree access
    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);
    pub fn xmlDocGetRootElement(doc: *const XmlDoc) -> *mut XmlNode;
    pub fn xmlNodeGetContent(node: *const XmlNode) -> *mut c_uchar;
    pub fn xmlGetLineNo(node: *const XmlNode) -> c_long;

    /// libxml2's deallocator, exported as a global function pointer.
    pub static xmlFree: unsafe extern "C" fn(mem: *mut c_void);

    /// Process-global structured-error slot. See [`crate::bridge`] for the
    /// serialization contract around this.
    pub fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);

    // Schema parsing functions
    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );

    // Schema validation functions
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaValidateDoc(ctxt: *const XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        sherr: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
}

/// Shared, read-only handle to a compiled schema.
///
/// The `Arc` ensures the underlying `xmlSchema` is freed exactly once, and
/// lets the registry hand the same compiled schema to any number of
/// concurrent validators.
#[derive(Debug, Clone)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
}

// Safety: compiled xmlSchema structures are read-only after parsing and
// documented as thread-safe for reading. See http://xmlsoft.org/threads.html
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must be a non-null schema allocated by libxml2, and no other
    /// code may free it.
    unsafe fn from_raw(ptr: *mut XmlSchema) -> Self {
        debug_assert!(!ptr.is_null());
        XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner { ptr }),
        }
    }

    /// Raw pointer for FFI calls. Valid only while this handle lives; the
    /// caller must not free it.
    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        // The Arc guarantees this runs exactly once per compiled schema.
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = ptr::null_mut();
        }
    }
}

/// An owned, parsed document tree.
///
/// Exactly one [`Validator`](crate::Validator) owns each document; the tree
/// is freed when the document is dropped.
#[derive(Debug)]
pub struct XmlDocument {
    ptr: *mut XmlDoc,
}

// Safety: the tree is only ever read after parsing, and ownership is unique,
// so moving a document to another thread is sound. No Sync: NodeRef hands
// out unsynchronized interior pointers.
unsafe impl Send for XmlDocument {}

impl XmlDocument {
    pub(crate) fn as_ptr(&self) -> *mut XmlDoc {
        self.ptr
    }

    /// The document's root element, if it has one.
    pub fn root(&self) -> Option<NodeRef<'_>> {
        let root = unsafe { xmlDocGetRootElement(self.ptr) };
        if root.is_null() {
            None
        } else {
            Some(NodeRef {
                ptr: root,
                _doc: PhantomData,
            })
        }
    }
}

impl Drop for XmlDocument {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlFreeDoc(self.ptr);
            }
            self.ptr = ptr::null_mut();
        }
    }
}

/// Borrowed cursor into a parsed document's node tree.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'d> {
    ptr: *const XmlNode,
    _doc: PhantomData<&'d XmlDocument>,
}

impl<'d> NodeRef<'d> {
    fn node(&self) -> &'d XmlNode {
        // Safety: ptr came from a live document borrowed for 'd, and libxml2
        // never relocates nodes of a fully parsed tree.
        unsafe { &*self.ptr }
    }

    /// True for element nodes (as opposed to text, comments, etc.).
    pub fn is_element(&self) -> bool {
        self.node().typ == XML_ELEMENT_NODE
    }

    /// The node's local name, without any namespace prefix.
    pub fn name(&self) -> Option<&'d str> {
        let name = self.node().name;
        if name.is_null() {
            return None;
        }
        unsafe { CStr::from_ptr(name as *const c_char) }.to_str().ok()
    }

    /// The href of the node's namespace, if the node is in one.
    pub fn namespace_href(&self) -> Option<&'d str> {
        let ns = self.node().ns;
        if ns.is_null() {
            return None;
        }
        let href = unsafe { (*ns).href };
        if href.is_null() {
            return None;
        }
        unsafe { CStr::from_ptr(href as *const c_char) }.to_str().ok()
    }

    /// Iterator over the node's direct children (all node types).
    pub fn children(&self) -> Children<'d> {
        Children {
            next: self.node().children,
            _doc: PhantomData,
        }
    }

    /// Concatenated text content of the node and its descendants.
    pub fn text_content(&self) -> String {
        let content = unsafe { xmlNodeGetContent(self.ptr) };
        if content.is_null() {
            return String::new();
        }
        let text = unsafe { CStr::from_ptr(content as *const c_char) }
            .to_string_lossy()
            .into_owned();
        unsafe {
            xmlFree(content as *mut c_void);
        }
        text
    }

    /// 1-based source line of the node, if libxml2 recorded one.
    pub fn line(&self) -> Option<u32> {
        let line = unsafe { xmlGetLineNo(self.ptr) };
        if line > 0 { Some(line as u32) } else { None }
    }
}

/// Iterator over sibling nodes, produced by [`NodeRef::children`].
pub struct Children<'d> {
    next: *const XmlNode,
    _doc: PhantomData<&'d XmlDocument>,
}

impl<'d> Iterator for Children<'d> {
    type Item = NodeRef<'d>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next.is_null() {
            return None;
        }
        let node = NodeRef {
            ptr: self.next,
            _doc: PhantomData,
        };
        self.next = unsafe { (*self.next).next };
        Some(node)
    }
}

/// Entry point for libxml2 operations.
///
/// Construction initializes libxml2 exactly once; the struct itself is
/// zero-sized and freely cloneable.
#[derive(Debug, Clone, Copy)]
pub struct XmlEngine;

impl XmlEngine {
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
        });
        XmlEngine
    }

    /// Compile an XSD from its source text.
    ///
    /// Not thread-safe; the caller must serialize compilation (the schema
    /// registry compiles under its cache lock). Compile diagnostics are
    /// captured through a handler scoped to the parser context, never the
    /// global error slot, so a compile can run while another thread holds
    /// the slot for a parse. On failure the collected diagnostics are
    /// returned as the error message.
    pub fn compile_schema(&self, source: &str) -> std::result::Result<XmlSchemaPtr, String> {
        let mut capture = ErrorCapture::new(FindingKind::SchemaViolation);
        unsafe {
            let parser_ctxt =
                xmlSchemaNewMemParserCtxt(source.as_ptr() as *const c_char, source.len() as c_int);
            if parser_ctxt.is_null() {
                return Err("schema parser context allocation failed".to_string());
            }

            let capture_ptr = &mut capture as *mut ErrorCapture as *mut c_void;
            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(capture_structured_error),
                capture_ptr,
            );

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            if schema_ptr.is_null() {
                let details: Vec<String> = capture
                    .into_findings()
                    .into_iter()
                    .map(|finding| finding.message)
                    .collect();
                if details.is_empty() {
                    Err("schema did not compile".to_string())
                } else {
                    Err(details.join("; "))
                }
            } else {
                Ok(XmlSchemaPtr::from_raw(schema_ptr))
            }
        }
    }

    /// Parse a document from memory.
    ///
    /// Parse errors are routed into `capture` through the global
    /// structured-error slot (held for the duration of the call, see
    /// [`crate::bridge`]). Returns `None` on fatal parse failure; in that
    /// case `capture` holds at least one finding.
    pub fn parse_document(&self, xml: &[u8], capture: &mut ErrorCapture) -> Option<XmlDocument> {
        let doc = {
            let _guard = crate::bridge::GlobalErrorGuard::install(capture);
            unsafe {
                xmlReadMemory(
                    xml.as_ptr() as *const c_char,
                    xml.len() as c_int,
                    ptr::null(),
                    ptr::null(),
                    XML_PARSE_NONET | XML_PARSE_BIG_LINES,
                )
            }
        };

        if doc.is_null() {
            // libxml2 reports nothing for empty input
            if capture.is_empty() {
                capture.record("input is not well-formed XML", None);
            }
            None
        } else {
            Some(XmlDocument { ptr: doc })
        }
    }

    /// Validate a parsed document against a compiled schema.
    ///
    /// Violations are appended to `capture` in the order libxml2 reports
    /// them (document order). Returns `Ok(true)` when the document conforms.
    /// Thread-safe: each call builds its own validation context and the
    /// error capture is context-scoped, not global.
    pub fn validate_document(
        &self,
        schema: &XmlSchemaPtr,
        doc: &XmlDocument,
        capture: &mut ErrorCapture,
    ) -> crate::error::Result<bool> {
        unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(crate::error::Error::ValidationContext);
            }

            let capture_ptr = capture as *mut ErrorCapture as *mut c_void;
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(capture_structured_error),
                capture_ptr,
            );

            let code = xmlSchemaValidateDoc(valid_ctxt, doc.as_ptr());
            xmlSchemaFreeValidCtxt(valid_ctxt);

            match code {
                0 => Ok(true),
                n if n > 0 => Ok(false),
                n => Err(crate::error::Error::Internal { code: n }),
            }
        }
    }
}

impl Default for XmlEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="root" type="xs:string"/>
</xs:schema>"#;

    #[test]
    fn test_schema_compile_success() {
        let engine = XmlEngine::new();
        assert!(engine.compile_schema(SIMPLE_XSD).is_ok());
    }

    #[test]
    fn test_schema_compile_rejects_garbage() {
        let engine = XmlEngine::new();
        assert!(engine.compile_schema("<invalid>not a schema</invalid>").is_err());
    }

    #[test]
    fn test_schema_compile_failure_reports_diagnostics() {
        let engine = XmlEngine::new();
        // An xs:element with no name; libxml2 reports the missing attribute.
        let bad_xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element/>
</xs:schema>"#;

        let details = engine.compile_schema(bad_xsd).unwrap_err();
        assert!(!details.is_empty());
        assert!(details.contains("name"), "got: {details}");
    }

    #[test]
    fn test_schema_compile_leaves_installed_parse_capture_untouched() {
        // A compile on one thread must not report through the global error
        // slot another thread has pointed at its own capture.
        let engine = XmlEngine::new();
        let mut parse_capture = ErrorCapture::new(FindingKind::ParseError);

        let guard = crate::bridge::GlobalErrorGuard::install(&mut parse_capture);
        let bad_xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element/>
</xs:schema>"#;
        let result = engine.compile_schema(bad_xsd);
        drop(guard);

        assert!(result.is_err());
        assert!(
            parse_capture.is_empty(),
            "compile diagnostics leaked into the parse capture: {:?}",
            parse_capture.into_findings()
        );
    }

    #[test]
    fn test_parse_document_success() {
        let engine = XmlEngine::new();
        let mut capture = ErrorCapture::new(FindingKind::ParseError);

        let doc = engine.parse_document(b"<root>Hello</root>", &mut capture);
        assert!(doc.is_some());
        assert!(capture.is_empty());
    }

    #[test]
    fn test_parse_document_failure_records_finding() {
        let engine = XmlEngine::new();
        let mut capture = ErrorCapture::new(FindingKind::ParseError);

        let doc = engine.parse_document(b"<root><unclosed></root>", &mut capture);
        assert!(doc.is_none());
        assert!(!capture.is_empty());
    }

    #[test]
    fn test_parse_empty_input_records_generic_finding() {
        let engine = XmlEngine::new();
        let mut capture = ErrorCapture::new(FindingKind::ParseError);

        let doc = engine.parse_document(b"", &mut capture);
        assert!(doc.is_none());
        let findings = capture.into_findings();
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_tree_navigation() {
        let engine = XmlEngine::new();
        let mut capture = ErrorCapture::new(FindingKind::ParseError);
        let xml = b"<root xmlns=\"urn:test\">\n  <child>content</child>\n</root>";

        let doc = engine.parse_document(xml, &mut capture).expect("parses");
        let root = doc.root().expect("has root");
        assert!(root.is_element());
        assert_eq!(root.name(), Some("root"));
        assert_eq!(root.namespace_href(), Some("urn:test"));

        let child = root
            .children()
            .find(|n| n.is_element())
            .expect("has element child");
        assert_eq!(child.name(), Some("child"));
        assert_eq!(child.text_content(), "content");
        assert_eq!(child.line(), Some(2));
    }

    #[test]
    fn test_line_numbers_survive_large_documents() {
        let engine = XmlEngine::new();
        let mut capture = ErrorCapture::new(FindingKind::ParseError);

        let mut xml = String::from("<root>");
        xml.push_str(&"\n".repeat(70_000));
        xml.push_str("<child>x</child></root>");

        let doc = engine
            .parse_document(xml.as_bytes(), &mut capture)
            .expect("parses");
        let child = doc
            .root()
            .expect("has root")
            .children()
            .find(|n| n.is_element())
            .expect("has element child");
        // Would read 65535 without big-line support.
        assert_eq!(child.line(), Some(70_001));
    }

    #[test]
    fn test_validate_document_valid_and_invalid() {
        let engine = XmlEngine::new();
        let schema = engine.compile_schema(SIMPLE_XSD).expect("compiles");

        let mut capture = ErrorCapture::new(FindingKind::ParseError);
        let doc = engine
            .parse_document(b"<root>Hello</root>", &mut capture)
            .expect("parses");
        let mut violations = ErrorCapture::new(FindingKind::SchemaViolation);
        assert!(
            engine
                .validate_document(&schema, &doc, &mut violations)
                .expect("validation runs")
        );
        assert!(violations.is_empty());

        let doc = engine
            .parse_document(b"<wrong>Hello</wrong>", &mut capture)
            .expect("parses");
        let mut violations = ErrorCapture::new(FindingKind::SchemaViolation);
        assert!(
            !engine
                .validate_document(&schema, &doc, &mut violations)
                .expect("validation runs")
        );
        assert!(!violations.is_empty());
    }

    #[test]
    fn test_schema_ptr_cloning_shares_schema() {
        let engine = XmlEngine::new();
        let schema = engine.compile_schema(SIMPLE_XSD).expect("compiles");
        let cloned = schema.clone();
        assert_eq!(schema.as_ptr(), cloned.as_ptr());
    }
}
