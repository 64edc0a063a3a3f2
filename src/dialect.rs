//! Supported metadata dialects.
//!
//! Each dialect binds one identifier to a human-readable version label and
//! one bundled XSD. The schemas are embedded at compile time (no install
//! path to resolve) and compiled by the [`SchemaRegistry`](crate::SchemaRegistry)
//! on first use.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Namespace URI all element selection is bound to. Both the PBCore schemas
/// and the bundled Simple Dublin Core schema declare their vocabulary in
/// this namespace.
pub const METADATA_NAMESPACE: &str = "http://www.pbcore.org/PBCore/PBCoreNamespace.html";

/// One supported metadata schema variant.
///
/// Unknown dialect identifiers fail in [`FromStr`] — a configuration error,
/// never a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Simple Dublin Core (identifier `"DC"` or `"Simple"`).
    SimpleDublinCore,
    /// PBCore 1.2.1 (identifier `"1.2.1"`).
    Pbcore12,
    /// PBCore 1.3 (identifier `"1.3"`).
    Pbcore13,
}

impl Dialect {
    /// Every supported dialect, for eager registry preloading.
    pub const ALL: [Dialect; 3] = [
        Dialect::SimpleDublinCore,
        Dialect::Pbcore12,
        Dialect::Pbcore13,
    ];

    /// Source text of the dialect's bundled XSD.
    pub(crate) fn schema_source(self) -> &'static str {
        match self {
            Dialect::SimpleDublinCore => include_str!("../schemas/simple-dc.xsd"),
            Dialect::Pbcore12 => include_str!("../schemas/pbcore-1.2.1.xsd"),
            Dialect::Pbcore13 => include_str!("../schemas/pbcore-1.3.xsd"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Dialect::SimpleDublinCore => "Simple Dublin Core",
            Dialect::Pbcore12 => "PBCore 1.2.1",
            Dialect::Pbcore13 => "PBCore 1.3",
        };
        f.write_str(label)
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DC" | "Simple" => Ok(Dialect::SimpleDublinCore),
            "1.2.1" => Ok(Dialect::Pbcore12),
            "1.3" => Ok(Dialect::Pbcore13),
            other => Err(Error::UnknownDialect {
                identifier: other.to_string(),
            }),
        }
    }
}

impl Default for Dialect {
    /// The Dublin Core dialect is the default input format.
    fn default() -> Self {
        Dialect::SimpleDublinCore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_parsing() {
        assert_eq!("DC".parse::<Dialect>().unwrap(), Dialect::SimpleDublinCore);
        assert_eq!(
            "Simple".parse::<Dialect>().unwrap(),
            Dialect::SimpleDublinCore
        );
        assert_eq!("1.2.1".parse::<Dialect>().unwrap(), Dialect::Pbcore12);
        assert_eq!("1.3".parse::<Dialect>().unwrap(), Dialect::Pbcore13);
    }

    #[test]
    fn test_unknown_identifier_is_config_error() {
        let err = "2.0".parse::<Dialect>().unwrap_err();
        match err {
            Error::UnknownDialect { identifier } => assert_eq!(identifier, "2.0"),
            other => panic!("expected UnknownDialect, got {other:?}"),
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Dialect::SimpleDublinCore.to_string(), "Simple Dublin Core");
        assert_eq!(Dialect::Pbcore12.to_string(), "PBCore 1.2.1");
        assert_eq!(Dialect::Pbcore13.to_string(), "PBCore 1.3");
    }

    #[test]
    fn test_every_dialect_has_schema_source() {
        for dialect in Dialect::ALL {
            assert!(
                dialect.schema_source().contains("xs:schema"),
                "{dialect} schema source looks wrong"
            );
        }
    }

    #[test]
    fn test_default_is_dublin_core() {
        assert_eq!(Dialect::default(), Dialect::SimpleDublinCore);
    }
}
