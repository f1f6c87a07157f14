//! Prefix registry and namespace declarations
//!
//! Namespaces are declared with [`namespace!`](crate::namespace!), which
//! generates a module of `PrefixedName` constants. Declaring a namespace does
//! not put it in the query header; call the generated `register()` once at
//! startup for that.

use crate::term::{Iri, PrefixedName};
use lazy_static::lazy_static;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use tracing::warn;

/// A prefix label bound to a namespace IRI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace {
    label: &'static str,
    iri: &'static str,
}

impl Namespace {
    pub const fn new(label: &'static str, iri: &'static str) -> Self {
        Namespace { label, iri }
    }

    pub const fn label(&self) -> &'static str {
        self.label
    }

    pub fn iri(&self) -> Iri {
        Iri::new(self.iri)
    }

    /// A member of this namespace
    pub const fn term(&self, local: &'static str) -> PrefixedName {
        PrefixedName::from_static(self.iri, self.label, local)
    }

    pub fn prefix_line(&self) -> String {
        prefix_declaration(self.label, &self.iri())
    }
}

/// `PREFIX label: <iri>`
pub fn prefix_declaration(label: &str, iri: &Iri) -> String {
    format!("PREFIX {}: {}", label, iri)
}

#[macro_export]
macro_rules! namespace {
    (@local $term:ident = $local:literal) => {
        $local
    };
    (@local $term:ident) => {
        stringify!($term)
    };
    (
        $(#[$meta:meta])*
        $vis:vis mod $module:ident ($label:literal, $iri:literal) {
            $($term:ident $(= $local:literal)?),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[allow(non_upper_case_globals)]
        $vis mod $module {
            pub const NAMESPACE: $crate::namespace::Namespace =
                $crate::namespace::Namespace::new($label, $iri);

            $(
                pub const $term: $crate::term::PrefixedName = $crate::term::PrefixedName::from_static(
                    $iri,
                    $label,
                    $crate::namespace!(@local $term $(= $local)?),
                );
            )*

            /// Add this namespace to the global prefix header
            pub fn register() -> bool {
                $crate::namespace::register(NAMESPACE)
            }
        }
    };
}

namespace! {
    /// The RDF vocabulary, always present in the prefix header
    pub mod rdf ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#") {
        HTML,
        langString,
        PlainLiteral,
        type_ = "type",
        Property,
        Statement,
        subject,
        predicate,
        object,
        Bag,
        Seq,
        Alt,
        value,
        List,
        nil,
        first,
        rest,
        XMLLiteral,
    }
}

namespace! {
    pub mod rdfs ("rdfs", "http://www.w3.org/2000/01/rdf-schema#") {
        Resource,
        Class,
        subClassOf,
        subPropertyOf,
        comment,
        label,
        domain,
        range,
        seeAlso,
        isDefinedBy,
        Literal,
        Container,
        ContainerMembershipProperty,
        member,
        Datatype,
    }
}

namespace! {
    /// XML Schema datatypes, used by typed literals
    pub mod xsd ("xsd", "http://www.w3.org/2001/XMLSchema#") {
        string,
        boolean,
        decimal,
        integer,
        double,
        float,
        date,
        time,
        dateTime,
        dateTimeStamp,
        duration,
        gYear,
        anyURI,
        language,
        long,
        int,
        short,
        byte,
        nonNegativeInteger,
        positiveInteger,
    }
}

lazy_static! {
    static ref REGISTRY: RwLock<BTreeMap<&'static str, Namespace>> = {
        let mut prefixes = BTreeMap::new();
        prefixes.insert(rdf::NAMESPACE.label(), rdf::NAMESPACE);
        RwLock::new(prefixes)
    };
}

/// Add a namespace to the global registry
///
/// Returns `true` when the label was not registered yet. Registering the
/// same namespace twice is a no-op; a different IRI for a known label is
/// ignored with a warning.
pub fn register(namespace: Namespace) -> bool {
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    match registry.get(namespace.label()) {
        Some(existing) if *existing == namespace => false,
        Some(existing) => {
            warn!(
                label = namespace.label(),
                registered = existing.iri,
                ignored = namespace.iri,
                "Prefix label already registered with another IRI"
            );
            false
        }
        None => {
            registry.insert(namespace.label(), namespace);
            true
        }
    }
}

/// Every registered namespace, sorted by label
pub fn all_prefixes() -> Vec<Namespace> {
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    registry.values().copied().collect()
}

pub fn lookup(label: &str) -> Option<Namespace> {
    let registry = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    registry.get(label).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rdf_is_registered() {
        assert_eq!(lookup("rdf"), Some(rdf::NAMESPACE));
        assert!(all_prefixes().contains(&rdf::NAMESPACE));
    }

    #[test]
    fn test_declared_namespaces_are_not_registered() {
        assert_eq!(lookup("xsd"), None);
        assert_eq!(lookup("rdfs"), None);
    }

    #[test]
    fn test_members() {
        assert_eq!(rdf::type_.to_string(), "rdf:type");
        assert_eq!(rdf::type_, "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
        assert_eq!(xsd::dateTime.to_string(), "xsd:dateTime");
        assert_eq!(rdfs::label.iri(), "http://www.w3.org/2000/01/rdf-schema#label");
        assert_eq!(rdf::NAMESPACE.term("type"), rdf::type_);
    }

    #[test]
    fn test_prefix_line() {
        assert_eq!(
            rdf::NAMESPACE.prefix_line(),
            "PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>"
        );
        assert_eq!(
            prefix_declaration("ex", &Iri::new("http://example.org/")),
            "PREFIX ex: <http://example.org/>"
        );
    }

    #[test]
    fn test_register_rdf_again_is_noop() {
        assert!(!rdf::register());
        assert_eq!(all_prefixes().iter().filter(|ns| ns.label() == "rdf").count(), 1);
    }
}
