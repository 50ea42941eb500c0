use anyhow::{anyhow, Result};
use itertools::Itertools;
use minidom::{Element, Node};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum Namespace {
    Rdf,
    Dc,
    Dcterms,
    Cc,
    Photosync,
}

impl Namespace {
    pub fn uri(&self) -> &'static str {
        match self {
            Namespace::Rdf => "http://www.w3.org/1999/02/22-rdf-syntax-ns#",
            Namespace::Dc => "http://purl.org/dc/elements/1.1/",
            Namespace::Dcterms => "http://purl.org/dc/terms/",
            Namespace::Cc => "http://creativecommons.org/ns#",
            Namespace::Photosync => "http://photosync.example.org/ns#",
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Rdf => "rdf",
            Namespace::Dc => "dc",
            Namespace::Dcterms => "dcterms",
            Namespace::Cc => "cc",
            Namespace::Photosync => "photosync",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub namespace: Namespace,
    pub name: &'static str,
}

impl Predicate {
    pub const fn new(namespace: Namespace, name: &'static str) -> Self {
        Self { namespace, name }
    }

    pub fn uri(&self) -> String {
        format!("{}{}", self.namespace.uri(), self.name)
    }

    fn qualified(&self) -> String {
        format!("{}:{}", self.namespace.prefix(), self.name)
    }
}

pub const RDF_TYPE: Predicate = Predicate::new(Namespace::Rdf, "type");
pub const DC_TITLE: Predicate = Predicate::new(Namespace::Dc, "title");
pub const DC_DESCRIPTION: Predicate = Predicate::new(Namespace::Dc, "description");
pub const DC_CREATOR: Predicate = Predicate::new(Namespace::Dc, "creator");
pub const DC_IDENTIFIER: Predicate = Predicate::new(Namespace::Dc, "identifier");
pub const DCTERMS_CREATED: Predicate = Predicate::new(Namespace::Dcterms, "created");
pub const DCTERMS_ISSUED: Predicate = Predicate::new(Namespace::Dcterms, "issued");
pub const DCTERMS_MODIFIED: Predicate = Predicate::new(Namespace::Dcterms, "modified");
pub const DCTERMS_SOURCE: Predicate = Predicate::new(Namespace::Dcterms, "source");
pub const CC_LICENSE: Predicate = Predicate::new(Namespace::Cc, "license");
pub const PS_LICENSE_ID: Predicate = Predicate::new(Namespace::Photosync, "licenseId");
pub const PS_VISIBILITY: Predicate = Predicate::new(Namespace::Photosync, "visibility");
pub const PS_TAG: Predicate = Predicate::new(Namespace::Photosync, "tag");
pub const PS_RAW: Predicate = Predicate::new(Namespace::Photosync, "raw");
pub const PS_NORMALIZED: Predicate = Predicate::new(Namespace::Photosync, "normalized");
pub const PS_NOTE: Predicate = Predicate::new(Namespace::Photosync, "note");
pub const PS_X: Predicate = Predicate::new(Namespace::Photosync, "x");
pub const PS_Y: Predicate = Predicate::new(Namespace::Photosync, "y");
pub const PS_WIDTH: Predicate = Predicate::new(Namespace::Photosync, "width");
pub const PS_HEIGHT: Predicate = Predicate::new(Namespace::Photosync, "height");
pub const PS_BODY: Predicate = Predicate::new(Namespace::Photosync, "body");
pub const PS_RENDITION: Predicate = Predicate::new(Namespace::Photosync, "rendition");
pub const PS_SIZE: Predicate = Predicate::new(Namespace::Photosync, "size");

pub const PS_PHOTO_CLASS: Predicate = Predicate::new(Namespace::Photosync, "Photo");
pub const PS_TAG_CLASS: Predicate = Predicate::new(Namespace::Photosync, "Tag");
pub const PS_NOTE_CLASS: Predicate = Predicate::new(Namespace::Photosync, "Note");
pub const PS_RENDITION_CLASS: Predicate = Predicate::new(Namespace::Photosync, "Rendition");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Literal(String),
    Resource(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: String,
    pub predicate: Predicate,
    pub object: Object,
}

/// Ordered set of triples. Subjects are serialized in the order they first
/// appear.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    triples: Vec<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(&mut self, subject: &str, predicate: Predicate, value: impl Into<String>) {
        self.push(subject, predicate, Object::Literal(value.into()))
    }

    pub fn resource(&mut self, subject: &str, predicate: Predicate, uri: impl Into<String>) {
        self.push(subject, predicate, Object::Resource(uri.into()))
    }

    pub fn class(&mut self, subject: &str, class: Predicate) {
        self.resource(subject, RDF_TYPE, class.uri())
    }

    fn push(&mut self, subject: &str, predicate: Predicate, object: Object) {
        let triple = Triple {
            subject: subject.to_string(),
            predicate,
            object,
        };
        if !self.triples.contains(&triple) {
            self.triples.push(triple)
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn subjects(&self) -> Vec<&str> {
        self.triples
            .iter()
            .map(|triple| triple.subject.as_str())
            .unique()
            .collect()
    }

    pub fn objects(&self, subject: &str, predicate: Predicate) -> Vec<&Object> {
        self.triples
            .iter()
            .filter(|triple| triple.subject == subject && triple.predicate == predicate)
            .map(|triple| &triple.object)
            .collect()
    }

    /// RDF/XML document, one `rdf:Description` per subject
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let rdf = Namespace::Rdf.uri();
        let mut builder = Element::builder("RDF", rdf);
        for namespace in Namespace::iter() {
            builder = builder
                .prefix(Some(namespace.prefix().to_string()), namespace.uri())
                .map_err(|error| {
                    anyhow!("Unable to declare {} prefix: {}", namespace.prefix(), error)
                })?;
        }
        let mut root = builder.build();

        for subject in self.subjects() {
            let mut description = Element::builder("Description", rdf).attr("rdf:about", subject);
            let triples = self.triples.iter().filter(|triple| triple.subject == subject);
            for triple in triples {
                let property =
                    Element::builder(triple.predicate.name, triple.predicate.namespace.uri());
                let property = match &triple.object {
                    Object::Literal(value) => property.append(Node::Text(value.clone())),
                    Object::Resource(uri) => property.attr("rdf:resource", uri.as_str()),
                };
                description = description.append(property.build());
            }
            root.append_child(description.build());
        }

        let mut output = vec![];
        root.write_to_decl(&mut output)
            .map_err(|error| anyhow!("Unable to write rdf document: {}", error))?;
        Ok(output)
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.qualified())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicated_triples_are_merged() {
        let mut graph = Graph::new();
        graph.literal("urn:a", DC_TITLE, "A");
        graph.literal("urn:a", DC_TITLE, "A");
        graph.literal("urn:b", DC_TITLE, "A");

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.subjects(), vec!["urn:a", "urn:b"]);
    }

    #[test]
    fn test_serialize() {
        let mut graph = Graph::new();
        graph.class("urn:photo", PS_PHOTO_CLASS);
        graph.literal("urn:photo", DC_TITLE, "Tom & Jerry");
        graph.resource("urn:photo", PS_TAG, "urn:tag");
        graph.literal("urn:tag", PS_RAW, "<cats>");

        let document = String::from_utf8(graph.serialize().unwrap()).unwrap();

        assert!(document.starts_with("<?xml"));
        assert!(document.contains("xmlns:dc=\"http://purl.org/dc/elements/1.1/\""));
        assert!(document.contains("rdf:about=\"urn:photo\""));
        assert!(document.contains("Tom &amp; Jerry"));
        assert!(document.contains("&lt;cats"));
        assert!(document.contains("rdf:resource=\"urn:tag\""));
        assert_eq!(document.matches("rdf:about=").count(), 2);
    }

    #[test]
    fn test_predicate_display() {
        assert_eq!(PS_VISIBILITY.to_string(), "photosync:visibility");
        assert_eq!(
            RDF_TYPE.uri(),
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#type"
        );
    }
}
