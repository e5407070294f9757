//! Snapshot version resolution from `maven-metadata.xml`.
//!
//! A snapshot version is mutable; the repository publishes which concrete
//! timestamped build it currently points at in a metadata document next to
//! the artifacts. This module turns that document plus a snapshot
//! coordinate into the concrete coordinate to download.

use crate::error::{FetchError, Result};
use quarry_core::Coordinate;
use roxmltree::{Document, Node};

/// File name of the versioning metadata document.
pub(crate) const METADATA_FILE: &str = "maven-metadata.xml";

/// Resolve a snapshot coordinate against a metadata document.
///
/// The document's own `groupId`/`artifactId`/`version` must agree with the
/// request; the selected `snapshotVersion` entry is the one whose optional
/// `classifier` and whose `extension` equal the coordinate's classifier
/// and type.
pub(crate) fn resolve_snapshot(document: &[u8], coordinate: &Coordinate) -> Result<Coordinate> {
    let text = std::str::from_utf8(document)
        .map_err(|e| FetchError::metadata(format!("not valid UTF-8: {e}")))?;
    let doc = Document::parse(text).map_err(|e| FetchError::metadata(e.to_string()))?;
    let metadata = doc.root_element();

    check_match(&metadata, "groupId", coordinate.group())?;
    check_match(&metadata, "artifactId", coordinate.name())?;
    check_match(&metadata, "version", &coordinate.base_version())?;

    let snapshot_versions = child(&metadata, "versioning")
        .and_then(|versioning| child(&versioning, "snapshotVersions"))
        .ok_or_else(|| FetchError::metadata("missing versioning/snapshotVersions"))?;

    for entry in snapshot_versions
        .children()
        .filter(|node| node.has_tag_name("snapshotVersion"))
    {
        let classifier = child_text(&entry, "classifier");
        let extension = child_text(&entry, "extension")
            .ok_or_else(|| FetchError::metadata("snapshotVersion missing extension"))?;
        let value = child_text(&entry, "value")
            .ok_or_else(|| FetchError::metadata("snapshotVersion missing value"))?;

        if classifier == coordinate.classifier() && extension == coordinate.kind() {
            return coordinate.with_version(value).map_err(Into::into);
        }
    }

    Err(FetchError::NoMatchingSnapshotVersion {
        coordinate: coordinate.to_string(),
    })
}

fn check_match(metadata: &Node<'_, '_>, field: &'static str, expected: &str) -> Result<()> {
    let found = child_text(metadata, field)
        .ok_or_else(|| FetchError::metadata(format!("missing {field}")))?;
    if found == expected {
        Ok(())
    } else {
        Err(FetchError::MetadataMismatch {
            field,
            expected: expected.to_string(),
            found: found.to_string(),
        })
    }
}

fn child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(name))
}

fn child_text<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name).and_then(|child| child.text())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(group: &str, name: &str, version: &str, entries: &str) -> Vec<u8> {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<metadata>
  <groupId>{group}</groupId>
  <artifactId>{name}</artifactId>
  <version>{version}</version>
  <versioning>
    <snapshotVersions>
{entries}
    </snapshotVersions>
  </versioning>
</metadata>"#
        )
        .into_bytes()
    }

    fn entry(classifier: Option<&str>, extension: &str, value: &str) -> String {
        let classifier = classifier
            .map(|c| format!("<classifier>{c}</classifier>"))
            .unwrap_or_default();
        format!(
            "      <snapshotVersion>{classifier}<extension>{extension}</extension><value>{value}</value><updated>20240101120000</updated></snapshotVersion>"
        )
    }

    #[test]
    fn resolves_matching_entry() {
        let coordinate = Coordinate::parse("org.example:tool:jar:1.0-SNAPSHOT").unwrap();
        let doc = document(
            "org.example",
            "tool",
            "1.0-SNAPSHOT",
            &[
                entry(Some("sources"), "jar", "1.0-20240101.120000-3"),
                entry(None, "pom", "1.0-20240101.120000-3"),
                entry(None, "jar", "1.0-20240101.120000-3"),
            ]
            .join("\n"),
        );

        let concrete = resolve_snapshot(&doc, &coordinate).unwrap();
        assert_eq!(concrete.version(), "1.0-20240101.120000-3");
        assert_eq!(concrete.base_version(), "1.0-SNAPSHOT");
    }

    #[test]
    fn resolves_classified_entry() {
        let coordinate =
            Coordinate::parse("org.example:tool:jar:sources:1.0-SNAPSHOT").unwrap();
        let doc = document(
            "org.example",
            "tool",
            "1.0-SNAPSHOT",
            &[
                entry(None, "jar", "1.0-20240101.120000-3"),
                entry(Some("sources"), "jar", "1.0-20240101.120000-4"),
            ]
            .join("\n"),
        );

        let concrete = resolve_snapshot(&doc, &coordinate).unwrap();
        assert_eq!(concrete.version(), "1.0-20240101.120000-4");
        assert_eq!(concrete.classifier(), Some("sources"));
    }

    #[test]
    fn no_matching_entry_fails() {
        let coordinate = Coordinate::parse("org.example:tool:zip:1.0-SNAPSHOT").unwrap();
        let doc = document(
            "org.example",
            "tool",
            "1.0-SNAPSHOT",
            &entry(None, "jar", "1.0-20240101.120000-3"),
        );

        assert!(matches!(
            resolve_snapshot(&doc, &coordinate),
            Err(FetchError::NoMatchingSnapshotVersion { .. })
        ));
    }

    #[test]
    fn identity_mismatch_fails() {
        let coordinate = Coordinate::parse("org.example:tool:jar:1.0-SNAPSHOT").unwrap();
        let doc = document(
            "org.other",
            "tool",
            "1.0-SNAPSHOT",
            &entry(None, "jar", "1.0-20240101.120000-3"),
        );

        assert!(matches!(
            resolve_snapshot(&doc, &coordinate),
            Err(FetchError::MetadataMismatch {
                field: "groupId",
                ..
            })
        ));
    }

    #[test]
    fn version_mismatch_fails() {
        let coordinate = Coordinate::parse("org.example:tool:jar:2.0-SNAPSHOT").unwrap();
        let doc = document(
            "org.example",
            "tool",
            "1.0-SNAPSHOT",
            &entry(None, "jar", "1.0-20240101.120000-3"),
        );

        assert!(matches!(
            resolve_snapshot(&doc, &coordinate),
            Err(FetchError::MetadataMismatch { field: "version", .. })
        ));
    }

    #[test]
    fn malformed_document_fails() {
        let coordinate = Coordinate::parse("org.example:tool:jar:1.0-SNAPSHOT").unwrap();
        assert!(matches!(
            resolve_snapshot(b"<metadata", &coordinate),
            Err(FetchError::Metadata { .. })
        ));
    }
}
