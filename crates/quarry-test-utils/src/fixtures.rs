//! Fixture builders for repository metadata documents.

use quarry_core::Coordinate;

/// One `snapshotVersion` entry of a metadata document.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    /// Optional classifier of the entry.
    pub classifier: Option<String>,
    /// File extension (the coordinate's type).
    pub extension: String,
    /// Concrete timestamped version the entry points at.
    pub value: String,
}

impl SnapshotEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(classifier: Option<&str>, extension: &str, value: &str) -> Self {
        Self {
            classifier: classifier.map(ToString::to_string),
            extension: extension.to_string(),
            value: value.to_string(),
        }
    }
}

/// Build a `maven-metadata.xml` document for a snapshot coordinate.
///
/// The document identity (`groupId`/`artifactId`/`version`) is taken from
/// the coordinate's group, name, and base version.
#[must_use]
pub fn snapshot_metadata(coordinate: &Coordinate, entries: &[SnapshotEntry]) -> String {
    let mut body = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metadata>\n");
    body.push_str(&format!("  <groupId>{}</groupId>\n", coordinate.group()));
    body.push_str(&format!("  <artifactId>{}</artifactId>\n", coordinate.name()));
    body.push_str(&format!("  <version>{}</version>\n", coordinate.base_version()));
    body.push_str("  <versioning>\n    <snapshotVersions>\n");
    for entry in entries {
        body.push_str("      <snapshotVersion>\n");
        if let Some(classifier) = &entry.classifier {
            body.push_str(&format!("        <classifier>{classifier}</classifier>\n"));
        }
        body.push_str(&format!("        <extension>{}</extension>\n", entry.extension));
        body.push_str(&format!("        <value>{}</value>\n", entry.value));
        body.push_str("      </snapshotVersion>\n");
    }
    body.push_str("    </snapshotVersions>\n  </versioning>\n</metadata>\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_document_with_identity_and_entries() {
        let coordinate = Coordinate::parse("org.example:tool:jar:1.0-SNAPSHOT").unwrap();
        let doc = snapshot_metadata(
            &coordinate,
            &[SnapshotEntry::new(None, "jar", "1.0-20240101.120000-3")],
        );
        assert!(doc.contains("<groupId>org.example</groupId>"));
        assert!(doc.contains("<version>1.0-SNAPSHOT</version>"));
        assert!(doc.contains("<value>1.0-20240101.120000-3</value>"));
        assert!(!doc.contains("<classifier>"));
    }
}
