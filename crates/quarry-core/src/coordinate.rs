//! Artifact coordinates.
//!
//! A [`Coordinate`] names one immutable artifact in a maven-layout
//! repository: `group:name:type:version` or
//! `group:name:type:classifier:version`. Construction validates every
//! field; a constructed coordinate never changes.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// Matches a field that is `.`, `..`, or contains a path/coordinate
/// delimiter anywhere.
static FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.{1,2}$|[:;/\\]").expect("forbidden-field pattern"));

/// Matches a concrete timestamped snapshot build: `<base>-YYYYMMDD.HHMMSS-N`.
static TIMESTAMPED_BUILD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)-([0-9]{8}\.[0-9]{6})-([0-9]+)$").expect("timestamped-build pattern")
});

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";

/// Errors from coordinate parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
    /// Input did not have 4 or 5 colon-separated fields.
    #[error("malformed coordinate `{input}`: expected 4 or 5 colon-separated fields, got {fields}")]
    Malformed {
        /// The offending input.
        input: String,
        /// Number of fields found.
        fields: usize,
    },

    /// A field failed validation.
    #[error("invalid {field} `{value}` in coordinate")]
    InvalidField {
        /// Which field was rejected.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// The identity of one artifact: group, name, type, optional classifier,
/// and version.
///
/// Immutable once constructed. Derived values ([`base_version`],
/// [`file_name`], [`group_segments`]) are computed on demand.
///
/// [`base_version`]: Coordinate::base_version
/// [`file_name`]: Coordinate::file_name
/// [`group_segments`]: Coordinate::group_segments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    group: String,
    name: String,
    kind: String,
    classifier: Option<String>,
    version: String,
}

impl Coordinate {
    /// Create a coordinate from explicit fields.
    ///
    /// # Errors
    /// Returns [`CoordinateError::InvalidField`] if any field is empty,
    /// `.`, `..`, or contains `:`, `;`, `/` or `\`, or if the group
    /// starts/ends with `.` or contains `..`.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        kind: impl Into<String>,
        classifier: Option<String>,
        version: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let group = group.into();
        let name = name.into();
        let kind = kind.into();
        let version = version.into();

        validate_field("group", &group)?;
        if group.starts_with('.') || group.ends_with('.') || group.contains("..") {
            return Err(CoordinateError::InvalidField {
                field: "group",
                value: group,
            });
        }
        validate_field("name", &name)?;
        validate_field("type", &kind)?;
        if let Some(classifier) = &classifier {
            validate_field("classifier", classifier)?;
        }
        validate_field("version", &version)?;

        Ok(Self {
            group,
            name,
            kind,
            classifier,
            version,
        })
    }

    /// Parse the colon-delimited form: `group:name:type:version` or
    /// `group:name:type:classifier:version`.
    ///
    /// # Errors
    /// Returns [`CoordinateError::Malformed`] for any other field count and
    /// [`CoordinateError::InvalidField`] for invalid field values.
    pub fn parse(input: &str) -> Result<Self, CoordinateError> {
        let fields: Vec<&str> = input.split(':').collect();
        match fields.as_slice() {
            [group, name, kind, version] => Self::new(*group, *name, *kind, None, *version),
            [group, name, kind, classifier, version] => {
                Self::new(*group, *name, *kind, Some((*classifier).to_string()), *version)
            }
            _ => Err(CoordinateError::Malformed {
                input: input.to_string(),
                fields: fields.len(),
            }),
        }
    }

    /// The group identifier, e.g. `org.example.tools`.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The artifact type (file extension), e.g. `jar`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The optional classifier, e.g. `sources`.
    #[must_use]
    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// The version as given, possibly a concrete timestamped build.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether this coordinate names a mutable snapshot version.
    #[must_use]
    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with(SNAPSHOT_SUFFIX)
    }

    /// The version used for directory bucketing.
    ///
    /// A concrete timestamped build (`1.0-20240101.120000-3`) collapses
    /// back to its snapshot identity (`1.0-SNAPSHOT`); any other version is
    /// returned unchanged.
    #[must_use]
    pub fn base_version(&self) -> String {
        TIMESTAMPED_BUILD.captures(&self.version).map_or_else(
            || self.version.clone(),
            |captures| format!("{}{SNAPSHOT_SUFFIX}", &captures[1]),
        )
    }

    /// The file name of the artifact: `name-version[-classifier].type`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let mut file_name = format!("{}-{}", self.name, self.version);
        if let Some(classifier) = &self.classifier {
            file_name.push('-');
            file_name.push_str(classifier);
        }
        file_name.push('.');
        file_name.push_str(&self.kind);
        file_name
    }

    /// The group split into path segments (dots become directories).
    pub fn group_segments(&self) -> impl Iterator<Item = &str> {
        self.group.split('.')
    }

    /// A copy of this coordinate with a different version.
    ///
    /// Used when snapshot metadata resolves the mutable version to a
    /// concrete timestamped build.
    ///
    /// # Errors
    /// Returns [`CoordinateError::InvalidField`] if the new version is
    /// invalid.
    pub fn with_version(&self, version: impl Into<String>) -> Result<Self, CoordinateError> {
        Self::new(
            self.group.clone(),
            self.name.clone(),
            self.kind.clone(),
            self.classifier.clone(),
            version,
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.kind)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{classifier}")?;
        }
        write!(f, ":{}", self.version)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn validate_field(field: &'static str, value: &str) -> Result<(), CoordinateError> {
    if value.is_empty() || FORBIDDEN.is_match(value) {
        return Err(CoordinateError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_four_fields() {
        let coordinate = Coordinate::parse("org.example:tool:jar:1.0").unwrap();
        assert_eq!(coordinate.group(), "org.example");
        assert_eq!(coordinate.name(), "tool");
        assert_eq!(coordinate.kind(), "jar");
        assert_eq!(coordinate.classifier(), None);
        assert_eq!(coordinate.version(), "1.0");
    }

    #[test]
    fn parse_five_fields() {
        let coordinate = Coordinate::parse("org.example:tool:jar:sources:1.0").unwrap();
        assert_eq!(coordinate.classifier(), Some("sources"));
        assert_eq!(coordinate.version(), "1.0");
    }

    #[test]
    fn parse_round_trips_display() {
        for input in ["org.example:tool:jar:1.0", "org.example:tool:jar:sources:1.0"] {
            let coordinate = Coordinate::parse(input).unwrap();
            assert_eq!(coordinate.to_string(), input);
            assert_eq!(Coordinate::parse(&coordinate.to_string()).unwrap(), coordinate);
        }
    }

    #[test]
    fn parse_rejects_wrong_field_count() {
        for input in ["", "a:b", "a:b:c", "a:b:c:d:e:f"] {
            assert!(matches!(
                Coordinate::parse(input),
                Err(CoordinateError::Malformed { .. })
            ));
        }
    }

    #[test]
    fn rejects_invalid_field_values() {
        for bad in ["", ".", "..", "a:b", "a;b", "a/b", "a\\b"] {
            assert!(
                matches!(
                    Coordinate::new("org.example", bad, "jar", None, "1.0"),
                    Err(CoordinateError::InvalidField { field: "name", .. })
                ),
                "expected rejection of name {bad:?}"
            );
            assert!(
                matches!(
                    Coordinate::new("org.example", "tool", "jar", None, bad),
                    Err(CoordinateError::InvalidField { field: "version", .. })
                ),
                "expected rejection of version {bad:?}"
            );
        }
    }

    #[test]
    fn rejects_invalid_classifier() {
        assert!(matches!(
            Coordinate::new("org.example", "tool", "jar", Some(String::new()), "1.0"),
            Err(CoordinateError::InvalidField { field: "classifier", .. })
        ));
    }

    #[test]
    fn group_dot_rules() {
        for bad in [".org.example", "org.example.", "org..example"] {
            assert!(matches!(
                Coordinate::new(bad, "tool", "jar", None, "1.0"),
                Err(CoordinateError::InvalidField { field: "group", .. })
            ));
        }
        // A single-segment group is fine.
        assert!(Coordinate::new("org", "tool", "jar", None, "1.0").is_ok());
    }

    #[test]
    fn snapshot_detection() {
        let snapshot = Coordinate::parse("g:a:jar:1.0-SNAPSHOT").unwrap();
        assert!(snapshot.is_snapshot());

        let release = Coordinate::parse("g:a:jar:1.0").unwrap();
        assert!(!release.is_snapshot());

        // A concrete timestamped build is not itself a snapshot version.
        let concrete = Coordinate::parse("g:a:jar:1.0-20240101.120000-3").unwrap();
        assert!(!concrete.is_snapshot());
    }

    #[test]
    fn base_version_collapses_timestamped_build() {
        let concrete = Coordinate::parse("g:a:jar:1.0-20240101.120000-3").unwrap();
        assert_eq!(concrete.base_version(), "1.0-SNAPSHOT");

        let release = Coordinate::parse("g:a:jar:1.0").unwrap();
        assert_eq!(release.base_version(), "1.0");

        let snapshot = Coordinate::parse("g:a:jar:1.0-SNAPSHOT").unwrap();
        assert_eq!(snapshot.base_version(), "1.0-SNAPSHOT");
    }

    #[test]
    fn file_name_forms() {
        let plain = Coordinate::parse("g:a:jar:1.0").unwrap();
        assert_eq!(plain.file_name(), "a-1.0.jar");

        let classified = Coordinate::parse("g:a:jar:sources:1.0").unwrap();
        assert_eq!(classified.file_name(), "a-1.0-sources.jar");
    }

    #[test]
    fn group_segments_split_on_dots() {
        let coordinate = Coordinate::parse("org.example.tools:a:jar:1.0").unwrap();
        let segments: Vec<&str> = coordinate.group_segments().collect();
        assert_eq!(segments, ["org", "example", "tools"]);
    }

    #[test]
    fn with_version_keeps_identity() {
        let snapshot = Coordinate::parse("g:a:jar:sources:1.0-SNAPSHOT").unwrap();
        let concrete = snapshot.with_version("1.0-20240101.120000-3").unwrap();
        assert_eq!(concrete.group(), "g");
        assert_eq!(concrete.classifier(), Some("sources"));
        assert_eq!(concrete.version(), "1.0-20240101.120000-3");
        assert_eq!(concrete.base_version(), "1.0-SNAPSHOT");
    }
}
