//! Leaf records and their canonical serialization
//!
//! Two leaf formats exist and they are deliberately kept apart:
//! - [`StudentRecord`]: diploma review, `{"nom","prenom","studentId"}`
//! - [`IssuanceRecord`]: batch anchoring, `{"studentId","diploma":{"id","name"}}`
//!
//! Canonical text is compact JSON with the key order written out below, standard
//! JSON string escaping and values taken verbatim (no trimming, no case folding).
//! Changing any of this changes every leaf and invalidates anchored roots, so
//! the format carries a version number.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MerkleError, Result};

/// Version of the canonical serialization rules
pub const CANONICAL_FORMAT_VERSION: u32 = 1;

/// Anything that can be turned into leaf bytes
pub trait CanonicalRecord {
    /// Which leaf format this record uses
    fn kind(&self) -> RecordKind;

    /// Canonical serialization fed to the hash function
    fn canonical(&self) -> String;
}

/// Leaf format selector, chosen once per call site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Student identity leaf used when reviewing a diploma request
    Student,
    /// Student + diploma leaf used when anchoring an issuance batch
    Issuance,
}

impl RecordKind {
    /// Returns the string representation of the kind
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Issuance => "issuance",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "student" => Ok(Self::Student),
            "issuance" => Ok(Self::Issuance),
            other => Err(MerkleError::invalid_input(format!(
                "unknown record kind {other:?} (expected student or issuance)"
            ))),
        }
    }
}

/// Student identity leaf
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    /// Last name
    pub nom: String,
    /// First name
    pub prenom: String,
    /// Institution-assigned student identifier
    pub student_id: String,
}

impl StudentRecord {
    /// Create a student record
    pub fn new(
        nom: impl Into<String>,
        prenom: impl Into<String>,
        student_id: impl Into<String>,
    ) -> Self {
        Self {
            nom: nom.into(),
            prenom: prenom.into(),
            student_id: student_id.into(),
        }
    }
}

impl CanonicalRecord for StudentRecord {
    fn kind(&self) -> RecordKind {
        RecordKind::Student
    }

    fn canonical(&self) -> String {
        format!(
            r#"{{"nom":{},"prenom":{},"studentId":{}}}"#,
            quote(&self.nom),
            quote(&self.prenom),
            quote(&self.student_id)
        )
    }
}

/// Diploma reference inside an issuance leaf
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiplomaRef {
    /// Diploma identifier
    pub id: String,
    /// Diploma display name
    pub name: String,
}

/// Student + diploma leaf
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceRecord {
    /// Institution-assigned student identifier
    pub student_id: String,
    /// Diploma being issued
    pub diploma: DiplomaRef,
}

impl IssuanceRecord {
    /// Create an issuance record
    pub fn new(
        student_id: impl Into<String>,
        diploma_id: impl Into<String>,
        diploma_name: impl Into<String>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            diploma: DiplomaRef {
                id: diploma_id.into(),
                name: diploma_name.into(),
            },
        }
    }
}

impl CanonicalRecord for IssuanceRecord {
    fn kind(&self) -> RecordKind {
        RecordKind::Issuance
    }

    fn canonical(&self) -> String {
        format!(
            r#"{{"studentId":{},"diploma":{{"id":{},"name":{}}}}}"#,
            quote(&self.student_id),
            quote(&self.diploma.id),
            quote(&self.diploma.name)
        )
    }
}

/// A leaf record of either format
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Record {
    /// Diploma review leaf
    Student(StudentRecord),
    /// Batch anchoring leaf
    Issuance(IssuanceRecord),
}

impl Record {
    /// Build a record of `kind` from a loosely shaped JSON object.
    ///
    /// Every field of the format must be present as a key. `null` becomes the
    /// empty string, numbers and booleans become their JSON text, nested
    /// arrays or objects in a scalar position are rejected.
    pub fn from_json(kind: RecordKind, value: &Value) -> Result<Self> {
        let obj = as_object(value, "record")?;
        match kind {
            RecordKind::Student => Ok(Self::Student(StudentRecord {
                nom: text_field(obj, "nom", "nom")?,
                prenom: text_field(obj, "prenom", "prenom")?,
                student_id: text_field(obj, "studentId", "studentId")?,
            })),
            RecordKind::Issuance => {
                let diploma = obj.get("diploma").ok_or_else(|| {
                    MerkleError::invalid_input("record is missing field `diploma`")
                })?;
                let diploma = as_object(diploma, "diploma")?;
                Ok(Self::Issuance(IssuanceRecord {
                    student_id: text_field(obj, "studentId", "studentId")?,
                    diploma: DiplomaRef {
                        id: text_field(diploma, "id", "diploma.id")?,
                        name: text_field(diploma, "name", "diploma.name")?,
                    },
                }))
            }
        }
    }

    /// Parse a JSON array of record objects, all of the same `kind`
    pub fn parse_batch(kind: RecordKind, value: &Value) -> Result<Vec<Self>> {
        let Value::Array(items) = value else {
            return Err(MerkleError::invalid_input("expected a JSON array of records"));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                Self::from_json(kind, item).map_err(|e| match e {
                    MerkleError::InvalidInput(msg) => {
                        MerkleError::invalid_input(format!("record {i}: {msg}"))
                    }
                    other => other,
                })
            })
            .collect()
    }
}

impl CanonicalRecord for Record {
    fn kind(&self) -> RecordKind {
        match self {
            Self::Student(r) => r.kind(),
            Self::Issuance(r) => r.kind(),
        }
    }

    fn canonical(&self) -> String {
        match self {
            Self::Student(r) => r.canonical(),
            Self::Issuance(r) => r.canonical(),
        }
    }
}

impl From<StudentRecord> for Record {
    fn from(record: StudentRecord) -> Self {
        Self::Student(record)
    }
}

impl From<IssuanceRecord> for Record {
    fn from(record: IssuanceRecord) -> Self {
        Self::Issuance(record)
    }
}

/// JSON string literal for `s`
fn quote(s: &str) -> String {
    Value::from(s).to_string()
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| MerkleError::invalid_input(format!("{what} must be a JSON object")))
}

fn text_field(obj: &Map<String, Value>, key: &str, path: &str) -> Result<String> {
    match obj.get(key) {
        None => Err(MerkleError::invalid_input(format!(
            "record is missing field `{path}`"
        ))),
        Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Bool(b)) => Ok(b.to_string()),
        Some(Value::Array(_) | Value::Object(_)) => Err(MerkleError::invalid_input(format!(
            "field `{path}` must be a scalar"
        ))),
    }
}
