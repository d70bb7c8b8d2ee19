// src/package/snapshot.rs

//! Ordered package sets and their JSON snapshot
//!
//! A snapshot is a JSON object mapping the name each package was queried by
//! to its record. Entry order is significant (it drives rule order), so the
//! set is stored as a vector and (de)serialized by hand instead of through a
//! sorted map.
//!
//! Single-package extraction used to write the bare record instead of a
//! one-entry object; such files still load, keyed by the record's name.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use super::PackageRecord;
use crate::error::{Error, Result};

/// Package records in insertion order, keyed by query name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet {
    entries: Vec<(String, PackageRecord)>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, failing if the key is already present
    pub fn insert(&mut self, key: impl Into<String>, record: PackageRecord) -> Result<()> {
        let key = key.into();
        if self.contains(&key) {
            return Err(Error::DuplicatePackage(key));
        }
        self.entries.push((key, record));
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in insertion order
    pub fn records(&self) -> impl Iterator<Item = &PackageRecord> {
        self.entries.iter().map(|(_, record)| record)
    }

    /// Query keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl Serialize for PackageSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, record) in &self.entries {
            map.serialize_entry(key, record)?;
        }
        map.end()
    }
}

struct PackageSetVisitor;

impl<'de> Visitor<'de> for PackageSetVisitor {
    type Value = PackageSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of package names to package records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<PackageSet, A::Error> {
        let mut set = PackageSet::new();
        while let Some((key, record)) = access.next_entry::<String, PackageRecord>()? {
            set.insert(key, record).map_err(serde::de::Error::custom)?;
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for PackageSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(PackageSetVisitor)
    }
}

/// Write a snapshot as pretty-printed JSON (4-space indent)
pub fn write_snapshot<W: Write>(writer: W, packages: &PackageSet) -> Result<()> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    packages.serialize(&mut serializer)?;
    let mut writer = serializer.into_inner();
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Save a snapshot to a file, truncating it first
pub fn save_snapshot(path: &Path, packages: &PackageSet) -> Result<()> {
    let file = File::create(path)?;
    write_snapshot(BufWriter::new(file), packages)?;
    info!("Wrote {} package records to {}", packages.len(), path.display());
    Ok(())
}

/// Parse snapshot text, either a package set or a single bare record
pub fn read_snapshot(text: &str) -> Result<PackageSet> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if !is_bare_record(&value) {
        // Values drop entry order and duplicate keys
        return Ok(serde_json::from_str(text)?);
    }

    let record: PackageRecord = serde_json::from_value(value)?;
    let mut packages = PackageSet::new();
    packages.insert(record.name.clone(), record)?;
    Ok(packages)
}

/// A record has string `name` and `directory` fields, a set maps them to records
fn is_bare_record(value: &serde_json::Value) -> bool {
    ["name", "directory"]
        .iter()
        .all(|field| value.get(field).is_some_and(serde_json::Value::is_string))
}

/// Load a snapshot previously written by `save_snapshot`
pub fn load_snapshot(path: &Path) -> Result<PackageSet> {
    let text = std::fs::read_to_string(path)?;
    let packages = read_snapshot(&text)?;
    info!("Loaded {} package records from {}", packages.len(), path.display());
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PackageSet {
        let mut set = PackageSet::new();
        set.insert("zarith", PackageRecord::new("zarith", "/s/lib/zarith"))
            .unwrap();
        set.insert("astring", PackageRecord::new("astring", "/s/lib/astring"))
            .unwrap();
        set
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut set = sample();
        let result = set.insert("zarith", PackageRecord::new("zarith", "/elsewhere"));
        assert!(matches!(result, Err(Error::DuplicatePackage(name)) if name == "zarith"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let set = sample();
        let mut buffer = Vec::new();
        write_snapshot(&mut buffer, &set).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.find("\"zarith\"").unwrap() < text.find("\"astring\"").unwrap());
        assert!(text.contains("\n    \"zarith\": {\n        \"name\": \"zarith\","));

        let back: PackageSet = serde_json::from_str(&text).unwrap();
        assert_eq!(back, set);
        assert_eq!(back.keys().collect::<Vec<_>>(), vec!["zarith", "astring"]);
    }

    #[test]
    fn test_snapshot_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("packages.json");
        save_snapshot(&path, &sample()).unwrap();
        assert_eq!(load_snapshot(&path).unwrap(), sample());
    }

    #[test]
    fn test_duplicate_key_in_snapshot() {
        let json = r#"{
            "a": {"name": "a", "directory": "/s/lib/a", "kind": "PLAIN"},
            "a": {"name": "a", "directory": "/s/lib/a", "kind": "PLAIN"}
        }"#;
        assert!(serde_json::from_str::<PackageSet>(json).is_err());
    }

    #[test]
    fn test_bare_record_loads_as_one_entry() {
        let json = r#"{
            "name": "zarith",
            "directory": "/s/lib/zarith",
            "kind": "PLAIN",
            "static_native_libs": ["zarith.cmxa"]
        }"#;
        let set = read_snapshot(json).unwrap();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["zarith"]);
        let record = set.records().next().unwrap();
        assert_eq!(record.directory, "/s/lib/zarith");
        assert_eq!(record.static_native_libs, vec!["zarith.cmxa"]);
    }

    #[test]
    fn test_packages_named_like_fields_stay_a_set() {
        let json = r#"{
            "name": {"name": "name", "directory": "/s/lib/name", "kind": "PLAIN"},
            "directory": {"name": "directory", "directory": "/s/lib/directory", "kind": "PLAIN"}
        }"#;
        let set = read_snapshot(json).unwrap();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["name", "directory"]);
    }

    #[test]
    fn test_read_snapshot_keeps_duplicate_check() {
        let json = r#"{
            "b": {"name": "b", "directory": "/s/lib/b", "kind": "PLAIN"},
            "a": {"name": "a", "directory": "/s/lib/a", "kind": "PLAIN"},
            "a": {"name": "a", "directory": "/s/lib/a", "kind": "PLAIN"}
        }"#;
        assert!(read_snapshot(json).is_err());
    }
}
