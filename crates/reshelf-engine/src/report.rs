//! Report phase: duplicate-content and destination-collision derivation.
//!
//! A pure function over the manifest; no store access. ERROR records stay
//! visible here by design; the manifest is the complete inventory and the
//! reports are how an operator inspects it.

use std::collections::BTreeMap;
use std::path::Path;

use reshelf_core::{ActionRecord, Manifest};
use reshelf_io::report::{write_collisions_txt, write_duplicates_csv};

/// Records sharing one content hash.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub content_hash: String,
    pub records: Vec<ActionRecord>,
}

/// Records resolving to the same destination path: they would overwrite or
/// alias each other if executed as-is.
#[derive(Debug, Clone)]
pub struct CollisionGroup {
    pub destination_path: String,
    pub records: Vec<ActionRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct ReorgReport {
    /// Sorted by hash.
    pub duplicates: Vec<DuplicateGroup>,
    /// Sorted by destination path.
    pub collisions: Vec<CollisionGroup>,
}

impl ReorgReport {
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty() && self.collisions.is_empty()
    }

    /// Write report files into `dir`. Empty reports produce no files.
    pub fn write_to(&self, dir: &Path) -> reshelf_io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(dir)?;
        if !self.duplicates.is_empty() {
            let groups: Vec<(&str, Vec<&ActionRecord>)> = self
                .duplicates
                .iter()
                .map(|g| (g.content_hash.as_str(), g.records.iter().collect()))
                .collect();
            write_duplicates_csv(&dir.join("duplicates.csv"), &groups)?;
        }
        if !self.collisions.is_empty() {
            let groups: Vec<(&str, Vec<&ActionRecord>)> = self
                .collisions
                .iter()
                .map(|g| (g.destination_path.as_str(), g.records.iter().collect()))
                .collect();
            write_collisions_txt(&dir.join("collisions.txt"), &groups)?;
        }
        Ok(())
    }
}

/// Derive both reports from the manifest. Deterministic: the same manifest
/// always yields the same groups in the same order.
pub fn report(manifest: &Manifest) -> ReorgReport {
    let mut by_hash: BTreeMap<&str, Vec<&ActionRecord>> = BTreeMap::new();
    let mut by_destination: BTreeMap<&str, Vec<&ActionRecord>> = BTreeMap::new();

    for record in manifest.records() {
        by_hash
            .entry(record.content_hash.as_str())
            .or_default()
            .push(record);
        by_destination
            .entry(record.destination_path.as_str())
            .or_default()
            .push(record);
    }

    let duplicates = by_hash
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(hash, members)| DuplicateGroup {
            content_hash: hash.to_string(),
            records: members.into_iter().cloned().collect(),
        })
        .collect();

    let collisions = by_destination
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(destination, members)| CollisionGroup {
            destination_path: destination.to_string(),
            records: members.into_iter().cloned().collect(),
        })
        .collect();

    ReorgReport {
        duplicates,
        collisions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reshelf_core::DestinationKey;

    fn rec(src: &str, hash: &str, key: DestinationKey) -> ActionRecord {
        ActionRecord::moved("bucket", src, 10, hash, key)
    }

    #[test]
    fn duplicates_group_by_hash_and_nothing_else() {
        let manifest = Manifest::from_records(vec![
            rec("in/a.csv", "dup123", DestinationKey::Default),
            rec("in/b.csv", "dup123", DestinationKey::Default),
            rec("in/c.csv", "unique", DestinationKey::Default),
        ]);

        let out = report(&manifest);
        assert_eq!(out.duplicates.len(), 1);
        let group = &out.duplicates[0];
        assert_eq!(group.content_hash, "dup123");
        assert_eq!(group.records.len(), 2);
        assert!(group.records.iter().all(|r| r.content_hash == "dup123"));
    }

    #[test]
    fn collisions_group_by_destination() {
        // Same basename from two directories collides in shared/.
        let manifest = Manifest::from_records(vec![
            rec("in/left/foo.txt", "h1", DestinationKey::Default),
            rec("in/right/foo.txt", "h2", DestinationKey::Default),
            rec("in/only.txt", "h3", DestinationKey::Default),
        ]);

        let out = report(&manifest);
        assert_eq!(out.collisions.len(), 1);
        let group = &out.collisions[0];
        assert_eq!(group.destination_path, "shared/foo.txt");
        let sources: Vec<&str> = group.records.iter().map(|r| r.source_path.as_str()).collect();
        assert_eq!(sources, vec!["in/left/foo.txt", "in/right/foo.txt"]);
    }

    #[test]
    fn clean_manifest_produces_empty_report() {
        let manifest = Manifest::from_records(vec![
            rec("in/a.csv", "h1", DestinationKey::Default),
            rec("in/b.pdf", "h2", DestinationKey::Get),
        ]);
        assert!(report(&manifest).is_empty());
    }

    #[test]
    fn report_is_idempotent() {
        let manifest = Manifest::from_records(vec![
            rec("in/a/x.txt", "dup", DestinationKey::Default),
            rec("in/b/x.txt", "dup", DestinationKey::Default),
        ]);

        let first = report(&manifest);
        let second = report(&manifest);
        assert_eq!(first.duplicates.len(), second.duplicates.len());
        assert_eq!(
            first.duplicates[0].records, second.duplicates[0].records,
        );
        assert_eq!(
            first.collisions[0].destination_path,
            second.collisions[0].destination_path
        );
    }
}
