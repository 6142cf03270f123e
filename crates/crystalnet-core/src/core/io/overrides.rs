use super::error::LoadError;
use crate::core::connectivity::graph::ConnectionType;
use crate::core::connectivity::overrides::BondOverrides;
use crate::core::models::hkl::HKL;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct OverrideRecord {
    source: usize,
    target: usize,
    h: i32,
    k: i32,
    l: i32,
    connection: String,
}

/// Reads a `source,target,h,k,l,connection` table of forced classifications.
///
/// Later rows win when the same connection is listed twice, in either orientation.
pub fn load_bond_overrides(path: &Path) -> Result<BondOverrides, LoadError> {
    let path_str = path.to_string_lossy().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .map_err(|e| LoadError::Csv {
            path: path_str.clone(),
            source: e,
        })?;

    let mut overrides = BondOverrides::new();
    for (record_idx, result) in reader.deserialize::<OverrideRecord>().enumerate() {
        let record = result.map_err(|e| LoadError::Csv {
            path: path_str.clone(),
            source: e,
        })?;
        let connection_type: ConnectionType =
            record
                .connection
                .parse()
                .map_err(|_| LoadError::InvalidRecord {
                    path: path_str.clone(),
                    record: record_idx + 1,
                    message: format!("unknown connection type '{}'", record.connection),
                })?;

        let hkl = HKL::new(record.h, record.k, record.l);
        if let Some(previous) =
            overrides.insert(record.source, record.target, hkl, connection_type)
        {
            warn!(
                source = record.source,
                target = record.target,
                hkl = %hkl,
                previous = %previous,
                replacement = %connection_type,
                "Bond override listed more than once; keeping the last entry."
            );
        }
    }

    debug!(path = %path_str, count = overrides.len(), "Loaded bond overrides.");
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connectivity::overrides::EdgeKey;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_bond_overrides_succeeds_with_valid_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("overrides.csv");
        fs::write(
            &path,
            "source,target,h,k,l,connection\n\
             0, 1, 0, 0, 0, DontBond\n\
             # comment lines are skipped\n\
             3,2,1,0,-1,covalent\n",
        )
        .unwrap();

        let overrides = load_bond_overrides(&path).unwrap();
        assert_eq!(overrides.len(), 2);
        assert_eq!(
            overrides.get(&EdgeKey::new(0, 1, HKL::ZERO)),
            Some(ConnectionType::DontBond)
        );
        assert_eq!(
            overrides.get(&EdgeKey::new(2, 3, HKL::new(-1, 0, 1))),
            Some(ConnectionType::CovalentBond)
        );
    }

    #[test]
    fn reversed_duplicate_replaces_earlier_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dup.csv");
        fs::write(
            &path,
            "source,target,h,k,l,connection\n0,1,1,0,0,contact\n1,0,-1,0,0,hbond\n",
        )
        .unwrap();

        let overrides = load_bond_overrides(&path).unwrap();
        assert_eq!(overrides.len(), 1);
        assert_eq!(
            overrides.get(&EdgeKey::new(0, 1, HKL::new(1, 0, 0))),
            Some(ConnectionType::HydrogenBond)
        );
    }

    #[test]
    fn unknown_connection_type_is_reported_with_record_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(
            &path,
            "source,target,h,k,l,connection\n0,1,0,0,0,covalent\n0,2,0,0,0,ionic\n",
        )
        .unwrap();

        match load_bond_overrides(&path) {
            Err(LoadError::InvalidRecord { record, .. }) => assert_eq!(record, 2),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[test]
    fn malformed_csv_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("malformed.csv");
        fs::write(&path, "source,target,h,k,l,connection\n0,1,x,0,0,covalent\n").unwrap();
        assert!(matches!(
            load_bond_overrides(&path),
            Err(LoadError::Csv { .. })
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = load_bond_overrides(Path::new("no/such/overrides.csv"));
        assert!(matches!(result, Err(LoadError::Csv { .. })));
    }
}
