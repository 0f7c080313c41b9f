//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the ledger starts
//! accepting requests.

use std::path::Path;

use heed::types::Bytes;

use points_types::Grant;

use crate::environment::DATABASE_NAMES;
use crate::keys::{id_from_index_key, order_key, payer_order_key};
use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub grants_checked: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check LMDB database integrity on startup.
///
/// Confirms every expected database is present, then walks the grants and
/// checks each one against its indexes and the `remaining` bounds. Problems
/// are recorded in the report rather than causing a hard error.
pub fn check_integrity(environment: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let env = environment.env();
    let mut report = IntegrityReport {
        databases_checked: 0,
        grants_checked: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;
    let mut handles = Vec::with_capacity(DATABASE_NAMES.len());
    for &db_name in DATABASE_NAMES {
        match env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                handles.push(db);
            }
            Ok(None) => report.errors.push(format!("database '{}' is missing", db_name)),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{}': {}", db_name, e)),
        }
    }
    let [grants_db, order_db, unspent_db, payer_unspent_db, _meta_db] = match handles[..] {
        [a, b, c, d, e] => [a, b, c, d, e],
        _ => return Ok(report),
    };

    for entry in grants_db.iter(&rtxn)? {
        let (_, bytes) = entry?;
        let grant: Grant = match bincode::deserialize(bytes) {
            Ok(grant) => grant,
            Err(e) => {
                report.errors.push(format!("undecodable grant record: {}", e));
                continue;
            }
        };
        report.grants_checked += 1;

        if grant.remaining > grant.ceiling() {
            report.errors.push(format!(
                "grant {} remaining {} exceeds points {}",
                grant.id, grant.remaining, grant.points
            ));
        }
        let chrono = order_key(grant.occurred_at, grant.id);
        if order_db.get(&rtxn, &chrono)?.is_none() {
            report
                .errors
                .push(format!("grant {} missing from order index", grant.id));
        }
        let indexed_unspent = unspent_db.get(&rtxn, &chrono)?.is_some();
        let indexed_payer = payer_unspent_db.get(&rtxn, &payer_order_key(&grant))?.is_some();
        if indexed_unspent != grant.is_unspent() || indexed_payer != grant.is_unspent() {
            report.errors.push(format!(
                "grant {} unspent indexes disagree with remaining {}",
                grant.id, grant.remaining
            ));
        }
    }

    for entry in unspent_db.iter(&rtxn)? {
        let (key, _) = entry?;
        let id = id_from_index_key(key)?;
        if grants_db.get(&rtxn, &id.as_u64().to_be_bytes())?.is_none() {
            report
                .errors
                .push(format!("unspent index references missing grant {}", id));
        }
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(()); // Fresh start
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use points_store::{GrantBatch, GrantStore, NewGrant};
    use points_types::{PayerId, Timestamp};

    #[test]
    fn check_data_dir_fresh_path() {
        let result = check_data_dir(Path::new("/tmp/points_test_nonexistent_12345"));
        assert!(result.is_ok());
    }

    #[test]
    fn check_data_dir_without_data_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn populated_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 8, 1 << 20).unwrap();
        let store = env.grant_store();

        let mut batch = GrantBatch::new();
        batch.append(NewGrant::issued(PayerId::new("DANNON"), 300, Timestamp::new(1)));
        let id = store.commit(&batch).unwrap().unwrap();

        let mut batch = GrantBatch::new();
        batch.set_remaining(id, 300, 0);
        batch.append(NewGrant::clawback(PayerId::new("DANNON"), -300, Timestamp::new(2)));
        store.commit(&batch).unwrap();

        let report = check_integrity(&env).unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.databases_checked, DATABASE_NAMES.len() as u32);
        assert_eq!(report.grants_checked, 2);
    }

    #[test]
    fn unhealthy_report() {
        let report = IntegrityReport {
            databases_checked: 5,
            grants_checked: 100,
            errors: vec!["corruption detected".to_string()],
        };
        assert!(!report.is_healthy());
    }
}
