use crate::models::CertificateData;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub id: u64,
    /// Filled in once the artifact is stored; a failed render leaves the
    /// record pending with no URL.
    pub cert_url: Option<String>,
    pub recipient_name: String,
    pub course_name: String,
    pub completion_date: String,
    pub created_at: String,
}

/// Certificate metadata store with a two-phase write: a pending record is
/// inserted before rendering starts, and completed with the artifact URL
/// only on success. State is mirrored to a JSON file after each mutation.
pub struct CertificateStore {
    records: DashMap<u64, CertificateRecord>,
    next_id: AtomicU64,
    state_file: PathBuf,
}

impl CertificateStore {
    pub fn load(state_file: impl Into<PathBuf>) -> Self {
        let state_file = state_file.into();
        let records = DashMap::new();

        if state_file.exists() {
            match std::fs::read_to_string(&state_file) {
                Ok(json) => match serde_json::from_str::<Vec<CertificateRecord>>(&json) {
                    Ok(list) => {
                        info!(
                            "Loaded {} certificate records from {}",
                            list.len(),
                            state_file.display()
                        );
                        for record in list {
                            records.insert(record.id, record);
                        }
                    }
                    Err(e) => warn!("Failed to parse {}: {:?}", state_file.display(), e),
                },
                Err(e) => warn!("Failed to read {}: {:?}", state_file.display(), e),
            }
        }

        let next_id = records.iter().map(|r| r.value().id).max().unwrap_or(0) + 1;
        Self {
            records,
            next_id: AtomicU64::new(next_id),
            state_file,
        }
    }

    /// Inserts a pending record and returns its identifier. Runs before
    /// rendering starts, so the id exists even if the render later fails.
    pub fn insert_pending(&self, data: &CertificateData) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = CertificateRecord {
            id,
            cert_url: None,
            recipient_name: data.recipient_name.clone(),
            course_name: data.course_name.clone(),
            completion_date: data.completion_date.clone(),
            created_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        self.records.insert(id, record);
        self.save();
        id
    }

    pub fn complete(&self, id: u64, url: &str) -> bool {
        if let Some(mut record) = self.records.get_mut(&id) {
            record.cert_url = Some(url.to_string());
            drop(record);
            self.save();
            true
        } else {
            false
        }
    }

    pub fn get(&self, id: u64) -> Option<CertificateRecord> {
        self.records.get(&id).map(|r| r.value().clone())
    }

    fn save(&self) {
        if let Some(parent) = self.state_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let mut list: Vec<CertificateRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        list.sort_by_key(|r| r.id);
        match serde_json::to_string_pretty(&list) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.state_file, json) {
                    warn!("Failed to save certificate records: {:?}", e);
                }
            }
            Err(e) => warn!("Failed to serialize certificate records: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(recipient: &str) -> CertificateData {
        CertificateData {
            recipient_name: recipient.to_string(),
            course_name: "Rust Backend Development".to_string(),
            completion_date: "2024-06-01".to_string(),
        }
    }

    #[test]
    fn pending_records_have_no_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::load(dir.path().join("certs.json"));

        let id = store.insert_pending(&data("Alice"));
        let record = store.get(id).unwrap();
        assert_eq!(record.cert_url, None);
        assert_eq!(record.recipient_name, "Alice");
    }

    #[test]
    fn complete_sets_the_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::load(dir.path().join("certs.json"));

        let id = store.insert_pending(&data("Bob"));
        assert!(store.complete(id, "http://localhost:8090/static/x.pdf"));
        assert_eq!(
            store.get(id).unwrap().cert_url.as_deref(),
            Some("http://localhost:8090/static/x.pdf")
        );
    }

    #[test]
    fn complete_unknown_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::load(dir.path().join("certs.json"));
        assert!(!store.complete(42, "http://localhost:8090/static/x.pdf"));
    }

    #[test]
    fn ids_increment() {
        let dir = tempfile::tempdir().unwrap();
        let store = CertificateStore::load(dir.path().join("certs.json"));
        let first = store.insert_pending(&data("Alice"));
        let second = store.insert_pending(&data("Bob"));
        assert_eq!(second, first + 1);
    }

    #[test]
    fn records_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let state_file = dir.path().join("certs.json");

        let store = CertificateStore::load(&state_file);
        let id = store.insert_pending(&data("Alice"));
        store.complete(id, "http://localhost:8090/static/a.pdf");

        let reloaded = CertificateStore::load(&state_file);
        let record = reloaded.get(id).unwrap();
        assert_eq!(record.recipient_name, "Alice");
        assert_eq!(
            record.cert_url.as_deref(),
            Some("http://localhost:8090/static/a.pdf")
        );

        // Fresh ids continue past the persisted maximum.
        let next = reloaded.insert_pending(&data("Bob"));
        assert_eq!(next, id + 1);
    }
}
