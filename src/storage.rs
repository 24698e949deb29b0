use crate::domain::Admission;
use crate::error::{EtlError, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Storage trait for the load step's target table
#[async_trait]
pub trait AdmissionStore: Send + Sync {
    /// Whether the target table is present and ready for inserts
    async fn table_exists(&self) -> Result<bool>;

    /// Insert a single admission row. Errors are per-row; the caller decides
    /// whether to skip or abort.
    async fn insert_admission(&self, admission: &Admission) -> Result<()>;
}

/// Mirrors the NOT NULL constraints on the real table so the in-memory store
/// rejects the same rows Postgres would.
fn validate_for_insert(admission: &Admission) -> Result<()> {
    if admission.patient_id.trim().is_empty() {
        return Err(EtlError::Store {
            message: "patient_id is empty".to_string(),
        });
    }
    if admission.admission_date.is_none() {
        return Err(EtlError::Store {
            message: format!(
                "admission_date is null for patient {}",
                admission.patient_id
            ),
        });
    }
    Ok(())
}

/// In-memory store implementation for development/testing
pub struct InMemoryStore {
    rows: Arc<Mutex<Vec<Admission>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of everything inserted so far
    pub fn rows(&self) -> Vec<Admission> {
        self.rows.lock().unwrap().clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AdmissionStore for InMemoryStore {
    async fn table_exists(&self) -> Result<bool> {
        Ok(true)
    }

    async fn insert_admission(&self, admission: &Admission) -> Result<()> {
        validate_for_insert(admission)?;

        let mut rows = self.rows.lock().unwrap();
        rows.push(admission.clone());

        debug!("Stored admission for patient {}", admission.patient_id);
        Ok(())
    }
}
