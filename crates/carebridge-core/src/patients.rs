//! In-memory patient registry.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PatientError {
    #[error("Patient id must not be empty")]
    EmptyId,

    #[error("Patient name must not be empty")]
    EmptyName,

    #[error("Patient already registered: {0}")]
    Duplicate(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Patient {
    pub fn new(id: impl Into<String>, name: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    /// Condition for display, with a placeholder when none is recorded
    pub fn condition_display(&self) -> &str {
        self.condition.as_deref().filter(|c| !c.is_empty()).unwrap_or("-")
    }
}

/// Patients in the order they were added, unique by id.
#[derive(Debug, Default)]
pub struct PatientRegistry {
    patients: Vec<Patient>,
}

impl PatientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, patient: Patient) -> Result<(), PatientError> {
        if patient.id.trim().is_empty() {
            return Err(PatientError::EmptyId);
        }
        if patient.name.trim().is_empty() {
            return Err(PatientError::EmptyName);
        }
        if self.get(&patient.id).is_some() {
            return Err(PatientError::Duplicate(patient.id));
        }
        debug!(patient_id = %patient.id, "Patient added");
        self.patients.push(patient);
        Ok(())
    }

    /// Remove by id. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.patients.len();
        self.patients.retain(|p| p.id != id);
        let removed = self.patients.len() != before;
        if removed {
            debug!(patient_id = id, "Patient removed");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<&Patient> {
        self.patients.iter().find(|p| p.id == id)
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn len(&self) -> usize {
        self.patients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_keeps_insertion_order() {
        let mut registry = PatientRegistry::new();
        registry.add(Patient::new("p2", "Bea", 34)).unwrap();
        registry.add(Patient::new("p1", "Ada", 61)).unwrap();

        let names: Vec<&str> = registry
            .patients()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Bea", "Ada"]);
    }

    #[test]
    fn test_add_rejects_invalid_and_duplicate() {
        let mut registry = PatientRegistry::new();
        assert_eq!(
            registry.add(Patient::new("", "Ada", 61)),
            Err(PatientError::EmptyId)
        );
        assert_eq!(
            registry.add(Patient::new("p1", " ", 61)),
            Err(PatientError::EmptyName)
        );

        registry.add(Patient::new("p1", "Ada", 61)).unwrap();
        assert_eq!(
            registry.add(Patient::new("p1", "Other", 20)),
            Err(PatientError::Duplicate("p1".to_string()))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut registry = PatientRegistry::new();
        registry.add(Patient::new("p1", "Ada", 61)).unwrap();
        assert!(registry.remove("p1"));
        assert!(!registry.remove("p1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_condition_display() {
        assert_eq!(Patient::new("p1", "Ada", 61).condition_display(), "-");
        assert_eq!(
            Patient::new("p1", "Ada", 61)
                .with_condition("Hypertension")
                .condition_display(),
            "Hypertension"
        );
    }
}
