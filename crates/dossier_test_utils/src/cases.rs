//! In-memory case repository.

use async_trait::async_trait;
use dossier_engine::{CaseRepoError, CaseRepository};
use dossier_protocol::{CaseRef, DocSlot, SlotAttachment};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct CaseState {
    cases: Vec<CaseRef>,
    attachments: HashMap<(String, String), SlotAttachment>,
    created: usize,
}

/// Fake case store: known cases plus one attachment per (case, slot).
#[derive(Default)]
pub struct InMemoryCaseRepo {
    state: Mutex<CaseState>,
}

impl InMemoryCaseRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cases(cases: Vec<CaseRef>) -> Self {
        Self {
            state: Mutex::new(CaseState {
                cases,
                ..CaseState::default()
            }),
        }
    }

    pub fn add_case(&self, id: &str, code: &str, display_name: &str) {
        self.lock().cases.push(CaseRef {
            id: id.to_string(),
            code: code.to_string(),
            display_name: display_name.to_string(),
        });
    }

    pub fn attachment(&self, case_id: &str, slot: DocSlot) -> Option<SlotAttachment> {
        self.lock()
            .attachments
            .get(&(case_id.to_string(), slot.as_str().to_string()))
            .cloned()
    }

    pub fn attachment_count(&self) -> usize {
        self.lock().attachments.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CaseState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepo {
    async fn list_cases(&self) -> Result<Vec<CaseRef>, CaseRepoError> {
        Ok(self.lock().cases.clone())
    }

    async fn document_in_slot(
        &self,
        case_id: &str,
        slot: DocSlot,
    ) -> Result<Option<SlotAttachment>, CaseRepoError> {
        Ok(self
            .lock()
            .attachments
            .get(&(case_id.to_string(), slot.as_str().to_string()))
            .cloned())
    }

    async fn attach_document(
        &self,
        case_id: &str,
        slot: DocSlot,
        attachment: SlotAttachment,
    ) -> Result<(), CaseRepoError> {
        let mut state = self.lock();
        if !state.cases.iter().any(|c| c.id == case_id) {
            return Err(CaseRepoError::NotFound(case_id.to_string()));
        }
        state
            .attachments
            .insert((case_id.to_string(), slot.as_str().to_string()), attachment);
        Ok(())
    }

    async fn create_case(&self, display_name: &str) -> Result<CaseRef, CaseRepoError> {
        let mut state = self.lock();
        state.created += 1;
        let case = CaseRef {
            id: format!("case-new-{}", state.created),
            code: format!("NEW{:03}", state.created),
            display_name: display_name.to_string(),
        };
        state.cases.push(case.clone());
        Ok(case)
    }
}
