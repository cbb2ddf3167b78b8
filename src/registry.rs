//! Assistant registry: the cached assistant list plus selection state.
//!
//! Selection is local client state only — the backend never learns which
//! assistant is "current". Creation delegates to the streamed upload in
//! [`crate::create`] and then re-fetches the list: the streamed record's
//! fields are trusted only for obtaining the new id.

use std::path::Path;

use crate::client::{ApiClient, ApiError};
use crate::create::CreateAssistantParams;
use crate::models::Assistant;
use crate::progress::CreateProgressReporter;

#[derive(Default)]
pub struct AssistantRegistry {
    assistants: Vec<Assistant>,
    selected: Option<i64>,
}

impl AssistantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached list with a fresh fetch.
    pub async fn refresh(&mut self, client: &ApiClient) -> Result<(), ApiError> {
        self.assistants = client.assistants().await?;
        Ok(())
    }

    /// Create an assistant, re-fetch the list, and return the new id.
    pub async fn create(
        &mut self,
        client: &ApiClient,
        params: &CreateAssistantParams,
        file: &Path,
        reporter: &dyn CreateProgressReporter,
    ) -> Result<String, ApiError> {
        let id = client.create_assistant(params, file, reporter).await?;
        self.refresh(client).await?;
        Ok(id)
    }

    /// Delete on the backend, then drop the cached record. Deleting the
    /// selected assistant clears the selection; any other delete leaves
    /// selection untouched.
    pub async fn delete(&mut self, client: &ApiClient, id: i64) -> Result<(), ApiError> {
        client.delete_assistant(id).await?;
        self.forget(id);
        Ok(())
    }

    /// Local removal half of [`delete`](Self::delete).
    pub fn forget(&mut self, id: i64) {
        self.assistants.retain(|a| a.id != id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    /// Select an assistant by id, or pass `None` to deselect. Selecting an
    /// id that is not in the cached list is an error.
    pub fn select(&mut self, id: Option<i64>) -> Result<(), ApiError> {
        if let Some(id) = id {
            if !self.assistants.iter().any(|a| a.id == id) {
                return Err(ApiError::InvalidInput(format!("No assistant with id {}", id)));
            }
        }
        self.selected = id;
        Ok(())
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected
    }

    /// The cached record for the current selection, when one exists.
    pub fn selected(&self) -> Option<&Assistant> {
        let id = self.selected?;
        self.assistants.iter().find(|a| a.id == id)
    }

    pub fn assistants(&self) -> &[Assistant] {
        &self.assistants
    }
}
