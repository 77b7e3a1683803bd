//! Front-end facade.
//!
//! A [`Console`] pairs one [`RagApi`] backend with one [`Operation`] per
//! user-facing action, which is everything a form-driven front end needs:
//!
//! | Action | Operation |
//! |--------|-----------|
//! | add a document | [`Console::documents`] |
//! | ask a question | [`Console::questions`] |
//! | switch model | [`Console::model_switch`] |
//!
//! Stats and health are read-only probes without their own lifecycle; they
//! are passed straight through.

use std::future::Future;
use std::sync::Arc;

use crate::client::RagApi;
use crate::error::ApiResult;
use crate::models::{
    AddDocumentRequest, AddDocumentResult, HealthResult, ModelSwitchAck, SearchRequest,
    SearchResult, StatsResult,
};
use crate::operation::{Operation, Settlement};

pub struct Console {
    api: Arc<dyn RagApi>,
    documents: Operation<AddDocumentResult>,
    questions: Operation<SearchResult>,
    model_switch: Operation<ModelSwitchAck>,
}

impl Console {
    pub fn new(api: Arc<dyn RagApi>) -> Self {
        Self {
            api,
            documents: Operation::new(),
            questions: Operation::new(),
            model_switch: Operation::new(),
        }
    }

    pub fn documents(&self) -> &Operation<AddDocumentResult> {
        &self.documents
    }

    pub fn questions(&self) -> &Operation<SearchResult> {
        &self.questions
    }

    pub fn model_switch(&self) -> &Operation<ModelSwitchAck> {
        &self.model_switch
    }

    /// Submit a document. The add-document operation is pending on return.
    pub fn submit_document(
        &self,
        req: AddDocumentRequest,
    ) -> impl Future<Output = Settlement> + Send + 'static {
        let api = Arc::clone(&self.api);
        self.documents
            .submit(async move { api.add_document(&req).await })
    }

    /// Ask a question. The question operation is pending on return.
    pub fn ask(&self, req: SearchRequest) -> impl Future<Output = Settlement> + Send + 'static {
        let api = Arc::clone(&self.api);
        self.questions.submit(async move { api.search(&req).await })
    }

    /// Switch the backend model. Failures land in [`Console::model_switch`].
    ///
    /// The client's default model follows only the switch whose outcome is
    /// applied; a superseded acknowledgement leaves it alone.
    pub fn switch_model(
        &self,
        model_id: impl Into<String>,
    ) -> impl Future<Output = Settlement> + Send + 'static {
        let api = Arc::clone(&self.api);
        let model_id = model_id.into();
        let requested = model_id.clone();
        let roster = Arc::clone(&self.api);
        self.model_switch.submit_then(
            async move { api.switch_model(&model_id).await },
            move |_: &ModelSwitchAck| {
                if let Err(err) = roster.set_active_model(&requested) {
                    tracing::warn!(
                        model = %requested,
                        error = %err,
                        "could not record active model"
                    );
                }
            },
        )
    }

    pub async fn stats(&self) -> ApiResult<StatsResult> {
        self.api.get_stats().await
    }

    pub async fn health(&self) -> ApiResult<HealthResult> {
        self.api.get_health().await
    }

    /// Reset every operation, e.g. when the view is torn down.
    pub fn reset_all(&self) {
        self.documents.reset();
        self.questions.reset();
        self.model_switch.reset();
    }
}
