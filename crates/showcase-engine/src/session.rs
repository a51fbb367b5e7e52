use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use showcase_contracts::api::{GenerateImageRequest, Route};
use showcase_contracts::events::{EventWriter, SessionEvent};
use showcase_contracts::form::{FormData, FormField, Photo};
use showcase_contracts::prompts::{PromptSource, SurprisePrompts};
use showcase_contracts::workflow::{
    ErrorBanner, OverlapPolicy, WorkflowKind, WorkflowOutcome, WorkflowStatus, WorkflowTracker,
};

use crate::api::{error_chain_text, GalleryApi, ERROR_TEXT_MAX_CHARS};
use crate::navigation::Navigator;

pub fn new_session_id() -> String {
    format!("session-{}", uuid::Uuid::new_v4().simple())
}

/// State behind the create-post form: the form record, one status per
/// workflow, and the error banner.
///
/// The lock is taken before and after each collaborator call but never held
/// across one, so a generate and a submit (or two of either) can be in flight
/// at the same time from different threads.
pub struct CreatePostSession {
    api: Arc<dyn GalleryApi>,
    navigator: Arc<dyn Navigator>,
    prompts: Arc<dyn PromptSource>,
    events: Option<EventWriter>,
    overlap: OverlapPolicy,
    state: Mutex<SessionState>,
}

#[derive(Debug, Default)]
struct SessionState {
    form: FormData,
    generate: WorkflowTracker<Photo>,
    submit: WorkflowTracker<Value>,
    banner: Option<ErrorBanner>,
}

impl SessionState {
    fn raise(&mut self, source: WorkflowKind, message: &str) {
        self.banner = Some(ErrorBanner {
            source,
            message: message.to_string(),
        });
    }

    fn clear_banner_from(&mut self, source: WorkflowKind) {
        if self
            .banner
            .as_ref()
            .map(|banner| banner.source == source)
            .unwrap_or(false)
        {
            self.banner = None;
        }
    }
}

/// A consistent copy of the session taken under one lock.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub form: FormData,
    pub generate: WorkflowStatus<Photo>,
    pub submit: WorkflowStatus<Value>,
    pub error: Option<ErrorBanner>,
}

impl SessionSnapshot {
    pub fn is_generating(&self) -> bool {
        self.generate.is_in_flight()
    }

    pub fn is_submitting(&self) -> bool {
        self.submit.is_in_flight()
    }
}

impl CreatePostSession {
    pub fn new(api: Arc<dyn GalleryApi>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            api,
            navigator,
            prompts: Arc::new(SurprisePrompts::default()),
            events: None,
            overlap: OverlapPolicy::default(),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_prompts(mut self, prompts: Arc<dyn PromptSource>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_overlap(mut self, overlap: OverlapPolicy) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn with_events(mut self, events: EventWriter) -> Self {
        self.events = Some(events);
        self.emit(SessionEvent::SessionStarted {
            backend: self.api.name().to_string(),
            overlap: self.overlap,
        });
        self
    }

    pub fn overlap(&self) -> OverlapPolicy {
        self.overlap
    }

    pub fn backend_name(&self) -> &str {
        self.api.name()
    }

    pub fn form(&self) -> FormData {
        self.lock().form.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            form: state.form.clone(),
            generate: state.generate.status().clone(),
            submit: state.submit.status().clone(),
            error: state.banner.clone(),
        }
    }

    pub fn is_generating(&self) -> bool {
        self.lock().generate.status().is_in_flight()
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().submit.status().is_in_flight()
    }

    pub fn error(&self) -> Option<ErrorBanner> {
        self.lock().banner.clone()
    }

    pub fn set_field(&self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        let chars = value.chars().count();
        self.lock().form.set_field(field, value);
        self.emit(SessionEvent::FieldUpdated { field, chars });
    }

    /// Swaps the prompt for one drawn from the prompt source.
    pub fn surprise_me(&self) -> String {
        let prompt = {
            let mut state = self.lock();
            let prompt = self.prompts.next_prompt(&state.form.prompt);
            state.form.prompt = prompt.clone();
            prompt
        };
        self.emit(SessionEvent::PromptSurprised {
            prompt: prompt.clone(),
        });
        prompt
    }

    /// Asks the generation endpoint for an image of the current prompt and
    /// stores it as the form photo.
    pub fn generate(&self) -> WorkflowOutcome<Photo> {
        let kind = WorkflowKind::Generate;
        let (token, prompt) = {
            let mut state = self.lock();
            let prompt = state.form.require_prompt().map(str::to_string);
            match prompt {
                Ok(prompt) => (state.generate.begin(), prompt),
                Err(err) => {
                    state.raise(kind, &err.to_string());
                    drop(state);
                    self.emit(SessionEvent::rejected(kind, err.to_string()));
                    return WorkflowOutcome::Rejected(err);
                }
            }
        };
        self.emit(SessionEvent::GenerateStarted {
            token,
            prompt: prompt.clone(),
        });

        let result = self
            .api
            .generate_image(&GenerateImageRequest { prompt })
            .and_then(|response| {
                Photo::from_jpeg_base64(&response.photo).map_err(anyhow::Error::from)
            })
            .map_err(|err| error_chain_text(&err, ERROR_TEXT_MAX_CHARS));

        let mut state = self.lock();
        if !state.generate.complete(token, result.clone(), self.overlap) {
            let latest = state.generate.latest();
            drop(state);
            self.emit(SessionEvent::superseded(kind, token, latest));
            return WorkflowOutcome::Superseded(token);
        }
        match result {
            Ok(photo) => {
                state.form.photo = Some(photo.clone());
                state.clear_banner_from(kind);
                drop(state);
                self.emit(SessionEvent::GenerateSucceeded {
                    token,
                    photo_chars: photo.as_data_uri().len(),
                });
                WorkflowOutcome::Completed(photo)
            }
            Err(message) => {
                state.raise(kind, &message);
                drop(state);
                self.emit(SessionEvent::failed(kind, token, message.clone()));
                WorkflowOutcome::Failed(message)
            }
        }
    }

    /// Shares the form with the community feed and navigates home on success.
    pub fn submit(&self) -> WorkflowOutcome<Value> {
        let kind = WorkflowKind::Submit;
        let (token, post) = {
            let mut state = self.lock();
            match state.form.to_new_post() {
                Ok(post) => (state.submit.begin(), post),
                Err(err) => {
                    state.raise(kind, &err.to_string());
                    drop(state);
                    self.emit(SessionEvent::rejected(kind, err.to_string()));
                    return WorkflowOutcome::Rejected(err);
                }
            }
        };
        self.emit(SessionEvent::SubmitStarted {
            token,
            name: post.name.clone(),
            prompt: post.prompt.clone(),
        });

        let result = self
            .api
            .create_post(&post)
            .map_err(|err| error_chain_text(&err, ERROR_TEXT_MAX_CHARS));

        let mut state = self.lock();
        if !state.submit.complete(token, result.clone(), self.overlap) {
            let latest = state.submit.latest();
            drop(state);
            self.emit(SessionEvent::superseded(kind, token, latest));
            return WorkflowOutcome::Superseded(token);
        }
        match result {
            Ok(reply) => {
                state.clear_banner_from(kind);
                drop(state);
                self.emit(SessionEvent::SubmitSucceeded { token });
                self.navigator.navigate(Route::Home);
                self.emit(SessionEvent::Navigated { route: Route::Home });
                WorkflowOutcome::Completed(reply)
            }
            Err(message) => {
                state.raise(kind, &message);
                drop(state);
                self.emit(SessionEvent::failed(kind, token, message.clone()));
                WorkflowOutcome::Failed(message)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = events.record(&event) {
            eprintln!("showcase: failed to log {}: {err:#}", event.name());
        }
    }
}
