use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::api::Route;
use crate::form::FormField;
use crate::workflow::{OverlapPolicy, RequestToken, WorkflowKind};

/// Something a create-post session did. Serialized with the variant name in
/// snake_case under `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        backend: String,
        overlap: OverlapPolicy,
    },
    FieldUpdated {
        field: FormField,
        chars: usize,
    },
    PromptSurprised {
        prompt: String,
    },
    GenerateStarted {
        token: RequestToken,
        prompt: String,
    },
    GenerateSucceeded {
        token: RequestToken,
        photo_chars: usize,
    },
    GenerateFailed {
        token: RequestToken,
        error: String,
    },
    GenerateRejected {
        error: String,
    },
    GenerateSuperseded {
        token: RequestToken,
        latest: Option<RequestToken>,
    },
    SubmitStarted {
        token: RequestToken,
        name: String,
        prompt: String,
    },
    SubmitSucceeded {
        token: RequestToken,
    },
    SubmitFailed {
        token: RequestToken,
        error: String,
    },
    SubmitRejected {
        error: String,
    },
    SubmitSuperseded {
        token: RequestToken,
        latest: Option<RequestToken>,
    },
    Navigated {
        route: Route,
    },
}

impl SessionEvent {
    pub fn rejected(kind: WorkflowKind, error: impl Into<String>) -> Self {
        let error = error.into();
        match kind {
            WorkflowKind::Generate => SessionEvent::GenerateRejected { error },
            WorkflowKind::Submit => SessionEvent::SubmitRejected { error },
        }
    }

    pub fn failed(kind: WorkflowKind, token: RequestToken, error: impl Into<String>) -> Self {
        let error = error.into();
        match kind {
            WorkflowKind::Generate => SessionEvent::GenerateFailed { token, error },
            WorkflowKind::Submit => SessionEvent::SubmitFailed { token, error },
        }
    }

    pub fn superseded(
        kind: WorkflowKind,
        token: RequestToken,
        latest: Option<RequestToken>,
    ) -> Self {
        match kind {
            WorkflowKind::Generate => SessionEvent::GenerateSuperseded { token, latest },
            WorkflowKind::Submit => SessionEvent::SubmitSuperseded { token, latest },
        }
    }

    /// The `type` value of the row.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session_started",
            SessionEvent::FieldUpdated { .. } => "field_updated",
            SessionEvent::PromptSurprised { .. } => "prompt_surprised",
            SessionEvent::GenerateStarted { .. } => "generate_started",
            SessionEvent::GenerateSucceeded { .. } => "generate_succeeded",
            SessionEvent::GenerateFailed { .. } => "generate_failed",
            SessionEvent::GenerateRejected { .. } => "generate_rejected",
            SessionEvent::GenerateSuperseded { .. } => "generate_superseded",
            SessionEvent::SubmitStarted { .. } => "submit_started",
            SessionEvent::SubmitSucceeded { .. } => "submit_succeeded",
            SessionEvent::SubmitFailed { .. } => "submit_failed",
            SessionEvent::SubmitRejected { .. } => "submit_rejected",
            SessionEvent::SubmitSuperseded { .. } => "submit_superseded",
            SessionEvent::Navigated { .. } => "navigated",
        }
    }
}

#[derive(Serialize)]
struct EventRow<'a> {
    #[serde(flatten)]
    event: &'a SessionEvent,
    session_id: &'a str,
    ts: String,
}

/// JSONL log for one session. The file is opened once in append mode and
/// every row is written with a single call under the lock, so clones handed
/// to workflow threads never interleave partial lines.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventLog>,
}

#[derive(Debug)]
struct EventLog {
    path: PathBuf,
    session_id: String,
    file: Mutex<File>,
}

impl EventWriter {
    pub fn open(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed opening event log {}", path.display()))?;
        Ok(Self {
            inner: Arc::new(EventLog {
                path,
                session_id: session_id.into(),
                file: Mutex::new(file),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn record(&self, event: &SessionEvent) -> Result<()> {
        let row = EventRow {
            event,
            session_id: &self.inner.session_id,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        };
        let mut line = serde_json::to_vec(&row)?;
        line.push(b'\n');
        let mut file = self
            .inner
            .file
            .lock()
            .map_err(|_| anyhow!("event log lock poisoned"))?;
        file.write_all(&line)
            .with_context(|| format!("failed writing {}", self.inner.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::thread;

    use chrono::DateTime;
    use serde_json::{json, Value};

    use crate::api::Route;
    use crate::form::FormField;
    use crate::workflow::{OverlapPolicy, WorkflowKind, WorkflowTracker};

    use super::{EventWriter, SessionEvent};

    fn rows(path: &Path) -> anyhow::Result<Vec<Value>> {
        fs::read_to_string(path)?
            .lines()
            .map(|line| serde_json::from_str(line).map_err(anyhow::Error::from))
            .collect()
    }

    #[test]
    fn row_carries_type_session_and_timestamp() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::open(temp.path().join("events.jsonl"), "session-123")?;

        writer.record(&SessionEvent::FieldUpdated {
            field: FormField::Prompt,
            chars: 10,
        })?;

        let rows = rows(writer.path())?;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row["type"], json!("field_updated"));
        assert_eq!(row["field"], json!("prompt"));
        assert_eq!(row["chars"], json!(10));
        assert_eq!(row["session_id"], json!(writer.session_id()));
        DateTime::parse_from_rfc3339(row["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn workflow_rows_use_plain_values() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::open(temp.path().join("events.jsonl"), "session-123")?;
        let mut tracker = WorkflowTracker::<()>::new();
        let first = tracker.begin();
        let second = tracker.begin();

        writer.record(&SessionEvent::SessionStarted {
            backend: "dryrun".to_string(),
            overlap: OverlapPolicy::LatestRequest,
        })?;
        writer.record(&SessionEvent::GenerateStarted {
            token: first,
            prompt: "sunflowers".to_string(),
        })?;
        writer.record(&SessionEvent::superseded(
            WorkflowKind::Generate,
            first,
            tracker.latest(),
        ))?;
        writer.record(&SessionEvent::rejected(
            WorkflowKind::Submit,
            "Please fill all the fields",
        ))?;
        writer.record(&SessionEvent::Navigated { route: Route::Home })?;

        let rows = rows(writer.path())?;
        assert_eq!(rows[0]["overlap"], json!("latest-request"));
        assert_eq!(rows[1]["token"], json!(1));
        assert_eq!(rows[2]["type"], json!("generate_superseded"));
        assert_eq!(rows[2]["latest"], json!(second.value()));
        assert_eq!(rows[3]["type"], json!("submit_rejected"));
        assert!(rows[3].get("token").is_none());
        assert_eq!(rows[4]["route"], json!("/"));
        Ok(())
    }

    #[test]
    fn name_matches_serialized_type() -> anyhow::Result<()> {
        let mut tracker = WorkflowTracker::<()>::new();
        let token = tracker.begin();
        for event in [
            SessionEvent::failed(WorkflowKind::Submit, token, "feed offline"),
            SessionEvent::failed(WorkflowKind::Generate, token, "boom"),
            SessionEvent::SubmitSucceeded { token },
            SessionEvent::PromptSurprised {
                prompt: "a plush toy robot".to_string(),
            },
        ] {
            assert_eq!(serde_json::to_value(&event)?["type"], json!(event.name()));
        }
        Ok(())
    }

    #[test]
    fn reopening_appends_to_existing_log() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("log").join("events.jsonl");
        let event = SessionEvent::Navigated {
            route: Route::CreatePost,
        };

        EventWriter::open(&path, "session-1")?.record(&event)?;
        EventWriter::open(&path, "session-2")?.record(&event)?;

        let rows = rows(&path)?;
        let sessions: Vec<&str> = rows
            .iter()
            .filter_map(|row| row["session_id"].as_str())
            .collect();
        assert_eq!(sessions, vec!["session-1", "session-2"]);
        Ok(())
    }

    #[test]
    fn concurrent_clones_write_whole_lines() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::open(temp.path().join("events.jsonl"), "session-123")?;

        let handles = (0..4)
            .map(|worker| {
                let writer = writer.clone();
                thread::spawn(move || -> anyhow::Result<()> {
                    for idx in 0..10 {
                        writer.record(&SessionEvent::PromptSurprised {
                            prompt: format!("worker {worker} prompt {idx}"),
                        })?;
                    }
                    Ok(())
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("writer thread panicked"))??;
        }

        let rows = rows(writer.path())?;
        assert_eq!(rows.len(), 40);
        assert!(rows
            .iter()
            .all(|row| row["type"] == json!("prompt_surprised")));
        Ok(())
    }
}
