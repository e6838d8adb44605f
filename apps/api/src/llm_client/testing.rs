//! Scripted in-memory backend for stage, handler, and pipeline tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::classify::{self, FailureClass};
use super::{BackendFactory, CallOptions, LlmBackend, LlmError, ProviderKind};
use crate::errors::AppError;

/// What the scripted provider does when called.
#[derive(Debug, Clone)]
pub enum Script {
    Reply(String),
    Fail {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// Never answers; used to exercise stage timeouts.
    Hang,
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: String,
    pub user: String,
    pub options: CallOptions,
}

/// Hands out `ScriptedBackend`s that all record into the same call log.
#[derive(Clone)]
pub struct ScriptedFactory {
    scripts: Arc<Mutex<Vec<Script>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    credential_missing: bool,
}

impl ScriptedFactory {
    /// Each call pops the next script; the last one repeats.
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts)),
            calls: Arc::new(Mutex::new(Vec::new())),
            credential_missing: false,
        }
    }

    pub fn replying(payload: impl Into<String>) -> Self {
        Self::new(vec![Script::Reply(payload.into())])
    }

    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self::new(vec![Script::Fail {
            status,
            code: None,
            message: message.into(),
        }])
    }

    pub fn without_credential() -> Self {
        Self {
            credential_missing: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_script(&self) -> Script {
        let mut scripts = self.scripts.lock().unwrap();
        if scripts.len() > 1 {
            scripts.remove(0)
        } else {
            scripts
                .first()
                .cloned()
                .unwrap_or_else(|| Script::Reply("{}".to_string()))
        }
    }
}

impl BackendFactory for ScriptedFactory {
    fn create(&self) -> Result<Box<dyn LlmBackend>, AppError> {
        if self.credential_missing {
            return Err(AppError::Configuration(
                "No LLM API key configured. Set OPENAI_API_KEY.".to_string(),
            ));
        }
        Ok(Box::new(ScriptedBackend {
            script: self.next_script(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

pub struct ScriptedBackend {
    script: Script,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn submit(
        &self,
        system: &str,
        user: &str,
        options: &CallOptions,
    ) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: system.to_string(),
            user: user.to_string(),
            options: *options,
        });

        match &self.script {
            Script::Reply(payload) => Ok(payload.clone()),
            Script::Fail {
                status,
                code,
                message,
            } => Err(LlmError::Api {
                status: *status,
                code: code.clone(),
                message: message.clone(),
            }),
            Script::Hang => {
                std::future::pending::<()>().await;
                Err(LlmError::EmptyContent)
            }
        }
    }

    fn classify_failure(&self, err: LlmError) -> AppError {
        classify::classify(ProviderKind::OpenAi, self.model(), err, no_codes)
    }
}

fn no_codes(_: &str) -> Option<FailureClass> {
    None
}
