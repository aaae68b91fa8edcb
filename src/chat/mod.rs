//! Chatbot test console.
//!
//! A console alternates between [`ConsolePhase::Idle`] and
//! [`ConsolePhase::AwaitingResponse`]. Submitting a message appends it right
//! away and schedules exactly one canned reply on a tokio task; resetting or
//! closing the console aborts that task so nothing is appended afterwards.

mod picker;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::models::ResponseType;

pub use picker::{CannedResponse, RandomPicker, ResponseMode, ResponsePicker, CANNED_RESPONSES};

pub const WELCOME_MESSAGE: &str =
    "안녕하세요! 챗봇 테스트에 오신 것을 환영합니다. 무엇을 도와드릴까요?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsolePhase {
    Idle,
    AwaitingResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Bot,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl ChatMessage {
    fn user(content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::User,
            content,
            timestamp: Utc::now(),
            response_type: None,
            response_time: None,
            references: Vec::new(),
        }
    }

    fn welcome() -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::Bot,
            content: WELCOME_MESSAGE.to_string(),
            timestamp: Utc::now(),
            response_type: None,
            response_time: None,
            references: Vec::new(),
        }
    }

    fn reply(response: &CannedResponse, response_time: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: Speaker::Bot,
            content: response.content.to_string(),
            timestamp: Utc::now(),
            response_type: Some(response.response_type),
            response_time: Some(response_time),
            references: response.references.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("the console is still waiting for a response")]
    Busy,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsoleSnapshot {
    pub id: Uuid,
    pub phase: ConsolePhase,
    pub mode: ResponseMode,
    pub question_count: usize,
    /// Mean of the bot replies' response times, in seconds.
    pub avg_response_time: Option<f64>,
    pub messages: Vec<ChatMessage>,
}

struct ConsoleState {
    messages: Vec<ChatMessage>,
    phase: ConsolePhase,
    mode: ResponseMode,
    // Bumped on reset/close; a reply scheduled under an older epoch is dropped.
    epoch: u64,
    pending: Option<JoinHandle<()>>,
}

pub struct ChatConsole {
    id: Uuid,
    owner: Uuid,
    state: Arc<Mutex<ConsoleState>>,
    phase_tx: Arc<watch::Sender<ConsolePhase>>,
    picker: Arc<dyn ResponsePicker>,
}

impl ChatConsole {
    pub fn new(owner: Uuid, mode: ResponseMode, picker: Arc<dyn ResponsePicker>) -> Self {
        let (phase_tx, _) = watch::channel(ConsolePhase::Idle);
        Self {
            id: Uuid::new_v4(),
            owner,
            state: Arc::new(Mutex::new(ConsoleState {
                messages: vec![ChatMessage::welcome()],
                phase: ConsolePhase::Idle,
                mode,
                epoch: 0,
                pending: None,
            })),
            phase_tx: Arc::new(phase_tx),
            picker,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn phase(&self) -> ConsolePhase {
        lock(&self.state).phase
    }

    pub fn mode(&self) -> ResponseMode {
        lock(&self.state).mode
    }

    /// Takes effect from the next submitted message.
    pub fn set_mode(&self, mode: ResponseMode) {
        lock(&self.state).mode = mode;
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        let state = lock(&self.state);
        let question_count = state
            .messages
            .iter()
            .filter(|message| message.speaker == Speaker::User)
            .count();
        let response_times: Vec<f64> = state
            .messages
            .iter()
            .filter_map(|message| message.response_time)
            .collect();
        let avg_response_time = (!response_times.is_empty())
            .then(|| response_times.iter().sum::<f64>() / response_times.len() as f64);

        ConsoleSnapshot {
            id: self.id,
            phase: state.phase,
            mode: state.mode,
            question_count,
            avg_response_time,
            messages: state.messages.clone(),
        }
    }

    /// Appends the user's message and schedules the reply.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, content: &str) -> Result<ChatMessage, ConsoleError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ConsoleError::EmptyMessage);
        }

        let mut state = lock(&self.state);
        if state.phase == ConsolePhase::AwaitingResponse {
            return Err(ConsoleError::Busy);
        }

        let message = ChatMessage::user(content.to_string());
        state.messages.push(message.clone());
        state.phase = ConsolePhase::AwaitingResponse;
        self.phase_tx.send_replace(ConsolePhase::AwaitingResponse);

        let epoch = state.epoch;
        let mode = state.mode;
        let delay = self.picker.delay(mode);
        let shared = Arc::clone(&self.state);
        let phase_tx = Arc::clone(&self.phase_tx);
        let picker = Arc::clone(&self.picker);
        let console_id = self.id;

        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let index = picker
                .pick(mode, &CANNED_RESPONSES)
                .min(CANNED_RESPONSES.len() - 1);
            let reply = ChatMessage::reply(&CANNED_RESPONSES[index], picker.response_time(mode));

            let mut state = lock(&shared);
            if state.epoch != epoch {
                debug!(console_id = %console_id, "dropping reply for a reset console");
                return;
            }
            state.messages.push(reply);
            state.phase = ConsolePhase::Idle;
            state.pending = None;
            phase_tx.send_replace(ConsolePhase::Idle);
        }));

        Ok(message)
    }

    /// Cancels any pending reply and restores the welcome message. The mode is kept.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        cancel_pending(&mut state);
        state.messages = vec![ChatMessage::welcome()];
        self.phase_tx.send_replace(ConsolePhase::Idle);
    }

    /// Cancels any pending reply; the console keeps its transcript.
    pub fn shutdown(&self) {
        let mut state = lock(&self.state);
        cancel_pending(&mut state);
        self.phase_tx.send_replace(ConsolePhase::Idle);
    }

    /// Resolves once the console is idle.
    pub async fn wait_until_idle(&self) {
        let mut rx = self.phase_tx.subscribe();
        let _ = rx.wait_for(|phase| *phase == ConsolePhase::Idle).await;
    }
}

impl Drop for ChatConsole {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        cancel_pending(&mut state);
    }
}

fn cancel_pending(state: &mut ConsoleState) {
    state.epoch += 1;
    if let Some(handle) = state.pending.take() {
        handle.abort();
    }
    state.phase = ConsolePhase::Idle;
}

fn lock(state: &Mutex<ConsoleState>) -> MutexGuard<'_, ConsoleState> {
    state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Open consoles keyed by id, each owned by the session that opened it.
#[derive(Clone)]
pub struct ConsoleRegistry {
    consoles: Arc<RwLock<HashMap<Uuid, Arc<ChatConsole>>>>,
    picker: Arc<dyn ResponsePicker>,
}

impl ConsoleRegistry {
    pub fn new(picker: Arc<dyn ResponsePicker>) -> Self {
        Self {
            consoles: Arc::new(RwLock::new(HashMap::new())),
            picker,
        }
    }

    pub async fn open(&self, owner: Uuid, mode: ResponseMode) -> Arc<ChatConsole> {
        let console = Arc::new(ChatConsole::new(owner, mode, Arc::clone(&self.picker)));
        self.consoles
            .write()
            .await
            .insert(console.id(), Arc::clone(&console));
        console
    }

    pub async fn get(&self, console_id: Uuid, owner: Uuid) -> Option<Arc<ChatConsole>> {
        self.consoles
            .read()
            .await
            .get(&console_id)
            .filter(|console| console.owner() == owner)
            .cloned()
    }

    pub async fn close(&self, console_id: Uuid, owner: Uuid) -> bool {
        let mut consoles = self.consoles.write().await;
        let owned = consoles
            .get(&console_id)
            .is_some_and(|console| console.owner() == owner);
        if !owned {
            return false;
        }
        if let Some(console) = consoles.remove(&console_id) {
            console.shutdown();
        }
        true
    }

    /// Tears down every console owned by `owner`, returning how many were closed.
    pub async fn close_owned_by(&self, owner: Uuid) -> usize {
        let mut consoles = self.consoles.write().await;
        let ids: Vec<Uuid> = consoles
            .values()
            .filter(|console| console.owner() == owner)
            .map(|console| console.id())
            .collect();
        for id in &ids {
            if let Some(console) = consoles.remove(id) {
                console.shutdown();
            }
        }
        ids.len()
    }
}
