//! Recording stand-ins for the user-facing collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::info;

use lifesync_contracts::{
    error::{LifeSyncError, LifeSyncResult},
    notification::NotificationRecord,
};
use lifesync_core::traits::{
    MessageGateway, ResendDecision, ResendPrompt, ResendRequest, TelephonyLauncher,
};

/// Remembers every number dialled.
#[derive(Debug, Default)]
pub struct RecordingTelephony {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingTelephony {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl TelephonyLauncher for RecordingTelephony {
    fn place_call(&self, number: &str) {
        info!(%number, "simulated call placed");
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(number.to_string());
        }
    }
}

/// Logs and keeps every delivered message. Numbers listed in `unreachable`
/// are refused.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    delivered: Arc<Mutex<Vec<NotificationRecord>>>,
    unreachable: Vec<String>,
}

impl RecordingGateway {
    pub fn with_unreachable(unreachable: Vec<String>) -> Self {
        Self {
            delivered: Arc::default(),
            unreachable,
        }
    }

    pub fn delivered(&self) -> Vec<NotificationRecord> {
        self.delivered.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl MessageGateway for RecordingGateway {
    fn deliver(&self, record: &NotificationRecord) -> LifeSyncResult<()> {
        if self.unreachable.contains(&record.recipient_phone) {
            return Err(LifeSyncError::DeliveryFailed {
                recipient: record.recipient_name.clone(),
                reason: format!("{} unreachable", record.recipient_phone),
            });
        }
        info!(
            to = %record.recipient_name,
            phone = %record.recipient_phone,
            "simulated message sent"
        );
        self.delivered
            .lock()
            .map_err(|e| LifeSyncError::DeliveryFailed {
                recipient: record.recipient_name.clone(),
                reason: e.to_string(),
            })?
            .push(record.clone());
        Ok(())
    }
}

/// Answers resend prompts from a queue, declining once it runs dry.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<ResendDecision>>,
    asked: Mutex<Vec<ResendRequest>>,
}

impl ScriptedPrompt {
    pub fn new(answers: impl IntoIterator<Item = ResendDecision>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::default(),
        }
    }

    pub fn asked(&self) -> Vec<ResendRequest> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

impl ResendPrompt for ScriptedPrompt {
    fn confirm_resend(&self, request: &ResendRequest) -> ResendDecision {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(request.clone());
        }
        let decision = self
            .answers
            .lock()
            .ok()
            .and_then(|mut a| a.pop_front())
            .unwrap_or(ResendDecision::Decline);
        info!(
            session_id = %request.session_id,
            facility = %request.facility_name,
            ?decision,
            "resend prompt answered"
        );
        decision
    }
}
