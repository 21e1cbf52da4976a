//! Scan lifecycle states and what the presentation layer sees of them

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Fix, Place};
use crate::sensors::LocationError;

/// Shown in IDLE after a query that found nothing
pub const SECTOR_CLEAR: &str = "Sector clear. No kebab signatures detected.";

/// Lifecycle state of the compass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanState {
    /// Fix acquired, ready to scan
    Idle,
    /// Waiting on the location collaborator
    Locating,
    /// Waiting on the place query
    Searching,
    /// Holding exactly one place
    Results,
    /// Showing a fault message
    Error,
}

impl ScanState {
    /// A collaborator call is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Locating | Self::Searching)
    }
}

/// Why the controller is in ERROR
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScanFault {
    #[error("Geolocation hardware not found.")]
    CapabilityMissing,
    #[error("{}", .0.user_message())]
    Sensor(LocationError),
    #[error("No GPS Fix. Cannot Scan.")]
    NoFix,
    #[error("Comms Link Failed (API Error).")]
    QueryFailed,
}

/// A scan request that was refused without touching state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScanRejected {
    #[error("scan already in progress ({0:?})")]
    Busy(ScanState),
    #[error("a result is being shown; reset before scanning again")]
    ResultHeld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: &str) -> Self {
        Self {
            kind: MessageKind::Info,
            text: text.to_string(),
        }
    }

    pub fn fault(fault: &ScanFault) -> Self {
        Self {
            kind: MessageKind::Error,
            text: fault.to_string(),
        }
    }

    /// Tactical display form
    pub fn shouted(&self) -> Self {
        Self {
            kind: self.kind,
            text: self.text.to_uppercase(),
        }
    }
}

/// The one action the primary button performs in the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerAction {
    Scan,
    Reset,
    Disabled,
}

impl TriggerAction {
    pub fn for_state(state: ScanState, has_fix: bool) -> Self {
        match state {
            ScanState::Results => Self::Reset,
            s if s.is_busy() => Self::Disabled,
            ScanState::Error => Self::Scan,
            _ if has_fix => Self::Scan,
            _ => Self::Disabled,
        }
    }
}

/// Everything a view needs to render one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSnapshot {
    pub state: ScanState,
    pub message: Option<StatusMessage>,
    pub target: Option<Place>,
    pub heading: f64,
    pub fix: Option<Fix>,
    pub trigger: TriggerAction,
    pub scan_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_action_table() {
        use ScanState::*;

        assert_eq!(TriggerAction::for_state(Results, true), TriggerAction::Reset);
        assert_eq!(TriggerAction::for_state(Locating, false), TriggerAction::Disabled);
        assert_eq!(TriggerAction::for_state(Searching, true), TriggerAction::Disabled);
        assert_eq!(TriggerAction::for_state(Idle, true), TriggerAction::Scan);
        assert_eq!(TriggerAction::for_state(Idle, false), TriggerAction::Disabled);
        assert_eq!(TriggerAction::for_state(Error, false), TriggerAction::Scan);
        assert_eq!(TriggerAction::for_state(Error, true), TriggerAction::Scan);
    }

    #[test]
    fn test_fault_messages() {
        assert_eq!(
            ScanFault::CapabilityMissing.to_string(),
            "Geolocation hardware not found."
        );
        assert_eq!(
            ScanFault::Sensor(LocationError::Timeout).to_string(),
            "Connection Timed Out. Retry Scan."
        );
        assert_eq!(ScanFault::NoFix.to_string(), "No GPS Fix. Cannot Scan.");
        assert_eq!(
            ScanFault::QueryFailed.to_string(),
            "Comms Link Failed (API Error)."
        );
    }

    #[test]
    fn test_messages_are_shouted() {
        let message = StatusMessage::fault(&ScanFault::NoFix).shouted();
        assert_eq!(message.kind, MessageKind::Error);
        assert_eq!(message.text, "NO GPS FIX. CANNOT SCAN.");
    }

    #[test]
    fn test_state_serializes_screaming() {
        assert_eq!(
            serde_json::to_string(&ScanState::Searching).unwrap(),
            "\"SEARCHING\""
        );
    }
}
