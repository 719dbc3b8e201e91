use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// The model produced a final answer.
    Success,
    /// The step budget ran out before a final answer.
    Error,
}

/// One executed tool call, as reported back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolTrace {
    /// The requested tool name.
    pub tool: String,
    /// The repaired argument object, or the raw argument text when it could
    /// not be repaired.
    pub arguments: Value,
    /// The observation fed back to the model.
    pub result: String,
}

/// The result of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutcome {
    /// How the run ended.
    pub status: RunStatus,
    /// The session the run belongs to.
    pub session_id: String,
    /// The final answer, or a give-up message.
    pub answer: String,
    /// Every tool call executed during the run, in order.
    pub trace: Vec<ToolTrace>,
}

impl RunOutcome {
    #[inline]
    pub(crate) fn success(
        session_id: &str,
        answer: String,
        trace: Vec<ToolTrace>,
    ) -> Self {
        Self {
            status: RunStatus::Success,
            session_id: session_id.to_owned(),
            answer,
            trace,
        }
    }

    #[inline]
    pub(crate) fn step_limit(
        session_id: &str,
        answer: &str,
        trace: Vec<ToolTrace>,
    ) -> Self {
        Self {
            status: RunStatus::Error,
            session_id: session_id.to_owned(),
            answer: answer.to_owned(),
            trace,
        }
    }

    /// Returns `true` if the run produced a final answer.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
