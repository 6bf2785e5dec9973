//! Backend trait.
//!
//! A backend is an opaque sink for instruction streams: the runtime hands
//! it a program and only learns whether the hand-off succeeded.
//!
//! | Method | Required | Returns |
//! |--------|----------|---------|
//! | `name()` | yes | `&str` |
//! | `execute()` | yes | `HalResult<()>` |
//! | `is_available()` | provided | `bool` |
//! | `submit_json()` | provided | `HalResult<String>` |

use crate::error::HalResult;
use crate::instruction::Instruction;

/// An external execution target for QPU-bound tasks.
///
/// `Send + Sync` so one backend can be shared by every task in a session.
pub trait Backend: Send + Sync {
    /// Name of the backend, used in logs and execution reports.
    fn name(&self) -> &str;

    /// Hand `program` to the backend.
    fn execute(&self, program: &[Instruction]) -> HalResult<()>;

    /// Whether the backend currently accepts work.
    fn is_available(&self) -> bool {
        true
    }

    /// Serialize `program` as the JSON payload most remote services accept,
    /// then execute it.
    fn submit_json(&self, program: &[Instruction]) -> HalResult<String> {
        let payload = serde_json::to_string(program)?;
        self.execute(program)?;
        Ok(payload)
    }
}

impl std::fmt::Debug for dyn Backend + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("name", &self.name())
            .finish()
    }
}
