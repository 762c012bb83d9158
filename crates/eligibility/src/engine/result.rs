use serde::{Deserialize, Serialize};

/// Three-valued outcome of one rule on one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Passed {
    Pass,
    /// Not failing, but needs a human to confirm.
    SoftPass,
    Fail,
}

/// Verdict produced by evaluating one rule against one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultInfo {
    passed: Passed,
    is_final: bool,
    message: String,
}

impl ResultInfo {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: Passed::Pass,
            is_final: false,
            message: message.into(),
        }
    }

    pub fn soft_pass(message: impl Into<String>) -> Self {
        Self {
            passed: Passed::SoftPass,
            is_final: false,
            message: message.into(),
        }
    }

    /// A final fail ends the whole evaluation.
    pub fn fail(message: impl Into<String>, is_final: bool) -> Self {
        Self {
            passed: Passed::Fail,
            is_final,
            message: message.into(),
        }
    }

    pub fn passed(&self) -> Passed {
        self.passed
    }

    pub fn is_pass(&self) -> bool {
        self.passed == Passed::Pass
    }

    pub fn is_soft_pass(&self) -> bool {
        self.passed == Passed::SoftPass
    }

    pub fn is_fail(&self) -> bool {
        self.passed == Passed::Fail
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
