use std::fmt;
use std::time::Duration;

pub const MAX_DIAGNOSTIC_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    ToolFailure { exit_code: Option<i32>, diagnostic: String },
    TimedOut { after: Duration },
    NoOutputProduced,
    Internal(String),
}

impl JobFailure {
    pub fn tool_failure(exit_code: Option<i32>, stderr: &str) -> Self {
        JobFailure::ToolFailure {
            exit_code,
            diagnostic: tail_chars(stderr.trim(), MAX_DIAGNOSTIC_CHARS),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            JobFailure::ToolFailure { .. } => "tool_failure",
            JobFailure::TimedOut { .. } => "timed_out",
            JobFailure::NoOutputProduced => "no_output_produced",
            JobFailure::Internal(_) => "internal",
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailure::ToolFailure {
                exit_code: Some(code),
                diagnostic,
            } => write!(f, "conversion tool exited with code {}: {}", code, diagnostic),
            JobFailure::ToolFailure {
                exit_code: None,
                diagnostic,
            } => write!(f, "conversion tool was terminated: {}", diagnostic),
            JobFailure::TimedOut { after } => {
                write!(f, "conversion timed out after {}s", after.as_secs())
            }
            JobFailure::NoOutputProduced => write!(f, "conversion failed - no output file"),
            JobFailure::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

/// Keeps at most `max` trailing characters of `text`, cutting on a char boundary.
pub fn tail_chars(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    text.chars().skip(count - max).collect()
}
