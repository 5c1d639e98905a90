use thiserror::Error;

/// The one failure a caller of the answer pipeline can observe.
///
/// Its `Display` is the apology text handed back to the user.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("Sorry, I encountered an error: {0}")]
    PipelineFailed(String),
}

impl From<anyhow::Error> for AnswerError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` keeps the context chain on one line.
        AnswerError::PipelineFailed(format!("{err:#}"))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),

    #[error("Missing required argument '{0}'")]
    MissingArgument(&'static str),

    #[error("Argument '{name}' must be a {expected}")]
    InvalidArgument { name: &'static str, expected: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn pipeline_failure_renders_as_apology() {
        let err = AnswerError::PipelineFailed("connection refused".into());
        assert_eq!(err.to_string(), "Sorry, I encountered an error: connection refused");
    }

    #[test]
    fn anyhow_context_chain_is_kept() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("timed out"));
        let err: AnswerError = inner.context("Failed to reach Gemini").unwrap_err().into();

        assert_eq!(
            err.to_string(),
            "Sorry, I encountered an error: Failed to reach Gemini: timed out"
        );
    }

    #[test]
    fn tool_error_messages() {
        assert_eq!(
            ToolError::MissingArgument("location").to_string(),
            "Missing required argument 'location'"
        );
        assert_eq!(
            ToolError::UnknownFunction("get_time".into()).to_string(),
            "Unknown function 'get_time'"
        );
    }
}
