use thiserror::Error;

/// Failures surfaced by the tutor's orchestration layer.
///
/// Infrastructure failures (database, config files) stay `anyhow` and are
/// swallowed at the persistence boundary; everything a user can see ends up
/// here.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TutorError {
    #[error("{0}")]
    Precondition(String),

    #[error("failed to fetch example image: {0}")]
    Fetch(String),

    #[error("malformed model response: {0}")]
    Decode(String),

    #[error("{0}")]
    Generation(String),

    #[error("speech synthesis is not supported on this host")]
    UnsupportedCapability,

    #[error("speech playback failed: {0}")]
    Playback(String),

    #[error("image enhancement failed: {0}")]
    Enhancement(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: &'static str, seconds: u64 },

    #[error("backend request failed: {0}")]
    Backend(String),
}

pub type TutorResult<T> = Result<T, TutorError>;

impl From<reqwest::Error> for TutorError {
    fn from(err: reqwest::Error) -> Self {
        // Deadlines belong to `with_timeout`; a transport-level timeout has no
        // configured duration to report.
        if err.is_timeout() {
            TutorError::Backend(format!("request timed out: {err}"))
        } else if err.is_decode() {
            TutorError::Decode(err.to_string())
        } else {
            TutorError::Backend(err.to_string())
        }
    }
}

/// Run `fut` with a deadline, mapping expiry to [`TutorError::Timeout`].
pub async fn with_timeout<T, F>(
    operation: &'static str,
    limit: std::time::Duration,
    fut: F,
) -> TutorResult<T>
where
    F: std::future::Future<Output = TutorResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TutorError::Timeout {
            operation,
            seconds: limit.as_secs(),
        }),
    }
}
