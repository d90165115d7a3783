use std::future::Future;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{operation} did not finish within {millis}ms")]
pub struct TimedOut {
    pub operation: &'static str,
    pub millis: u128,
}

/// Await `future` for at most `timeout`.
///
/// The inner error goes through `map_error`; an elapsed deadline becomes
/// [`TimedOut`] converted into the caller's error type. The future is dropped
/// on timeout, so callers that must not cancel the work should hand in a
/// spawned task or a child process that is not killed on drop.
///
/// # Errors
/// Returns the mapped inner error, or the converted [`TimedOut`].
pub async fn run_with_timeout<T, E, R, F, M>(
    timeout: Duration,
    operation: &'static str,
    future: F,
    map_error: M,
) -> Result<T, R>
where
    F: Future<Output = Result<T, E>>,
    M: FnOnce(E) -> R,
    R: From<TimedOut>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(map_error(error)),
        Err(_) => Err(R::from(TimedOut {
            operation,
            millis: timeout.as_millis(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{TimedOut, run_with_timeout};

    #[derive(Debug, PartialEq, Eq)]
    enum TestError {
        Inner(&'static str),
        Timeout(TimedOut),
    }

    impl From<TimedOut> for TestError {
        fn from(value: TimedOut) -> Self {
            Self::Timeout(value)
        }
    }

    #[tokio::test]
    async fn value_within_deadline_passes_through() {
        let version = run_with_timeout(
            Duration::from_secs(2),
            "module lookup",
            async { Ok::<_, &'static str>("2.3.5") },
            TestError::Inner,
        )
        .await;

        assert_eq!(version, Ok("2.3.5"));
    }

    #[tokio::test]
    async fn maps_operation_error() {
        let result = run_with_timeout(
            Duration::from_secs(1),
            "prompt init",
            async { Err::<(), _>("boom") },
            TestError::Inner,
        )
        .await;

        assert_eq!(result, Err(TestError::Inner("boom")));
    }

    #[tokio::test]
    async fn elapsed_deadline_becomes_timed_out() {
        let result = run_with_timeout(
            Duration::from_millis(5),
            "module install",
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, &'static str>(())
            },
            TestError::Inner,
        )
        .await;

        assert_eq!(
            result,
            Err(TestError::Timeout(TimedOut {
                operation: "module install",
                millis: 5,
            }))
        );
    }

    #[test]
    fn timed_out_display_names_operation() {
        let error = TimedOut {
            operation: "prompt init",
            millis: 5000,
        };

        assert_eq!(error.to_string(), "prompt init did not finish within 5000ms");
    }
}
