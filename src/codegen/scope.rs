//! Shared cancellable scope for the generation task tree.

use super::GenerateError;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancellation token plus an optional caller deadline. Both are advisory
/// and only observed at stage boundaries through [`Scope::check`].
#[derive(Debug, Clone)]
pub struct Scope {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Scope {
    pub fn new(token: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { token, deadline }
    }

    /// A nested scope: cancelled with this one, cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn check(&self) -> Result<(), GenerateError> {
        if self.token.is_cancelled() {
            return Err(GenerateError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(GenerateError::DeadlineExceeded);
        }
        Ok(())
    }
}

/// First-error-wins aggregation. A cancellation error only holds the slot
/// until a real error shows up.
#[derive(Debug, Default)]
pub(crate) struct FirstError(Option<GenerateError>);

impl FirstError {
    pub(crate) fn record(&mut self, err: GenerateError) {
        match &self.0 {
            None => self.0 = Some(err),
            Some(current) if current.is_cancellation() && !err.is_cancellation() => {
                self.0 = Some(err)
            }
            Some(_) => {
                if !err.is_cancellation() {
                    warn!(error = %err, "Dropping error from sibling task");
                }
            }
        }
    }

    pub(crate) fn into_result(self) -> Result<(), GenerateError> {
        match self.0 {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Drains `set`, cancelling `scope` on the first failure.
pub(crate) async fn join_all(
    set: &mut JoinSet<Result<(), GenerateError>>,
    scope: &Scope,
) -> Result<(), GenerateError> {
    let mut first = FirstError::default();
    while let Some(joined) = set.join_next().await {
        let result = joined
            .map_err(|e| GenerateError::Task(e.to_string()))
            .and_then(|r| r);
        if let Err(err) = result {
            scope.cancel();
            first.record(err);
        }
    }
    first.into_result()
}
