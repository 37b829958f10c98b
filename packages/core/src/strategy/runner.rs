//! Invoking an ordered adapter list and combining the outcomes.
//!
//! [`AdapterRunner`] turns one operation into a lazy sequence of
//! [`Attempt`]s, one per adapter in list order. The combinators below are
//! pure functions over such sequences; each strategy picks the ones that
//! give it its semantics.

use crate::{Backend, BackendRef, Error};

/// The outcome of calling one adapter.
#[derive(Debug)]
pub struct Attempt<T> {
    pub adapter: String,
    pub outcome: Result<T, Error>,
}

impl<T> Attempt<T> {
    pub fn new(adapter: impl Into<String>, outcome: Result<T, Error>) -> Self {
        Self {
            adapter: adapter.into(),
            outcome,
        }
    }
}

/// An ordered adapter list shared by the call strategies.
pub struct AdapterRunner {
    strategy: &'static str,
    adapters: Vec<BackendRef>,
}

impl AdapterRunner {
    pub fn new(strategy: &'static str) -> Self {
        Self {
            strategy,
            adapters: Vec::new(),
        }
    }

    pub fn adapters(&self) -> &[BackendRef] {
        &self.adapters
    }

    pub fn set_adapters(&mut self, adapters: Vec<BackendRef>) {
        self.adapters = adapters;
    }

    pub fn add_adapter(&mut self, adapter: BackendRef) {
        tracing::info!(
            adapter = adapter.name(),
            strategy = self.strategy,
            "adding adapter"
        );
        self.adapters.push(adapter);
    }

    /// Call `call` on each adapter in order, lazily.
    ///
    /// Adapters are only invoked as the returned iterator is advanced, so a
    /// combinator that stops early leaves the remaining adapters untouched.
    /// Failing adapters are logged here.
    pub fn attempts<'a, T, F>(
        &'a self,
        operation: &'static str,
        path: &'a str,
        mut call: F,
    ) -> impl Iterator<Item = Attempt<T>> + 'a
    where
        F: FnMut(&dyn Backend) -> Result<T, Error> + 'a,
        T: 'a,
    {
        let strategy = self.strategy;
        self.adapters.iter().map(move |adapter| {
            let outcome = call(adapter.as_ref());
            if let Err(e) = &outcome {
                tracing::error!(
                    adapter = adapter.name(),
                    strategy,
                    operation,
                    path,
                    error = %e,
                    "adapter call failed"
                );
            }
            Attempt::new(adapter.name(), outcome)
        })
    }
}

/// Answers that can be positive ("found", "done") or negative.
pub trait Answer {
    fn is_positive(&self) -> bool;
}

impl Answer for bool {
    fn is_positive(&self) -> bool {
        *self
    }
}

impl<T> Answer for Option<T> {
    fn is_positive(&self) -> bool {
        self.is_some()
    }
}

/// OR over all attempts. Failures count as `false`. Every attempt is run.
pub fn any_succeeded(attempts: impl IntoIterator<Item = Attempt<bool>>) -> bool {
    attempts
        .into_iter()
        .fold(false, |done, attempt| matches!(attempt.outcome, Ok(true)) || done)
}

/// The first value found. Stops at it.
pub fn first_found<T>(attempts: impl IntoIterator<Item = Attempt<Option<T>>>) -> Option<T> {
    attempts
        .into_iter()
        .find_map(|attempt| attempt.outcome.ok().flatten())
}

/// The first positive answer, stopping there.
///
/// Without a positive answer: the first negative answer if any adapter
/// answered, otherwise the first error. An empty sequence is
/// [`Error::NoAdaptersAvailable`].
pub fn first_positive_or_answer<T: Answer>(
    attempts: impl IntoIterator<Item = Attempt<T>>,
) -> Result<T, Error> {
    let mut answer = None;
    let mut first_error = None;
    for attempt in attempts {
        match attempt.outcome {
            Ok(value) if value.is_positive() => return Ok(value),
            Ok(value) => {
                answer.get_or_insert(value);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    settle(answer, first_error)
}

/// The first answer of any value, stopping there; otherwise the first error.
/// An empty sequence is [`Error::NoAdaptersAvailable`].
pub fn first_answer<T>(attempts: impl IntoIterator<Item = Attempt<T>>) -> Result<T, Error> {
    let mut first_error = None;
    for attempt in attempts {
        match attempt.outcome {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    settle(None, first_error)
}

fn settle<T>(answer: Option<T>, first_error: Option<Error>) -> Result<T, Error> {
    match (answer, first_error) {
        (Some(value), _) => Ok(value),
        (None, Some(e)) => Err(e),
        (None, None) => Err(Error::NoAdaptersAvailable),
    }
}
