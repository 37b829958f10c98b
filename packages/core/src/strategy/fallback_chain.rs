//! Try adapters one at a time until one succeeds.

use std::io::Read;

use bytes::Bytes;

use super::runner::{first_answer, first_positive_or_answer, AdapterRunner, Answer};
use super::{buffer_stream, replay, CallStrategy};
use crate::{Backend, BackendRef, Error, ReadStream};

pub(super) const NAME: &str = "FallBackChainStrategy";

/// Calls adapters in order and returns the first positive result.
///
/// Failing adapters are logged and skipped. When no adapter succeeds, the
/// result is the negative answer of an adapter that did answer, or the first
/// error when every adapter failed. `exists` is decided by the first adapter
/// that answers at all.
pub struct FallbackChainStrategy {
    runner: AdapterRunner,
}

impl FallbackChainStrategy {
    pub fn new() -> Self {
        Self {
            runner: AdapterRunner::new(NAME),
        }
    }

    pub fn with_adapters(adapters: Vec<BackendRef>) -> Self {
        let mut strategy = Self::new();
        strategy.runner.set_adapters(adapters);
        strategy
    }
}

impl Default for FallbackChainStrategy {
    fn default() -> Self {
        Self::new()
    }
}

fn log_on_negative<T: Answer>(result: Result<T, Error>, log: impl FnOnce()) -> Result<T, Error> {
    if let Ok(answer) = &result {
        if !answer.is_positive() {
            log();
        }
    }
    result
}

impl CallStrategy for FallbackChainStrategy {
    fn strategy_name(&self) -> &'static str {
        NAME
    }

    fn adapters(&self) -> &[BackendRef] {
        self.runner.adapters()
    }

    fn set_adapters(&mut self, adapters: Vec<BackendRef>) {
        self.runner.set_adapters(adapters);
    }

    fn add_adapter(&mut self, adapter: BackendRef) {
        self.runner.add_adapter(adapter);
    }
}

impl Backend for FallbackChainStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        first_answer(self.runner.attempts("exists", path, |adapter| adapter.exists(path)))
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        log_on_negative(
            first_positive_or_answer(self.runner.attempts("get", path, |adapter| adapter.get(path))),
            || tracing::error!(strategy = NAME, file = path, "impossible get file"),
        )
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        log_on_negative(
            first_positive_or_answer(
                self.runner
                    .attempts("get_stream", path, |adapter| adapter.get_stream(path)),
            ),
            || tracing::error!(strategy = NAME, file = path, "impossible get stream from file"),
        )
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        log_on_negative(
            first_positive_or_answer(
                self.runner
                    .attempts("put", path, |adapter| adapter.put(path, contents)),
            ),
            || tracing::error!(strategy = NAME, file = path, "impossible put file"),
        )
    }

    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error> {
        let buffer = buffer_stream(stream)?;
        log_on_negative(
            first_positive_or_answer(self.runner.attempts("put_stream", path, |adapter| {
                adapter.put_stream(path, &mut replay(&buffer))
            })),
            || tracing::error!(strategy = NAME, file = path, "impossible put file stream"),
        )
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        log_on_negative(
            first_positive_or_answer(self.runner.attempts("rename", path, |adapter| {
                adapter.rename(path, new_path, overwrite)
            })),
            || tracing::error!(strategy = NAME, from = path, to = new_path, "impossible rename file"),
        )
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        log_on_negative(
            first_positive_or_answer(
                self.runner
                    .attempts("copy", path, |adapter| adapter.copy(path, new_path)),
            ),
            || tracing::error!(strategy = NAME, from = path, to = new_path, "impossible copy file"),
        )
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        log_on_negative(
            first_positive_or_answer(
                self.runner
                    .attempts("delete", path, |adapter| adapter.delete(path)),
            ),
            || tracing::error!(strategy = NAME, file = path, "impossible delete file"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Op, ScriptedBackend};
    use std::io::Cursor;
    use std::sync::Arc;

    fn chain(adapters: &[&Arc<ScriptedBackend>]) -> FallbackChainStrategy {
        FallbackChainStrategy::with_adapters(
            adapters
                .iter()
                .map(|a| Arc::clone(a) as BackendRef)
                .collect(),
        )
    }

    #[test]
    fn exists_short_circuits_on_first_true() {
        let a1 = Arc::new(ScriptedBackend::new("a1").with_exists(true));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_exists(true));
        let a3 = Arc::new(ScriptedBackend::new("a3").with_exists(true));
        let s = chain(&[&a1, &a2, &a3]);

        assert!(s.exists("/file").unwrap());
        assert_eq!(a1.calls(), vec!["exists /file".to_string()]);
        assert!(a2.untouched());
        assert!(a3.untouched());
    }

    #[test]
    fn exists_skips_failing_adapters() {
        let a1 = Arc::new(ScriptedBackend::new("a1").failing(Op::Exists, "E1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_exists(true));
        let s = chain(&[&a1, &a2]);

        assert!(s.exists("/file").unwrap());
    }

    #[test]
    fn exists_is_decided_by_first_answer() {
        let a1 = Arc::new(ScriptedBackend::new("a1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_exists(true));
        let s = chain(&[&a1, &a2]);

        assert!(!s.exists("/file").unwrap());
        assert!(a2.untouched());
    }

    #[test]
    fn returns_first_error_when_every_adapter_fails() {
        let a1 = Arc::new(ScriptedBackend::new("a1").failing(Op::Get, "E1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").failing(Op::Get, "E2"));
        let a3 = Arc::new(ScriptedBackend::new("a3").failing(Op::Get, "E3"));
        let s = chain(&[&a1, &a2, &a3]);

        let err = s.get("/file").unwrap_err();
        assert!(err.to_string().contains("E1"));
        for a in [&a1, &a2, &a3] {
            assert_eq!(a.calls().len(), 1);
        }
    }

    #[test]
    fn returns_false_when_some_adapter_answered() {
        let a1 = Arc::new(ScriptedBackend::new("a1").failing(Op::Delete, "E1"));
        let a2 = Arc::new(ScriptedBackend::new("a2"));
        let a3 = Arc::new(ScriptedBackend::new("a3").failing(Op::Delete, "E3"));
        let s = chain(&[&a1, &a2, &a3]);

        assert!(!s.delete("/file").unwrap());
    }

    #[test]
    fn get_answers_none_when_one_adapter_misses_and_the_rest_fail() {
        let a1 = Arc::new(ScriptedBackend::new("a1").failing(Op::Get, "E1"));
        let a2 = Arc::new(ScriptedBackend::new("a2"));
        let a3 = Arc::new(ScriptedBackend::new("a3").failing(Op::Get, "E3"));
        let s = chain(&[&a1, &a2, &a3]);

        assert!(s.get("/file").unwrap().is_none());
        for a in [&a1, &a2, &a3] {
            assert_eq!(a.calls(), vec!["get /file".to_string()]);
        }
    }

    #[test]
    fn get_returns_first_file() {
        let a1 = Arc::new(ScriptedBackend::new("a1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_get(b"second"));
        let a3 = Arc::new(ScriptedBackend::new("a3").with_get(b"third"));
        let s = chain(&[&a1, &a2, &a3]);

        assert_eq!(s.get("/file").unwrap().unwrap(), Bytes::from_static(b"second"));
        assert!(a3.untouched());

        let s = chain(&[&a1]);
        assert!(s.get("/file").unwrap().is_none());
    }

    #[test]
    fn put_stops_at_first_success() {
        let a1 = Arc::new(ScriptedBackend::new("a1").failing(Op::Put, "readonly"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_put(true));
        let a3 = Arc::new(ScriptedBackend::new("a3").with_put(true));
        let s = chain(&[&a1, &a2, &a3]);

        assert!(s.put("/file", b"data").unwrap());
        assert_eq!(a2.written().len(), 1);
        assert!(a3.untouched());
    }

    #[test]
    fn put_stream_replays_to_fallback() {
        let a1 = Arc::new(ScriptedBackend::new("a1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_put_stream(true));
        let s = chain(&[&a1, &a2]);

        let mut source = Cursor::new(b"payload".to_vec());
        assert!(s.put_stream("/file", &mut source).unwrap());
        assert_eq!(a1.written()[0].1, Bytes::from_static(b"payload"));
        assert_eq!(a2.written()[0].1, Bytes::from_static(b"payload"));
    }

    #[test]
    fn rename_and_copy_forward_arguments() {
        let a1 = Arc::new(ScriptedBackend::new("a1").with_rename(true).with_copy(true));
        let s = chain(&[&a1]);

        assert!(s.rename("/a", "/b", true).unwrap());
        assert!(s.copy("/a", "/c").unwrap());
        assert_eq!(
            a1.calls(),
            vec!["rename /a /b true".to_string(), "copy /a /c".to_string()]
        );
    }

    #[test]
    fn no_adapters_is_an_error() {
        let s = FallbackChainStrategy::new();
        assert!(matches!(s.exists("/file"), Err(Error::NoAdaptersAvailable)));
        assert!(matches!(s.get("/file"), Err(Error::NoAdaptersAvailable)));
        assert!(matches!(s.delete("/file"), Err(Error::NoAdaptersAvailable)));
    }

    #[test]
    fn reports_its_name() {
        let s = FallbackChainStrategy::new();
        assert_eq!(s.name(), "FallBackChainStrategy");
        assert_eq!(s.strategy_name(), "FallBackChainStrategy");
    }
}
