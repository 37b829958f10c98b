//! Call every adapter; succeed if any adapter succeeded.

use std::io::Read;

use bytes::Bytes;

use super::runner::{any_succeeded, first_found, AdapterRunner};
use super::{buffer_stream, replay, CallStrategy};
use crate::{Backend, BackendRef, Error, ReadStream};

pub(super) const NAME: &str = "CallAllStrategy";

/// Fans writes out to every adapter and reads from the first one that has
/// the file.
///
/// - `exists` and every mutating operation call all adapters and OR the
///   results. A failing adapter counts as `false`.
/// - `get` and `get_stream` stop at the first adapter that returns the
///   file and fail with [`Error::FileNotFound`] if none does.
pub struct CallAllStrategy {
    runner: AdapterRunner,
}

impl CallAllStrategy {
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

    fn report(&self, done: bool, operation: &'static str, path: &str) -> bool {
        if !done {
            tracing::error!(strategy = NAME, operation, path, "no adapter completed the call");
        }
        done
    }
}

impl Default for CallAllStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl CallStrategy for CallAllStrategy {
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

impl Backend for CallAllStrategy {
    fn name(&self) -> &str {
        NAME
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        Ok(any_succeeded(
            self.runner.attempts("exists", path, |adapter| adapter.exists(path)),
        ))
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        first_found(self.runner.attempts("get", path, |adapter| adapter.get(path)))
            .map(Some)
            .ok_or_else(|| Error::file_not_found(path))
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        first_found(
            self.runner
                .attempts("get_stream", path, |adapter| adapter.get_stream(path)),
        )
        .map(Some)
        .ok_or_else(|| Error::file_not_found(path))
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        let done = any_succeeded(
            self.runner
                .attempts("put", path, |adapter| adapter.put(path, contents)),
        );
        Ok(self.report(done, "put", path))
    }

    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error> {
        let buffer = buffer_stream(stream)?;
        let done = any_succeeded(self.runner.attempts("put_stream", path, |adapter| {
            adapter.put_stream(path, &mut replay(&buffer))
        }));
        Ok(self.report(done, "put_stream", path))
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        let done = any_succeeded(self.runner.attempts("rename", path, |adapter| {
            adapter.rename(path, new_path, overwrite)
        }));
        if !done {
            tracing::error!(strategy = NAME, from = path, to = new_path, "impossible to rename file");
        }
        Ok(done)
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        let done = any_succeeded(
            self.runner
                .attempts("copy", path, |adapter| adapter.copy(path, new_path)),
        );
        if !done {
            tracing::error!(strategy = NAME, from = path, to = new_path, "impossible to copy file");
        }
        Ok(done)
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        let done = any_succeeded(
            self.runner
                .attempts("delete", path, |adapter| adapter.delete(path)),
        );
        Ok(self.report(done, "delete", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Op, ScriptedBackend};
    use std::io::Cursor;
    use std::sync::Arc;

    fn strategy(adapters: &[&Arc<ScriptedBackend>]) -> CallAllStrategy {
        CallAllStrategy::with_adapters(
            adapters
                .iter()
                .map(|a| Arc::clone(a) as BackendRef)
                .collect(),
        )
    }

    #[test]
    fn exists_is_true_if_any_adapter_has_the_file() {
        let a1 = Arc::new(ScriptedBackend::new("a1"));
        let a2 = Arc::new(ScriptedBackend::new("a2"));
        let a3 = Arc::new(ScriptedBackend::new("a3").with_exists(true));
        let s = strategy(&[&a1, &a2, &a3]);

        assert!(s.exists("/file").unwrap());
        for a in [&a1, &a2, &a3] {
            assert_eq!(a.calls(), vec!["exists /file".to_string()]);
        }
    }

    #[test]
    fn exists_is_false_if_no_adapter_has_the_file() {
        let a1 = Arc::new(ScriptedBackend::new("a1"));
        let a2 = Arc::new(ScriptedBackend::new("a2"));
        let a3 = Arc::new(ScriptedBackend::new("a3"));
        let s = strategy(&[&a1, &a2, &a3]);

        assert!(!s.exists("/file").unwrap());
        assert_eq!(a3.calls().len(), 1);
    }

    #[test]
    fn exists_treats_failures_as_false() {
        let a1 = Arc::new(ScriptedBackend::new("a1").failing(Op::Exists, "E1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_exists(true));
        let s = strategy(&[&a1, &a2]);

        assert!(s.exists("/file").unwrap());
    }

    #[test]
    fn get_returns_first_success_without_calling_later_adapters() {
        let a1 = Arc::new(ScriptedBackend::new("a1").failing(Op::Get, "E1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_get(b"from a2"));
        let a3 = Arc::new(ScriptedBackend::new("a3").with_get(b"from a3"));
        let s = strategy(&[&a1, &a2, &a3]);

        assert_eq!(s.get("/file").unwrap().unwrap(), Bytes::from_static(b"from a2"));
        assert_eq!(a1.calls().len(), 1);
        assert_eq!(a2.calls().len(), 1);
        assert!(a3.untouched());
    }

    #[test]
    fn get_from_first_adapter_leaves_the_rest_alone() {
        let a1 = Arc::new(ScriptedBackend::new("a1").with_get(b"content"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_get(b"other"));
        let a3 = Arc::new(ScriptedBackend::new("a3").with_get(b"other"));
        let s = strategy(&[&a1, &a2, &a3]);

        assert_eq!(s.get("/file").unwrap().unwrap(), Bytes::from_static(b"content"));
        assert_eq!(a1.calls(), vec!["get /file".to_string()]);
        assert!(a2.untouched());
        assert!(a3.untouched());
    }

    #[test]
    fn get_without_result_is_not_found() {
        let a1 = Arc::new(ScriptedBackend::new("a1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").failing(Op::Get, "E2"));
        let s = strategy(&[&a1, &a2]);

        assert!(matches!(s.get("/file"), Err(Error::FileNotFound { .. })));
        assert!(matches!(
            strategy(&[]).get_stream("/file"),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn get_stream_returns_first_stream() {
        let a1 = Arc::new(ScriptedBackend::new("a1"));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_get_stream(b"streamed"));
        let s = strategy(&[&a1, &a2]);

        let mut contents = String::new();
        s.get_stream("/file")
            .unwrap()
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "streamed");
    }

    #[test]
    fn mutations_call_every_adapter() {
        let a1 = Arc::new(ScriptedBackend::new("a1").with_delete(true));
        let a2 = Arc::new(ScriptedBackend::new("a2").failing(Op::Delete, "E2"));
        let a3 = Arc::new(ScriptedBackend::new("a3"));
        let s = strategy(&[&a1, &a2, &a3]);

        assert!(s.delete("/file").unwrap());
        for a in [&a1, &a2, &a3] {
            assert_eq!(a.calls(), vec!["delete /file".to_string()]);
        }
    }

    #[test]
    fn mutations_fail_softly_when_nobody_succeeds() {
        let a1 = Arc::new(ScriptedBackend::new("a1").failing(Op::Rename, "E1"));
        let a2 = Arc::new(ScriptedBackend::new("a2"));
        let s = strategy(&[&a1, &a2]);

        assert!(!s.rename("/a", "/b", false).unwrap());
        assert!(!s.copy("/a", "/b").unwrap());
        assert!(!s.put("/a", b"x").unwrap());
        assert_eq!(a2.calls()[0], "rename /a /b false");
    }

    #[test]
    fn put_stream_replays_contents_to_each_adapter() {
        let a1 = Arc::new(ScriptedBackend::new("a1").with_put_stream(true));
        let a2 = Arc::new(ScriptedBackend::new("a2").with_put_stream(true));
        let s = strategy(&[&a1, &a2]);

        let mut source = Cursor::new(b"shared".to_vec());
        assert!(s.put_stream("/file", &mut source).unwrap());
        for a in [&a1, &a2] {
            assert_eq!(
                a.written(),
                vec![("/file".to_string(), Bytes::from_static(b"shared"))]
            );
        }
    }

    #[test]
    fn add_adapter_appends() {
        let mut s = CallAllStrategy::new();
        assert!(s.adapters().is_empty());
        s.add_adapter(Arc::new(ScriptedBackend::new("first")));
        s.add_adapter(Arc::new(ScriptedBackend::new("second")));

        let names: Vec<&str> = s.adapters().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(s.name(), "CallAllStrategy");
    }
}
