//! Test support: a scripted backend that records every call.
//!
//! Available to this crate's tests and, through the `test-utils` feature, to
//! downstream crates.

use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;

use crate::{Backend, Error, ReadStream};

/// Operations a [`ScriptedBackend`] can be scripted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Exists,
    Get,
    GetStream,
    Put,
    PutStream,
    Rename,
    Copy,
    Delete,
}

#[derive(Debug, Clone)]
enum Scripted<T> {
    Value(T),
    Fail(String),
}

#[derive(Debug)]
struct Script<T> {
    queue: VecDeque<Scripted<T>>,
    default: Scripted<T>,
}

impl<T: Clone> Script<T> {
    fn new(default: T) -> Self {
        Self {
            queue: VecDeque::new(),
            default: Scripted::Value(default),
        }
    }

    fn next(&mut self) -> Scripted<T> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.default.clone())
    }
}

#[derive(Debug)]
struct Scripts {
    exists: Script<bool>,
    get: Script<Option<Bytes>>,
    get_stream: Script<Option<Bytes>>,
    put: Script<bool>,
    put_stream: Script<bool>,
    rename: Script<bool>,
    copy: Script<bool>,
    delete: Script<bool>,
}

impl Scripts {
    fn fail(&mut self, op: Op, message: String) {
        match op {
            Op::Exists => self.exists.default = Scripted::Fail(message),
            Op::Get => self.get.default = Scripted::Fail(message),
            Op::GetStream => self.get_stream.default = Scripted::Fail(message),
            Op::Put => self.put.default = Scripted::Fail(message),
            Op::PutStream => self.put_stream.default = Scripted::Fail(message),
            Op::Rename => self.rename.default = Scripted::Fail(message),
            Op::Copy => self.copy.default = Scripted::Fail(message),
            Op::Delete => self.delete.default = Scripted::Fail(message),
        }
    }
}

/// A journal shared between several scripted backends, used to assert the
/// relative order of calls across backends.
#[derive(Debug, Clone, Default)]
pub struct CallJournal(Arc<Mutex<Vec<String>>>);

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    fn record(&self, entry: String) {
        lock(&self.0).push(entry);
    }
}

/// A backend whose answers are scripted per operation.
///
/// Every call is recorded as `"<op> <args>"`. Unscripted operations answer
/// `false` / `None`.
#[derive(Debug)]
pub struct ScriptedBackend {
    name: String,
    scripts: Mutex<Scripts>,
    calls: Mutex<Vec<String>>,
    written: Mutex<Vec<(String, Bytes)>>,
    journal: Option<CallJournal>,
}

impl ScriptedBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            scripts: Mutex::new(Scripts {
                exists: Script::new(false),
                get: Script::new(None),
                get_stream: Script::new(None),
                put: Script::new(false),
                put_stream: Script::new(false),
                rename: Script::new(false),
                copy: Script::new(false),
                delete: Script::new(false),
            }),
            calls: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
            journal: None,
        }
    }

    /// Also record calls into a shared journal, prefixed with this backend's name.
    pub fn with_journal(mut self, journal: CallJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_exists(self, value: bool) -> Self {
        lock(&self.scripts).exists.default = Scripted::Value(value);
        self
    }

    /// Answer `exists` with these values in order, then fall back to the default.
    pub fn with_exists_sequence(self, values: impl IntoIterator<Item = bool>) -> Self {
        lock(&self.scripts)
            .exists
            .queue
            .extend(values.into_iter().map(Scripted::Value));
        self
    }

    pub fn with_get(self, contents: &[u8]) -> Self {
        lock(&self.scripts).get.default =
            Scripted::Value(Some(Bytes::copy_from_slice(contents)));
        self
    }

    pub fn with_get_stream(self, contents: &[u8]) -> Self {
        lock(&self.scripts).get_stream.default =
            Scripted::Value(Some(Bytes::copy_from_slice(contents)));
        self
    }

    pub fn with_put(self, value: bool) -> Self {
        lock(&self.scripts).put.default = Scripted::Value(value);
        self
    }

    pub fn with_put_stream(self, value: bool) -> Self {
        lock(&self.scripts).put_stream.default = Scripted::Value(value);
        self
    }

    pub fn with_rename(self, value: bool) -> Self {
        lock(&self.scripts).rename.default = Scripted::Value(value);
        self
    }

    pub fn with_copy(self, value: bool) -> Self {
        lock(&self.scripts).copy.default = Scripted::Value(value);
        self
    }

    pub fn with_delete(self, value: bool) -> Self {
        lock(&self.scripts).delete.default = Scripted::Value(value);
        self
    }

    /// Make every call of `op` fail with an I/O error carrying `message`.
    pub fn failing(self, op: Op, message: &str) -> Self {
        lock(&self.scripts).fail(op, message.to_string());
        self
    }

    /// Recorded calls, oldest first.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// True if no operation was invoked at all.
    pub fn untouched(&self) -> bool {
        lock(&self.calls).is_empty()
    }

    /// Contents received through `put` and `put_stream`.
    pub fn written(&self) -> Vec<(String, Bytes)> {
        lock(&self.written).clone()
    }

    fn record(&self, entry: String) {
        if let Some(journal) = &self.journal {
            journal.record(format!("{}: {}", self.name, entry));
        }
        lock(&self.calls).push(entry);
    }

    fn answer<T>(scripted: Scripted<T>) -> Result<T, Error> {
        match scripted {
            Scripted::Value(value) => Ok(value),
            Scripted::Fail(message) => Err(Error::Io(std::io::Error::other(message))),
        }
    }
}

impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn exists(&self, path: &str) -> Result<bool, Error> {
        self.record(format!("exists {path}"));
        let next = lock(&self.scripts).exists.next();
        Self::answer(next)
    }

    fn get(&self, path: &str) -> Result<Option<Bytes>, Error> {
        self.record(format!("get {path}"));
        let next = lock(&self.scripts).get.next();
        Self::answer(next)
    }

    fn get_stream(&self, path: &str) -> Result<Option<ReadStream>, Error> {
        self.record(format!("get_stream {path}"));
        let next = lock(&self.scripts).get_stream.next();
        Ok(Self::answer(next)?.map(|bytes| Box::new(Cursor::new(bytes)) as ReadStream))
    }

    fn put(&self, path: &str, contents: &[u8]) -> Result<bool, Error> {
        self.record(format!("put {path}"));
        let next = lock(&self.scripts).put.next();
        let answer = Self::answer(next)?;
        lock(&self.written).push((path.to_string(), Bytes::copy_from_slice(contents)));
        Ok(answer)
    }

    fn put_stream(&self, path: &str, stream: &mut dyn Read) -> Result<bool, Error> {
        self.record(format!("put_stream {path}"));
        let next = lock(&self.scripts).put_stream.next();
        let answer = Self::answer(next)?;
        let mut buffer = Vec::new();
        stream.read_to_end(&mut buffer)?;
        lock(&self.written).push((path.to_string(), Bytes::from(buffer)));
        Ok(answer)
    }

    fn rename(&self, path: &str, new_path: &str, overwrite: bool) -> Result<bool, Error> {
        self.record(format!("rename {path} {new_path} {overwrite}"));
        let next = lock(&self.scripts).rename.next();
        Self::answer(next)
    }

    fn copy(&self, path: &str, new_path: &str) -> Result<bool, Error> {
        self.record(format!("copy {path} {new_path}"));
        let next = lock(&self.scripts).copy.next();
        Self::answer(next)
    }

    fn delete(&self, path: &str) -> Result<bool, Error> {
        self.record(format!("delete {path}"));
        let next = lock(&self.scripts).delete.next();
        Self::answer(next)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Contract checks shared by every adapter implementation.
///
/// Each function receives a fresh, empty backend and a base path under which
/// it may create files.
pub mod backend_test_suite {
    use super::*;

    pub fn put_then_get_works(backend: &dyn Backend, base: &str) {
        let path = format!("{base}/put_get.txt");
        assert!(!backend.exists(&path).unwrap());
        assert!(backend.put(&path, b"hello").unwrap());
        assert!(backend.exists(&path).unwrap());
        assert_eq!(backend.get(&path).unwrap().unwrap(), Bytes::from_static(b"hello"));
    }

    pub fn put_replaces_contents(backend: &dyn Backend, base: &str) {
        let path = format!("{base}/replace.txt");
        assert!(backend.put(&path, b"first").unwrap());
        assert!(backend.put(&path, b"second").unwrap());
        assert_eq!(backend.get(&path).unwrap().unwrap(), Bytes::from_static(b"second"));
    }

    pub fn put_creates_parents(backend: &dyn Backend, base: &str) {
        let path = format!("{base}/deep/er/file.txt");
        assert!(backend.put(&path, b"nested").unwrap());
        assert!(backend.exists(&format!("{base}/deep/er")).unwrap());
        assert_eq!(backend.get(&path).unwrap().unwrap(), Bytes::from_static(b"nested"));
    }

    pub fn stream_round_trip_works(backend: &dyn Backend, base: &str) {
        let path = format!("{base}/stream.txt");
        let mut source = Cursor::new(b"streamed line\n".to_vec());
        assert!(backend.put_stream(&path, &mut source).unwrap());

        let mut stream = backend.get_stream(&path).unwrap().unwrap();
        let mut contents = String::new();
        stream.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "streamed line\n");
    }

    pub fn get_missing_is_not_found(backend: &dyn Backend, base: &str) {
        let path = format!("{base}/missing.txt");
        assert!(matches!(
            backend.get(&path),
            Err(Error::FileNotFound { .. })
        ));
        assert!(matches!(
            backend.get_stream(&path),
            Err(Error::FileNotFound { .. })
        ));
    }

    pub fn rename_moves_file(backend: &dyn Backend, base: &str) {
        let from = format!("{base}/old.txt");
        let to = format!("{base}/moved/new.txt");
        backend.put(&from, b"moving").unwrap();

        assert!(backend.rename(&from, &to, false).unwrap());
        assert!(!backend.exists(&from).unwrap());
        assert_eq!(backend.get(&to).unwrap().unwrap(), Bytes::from_static(b"moving"));
    }

    pub fn rename_refuses_existing_destination(backend: &dyn Backend, base: &str) {
        let from = format!("{base}/a.txt");
        let to = format!("{base}/b.txt");
        backend.put(&from, b"a").unwrap();
        backend.put(&to, b"b").unwrap();

        assert!(matches!(
            backend.rename(&from, &to, false),
            Err(Error::FileExists { .. })
        ));
        assert!(backend.exists(&from).unwrap());

        assert!(backend.rename(&from, &to, true).unwrap());
        assert_eq!(backend.get(&to).unwrap().unwrap(), Bytes::from_static(b"a"));
    }

    pub fn rename_missing_source_is_not_found(backend: &dyn Backend, base: &str) {
        let from = format!("{base}/ghost.txt");
        let to = format!("{base}/target.txt");
        assert!(matches!(
            backend.rename(&from, &to, false),
            Err(Error::FileNotFound { .. })
        ));
    }

    pub fn copy_duplicates_file(backend: &dyn Backend, base: &str) {
        let from = format!("{base}/original.txt");
        let to = format!("{base}/copies/copy.txt");
        backend.put(&from, b"twice").unwrap();

        assert!(backend.copy(&from, &to).unwrap());
        assert_eq!(backend.get(&from).unwrap().unwrap(), Bytes::from_static(b"twice"));
        assert_eq!(backend.get(&to).unwrap().unwrap(), Bytes::from_static(b"twice"));
    }

    pub fn delete_removes_file(backend: &dyn Backend, base: &str) {
        let path = format!("{base}/doomed.txt");
        backend.put(&path, b"bye").unwrap();

        assert!(backend.delete(&path).unwrap());
        assert!(!backend.exists(&path).unwrap());
        assert!(!backend.delete(&path).unwrap());
    }

    pub fn delete_removes_directories(backend: &dyn Backend, base: &str) {
        let dir = format!("{base}/tree");
        backend.put(&format!("{dir}/a.txt"), b"a").unwrap();
        backend.put(&format!("{dir}/sub/b.txt"), b"b").unwrap();

        assert!(backend.delete(&dir).unwrap());
        assert!(!backend.exists(&dir).unwrap());
        assert!(!backend.exists(&format!("{dir}/sub/b.txt")).unwrap());
    }

    pub fn put_onto_directory_is_invalid(backend: &dyn Backend, base: &str) {
        let dir = format!("{base}/folder");
        backend.put(&format!("{dir}/inside.txt"), b"x").unwrap();

        assert!(matches!(
            backend.put(&dir, b"clobber"),
            Err(Error::InvalidPath { .. })
        ));
    }

    pub fn overlong_file_name_is_invalid(backend: &dyn Backend, base: &str) {
        let path = format!("{base}/{}", "x".repeat(256));
        assert!(matches!(
            backend.put(&path, b"x"),
            Err(Error::InvalidPath { .. })
        ));
    }

    pub fn put_below_a_file_is_invalid(backend: &dyn Backend, base: &str) {
        let file = format!("{base}/file");
        backend.put(&file, b"plain").unwrap();

        assert!(matches!(
            backend.put(&format!("{file}/child"), b"x"),
            Err(Error::InvalidPath { .. })
        ));
        assert_eq!(backend.get(&file).unwrap().unwrap(), Bytes::from_static(b"plain"));
    }

    /// Run every check, each against a fresh backend from `factory`.
    ///
    /// The factory returns the backend, the base path to work under, and a
    /// guard kept alive for the duration of the check (e.g. a temp dir).
    pub fn run_all<B: Backend, G>(factory: impl Fn() -> (B, String, G)) {
        let checks: [fn(&dyn Backend, &str); 14] = [
            put_then_get_works,
            put_replaces_contents,
            put_creates_parents,
            stream_round_trip_works,
            get_missing_is_not_found,
            rename_moves_file,
            rename_refuses_existing_destination,
            rename_missing_source_is_not_found,
            copy_duplicates_file,
            delete_removes_file,
            delete_removes_directories,
            put_onto_directory_is_invalid,
            overlong_file_name_is_invalid,
            put_below_a_file_is_invalid,
        ];
        for check in checks {
            let (backend, base, _guard) = factory();
            check(&backend, &base);
        }
    }
}
