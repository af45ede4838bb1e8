//! Bug synchronization store.
//!
//! Owns the local copy of the bug collection and mediates every mutation
//! through the remote bug service. Consistency is snapshot-based: each
//! successful mutation is followed by a full list refresh, and every
//! successful fetch replaces the whole collection. Nothing is spliced in
//! place.
//!
//! Network calls run on background threads and report one completion message
//! over an mpsc channel; [`BugStore::poll`], called once per UI frame, is the
//! only place state changes in response to a network result. Overlapping
//! requests are neither cancelled nor sequenced: if two fetches are in
//! flight, the one that resolves last wins.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use crate::api::{ApiError, Bug, BugApi, BugDraft, BugFilter, BugStatus, Priority};
use crate::telemetry::{ErrorEvent, ErrorSink};

const FETCH_FALLBACK: &str = "Failed to fetch bugs. Please try again later.";

/// Completion message from a background request.
enum StoreEvent {
    Fetched(Result<Vec<Bug>, ApiError>),
    Mutated {
        action: Mutation,
        result: Result<(), ApiError>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Add,
    Update,
    Delete,
}

impl Mutation {
    fn operation(&self) -> &'static str {
        match self {
            Self::Add => "add_bug",
            Self::Update => "update_bug",
            Self::Delete => "delete_bug",
        }
    }

    fn fallback_message(&self) -> &'static str {
        match self {
            Self::Add => "Failed to add bug",
            Self::Update => "Failed to update bug",
            Self::Delete => "Failed to delete bug",
        }
    }
}

/// State + actions for the bug collection.
pub struct BugStore {
    bugs: Vec<Bug>,
    error: Option<String>,
    loading: bool,
    filter: BugFilter,
    token: Option<String>,

    api: Arc<dyn BugApi + Send + Sync>,
    sink: Arc<dyn ErrorSink>,
    tx: Sender<StoreEvent>,
    rx: Receiver<StoreEvent>,
}

impl BugStore {
    pub fn new(api: Arc<dyn BugApi + Send + Sync>, sink: Arc<dyn ErrorSink>) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        Self {
            bugs: Vec::new(),
            error: None,
            loading: false,
            filter: BugFilter::default(),
            token: None,
            api,
            sink,
            tx,
            rx,
        }
    }

    pub fn bugs(&self) -> &[Bug] {
        &self.bugs
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// True while any request is outstanding.
    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn filter(&self) -> &BugFilter {
        &self.filter
    }

    /// Supply or replace the session credential. Gaining one triggers a
    /// fresh fetch; losing it just stops further requests.
    pub fn set_token(&mut self, token: Option<String>) {
        if self.token == token {
            return;
        }
        self.token = token;
        if self.token.is_some() {
            self.fetch_bugs();
        }
    }

    pub fn set_status_filter(&mut self, status: Option<BugStatus>) {
        if self.filter.status == status {
            return;
        }
        self.filter.status = status;
        if self.token.is_some() {
            self.fetch_bugs();
        }
    }

    pub fn set_priority_filter(&mut self, priority: Option<Priority>) {
        if self.filter.priority == priority {
            return;
        }
        self.filter.priority = priority;
        if self.token.is_some() {
            self.fetch_bugs();
        }
    }

    /// Dismiss the current error message. Local only.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Refresh the collection from the server, scoped by the current filter.
    pub fn fetch_bugs(&mut self) {
        let Some(token) = self.token.clone() else {
            return;
        };
        self.loading = true;
        self.error = None;

        let api = Arc::clone(&self.api);
        let filter = self.filter;
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let _ = tx.send(StoreEvent::Fetched(api.list(&filter, &token)));
        });
    }

    /// Create a bug. An empty title is rejected before any network call.
    pub fn add_bug(&mut self, draft: BugDraft) {
        if draft.title.trim().is_empty() {
            self.error = Some("Title is required".to_string());
            return;
        }
        self.spawn_mutation(Mutation::Add, move |api, token| {
            api.create(&draft, token).map(|_| ())
        });
    }

    /// Replace title/status/priority of an existing bug.
    pub fn update_bug(&mut self, id: String, draft: BugDraft) {
        if draft.title.trim().is_empty() {
            self.error = Some("Title is required".to_string());
            return;
        }
        self.spawn_mutation(Mutation::Update, move |api, token| {
            api.update(&id, &draft, token).map(|_| ())
        });
    }

    pub fn delete_bug(&mut self, id: String) {
        self.spawn_mutation(Mutation::Delete, move |api, token| api.delete(&id, token));
    }

    fn spawn_mutation<F>(&mut self, action: Mutation, request: F)
    where
        F: FnOnce(&dyn BugApi, &str) -> Result<(), ApiError> + Send + 'static,
    {
        let Some(token) = self.token.clone() else {
            return;
        };
        self.loading = true;
        self.error = None;

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = request(api.as_ref(), &token);
            let _ = tx.send(StoreEvent::Mutated { action, result });
        });
    }

    /// Drain completed requests. Call once per frame.
    ///
    /// The server's record from a successful create/update is discarded: a
    /// mutation success always resynchronizes with a full fetch instead.
    pub fn poll(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                StoreEvent::Fetched(Ok(bugs)) => {
                    self.bugs = bugs;
                    self.error = None;
                    self.loading = false;
                }
                StoreEvent::Fetched(Err(err)) => {
                    self.fail("fetch_bugs", FETCH_FALLBACK, err);
                }
                StoreEvent::Mutated { result: Ok(()), .. } => {
                    self.loading = false;
                    self.fetch_bugs();
                }
                StoreEvent::Mutated {
                    action,
                    result: Err(err),
                } => {
                    self.fail(action.operation(), action.fallback_message(), err);
                }
            }
        }
    }

    fn fail(&mut self, operation: &'static str, fallback: &str, err: ApiError) {
        log::warn!("{} failed: {}", operation, err);
        self.sink.capture(ErrorEvent::new(operation, err.to_string()));
        self.error = Some(err.user_message(fallback));
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        List(BugFilter),
        Create(BugDraft),
        Update(String, BugDraft),
        Delete(String),
    }

    /// In-memory bug service: records every request and keeps a server-side
    /// collection that list snapshots are served from.
    struct FakeApi {
        calls: Mutex<Vec<Call>>,
        bugs: Mutex<Vec<Bug>>,
        next_id: Mutex<u32>,
        fail_next: Mutex<Option<ApiError>>,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                bugs: Mutex::new(Vec::new()),
                next_id: Mutex::new(1),
                fail_next: Mutex::new(None),
            }
        }

        fn seeded(bugs: Vec<Bug>) -> Self {
            let api = Self::new();
            *api.next_id.lock().unwrap() = bugs.len() as u32 + 1;
            *api.bugs.lock().unwrap() = bugs;
            api
        }

        fn fail_next(&self, err: ApiError) {
            *self.fail_next.lock().unwrap() = Some(err);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn list_count(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::List(_)))
                .count()
        }

        fn take_failure(&self) -> Option<ApiError> {
            self.fail_next.lock().unwrap().take()
        }
    }

    impl BugApi for FakeApi {
        fn list(&self, filter: &BugFilter, _token: &str) -> Result<Vec<Bug>, ApiError> {
            self.calls.lock().unwrap().push(Call::List(*filter));
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let bugs = self.bugs.lock().unwrap();
            Ok(bugs
                .iter()
                .filter(|b| filter.status.map_or(true, |s| b.status == s))
                .filter(|b| filter.priority.map_or(true, |p| b.priority == p))
                .cloned()
                .collect())
        }

        fn create(&self, draft: &BugDraft, _token: &str) -> Result<Bug, ApiError> {
            self.calls.lock().unwrap().push(Call::Create(draft.clone()));
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let mut next_id = self.next_id.lock().unwrap();
            let bug = Bug {
                id: next_id.to_string(),
                title: draft.title.clone(),
                status: draft.status,
                priority: draft.priority,
            };
            *next_id += 1;
            self.bugs.lock().unwrap().push(bug.clone());
            Ok(bug)
        }

        fn update(&self, id: &str, draft: &BugDraft, _token: &str) -> Result<Bug, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(id.to_string(), draft.clone()));
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            let mut bugs = self.bugs.lock().unwrap();
            let bug = bugs
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or(ApiError::Status {
                    code: 404,
                    message: Some("Bug not found".into()),
                })?;
            bug.title = draft.title.clone();
            bug.status = draft.status;
            bug.priority = draft.priority;
            Ok(bug.clone())
        }

        fn delete(&self, id: &str, _token: &str) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(Call::Delete(id.to_string()));
            if let Some(err) = self.take_failure() {
                return Err(err);
            }
            self.bugs.lock().unwrap().retain(|b| b.id != id);
            Ok(())
        }

        fn login(&self, _username: &str, _password: &str) -> Result<String, ApiError> {
            Ok("fake-token".into())
        }

        fn register(&self, _username: &str, _password: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    struct RecordingSink(Mutex<Vec<ErrorEvent>>);

    impl ErrorSink for RecordingSink {
        fn capture(&self, event: ErrorEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn bug(id: &str, title: &str, status: BugStatus, priority: Priority) -> Bug {
        Bug {
            id: id.into(),
            title: title.into(),
            status,
            priority,
        }
    }

    fn store_with(api: &Arc<FakeApi>) -> (BugStore, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
        let store = BugStore::new(
            Arc::clone(api) as Arc<dyn BugApi + Send + Sync>,
            Arc::clone(&sink) as Arc<dyn ErrorSink>,
        );
        (store, sink)
    }

    /// Poll until every outstanding request (including follow-up fetches)
    /// has been drained.
    fn settle(store: &mut BugStore) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while store.loading() {
            assert!(Instant::now() < deadline, "store never settled");
            std::thread::sleep(Duration::from_millis(1));
            store.poll();
        }
        store.poll();
    }

    #[test]
    fn initial_token_triggers_one_unfiltered_fetch() {
        let api = Arc::new(FakeApi::seeded(vec![
            bug("1", "Crash on save", BugStatus::Open, Priority::High),
            bug("2", "Typo in footer", BugStatus::Closed, Priority::Low),
        ]));
        let (mut store, _) = store_with(&api);

        store.set_token(Some("tok".into()));
        settle(&mut store);

        assert_eq!(api.calls(), vec![Call::List(BugFilter::default())]);
        assert_eq!(store.bugs().len(), 2);
        assert_eq!(store.bugs()[0].id, "1");
        assert!(store.error().is_none());
    }

    #[test]
    fn without_token_nothing_is_fetched() {
        let api = Arc::new(FakeApi::new());
        let (mut store, _) = store_with(&api);

        store.fetch_bugs();
        store.set_status_filter(Some(BugStatus::Open));
        settle(&mut store);

        assert!(api.calls().is_empty());
        assert!(!store.loading());
    }

    #[test]
    fn filter_change_refetches_with_updated_query() {
        let api = Arc::new(FakeApi::seeded(vec![
            bug("1", "Crash on save", BugStatus::Open, Priority::High),
            bug("2", "Typo in footer", BugStatus::Closed, Priority::Low),
        ]));
        let (mut store, _) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);

        store.set_status_filter(Some(BugStatus::Open));
        settle(&mut store);

        let expected = BugFilter {
            status: Some(BugStatus::Open),
            priority: None,
        };
        assert_eq!(api.calls().last(), Some(&Call::List(expected)));
        assert_eq!(expected.to_query(), "status=open");
        assert_eq!(store.bugs().len(), 1);
        assert_eq!(store.bugs()[0].id, "1");

        // Setting the same filter again must not refetch.
        let before = api.list_count();
        store.set_status_filter(Some(BugStatus::Open));
        settle(&mut store);
        assert_eq!(api.list_count(), before);
    }

    #[test]
    fn add_bug_refreshes_instead_of_appending() {
        let api = Arc::new(FakeApi::new());
        let (mut store, _) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);
        let lists_before = api.list_count();

        store.add_bug(BugDraft {
            title: "X".into(),
            status: BugStatus::Open,
            priority: Priority::Low,
        });
        assert!(store.loading());
        settle(&mut store);

        // Exactly one follow-up list request, and the collection is the
        // server's post-refresh snapshot.
        assert_eq!(api.list_count(), lists_before + 1);
        assert_eq!(store.bugs().len(), 1);
        assert_eq!(store.bugs()[0].title, "X");
        assert_eq!(store.bugs()[0].id, "1");
        assert!(store.error().is_none());
    }

    #[test]
    fn update_bug_keeps_size_and_applies_fields() {
        let api = Arc::new(FakeApi::seeded(vec![
            bug("1", "Crash on save", BugStatus::Open, Priority::High),
            bug("2", "Typo in footer", BugStatus::Open, Priority::Low),
        ]));
        let (mut store, _) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);

        store.update_bug(
            "2".into(),
            BugDraft {
                title: "Typo in header".into(),
                status: BugStatus::Closed,
                priority: Priority::Medium,
            },
        );
        settle(&mut store);

        assert_eq!(store.bugs().len(), 2);
        let updated = store.bugs().iter().find(|b| b.id == "2").unwrap();
        assert_eq!(updated.title, "Typo in header");
        assert_eq!(updated.status, BugStatus::Closed);
        assert_eq!(updated.priority, Priority::Medium);
    }

    #[test]
    fn delete_bug_removes_record_after_refresh() {
        let api = Arc::new(FakeApi::seeded(vec![
            bug("1", "Crash on save", BugStatus::Open, Priority::High),
            bug("2", "Typo in footer", BugStatus::Open, Priority::Low),
        ]));
        let (mut store, _) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);

        store.delete_bug("1".into());
        settle(&mut store);

        assert!(store.bugs().iter().all(|b| b.id != "1"));
        assert_eq!(store.bugs().len(), 1);
    }

    #[test]
    fn failed_fetch_keeps_collection_and_surfaces_server_message() {
        let api = Arc::new(FakeApi::seeded(vec![bug(
            "1",
            "Crash on save",
            BugStatus::Open,
            Priority::High,
        )]));
        let (mut store, sink) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);
        let before = store.bugs().to_vec();

        api.fail_next(ApiError::Status {
            code: 500,
            message: Some("Network error".into()),
        });
        store.fetch_bugs();
        settle(&mut store);

        assert_eq!(store.bugs(), before.as_slice());
        assert_eq!(store.error(), Some("Network error"));
        assert_eq!(sink.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn failed_fetch_without_body_uses_generic_message() {
        let api = Arc::new(FakeApi::new());
        let (mut store, _) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);

        api.fail_next(ApiError::Transport("connection refused".into()));
        store.fetch_bugs();
        settle(&mut store);

        assert_eq!(
            store.error(),
            Some("Failed to fetch bugs. Please try again later.")
        );
    }

    #[test]
    fn failed_mutation_leaves_state_and_skips_refresh() {
        let api = Arc::new(FakeApi::seeded(vec![bug(
            "1",
            "Crash on save",
            BugStatus::Open,
            Priority::High,
        )]));
        let (mut store, sink) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);
        let lists_before = api.list_count();
        let before = store.bugs().to_vec();

        api.fail_next(ApiError::Status {
            code: 400,
            message: Some("Title is required".into()),
        });
        store.add_bug(BugDraft {
            title: "X".into(),
            status: BugStatus::Open,
            priority: Priority::Low,
        });
        settle(&mut store);

        assert_eq!(store.bugs(), before.as_slice());
        assert_eq!(store.error(), Some("Title is required"));
        assert_eq!(api.list_count(), lists_before);
        assert_eq!(sink.0.lock().unwrap()[0].operation, "add_bug");
    }

    #[test]
    fn delete_failure_uses_generic_fallback() {
        let api = Arc::new(FakeApi::seeded(vec![bug(
            "1",
            "Crash on save",
            BugStatus::Open,
            Priority::High,
        )]));
        let (mut store, _) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);

        api.fail_next(ApiError::Status {
            code: 500,
            message: None,
        });
        store.delete_bug("1".into());
        settle(&mut store);

        assert_eq!(store.error(), Some("Failed to delete bug"));
        assert_eq!(store.bugs().len(), 1);
    }

    #[test]
    fn loading_flag_spans_every_operation() {
        let api = Arc::new(FakeApi::new());
        let (mut store, _) = store_with(&api);
        store.set_token(Some("tok".into()));
        assert!(store.loading());
        settle(&mut store);
        assert!(!store.loading());

        store.add_bug(BugDraft {
            title: "X".into(),
            status: BugStatus::Open,
            priority: Priority::Low,
        });
        assert!(store.loading());
        settle(&mut store);
        assert!(!store.loading());

        // Failure path releases the flag too.
        api.fail_next(ApiError::Transport("timeout".into()));
        store.fetch_bugs();
        assert!(store.loading());
        settle(&mut store);
        assert!(!store.loading());
    }

    #[test]
    fn empty_title_is_rejected_before_any_request() {
        let api = Arc::new(FakeApi::new());
        let (mut store, sink) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);
        let calls_before = api.calls().len();

        store.add_bug(BugDraft {
            title: "   ".into(),
            status: BugStatus::Open,
            priority: Priority::Low,
        });

        assert!(!store.loading());
        assert_eq!(store.error(), Some("Title is required"));
        assert_eq!(api.calls().len(), calls_before);
        // Validation failures are not network failures; nothing is reported.
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn clear_error_dismisses_and_success_clears_implicitly() {
        let api = Arc::new(FakeApi::new());
        let (mut store, _) = store_with(&api);
        store.set_token(Some("tok".into()));
        settle(&mut store);

        api.fail_next(ApiError::Transport("timeout".into()));
        store.fetch_bugs();
        settle(&mut store);
        assert!(store.error().is_some());

        store.clear_error();
        assert!(store.error().is_none());

        api.fail_next(ApiError::Transport("timeout".into()));
        store.fetch_bugs();
        settle(&mut store);
        assert!(store.error().is_some());

        store.fetch_bugs();
        settle(&mut store);
        assert!(store.error().is_none());
    }
}
