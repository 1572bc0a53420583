use std::cell::RefCell;
use std::rc::Rc;

use satori_blob::MemoryBlobStore;
use satori_core::{BlobValue, FieldValue, RecordId, Status, TaskManager, TracingTaskManager};
use satori_model::{
    EntityEvent, MemoryRecordService, ModelError, Problem, ServiceError, Test, TestMember,
    TestState, TestSuite, TestSuiteState,
};
use tempfile::TempDir;

const PROBLEM: RecordId = RecordId(10);

struct Fixture {
    problem: Problem,
    tests: MemoryRecordService<TestState>,
    suites: MemoryRecordService<TestSuiteState>,
    blobs: MemoryBlobStore,
    tasks: TracingTaskManager,
}

impl Fixture {
    fn new() -> Self {
        Self {
            problem: Problem::new(PROBLEM),
            tests: MemoryRecordService::starting_at(100),
            suites: MemoryRecordService::starting_at(500),
            blobs: MemoryBlobStore::new(),
            tasks: TracingTaskManager::new(),
        }
    }

    /// A created test named `name`.
    fn created_test(&self, name: &str) -> Test {
        let mut test = Test::create_new(&self.problem);
        test.set_name(name);
        let task = self.tasks.acquire();
        test.create(&*task, &self.tests, &self.blobs).expect("create");
        test
    }

    fn open_test(&self, id: RecordId) -> Test {
        let task = self.tasks.acquire();
        Test::open(&self.problem, id, &*task, &self.tests).expect("open")
    }
}

fn record_events(test: &Test) -> Rc<RefCell<Vec<EntityEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let s = Rc::clone(&seen);
    test.subscribe(move |e| s.borrow_mut().push(*e));
    seen
}

#[test]
fn setter_marks_modified_and_save_resyncs_snapshot() {
    let fx = Fixture::new();
    let mut test = fx.created_test("A");
    let id = test.id().expect("id");
    assert_eq!(test.status(), Status::Synced);

    assert!(test.set_name("B"));
    assert_eq!(test.status(), Status::Modified);
    assert!(test.is_modified());

    let task = fx.tasks.acquire();
    test.save(&*task, &fx.tests, &fx.blobs).expect("save");

    assert_eq!(test.status(), Status::Synced);
    assert!(!test.is_modified());
    assert_eq!(fx.problem.tests().complete_state(id).name, "B");
    assert_eq!(fx.tests.record(id).expect("stored").name, "B");
}

#[test]
fn create_then_reload_returns_submitted_values() {
    let fx = Fixture::new();
    let mut test = Test::create_new(&fx.problem);
    test.set_name("sample");
    test.set_attr("time", Some("2s".into()));
    let submitted = test.state();

    let task = fx.tasks.acquire();
    test.create(&*task, &fx.tests, &fx.blobs).expect("create");
    test.reload(&*task, &fx.tests).expect("reload");

    assert_eq!(test.state(), submitted);
    assert_eq!(test.status(), Status::Synced);
    assert_eq!(fx.tests.calls().fetch, 1);
}

#[test]
fn identical_remote_change_keeps_status() {
    let fx = Fixture::new();
    let mut test = fx.created_test("A");
    test.set_attr("time", Some("1".into()));
    let seen = record_events(&test);
    let id = test.id().expect("id");

    // Remote now holds exactly the local working copy.
    fx.problem.tests().update(id, test.state(), None);

    assert_eq!(test.status(), Status::Modified);
    assert!(seen.borrow().is_empty());
}

#[test]
fn divergent_remote_change_outdates_every_editor() {
    let fx = Fixture::new();
    let mut writer = fx.created_test("A");
    let id = writer.id().expect("id");
    let reader = fx.open_test(id);
    let seen = record_events(&reader);

    writer.set_name("B");
    let task = fx.tasks.acquire();
    writer.save(&*task, &fx.tests, &fx.blobs).expect("save");

    assert_eq!(writer.status(), Status::Synced);
    assert_eq!(reader.status(), Status::Outdated);
    assert!(reader.is_modified(), "an outdated copy is never clean");
    assert_eq!(*seen.borrow(), vec![EntityEvent::Outdated]);
}

#[test]
fn edits_while_outdated_stay_outdated_until_reload() {
    let fx = Fixture::new();
    let mut writer = fx.created_test("A");
    let id = writer.id().expect("id");
    let mut reader = fx.open_test(id);
    writer.set_name("B");
    let task = fx.tasks.acquire();
    writer.save(&*task, &fx.tests, &fx.blobs).expect("save");

    reader.set_attr("time", Some("3".into()));
    assert_eq!(reader.status(), Status::Outdated);

    reader.reload(&*task, &fx.tests).expect("reload");
    assert_eq!(reader.status(), Status::Synced);
    assert_eq!(reader.name(), "B");
    assert_eq!(reader.attr("time"), None);
}

#[test]
fn delete_through_one_editor_detaches_the_other() {
    let fx = Fixture::new();
    let mut first = fx.created_test("A");
    let id = first.id().expect("id");
    let second = fx.open_test(id);
    let seen = record_events(&second);
    assert_eq!(fx.problem.tests().reference_count(id), 2);

    let task = fx.tasks.acquire();
    first.delete(&*task, &fx.tests).expect("delete");

    assert_eq!(fx.tests.calls().delete, 1);
    assert!(fx.tests.record(id).is_none());
    assert!(!fx.problem.tests().contains(id));

    assert_eq!(second.id(), None);
    assert!(!second.is_attached());
    assert_eq!(second.status(), Status::Outdated);
    assert_eq!(*seen.borrow(), vec![EntityEvent::Outdated]);

    assert_eq!(first.id(), None);
    assert_eq!(first.status(), Status::Outdated);
}

#[test]
fn deleted_test_can_be_created_again() {
    let fx = Fixture::new();
    let mut test = fx.created_test("A");
    let old_id = test.id().expect("id");
    let task = fx.tasks.acquire();
    test.delete(&*task, &fx.tests).expect("delete");

    let new_id = test.create(&*task, &fx.tests, &fx.blobs).expect("recreate");

    assert_ne!(new_id, old_id);
    assert_eq!(test.status(), Status::Synced);
    assert_eq!(fx.tests.record(new_id).expect("stored").name, "A");
}

#[test]
fn failed_save_leaves_entity_untouched() {
    let fx = Fixture::new();
    let mut test = fx.created_test("A");
    let id = test.id().expect("id");
    test.set_name("B");
    let seen = record_events(&test);

    fx.tests.fail_next(ServiceError::Conflict("stale revision".into()));
    let task = fx.tasks.acquire();
    let err = test.save(&*task, &fx.tests, &fx.blobs).unwrap_err();

    assert!(matches!(err, ModelError::Service(ServiceError::Conflict(_))));
    assert_eq!(test.status(), Status::Modified);
    assert_eq!(test.name(), "B");
    assert_eq!(fx.problem.tests().complete_state(id).name, "A");
    assert!(seen.borrow().is_empty());
}

#[test]
fn failed_create_stays_detached() {
    let fx = Fixture::new();
    let mut test = Test::create_new(&fx.problem);
    test.set_name("A");

    fx.tests.fail_next(ServiceError::Transport("connection reset".into()));
    let task = fx.tasks.acquire();
    assert!(test.create(&*task, &fx.tests, &fx.blobs).is_err());

    assert_eq!(test.id(), None);
    assert_eq!(test.status(), Status::Modified);
    assert!(fx.problem.tests().is_empty());
}

#[test]
fn cancelled_task_issues_no_remote_call() {
    let fx = Fixture::new();
    let mut test = fx.created_test("A");
    let id = test.id().expect("id");
    test.set_name("B");

    fx.tasks.cancel();
    let task = fx.tasks.acquire();
    let err = test.save(&*task, &fx.tests, &fx.blobs).unwrap_err();
    assert!(err.is_cancelled());
    let err = test.delete(&*task, &fx.tests).unwrap_err();
    assert!(err.is_cancelled());

    assert_eq!(fx.tests.calls().update, 0);
    assert_eq!(fx.tests.calls().delete, 0);
    assert_eq!(test.id(), Some(id));
    assert_eq!(test.status(), Status::Modified);
}

#[test]
fn failed_blob_upload_aborts_create() {
    let dir = TempDir::new().expect("tmp");
    let fx = Fixture::new();
    let mut test = Test::create_new(&fx.problem);
    test.set_attr(
        "input",
        Some(BlobValue::local(dir.path().join("missing.in")).into()),
    );

    let task = fx.tasks.acquire();
    let err = test.create(&*task, &fx.tests, &fx.blobs).unwrap_err();

    assert!(matches!(err, ModelError::Blob(_)), "got {err:?}");
    assert_eq!(fx.tests.calls().insert, 0);
    assert_eq!(test.id(), None);
    let input = test.attr("input").expect("input attr");
    assert!(!input.as_blob().expect("blob").is_remote());
}

#[test]
fn open_fetches_partial_snapshot_once() {
    let fx = Fixture::new();
    let mut remote = TestState::new(PROBLEM);
    remote.name = "listed".into();
    let id = fx.tests.remote_insert(remote);
    let task = fx.tasks.acquire();
    fx.problem.refresh_tests(&*task, &fx.tests).expect("refresh");
    assert!(!fx.problem.tests().is_complete(id));

    let first = fx.open_test(id);
    let second = fx.open_test(id);

    assert_eq!(first.name(), "listed");
    assert_eq!(second.status(), Status::Synced);
    assert_eq!(fx.tests.calls().fetch, 1);
    assert!(fx.problem.tests().fetched_at(id).is_some());
}

#[test]
fn refresh_detaches_editors_of_vanished_records() {
    let fx = Fixture::new();
    let test = fx.created_test("A");
    let id = test.id().expect("id");

    fx.tests.remote_delete(id);
    let task = fx.tasks.acquire();
    fx.problem.refresh_tests(&*task, &fx.tests).expect("refresh");

    assert_eq!(test.id(), None);
    assert_eq!(test.status(), Status::Outdated);
}

#[test]
fn close_unregisters_and_is_idempotent() {
    let fx = Fixture::new();
    let mut test = fx.created_test("A");
    let id = test.id().expect("id");
    let other = fx.open_test(id);
    assert_eq!(fx.problem.tests().reference_count(id), 2);

    test.close();
    test.close();
    assert_eq!(fx.problem.tests().reference_count(id), 1);
    assert_eq!(test.id(), Some(id));

    drop(other);
    assert_eq!(fx.problem.tests().reference_count(id), 0);
}

#[test]
#[should_panic(expected = "already created")]
fn create_twice_panics() {
    let fx = Fixture::new();
    let mut test = fx.created_test("A");
    let task = fx.tasks.acquire();
    let _ = test.create(&*task, &fx.tests, &fx.blobs);
}

#[test]
#[should_panic(expected = "not created")]
fn save_of_detached_test_panics() {
    let fx = Fixture::new();
    let mut test = Test::create_new(&fx.problem);
    let task = fx.tasks.acquire();
    let _ = test.save(&*task, &fx.tests, &fx.blobs);
}

#[test]
fn suite_membership_roundtrip_and_outdating() {
    let fx = Fixture::new();
    let a = fx.created_test("a");
    let b = fx.created_test("b");
    let (a, b) = (a.id().expect("a"), b.id().expect("b"));

    let mut suite = TestSuite::create_new(&fx.problem);
    suite.set_name("main");
    suite.set_tests(vec![TestMember::Remote(a), TestMember::Remote(b)]);
    suite.set_general_parameter("timeout", Some(FieldValue::from("5")));
    let task = fx.tasks.acquire();
    let id = suite.create(&*task, &fx.suites, &fx.blobs).expect("create suite");

    let other = TestSuite::open(&fx.problem, id, &*task, &fx.suites).expect("open suite");
    assert_eq!(other.tests(), vec![TestMember::Remote(a), TestMember::Remote(b)]);

    suite.set_tests(vec![TestMember::Remote(b), TestMember::Remote(a)]);
    suite.save(&*task, &fx.suites, &fx.blobs).expect("save suite");
    assert_eq!(other.status(), Status::Outdated);

    fx.suites.remote_edit(id, |s| {
        s.tests.pop();
    });
    suite.reload(&*task, &fx.suites).expect("reload suite");
    assert_eq!(suite.tests(), vec![TestMember::Remote(b)]);
    assert_eq!(suite.status(), Status::Synced);
}
