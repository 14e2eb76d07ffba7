use super::*;
use crate::attributes;
use crate::test_utils::{CallLog, DriverCall, MockConnection, result_set};

fn executor_with(mock: MockConnection, replay: ReplayPolicy) -> QueryExecutor {
    let mut executor = QueryExecutor::with_options(ExecutorOptions::default().with_replay(replay));
    executor.connection = Some(mock.boxed());
    executor
}

fn mock_executor() -> (QueryExecutor, CallLog) {
    let (mock, log) = MockConnection::new();
    (executor_with(mock, ReplayPolicy::Deferred), log)
}

fn insert(executor: &mut QueryExecutor, n: i64) -> Result<bool, SqlExecutorError> {
    executor.execute(
        &format!("INSERT INTO t (id) VALUES (:id) /* {n} */"),
        &attributes! { "id" => n },
    )
}

#[test]
fn execute_outside_transaction_runs_once() {
    let (mut executor, log) = mock_executor();
    assert!(insert(&mut executor, 1).unwrap());
    assert_eq!(log.executed().len(), 1);
    assert_eq!(executor.last_rows_affected(), Some(1));
    assert_eq!(executor.pending_len(), 0);
}

#[test]
fn bound_values_reach_the_driver() {
    let (mut executor, log) = mock_executor();
    executor
        .execute(
            "UPDATE t SET name = :name WHERE id = :id",
            &attributes! { "id" => 7, ":name" => "a:b=c" },
        )
        .unwrap();
    let executed = log
        .calls()
        .into_iter()
        .find_map(|call| match call {
            DriverCall::Execute { values, .. } => Some(values),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        executed,
        vec![RowValues::Text("a:b=c".into()), RowValues::Int(7)]
    );
}

#[test]
fn deferred_execute_waits_for_commit() {
    let (mut executor, log) = mock_executor();
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();
    insert(&mut executor, 2).unwrap();
    assert!(log.executed().is_empty());
    assert!(!log.calls().iter().any(|c| matches!(c, DriverCall::Prepare(_))));
    assert_eq!(executor.pending_len(), 2);
    assert_eq!(executor.transaction_state(), TransactionState::Active);
    assert_eq!(executor.last_rows_affected(), None);
    let queued: Vec<&[String]> = executor
        .pending_statements()
        .map(PreparedStatement::placeholders)
        .collect();
    assert_eq!(queued, vec![&["id".to_string()][..], &["id".to_string()][..]]);

    executor.commit().unwrap();
    let executed = log.executed();
    assert_eq!(executed.len(), 2);
    assert!(executed[0].ends_with("/* 1 */"));
    assert!(executed[1].ends_with("/* 2 */"));
    assert_eq!(log.calls().last(), Some(&DriverCall::Commit));
    assert!(!executor.in_transaction());
    assert_eq!(executor.pending_len(), 0);
}

#[test]
fn execute_and_replay_runs_statements_twice() {
    let (mock, log) = MockConnection::new();
    let mut executor = executor_with(mock, ReplayPolicy::ExecuteAndReplay);
    assert_eq!(executor.options().replay, ReplayPolicy::ExecuteAndReplay);
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();
    assert_eq!(log.executed().len(), 1);
    assert_eq!(executor.pending_len(), 1);
    assert_eq!(executor.last_insert_id().unwrap(), "1");

    executor.commit().unwrap();
    assert_eq!(log.executed().len(), 2);
}

#[test]
fn queries_inside_deferred_transaction_are_not_queued() {
    let (mock, log) = MockConnection::new();
    let mock = mock.with_result(
        "SELECT id FROM t",
        result_set(&["id"], vec![vec![RowValues::Int(1)]]),
    );
    let mut executor = executor_with(mock, ReplayPolicy::Deferred);
    executor.begin_transaction().unwrap();
    let one = executor.query_one("SELECT id FROM t", &Attributes::new()).unwrap();
    assert_eq!(one, Some(RowValues::Int(1)));
    assert_eq!(executor.pending_len(), 0);
    executor.commit().unwrap();
    assert_eq!(log.executed(), vec!["SELECT id FROM t".to_string()]);
}

#[test]
fn begin_twice_is_a_state_error_and_keeps_the_queue() {
    let (mut executor, log) = mock_executor();
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();
    let err = executor.begin_transaction().unwrap_err();
    assert!(err.is_state_error());
    assert!(executor.in_transaction());
    assert_eq!(executor.pending_len(), 1);
    assert_eq!(log.count(&DriverCall::Begin), 1);
}

#[test]
fn commit_and_rollback_need_a_transaction() {
    let (mut executor, log) = mock_executor();
    assert!(executor.commit().unwrap_err().is_state_error());
    assert!(executor.rollback().unwrap_err().is_state_error());
    assert!(log.calls().is_empty());
}

#[test]
fn failing_statement_rolls_back_and_stops_replay() {
    let (mock, log) = MockConnection::new();
    let mut executor = executor_with(mock.failing_on("/* 3 */"), ReplayPolicy::Deferred);
    executor.begin_transaction().unwrap();
    for n in 1..=5 {
        insert(&mut executor, n).unwrap();
    }

    let err = executor.commit().unwrap_err();
    assert!(err.is_query_error());
    assert_eq!(err.code(), Some("23000"));
    assert!(err.message().contains("/* 3 */"));

    assert_eq!(log.executed().len(), 3);
    assert_eq!(log.count(&DriverCall::Rollback), 1);
    assert_eq!(log.count(&DriverCall::Commit), 0);
    assert!(!executor.in_transaction());
    assert_eq!(executor.pending_len(), 0);
}

#[test]
fn failed_rollback_still_reports_the_statement_error() {
    let (mock, log) = MockConnection::new();
    let mock = mock.failing_on("/* 1 */").failing_rollback();
    let mut executor = executor_with(mock, ReplayPolicy::Deferred);
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();

    let err = executor.commit().unwrap_err();
    assert!(err.message().starts_with("mock failure"));
    assert_eq!(log.count(&DriverCall::Rollback), 1);
    assert!(!executor.in_transaction());
}

#[test]
fn failing_commit_is_rolled_back() {
    let (mock, log) = MockConnection::new();
    let mut executor = executor_with(mock.failing_commit(), ReplayPolicy::Deferred);
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();

    let err = executor.commit().unwrap_err();
    assert_eq!(err.code(), Some("40001"));
    assert_eq!(log.count(&DriverCall::Rollback), 1);
    assert!(!executor.in_transaction());
}

#[test]
fn executor_is_reusable_after_a_failed_commit() {
    let (mock, log) = MockConnection::new();
    let mut executor = executor_with(mock.failing_on("/* 2 */"), ReplayPolicy::Deferred);
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();
    insert(&mut executor, 2).unwrap();
    executor.commit().unwrap_err();

    log.clear();
    executor.begin_transaction().unwrap();
    insert(&mut executor, 4).unwrap();
    executor.commit().unwrap();
    assert_eq!(log.executed().len(), 1);
}

#[test]
fn rollback_discards_queued_statements() {
    let (mut executor, log) = mock_executor();
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();
    executor.rollback().unwrap();
    assert!(log.executed().is_empty());
    assert_eq!(executor.pending_len(), 0);
    assert!(!executor.in_transaction());
}

#[test]
fn transaction_closure_commits_on_ok() {
    let (mut executor, log) = mock_executor();
    let value = executor
        .transaction(|tx| {
            insert(tx, 1)?;
            insert(tx, 2)?;
            Ok(42)
        })
        .unwrap();
    assert_eq!(value, 42);
    assert_eq!(log.executed().len(), 2);
    assert_eq!(log.count(&DriverCall::Commit), 1);
}

#[test]
fn transaction_closure_rolls_back_on_err() {
    let (mut executor, log) = mock_executor();
    let err = executor
        .transaction(|tx| -> Result<(), SqlExecutorError> {
            insert(tx, 1)?;
            Err(SqlExecutorError::query("HY000", "abort"))
        })
        .unwrap_err();
    assert_eq!(err.message(), "abort");
    assert!(log.executed().is_empty());
    assert_eq!(log.count(&DriverCall::Rollback), 1);
    assert!(!executor.in_transaction());
}

#[test]
fn unknown_parameter_is_hy093_and_nothing_runs() {
    let (mut executor, log) = mock_executor();
    let err = executor
        .execute("DELETE FROM t WHERE id = :id", &attributes! { "other" => 1 })
        .unwrap_err();
    assert_eq!(err.code(), Some("HY093"));
    assert!(log.executed().is_empty());
}

#[test]
fn operations_without_connection_fail() {
    let mut executor = QueryExecutor::new();
    assert!(!executor.is_connected());
    assert!(
        executor
            .execute("SELECT 1", &Attributes::new())
            .unwrap_err()
            .is_connection_error()
    );
    assert!(executor.begin_transaction().unwrap_err().is_connection_error());
    assert!(!executor.in_transaction());
    assert!(executor.last_insert_id().unwrap_err().is_connection_error());
}

#[test]
fn close_connection_is_idempotent_and_resets_state() {
    let (mut executor, _log) = mock_executor();
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();
    executor.close_connection();
    executor.close_connection();
    assert!(!executor.is_connected());
    assert!(!executor.in_transaction());
    assert_eq!(executor.pending_len(), 0);
}

#[test]
fn fetch_shapes_and_cursor() {
    let rows = result_set(
        &["id", "name"],
        vec![
            vec![RowValues::Int(1), RowValues::Text("a".into())],
            vec![RowValues::Int(2), RowValues::Text("b".into())],
            vec![RowValues::Int(3), RowValues::Text("c".into())],
        ],
    );
    let (mock, _log) = MockConnection::new();
    let mut executor = executor_with(
        mock.with_result("SELECT id, name FROM t", rows),
        ReplayPolicy::Deferred,
    );
    let q = "SELECT id, name FROM t";

    let first = executor
        .query_row(q, &Attributes::new(), FetchShape::Associative)
        .unwrap()
        .unwrap();
    assert_eq!(first.get("name"), Some(&RowValues::Text("a".into())));
    assert_eq!(first.get_by_index(0), None);

    let second = executor.fetch_row(FetchShape::Both).unwrap();
    assert_eq!(second.get("id"), Some(&RowValues::Int(2)));
    assert_eq!(second.get_by_index(1), Some(&RowValues::Text("b".into())));

    let all = executor.query_all(q, &Attributes::new(), FetchShape::Numeric).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].as_numeric().unwrap()[0], RowValues::Int(3));
    assert!(executor.fetch_row(FetchShape::Numeric).is_none());

    let ids = executor.query_column(q, &Attributes::new()).unwrap();
    assert_eq!(ids, vec![RowValues::Int(1), RowValues::Int(2), RowValues::Int(3)]);
    assert_eq!(executor.last_query(), Some(q));
}

#[test]
fn empty_results_are_empty_not_errors() {
    let (mock, _log) = MockConnection::new();
    let mut executor = executor_with(
        mock.with_result("SELECT id FROM t", result_set(&["id"], Vec::new())),
        ReplayPolicy::Deferred,
    );
    let q = "SELECT id FROM t";
    assert!(executor.query_all(q, &Attributes::new(), FetchShape::Associative).unwrap().is_empty());
    assert!(executor.query_row(q, &Attributes::new(), FetchShape::Numeric).unwrap().is_none());
    assert!(executor.query_column(q, &Attributes::new()).unwrap().is_empty());
    assert!(executor.query_one(q, &Attributes::new()).unwrap().is_none());
}

#[test]
fn drop_with_open_transaction_rolls_back() {
    let (mut executor, log) = mock_executor();
    executor.begin_transaction().unwrap();
    insert(&mut executor, 1).unwrap();
    drop(executor);
    assert!(log.executed().is_empty());
    assert_eq!(log.count(&DriverCall::Rollback), 1);
}

#[test]
fn last_insert_id_comes_from_the_driver() {
    let (mut executor, log) = mock_executor();
    insert(&mut executor, 1).unwrap();
    assert_eq!(executor.last_insert_id().unwrap(), "1");
    assert_eq!(log.count(&DriverCall::LastInsertId), 1);
}

#[test]
fn last_insert_id_is_refused_while_inserts_are_queued() {
    let (mut executor, log) = mock_executor();
    executor.begin_transaction().unwrap();
    assert_eq!(executor.last_insert_id().unwrap(), "0");
    insert(&mut executor, 1).unwrap();

    let err = executor.last_insert_id().unwrap_err();
    assert!(err.is_state_error());
    assert_eq!(log.count(&DriverCall::LastInsertId), 1);

    executor.commit().unwrap();
    assert_eq!(executor.last_insert_id().unwrap(), "1");
}

#[test]
fn deferred_statement_with_unbound_placeholder_is_rejected_at_execute() {
    let (mut executor, log) = mock_executor();
    executor.begin_transaction().unwrap();
    let err = executor
        .execute("INSERT INTO t (a, b) VALUES (:a, :b)", &attributes! { "a" => 1 })
        .unwrap_err();
    assert_eq!(err.code(), Some("HY093"));
    assert_eq!(executor.pending_len(), 0);
    assert!(executor.in_transaction());
    executor.commit().unwrap();
    assert!(log.executed().is_empty());
}
