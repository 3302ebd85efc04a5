//! End-to-end runs of the sync against in-memory stores and a mock list API.

mod common;
mod mocks;

use common::*;
use mailchimp_sync::constants::{end_url, NOTHING_TO_SYNC_MESSAGE};
use mailchimp_sync::database::SyncStatusStore;
use mailchimp_sync::form::{state_param, FormOutcome, SyncForm};
use mailchimp_sync::messaging::WorkQueue;
use mailchimp_sync::models::{Contact, Grouping, SyncRecord, SyncStats, SyncTarget};
use mailchimp_sync::orchestration::{ErrorMode, StepOutcome, SyncStart};
use mailchimp_sync::state_machine::BatchTaskState;
use mailchimp_sync::SyncStatus;
use mocks::MockListApi;
use std::sync::Arc;

#[tokio::test]
async fn test_full_run_covers_every_member_once() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 25)
        .build();
    let api = Arc::new(MockListApi::new());
    let harness = TestHarness::new(contacts, api.clone(), &config_with(10, ErrorMode::Abort));

    let SyncStart::Queued { total, tasks } = harness.service.start().await.unwrap() else {
        panic!("expected a queued run");
    };
    assert_eq!(total, 25);
    let offsets: Vec<i64> = tasks.iter().map(|t| t.offset).collect();
    assert_eq!(offsets, vec![0, 10, 20]);
    assert_eq!(harness.service.queue().len().await.unwrap(), 3);

    let outcome = harness.service.run().await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.completed.len(), 3);
    assert!(outcome
        .completed
        .iter()
        .all(|run| run.state == BatchTaskState::Completed));
    assert_eq!(outcome.end_url.as_deref(), Some(end_url().as_str()));

    assert_eq!(api.batch_sizes(), vec![10, 10, 5]);
    let mut submitted = api.submitted_emails();
    submitted.sort();
    submitted.dedup();
    assert_eq!(submitted.len(), 25);

    let stats = harness.service.stats().await.unwrap();
    assert_eq!(
        stats,
        SyncStats {
            added: 25,
            updated: 0,
            errors: 0
        }
    );
    assert!(harness.service.queue().is_empty().await.unwrap());
}

#[tokio::test]
async fn test_failed_batch_aborts_the_run_and_can_be_resumed() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 25)
        .build();
    let api = Arc::new(MockListApi::new().failing_on_call(2));
    let harness = TestHarness::new(contacts, api.clone(), &config_with(10, ErrorMode::Abort));

    harness.service.start().await.unwrap();
    let outcome = harness.service.run().await.unwrap();

    assert!(outcome.aborted);
    assert_eq!(outcome.completed.len(), 1);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].task.offset, 10);
    assert_eq!(outcome.failed[0].state, BatchTaskState::Failed);
    assert!(outcome.abort_reason().unwrap().contains("Invalid_ApiKey"));
    assert_eq!(outcome.end_url, None);

    // The third batch never ran
    assert_eq!(api.call_count(), 2);
    let records = harness.status.records().await.unwrap();
    assert_eq!(records.len(), 10);
    assert!(records
        .iter()
        .all(|r| r.email_id >= email_id_for(1) && r.email_id <= email_id_for(10)));

    // The failed task and the one after it stay queued
    assert_eq!(harness.service.queue().len().await.unwrap(), 2);

    api.recover();
    let resumed = harness.service.run().await.unwrap();
    assert!(resumed.is_success());
    let resumed_offsets: Vec<i64> = resumed.completed.iter().map(|r| r.task.offset).collect();
    assert_eq!(resumed_offsets, vec![10, 20]);
    assert_eq!(harness.service.stats().await.unwrap().added, 25);
}

#[tokio::test]
async fn test_continue_mode_skips_failed_batch() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 25)
        .build();
    let api = Arc::new(MockListApi::new().failing_on_call(2));
    let harness = TestHarness::new(contacts, api.clone(), &config_with(10, ErrorMode::Continue));

    harness.service.start().await.unwrap();
    let outcome = harness.service.run().await.unwrap();

    assert!(!outcome.aborted);
    assert!(!outcome.is_success());
    assert_eq!(outcome.completed.len(), 2);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(api.call_count(), 3);
    assert_eq!(harness.service.stats().await.unwrap().added, 15);
    assert!(harness.service.queue().is_empty().await.unwrap());
}

#[tokio::test]
async fn test_suppressed_and_email_less_contacts_are_not_sent() {
    let mut opted_out = Contact::new(0, "Opted", "Out");
    opted_out.is_opt_out = true;
    let mut do_not_email = Contact::new(0, "Do Not", "Email");
    do_not_email.do_not_email = true;

    let mut builder = CrmBuilder::new().with_target(SyncTarget::new(1, "list-a"));
    let kept = builder.add_member(1, Contact::new(0, "Kept", "Member"), Some("kept@example.org"));
    builder.add_member(1, opted_out, Some("opted-out@example.org"));
    builder.add_member(1, do_not_email, Some("dne@example.org"));
    builder.add_member(1, Contact::new(0, "No", "Email"), None);
    let contacts = builder.build();

    let api = Arc::new(MockListApi::new());
    let harness = TestHarness::new(contacts, api.clone(), &config_with(10, ErrorMode::Abort));

    harness.service.start().await.unwrap();
    let outcome = harness.service.run().await.unwrap();

    let report = outcome.completed[0].report.clone().unwrap();
    assert_eq!(report.members, 4);
    assert_eq!(report.suppressed, 2);
    assert_eq!(report.without_email, 1);
    assert_eq!(report.submitted, 1);

    assert_eq!(api.submitted_emails(), vec!["kept@example.org".to_string()]);
    let records = harness.status.records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].email_id, email_id_for(kept));
}

#[tokio::test]
async fn test_rejections_are_recorded_as_errors() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 3)
        .build();
    let api = Arc::new(MockListApi::new().rejecting("1-1@example.org"));
    let harness = TestHarness::new(contacts, api, &config_with(10, ErrorMode::Abort));

    harness.service.sync().await.unwrap().unwrap();

    let records = harness.status.records().await.unwrap();
    let rejected: Vec<&SyncRecord> = records
        .iter()
        .filter(|r| r.status == SyncStatus::Error)
        .collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].email_id, email_id_for(2));
    assert_eq!(rejected[0].remote_user_id, None);

    let stats = harness.service.stats().await.unwrap();
    assert_eq!(stats.added, 2);
    assert_eq!(stats.errors, 1);
}

#[tokio::test]
async fn test_second_run_reports_updates() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 4)
        .build();
    let api = Arc::new(MockListApi::new());
    let harness = TestHarness::new(contacts, api, &config_with(10, ErrorMode::Abort));

    harness.service.sync().await.unwrap();
    harness.service.sync().await.unwrap();

    // The status table only reflects the latest run
    let stats = harness.service.stats().await.unwrap();
    assert_eq!(stats.added, 0);
    assert_eq!(stats.updated, 4);
    assert_eq!(harness.status.records().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_each_list_gets_its_own_call_and_grouping() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_target(SyncTarget::new(2, "list-b").with_grouping("Interests", "Volunteers"))
        .with_members(1, 2)
        .with_members(2, 2)
        .build();
    let api = Arc::new(MockListApi::new());
    let harness = TestHarness::new(contacts, api.clone(), &config_with(10, ErrorMode::Abort));

    harness.service.sync().await.unwrap();

    let calls = api.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].list_id, "list-a");
    assert!(calls[0].batch.iter().all(|e| e.merge_vars.groupings.is_empty()));
    assert_eq!(calls[1].list_id, "list-b");
    assert_eq!(
        calls[1].batch[0].merge_vars.groupings,
        vec![Grouping {
            name: "Interests".to_string(),
            groups: vec!["Volunteers".to_string()],
        }]
    );
    assert!(calls[0].options.update_existing);
    assert!(!calls[0].options.double_optin);

    let records = harness.status.records().await.unwrap();
    assert_eq!(records.iter().filter(|r| r.list_id == "list-a").count(), 2);
    assert_eq!(records.iter().filter(|r| r.list_id == "list-b").count(), 2);
}

#[tokio::test]
async fn test_nothing_to_sync_leaves_status_table_alone() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .build();
    let api = Arc::new(MockListApi::new());
    let harness = TestHarness::new(contacts, api.clone(), &config_with(10, ErrorMode::Abort));

    let previous = SyncRecord::new(42, "list-a", SyncStatus::Added);
    harness.status.create(&previous).await.unwrap();

    let form = SyncForm::new(&harness.service);
    let outcome = form.post_process().await.unwrap();

    assert_eq!(outcome, FormOutcome::Notice(NOTHING_TO_SYNC_MESSAGE.to_string()));
    assert_eq!(harness.status.records().await.unwrap(), vec![previous]);
    assert_eq!(api.call_count(), 0);
}

#[tokio::test]
async fn test_unmapped_groups_are_not_counted() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, ""))
        .with_members(1, 5)
        .build();
    let harness = TestHarness::new(
        contacts,
        Arc::new(MockListApi::new()),
        &config_with(10, ErrorMode::Abort),
    );

    assert!(matches!(
        harness.service.start().await.unwrap(),
        SyncStart::NothingToSync { .. }
    ));
}

#[tokio::test]
async fn test_new_run_truncates_previous_results() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 2)
        .build();
    let harness = TestHarness::new(
        contacts,
        Arc::new(MockListApi::new()),
        &config_with(10, ErrorMode::Abort),
    );

    harness
        .status
        .create(&SyncRecord::new(42, "old-list", SyncStatus::Error))
        .await
        .unwrap();

    harness.service.start().await.unwrap();
    assert!(harness.status.records().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_start_discards_leftover_queue_items() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 15)
        .build();
    let api = Arc::new(MockListApi::new().failing_on_call(1));
    let harness = TestHarness::new(contacts, api.clone(), &config_with(10, ErrorMode::Abort));

    harness.service.start().await.unwrap();
    harness.service.run().await.unwrap();
    assert_eq!(harness.service.queue().len().await.unwrap(), 2);

    api.recover();
    harness.service.start().await.unwrap();
    assert_eq!(harness.service.queue().len().await.unwrap(), 2);

    let outcome = harness.service.run().await.unwrap();
    assert!(outcome.is_success());
    assert_eq!(harness.service.stats().await.unwrap().added, 15);
}

#[tokio::test]
async fn test_step_by_step_run() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 12)
        .build();
    let harness = TestHarness::new(
        contacts,
        Arc::new(MockListApi::new()),
        &config_with(5, ErrorMode::Abort),
    );

    harness.service.start().await.unwrap();

    let mut labels = Vec::new();
    loop {
        match harness.service.run_next().await.unwrap() {
            StepOutcome::Completed(run) => labels.push(run.task.label),
            StepOutcome::Failed(run) => panic!("unexpected failure: {:?}", run.error),
            StepOutcome::QueueEmpty => break,
        }
    }

    assert_eq!(
        labels,
        vec![
            "Mailchimp Sync - Contacts 5 of 12",
            "Mailchimp Sync - Contacts 10 of 12",
            "Mailchimp Sync - Contacts 15 of 12",
        ]
    );
    assert_eq!(harness.service.stats().await.unwrap().added, 12);
}

#[tokio::test]
async fn test_form_shows_stats_after_the_run() {
    let contacts = CrmBuilder::new()
        .with_target(SyncTarget::new(1, "list-a"))
        .with_members(1, 3)
        .build();
    let api = Arc::new(MockListApi::new().rejecting("1-0@example.org"));
    let harness = TestHarness::new(contacts, api, &config_with(10, ErrorMode::Abort));
    let form = SyncForm::new(&harness.service);

    let FormOutcome::Ran(outcome) = form.post_process().await.unwrap() else {
        panic!("expected the run to start");
    };

    let state = outcome.end_url.as_deref().and_then(state_param);
    assert_eq!(state.as_deref(), Some("done"));

    let stats = form.pre_process(state.as_deref()).await.unwrap().unwrap();
    assert_eq!(stats.added, 2);
    assert_eq!(stats.updated, 0);
    assert_eq!(stats.errors, 1);

    assert_eq!(form.pre_process(None).await.unwrap(), None);
    assert_eq!(form.pre_process(Some("running")).await.unwrap(), None);
}
