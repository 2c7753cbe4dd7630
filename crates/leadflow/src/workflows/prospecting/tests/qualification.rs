use super::common::*;
use chrono::Duration;

use crate::workflows::prospecting::domain::{CallOutcome, ContactStatus};
use crate::workflows::prospecting::qualification::{
    note_entry, qualify, QualificationError, ValidationError,
};
use crate::workflows::prospecting::ProspectingCatalog;

#[test]
fn callback_outcome_sets_date_and_builds_audit_records() {
    let contact = contact("c-1");
    let transition = qualify(
        &contact,
        &callback_request("agent-1", tomorrow()),
        ProspectingCatalog::standard(),
        now(),
    )
    .expect("callback accepted");

    assert_eq!(transition.previous_status, ContactStatus::New);
    assert_eq!(transition.status, ContactStatus::CallbackLater);
    assert_eq!(transition.next_action_date, Some(tomorrow()));
    assert_eq!(transition.call_count, 1);
    assert_eq!(transition.last_contact_at, now());
    assert_eq!(transition.expected_version, contact.version);
    assert_eq!(transition.call_event.outcome, CallOutcome::CallbackLater);
    assert_eq!(transition.history.previous_status, Some(ContactStatus::New));
    assert_eq!(transition.history.new_status, ContactStatus::CallbackLater);
    assert_eq!(transition.history.actor, agent_id("agent-1"));
}

#[test]
fn callback_statuses_reject_missing_or_past_dates() {
    let contact = contact("c-1");
    for outcome in [CallOutcome::CallbackLater, CallOutcome::FollowUp] {
        let missing = request("agent-1", outcome);
        assert_eq!(
            qualify(&contact, &missing, ProspectingCatalog::standard(), now()),
            Err(QualificationError::Validation(
                ValidationError::MissingOrInvalidDate {
                    field: "next_action_date"
                }
            ))
        );

        let mut past = request("agent-1", outcome);
        past.fields.next_action_date = Some(now() - Duration::hours(1));
        assert!(qualify(&contact, &past, ProspectingCatalog::standard(), now()).is_err());

        let mut exactly_now = request("agent-1", outcome);
        exactly_now.fields.next_action_date = Some(now());
        assert!(qualify(&contact, &exactly_now, ProspectingCatalog::standard(), now()).is_err());
    }
}

#[test]
fn out_of_target_requires_a_configured_reason() {
    let contact = contact("c-1");
    let catalog = ProspectingCatalog::standard();

    let missing = request("agent-1", CallOutcome::OutOfTarget);
    let err = qualify(&contact, &missing, catalog, now()).expect_err("reason required");
    assert_eq!(
        err,
        QualificationError::Validation(ValidationError::MissingSubReason)
    );

    let mut unknown = request("agent-1", CallOutcome::OutOfTarget);
    unknown.fields.sub_reason = Some("too_far".to_string());
    assert!(qualify(&contact, &unknown, catalog, now()).is_err());

    for reason in &catalog.out_of_target_reasons {
        let mut valid = request("agent-1", CallOutcome::OutOfTarget);
        valid.fields.sub_reason = Some(reason.code.clone());
        let transition = qualify(&contact, &valid, catalog, now()).expect("reason accepted");
        assert_eq!(transition.status, ContactStatus::OutOfTarget);
        assert_eq!(transition.sub_status.as_deref(), Some(reason.code.as_str()));
        assert_eq!(transition.history.reason.as_deref(), Some(reason.code.as_str()));
    }
}

#[test]
fn exclusion_outcomes_latch_do_not_contact() {
    for outcome in [CallOutcome::Blacklisted, CallOutcome::RefusArgu] {
        let transition = qualify(
            &contact("c-1"),
            &request("agent-1", outcome),
            ProspectingCatalog::standard(),
            now(),
        )
        .expect("exclusion accepted");
        assert!(transition.do_not_contact);
    }
}

#[test]
fn excluded_contacts_reject_every_outcome() {
    let mut contact = contact("c-1");
    let blacklist = qualify(
        &contact,
        &request("agent-1", CallOutcome::Blacklisted),
        ProspectingCatalog::standard(),
        now(),
    )
    .expect("blacklist accepted");
    blacklist.apply_to(&mut contact);

    for outcome in CallOutcome::ordered() {
        let mut attempt = request("agent-1", outcome);
        attempt.fields.next_action_date = Some(tomorrow());
        attempt.fields.sub_reason = Some("outside_zone".to_string());
        assert_eq!(
            qualify(&contact, &attempt, ProspectingCatalog::standard(), now()),
            Err(QualificationError::ContactExcluded)
        );
    }
    assert_eq!(contact.status, ContactStatus::Blacklisted);
}

#[test]
fn leaving_a_callback_status_clears_stale_fields() {
    let mut contact = contact("c-1");
    qualify(
        &contact,
        &callback_request("agent-1", tomorrow()),
        ProspectingCatalog::standard(),
        now(),
    )
    .expect("callback accepted")
    .apply_to(&mut contact);

    let transition = qualify(
        &contact,
        &request("agent-1", CallOutcome::Nrp),
        ProspectingCatalog::standard(),
        now() + Duration::days(2),
    )
    .expect("nrp accepted");
    transition.apply_to(&mut contact);

    assert_eq!(contact.status, ContactStatus::Nrp);
    assert_eq!(contact.next_action_date, None);
    assert_eq!(contact.sub_status, None);
    assert_eq!(contact.call_count, 2);
    assert_eq!(contact.version, 2);
    assert!(contact.invariant_violation().is_none());
}

#[test]
fn every_accepted_outcome_keeps_record_invariants() {
    let catalog = ProspectingCatalog::standard();
    for outcome in CallOutcome::ordered() {
        let mut attempt = request("agent-1", outcome);
        attempt.fields.next_action_date = Some(tomorrow());
        attempt.fields.sub_reason = Some("company_too_small".to_string());

        let mut contact = contact("c-1");
        qualify(&contact, &attempt, catalog, now())
            .expect("outcome accepted")
            .apply_to(&mut contact);

        assert_eq!(contact.status, outcome.resulting_status());
        assert!(contact.invariant_violation().is_none(), "{outcome:?}");
        assert!(contact.lease.is_none());
    }
}

#[test]
fn notes_require_text_and_keep_status() {
    let contact = contact("c-1");
    assert_eq!(
        note_entry(&contact, &agent_id("agent-1"), "   ", now()),
        Err(ValidationError::EmptyNote)
    );

    let entry = note_entry(&contact, &agent_id("agent-1"), " rappeler le DAF ", now())
        .expect("note accepted");
    assert_eq!(entry.previous_status, Some(ContactStatus::New));
    assert_eq!(entry.new_status, ContactStatus::New);
    assert_eq!(entry.reason.as_deref(), Some("rappeler le DAF"));
}
