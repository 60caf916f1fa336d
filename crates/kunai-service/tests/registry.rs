mod common;

use chrono::{TimeDelta, Weekday};
use kunai_core::types::MeetingId;
use kunai_service::error::ServiceError;
use kunai_service::exception::Override;
use kunai_service::meeting::{OccurrenceKey, OccurrenceStatus, Schedule};
use kunai_service::registry::MeetingRegistry;
use kunai_text::temporal::Ambiguity;
use kunai_time::{RecurrenceRule, TimeWindow};

use common::{alice, bob, date, one_off_spec, recurring_spec, standup, utc};

fn registry() -> MeetingRegistry {
    MeetingRegistry::new(TimeDelta::seconds(120))
}

fn occurrence_dates(registry: &MeetingRegistry, id: MeetingId) -> Vec<chrono::NaiveDate> {
    let snapshot = registry.snapshot().unwrap();
    let meeting = snapshot.meetings.iter().find(|m| m.id == id).unwrap();
    snapshot
        .exceptions
        .effective_in(meeting, TimeWindow::new(utc(2026, 10, 19, 0, 0), utc(2026, 11, 2, 0, 0)))
        .into_iter()
        .filter_map(|o| o.key.date())
        .collect()
}

#[test]
fn uncertain_draft_is_refused() {
    let registry = registry();
    let mut spec = one_off_spec("Lunch", utc(2026, 10, 21, 16, 0));
    spec.confident = false;
    spec.ambiguities.push(Ambiguity::InferredDate);

    let err = registry.create(&alice(), spec.clone(), utc(2026, 10, 20, 13, 0)).unwrap_err();
    assert!(matches!(err, ServiceError::ParseAmbiguous(_)));
    assert!(registry.is_empty().unwrap());

    registry.create(&alice(), spec.confirm(), utc(2026, 10, 20, 13, 0)).unwrap();
    assert_eq!(registry.len().unwrap(), 1);
}

#[test]
fn cancelling_one_occurrence_keeps_the_rest() {
    let registry = registry();
    let meeting = standup(&registry);
    registry.cancel_instance(&alice(), meeting.id, date(2026, 10, 21)).unwrap();

    assert_eq!(
        occurrence_dates(&registry, meeting.id),
        vec![date(2026, 10, 19), date(2026, 10, 26), date(2026, 10, 28)]
    );
    assert_eq!(
        registry.exception(meeting.id, date(2026, 10, 21)).unwrap(),
        Some(Override::Cancelled)
    );
}

#[test]
fn rescheduling_the_series_clears_exceptions() {
    let registry = registry();
    let meeting = standup(&registry);
    registry.cancel_instance(&alice(), meeting.id, date(2026, 10, 21)).unwrap();
    registry
        .reschedule_instance(&alice(), meeting.id, date(2026, 10, 26), utc(2026, 10, 27, 9, 0))
        .unwrap();
    assert!(registry.has_exceptions(meeting.id).unwrap());

    let Schedule::Recurring(rule) = meeting.schedule else {
        panic!("standup is recurring");
    };
    let later = RecurrenceRule::new(
        rule.cadence,
        chrono::NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
        rule.timezone,
        rule.anchor,
    )
    .unwrap();
    let updated = registry.reschedule_series(&alice(), meeting.id, later).unwrap();

    assert_eq!(updated.schedule, Schedule::Recurring(later));
    assert!(!registry.has_exceptions(meeting.id).unwrap());
    assert_eq!(
        occurrence_dates(&registry, meeting.id),
        vec![date(2026, 10, 19), date(2026, 10, 21), date(2026, 10, 26), date(2026, 10, 28)]
    );
}

#[test]
fn instance_edits_are_validated() {
    let registry = registry();
    let meeting = standup(&registry);
    let dentist = registry
        .create(&alice(), one_off_spec("Dentist", utc(2026, 10, 22, 15, 0)), utc(2026, 10, 1, 0, 0))
        .unwrap();

    // Tuesday is not a standup day
    assert!(matches!(
        registry.cancel_instance(&alice(), meeting.id, date(2026, 10, 20)),
        Err(ServiceError::NotFound(_))
    ));
    // Before the anchor
    assert!(matches!(
        registry.cancel_instance(&alice(), meeting.id, date(2026, 10, 14)),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        registry.cancel_instance(&alice(), dentist.id, date(2026, 10, 22)),
        Err(ServiceError::InvalidOperation(_))
    ));
    assert!(matches!(
        registry.reschedule_series(&alice(), dentist.id, match meeting.schedule {
            Schedule::Recurring(rule) => rule,
            Schedule::OneOff { .. } => unreachable!(),
        }),
        Err(ServiceError::InvalidOperation(_))
    ));
    assert!(matches!(
        registry.reschedule_one_off(&alice(), meeting.id, utc(2026, 10, 22, 15, 0)),
        Err(ServiceError::InvalidOperation(_))
    ));
}

#[test]
fn only_the_owner_may_edit() {
    let registry = registry();
    let meeting = standup(&registry);

    assert!(matches!(
        registry.cancel_instance(&bob(), meeting.id, date(2026, 10, 21)),
        Err(ServiceError::NotOwner(id)) if id == meeting.id
    ));
    assert!(matches!(registry.delete(&bob(), meeting.id), Err(ServiceError::NotOwner(_))));
    assert!(registry.get(meeting.id).is_ok());

    registry.delete(&alice(), meeting.id).unwrap();
    assert!(matches!(registry.get(meeting.id), Err(ServiceError::NotFound(_))));
}

#[test]
fn one_off_moves_directly() {
    let registry = registry();
    let dentist = registry
        .create(&alice(), one_off_spec("Dentist", utc(2026, 10, 22, 15, 0)), utc(2026, 10, 1, 0, 0))
        .unwrap();
    let moved = registry
        .reschedule_one_off(&alice(), dentist.id, utc(2026, 10, 23, 15, 0))
        .unwrap();
    assert_eq!(
        moved.schedule,
        Schedule::OneOff {
            at: utc(2026, 10, 23, 15, 0),
            timezone: chrono_tz::UTC
        }
    );
    let next = registry.next_effective(dentist.id, utc(2026, 10, 22, 0, 0)).unwrap().unwrap();
    assert_eq!(next.key, OccurrenceKey::Single);
    assert_eq!(next.status, OccurrenceStatus::Normal);
}

#[test]
fn list_orders_by_next_occurrence() {
    let registry = registry();
    let now = utc(2026, 10, 20, 13, 0);
    let created = utc(2026, 10, 1, 0, 0);

    let past = registry
        .create(&alice(), one_off_spec("Old review", utc(2026, 10, 1, 10, 0)), created)
        .unwrap();
    let friday = registry
        .create(&alice(), one_off_spec("Demo", utc(2026, 10, 23, 15, 0)), created + TimeDelta::hours(1))
        .unwrap();
    let standup = standup(&registry);
    let thursday = registry
        .create(
            &alice(),
            recurring_spec("Planning", &[Weekday::Thu], 9, chrono_tz::UTC, date(2026, 10, 22)),
            created + TimeDelta::hours(2),
        )
        .unwrap();
    registry
        .create(&bob(), one_off_spec("Not mine", utc(2026, 10, 20, 14, 0)), created)
        .unwrap();

    let listed: Vec<MeetingId> = registry
        .list(&alice(), now)
        .unwrap()
        .into_iter()
        .map(|entry| entry.meeting.id)
        .collect();
    assert_eq!(listed, vec![standup.id, thursday.id, friday.id, past.id]);
}

#[test]
fn clear_all_takes_two_steps() {
    let registry = registry();
    let now = utc(2026, 10, 20, 13, 0);
    let meeting = standup(&registry);
    registry.cancel_instance(&alice(), meeting.id, date(2026, 10, 21)).unwrap();
    registry
        .create(&bob(), one_off_spec("Bob's", utc(2026, 10, 22, 15, 0)), now)
        .unwrap();

    let request = registry.request_clear_all(&alice(), now).unwrap();
    assert_eq!(request.pending, 1);
    assert_eq!(registry.len().unwrap(), 2);

    assert!(matches!(
        registry.confirm_clear_all(&alice(), uuid::Uuid::new_v4(), now),
        Err(ServiceError::InvalidOperation(_))
    ));
    assert_eq!(registry.confirm_clear_all(&alice(), request.token, now).unwrap(), 1);
    assert_eq!(registry.len().unwrap(), 1);
    assert!(!registry.has_exceptions(meeting.id).unwrap());

    // Tokens are single use
    assert!(registry.confirm_clear_all(&alice(), request.token, now).is_err());
}

#[test]
fn clear_all_token_expires() {
    let registry = registry();
    let now = utc(2026, 10, 20, 13, 0);
    standup(&registry);

    let request = registry.request_clear_all(&alice(), now).unwrap();
    assert_eq!(request.expires_at, now + TimeDelta::seconds(120));
    let err = registry
        .confirm_clear_all(&alice(), request.token, now + TimeDelta::seconds(121))
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidOperation(_)));
    assert_eq!(registry.len().unwrap(), 1);
}
