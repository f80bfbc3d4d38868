//! Course publishing lifecycle tests.

use chrono::{Duration, Utc};
use uuid::Uuid;

use domain::{CourseStats, CourseStatus, DomainError, NewCourse};

fn draft_course() -> domain::Course {
    NewCourse {
        title: "  French for Travellers ".to_string(),
        slug: "French-Travel".to_string(),
    }
    .into_course(Uuid::new_v4())
    .unwrap()
}

#[test]
fn test_new_course_is_normalized_draft() {
    let course = draft_course();

    assert_eq!(course.title, "French for Travellers");
    assert_eq!(course.slug, "french-travel");
    assert_eq!(course.status, CourseStatus::Draft);
    assert!(course.published_at.is_none());
}

#[test]
fn test_blank_title_rejected() {
    let result = NewCourse {
        title: "   ".to_string(),
        slug: "x".to_string(),
    }
    .into_course(Uuid::new_v4());

    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[test]
fn test_review_then_publish() {
    let mut course = draft_course();
    let t1 = Utc::now();
    let t2 = t1 + Duration::minutes(5);

    course.transition(CourseStatus::Review, "Editor", t1).unwrap();
    assert!(course.published_by.is_none());

    course.transition(CourseStatus::Published, "Admin", t2).unwrap();
    assert_eq!(course.status, CourseStatus::Published);
    assert_eq!(course.published_at, Some(t2));
    assert_eq!(course.published_by.as_deref(), Some("Admin"));
    assert_eq!(course.updated_at, t2);
}

#[test]
fn test_review_cannot_be_archived() {
    let mut course = draft_course();
    course.transition(CourseStatus::Review, "Editor", Utc::now()).unwrap();

    let err = course
        .transition(CourseStatus::Archived, "Admin", Utc::now())
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
    assert_eq!(course.status, CourseStatus::Review);
}

#[test]
fn test_same_status_is_not_a_transition() {
    for status in [
        CourseStatus::Draft,
        CourseStatus::Review,
        CourseStatus::Published,
        CourseStatus::Archived,
    ] {
        assert!(!status.can_transition_to(status));
    }
}

#[test]
fn test_transition_table_is_exhaustive() {
    use CourseStatus::*;
    let allowed = [
        (Draft, Review),
        (Draft, Published),
        (Draft, Archived),
        (Review, Draft),
        (Review, Published),
        (Published, Draft),
        (Published, Archived),
        (Archived, Draft),
        (Archived, Published),
    ];

    for &from in CourseStatus::ALL {
        for &to in CourseStatus::ALL {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{} -> {}",
                from,
                to
            );
        }
    }
}

#[test]
fn test_archived_course_can_be_republished() {
    let mut course = draft_course();
    let first = Utc::now();
    course.transition(CourseStatus::Published, "Ana", first).unwrap();
    course.transition(CourseStatus::Archived, "Ana", first).unwrap();

    let later = first + Duration::days(1);
    course.transition(CourseStatus::Published, "Ben", later).unwrap();

    assert_eq!(course.published_at, Some(later));
    assert_eq!(course.published_by.as_deref(), Some("Ben"));
}

#[test]
fn test_stats_total_counts_every_status() {
    let mut stats = CourseStats::default();
    stats.record(CourseStatus::Draft, 3);
    stats.record(CourseStatus::Published, 2);
    stats.record(CourseStatus::Archived, 1);

    assert_eq!(stats.draft, 3);
    assert_eq!(stats.review, 0);
    assert_eq!(stats.total, 6);
}
