//! Session lifecycle integration tests

mod helpers;

use assert_matches::assert_matches;
use chrono::Duration;
use serial_test::serial;

use helpers::*;
use OrgHub::models::SessionStatus;
use OrgHub::services::token::CLAIM_SESSION_ID;
use OrgHub::OrgHubError;

#[tokio::test]
#[serial]
async fn test_create_session_starts_pending_with_admin_token() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let event = ctx
        .services
        .event_service
        .create_event("Compilers", session_day())
        .await
        .unwrap();

    let session = ctx
        .services
        .session_service
        .create_session(event.id, "  Parsing   workshop ", session_day(), at(14, 0), at(16, 0))
        .await
        .unwrap();

    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.name, "Parsing workshop");
    assert_eq!(session.event_id, event.id);

    let token = session.qr_token_code.expect("admin token stored");
    assert_eq!(ctx.services.qr_service.extract_session_id(&token), Some(session.id));
    assert_eq!(ctx.services.qr_service.extract_student_id(&token), None);
    let claims = ctx.services.qr_service.codec().verify(&token).unwrap();
    assert_eq!(claims.get_i64(CLAIM_SESSION_ID), Some(session.id));
}

#[tokio::test]
#[serial]
async fn test_create_session_validates_input() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let event = ctx
        .services
        .event_service
        .create_event("Compilers", session_day())
        .await
        .unwrap();
    let sessions = &ctx.services.session_service;

    assert_matches!(
        sessions.create_session(event.id, "Backwards", session_day(), at(11, 0), at(10, 0)).await,
        Err(OrgHubError::InvalidTimeRange { .. })
    );
    assert_matches!(
        sessions.create_session(event.id, "Empty", session_day(), at(10, 0), at(10, 0)).await,
        Err(OrgHubError::InvalidTimeRange { .. })
    );
    assert_matches!(
        sessions.create_session(event.id, "   ", session_day(), at(10, 0), at(11, 0)).await,
        Err(OrgHubError::InvalidInput(_))
    );
    assert_matches!(
        sessions.create_session(9999, "Orphan", session_day(), at(10, 0), at(11, 0)).await,
        Err(OrgHubError::EventNotFound { event_id: 9999 })
    );

    // Nothing half-created
    assert_eq!(ctx.database.count_records("event_sessions").await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn test_strict_transitions() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (_, session) = ctx.event_with_session(SessionStatus::Pending).await;
    let sessions = &ctx.services.session_service;

    assert_matches!(
        sessions.set_status(session.id, SessionStatus::Completed).await,
        Err(OrgHubError::InvalidStateTransition {
            from: SessionStatus::Pending,
            to: SessionStatus::Completed
        })
    );

    let active = sessions.set_status(session.id, SessionStatus::Active).await.unwrap();
    assert_eq!(active.status, SessionStatus::Active);

    // Pause and resume
    let paused = sessions.set_status(session.id, SessionStatus::Pending).await.unwrap();
    assert_eq!(paused.status, SessionStatus::Pending);
    sessions.set_status(session.id, SessionStatus::Active).await.unwrap();

    let completed = sessions.set_status(session.id, SessionStatus::Completed).await.unwrap();
    assert_eq!(completed.status, SessionStatus::Completed);

    for next in [SessionStatus::Pending, SessionStatus::Active] {
        assert_matches!(
            sessions.set_status(session.id, next).await,
            Err(OrgHubError::InvalidStateTransition { from: SessionStatus::Completed, .. })
        );
    }
    assert!(sessions.set_status(session.id, SessionStatus::Completed).await.is_ok());
}

#[tokio::test]
#[serial]
async fn test_loose_transitions_allow_reopening() {
    let Some(ctx) = TestContext::try_new_with(|s| s.attendance.strict_transitions = false).await else {
        return;
    };
    let (_, session) = ctx.event_with_session(SessionStatus::Pending).await;
    let sessions = &ctx.services.session_service;

    let completed = sessions.set_status(session.id, SessionStatus::Completed).await.unwrap();
    assert_eq!(completed.status, SessionStatus::Completed);
    let reopened = sessions.set_status(session.id, SessionStatus::Active).await.unwrap();
    assert_eq!(reopened.status, SessionStatus::Active);
}

#[tokio::test]
#[serial]
async fn test_set_status_from_string() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (_, session) = ctx.event_with_session(SessionStatus::Pending).await;
    let sessions = &ctx.services.session_service;

    let active = sessions.set_status_str(session.id, " active ").await.unwrap();
    assert_eq!(active.status, SessionStatus::Active);

    assert_matches!(
        sessions.set_status_str(session.id, "ARCHIVED").await,
        Err(OrgHubError::InvalidStatus(value)) if value == "ARCHIVED"
    );
    assert_matches!(
        sessions.set_status_str(777, "ACTIVE").await,
        Err(OrgHubError::SessionNotFound { session_id: 777 })
    );
}

#[tokio::test]
#[serial]
async fn test_is_active_requires_status_and_window() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (_, session) = ctx.event_with_session(SessionStatus::Pending).await;
    let sessions = &ctx.services.session_service;

    assert!(!sessions.is_active(session.id).await.unwrap());

    ctx.activate(session.id).await;
    assert!(sessions.is_active(session.id).await.unwrap());

    // Start and end are exclusive
    ctx.clock.set(default_now() - Duration::minutes(30));
    assert!(!sessions.is_active(session.id).await.unwrap());
    ctx.clock.set(default_now() + Duration::minutes(30));
    assert!(!sessions.is_active(session.id).await.unwrap());

    // Same time of day, next day
    ctx.clock.set(default_now() + Duration::days(1));
    assert!(!sessions.is_active(session.id).await.unwrap());

    assert_matches!(
        sessions.is_active(31337).await,
        Err(OrgHubError::SessionNotFound { .. })
    );
}

#[tokio::test]
#[serial]
async fn test_list_sessions_for_event() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (event_id, first) = ctx.event_with_session(SessionStatus::Pending).await;
    let sessions = &ctx.services.session_service;

    let next_day = session_day().succ_opt().unwrap();
    let early = sessions
        .create_session(event_id, "Morning lab", session_day(), at(8, 0), at(9, 0))
        .await
        .unwrap();
    let later = sessions
        .create_session(event_id, "Follow-up", next_day, at(8, 0), at(9, 0))
        .await
        .unwrap();

    let all: Vec<i64> = sessions
        .list_sessions_for_event(event_id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(all, vec![early.id, first.id, later.id]);

    let on_day: Vec<i64> = sessions
        .list_sessions_for_event_on(event_id, session_day())
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(on_day, vec![early.id, first.id]);

    assert_eq!(sessions.get_session(later.id).await.unwrap().name, "Follow-up");
}

#[tokio::test]
#[serial]
async fn test_refresh_qr_token_only_after_expiry() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (_, session) = ctx.event_with_session(SessionStatus::Pending).await;
    let sessions = &ctx.services.session_service;
    let original = session.qr_token_code.clone().unwrap();

    let unchanged = sessions.refresh_qr_token(session.id).await.unwrap();
    assert_eq!(unchanged.qr_token_code.as_deref(), Some(original.as_str()));

    ctx.clock.advance(Duration::hours(25));
    let refreshed = sessions.refresh_qr_token(session.id).await.unwrap();
    let token = refreshed.qr_token_code.unwrap();
    assert_ne!(token, original);
    assert!(!ctx.services.qr_service.codec().is_expired(&token));
    assert_eq!(ctx.services.qr_service.extract_session_id(&token), Some(session.id));
}

#[tokio::test]
#[serial]
async fn test_timestamps_follow_injected_clock() {
    let Some(ctx) = TestContext::try_new().await else { return };
    let (event_id, session) = ctx.event_with_session(SessionStatus::Pending).await;
    assert_eq!(session.created_at, default_now());
    assert_eq!(session.updated_at, default_now());

    let event = ctx.services.event_service.get_event(event_id).await.unwrap();
    assert_eq!(event.created_at, default_now());

    ctx.clock.advance(Duration::minutes(5));
    let active = ctx.activate(session.id).await;
    assert_eq!(active.created_at, default_now());
    assert_eq!(active.updated_at, default_now() + Duration::minutes(5));

    ctx.enroll(event_id, "S-0001", "Ada Lovelace").await;
    let participants = ctx.services.event_service.list_participants(event_id).await.unwrap();
    assert_eq!(participants[0].joined_at, default_now() + Duration::minutes(5));
}
