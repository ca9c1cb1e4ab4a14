//! Attendance ledger repository
//!
//! Append-only: there is no update or delete path. The
//! `uq_attendance_participant_session` constraint is the authority on
//! duplicates; an insert that trips it comes back as `DuplicateCheckIn`.

use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};

use crate::models::attendance::{
    AttendanceEntry, AttendanceFilter, AttendanceRecord, AttendanceSort, AttendanceSortField,
    NewAttendanceRecord, SortDirection,
};
use crate::models::page::{Page, PageRequest};
use crate::utils::errors::OrgHubError;
use crate::utils::helpers::contains_pattern;

/// Unique constraint on (event_participant_id, event_session_id)
pub const PARTICIPANT_SESSION_CONSTRAINT: &str = "uq_attendance_participant_session";

/// Foreign key from a record to its event registration
pub const PARTICIPANT_FK_CONSTRAINT: &str = "attendance_records_event_participant_id_fkey";

const RECORD_COLUMNS: &str = "id, event_participant_id, event_session_id, checked_in_at, qr_token_used";

const ENTRY_SELECT: &str = r#"
    SELECT ar.id, ar.event_participant_id, ar.event_session_id, ar.checked_in_at,
           ep.student_id, st.full_name AS student_name,
           es.name AS session_name, es.session_date,
           ev.id AS event_id, ev.name AS event_name
"#;

const ENTRY_FROM: &str = r#"
    FROM attendance_records ar
    JOIN event_participants ep ON ep.id = ar.event_participant_id
    JOIN students st ON st.student_id = ep.student_id
    JOIN event_sessions es ON es.id = ar.event_session_id
    JOIN events ev ON ev.id = es.event_id
    WHERE 1 = 1
"#;

#[derive(Debug, Clone)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a record. A violation of the participant/session uniqueness
    /// constraint is reported as `DuplicateCheckIn`, never as a raw database error.
    pub async fn insert<'e, E>(executor: E, record: &NewAttendanceRecord) -> Result<AttendanceRecord, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            INSERT INTO attendance_records (event_participant_id, event_session_id, checked_in_at, qr_token_used)
            VALUES ($1, $2, $3, $4)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(record.event_participant_id)
        .bind(record.event_session_id)
        .bind(record.checked_in_at)
        .bind(&record.qr_token_used)
        .fetch_one(executor)
        .await;

        match result {
            Ok(inserted) => Ok(inserted),
            Err(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some(PARTICIPANT_SESSION_CONSTRAINT) =>
            {
                Err(OrgHubError::DuplicateCheckIn {
                    participant_id: record.event_participant_id,
                    session_id: record.event_session_id,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check whether the participant already has a record for the session
    pub async fn exists_by_participant_and_session<'e, E>(
        executor: E,
        participant_id: i64,
        session_id: i64,
    ) -> Result<bool, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM attendance_records WHERE event_participant_id = $1 AND event_session_id = $2)",
        )
        .bind(participant_id)
        .bind(session_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Check whether the participant has checked in to any session
    pub async fn exists_by_participant<'e, E>(executor: E, participant_id: i64) -> Result<bool, OrgHubError>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM attendance_records WHERE event_participant_id = $1)",
        )
        .bind(participant_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    /// Find record by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<AttendanceRecord>, OrgHubError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// All records of one participant, oldest first
    pub async fn find_by_participant_id(&self, participant_id: i64) -> Result<Vec<AttendanceRecord>, OrgHubError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records WHERE event_participant_id = $1 ORDER BY checked_in_at ASC, id ASC"
        ))
        .bind(participant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Records of a session, earliest check-in first
    pub async fn find_by_session_id(
        &self,
        session_id: i64,
        page: PageRequest,
    ) -> Result<Page<AttendanceEntry>, OrgHubError> {
        let filter = AttendanceFilter {
            session_id: Some(session_id),
            ..Default::default()
        };
        let sort = AttendanceSort::new(AttendanceSortField::CheckedInAt, SortDirection::Asc);
        self.search(&filter, sort, page).await
    }

    /// Records of a student across the sessions of one event
    pub async fn find_by_student_and_event(
        &self,
        student_id: &str,
        event_id: i64,
    ) -> Result<Vec<AttendanceEntry>, OrgHubError> {
        let mut query = QueryBuilder::<Postgres>::new(ENTRY_SELECT);
        query.push(ENTRY_FROM);
        query.push(" AND ep.student_id = ").push_bind(student_id.to_string());
        query.push(" AND ev.id = ").push_bind(event_id);
        query.push(" ORDER BY es.session_date ASC, es.start_time ASC, ar.id ASC");

        let entries = query
            .build_query_as::<AttendanceEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    /// Count records of a session
    pub async fn count_by_session_id(&self, session_id: i64) -> Result<i64, OrgHubError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance_records WHERE event_session_id = $1")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Filtered, sorted and paginated scan over joined attendance entries
    pub async fn search(
        &self,
        filter: &AttendanceFilter,
        sort: AttendanceSort,
        page: PageRequest,
    ) -> Result<Page<AttendanceEntry>, OrgHubError> {
        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        count_query.push(ENTRY_FROM);
        push_filters(&mut count_query, filter);
        let (total,) = count_query.build_query_as::<(i64,)>().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(ENTRY_SELECT);
        query.push(ENTRY_FROM);
        push_filters(&mut query, filter);
        // Column and direction come from closed enums, never from caller text.
        query.push(format!(
            " ORDER BY {} {}, ar.id {}",
            sort.field.column(),
            sort.direction.keyword(),
            sort.direction.keyword()
        ));
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let items = query
            .build_query_as::<AttendanceEntry>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, page, total))
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &AttendanceFilter) {
    if let Some(student_id) = &filter.student_id {
        query.push(" AND ep.student_id = ").push_bind(student_id.clone());
    }
    if let Some(name) = filter.student_name.as_deref().filter(|n| !n.trim().is_empty()) {
        query.push(" AND st.full_name ILIKE ").push_bind(contains_pattern(name.trim()));
    }
    if let Some(session_id) = filter.session_id {
        query.push(" AND ar.event_session_id = ").push_bind(session_id);
    }
    if let Some(name) = filter.session_name.as_deref().filter(|n| !n.trim().is_empty()) {
        query.push(" AND es.name ILIKE ").push_bind(contains_pattern(name.trim()));
    }
    if let Some(event_id) = filter.event_id {
        query.push(" AND ev.id = ").push_bind(event_id);
    }
    if let Some(from) = filter.checked_in_from {
        query.push(" AND ar.checked_in_at >= ").push_bind(from);
    }
    if let Some(to) = filter.checked_in_to {
        query.push(" AND ar.checked_in_at <= ").push_bind(to);
    }
}
