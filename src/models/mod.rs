//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod attendance;
pub mod event;
pub mod page;
pub mod session;

// Re-export commonly used models
pub use attendance::{
    AttendanceEntry, AttendanceFilter, AttendanceRecord, AttendanceSort, AttendanceSortField,
    NewAttendanceRecord, SessionAttendanceSummary, SortDirection,
};
pub use event::{
    CreateEventRequest, Event, EventParticipant, EventStatus, ParticipationStatus,
    RegisterStudentRequest, Student,
};
pub use page::{Page, PageRequest};
pub use session::{CreateSessionRequest, EventSession, SessionStatus};
