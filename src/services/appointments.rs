use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, Notification};
use crate::services::notifications;

const TIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

/// Books an appointment for the given user. New appointments always start
/// PENDING; there is no overlap or double-booking check.
pub fn book(
    conn: &Connection,
    user_id: i64,
    service_type: &str,
    appointment_time: &str,
) -> Result<Appointment, AppError> {
    if service_type.trim().is_empty() {
        return Err(AppError::Validation("service_type must not be empty".to_string()));
    }
    let time = NaiveDateTime::parse_from_str(appointment_time, TIME_FMT).map_err(|_| {
        AppError::Validation(format!(
            "appointment_time must be formatted as {TIME_FMT}"
        ))
    })?;

    let appointment = queries::create_appointment(conn, user_id, service_type, time)?;
    tracing::info!(
        appointment_id = appointment.id,
        user_id,
        service_type,
        "appointment booked"
    );
    Ok(appointment)
}

/// Moves a pending appointment to APPROVED or REJECTED and notifies the
/// owner. An appointment that has already been decided cannot be moved
/// again.
pub fn decide(
    conn: &Connection,
    appointment_id: i64,
    decision: &str,
) -> Result<(Appointment, Notification), AppError> {
    let status = AppointmentStatus::parse(decision)
        .filter(AppointmentStatus::is_decision)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "status must be APPROVED or REJECTED, got {decision:?}"
            ))
        })?;

    let appointment = queries::get_appointment(conn, appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    if appointment.status != AppointmentStatus::Pending {
        return Err(AppError::Validation(format!(
            "appointment {appointment_id} is already {}",
            appointment.status.as_str()
        )));
    }

    queries::update_appointment_status(conn, appointment_id, status)?;
    let updated = queries::get_appointment(conn, appointment_id)?
        .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    let notification = notifications::notify(
        conn,
        appointment.user_id,
        &format!("Your appointment is {}", status.as_str()),
    )?;

    tracing::info!(
        appointment_id,
        status = status.as_str(),
        owner = appointment.user_id,
        "appointment decided"
    );
    Ok((updated, notification))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Role;
    use crate::services::auth;

    fn test_conn() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn seed_user(conn: &Connection) -> i64 {
        auth::register(conn, "bob", "bob@example.com", "pw", Role::User)
            .unwrap()
            .id
    }

    #[test]
    fn booking_is_always_pending() {
        let conn = test_conn();
        let user_id = seed_user(&conn);
        let appt = book(&conn, user_id, "Coloring", "2026-09-01 10:00:00").unwrap();
        assert_eq!(appt.status, AppointmentStatus::Pending);
    }

    #[test]
    fn booking_rejects_malformed_input() {
        let conn = test_conn();
        let user_id = seed_user(&conn);
        assert!(matches!(
            book(&conn, user_id, "  ", "2026-09-01 10:00:00"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            book(&conn, user_id, "Haircut", "tomorrow at noon"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn decide_creates_one_unread_notification() {
        let conn = test_conn();
        let user_id = seed_user(&conn);
        let appt = book(&conn, user_id, "Haircut", "2026-09-01 10:00:00").unwrap();

        let (updated, notification) = decide(&conn, appt.id, "APPROVED").unwrap();
        assert_eq!(updated.status, AppointmentStatus::Approved);
        assert!(!notification.read);
        assert_eq!(notification.message, "Your appointment is APPROVED");

        let unread = queries::list_unread_notifications(&conn, user_id).unwrap();
        assert_eq!(unread.len(), 1);
    }

    #[test]
    fn decide_rejects_unknown_appointment() {
        let conn = test_conn();
        assert!(matches!(
            decide(&conn, 999, "APPROVED"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn decide_rejects_non_terminal_status() {
        let conn = test_conn();
        let user_id = seed_user(&conn);
        let appt = book(&conn, user_id, "Haircut", "2026-09-01 10:00:00").unwrap();
        assert!(matches!(
            decide(&conn, appt.id, "PENDING"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            decide(&conn, appt.id, "CANCELLED"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn decided_appointment_cannot_be_redecided() {
        let conn = test_conn();
        let user_id = seed_user(&conn);
        let appt = book(&conn, user_id, "Haircut", "2026-09-01 10:00:00").unwrap();

        decide(&conn, appt.id, "REJECTED").unwrap();
        assert!(matches!(
            decide(&conn, appt.id, "APPROVED"),
            Err(AppError::Validation(_))
        ));

        // Only the first decision produced a notification.
        let unread = queries::list_unread_notifications(&conn, user_id).unwrap();
        assert_eq!(unread.len(), 1);
    }
}
