use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Notification;

/// Records an unread notification for a user.
pub fn notify(conn: &Connection, user_id: i64, message: &str) -> Result<Notification, AppError> {
    let notification = queries::create_notification(conn, user_id, message)?;
    tracing::debug!(user_id, notification_id = notification.id, "notification created");
    Ok(notification)
}

/// Returns the user's unread notifications in insertion order and marks
/// them read in the same call. Listing is the only read acknowledgement
/// the system has.
pub fn take_unread(conn: &Connection, user_id: i64) -> Result<Vec<Notification>, AppError> {
    let mut unread = queries::list_unread_notifications(conn, user_id)?;
    if !unread.is_empty() {
        queries::mark_notifications_read(conn, user_id)?;
        for n in &mut unread {
            n.read = true;
        }
    }
    Ok(unread)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::Role;
    use crate::services::auth;

    #[test]
    fn take_unread_marks_and_drains() {
        let conn = db::init_db(":memory:").unwrap();
        let user = auth::register(&conn, "carol", "carol@example.com", "pw", Role::User).unwrap();

        notify(&conn, user.id, "first").unwrap();
        notify(&conn, user.id, "second").unwrap();

        let listed = take_unread(&conn, user.id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].message, "first");
        assert!(listed.iter().all(|n| n.read));

        assert!(take_unread(&conn, user.id).unwrap().is_empty());
    }
}
