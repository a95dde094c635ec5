use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Appointment, AppointmentStatus, Notification, Role, Service, User};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}

pub fn format_datetime(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

// ── Users ──

fn map_user(row: &Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role_str).unwrap_or(Role::User),
        created_at: parse_datetime(&created_at_str),
    })
}

pub fn create_user(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> rusqlite::Result<User> {
    let now = Utc::now().naive_utc();
    conn.execute(
        "INSERT INTO users (username, email, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![username, email, password_hash, role.as_str(), format_datetime(now)],
    )?;
    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role,
        created_at: now,
    })
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, email, password_hash, role, created_at
         FROM users WHERE username = ?1",
        params![username],
        map_user,
    )
    .optional()
}

pub fn find_user_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, email, password_hash, role, created_at
         FROM users WHERE id = ?1",
        params![id],
        map_user,
    )
    .optional()
}

pub fn list_users(conn: &Connection) -> rusqlite::Result<Vec<User>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, email, password_hash, role, created_at
         FROM users ORDER BY id",
    )?;
    let rows = stmt.query_map([], map_user)?;
    rows.collect()
}

/// Overwrites the role; returns false when the user id is unknown.
pub fn update_user_role(conn: &Connection, id: i64, role: Role) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE users SET role = ?1 WHERE id = ?2",
        params![role.as_str(), id],
    )?;
    Ok(changed > 0)
}

// ── Appointments ──

fn map_appointment(row: &Row) -> rusqlite::Result<Appointment> {
    let time_str: String = row.get(3)?;
    let status_str: String = row.get(4)?;
    let created_at_str: String = row.get(5)?;
    let updated_at_str: String = row.get(6)?;
    Ok(Appointment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        service_type: row.get(2)?,
        appointment_time: parse_datetime(&time_str),
        status: AppointmentStatus::parse(&status_str).unwrap_or(AppointmentStatus::Pending),
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

pub fn create_appointment(
    conn: &Connection,
    user_id: i64,
    service_type: &str,
    appointment_time: NaiveDateTime,
) -> rusqlite::Result<Appointment> {
    let now = Utc::now().naive_utc();
    conn.execute(
        "INSERT INTO appointments (user_id, service_type, appointment_time, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            service_type,
            format_datetime(appointment_time),
            AppointmentStatus::Pending.as_str(),
            format_datetime(now),
            format_datetime(now),
        ],
    )?;
    Ok(Appointment {
        id: conn.last_insert_rowid(),
        user_id,
        service_type: service_type.to_string(),
        appointment_time,
        status: AppointmentStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_appointment(conn: &Connection, id: i64) -> rusqlite::Result<Option<Appointment>> {
    conn.query_row(
        "SELECT id, user_id, service_type, appointment_time, status, created_at, updated_at
         FROM appointments WHERE id = ?1",
        params![id],
        map_appointment,
    )
    .optional()
}

pub fn list_appointments_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, service_type, appointment_time, status, created_at, updated_at
         FROM appointments WHERE user_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_id], map_appointment)?;
    rows.collect()
}

pub fn list_appointments_by_status(
    conn: &Connection,
    status: AppointmentStatus,
) -> rusqlite::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, service_type, appointment_time, status, created_at, updated_at
         FROM appointments WHERE status = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![status.as_str()], map_appointment)?;
    rows.collect()
}

pub fn update_appointment_status(
    conn: &Connection,
    id: i64,
    status: AppointmentStatus,
) -> rusqlite::Result<bool> {
    let now = Utc::now().naive_utc();
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), format_datetime(now), id],
    )?;
    Ok(changed > 0)
}

// ── Notifications ──

fn map_notification(row: &Row) -> rusqlite::Result<Notification> {
    let read: i64 = row.get(3)?;
    let created_at_str: String = row.get(4)?;
    Ok(Notification {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        read: read != 0,
        created_at: parse_datetime(&created_at_str),
    })
}

pub fn create_notification(
    conn: &Connection,
    user_id: i64,
    message: &str,
) -> rusqlite::Result<Notification> {
    let now = Utc::now().naive_utc();
    conn.execute(
        "INSERT INTO notifications (user_id, message, read, created_at)
         VALUES (?1, ?2, 0, ?3)",
        params![user_id, message, format_datetime(now)],
    )?;
    Ok(Notification {
        id: conn.last_insert_rowid(),
        user_id,
        message: message.to_string(),
        read: false,
        created_at: now,
    })
}

/// Unread notifications in insertion order (oldest first).
pub fn list_unread_notifications(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, message, read, created_at
         FROM notifications WHERE user_id = ?1 AND read = 0 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_id], map_notification)?;
    rows.collect()
}

pub fn mark_notifications_read(conn: &Connection, user_id: i64) -> rusqlite::Result<usize> {
    let changed = conn.execute(
        "UPDATE notifications SET read = 1 WHERE user_id = ?1 AND read = 0",
        params![user_id],
    )?;
    Ok(changed)
}

// ── Services ──

fn map_service(row: &Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        description: row.get(3)?,
    })
}

pub fn create_service(
    conn: &Connection,
    name: &str,
    price: f64,
    description: Option<&str>,
) -> rusqlite::Result<Service> {
    conn.execute(
        "INSERT INTO services (name, price, description) VALUES (?1, ?2, ?3)",
        params![name, price, description],
    )?;
    Ok(Service {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        price,
        description: description.map(|d| d.to_string()),
    })
}

pub fn list_services(conn: &Connection) -> rusqlite::Result<Vec<Service>> {
    let mut stmt = conn.prepare("SELECT id, name, price, description FROM services ORDER BY id")?;
    let rows = stmt.query_map([], map_service)?;
    rows.collect()
}
