use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Appointment {
    pub id: i64,
    pub user_id: i64,
    pub service_type: String,
    pub appointment_time: NaiveDateTime,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "PENDING",
            AppointmentStatus::Approved => "APPROVED",
            AppointmentStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(AppointmentStatus::Pending),
            "APPROVED" => Some(AppointmentStatus::Approved),
            "REJECTED" => Some(AppointmentStatus::Rejected),
            _ => None,
        }
    }

    /// True for the two terminal states an administrator may move a
    /// pending appointment into.
    pub fn is_decision(&self) -> bool {
        matches!(self, AppointmentStatus::Approved | AppointmentStatus::Rejected)
    }
}
