pub mod appointment;
pub mod notification;
pub mod service;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus};
pub use notification::Notification;
pub use service::Service;
pub use user::{Role, User};
