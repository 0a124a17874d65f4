//! Booking-horizon estimation

pub mod calendar;
pub mod model;

pub use calendar::PortalCalendar;
pub use model::{insufficiency, HorizonModel};
