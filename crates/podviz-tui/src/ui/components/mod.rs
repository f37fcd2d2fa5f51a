mod readiness_list;
mod status_bar;

pub use readiness_list::{ReadinessList, ReadinessRow};
pub use status_bar::{dashboard_hints, StatusBar};
