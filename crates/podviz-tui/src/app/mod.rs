mod action;
mod state;

pub use action::Action;
pub use state::DashboardState;
