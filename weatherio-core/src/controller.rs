//! Controllers wiring user input to API calls and view updates.
//!
//! Both controllers are constructed once with their collaborators and render
//! through a view trait, so the presentation layer stays swappable and the
//! timing behavior is testable without a terminal or a network.

pub mod dashboard;
pub mod search;

pub use dashboard::{DashboardController, DashboardView};
pub use search::{SearchController, SearchPhase, SearchResult, SearchView};
