pub mod attendance;
pub mod form_builder;
pub mod form_renderer;
pub mod forms;
pub mod response_aggregator;
pub mod responses;
pub mod submission;
pub mod submission_guard;
