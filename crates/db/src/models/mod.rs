pub mod attendance;
pub mod event;
pub mod form;
pub mod form_response;
pub mod form_schema;
pub mod member;
