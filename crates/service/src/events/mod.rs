//! Events: the seller storefront with its services, gallery and listings.

pub mod listing;
pub mod payload;
pub mod service;
pub mod views;

pub use listing::{ListQuery, Suggestions};
pub use payload::{CreateEventInput, UpdateEventInput};
pub use service::{
    create_event, delete_event, get_event, list_events, list_service_types, suggestions, update_event, EventList,
};
pub use views::{EventDetail, EventListing};
