pub mod db;
pub mod errors;
pub mod ids;

pub mod user;
pub mod user_credentials;
pub mod event;
pub mod service_type;
pub mod event_service_detail;
pub mod event_gallery;
pub mod service_order;
pub mod review;
pub mod report;
pub mod report_image;

#[cfg(test)]
mod tests;
