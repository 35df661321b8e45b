use chrono::{NaiveDate, NaiveTime};
use utoipa::{IntoParams, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ServiceTypeDoc { pub code: String, pub label: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub whatsapp_number: Option<String>,
    pub location: Option<String>,
    /// `customer` or `seller`
    pub user_type: Option<String>,
    pub password: String,
    pub confirm_password: String,
    pub accepted_terms: bool,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct RefreshRequest { pub refresh: String }

#[derive(ToSchema)]
pub struct VerifyOtpRequest { pub email: String, pub otp: String }

#[derive(ToSchema)]
pub struct EmailRequest { pub email: String }

#[derive(ToSchema)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub whatsapp_number: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(ToSchema)]
pub struct ServiceDetailDoc {
    /// service code or label
    pub service: String,
    pub short_description: Option<String>,
    /// minor currency units
    pub price: Option<i64>,
    pub is_available: Option<bool>,
}

#[derive(ToSchema)]
pub struct GalleryImageDoc {
    pub image: String,
    pub position: i32,
    pub is_primary: Option<bool>,
}

#[derive(ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    pub brand_name: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub is_active: Option<bool>,
    pub daily_booking_capacity: Option<i32>,
    pub service_details: Option<Vec<ServiceDetailDoc>>,
    pub gallery_images: Option<Vec<GalleryImageDoc>>,
}

#[derive(ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub brand_name: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub is_active: Option<bool>,
    /// zero or less removes the cap
    pub daily_booking_capacity: Option<i32>,
    pub service_details: Option<Vec<ServiceDetailDoc>>,
    pub gallery_images: Option<Vec<GalleryImageDoc>>,
}

#[derive(ToSchema)]
pub struct CreateOrderRequest {
    pub event_id: String,
    pub event_date: NaiveDate,
    #[schema(value_type = String, example = "18:30:00")]
    pub event_time: NaiveTime,
    pub location: String,
    /// service codes or labels
    pub selected_services: Vec<String>,
}

#[derive(ToSchema)]
pub struct BuyerUpdateRequest {
    /// `cancelled` or `completed`
    pub status: String,
}

#[derive(ToSchema)]
pub struct SellerUpdateRequest {
    pub discount_price: Option<i64>,
    pub advance_paid: Option<i64>,
    pub invoice_file: Option<String>,
    pub full_payment_date: Option<NaiveDate>,
}

#[derive(ToSchema)]
pub struct ReviewRequest { pub rating: i16, pub comment: Option<String> }

#[derive(ToSchema)]
pub struct ReviewPatchRequest { pub rating: Option<i16>, pub comment: Option<String> }

#[derive(ToSchema)]
pub struct CreateReportRequest {
    pub description: String,
    pub user_full_name: String,
    pub phone_number: String,
    /// up to 3 image URLs
    pub images: Option<Vec<String>>,
}

#[derive(ToSchema)]
pub struct AdminUpdateReportRequest {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
}

#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListParams {
    /// repeatable
    pub service_type: Option<Vec<String>>,
    pub search: Option<String>,
    pub brand_name: Option<String>,
    pub seller_name: Option<String>,
    pub title: Option<String>,
    pub min_rating: Option<String>,
    /// created_at, average_rating, total_views or brand_name; `-` prefix for descending
    pub order_by: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminReportParams {
    /// repeatable
    pub status: Option<Vec<String>>,
    pub brand_name: Option<String>,
    pub seller_full_name: Option<String>,
    pub user_full_name: Option<String>,
    pub created_after: Option<NaiveDate>,
    pub created_before: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::service_types,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::logout,
        crate::routes::auth::verify_otp,
        crate::routes::auth::resend_otp,
        crate::routes::auth::forgot_password,
        crate::routes::auth::reset_password,
        crate::routes::auth::me,
        crate::routes::users::get_profile,
        crate::routes::users::whatsapp_click,
        crate::routes::users::update_profile,
        crate::routes::users::seller_dashboard,
        crate::routes::orders::create,
        crate::routes::orders::buyer_update,
        crate::routes::orders::delete,
        crate::routes::orders::list_buyer,
        crate::routes::orders::list_seller,
        crate::routes::orders::accept,
        crate::routes::orders::seller_update,
        crate::routes::events::list,
        crate::routes::events::suggestions,
        crate::routes::events::global_dashboard,
        crate::routes::events::create,
        crate::routes::events::get,
        crate::routes::events::update,
        crate::routes::events::delete,
        crate::routes::events::event_dashboard,
        crate::routes::reviews::list,
        crate::routes::reviews::create,
        crate::routes::reviews::update,
        crate::routes::reviews::delete,
        crate::routes::reports::list_for_event,
        crate::routes::reports::create,
        crate::routes::reports::list_for_user,
        crate::routes::reports::get,
        crate::routes::reports::admin_list,
        crate::routes::reports::admin_update,
    ),
    components(
        schemas(
            HealthResponse,
            ServiceTypeDoc,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            VerifyOtpRequest,
            EmailRequest,
            ResetPasswordRequest,
            UpdateProfileRequest,
            ServiceDetailDoc,
            GalleryImageDoc,
            CreateEventRequest,
            UpdateEventRequest,
            CreateOrderRequest,
            BuyerUpdateRequest,
            SellerUpdateRequest,
            ReviewRequest,
            ReviewPatchRequest,
            CreateReportRequest,
            AdminUpdateReportRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "users"),
        (name = "orders"),
        (name = "events"),
        (name = "dashboard"),
        (name = "reviews"),
        (name = "reports"),
        (name = "admin")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_marketplace_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/users/register"));
        assert!(paths.contains_key("/events/{slug}/reviews/create"));
        assert!(paths.contains_key("/events/reports/{id}/admin"));
    }
}
