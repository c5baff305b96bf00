use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{contact, forms, health_check, payment};
use crate::AppState;

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/application/step/:step", post(forms::application_step))
        .route("/application/final-submit", post(forms::application_final_submit))
        .route("/application/me/:user_id", get(forms::application_for_user))
        .route("/application/id/:id", get(forms::application_by_id))
        .route("/enroll", post(forms::enroll_direct))
        .route("/enroll/step/:step", post(forms::enrollment_step))
        .route("/enroll/final-submit", post(forms::enrollment_final_submit))
        .route("/enroll/me/:user_id", get(forms::enrollment_for_user))
        .route("/enroll/id/:id", get(forms::enrollment_by_id))
        .route("/payment/create-order", post(payment::create_order))
        .route("/payment/verify", post(payment::verify))
        .route("/payment/order/:order_id", get(payment::order_status))
        .route("/contact", post(contact::submit).get(contact::list))
        .with_state(state)
}
