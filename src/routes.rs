//! HTTP routing.

use axum::{
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{cart, catalog, checkout, content, coupons, dashboard, orders, reviews, users, wilayas};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "souk-storefront"})) }))
        .nest("/api/v1", storefront_routes())
        .nest("/api/v1/admin", admin_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/categories/:slug", get(catalog::get_category))
        .route("/products", get(catalog::list_products))
        .route("/products/:id", get(catalog::get_product))
        .route("/products/:id/reviews", get(reviews::list_product_reviews).post(reviews::submit_review))
        .route("/wilayas", get(wilayas::list_wilayas))
        .route("/wilayas/:code", get(wilayas::get_wilaya))
        .route("/wilayas/:code/delivery", get(wilayas::delivery_quote))
        .route("/cart/:session", get(cart::get_cart).post(cart::add_to_cart).delete(cart::clear_cart))
        .route("/cart/:session/items/:item_id", put(cart::update_item).delete(cart::remove_item))
        .route("/coupons/validate", post(coupons::validate_coupon))
        .route("/checkout/quote", post(checkout::quote))
        .route("/checkout", post(checkout::place_order))
        .route("/orders/track", get(orders::track_order))
        .route("/banners", get(content::list_banners))
        .route("/social-links", get(content::list_social_links))
        .route("/pixels", get(content::list_pixels))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(users::me))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/categories", get(catalog::admin_list_categories).post(catalog::create_category))
        .route("/categories/:id", put(catalog::update_category).delete(catalog::delete_category))
        .route("/products", get(catalog::admin_list_products).post(catalog::create_product))
        .route(
            "/products/:id",
            get(catalog::admin_get_product).put(catalog::update_product).delete(catalog::delete_product),
        )
        .route("/products/:id/stock", patch(catalog::adjust_stock))
        .route("/wilayas", get(wilayas::admin_list_wilayas))
        .route("/wilayas/:code", put(wilayas::upsert_wilaya))
        .route("/coupons", get(coupons::admin_list_coupons).post(coupons::create_coupon))
        .route("/coupons/:id", put(coupons::update_coupon).delete(coupons::delete_coupon))
        .route("/orders", get(orders::admin_list_orders))
        .route("/orders/:id", get(orders::admin_get_order).delete(orders::delete_order))
        .route("/orders/:id/status", put(orders::update_status))
        .route("/orders/:id/notes", put(orders::update_notes))
        .route("/reviews", get(reviews::admin_list_reviews))
        .route("/reviews/:id", patch(reviews::set_approval).delete(reviews::delete_review))
        .route("/reviews/:id/replies", post(reviews::add_reply))
        .route("/reviews/:id/replies/:reply_id", delete(reviews::delete_reply))
        .route("/banners", get(content::admin_list_banners).post(content::create_banner))
        .route("/banners/:id", put(content::update_banner).delete(content::delete_banner))
        .route("/social-links", get(content::admin_list_social_links).post(content::create_social_link))
        .route("/social-links/:id", put(content::update_social_link).delete(content::delete_social_link))
        .route("/pixels", get(content::admin_list_pixels).post(content::create_pixel))
        .route("/pixels/:id", put(content::update_pixel).delete(content::delete_pixel))
        .route("/users", get(users::list_users))
        .route("/users/:user_id", delete(users::revoke_access))
        .route("/users/:user_id/role", put(users::set_role))
        .route("/users/:user_id/permissions", put(users::set_permissions))
}
