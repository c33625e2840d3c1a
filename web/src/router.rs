use crate::controller::{broker_controller, health_check_controller};
use crate::AppState;
use axum::{routing::get, Router};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "DingTalk Identity Broker"
        ),
        paths(
            broker_controller::login,
            broker_controller::endpoint,
            health_check_controller::health_check,
        ),
        tags(
            (name = "dingtalk_broker", description = "Brokered DingTalk logins")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(broker_routes(app_state))
        .merge(health_routes())
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn broker_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/broker/dingtalk/login", get(broker_controller::login))
        .route("/broker/dingtalk/endpoint", get(broker_controller::endpoint))
        .with_state(app_state)
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}
