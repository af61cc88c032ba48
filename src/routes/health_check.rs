use actix_web::HttpResponse;

#[derive(serde::Serialize)]
struct ServiceStatus {
    status: &'static str,
    version: &'static str,
}

/// Liveness only: the store and the mail API are not contacted.
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(ServiceStatus {
        status: "active",
        version: "1.0.0-nexus",
    })
}
