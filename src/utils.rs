use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::HttpResponse;

#[derive(serde::Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

/// Body returned for anything the route handlers did not map themselves.
pub fn internal_server_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorBody {
        error: "Internal Server Error",
    })
}

pub fn fallback_error_handlers<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, render_unhandled_error)
}

/// Last line of defence for 500s: responses that already carry a JSON body
/// were shaped by a handler and go through untouched, everything else is
/// logged and replaced by the generic error body.
pub fn render_unhandled_error<B>(
    response: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);
    if is_json {
        return Ok(ErrorHandlerResponse::Response(
            response.map_into_left_body(),
        ));
    }

    match response.response().error() {
        Some(error) => tracing::error!(error.cause_chain = ?error, "Unhandled error"),
        None => tracing::error!("Unhandled error without details"),
    }
    let (request, _) = response.into_parts();
    let response: ServiceResponse<EitherBody<B, BoxBody>> =
        ServiceResponse::new(request, internal_server_error()).map_into_right_body();
    Ok(ErrorHandlerResponse::Response(response))
}
