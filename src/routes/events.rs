use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::MatchEngine;
use crate::error::MatchingError;
use crate::models::{
    CandidatesQuery, CandidatesResponse, ErrorResponse, HealthResponse, MatchSummary,
    MatchesQuery, MatchesResponse, RecordSwipeRequest, RecordSwipeResponse, SwipeDirection,
    UndoOutcome, UndoRequest, UndoResponse,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
}

/// Configure all event-scoped routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/events/{event_id}/candidates", web::get().to(next_candidates))
        .route("/events/{event_id}/swipes", web::post().to(record_swipe))
        .route("/events/{event_id}/undo", web::post().to(undo_last))
        .route("/events/{event_id}/matches", web::get().to(list_matches));
}

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

fn error_response(err: &MatchingError) -> HttpResponse {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
    } else {
        tracing::info!("Request rejected: {}", err);
    }

    HttpResponse::build(status).json(ErrorResponse {
        error: err.label().to_string(),
        message: err.to_string(),
        status_code: status.as_u16(),
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store = state.engine.store();
    let healthy = match store.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    HttpResponse::Ok().json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        store: store.backend_tag().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Next candidates endpoint
///
/// GET /api/v1/events/{event_id}/candidates?userId={userId}&limit={limit}
async fn next_candidates(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<CandidatesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let event_id = path.into_inner();
    match state
        .engine
        .next_candidates(&query.user_id, &event_id, chrono::Utc::now())
        .await
    {
        Ok(queue) => {
            let total = queue.candidates.len();
            let mut candidates = queue.candidates;
            if let Some(limit) = query.limit {
                candidates.truncate(limit as usize);
            }
            HttpResponse::Ok().json(CandidatesResponse {
                state: queue.state,
                candidates,
                total,
            })
        }
        Err(e) => error_response(&e),
    }
}

/// Record swipe endpoint
///
/// POST /api/v1/events/{event_id}/swipes
///
/// Request body:
/// ```json
/// {
///   "userId": "string",
///   "targetUserId": "string",
///   "direction": "like|pass"
/// }
/// ```
async fn record_swipe(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<RecordSwipeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let direction: SwipeDirection = match req.direction.parse() {
        Ok(direction) => direction,
        Err(message) => return bad_request("Invalid direction", message),
    };

    let event_id = path.into_inner();
    match state
        .engine
        .record_swipe(&req.user_id, &req.target_user_id, &event_id, direction, chrono::Utc::now())
        .await
    {
        Ok(outcome) => HttpResponse::Ok().json(RecordSwipeResponse {
            swipe: outcome.decision,
            matched: outcome.matched,
        }),
        Err(e) => error_response(&e),
    }
}

/// Undo endpoint
///
/// POST /api/v1/events/{event_id}/undo
///
/// An expired or missing undo is a normal `200` with `undone: false`.
async fn undo_last(
    state: web::Data<AppState>,
    path: web::Path<String>,
    req: web::Json<UndoRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let event_id = path.into_inner();
    match state
        .engine
        .undo_last(&req.user_id, &event_id, chrono::Utc::now())
        .await
    {
        Ok(UndoOutcome::Reinstated(candidate)) => HttpResponse::Ok().json(UndoResponse {
            undone: true,
            candidate: Some(candidate),
        }),
        Ok(UndoOutcome::NothingToUndo) => HttpResponse::Ok().json(UndoResponse {
            undone: false,
            candidate: None,
        }),
        Err(e) => error_response(&e),
    }
}

/// GET /api/v1/events/{event_id}/matches?userId={userId}
async fn list_matches(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<MatchesQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return bad_request("Validation failed", errors.to_string());
    }

    let event_id = path.into_inner();
    match state.engine.matches_for(&query.user_id, &event_id).await {
        Ok(records) => {
            let matches = records
                .iter()
                .filter_map(|m| {
                    m.partner_of(&query.user_id).map(|partner| MatchSummary {
                        match_id: m.id,
                        partner_id: partner.to_string(),
                        matched_at: m.created_at,
                    })
                })
                .collect();
            HttpResponse::Ok().json(MatchesResponse { matches })
        }
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attendee, Gender, InterestedIn, MatchingPolicy};
    use crate::services::{MemoryDirectory, MemoryStore};
    use actix_web::{test, App};

    fn state() -> AppState {
        let directory = Arc::new(MemoryDirectory::new());
        directory.add_attendee(
            Attendee::new("alice", "gala")
                .with_gender(Gender::Woman)
                .interested_in(InterestedIn::Men),
        );
        directory.add_attendee(
            Attendee::new("bob", "gala")
                .with_gender(Gender::Man)
                .interested_in(InterestedIn::Women),
        );
        directory.add_attendee(Attendee::new("newbie", "gala"));

        let engine = MatchEngine::new(directory, Arc::new(MemoryStore::new()), MatchingPolicy::default());
        AppState { engine: Arc::new(engine) }
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.status, "healthy");
        assert_eq!(body.store, "memory");
    }

    #[actix_web::test]
    async fn test_swipe_flow_creates_match() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/events/gala/candidates?userId=alice")
            .to_request();
        let body: CandidatesResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.candidates.first().map(|a| a.user_id.as_str()), Some("bob"));

        for (actor, target) in [("alice", "bob"), ("bob", "alice")] {
            let req = test::TestRequest::post()
                .uri("/events/gala/swipes")
                .set_json(serde_json::json!({
                    "userId": actor,
                    "targetUserId": target,
                    "direction": "like"
                }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/events/gala/matches?userId=alice")
            .to_request();
        let body: MatchesResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.matches.len(), 1);
        assert_eq!(body.matches[0].partner_id, "bob");
    }

    #[actix_web::test]
    async fn test_error_statuses() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/events/gala/swipes")
            .set_json(serde_json::json!({
                "userId": "alice",
                "targetUserId": "alice",
                "direction": "like"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/events/gala/swipes")
            .set_json(serde_json::json!({
                "userId": "alice",
                "targetUserId": "bob",
                "direction": "superlike"
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/events/gala/candidates?userId=newbie")
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let req = test::TestRequest::get()
            .uri("/events/gala/candidates?userId=stranger")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_undo_without_swipe() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/events/gala/undo")
            .set_json(serde_json::json!({ "userId": "alice" }))
            .to_request();
        let body: UndoResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.undone);
        assert!(body.candidate.is_none());
    }
}
