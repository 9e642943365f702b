use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::json;

use crate::catalog;
use crate::error::{AppError, Result};
use crate::extract;
use crate::geo::Coordinates;
use crate::locator;
use crate::models::*;
use crate::AppState;

// === Auth helpers ===

fn extract_auth(headers: &HeaderMap) -> Result<(&str, &str)> {
    let user = headers
        .get("x-auth-user")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && !s.contains(':'))
        .ok_or(AppError::Unauthorized)?;

    let key = headers
        .get("x-auth-key")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or(AppError::Unauthorized)?;

    Ok((user, key))
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<String> {
    let (user, key) = extract_auth(headers)?;
    if state.db.verify_user(user, key)? {
        Ok(user.to_string())
    } else {
        Err(AppError::Unauthorized)
    }
}

// === User endpoints ===

pub async fn create_user(
    State(state): State<AppState>,
    extract::Json(req): extract::Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>)> {
    if req.username.is_empty() || req.username.contains(':') {
        return Err(AppError::InvalidRequest("invalid username".into()));
    }
    if req.password.is_empty() {
        return Err(AppError::InvalidRequest("invalid password".into()));
    }

    if state.db.create_user(&req.username, &req.password)? {
        tracing::info!("Registered user {}", req.username);
        Ok((
            StatusCode::CREATED,
            Json(CreateUserResponse {
                username: req.username,
            }),
        ))
    } else {
        Err(AppError::UserExists)
    }
}

pub async fn auth_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthResponse>> {
    authorize(&state, &headers)?;
    Ok(Json(AuthResponse { authorized: "OK" }))
}

// === Campus endpoints ===

pub async fn list_buildings(
    State(state): State<AppState>,
) -> Result<Json<Vec<BuildingWithEntrances>>> {
    Ok(Json(state.db.list_buildings()?))
}

pub async fn list_resources(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResourceWithBuilding>>> {
    Ok(Json(state.db.list_resources()?))
}

fn parse_coordinate(name: &str, raw: Option<&str>) -> Result<f64> {
    let value = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            AppError::InvalidRequest("missing required query parameters: category, lat, lon".into())
        })?
        .parse::<f64>()
        .map_err(|_| AppError::InvalidRequest(format!("{name} must be a number")))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(AppError::InvalidRequest(format!("{name} must be finite")))
    }
}

pub async fn find_closest(
    State(state): State<AppState>,
    extract::Query(query): extract::Query<FindClosestQuery>,
) -> Result<Json<FindClosestResponse>> {
    let category = query
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            AppError::InvalidRequest("missing required query parameters: category, lat, lon".into())
        })?;
    let user = Coordinates::new(
        parse_coordinate("lat", query.lat.as_deref())?,
        parse_coordinate("lon", query.lon.as_deref())?,
    );

    let candidates = state.db.candidates(category)?;
    if candidates.is_empty() {
        return Err(AppError::NoResources);
    }

    let closest = locator::find_closest(user, &candidates).ok_or(AppError::Unreachable)?;
    tracing::debug!(
        "Closest {} to ({}, {}) is resource {} at {:.3} km",
        category,
        user.lat,
        user.lon,
        closest.candidate.resource.id,
        closest.distance_km
    );

    Ok(Json(FindClosestResponse {
        resource: ResourceWithBuilding {
            resource: closest.candidate.resource.clone(),
            building: closest.candidate.building().cloned(),
        },
        location: closest.location,
        distance: closest.distance_km,
    }))
}

// === Submission endpoints ===

pub async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionDetail>>> {
    Ok(Json(state.db.pending_submissions()?))
}

pub async fn create_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    extract::Json(req): extract::Json<CreateSubmissionRequest>,
) -> Result<(StatusCode, Json<Submission>)> {
    let username = authorize(&state, &headers)?;

    if req.category.is_empty() {
        return Err(AppError::InvalidRequest("missing category".into()));
    }

    let anchor = if catalog::is_indoor(&req.category) {
        let building_id = req.building_id.ok_or_else(|| {
            AppError::InvalidRequest("a building must be selected for this indoor category".into())
        })?;
        Anchor::Indoor { building_id }
    } else {
        match (req.lat, req.lon) {
            (Some(lat), Some(lon)) if Coordinates::new(lat, lon).is_finite() => {
                Anchor::Outdoor { lat, lon }
            }
            _ => {
                return Err(AppError::InvalidRequest(
                    "a map location must be provided for outdoor categories".into(),
                ))
            }
        }
    };

    let submission = state.db.create_submission(NewSubmission {
        submitter_id: username,
        submitter_name: req.submitter_name,
        category: req.category,
        description: req.description,
        anchor,
    })?;
    tracing::info!(
        "Submission {} created for {} by {}",
        submission.id,
        submission.category,
        submission.submitter_id
    );

    Ok((StatusCode::CREATED, Json(submission)))
}

pub async fn vote_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    extract::Path(id): extract::Path<u64>,
    extract::Json(req): extract::Json<VoteRequest>,
) -> Result<(StatusCode, Json<Vote>)> {
    let username = authorize(&state, &headers)?;

    let direction = req
        .direction()
        .ok_or_else(|| AppError::InvalidRequest("invalid vote type".into()))?;

    let vote = state
        .db
        .cast_vote(id, &username, direction, state.verified_threshold)?;
    Ok((StatusCode::CREATED, Json(vote)))
}

pub async fn comment_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    extract::Path(id): extract::Path<u64>,
    extract::Json(req): extract::Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let username = authorize(&state, &headers)?;

    if req.comment.trim().is_empty() || req.user_name.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "comment text and user name are required".into(),
        ));
    }

    let comment = state
        .db
        .add_comment(id, &username, &req.user_name, &req.comment)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// === Health check ===

pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "state": "OK" }))
}
