use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

// === Campus ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campus_area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrance {
    pub id: u64,
    pub building_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

impl Entrance {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildingWithEntrances {
    #[serde(flatten)]
    pub building: Building,
    pub entrances: Vec<Entrance>,
}

/// Where a resource or submission lives: inside a building (reached through
/// one of its entrances) or at explicit outdoor coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "placement", rename_all = "snake_case")]
pub enum Anchor {
    Indoor { building_id: u64 },
    Outdoor { lat: f64, lon: f64 },
}

impl Anchor {
    pub fn building_id(&self) -> Option<u64> {
        match *self {
            Anchor::Indoor { building_id } => Some(building_id),
            Anchor::Outdoor { .. } => None,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match *self {
            Anchor::Indoor { .. } => None,
            Anchor::Outdoor { lat, lon } => Some(Coordinates::new(lat, lon)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: u64,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(flatten)]
    pub anchor: Anchor,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceWithBuilding {
    #[serde(flatten)]
    pub resource: Resource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<Building>,
}

// === Locator ===

#[derive(Debug, Deserialize)]
pub struct FindClosestQuery {
    pub category: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FindClosestResponse {
    pub resource: ResourceWithBuilding,
    pub location: Coordinates,
    /// Kilometers.
    pub distance: f64,
}

// === Submissions ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: u64,
    pub submitter_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter_name: Option<String>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: SubmissionStatus,
    pub created_at: i64,
    #[serde(flatten)]
    pub anchor: Anchor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub submission_id: u64,
    pub user_id: String,
    pub vote_type: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub submission_id: u64,
    pub user_id: String,
    pub user_name: String,
    pub comment: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub submission: Submission,
    pub votes: Vec<Vote>,
    pub comments: Vec<Comment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub building: Option<Building>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSubmissionRequest {
    #[serde(default)]
    pub category: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub description: Option<String>,
    pub building_id: Option<u64>,
    #[serde(rename = "submitterName")]
    pub submitter_name: Option<String>,
}

/// A validated submission ready to be stored.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub submitter_id: String,
    pub submitter_name: Option<String>,
    pub category: String,
    pub description: Option<String>,
    pub anchor: Anchor,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    /// Left loose so that a missing or non-numeric value reaches validation.
    #[serde(default, rename = "voteType")]
    pub vote_type: Option<serde_json::Value>,
}

impl VoteRequest {
    /// `1` or `-1`; a float with the same value also counts.
    pub fn direction(&self) -> Option<i64> {
        let value = self.vote_type.as_ref()?.as_f64()?;
        if value == 1.0 {
            Some(1)
        } else if value == -1.0 {
            Some(-1)
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: String,
    #[serde(default, rename = "userName")]
    pub user_name: String,
}

// === Auth ===

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub authorized: &'static str,
}

// === Errors ===

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u32,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
