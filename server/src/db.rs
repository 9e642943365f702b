use redb::{
    Database as RedbDatabase, Key, ReadableTable, Table, TableDefinition, WriteTransaction,
};
use serde::{de::DeserializeOwned, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::catalog;
use crate::error::{AppError, Result};
use crate::geo::Coordinates;
use crate::locator::{Candidate, Placement};
use crate::models::{
    Anchor, Building, BuildingWithEntrances, Comment, Entrance, NewSubmission, Resource,
    ResourceWithBuilding, Submission, SubmissionDetail, SubmissionStatus, Vote,
};

// Table definitions
const USERS: TableDefinition<&str, &str> = TableDefinition::new("users");
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");
const BUILDINGS: TableDefinition<u64, &[u8]> = TableDefinition::new("buildings");
const ENTRANCES: TableDefinition<u64, &[u8]> = TableDefinition::new("entrances");
const RESOURCES: TableDefinition<u64, &[u8]> = TableDefinition::new("resources");
const SUBMISSIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("submissions");
// keyed by "{submission_id:020}:{user_id}"
const VOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("votes");
const COMMENTS: TableDefinition<u64, &[u8]> = TableDefinition::new("comments");

pub struct Database {
    db: RedbDatabase,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let db = RedbDatabase::create(path)?;

        // Initialize tables
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(COUNTERS)?;
            let _ = write_txn.open_table(BUILDINGS)?;
            let _ = write_txn.open_table(ENTRANCES)?;
            let _ = write_txn.open_table(RESOURCES)?;
            let _ = write_txn.open_table(SUBMISSIONS)?;
            let _ = write_txn.open_table(VOTES)?;
            let _ = write_txn.open_table(COMMENTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    // === User operations ===

    pub fn create_user(&self, username: &str, password: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let created = {
            let mut table = write_txn.open_table(USERS)?;
            if table.get(username)?.is_some() {
                false
            } else {
                table.insert(username, password)?;
                true
            }
        };
        write_txn.commit()?;
        Ok(created)
    }

    pub fn verify_user(&self, username: &str, password: &str) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS)?;
        match table.get(username)? {
            Some(stored) => Ok(stored.value() == password),
            None => Ok(false),
        }
    }

    // === Campus operations ===

    pub fn has_buildings(&self) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(BUILDINGS)?;
        let mut iter = table.iter()?;
        let first = iter.next().transpose()?;
        Ok(first.is_some())
    }

    pub fn insert_building(&self, name: &str, campus_area: Option<&str>) -> Result<Building> {
        self.batch(|batch| batch.insert_building(name, campus_area))
    }

    pub fn insert_entrance(
        &self,
        building_id: u64,
        name: Option<&str>,
        location: Coordinates,
    ) -> Result<Entrance> {
        self.batch(|batch| batch.insert_entrance(building_id, name, location))
    }

    pub fn insert_resource(
        &self,
        name: &str,
        category: &str,
        description: Option<&str>,
        floor: Option<&str>,
        anchor: Anchor,
    ) -> Result<Resource> {
        self.batch(|batch| batch.insert_resource(name, category, description, floor, anchor))
    }

    /// Runs `work` in a single write transaction. Nothing is committed unless
    /// `work` returns `Ok`.
    pub fn batch<T>(&self, work: impl FnOnce(&Batch<'_>) -> Result<T>) -> Result<T> {
        let write_txn = self.db.begin_write()?;
        let out = work(&Batch { txn: &write_txn })?;
        write_txn.commit()?;
        Ok(out)
    }

    /// All buildings ordered by name, each with its entrances.
    pub fn list_buildings(&self) -> Result<Vec<BuildingWithEntrances>> {
        let read_txn = self.db.begin_read()?;
        let mut entrances = entrances_by_building(&read_txn.open_table(ENTRANCES)?)?;
        let mut buildings = scan_json::<u64, Building, _>(&read_txn.open_table(BUILDINGS)?)?;
        buildings.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(buildings
            .into_iter()
            .map(|building| BuildingWithEntrances {
                entrances: entrances.remove(&building.id).unwrap_or_default(),
                building,
            })
            .collect())
    }

    pub fn list_resources(&self) -> Result<Vec<ResourceWithBuilding>> {
        let read_txn = self.db.begin_read()?;
        let buildings = read_txn.open_table(BUILDINGS)?;
        let resources = scan_json::<u64, Resource, _>(&read_txn.open_table(RESOURCES)?)?;

        resources
            .into_iter()
            .map(|resource| -> Result<ResourceWithBuilding> {
                let building = match resource.anchor {
                    Anchor::Indoor { building_id } => get_json(&buildings, building_id)?,
                    Anchor::Outdoor { .. } => None,
                };
                Ok(ResourceWithBuilding { resource, building })
            })
            .collect()
    }

    /// Resources of one category with their building and entrances loaded,
    /// ready for the locator.
    pub fn candidates(&self, category: &str) -> Result<Vec<Candidate>> {
        let read_txn = self.db.begin_read()?;
        let buildings = read_txn.open_table(BUILDINGS)?;
        let entrances = entrances_by_building(&read_txn.open_table(ENTRANCES)?)?;
        let resources = scan_json::<u64, Resource, _>(&read_txn.open_table(RESOURCES)?)?;

        let mut candidates = Vec::new();
        for resource in resources.into_iter().filter(|r| r.category == category) {
            let placement = match resource.anchor {
                Anchor::Indoor { building_id } => {
                    let Some(building) = get_json::<Building, _>(&buildings, building_id)? else {
                        tracing::warn!(
                            "Resource {} references missing building {}",
                            resource.id,
                            building_id
                        );
                        continue;
                    };
                    Placement::Indoor {
                        building,
                        entrances: entrances.get(&building_id).cloned().unwrap_or_default(),
                    }
                }
                Anchor::Outdoor { lat, lon } => Placement::Outdoor(Coordinates::new(lat, lon)),
            };
            candidates.push(Candidate {
                resource,
                placement,
            });
        }

        Ok(candidates)
    }

    // === Submission operations ===

    /// Stores a pending submission after rejecting ones that duplicate an
    /// existing resource.
    pub fn create_submission(&self, new: NewSubmission) -> Result<Submission> {
        let write_txn = self.db.begin_write()?;
        let submission = {
            let resources = write_txn.open_table(RESOURCES)?;
            match new.anchor {
                Anchor::Indoor { building_id } => {
                    let buildings = write_txn.open_table(BUILDINGS)?;
                    if get_json::<Building, _>(&buildings, building_id)?.is_none() {
                        return Err(AppError::InvalidRequest("unknown building".into()));
                    }
                    if indoor_resource_exists(&resources, &new.category, building_id)? {
                        return Err(AppError::Duplicate(
                            "A verified resource for this category already exists in this building"
                                .into(),
                        ));
                    }
                }
                Anchor::Outdoor { lat, lon } => {
                    let point = Coordinates::new(lat, lon);
                    let nearby = nearby_outdoor_resource(&resources, &new.category, point)?;
                    if let Some(meters) = nearby {
                        return Err(AppError::Duplicate(format!(
                            "A verified {} already exists {}m away",
                            new.category,
                            meters.round()
                        )));
                    }
                }
            }

            let submission = Submission {
                id: next_id(&write_txn, "submissions")?,
                submitter_id: new.submitter_id,
                submitter_name: new.submitter_name,
                category: new.category,
                description: new.description,
                status: SubmissionStatus::Pending,
                created_at: unix_now(),
                anchor: new.anchor,
            };
            let mut table = write_txn.open_table(SUBMISSIONS)?;
            put_json(&mut table, submission.id, &submission)?;
            submission
        };
        write_txn.commit()?;
        Ok(submission)
    }

    pub fn get_submission(&self, id: u64) -> Result<Option<Submission>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SUBMISSIONS)?;
        get_json(&table, id)
    }

    /// Pending submissions with their votes, comments and building, most voted first.
    pub fn pending_submissions(&self) -> Result<Vec<SubmissionDetail>> {
        let read_txn = self.db.begin_read()?;
        let buildings = read_txn.open_table(BUILDINGS)?;
        let submissions = scan_json::<u64, Submission, _>(&read_txn.open_table(SUBMISSIONS)?)?;

        let mut votes: HashMap<u64, Vec<Vote>> = HashMap::new();
        for vote in scan_json::<&str, Vote, _>(&read_txn.open_table(VOTES)?)? {
            votes.entry(vote.submission_id).or_default().push(vote);
        }
        let mut comments: HashMap<u64, Vec<Comment>> = HashMap::new();
        for comment in scan_json::<u64, Comment, _>(&read_txn.open_table(COMMENTS)?)? {
            comments.entry(comment.submission_id).or_default().push(comment);
        }

        let mut details = submissions
            .into_iter()
            .filter(|s| s.status == SubmissionStatus::Pending)
            .map(|submission| -> Result<SubmissionDetail> {
                let building = match submission.anchor {
                    Anchor::Indoor { building_id } => get_json(&buildings, building_id)?,
                    Anchor::Outdoor { .. } => None,
                };
                Ok(SubmissionDetail {
                    votes: votes.remove(&submission.id).unwrap_or_default(),
                    comments: comments.remove(&submission.id).unwrap_or_default(),
                    building,
                    submission,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        details.sort_by_key(|d| Reverse(d.votes.len()));
        Ok(details)
    }

    /// Records (or replaces) a user's vote. When the vote total reaches
    /// `verified_threshold` the submission is verified in the same transaction.
    pub fn cast_vote(
        &self,
        submission_id: u64,
        user_id: &str,
        vote_type: i64,
        verified_threshold: i64,
    ) -> Result<Vote> {
        let write_txn = self.db.begin_write()?;
        let vote = {
            let mut submissions = write_txn.open_table(SUBMISSIONS)?;
            let submission = get_json::<Submission, _>(&submissions, submission_id)?
                .filter(|s| s.status == SubmissionStatus::Pending)
                .ok_or(AppError::SubmissionClosed)?;

            let vote = Vote {
                submission_id,
                user_id: user_id.to_string(),
                vote_type,
                updated_at: unix_now(),
            };

            let total: i64 = {
                let mut votes = write_txn.open_table(VOTES)?;
                let key = vote_key(submission_id, user_id);
                let json = serde_json::to_vec(&vote)?;
                votes.insert(key.as_str(), json.as_slice())?;
                votes_for(&votes, submission_id)?
                    .iter()
                    .map(|v| v.vote_type)
                    .sum()
            };

            if total >= verified_threshold {
                verify_submission(&write_txn, &mut submissions, submission)?;
            }
            vote
        };
        write_txn.commit()?;
        Ok(vote)
    }

    pub fn add_comment(
        &self,
        submission_id: u64,
        user_id: &str,
        user_name: &str,
        text: &str,
    ) -> Result<Comment> {
        let write_txn = self.db.begin_write()?;
        let comment = {
            let submissions = write_txn.open_table(SUBMISSIONS)?;
            if get_json::<Submission, _>(&submissions, submission_id)?.is_none() {
                return Err(AppError::NotFound("Submission"));
            }

            let comment = Comment {
                id: next_id(&write_txn, "comments")?,
                submission_id,
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
                comment: text.to_string(),
                created_at: unix_now(),
            };
            let mut table = write_txn.open_table(COMMENTS)?;
            put_json(&mut table, comment.id, &comment)?;
            comment
        };
        write_txn.commit()?;
        Ok(comment)
    }
}

/// Marks a submission verified, turns it into a resource and rejects the
/// pending submissions it duplicates.
fn verify_submission(
    txn: &WriteTransaction,
    submissions: &mut Table<u64, &'static [u8]>,
    mut submission: Submission,
) -> Result<()> {
    submission.status = SubmissionStatus::Verified;
    put_json(submissions, submission.id, &submission)?;

    let mut resources = txn.open_table(RESOURCES)?;
    let blocked = match submission.anchor {
        Anchor::Indoor { building_id } => {
            indoor_resource_exists(&resources, &submission.category, building_id)?
        }
        Anchor::Outdoor { .. } => false,
    };
    if blocked {
        tracing::info!(
            "Submission {} duplicates an existing {} resource, not creating another",
            submission.id,
            submission.category
        );
    } else {
        let resource = Resource {
            id: next_id(txn, "resources")?,
            name: catalog::verified_resource_name(&submission.category),
            category: submission.category.clone(),
            description: submission.description.clone(),
            floor: None,
            anchor: submission.anchor,
        };
        put_json(&mut resources, resource.id, &resource)?;
        tracing::info!(
            "Created resource {} from submission {}",
            resource.id,
            submission.id
        );
    }

    reject_duplicates(submissions, &submission)
}

fn reject_duplicates(
    submissions: &mut Table<u64, &'static [u8]>,
    verified: &Submission,
) -> Result<()> {
    let proximity_km = catalog::proximity_meters(&verified.category) / 1000.0;
    let duplicates: Vec<Submission> = scan_json::<u64, Submission, _>(&*submissions)?
        .into_iter()
        .filter(|s| {
            s.id != verified.id
                && s.status == SubmissionStatus::Pending
                && s.category == verified.category
        })
        .filter(|s| match (verified.anchor, s.anchor) {
            (Anchor::Indoor { building_id: a }, Anchor::Indoor { building_id: b }) => a == b,
            (Anchor::Outdoor { lat, lon }, Anchor::Outdoor { lat: other_lat, lon: other_lon }) => {
                Coordinates::new(lat, lon).distance_km(&Coordinates::new(other_lat, other_lon))
                    < proximity_km
            }
            _ => false,
        })
        .collect();

    for mut duplicate in duplicates.iter().cloned() {
        duplicate.status = SubmissionStatus::Rejected;
        put_json(submissions, duplicate.id, &duplicate)?;
    }
    if !duplicates.is_empty() {
        tracing::info!(
            "Rejected {} duplicate {} submissions",
            duplicates.len(),
            verified.category
        );
    }
    Ok(())
}

/// Campus inserts sharing one uncommitted write transaction.
pub struct Batch<'a> {
    txn: &'a WriteTransaction,
}

impl Batch<'_> {
    pub fn insert_building(&self, name: &str, campus_area: Option<&str>) -> Result<Building> {
        let building = Building {
            id: next_id(self.txn, "buildings")?,
            name: name.to_string(),
            campus_area: campus_area.map(String::from),
        };
        let mut table = self.txn.open_table(BUILDINGS)?;
        put_json(&mut table, building.id, &building)?;
        Ok(building)
    }

    pub fn insert_entrance(
        &self,
        building_id: u64,
        name: Option<&str>,
        location: Coordinates,
    ) -> Result<Entrance> {
        if !location.is_finite() {
            return Err(AppError::InvalidRequest(
                "Entrance coordinates must be finite numbers".into(),
            ));
        }
        {
            let buildings = self.txn.open_table(BUILDINGS)?;
            if get_json::<Building, _>(&buildings, building_id)?.is_none() {
                return Err(AppError::NotFound("Building"));
            }
        }

        let entrance = Entrance {
            id: next_id(self.txn, "entrances")?,
            building_id,
            name: name.map(String::from),
            lat: location.lat,
            lon: location.lon,
        };
        let mut table = self.txn.open_table(ENTRANCES)?;
        put_json(&mut table, entrance.id, &entrance)?;
        Ok(entrance)
    }

    /// Stores a resource. An indoor resource needs an existing building and at
    /// most one resource per category may live in a building.
    pub fn insert_resource(
        &self,
        name: &str,
        category: &str,
        description: Option<&str>,
        floor: Option<&str>,
        anchor: Anchor,
    ) -> Result<Resource> {
        match anchor {
            Anchor::Indoor { building_id } => {
                let buildings = self.txn.open_table(BUILDINGS)?;
                if get_json::<Building, _>(&buildings, building_id)?.is_none() {
                    return Err(AppError::NotFound("Building"));
                }
                let table = self.txn.open_table(RESOURCES)?;
                if indoor_resource_exists(&table, category, building_id)? {
                    return Err(AppError::Duplicate(
                        "A verified resource for this category already exists in this building"
                            .into(),
                    ));
                }
            }
            Anchor::Outdoor { lat, lon } => {
                if !Coordinates::new(lat, lon).is_finite() {
                    return Err(AppError::InvalidRequest(
                        "Resource coordinates must be finite numbers".into(),
                    ));
                }
            }
        }

        let resource = Resource {
            id: next_id(self.txn, "resources")?,
            name: name.to_string(),
            category: category.to_string(),
            description: description.map(String::from),
            floor: floor.map(String::from),
            anchor,
        };
        let mut table = self.txn.open_table(RESOURCES)?;
        put_json(&mut table, resource.id, &resource)?;
        Ok(resource)
    }
}

fn indoor_resource_exists<R>(resources: &R, category: &str, building_id: u64) -> Result<bool>
where
    R: ReadableTable<u64, &'static [u8]>,
{
    Ok(scan_json::<u64, Resource, _>(resources)?
        .iter()
        .any(|r| r.category == category && r.anchor.building_id() == Some(building_id)))
}

/// Distance in meters to an outdoor resource of `category` lying inside that
/// category's duplicate radius, if any.
fn nearby_outdoor_resource<R>(
    resources: &R,
    category: &str,
    point: Coordinates,
) -> Result<Option<f64>>
where
    R: ReadableTable<u64, &'static [u8]>,
{
    let proximity = catalog::proximity_meters(category);
    Ok(scan_json::<u64, Resource, _>(resources)?
        .iter()
        .filter(|r| r.category == category)
        .filter_map(|r| r.anchor.coordinates())
        .map(|c| point.distance_km(&c) * 1000.0)
        .find(|meters| *meters < proximity))
}

fn entrances_by_building<R>(table: &R) -> Result<HashMap<u64, Vec<Entrance>>>
where
    R: ReadableTable<u64, &'static [u8]>,
{
    let mut grouped: HashMap<u64, Vec<Entrance>> = HashMap::new();
    for entrance in scan_json::<u64, Entrance, _>(table)? {
        grouped.entry(entrance.building_id).or_default().push(entrance);
    }
    Ok(grouped)
}

fn vote_key(submission_id: u64, user_id: &str) -> String {
    format!("{:020}:{}", submission_id, user_id)
}

fn votes_for<R>(votes: &R, submission_id: u64) -> Result<Vec<Vote>>
where
    R: ReadableTable<&'static str, &'static [u8]>,
{
    let prefix = format!("{:020}:", submission_id);
    let mut found = Vec::new();
    for entry in votes.range(prefix.as_str()..)? {
        let (key, value) = entry?;
        if !key.value().starts_with(&prefix) {
            break;
        }
        found.push(serde_json::from_slice(value.value())?);
    }
    Ok(found)
}

fn next_id(txn: &WriteTransaction, sequence: &str) -> Result<u64> {
    let mut counters = txn.open_table(COUNTERS)?;
    let next = counters.get(sequence)?.map(|v| v.value()).unwrap_or(0) + 1;
    counters.insert(sequence, next)?;
    Ok(next)
}

fn get_json<T, R>(table: &R, id: u64) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<u64, &'static [u8]>,
{
    match table.get(id)? {
        Some(data) => Ok(Some(serde_json::from_slice(data.value())?)),
        None => Ok(None),
    }
}

fn scan_json<K, T, R>(table: &R) -> Result<Vec<T>>
where
    K: Key + 'static,
    T: DeserializeOwned,
    R: ReadableTable<K, &'static [u8]>,
{
    let mut items = Vec::new();
    for entry in table.iter()? {
        let (_, data) = entry?;
        items.push(serde_json::from_slice(data.value())?);
    }
    Ok(items)
}

fn put_json<T: Serialize>(
    table: &mut Table<u64, &'static [u8]>,
    id: u64,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_vec(value)?;
    table.insert(id, json.as_slice())?;
    Ok(())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
