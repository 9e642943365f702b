//! Built-in Stony Brook campus dataset.

use crate::catalog::standardize_category;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::geo::Coordinates;
use crate::models::Anchor;

pub struct EntranceSeed {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

pub struct IndoorSeed {
    pub name: &'static str,
    pub category: &'static str,
    pub floor: i32,
    pub description: &'static str,
}

pub struct BuildingSeed {
    pub name: &'static str,
    pub campus_area: &'static str,
    pub entrances: &'static [EntranceSeed],
    pub resources: &'static [IndoorSeed],
}

pub struct OutdoorSeed {
    pub name: &'static str,
    pub category: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub description: &'static str,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub buildings: usize,
    pub entrances: usize,
    pub resources: usize,
}

const fn indoor(
    name: &'static str,
    category: &'static str,
    floor: i32,
    description: &'static str,
) -> IndoorSeed {
    IndoorSeed {
        name,
        category,
        floor,
        description,
    }
}

const fn outdoor(
    name: &'static str,
    category: &'static str,
    lat: f64,
    lon: f64,
    description: &'static str,
) -> OutdoorSeed {
    OutdoorSeed {
        name,
        category,
        lat,
        lon,
        description,
    }
}

const fn entrance(name: &'static str, lat: f64, lon: f64) -> EntranceSeed {
    EntranceSeed { name, lat, lon }
}

#[rustfmt::skip]
pub const BUILDINGS: &[BuildingSeed] = &[
    BuildingSeed {
        name: "Melville Library",
        campus_area: "Academic Mall",
        entrances: &[
            entrance("Main Entrance (Fountain)", 40.9149, -73.1232),
            entrance("Side Entrance (SAC)", 40.9145, -73.1230),
        ],
        resources: &[
            indoor("Printer - Mellville Library", "printer", 1, "Below main Staircase."),
            indoor("Drinking water - Mellville Library", "drinking_water", 1, "Near the restrooms."),
            indoor("Study Room A - Mellville Library", "study_room", 2, "Second floor, next to the computer lab."),
            indoor("Restrooms - Mellville Library", "restroom", 1, "First floor, near the main entrance."),
            indoor("Computer Lab - Mellville Library", "computer_lab", 2, "Second floor, beside Study Room A."),
            indoor("Elevator - Mellville Library", "elevator", 1, "Near the main entrance, provides access to all floors."),
            indoor("Cafeteria - Mellville Library", "cafeteria", 1, "First floor, adjacent to the reading area."),
            indoor("Information Desk - Mellville Library", "information_desk", 1, "Located at the main entrance for assistance."),
            indoor("Book Return - Mellville Library", "book_return", 1, "Next to the Information Desk."),
            indoor("Quiet Study Area - Mellville Library", "quiet_study", 2, "Second floor, at the back of the library."),
            indoor("Group Study Room B - Mellville Library", "group_study_room", 2, "Second floor, near the Quiet Study Area."),
            indoor("Charging Spot - Mellville Library", "charging_spot", 1, "Central Reading room."),
        ],
    },
    BuildingSeed {
        name: "Student Activities Center (SAC)",
        campus_area: "Academic Mall",
        entrances: &[
            entrance("Main Entrance (by Bus Loop)", 40.9139, -73.1230),
            entrance("Auditorium Entrance", 40.9141, -73.1235),
        ],
        resources: &[
            indoor("SAC Indoor Printer", "printer", 1, "Near the West entrance of SAC, up the stairs."),
            indoor("SAC Indoor Restrooms", "restroom", 1, "Located on the first floor down the hallway to the right from the West entrance."),
            indoor("SAC Ballroom A & B", "ballroom", 1, "Located on the first floor down the hallway to the right from the West entrance."),
            indoor("Dunkin Donuts - SAC", "food", 1, "Up the stairs near West entrance."),
        ],
    },
    BuildingSeed {
        name: "Javits Center",
        campus_area: "Academic Mall",
        entrances: &[entrance("Main Lecture Hall Entrance", 40.9157, -73.1219)],
        resources: &[
            indoor("Javitz Printer", "printer", 1, "Located on the first floor near the central seating room."),
            indoor("Javitz Restrooms", "restroom", 1, "Located on the first floor near the central seating room."),
            indoor("Gender Neutral Restroom - Javitz", "gender_neutral_bathrooms", 2, "Located on the second floor."),
            indoor("Study Area - Javitz", "study_room", 2, "Located on the second floor."),
        ],
    },
    BuildingSeed {
        name: "Staller Center",
        campus_area: "Academic Mall",
        entrances: &[entrance("Main Entrance", 40.9158, -73.1245)],
        resources: &[],
    },
    BuildingSeed {
        name: "Stony Brook Union",
        campus_area: "Academic Mall",
        entrances: &[entrance("Main Entrance", 40.91655, -73.12234)],
        resources: &[
            indoor("SBU Union Printer", "printer", 1, "Located near the main entrance."),
            indoor("SBU Union Restrooms", "restroom", 1, "Located near the main entrance."),
            indoor("SBU Pantry - SBU Union", "pantry", 0, "Located on floor below the main entrance. Take the stairs down."),
            indoor("Gaming room - SBU Union", "gaming_room", 2, "Located on the floor below the main entrance. Take the stairs down."),
        ],
    },
];

#[rustfmt::skip]
pub const OUTDOOR: &[OutdoorSeed] = &[
    outdoor("Bike Rack - Outside Mellville Library", "bike_rack", 40.914943, -73.122649, "Located near the main entrance of the library."),
    outdoor("Bus Stop - Outside Mellville Library", "bus_stop", 40.914315, -73.124717, "Across the street from the library entrance."),
    outdoor("Garden Area - Outside Mellville Library", "garden_area", 40.915230, -73.122006, "To the left of the main entrance, featuring benches and greenery."),
    outdoor("SINC Sites - Outside Mellville Library", "study_room", 40.914943, -73.122649, "Left of International Student Center. South Entrance."),
    outdoor("SAC Plaza Benches", "bench", 40.914600, -73.123600, "Benches surrounding the fountain area."),
    outdoor("Food Trucks - SAC Plaza", "food_truck", 40.914700, -73.123500, "Food trucks located near SAC Plaza."),
    outdoor("Stony Brook University Sign", "photographic_spot", 40.915147, -73.119026, "Main sign at the entrance of Stony Brook University."),
    outdoor("Wolfie Statue", "photographic_spot", 40.914706, -73.122777, "North of SAC behind a bench."),
    outdoor("The East Side Dining", "restaurant", 40.916876, -73.120842, "Adjacent to Chavez hall."),
    outdoor("The West Side Dining", "restaurant", 40.912991, -73.130442, "Adjacent to Dewey Hall."),
    outdoor("ESS Building Bench", "bench", 40.9130, -73.1200, "Faces the fountain."),
];

/// Imports the built-in dataset. Categories are standardized; a second indoor
/// resource of the same category in one building is skipped.
pub fn seed_campus(db: &Database) -> Result<SeedSummary> {
    import(db, BUILDINGS, OUTDOOR)
}

/// Imports everything in one transaction, so a failure leaves the store
/// without any building and the next start seeds again.
pub fn import(
    db: &Database,
    buildings: &[BuildingSeed],
    outdoor: &[OutdoorSeed],
) -> Result<SeedSummary> {
    db.batch(|batch| {
        let mut summary = SeedSummary::default();

        for seed in buildings {
            let building = batch.insert_building(seed.name, Some(seed.campus_area))?;
            summary.buildings += 1;

            for e in seed.entrances {
                let at = Coordinates::new(e.lat, e.lon);
                batch.insert_entrance(building.id, Some(e.name), at)?;
                summary.entrances += 1;
            }

            for r in seed.resources {
                let floor = r.floor.to_string();
                let inserted = batch.insert_resource(
                    r.name,
                    standardize_category(r.category),
                    Some(r.description),
                    Some(&floor),
                    Anchor::Indoor {
                        building_id: building.id,
                    },
                );
                match inserted {
                    Ok(_) => summary.resources += 1,
                    Err(AppError::Duplicate(_)) => {
                        tracing::warn!(
                            "Skipping {}: {} already has a {} resource",
                            r.name,
                            seed.name,
                            r.category
                        );
                    }
                    Err(e) => return Err(e),
                }
            }
            tracing::debug!("Created building {}", seed.name);
        }

        for r in outdoor {
            batch.insert_resource(
                r.name,
                standardize_category(r.category),
                Some(r.description),
                None,
                Anchor::Outdoor {
                    lat: r.lat,
                    lon: r.lon,
                },
            )?;
            summary.resources += 1;
        }

        Ok(summary)
    })
}
