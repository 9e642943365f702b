//! Category policy: which categories live indoors, how close two outdoor
//! amenities of the same kind may sit before they count as duplicates, and
//! how legacy category names map onto the canonical ones.

/// Categories that are anchored to a building rather than to coordinates.
pub const INDOOR_CATEGORIES: &[&str] = &[
    "printer",
    "drinking_water_filler",
    "toilets",
    "computer_labs",
    "pantry",
    "game_room",
    "gender_neutral_bathrooms",
    "parking_service_desk",
    "id_card_desk",
    "charging_spots",
    "vending_machine",
    "study_room",
    "elevator",
    "cafeteria",
    "information_desk",
    "book_return",
    "quiet_study",
    "group_study_room",
    "ballroom",
    "food",
];

pub const DEFAULT_PROXIMITY_METERS: f64 = 30.0;

const OUTDOOR_PROXIMITY_METERS: &[(&str, f64)] = &[
    ("bench", 20.0),
    ("bus_stops", 30.0),
    ("food_trucks", 50.0),
    ("restaurants", 50.0),
    ("gym", 100.0),
    ("photographic_spots", 100.0),
    ("bike_rack", 30.0),
    ("garden_area", 50.0),
    // outdoor SINC sites
    ("study_room", 50.0),
];

const CATEGORY_ALIASES: &[(&str, &str)] = &[
    ("drinking_water", "drinking_water_filler"),
    ("restroom", "toilets"),
    ("computer_lab", "computer_labs"),
    ("charging_spot", "charging_spots"),
    ("bus_stop", "bus_stops"),
    ("food_truck", "food_trucks"),
    ("restaurant", "restaurants"),
    ("photographic_spot", "photographic_spots"),
    ("gaming_room", "game_room"),
];

pub fn is_indoor(category: &str) -> bool {
    INDOOR_CATEGORIES.contains(&category)
}

/// Radius within which an outdoor amenity of `category` is considered a duplicate.
pub fn proximity_meters(category: &str) -> f64 {
    OUTDOOR_PROXIMITY_METERS
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, meters)| *meters)
        .unwrap_or(DEFAULT_PROXIMITY_METERS)
}

pub fn standardize_category(category: &str) -> &str {
    CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == category)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(category)
}

/// Display name given to a resource created from a verified submission.
pub fn verified_resource_name(category: &str) -> String {
    format!("Verified {}", category.replace('_', " "))
}
