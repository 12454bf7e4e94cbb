use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::area::LandMeasurement;

/// Identifier assigned by the listing repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub u64);

impl ListingId {
    /// Placeholder carried by a listing that has not been inserted yet.
    pub const UNASSIGNED: ListingId = ListingId(0);
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityId(pub u32);

/// Stable identifier of an authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(pub String);

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller identity handed over by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: PrincipalId,
    /// Administrative editors may change any listing.
    pub is_staff: bool,
}

impl Principal {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: PrincipalId(id.into()),
            is_staff: false,
        }
    }

    pub fn staff(id: impl Into<String>) -> Self {
        Self {
            id: PrincipalId(id.into()),
            is_staff: true,
        }
    }

    pub fn can_edit(&self, listing: &Listing) -> bool {
        self.is_staff || self.id == listing.owner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingPurpose {
    Buy,
    Sell,
    Rent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyType {
    Land,
    House,
    Apartment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceNegotiability {
    Fixed,
    Negotiable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoadCondition {
    Any,
    Pitched,
    Graveled,
    Soil,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacingDirection {
    #[serde(rename = "ANY")]
    Any,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "W")]
    West,
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "NE")]
    Northeast,
    #[serde(rename = "NW")]
    Northwest,
    #[serde(rename = "SE")]
    Southeast,
    #[serde(rename = "SW")]
    Southwest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LandType {
    Residential,
    Commercial,
    Agricultural,
    Industrial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyCondition {
    Any,
    New,
    JustUsed,
    #[serde(rename = "USED_LESS_5")]
    UsedLessThanFive,
    #[serde(rename = "USED_MORE_5")]
    UsedMoreThanFive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Furnishing {
    Full,
    Semi,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentDurationUnit {
    Months,
    Years,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RentPeriod {
    Monthly,
    Yearly,
}

fn active_by_default() -> bool {
    true
}

/// Owner-editable listing attributes shared by submissions and stored listings.
///
/// `*_min` fields describe the lower bound of what a buyer is looking for and
/// only apply to `BUY` listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDetails {
    pub listing_purpose: ListingPurpose,
    pub property_type: PropertyType,
    pub title: String,
    pub description: Option<String>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,

    pub state: Option<String>,
    pub district: Option<String>,
    pub local_area: Option<String>,

    pub price_min: Option<f64>,
    pub price: Option<f64>,
    pub price_negotiable: Option<PriceNegotiability>,

    pub land_type: Option<LandType>,
    pub road_size_min_ft: Option<u32>,
    pub road_size_ft: Option<u32>,
    pub road_condition: Option<RoadCondition>,
    pub facing_direction: Option<FacingDirection>,

    pub property_condition: Option<PropertyCondition>,
    pub built_year_bs: Option<u32>,
    pub built_year_ad: Option<u32>,
    pub floors_min: Option<u32>,
    pub floors: Option<u32>,
    pub master_bedrooms_min: Option<u32>,
    pub master_bedrooms: Option<u32>,
    pub common_bedrooms_min: Option<u32>,
    pub common_bedrooms: Option<u32>,
    pub common_bathrooms_min: Option<u32>,
    pub common_bathrooms: Option<u32>,
    pub living_rooms_min: Option<u32>,
    pub living_rooms: Option<u32>,
    pub kitchens_min: Option<u32>,
    pub kitchens: Option<u32>,
    #[serde(default)]
    pub has_laundry: bool,
    #[serde(default)]
    pub has_store: bool,
    #[serde(default)]
    pub has_puja_room: bool,
    pub furnishing: Option<Furnishing>,
    pub parking_car_min: Option<u32>,
    pub parking_car: Option<u32>,
    pub parking_bike_min: Option<u32>,
    pub parking_bike: Option<u32>,

    pub rent_duration_value: Option<u32>,
    pub rent_duration_unit: Option<RentDurationUnit>,
    pub rent_period: Option<RentPeriod>,

    pub other_facilities: Option<String>,
}

impl ListingDetails {
    /// Minimal details for a listing; every optional attribute starts empty.
    pub fn new(
        listing_purpose: ListingPurpose,
        property_type: PropertyType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            listing_purpose,
            property_type,
            title: title.into(),
            description: None,
            is_active: true,
            state: None,
            district: None,
            local_area: None,
            price_min: None,
            price: None,
            price_negotiable: None,
            land_type: None,
            road_size_min_ft: None,
            road_size_ft: None,
            road_condition: None,
            facing_direction: None,
            property_condition: None,
            built_year_bs: None,
            built_year_ad: None,
            floors_min: None,
            floors: None,
            master_bedrooms_min: None,
            master_bedrooms: None,
            common_bedrooms_min: None,
            common_bedrooms: None,
            common_bathrooms_min: None,
            common_bathrooms: None,
            living_rooms_min: None,
            living_rooms: None,
            kitchens_min: None,
            kitchens: None,
            has_laundry: false,
            has_store: false,
            has_puja_room: false,
            furnishing: None,
            parking_car_min: None,
            parking_car: None,
            parking_bike_min: None,
            parking_bike: None,
            rent_duration_value: None,
            rent_duration_unit: None,
            rent_period: None,
            other_facilities: None,
        }
    }

    /// Paired `(min_field, minimum, value)` ranges used for buyer requests.
    pub(crate) fn count_ranges(&self) -> [(&'static str, Option<u32>, Option<u32>); 9] {
        [
            ("road_size_min_ft", self.road_size_min_ft, self.road_size_ft),
            ("floors_min", self.floors_min, self.floors),
            ("master_bedrooms_min", self.master_bedrooms_min, self.master_bedrooms),
            ("common_bedrooms_min", self.common_bedrooms_min, self.common_bedrooms),
            ("common_bathrooms_min", self.common_bathrooms_min, self.common_bathrooms),
            ("living_rooms_min", self.living_rooms_min, self.living_rooms),
            ("kitchens_min", self.kitchens_min, self.kitchens),
            ("parking_car_min", self.parking_car_min, self.parking_car),
            ("parking_bike_min", self.parking_bike_min, self.parking_bike),
        ]
    }
}

/// Inbound payload for creating or replacing a listing.
///
/// Land units are signed on the wire so that negative counts surface as a
/// validation error naming the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSubmission {
    #[serde(flatten)]
    pub details: ListingDetails,
    #[serde(flatten)]
    pub land: LandUnitsInput,
    #[serde(default)]
    pub facilities: Vec<FacilityId>,
}

impl ListingSubmission {
    pub fn new(details: ListingDetails) -> Self {
        Self {
            details,
            land: LandUnitsInput::default(),
            facilities: Vec::new(),
        }
    }
}

/// Unchecked land unit counts as received from a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandUnitsInput {
    pub ropani: Option<i64>,
    pub aana: Option<i64>,
    pub paisa: Option<i64>,
    pub dam: Option<i64>,
    pub bigha: Option<i64>,
    pub katha: Option<i64>,
    pub dhur: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: FacilityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyImage {
    pub id: ImageId,
    /// Reference returned by the image store.
    pub image: String,
    pub caption: Option<String>,
    pub is_thumbnail: bool,
}

/// Persisted listing. `land.total_area_sqft` is derived, never client supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner: PrincipalId,
    #[serde(flatten)]
    pub details: ListingDetails,
    #[serde(flatten)]
    pub land: LandMeasurement,
    pub facilities: Vec<Facility>,
    pub images: Vec<PropertyImage>,
    /// Highest image id ever issued for this listing; ids are never reused.
    #[serde(default)]
    pub last_image_id: u64,
    /// Bumped by the repository on every update; stale writes are rejected.
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub(crate) fn next_image_id(&mut self) -> ImageId {
        self.last_image_id += 1;
        ImageId(self.last_image_id)
    }
}
