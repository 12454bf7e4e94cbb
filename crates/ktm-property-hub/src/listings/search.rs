use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{Listing, ListingPurpose, PropertyType};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingOrdering {
    #[default]
    #[serde(rename = "-created_at")]
    NewestFirst,
    #[serde(rename = "created_at")]
    OldestFirst,
    #[serde(rename = "total_area_sqft")]
    SmallestArea,
    #[serde(rename = "-total_area_sqft")]
    LargestArea,
    #[serde(rename = "price")]
    CheapestFirst,
    #[serde(rename = "-price")]
    PriciestFirst,
}

/// Public search parameters; every filter is optional and they combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingQuery {
    pub listing_purpose: Option<ListingPurpose>,
    pub property_type: Option<PropertyType>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub min_area_sqft: Option<f64>,
    pub max_area_sqft: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub ordering: Option<ListingOrdering>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingPage {
    pub count: usize,
    pub results: Vec<Listing>,
}

impl ListingQuery {
    pub fn matches(&self, listing: &Listing) -> bool {
        let details = &listing.details;
        if !details.is_active {
            return false;
        }
        if self
            .listing_purpose
            .is_some_and(|purpose| purpose != details.listing_purpose)
        {
            return false;
        }
        if self
            .property_type
            .is_some_and(|kind| kind != details.property_type)
        {
            return false;
        }
        if !text_matches(self.state.as_deref(), details.state.as_deref())
            || !text_matches(self.district.as_deref(), details.district.as_deref())
        {
            return false;
        }

        within(
            listing.land.total_area_sqft,
            self.min_area_sqft,
            self.max_area_sqft,
        ) && within(details.price, self.min_price, self.max_price)
    }

    /// Filters, sorts and paginates `listings`.
    pub fn apply(&self, listings: Vec<Listing>) -> ListingPage {
        let mut matching: Vec<Listing> = listings
            .into_iter()
            .filter(|listing| self.matches(listing))
            .collect();

        let ordering = self.ordering.unwrap_or_default();
        matching.sort_by(|a, b| compare(ordering, a, b));

        let count = matching.len();
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let results = matching
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(limit)
            .collect();

        ListingPage { count, results }
    }
}

fn text_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted.map(str::trim).filter(|value| !value.is_empty()) {
        None => true,
        Some(wanted) => actual.is_some_and(|actual| actual.eq_ignore_ascii_case(wanted)),
    }
}

/// A bound excludes listings that have no value to compare.
fn within(value: Option<f64>, min: Option<f64>, max: Option<f64>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

fn compare(ordering: ListingOrdering, a: &Listing, b: &Listing) -> Ordering {
    match ordering {
        ListingOrdering::NewestFirst => b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)),
        ListingOrdering::OldestFirst => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        ListingOrdering::SmallestArea => {
            missing_last(a.land.total_area_sqft, b.land.total_area_sqft, false)
        }
        ListingOrdering::LargestArea => {
            missing_last(a.land.total_area_sqft, b.land.total_area_sqft, true)
        }
        ListingOrdering::CheapestFirst => missing_last(a.details.price, b.details.price, false),
        ListingOrdering::PriciestFirst => missing_last(a.details.price, b.details.price, true),
    }
}

fn missing_last(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ordering = a.total_cmp(&b);
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::area::LandMeasurement;
    use crate::listings::domain::{ListingDetails, ListingId, PrincipalId};
    use chrono::{Duration, TimeZone, Utc};

    fn listing(id: u64, purpose: ListingPurpose, area: Option<f64>, price: Option<f64>) -> Listing {
        let created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(id as i64);
        let mut details = ListingDetails::new(purpose, PropertyType::Land, format!("Plot {id}"));
        details.state = Some("Bagmati".to_string());
        details.district = Some("Kathmandu".to_string());
        details.price = price;
        Listing {
            id: ListingId(id),
            owner: PrincipalId("owner".to_string()),
            details,
            land: LandMeasurement {
                total_area_sqft: area,
                ..Default::default()
            },
            facilities: Vec::new(),
            images: Vec::new(),
            last_image_id: 0,
            revision: 0,
            created_at,
            updated_at: created_at,
        }
    }

    fn ids(page: &ListingPage) -> Vec<u64> {
        page.results.iter().map(|listing| listing.id.0).collect()
    }

    #[test]
    fn default_ordering_is_newest_first_and_skips_inactive() {
        let mut hidden = listing(3, ListingPurpose::Sell, None, None);
        hidden.details.is_active = false;
        let listings = vec![
            listing(1, ListingPurpose::Sell, None, None),
            listing(2, ListingPurpose::Rent, None, None),
            hidden,
        ];

        let page = ListingQuery::default().apply(listings);
        assert_eq!(page.count, 2);
        assert_eq!(ids(&page), vec![2, 1]);
    }

    #[test]
    fn area_bounds_exclude_unmeasured_listings() {
        let listings = vec![
            listing(1, ListingPurpose::Sell, Some(5476.0), None),
            listing(2, ListingPurpose::Sell, Some(149_445.0), None),
            listing(3, ListingPurpose::Sell, None, None),
        ];
        let query = ListingQuery {
            min_area_sqft: Some(1000.0),
            max_area_sqft: Some(10_000.0),
            ..Default::default()
        };
        assert_eq!(ids(&query.apply(listings)), vec![1]);
    }

    #[test]
    fn area_ordering_puts_missing_last() {
        let listings = vec![
            listing(1, ListingPurpose::Sell, None, None),
            listing(2, ListingPurpose::Sell, Some(729.0), None),
            listing(3, ListingPurpose::Sell, Some(5476.0), None),
        ];
        let largest = ListingQuery {
            ordering: Some(ListingOrdering::LargestArea),
            ..Default::default()
        };
        assert_eq!(ids(&largest.apply(listings.clone())), vec![3, 2, 1]);

        let smallest = ListingQuery {
            ordering: Some(ListingOrdering::SmallestArea),
            ..Default::default()
        };
        assert_eq!(ids(&smallest.apply(listings)), vec![2, 3, 1]);
    }

    #[test]
    fn filters_on_purpose_location_and_price() {
        let listings = vec![
            listing(1, ListingPurpose::Sell, None, Some(4_500_000.0)),
            listing(2, ListingPurpose::Rent, None, Some(25_000.0)),
            listing(3, ListingPurpose::Sell, None, Some(9_000_000.0)),
        ];
        let query = ListingQuery {
            listing_purpose: Some(ListingPurpose::Sell),
            district: Some("kathmandu".to_string()),
            max_price: Some(5_000_000.0),
            ..Default::default()
        };
        assert_eq!(ids(&query.apply(listings.clone())), vec![1]);

        let elsewhere = ListingQuery {
            state: Some("Gandaki".to_string()),
            ..Default::default()
        };
        assert_eq!(elsewhere.apply(listings).count, 0);
    }

    #[test]
    fn pagination_reports_full_count() {
        let listings = (1..=5)
            .map(|id| listing(id, ListingPurpose::Sell, None, None))
            .collect();
        let query = ListingQuery {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        };
        let page = query.apply(listings);
        assert_eq!(page.count, 5);
        assert_eq!(ids(&page), vec![4, 3]);
    }

    #[test]
    fn ordering_parses_from_query_strings() {
        let ordering: ListingOrdering =
            serde_json::from_str("\"-total_area_sqft\"").expect("known ordering");
        assert_eq!(ordering, ListingOrdering::LargestArea);
    }
}
