use super::area::LandMeasurement;
use super::domain::{Facility, LandUnitsInput, ListingDetails, ListingPurpose, ListingSubmission};
use super::taxonomy::{FacilityCatalog, LocationDirectory};

pub const MAX_TITLE_CHARS: usize = 255;

/// Rejections raised before a submission is allowed anywhere near storage.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("{field} must not be negative (found {value})")]
    NegativeUnit { field: &'static str, value: i64 },
    #[error("{field} is too large (found {value})")]
    UnitOutOfRange { field: &'static str, value: i64 },
    #[error("land size given in both hilly (ropani/aana/paisa/dam) and terai (bigha/katha/dhur) units")]
    MixedUnitSystems,
    #[error("title must not be blank")]
    BlankTitle,
    #[error("title exceeds {max} characters")]
    TitleTooLong { max: usize },
    #[error("{field} must be a non-negative amount")]
    InvalidPrice { field: &'static str },
    #[error("price_min ({min}) exceeds price ({price})")]
    PriceRangeInverted { min: f64, price: f64 },
    #[error("{field} only applies to BUY listings")]
    BuyOnlyField { field: &'static str },
    #[error("{field} ({min}) exceeds the listed value ({value})")]
    RangeInverted {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("unknown state '{0}'")]
    UnknownState(String),
    #[error("unknown district '{0}'")]
    UnknownDistrict(String),
    #[error("district given without a state")]
    DistrictWithoutState,
    #[error("district '{district}' is not part of state '{state}'")]
    DistrictOutsideState { district: String, state: String },
    #[error("unknown facility id {0}")]
    UnknownFacility(u32),
}

impl ListingValidationError {
    /// Name of the submission field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ListingValidationError::NegativeUnit { field, .. }
            | ListingValidationError::UnitOutOfRange { field, .. }
            | ListingValidationError::InvalidPrice { field }
            | ListingValidationError::BuyOnlyField { field }
            | ListingValidationError::RangeInverted { field, .. } => field,
            ListingValidationError::MixedUnitSystems => "land_size",
            ListingValidationError::BlankTitle | ListingValidationError::TitleTooLong { .. } => {
                "title"
            }
            ListingValidationError::PriceRangeInverted { .. } => "price_min",
            ListingValidationError::UnknownState(_) => "state",
            ListingValidationError::UnknownDistrict(_)
            | ListingValidationError::DistrictWithoutState
            | ListingValidationError::DistrictOutsideState { .. } => "district",
            ListingValidationError::UnknownFacility(_) => "facilities",
        }
    }
}

impl LandUnitsInput {
    /// Checks every count is a non-negative `u32` without applying any unit precedence.
    pub fn into_measurement(self) -> Result<LandMeasurement, ListingValidationError> {
        Ok(LandMeasurement {
            ropani: unit_count("ropani", self.ropani)?,
            aana: unit_count("aana", self.aana)?,
            paisa: unit_count("paisa", self.paisa)?,
            dam: unit_count("dam", self.dam)?,
            bigha: unit_count("bigha", self.bigha)?,
            katha: unit_count("katha", self.katha)?,
            dhur: unit_count("dhur", self.dhur)?,
            total_area_sqft: None,
        })
    }
}

fn unit_count(field: &'static str, value: Option<i64>) -> Result<Option<u32>, ListingValidationError> {
    match value {
        None => Ok(None),
        Some(value) if value < 0 => Err(ListingValidationError::NegativeUnit { field, value }),
        Some(value) => u32::try_from(value)
            .map(Some)
            .map_err(|_| ListingValidationError::UnitOutOfRange { field, value }),
    }
}

/// Knobs for the submission guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingPolicy {
    /// Reject submissions that fill in both unit systems instead of letting
    /// the hilly units silently win during normalization.
    pub strict_area_units: bool,
}

impl Default for ListingPolicy {
    fn default() -> Self {
        Self {
            strict_area_units: true,
        }
    }
}

/// Submission after validation: canonical location names, checked units,
/// resolved facilities.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedListing {
    pub details: ListingDetails,
    pub land: LandMeasurement,
    pub facilities: Vec<Facility>,
}

/// Guard producing [`ValidatedListing`] values from client submissions.
#[derive(Debug, Clone)]
pub struct ListingGuard {
    policy: ListingPolicy,
    locations: LocationDirectory,
    facilities: FacilityCatalog,
}

impl ListingGuard {
    pub fn new(
        policy: ListingPolicy,
        locations: LocationDirectory,
        facilities: FacilityCatalog,
    ) -> Self {
        Self {
            policy,
            locations,
            facilities,
        }
    }

    pub fn locations(&self) -> &LocationDirectory {
        &self.locations
    }

    pub fn facilities(&self) -> &FacilityCatalog {
        &self.facilities
    }

    pub fn validate(
        &self,
        submission: ListingSubmission,
    ) -> Result<ValidatedListing, ListingValidationError> {
        let ListingSubmission {
            mut details,
            land,
            facilities,
        } = submission;

        let land = land.into_measurement()?;
        if self.policy.strict_area_units && land.hilly().raw_sum() > 0 && land.terai().raw_sum() > 0
        {
            return Err(ListingValidationError::MixedUnitSystems);
        }

        let title = details.title.trim().to_string();
        if title.is_empty() {
            return Err(ListingValidationError::BlankTitle);
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ListingValidationError::TitleTooLong {
                max: MAX_TITLE_CHARS,
            });
        }
        details.title = title;

        check_prices(&details)?;
        check_ranges(&details)?;
        self.canonicalize_location(&mut details)?;

        let facilities = facilities
            .into_iter()
            .map(|id| {
                self.facilities
                    .get(id)
                    .cloned()
                    .ok_or(ListingValidationError::UnknownFacility(id.0))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut unique: Vec<Facility> = Vec::with_capacity(facilities.len());
        for facility in facilities {
            if !unique.iter().any(|existing| existing.id == facility.id) {
                unique.push(facility);
            }
        }

        Ok(ValidatedListing {
            details,
            land,
            facilities: unique,
        })
    }

    fn canonicalize_location(
        &self,
        details: &mut ListingDetails,
    ) -> Result<(), ListingValidationError> {
        let state = match non_blank(details.state.take()) {
            Some(raw) => Some(
                self.locations
                    .state(&raw)
                    .ok_or(ListingValidationError::UnknownState(raw))?
                    .clone(),
            ),
            None => None,
        };

        if let Some(raw) = non_blank(details.district.take()) {
            let district = self
                .locations
                .district(&raw)
                .ok_or_else(|| ListingValidationError::UnknownDistrict(raw.clone()))?;
            let state = state
                .as_ref()
                .ok_or(ListingValidationError::DistrictWithoutState)?;
            if district.state != state.id {
                return Err(ListingValidationError::DistrictOutsideState {
                    district: district.name.clone(),
                    state: state.name.clone(),
                });
            }
            details.district = Some(district.name.clone());
        }

        details.state = state.map(|state| state.name);
        details.local_area = non_blank(details.local_area.take());
        Ok(())
    }
}

impl Default for ListingGuard {
    fn default() -> Self {
        Self::new(
            ListingPolicy::default(),
            LocationDirectory::nepal(),
            FacilityCatalog::standard(),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn check_prices(details: &ListingDetails) -> Result<(), ListingValidationError> {
    for (field, amount) in [("price_min", details.price_min), ("price", details.price)] {
        if let Some(amount) = amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ListingValidationError::InvalidPrice { field });
            }
        }
    }

    if details.price_min.is_some() && details.listing_purpose != ListingPurpose::Buy {
        return Err(ListingValidationError::BuyOnlyField { field: "price_min" });
    }

    if let (Some(min), Some(price)) = (details.price_min, details.price) {
        if min > price {
            return Err(ListingValidationError::PriceRangeInverted { min, price });
        }
    }
    Ok(())
}

fn check_ranges(details: &ListingDetails) -> Result<(), ListingValidationError> {
    let is_buy = details.listing_purpose == ListingPurpose::Buy;
    for (field, min, value) in details.count_ranges() {
        let Some(min) = min else { continue };
        if !is_buy {
            return Err(ListingValidationError::BuyOnlyField { field });
        }
        if let Some(value) = value {
            if min > value {
                return Err(ListingValidationError::RangeInverted { field, min, value });
            }
        }
    }
    Ok(())
}
