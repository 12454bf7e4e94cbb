//! Nepal's provinces and districts, plus the admin-approved facility checklist.

use serde::Serialize;

use super::domain::{Facility, FacilityId};

const NEPAL_LOCATIONS: &[(&str, &[&str])] = &[
    (
        "Koshi",
        &[
            "Bhojpur",
            "Dhankuta",
            "Ilam",
            "Jhapa",
            "Khotang",
            "Morang",
            "Okhaldunga",
            "Panchthar",
            "Sankhuwasabha",
            "Solukhumbu",
            "Sunsari",
            "Taplejung",
            "Terhathum",
            "Udayapur",
        ],
    ),
    (
        "Madhesh",
        &[
            "Bara", "Dhanusha", "Mahottari", "Parsa", "Rautahat", "Saptari", "Sarlahi", "Siraha",
        ],
    ),
    (
        "Bagmati",
        &[
            "Bhaktapur",
            "Chitwan",
            "Dhading",
            "Dolakha",
            "Kathmandu",
            "Kavrepalanchok",
            "Lalitpur",
            "Makwanpur",
            "Nuwakot",
            "Ramechhap",
            "Rasuwa",
            "Sindhuli",
            "Sindhupalchok",
        ],
    ),
    (
        "Gandaki",
        &[
            "Baglung", "Gorkha", "Kaski", "Lamjung", "Manang", "Mustang", "Myagdi", "Nawalpur",
            "Parbat", "Syangja", "Tanahun",
        ],
    ),
    (
        "Lumbini",
        &[
            "Arghakhanchi",
            "Banke",
            "Bardiya",
            "Dang",
            "Gulmi",
            "Kapilvastu",
            "Parasi",
            "Palpa",
            "Pyuthan",
            "Rolpa",
            "Rupandehi",
            "Rukum East",
        ],
    ),
    (
        "Karnali",
        &[
            "Dailekh",
            "Dolpa",
            "Humla",
            "Jajarkot",
            "Jumla",
            "Kalikot",
            "Mugu",
            "Rukum West",
            "Salyan",
            "Surkhet",
        ],
    ),
    (
        "Sudurpashchim",
        &[
            "Achham",
            "Baitadi",
            "Bajhang",
            "Bajura",
            "Dadeldhura",
            "Darchula",
            "Doti",
            "Kailali",
            "Kanchanpur",
        ],
    ),
];

const STANDARD_FACILITIES: &[&str] = &[
    "Drinking Water",
    "Electricity Backup",
    "Internet",
    "Security Guard",
    "CCTV",
    "Lift",
    "Garden",
    "Drainage",
    "Solar Water Heater",
    "Swimming Pool",
    "Gym",
    "Waste Management",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct State {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct District {
    pub id: u32,
    pub state: u32,
    pub name: String,
}

/// Read-only state/district lookup.
#[derive(Debug, Clone)]
pub struct LocationDirectory {
    states: Vec<State>,
    districts: Vec<District>,
}

impl LocationDirectory {
    pub fn nepal() -> Self {
        let mut states = Vec::with_capacity(NEPAL_LOCATIONS.len());
        let mut districts = Vec::new();

        for (state_index, (state_name, district_names)) in NEPAL_LOCATIONS.iter().enumerate() {
            let state_id = state_index as u32 + 1;
            states.push(State {
                id: state_id,
                name: (*state_name).to_string(),
            });
            for name in district_names.iter() {
                districts.push(District {
                    id: districts.len() as u32 + 1,
                    state: state_id,
                    name: (*name).to_string(),
                });
            }
        }

        Self { states, districts }
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Resolves a state by numeric id or case-insensitive name.
    pub fn state(&self, key: &str) -> Option<&State> {
        let key = key.trim();
        match key.parse::<u32>() {
            Ok(id) => self.states.iter().find(|state| state.id == id),
            Err(_) => self
                .states
                .iter()
                .find(|state| state.name.eq_ignore_ascii_case(key)),
        }
    }

    pub fn districts_of(&self, state: &State) -> Vec<District> {
        self.districts
            .iter()
            .filter(|district| district.state == state.id)
            .cloned()
            .collect()
    }

    pub fn district(&self, name: &str) -> Option<&District> {
        let name = name.trim();
        self.districts
            .iter()
            .find(|district| district.name.eq_ignore_ascii_case(name))
    }
}

impl Default for LocationDirectory {
    fn default() -> Self {
        Self::nepal()
    }
}

/// Admin-approved facilities that populate the listing checklist.
#[derive(Debug, Clone)]
pub struct FacilityCatalog {
    facilities: Vec<Facility>,
}

impl FacilityCatalog {
    /// Builds a catalog from unique names; later duplicates (case-insensitive) are dropped.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut facilities: Vec<Facility> = Vec::new();
        for name in names {
            let name = name.into().trim().to_string();
            if name.is_empty()
                || facilities
                    .iter()
                    .any(|facility| facility.name.eq_ignore_ascii_case(&name))
            {
                continue;
            }
            facilities.push(Facility {
                id: FacilityId(facilities.len() as u32 + 1),
                name,
            });
        }
        Self { facilities }
    }

    pub fn standard() -> Self {
        Self::new(STANDARD_FACILITIES.iter().copied())
    }

    pub fn all(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn get(&self, id: FacilityId) -> Option<&Facility> {
        self.facilities.iter().find(|facility| facility.id == id)
    }
}

impl Default for FacilityCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
