//! Land-area normalization across the hilly (ropani/aana/paisa/dam) and Terai
//! (bigha/katha/dhur) unit systems.
//!
//! A listing stores whichever system the owner entered together with a
//! canonical `total_area_sqft`. [`AreaNormalizer`] derives the active system,
//! clears the other one and recomputes the total. It runs before every write.

use serde::{Deserialize, Serialize};

pub const ROPANI_SQFT: f64 = 5476.0;
pub const AANA_SQFT: f64 = 342.25;
pub const PAISA_SQFT: f64 = 85.56;
pub const DAM_SQFT: f64 = 21.39;
pub const BIGHA_SQFT: f64 = 72900.0;
pub const KATHA_SQFT: f64 = 3645.0;
pub const DHUR_SQFT: f64 = 182.25;

/// Raw unit fields as persisted on a listing, plus the derived total.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandMeasurement {
    pub ropani: Option<u32>,
    pub aana: Option<u32>,
    pub paisa: Option<u32>,
    pub dam: Option<u32>,
    pub bigha: Option<u32>,
    pub katha: Option<u32>,
    pub dhur: Option<u32>,
    pub total_area_sqft: Option<f64>,
}

impl LandMeasurement {
    pub fn hilly(&self) -> HillyArea {
        HillyArea {
            ropani: self.ropani,
            aana: self.aana,
            paisa: self.paisa,
            dam: self.dam,
        }
    }

    pub fn terai(&self) -> TeraiArea {
        TeraiArea {
            bigha: self.bigha,
            katha: self.katha,
            dhur: self.dhur,
        }
    }

    fn clear_hilly(&mut self) {
        self.ropani = None;
        self.aana = None;
        self.paisa = None;
        self.dam = None;
    }

    fn clear_terai(&mut self) {
        self.bigha = None;
        self.katha = None;
        self.dhur = None;
    }
}

/// Hill-region units. 1 ropani = 16 aana = 64 paisa = 256 dam.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HillyArea {
    pub ropani: Option<u32>,
    pub aana: Option<u32>,
    pub paisa: Option<u32>,
    pub dam: Option<u32>,
}

impl HillyArea {
    /// Sum of the raw counts, unscaled.
    pub fn raw_sum(&self) -> u64 {
        [self.ropani, self.aana, self.paisa, self.dam]
            .into_iter()
            .map(count)
            .sum()
    }

    pub fn square_feet(&self) -> f64 {
        scaled(self.ropani, ROPANI_SQFT)
            + scaled(self.aana, AANA_SQFT)
            + scaled(self.paisa, PAISA_SQFT)
            + scaled(self.dam, DAM_SQFT)
    }
}

/// Plains units. 1 bigha = 20 katha = 400 dhur.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeraiArea {
    pub bigha: Option<u32>,
    pub katha: Option<u32>,
    pub dhur: Option<u32>,
}

impl TeraiArea {
    pub fn raw_sum(&self) -> u64 {
        [self.bigha, self.katha, self.dhur]
            .into_iter()
            .map(count)
            .sum()
    }

    pub fn square_feet(&self) -> f64 {
        scaled(self.bigha, BIGHA_SQFT) + scaled(self.katha, KATHA_SQFT) + scaled(self.dhur, DHUR_SQFT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    Hilly,
    Terai,
}

impl UnitSystem {
    pub const fn label(self) -> &'static str {
        match self {
            UnitSystem::Hilly => "hilly (ropani/aana/paisa/dam)",
            UnitSystem::Terai => "terai (bigha/katha/dhur)",
        }
    }
}

/// The unit system a measurement resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaSpec {
    Hilly(HillyArea),
    Terai(TeraiArea),
    Unset,
}

impl AreaSpec {
    /// Hilly wins whenever any hilly count is non-zero, even if Terai counts
    /// are present too.
    pub fn resolve(measurement: &LandMeasurement) -> Self {
        let hilly = measurement.hilly();
        if hilly.raw_sum() > 0 {
            return AreaSpec::Hilly(hilly);
        }

        let terai = measurement.terai();
        if terai.raw_sum() > 0 {
            return AreaSpec::Terai(terai);
        }

        AreaSpec::Unset
    }

    pub fn system(&self) -> Option<UnitSystem> {
        match self {
            AreaSpec::Hilly(_) => Some(UnitSystem::Hilly),
            AreaSpec::Terai(_) => Some(UnitSystem::Terai),
            AreaSpec::Unset => None,
        }
    }

    /// Canonical area; `None` when nothing was measured. Zero is never returned.
    pub fn total_sqft(&self) -> Option<f64> {
        let total = match self {
            AreaSpec::Hilly(area) => area.square_feet(),
            AreaSpec::Terai(area) => area.square_feet(),
            AreaSpec::Unset => return None,
        };
        (total > 0.0).then_some(total)
    }
}

/// Pre-persistence step enforcing unit-system exclusivity and the derived total.
#[derive(Debug, Clone, Copy, Default)]
pub struct AreaNormalizer;

impl AreaNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Clears the inactive unit group and recomputes `total_area_sqft`. An
    /// unmeasured record has every unit cleared, so zeros and absence read the same.
    pub fn normalize(&self, measurement: &mut LandMeasurement) -> AreaSpec {
        let spec = AreaSpec::resolve(measurement);
        match spec {
            AreaSpec::Hilly(_) => measurement.clear_terai(),
            AreaSpec::Terai(_) => measurement.clear_hilly(),
            AreaSpec::Unset => {
                measurement.clear_hilly();
                measurement.clear_terai();
            }
        }
        measurement.total_area_sqft = spec.total_sqft();
        spec
    }
}

fn count(value: Option<u32>) -> u64 {
    u64::from(value.unwrap_or(0))
}

fn scaled(value: Option<u32>, factor: f64) -> f64 {
    f64::from(value.unwrap_or(0)) * factor
}
