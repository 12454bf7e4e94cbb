use clap::Args;
use ktm_property_hub::error::AppError;
use ktm_property_hub::listings::{AreaNormalizer, LandMeasurement, LandUnitsInput, UnitSystem};
use serde::Serialize;

#[derive(Args, Debug, Default)]
pub(crate) struct AreaArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) ropani: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) aana: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) paisa: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) dam: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) bigha: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) katha: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub(crate) dhur: Option<i64>,
    /// Emit the normalized measurement as JSON instead of a summary line.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AreaReport {
    pub(crate) unit_system: Option<UnitSystem>,
    #[serde(flatten)]
    pub(crate) measurement: LandMeasurement,
}

impl AreaReport {
    fn summary(&self) -> String {
        match (self.unit_system, self.measurement.total_area_sqft) {
            (Some(system), Some(total)) => format!("{}: {:.2} sq ft", system.label(), total),
            _ => "no land units given".to_string(),
        }
    }
}

pub(crate) fn build_report(args: &AreaArgs) -> Result<AreaReport, AppError> {
    let input = LandUnitsInput {
        ropani: args.ropani,
        aana: args.aana,
        paisa: args.paisa,
        dam: args.dam,
        bigha: args.bigha,
        katha: args.katha,
        dhur: args.dhur,
    };
    let mut measurement = input.into_measurement()?;
    let spec = AreaNormalizer::new().normalize(&mut measurement);
    Ok(AreaReport {
        unit_system: spec.system(),
        measurement,
    })
}

pub(crate) fn run_area(args: AreaArgs) -> Result<(), AppError> {
    let report = build_report(&args)?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|err| AppError::Io(std::io::Error::other(err)))?;
        println!("{rendered}");
    } else {
        println!("{}", report.summary());
    }
    Ok(())
}
