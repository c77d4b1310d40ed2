//! Daily forecasts as CSV, one row per scenario and day.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use crate::{
    pipeline::{end_use::EndUse, orchestrator::ResultSet},
    prelude::*,
};

fn header() -> impl Iterator<Item = &'static str> {
    ["scenario", "date", "total_kwh"].into_iter().chain(EndUse::ALL.map(EndUse::column_name))
}

#[instrument(skip_all, fields(path = %path.display()))]
pub fn export_csv(results: &ResultSet, path: &Path) -> Result {
    let file =
        File::create(path).with_context(|| format!("failed to create `{}`", path.display()))?;
    let n_rows = write_csv(results, BufWriter::new(file))?;
    info!(n_rows, "exported");
    Ok(())
}

/// Write the successful forecasts, failed scenarios are skipped.
pub fn write_csv(results: &ResultSet, writer: impl Write) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(header())?;

    let mut n_rows = 0;
    for (index, forecast) in results.forecasts() {
        for (date, total, end_uses) in forecast.days() {
            writer.write_record(
                [index.to_string(), date.to_string(), format!("{:.4}", total.0)]
                    .into_iter()
                    .chain(end_uses.iter().map(|(_, energy)| format!("{:.4}", energy.0))),
            )?;
            n_rows += 1;
        }
    }

    writer.flush()?;
    Ok(n_rows)
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use retrofit_quantities::energy::KilowattHours;

    use super::*;
    use crate::pipeline::{
        PipelineError,
        end_use::EndUseMap,
        orchestrator::Forecast,
        scenario::ScenarioIndex,
        testing::start,
    };

    fn forecast(n_days: usize, total: f64) -> Forecast {
        let dates = start().iter_days().take(n_days).collect_vec();
        Forecast {
            total: dates.iter().map(|_| KilowattHours(total)).collect(),
            end_uses: dates
                .iter()
                .map(|_| {
                    EndUseMap::from_fn(|end_use| {
                        if end_use == EndUse::Hvac {
                            KilowattHours(total)
                        } else {
                            KilowattHours::ZERO
                        }
                    })
                })
                .collect(),
            dates,
        }
    }

    #[test]
    fn test_write_csv() -> Result {
        let results = ResultSet::from_iter([
            (ScenarioIndex(1), Ok(forecast(3, 1.5))),
            (ScenarioIndex(2), Err(PipelineError::model_inference("boom"))),
            (ScenarioIndex(3), Ok(forecast(2, 2.0))),
        ]);
        let mut buffer = Vec::new();
        assert_eq!(write_csv(&results, &mut buffer)?, 5);

        let csv = String::from_utf8(buffer)?;
        let lines = csv.lines().collect_vec();
        assert_eq!(lines.len(), 6);
        assert_eq!(
            lines[0],
            "scenario,date,total_kwh,hvac_kwh,dhw_kwh,appliances_kwh,lighting_kwh,spa_kwh,pool_kwh",
        );
        assert_eq!(lines[1], "1,2021-01-01,1.5000,1.5000,0.0000,0.0000,0.0000,0.0000,0.0000");
        assert!(lines[4].starts_with("3,2021-01-01,2.0000,"));
        Ok(())
    }
}
