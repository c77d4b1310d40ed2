use average::Mean;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;
use retrofit_quantities::energy::KilowattHours;

use crate::{
    fmt::FormattedShare,
    pipeline::{
        end_use::EndUse,
        orchestrator::ResultSet,
        reference::ReferenceMapping,
        scenario::ScenarioIndex,
    },
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn scenario_cell(index: ScenarioIndex) -> Cell {
    Cell::new(format!("#{index}")).add_attribute(Attribute::Bold)
}

/// Annual total and mean daily consumption per scenario.
pub fn build_annual_table(results: &ResultSet) -> Table {
    let mean_annual: KilowattHours = {
        let estimate: Mean =
            results.forecasts().map(|(_, forecast)| forecast.annual_total().0).collect();
        if estimate.is_empty() { KilowattHours::ZERO } else { KilowattHours(estimate.mean()) }
    };

    let mut table = new_table();
    table.set_header(vec!["Scenario", "Annual", "Daily mean", "Negative days"]);
    for (index, forecast) in results.forecasts() {
        let annual_total = forecast.annual_total();
        let n_negative =
            forecast.total.as_slice().iter().filter(|total| total.is_negative()).count();
        table.add_row(vec![
            scenario_cell(index),
            Cell::new(annual_total)
                .set_alignment(CellAlignment::Right)
                .fg(if annual_total > mean_annual { Color::Red } else { Color::Green }),
            Cell::new(forecast.mean_daily_total()).set_alignment(CellAlignment::Right),
            Cell::new(n_negative)
                .set_alignment(CellAlignment::Right)
                .fg(if n_negative == 0 { Color::Reset } else { Color::DarkYellow })
                .add_attribute(Attribute::Dim),
        ]);
    }
    table
}

/// Annual consumption per end use, with its share of the annual total.
pub fn build_end_use_table(results: &ResultSet) -> Table {
    let mut table = new_table();
    table.set_header(
        ["Scenario"].into_iter().map(Cell::new).chain(
            EndUse::ALL
                .into_iter()
                .map(|end_use| Cell::new(end_use).fg(end_use.color()))
                .chain(std::iter::once(Cell::new("Total"))),
        ),
    );
    for (index, forecast) in results.forecasts() {
        let annual_total = forecast.annual_total();
        let annual_end_uses = forecast.annual_end_uses();
        let cells = annual_end_uses.iter().map(|(end_use, energy)| {
            Cell::new(format!("{energy}\n{}", FormattedShare::of(energy, annual_total)))
                .set_alignment(CellAlignment::Right)
                .fg(end_use.color())
        });
        let total_cell = Cell::new(annual_end_uses.total())
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold);
        table.add_row(
            std::iter::once(scenario_cell(index)).chain(cells).chain(std::iter::once(total_cell)),
        );
    }
    table
}

/// Calendar months as rows, scenarios as columns.
pub fn build_monthly_table(results: &ResultSet) -> Table {
    let forecasts = results.forecasts().collect_vec();
    let mut table = new_table();
    table.set_header(
        std::iter::once(Cell::new("Month"))
            .chain(forecasts.iter().map(|(index, _)| scenario_cell(*index))),
    );

    let monthly_totals =
        forecasts.iter().map(|(_, forecast)| forecast.monthly_totals()).collect_vec();
    let Some(months) = monthly_totals.first() else {
        return table;
    };
    for (row, (month, _)) in months.iter().enumerate() {
        table.add_row(std::iter::once(Cell::new(month).add_attribute(Attribute::Dim)).chain(
            monthly_totals.iter().map(|totals| {
                totals
                    .get(row)
                    .map_or_else(|| Cell::new("-"), |(_, total)| Cell::new(total))
                    .set_alignment(CellAlignment::Right)
            }),
        ));
    }
    table
}

pub fn build_failures_table(results: &ResultSet) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Scenario", "Error"]);
    for (index, error) in results.failures() {
        table.add_row(vec![scenario_cell(index), Cell::new(error).fg(Color::Red)]);
    }
    table
}

pub fn build_labels_table(mapping: &ReferenceMapping) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Category", "Label", "Code"]);
    for (category, labels) in mapping.categories() {
        for (label, code) in labels.iter() {
            table.add_row(vec![
                Cell::new(category).add_attribute(Attribute::Dim),
                Cell::new(label),
                Cell::new(code).set_alignment(CellAlignment::Right),
            ]);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        PipelineError,
        disaggregation::EndUseSeries,
        end_use::EndUseMap,
        estimator::TotalSeries,
        orchestrator::Forecast,
        reference::Labels,
        testing::start,
    };

    fn results() -> ResultSet {
        let dates = start().iter_days().take(40).collect_vec();
        let forecast = Forecast {
            total: dates.iter().map(|_| KilowattHours(10.0)).collect::<TotalSeries>(),
            end_uses: dates
                .iter()
                .map(|_| EndUseMap([5.0, 2.0, 2.0, 1.0, 0.0, 0.0].map(KilowattHours)))
                .collect::<EndUseSeries>(),
            dates,
        };
        ResultSet::from_iter([
            (ScenarioIndex(1), Ok(forecast)),
            (ScenarioIndex(2), Err(PipelineError::model_inference("boom"))),
        ])
    }

    #[test]
    fn test_annual_table() {
        let rendered = build_annual_table(&results()).to_string();
        assert!(rendered.contains("400.0 kWh"), "{rendered}");
        assert!(rendered.contains("10.0 kWh"), "{rendered}");
        assert!(!rendered.contains("#2"), "{rendered}");
    }

    #[test]
    fn test_end_use_table() {
        let rendered = build_end_use_table(&results()).to_string();
        assert!(rendered.contains("HVAC"), "{rendered}");
        assert!(rendered.contains("200.0 kWh"), "{rendered}");
        assert!(rendered.contains("50.0%"), "{rendered}");
    }

    #[test]
    fn test_monthly_table() {
        let table = build_monthly_table(&results());
        assert_eq!(table.row_count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("2021-01"), "{rendered}");
        assert!(rendered.contains("310.0 kWh"), "{rendered}");
        assert!(rendered.contains("90.0 kWh"), "{rendered}");
    }

    #[test]
    fn test_failures_table() {
        let rendered = build_failures_table(&results()).to_string();
        assert!(rendered.contains("#2"), "{rendered}");
        assert!(rendered.contains("boom"), "{rendered}");
    }

    #[test]
    fn test_labels_table() {
        let mapping = ReferenceMapping::from_iter([(
            "pool",
            Labels::from_iter([("Non", 1.0), ("Oui", 2.0)]),
        )]);
        let table = build_labels_table(&mapping);
        assert_eq!(table.row_count(), 2);
        assert!(table.to_string().contains("Oui"));
    }
}
