//! Regional daily weather, shared read-only by all scenarios.

use std::{collections::BTreeMap, fs::File, io::Read, ops::Index, path::Path};

use chrono::{Datelike, NaiveDate, TimeDelta};
use itertools::Itertools;
use retrofit_quantities::{ratios::Percent, temperature::Celsius};
use serde::Deserialize;

use crate::{
    pipeline::{PipelineError, reference::Code},
    prelude::*,
};

/// Number of daily records in every regional series.
pub const DAYS_PER_YEAR: usize = 365;

#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    derive_more::Display,
    derive_more::From,
    derive_more::FromStr,
)]
pub struct RegionCode(pub u32);

impl TryFrom<Code> for RegionCode {
    type Error = PipelineError;

    fn try_from(code: Code) -> Result<Self, Self::Error> {
        if code.0.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&code.0) {
            #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let region = code.0 as u32;
            Ok(Self(region))
        } else {
            Err(PipelineError::invalid_scenario(format!("`{code}` is not a region code")))
        }
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WeatherRecord {
    pub date: NaiveDate,

    /// Monday is `0`, Sunday is `6`.
    pub day_of_week: u8,

    pub temperature: Celsius,
    pub relative_humidity: Percent,
}

#[expect(clippy::cast_possible_truncation)]
fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// Exactly one year of consecutive daily records.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherSeries(Vec<WeatherRecord>);

impl WeatherSeries {
    pub fn try_new(records: Vec<WeatherRecord>) -> Result<Self> {
        ensure!(
            records.len() == DAYS_PER_YEAR,
            "expected {DAYS_PER_YEAR} daily records, got {}",
            records.len(),
        );
        for record in &records {
            ensure!(
                record.day_of_week == day_of_week(record.date),
                "day of week {} does not match {}",
                record.day_of_week,
                record.date,
            );
        }
        for (previous, next) in records.iter().tuple_windows() {
            ensure!(
                next.date - previous.date == TimeDelta::days(1),
                "records are not consecutive days: {} is followed by {}",
                previous.date,
                next.date,
            );
        }
        Ok(Self(records))
    }

    /// Synthetic series with the same conditions every day.
    #[cfg(test)]
    pub fn constant(start: NaiveDate, temperature: Celsius, relative_humidity: Percent) -> Self {
        Self(
            start
                .iter_days()
                .take(DAYS_PER_YEAR)
                .map(|date| WeatherRecord {
                    date,
                    day_of_week: day_of_week(date),
                    temperature,
                    relative_humidity,
                })
                .collect(),
        )
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeatherRecord> {
        self.0.iter()
    }
}

impl Index<usize> for WeatherSeries {
    type Output = WeatherRecord;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Weather series of all known regions.
#[must_use]
#[derive(Clone, Debug, Default)]
pub struct WeatherAtlas(BTreeMap<RegionCode, WeatherSeries>);

impl WeatherAtlas {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
        let this = Self::from_csv(file)?;
        info!(n_regions = this.regions().count(), "loaded the weather");
        Ok(this)
    }

    /// Parse `region,date,day_of_week,temperature,relative_humidity` rows.
    ///
    /// The day of week may be omitted, in which case it is derived from the date.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        csv::Reader::from_reader(reader)
            .deserialize::<CsvRecord>()
            .map_ok(|record| (record.region, record.into_weather_record()))
            .collect::<Result<Vec<_>, _>>()
            .context("failed to parse the weather records")?
            .into_iter()
            .into_group_map()
            .into_iter()
            .map(|(region, mut records)| {
                records.sort_by_key(|record| record.date);
                let series = WeatherSeries::try_new(records)
                    .with_context(|| format!("invalid weather series for region {region}"))?;
                Ok((region, series))
            })
            .collect()
    }

    pub fn get(&self, region: RegionCode) -> Result<&WeatherSeries, PipelineError> {
        self.0.get(&region).ok_or(PipelineError::UnknownRegion(region))
    }

    pub fn regions(&self) -> impl Iterator<Item = RegionCode> {
        self.0.keys().copied()
    }
}

impl FromIterator<(RegionCode, WeatherSeries)> for WeatherAtlas {
    fn from_iter<T: IntoIterator<Item = (RegionCode, WeatherSeries)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Deserialize)]
struct CsvRecord {
    region: RegionCode,
    date: NaiveDate,

    #[serde(default)]
    day_of_week: Option<u8>,

    temperature: Celsius,
    relative_humidity: Percent,
}

impl CsvRecord {
    fn into_weather_record(self) -> WeatherRecord {
        WeatherRecord {
            date: self.date,
            day_of_week: self.day_of_week.unwrap_or_else(|| day_of_week(self.date)),
            temperature: self.temperature,
            relative_humidity: self.relative_humidity,
        }
    }
}
