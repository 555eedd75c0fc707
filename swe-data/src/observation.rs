/// Monthly water area observations and the series built from them
use crate::error::{DataError, Result};
use chrono::NaiveDateTime;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Timestamp format emitted by the remote `Date.format` call: "YYYY-MM-DDTHH:MM:SS"
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Water area of the region for one monthly image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyObservation {
    pub timestamp: NaiveDateTime,
    /// Summed permanent-water area in square meters. `None` when the
    /// region had no qualifying pixels or the service returned no value.
    pub water_area_m2: Option<f64>,
}

impl MonthlyObservation {
    pub fn new(timestamp: NaiveDateTime, water_area_m2: Option<f64>) -> MonthlyObservation {
        MonthlyObservation {
            timestamp,
            water_area_m2,
        }
    }

    /// Build an observation from a formatted timestamp string.
    pub fn parse(timestamp: &str, water_area_m2: Option<f64>) -> Result<MonthlyObservation> {
        let parsed = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).map_err(
            |source| DataError::TimestampParse {
                value: timestamp.to_string(),
                source,
            },
        )?;
        Ok(MonthlyObservation::new(parsed, water_area_m2))
    }
}

/// Observations in the order the service returned them until [`TimeSeries::sort`]
/// is called.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    observations: Vec<MonthlyObservation>,
}

impl TimeSeries {
    pub fn new(observations: Vec<MonthlyObservation>) -> TimeSeries {
        TimeSeries { observations }
    }

    pub fn empty() -> TimeSeries {
        TimeSeries::default()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn observations(&self) -> &[MonthlyObservation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MonthlyObservation> {
        self.observations.iter()
    }

    /// Order by timestamp. Stable, so equal timestamps keep service order.
    pub fn sort(&mut self) {
        self.observations.sort_by_key(|o| o.timestamp);
    }

    /// Observations that carry a value.
    pub fn points(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.observations
            .iter()
            .filter_map(|o| o.water_area_m2.map(|area| (o.timestamp, area)))
    }

    /// Number of observations without a value.
    pub fn gaps(&self) -> usize {
        self.observations
            .iter()
            .filter(|o| o.water_area_m2.is_none())
            .count()
    }

    /// Runs of consecutive valued observations; a missing value ends a run.
    pub fn segments(&self) -> Vec<Vec<(NaiveDateTime, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for observation in &self.observations {
            match observation.water_area_m2 {
                Some(area) => current.push((observation.timestamp, area)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    pub fn max_area(&self) -> Option<f64> {
        self.points().map(|(_, area)| area).reduce(f64::max)
    }

    /// Earliest and latest timestamps, including observations without a value.
    pub fn time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.observations.iter().map(|o| o.timestamp).min()?;
        let last = self.observations.iter().map(|o| o.timestamp).max()?;
        Some((first, last))
    }

    /// Write `date,water_area_m2` rows with a header. A missing value is
    /// written as an empty field.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = Writer::from_writer(writer);
        writer.write_record(["date", "water_area_m2"])?;
        for observation in &self.observations {
            let date = observation.timestamp.format(TIMESTAMP_FORMAT).to_string();
            let area = observation
                .water_area_m2
                .map_or(String::new(), |v| v.to_string());
            writer.write_record([date.as_str(), area.as_str()])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}

impl FromIterator<MonthlyObservation> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = MonthlyObservation>>(iter: I) -> Self {
        TimeSeries::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a MonthlyObservation;
    type IntoIter = std::slice::Iter<'a, MonthlyObservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn series(values: &[(&str, Option<f64>)]) -> TimeSeries {
        values
            .iter()
            .map(|(ts, area)| MonthlyObservation::parse(ts, *area).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_timestamp() {
        let observation = MonthlyObservation::parse("2015-02-01T00:00:00", Some(12.5)).unwrap();
        assert_eq!(observation.timestamp.to_string(), "2015-02-01 00:00:00");
        assert_eq!(observation.water_area_m2, Some(12.5));
    }

    #[test]
    fn test_parse_rejects_date_only() {
        let err = MonthlyObservation::parse("2015-02-01", None).unwrap_err();
        assert!(matches!(err, DataError::TimestampParse { .. }));
    }

    #[test]
    fn test_sort_orders_by_timestamp() {
        let mut s = series(&[
            ("2015-03-01T00:00:00", Some(3.0)),
            ("2015-01-01T00:00:00", Some(1.0)),
            ("2015-02-01T00:00:00", None),
        ]);
        s.sort();
        let areas: Vec<Option<f64>> = s.iter().map(|o| o.water_area_m2).collect();
        assert_eq!(areas, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_missing_values_split_segments() {
        let s = series(&[
            ("2015-01-01T00:00:00", Some(1.0)),
            ("2015-02-01T00:00:00", Some(2.0)),
            ("2015-03-01T00:00:00", None),
            ("2015-04-01T00:00:00", None),
            ("2015-05-01T00:00:00", Some(5.0)),
        ]);
        let segments = s.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1][0].1, 5.0);
        assert_eq!(s.gaps(), 2);
        assert_eq!(s.points().count(), 3);
        assert_eq!(s.max_area(), Some(5.0));
    }

    #[test]
    fn test_all_missing() {
        let s = series(&[("2015-01-01T00:00:00", None)]);
        assert!(s.segments().is_empty());
        assert_eq!(s.max_area(), None);
        assert!(s.time_span().is_some());
    }

    #[test]
    fn test_write_csv_leaves_missing_empty() {
        let s = series(&[
            ("2015-01-01T00:00:00", Some(1500.25)),
            ("2015-02-01T00:00:00", None),
        ]);
        let mut buffer = Vec::new();
        s.write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "date,water_area_m2\n2015-01-01T00:00:00,1500.25\n2015-02-01T00:00:00,\n"
        );
    }
}
