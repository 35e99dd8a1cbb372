// Copyright (c) 2025  Energy aware production data authors

// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:

// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

/*!
Perfiles de generación fotovoltaica
===================================

Time series of PV power as exported by the PV acquisition scripts (PVGIS), one sample per
CSV record with a timestamp column `ds` and a power column `power`:

```text
ds,power
2020-01-01 00:10:00,0.0
2020-01-01 12:10:00,512.3
```

Timestamps are ISO dates with an optional time (`T` or space separated, with or without
seconds or UTC offset). Power can't be negative.

Samples are summed by calendar day. Days without samples between the first and the last
one count as zero energy. The mean or median of the daily sums is the average external
energy input that drives a derived alpha.
*/

use std::collections::BTreeMap;
use std::str;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::EapError;
use crate::stats::{mean, median};

/// Columna de marca temporal
pub const TIMESTAMP_COLUMN: &str = "ds";
/// Columna de potencia
pub const POWER_COLUMN: &str = "power";

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%z"];

/// Estadístico de la energía diaria
///
/// Statistic of the daily energy used as average input
#[derive(Debug, Copy, Clone, PartialEq, Eq, Display, EnumString)]
pub enum Statistic {
    /// Mean of the daily sums
    #[strum(serialize = "mean")]
    Mean,
    /// Median of the daily sums
    #[strum(serialize = "median")]
    Median,
}

/// Energía diaria de un perfil PV
///
/// Daily energy of a PV profile
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyEnergy {
    /// Energy of each day, from the first to the last day of the profile
    pub days: BTreeMap<NaiveDate, f64>,
}

impl DailyEnergy {
    /// Mean of the daily sums
    pub fn mean(&self) -> Option<f64> {
        mean(&self.values())
    }

    /// Median of the daily sums
    pub fn median(&self) -> Option<f64> {
        median(&self.values())
    }

    /// Daily energy statistic
    pub fn statistic(&self, statistic: Statistic) -> Option<f64> {
        match statistic {
            Statistic::Mean => self.mean(),
            Statistic::Median => self.median(),
        }
    }

    fn values(&self) -> Vec<f64> {
        self.days.values().cloned().collect()
    }
}

#[derive(Debug, Deserialize)]
struct ProfileRecord {
    ds: String,
    power: f64,
}

/// Día natural de una marca temporal
///
/// Calendar date of a profile timestamp (local date when it carries an offset)
pub fn timestamp_date(timestamp: &str) -> Result<NaiveDate, EapError> {
    let ts = timestamp.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Ok(dt.naive_local().date());
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(ts, fmt).ok())
    {
        return Ok(dt.naive_local().date());
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
    {
        return Ok(dt.date());
    }
    NaiveDate::parse_from_str(ts, "%Y-%m-%d").map_err(|_| {
        EapError::MalformedInput(format!("PV profile timestamp \"{}\" is not a date", timestamp))
    })
}

impl str::FromStr for DailyEnergy {
    type Err = EapError;

    fn from_str(s: &str) -> Result<DailyEnergy, Self::Err> {
        let s_nobom = s.trim_start_matches('\u{feff}');
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(s_nobom.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| EapError::MalformedInput(format!("PV profile header: {}", e)))?
            .clone();
        for column in &[TIMESTAMP_COLUMN, POWER_COLUMN] {
            if !headers.iter().any(|h| h == *column) {
                return Err(EapError::MalformedInput(format!(
                    "PV profile without column \"{}\"",
                    column
                )));
            }
        }

        let mut days = BTreeMap::new();
        for record in reader.deserialize::<ProfileRecord>() {
            let record =
                record.map_err(|e| EapError::MalformedInput(format!("PV profile: {}", e)))?;
            if !(record.power.is_finite() && record.power >= 0.0) {
                return Err(EapError::MalformedInput(format!(
                    "PV profile power at {} must be a non negative number and is {}",
                    record.ds, record.power
                )));
            }
            *days.entry(timestamp_date(&record.ds)?).or_insert(0.0) += record.power;
        }

        // días sin muestras
        let bounds = (days.keys().next().cloned(), days.keys().next_back().cloned());
        if let (Some(first), Some(last)) = bounds {
            let mut day = first;
            while day < last {
                days.entry(day).or_insert(0.0);
                day = match day.succ_opt() {
                    Some(next) => next,
                    None => break,
                };
            }
        }
        Ok(DailyEnergy { days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TPROFILE: &str = "ds,power
2020-01-01 10:00:00,100.0
2020-01-01 11:00:00,200.0
2020-01-02 10:00:00,50.0
2020-01-03T10:00:00,600.0
2020-01-03T11:00:00,0.0
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_sums() {
        let daily: DailyEnergy = TPROFILE.parse().unwrap();
        assert_eq!(daily.days.len(), 3);
        assert_eq!(daily.days[&date(2020, 1, 1)], 300.0);
        assert_eq!(daily.days[&date(2020, 1, 3)], 600.0);
        assert_eq!(daily.mean(), Some(950.0 / 3.0));
        assert_eq!(daily.median(), Some(300.0));
        assert_eq!(daily.statistic(Statistic::Median), Some(300.0));
    }

    #[test]
    fn days_without_samples_count_as_zero() {
        let daily: DailyEnergy = "ds,power\n2020-01-01 10:00,100.0\n2020-01-04 10:00,200.0\n"
            .parse()
            .unwrap();
        assert_eq!(daily.days.len(), 4);
        assert_eq!(daily.days[&date(2020, 1, 2)], 0.0);
        assert_eq!(daily.mean(), Some(75.0));
        assert_eq!(daily.median(), Some(50.0));
    }

    #[test]
    fn timestamp_forms() {
        assert_eq!(timestamp_date("2020-06-01 23:10:00").unwrap(), date(2020, 6, 1));
        assert_eq!(timestamp_date("2020-06-01T23:10").unwrap(), date(2020, 6, 1));
        assert_eq!(timestamp_date("2020-06-01T23:10:00+02:00").unwrap(), date(2020, 6, 1));
        assert_eq!(timestamp_date("2020-06-01 23:10:00+02:00").unwrap(), date(2020, 6, 1));
        assert_eq!(timestamp_date("2020-06-01").unwrap(), date(2020, 6, 1));
        assert!(timestamp_date("2020-13-01").is_err());
    }

    #[test]
    fn bad_timestamps_are_rejected() {
        assert!(matches!(
            "ds,power\nnot-a-date,5.0\n2020-01-01 10:00,1.0\n".parse::<DailyEnergy>(),
            Err(EapError::MalformedInput(_))
        ));
    }

    #[test]
    fn quoted_fields() {
        let daily: DailyEnergy = "\"ds\",\"power\"\n\"2020-01-01 10:00\",\"1.5\"\n"
            .parse()
            .unwrap();
        assert_eq!(daily.days[&date(2020, 1, 1)], 1.5);
        // a decimal comma inside quotes is one field, and not a number
        assert!(matches!(
            "ds,power\n\"2020-01-01 10:00\",\"1,5\"\n".parse::<DailyEnergy>(),
            Err(EapError::MalformedInput(_))
        ));
    }

    #[test]
    fn statistic_names() {
        assert_eq!("median".parse::<Statistic>().unwrap(), Statistic::Median);
        assert_eq!(Statistic::Mean.to_string(), "mean");
        assert!("mode".parse::<Statistic>().is_err());
    }

    #[test]
    fn profile_errors() {
        assert!(matches!(
            "time,power\n2020-01-01,1.0\n".parse::<DailyEnergy>(),
            Err(EapError::MalformedInput(_))
        ));
        assert!(matches!(
            "ds,power\n2020-01-01,sunny\n".parse::<DailyEnergy>(),
            Err(EapError::MalformedInput(_))
        ));
        assert!(matches!(
            "ds,power\n2020-01-01,-3.0\n".parse::<DailyEnergy>(),
            Err(EapError::MalformedInput(_))
        ));
        assert_eq!("ds,power\n".parse::<DailyEnergy>().unwrap().mean(), None);
    }
}
