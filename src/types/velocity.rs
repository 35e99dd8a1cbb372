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
Velocidades y amplificadores
============================

- Velocity: processing speed factor with a fixed precision of two decimals
- Amplifiers: ordered map from velocity to energy amplification factor
*/

use std::collections::BTreeMap;
use std::fmt;
use std::str;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EapError;

/// Velocidad de procesado
///
/// Processing velocity, stored as an integer number of hundredths so that sweeps don't
/// drift and values can be used as ordered map keys.
///
/// The text form uses one decimal when the second one is zero ("1.0", "1.8") and two
/// otherwise ("1.25"). It's the JSON key of the amplifier table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Velocity(u32);

impl Velocity {
    /// Velocity from hundredths (150 -> 1.5)
    pub fn from_hundredths(hundredths: u32) -> Self {
        Velocity(hundredths)
    }

    /// Velocity closest to `value` at two decimals
    pub fn from_f64(value: f64) -> Result<Self, EapError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(EapError::InvalidParameter(format!(
                "velocity must be a positive number and is {}",
                value
            )));
        }
        let hundredths = (value * 100.0).round();
        if hundredths < 1.0 || hundredths > f64::from(std::u32::MAX) {
            return Err(EapError::InvalidParameter(format!(
                "velocity {} out of range at two decimals",
                value
            )));
        }
        Ok(Velocity(hundredths as u32))
    }

    /// Velocity in hundredths
    pub fn hundredths(self) -> u32 {
        self.0
    }

    /// Velocity as a number
    pub fn value(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for Velocity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (units, cents) = (self.0 / 100, self.0 % 100);
        if cents % 10 == 0 {
            write!(f, "{}.{}", units, cents / 10)
        } else {
            write!(f, "{}.{:02}", units, cents)
        }
    }
}

impl str::FromStr for Velocity {
    type Err = EapError;

    fn from_str(s: &str) -> Result<Velocity, Self::Err> {
        let value: f64 = s.trim().parse().map_err(|_| EapError::Parse {
            from: s.into(),
            into: "Velocity".into(),
            desc: "wrong velocity format",
        })?;
        Velocity::from_f64(value)
    }
}

impl Serialize for Velocity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Velocity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Factores de amplificación de energía por velocidad
///
/// Energy amplification factor for each velocity, ascending by velocity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Amplifiers(pub BTreeMap<Velocity, f64>);

impl Amplifiers {
    /// Amplifier for a velocity given in its text form ("1.8")
    pub fn get_by_key(&self, key: &str) -> Result<f64, EapError> {
        let velocity: Velocity = key
            .parse()
            .map_err(|_| EapError::UnknownAmplifier(key.into()))?;
        self.0
            .get(&velocity)
            .cloned()
            .ok_or_else(|| EapError::UnknownAmplifier(key.into()))
    }

    /// Iterate (velocity, amplifier) pairs in ascending velocity order
    pub fn iter(&self) -> impl Iterator<Item = (&Velocity, &f64)> {
        self.0.iter()
    }

    /// Number of velocities
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No velocities defined
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::iter::FromIterator<(Velocity, f64)> for Amplifiers {
    fn from_iter<I: IntoIterator<Item = (Velocity, f64)>>(iter: I) -> Self {
        Amplifiers(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn velocity_text_form() {
        assert_eq!(Velocity::from_hundredths(100).to_string(), "1.0");
        assert_eq!(Velocity::from_hundredths(180).to_string(), "1.8");
        assert_eq!(Velocity::from_hundredths(125).to_string(), "1.25");
        assert_eq!(Velocity::from_hundredths(205).to_string(), "2.05");
        assert_eq!("1.8".parse::<Velocity>().unwrap(), Velocity::from_hundredths(180));
        assert_eq!("2".parse::<Velocity>().unwrap(), Velocity::from_hundredths(200));
    }

    #[test]
    fn velocity_rejects_zero_and_garbage() {
        assert!("0.0".parse::<Velocity>().is_err());
        assert!("-1.0".parse::<Velocity>().is_err());
        assert!("fast".parse::<Velocity>().is_err());
    }

    #[test]
    fn amplifiers_use_velocity_strings_as_json_keys() {
        let amplifiers: Amplifiers = vec![
            (Velocity::from_hundredths(100), 1.0),
            (Velocity::from_hundredths(150), 2.25),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&amplifiers).unwrap();
        assert_eq!(json, r#"{"1.0":1.0,"1.5":2.25}"#);
        let back: Amplifiers = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amplifiers);
        assert_eq!(back.get_by_key("1.5").unwrap(), 2.25);
        assert_eq!(
            back.get_by_key("1.8"),
            Err(EapError::UnknownAmplifier("1.8".into()))
        );
    }
}
