use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::lattice::Spin;

/// Which update strategy advances the lattice.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Metropolis,
    Glauber,
    Wolff,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Metropolis, Algorithm::Glauber, Algorithm::Wolff];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Metropolis => "metropolis",
            Algorithm::Glauber => "glauber",
            Algorithm::Wolff => "wolff",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                SimulationError::invalid(
                    "algorithm",
                    format!("unknown algorithm {s:?}, expected metropolis, glauber or wolff"),
                )
            })
    }
}

/// Everything a run needs to know. Changing any of it goes through
/// `RunController::apply_settings`, which resets the lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    pub temperature: f64,
    pub coupling: f64,
    pub states: Spin,
    pub side: usize,
    pub algorithm: Algorithm,
    #[serde(rename = "step_interval_ms", with = "millis")]
    pub step_interval: Duration,
    #[serde(rename = "duration_secs", with = "secs")]
    pub duration: Duration,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            temperature: 2.0,
            coupling: 1.0,
            states: 4,
            side: 100,
            algorithm: Algorithm::Metropolis,
            step_interval: Duration::from_millis(10),
            duration: Duration::from_secs(30),
        }
    }
}

impl SimulationParameters {
    pub fn from_json(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let params: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        params.validate()?;
        Ok(params)
    }

    /// Zero temperature passes: it is the limit where uphill moves are never accepted.
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(SimulationError::invalid(
                "temperature",
                format!("must be a finite value >= 0, got {}", self.temperature),
            ));
        }
        if !self.coupling.is_finite() {
            return Err(SimulationError::invalid(
                "coupling",
                format!("must be finite, got {}", self.coupling),
            ));
        }
        if self.states < 1 {
            return Err(SimulationError::invalid("states", "at least one Potts state is required"));
        }
        if self.side < 1 {
            return Err(SimulationError::invalid("side", "lattice side must be at least 1"));
        }
        if self.side.checked_mul(self.side).is_none() {
            return Err(SimulationError::invalid(
                "side",
                format!("{} * {} cells overflows the lattice size", self.side, self.side),
            ));
        }
        if self.step_interval.is_zero() {
            return Err(SimulationError::invalid("step_interval", "must be greater than zero"));
        }
        if self.duration.is_zero() {
            return Err(SimulationError::invalid("duration", "must be greater than zero"));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = SimulationParameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.side, 100);
        assert_eq!(params.states, 4);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases: Vec<(&str, SimulationParameters)> = vec![
            ("states", SimulationParameters { states: 0, ..Default::default() }),
            ("side", SimulationParameters { side: 0, ..Default::default() }),
            ("side", SimulationParameters { side: usize::MAX / 2, ..Default::default() }),
            ("step_interval", SimulationParameters { step_interval: Duration::ZERO, ..Default::default() }),
            ("duration", SimulationParameters { duration: Duration::ZERO, ..Default::default() }),
            ("temperature", SimulationParameters { temperature: -1.0, ..Default::default() }),
            ("temperature", SimulationParameters { temperature: f64::NAN, ..Default::default() }),
            ("coupling", SimulationParameters { coupling: f64::INFINITY, ..Default::default() }),
        ];

        for (expected, params) in cases {
            match params.validate() {
                Err(SimulationError::InvalidParameter { name, .. }) => assert_eq!(name, expected),
                other => panic!("expected {expected} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn zero_temperature_is_allowed() {
        let params = SimulationParameters { temperature: 0.0, ..Default::default() };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn algorithm_parses_case_insensitively() {
        assert_eq!("Wolff".parse::<Algorithm>().unwrap(), Algorithm::Wolff);
        assert_eq!(" glauber ".parse::<Algorithm>().unwrap(), Algorithm::Glauber);
        assert!("heatbath".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::Metropolis.to_string(), "metropolis");
    }

    #[test]
    fn json_uses_ui_units_and_fills_defaults() {
        let params: SimulationParameters = serde_json::from_str(
            r#"{ "temperature": 1.5, "algorithm": "wolff", "step_interval_ms": 25, "duration_secs": 5 }"#,
        )
        .unwrap();

        assert_eq!(params.temperature, 1.5);
        assert_eq!(params.algorithm, Algorithm::Wolff);
        assert_eq!(params.step_interval, Duration::from_millis(25));
        assert_eq!(params.duration, Duration::from_secs(5));
        assert_eq!(params.side, 100);

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["step_interval_ms"], 25);
        assert_eq!(json["duration_secs"], 5);
    }
}
