use crate::MeasurementEntry;
use std::str::FromStr;

const POUNDS_TO_KILOGRAMS: f64 = 0.45359237;
const KILOGRAMS_TO_POUNDS: f64 = 2.204622622;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Pounds,
    Kilograms,
}

impl Unit {
    pub fn abbrev(&self) -> &'static str {
        match self {
            Unit::Pounds => "lbs",
            Unit::Kilograms => "kgs",
        }
    }

    /// Multiplier taking a value in `self` to a value in `target`.
    pub fn factor_to(&self, target: Unit) -> f64 {
        match (self, target) {
            (Unit::Pounds, Unit::Kilograms) => POUNDS_TO_KILOGRAMS,
            (Unit::Kilograms, Unit::Pounds) => KILOGRAMS_TO_POUNDS,
            _ => 1.0,
        }
    }
}

impl FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lb" | "lbs" | "pounds" => Ok(Unit::Pounds),
            "kg" | "kgs" | "kilograms" => Ok(Unit::Kilograms),
            _ => Err(format!("Invalid unit: {}. Use lbs or kgs", s)),
        }
    }
}

impl MeasurementEntry {
    /// Rescales every numeric field from unit `from` to unit `to`.
    pub fn to_unit(&self, from: Unit, to: Unit) -> MeasurementEntry {
        let factor = from.factor_to(to);
        MeasurementEntry {
            primary: self.primary * factor,
            secondary_a: self.secondary_a.map(|v| v * factor),
            secondary_b: self.secondary_b.map(|v| v * factor),
            ..self.clone()
        }
    }
}

/// Converts a whole snapshot; a no-op copy when both units match.
pub fn convert_entries(entries: &[MeasurementEntry], from: Unit, to: Unit) -> Vec<MeasurementEntry> {
    entries.iter().map(|e| e.to_unit(from, to)).collect()
}
