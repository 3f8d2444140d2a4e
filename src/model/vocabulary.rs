//! Class vocabularies and case-insensitive canonicalization.

use std::collections::HashMap;

/// Built-in class options.
pub const DEFAULT_CLASS_OPTIONS: &[&str] = &[
    "Person",
    "Bicycle",
    "Car",
    "Motorcycle",
    "Bus",
    "Train",
    "Truck",
    "Traffic Light",
    "Fire Hydrant",
    "Stop Sign",
    "Parking Meter",
    "Bench",
    "Dog",
    "Other",
];

/// Built-in detailed class options.
pub const DEFAULT_DETAILED_CLASS_OPTIONS: &[&str] = &[
    "Car",
    "Pedestrian",
    "Bicycle",
    "Motorcycle",
    "Bus",
    "Train",
    "Traffic Light",
    "Green Traffic Light",
    "Yellow Traffic Light",
    "Red Traffic Light",
    "Fire Hydrant",
    "Stop sign",
    "Parking Meter",
    "Bench",
    "Bollard",
    "Construction Cone",
    "Construction Barrel",
    "Large Vehicle",
    "Box Truck",
    "Truck Cab",
    "Vehicular Trailer",
    "Truck",
    "Police Car",
    "Fire Truck",
    "Ambulance",
    "Sign",
    "Tree",
    "Animal",
    "School Bus",
    "Stroller",
    "Articulated Bus",
    "Message Board Trailer",
    "Mobile Pedestrian Sign",
    "Yield Sign",
    "Wheel Chair",
    "Wheeled Device",
    "Taxi",
    "Road Maintenance Vehicle",
    "Vehicle Signal",
    "Skateboard",
    "Traffic barricade",
    "Speed bump",
    "Road Personel",
];

/// Name of the catch-all class used when nothing better is known.
const FALLBACK_CLASS: &str = "other";

/// A finite set of valid labels.
///
/// Lookups ignore case and surrounding whitespace and always answer with the
/// label's canonical spelling. When two options differ only in case, the first
/// one wins.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    options: Vec<String>,
    lookup: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from a list of options. Blank entries are ignored.
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Self::default();
        for option in options {
            let option = option.as_ref().trim();
            if option.is_empty() {
                continue;
            }
            let key = option.to_lowercase();
            if vocabulary.lookup.contains_key(&key) {
                continue;
            }
            vocabulary.lookup.insert(key, vocabulary.options.len());
            vocabulary.options.push(option.to_string());
        }
        vocabulary
    }

    pub fn default_classes() -> Self {
        Self::new(DEFAULT_CLASS_OPTIONS)
    }

    pub fn default_detailed_classes() -> Self {
        Self::new(DEFAULT_DETAILED_CLASS_OPTIONS)
    }

    /// Canonical spelling of `raw`, or `None` if it is not an option.
    pub fn canonical(&self, raw: &str) -> Option<&str> {
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.lookup.get(&key).map(|&i| self.options[i].as_str())
    }

    /// The "Other" option if present, else the first option.
    pub fn fallback(&self) -> Option<&str> {
        self.canonical(FALLBACK_CLASS)
            .or_else(|| self.options.first().map(String::as_str))
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
