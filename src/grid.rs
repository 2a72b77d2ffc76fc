use std::fmt;

use ml_core::{ParamSet, ParamValue};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
};

/// Candidate values for a single hyperparameter.
#[derive(Debug, Clone, PartialEq)]
struct Axis {
    name: String,
    values: Vec<ParamValue>,
}

/// The search space of a model: an ordered list of hyperparameter axes.
///
/// Axes keep their insertion order, which is also the order in which
/// `combinations` enumerates them. In JSON a grid is an object mapping every
/// hyperparameter to its list of candidate values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamGrid {
    axes: Vec<Axis>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert`.
    pub fn axis<I>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = ParamValue>,
    {
        self.insert(name, values.into_iter().collect());
        self
    }

    /// Sets the candidates of `name`, replacing the axis if it already exists.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<ParamValue>) {
        let name = name.into();
        match self.axes.iter_mut().find(|axis| axis.name == name) {
            Some(axis) => axis.values = values,
            None => self.axes.push(Axis { name, values }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[ParamValue]> {
        self.axes
            .iter()
            .find(|axis| axis.name == name)
            .map(|axis| axis.values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|axis| axis.name.as_str())
    }

    pub fn axes(&self) -> impl Iterator<Item = (&str, &[ParamValue])> {
        self.axes
            .iter()
            .map(|axis| (axis.name.as_str(), axis.values.as_slice()))
    }

    /// Returns the amount of axes.
    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Returns the size of the Cartesian product of every axis.
    ///
    /// An empty grid has exactly one combination, the estimator defaults.
    pub fn num_combinations(&self) -> usize {
        self.axes.iter().map(|axis| axis.values.len()).product()
    }

    /// Iterates over every point of the grid.
    ///
    /// The first axis varies slowest and the last one fastest. A grid with an
    /// empty axis has no combinations at all.
    pub fn combinations(&self) -> Combinations<'_> {
        let cursor = self
            .axes
            .iter()
            .all(|axis| !axis.values.is_empty())
            .then(|| vec![0; self.axes.len()]);

        Combinations { grid: self, cursor }
    }
}

/// Lazy iterator over the Cartesian product of a `ParamGrid`.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    grid: &'a ParamGrid,
    /// Index into every axis of the next combination, `None` once exhausted.
    cursor: Option<Vec<usize>>,
}

impl Iterator for Combinations<'_> {
    type Item = ParamSet;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;

        let combination = self
            .grid
            .axes
            .iter()
            .zip(cursor.iter())
            .map(|(axis, &i)| (axis.name.as_str(), axis.values[i].clone()))
            .collect();

        // Odometer increment, the last axis rolls over first.
        let mut exhausted = true;
        for (i, axis) in cursor.iter_mut().zip(&self.grid.axes).rev() {
            *i += 1;
            if *i < axis.values.len() {
                exhausted = false;
                break;
            }
            *i = 0;
        }

        if exhausted {
            self.cursor = None;
        }

        Some(combination)
    }
}

impl Serialize for ParamGrid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.axes.len()))?;
        for axis in &self.axes {
            map.serialize_entry(&axis.name, &axis.values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamGrid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct GridVisitor;

        impl<'de> Visitor<'de> for GridVisitor {
            type Value = ParamGrid;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from hyperparameter names to lists of values")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<ParamGrid, A::Error> {
                let mut grid = ParamGrid::new();
                while let Some((name, values)) = access.next_entry::<String, Vec<ParamValue>>()? {
                    if grid.contains(&name) {
                        return Err(de::Error::custom(format!(
                            "duplicate hyperparameter '{name}'"
                        )));
                    }
                    grid.insert(name, values);
                }
                Ok(grid)
            }
        }

        deserializer.deserialize_map(GridVisitor)
    }
}
