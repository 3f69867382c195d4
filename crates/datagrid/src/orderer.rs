//! Column ordering from symbolic `position` directives.
//!
//! Every column carries a `position` of `first`, `last`, `{before: path}`,
//! `{after: path}` or nothing. Columns are weighted in insertion order; a
//! column placed relative to one that has no weight yet is deferred until
//! that column is weighted, then placed in a cascade.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{DatagridError, Result};

/// A parsed `position` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Keep insertion order.
    Default,
    First,
    Last,
    Relative {
        before: Option<String>,
        after: Option<String>,
    },
}

impl Position {
    /// Reads a raw directive.
    ///
    /// Empty values (including `"0"`) keep the default, any string other
    /// than `first` means `last`, and objects name `before` and/or `after`.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) if s.is_empty() || s == "0" => Position::Default,
            Value::String(s) if s == "first" => Position::First,
            Value::String(_) => Position::Last,
            Value::Object(map) if !map.is_empty() => {
                let target = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
                Position::Relative {
                    before: target("before"),
                    after: target("after"),
                }
            }
            _ => Position::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

impl Side {
    const BOTH: [Side; 2] = [Side::Before, Side::After];

    fn as_str(self) -> &'static str {
        match self {
            Side::Before => "before",
            Side::After => "after",
        }
    }

    fn reverse(self) -> Side {
        match self {
            Side::Before => Side::After,
            Side::After => Side::Before,
        }
    }
}

/// Computes the display order of a table's columns.
#[derive(Debug, Default)]
pub struct ColumnOrderer {
    // Kept in first-weighted order; ties sort by this order.
    weights: Vec<(String, i64)>,
    deferred: [BTreeMap<String, Vec<String>>; 2],
    first_weight: i64,
    current_weight: i64,
    last_weight: i64,
}

impl ColumnOrderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders `(path, position)` pairs given in insertion order and returns
    /// the ordered paths.
    ///
    /// Fails when deferred directives form a loop or place two columns
    /// before and after each other.
    pub fn order<'a, I>(&mut self, columns: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = (&'a str, &'a Value)>,
    {
        *self = Self::default();

        for (path, position) in columns {
            match Position::from_value(position) {
                Position::Default => self.process_weight(path, self.current_weight),
                Position::First => {
                    let weight = self.first_weight;
                    self.first_weight += 1;
                    self.process_weight(path, weight);
                }
                Position::Last => self.process_weight(path, self.last_weight + 1),
                Position::Relative { before, after } => {
                    if let Some(target) = before {
                        self.process_relative(path, &target, Side::Before)?;
                    }
                    if let Some(target) = after {
                        self.process_relative(path, &target, Side::After)?;
                    }
                }
            }
        }

        let mut weights = std::mem::take(&mut self.weights);
        weights.sort_by_key(|(_, weight)| *weight);
        Ok(weights.into_iter().map(|(path, _)| path).collect())
    }

    fn weight_of(&self, path: &str) -> Option<i64> {
        self.weights.iter().find(|(p, _)| p == path).map(|(_, w)| *w)
    }

    fn process_relative(&mut self, path: &str, target: &str, side: Side) -> Result<()> {
        match (self.weight_of(target), side) {
            (Some(weight), Side::Before) => self.process_weight(path, weight),
            (Some(weight), Side::After) => self.process_weight(path, weight + 1),
            (None, _) => self.defer(path, target, side)?,
        }
        Ok(())
    }

    /// Places `path` at `weight`, shifting every weight at or after it.
    fn process_weight(&mut self, path: &str, weight: i64) {
        for (_, existing) in self.weights.iter_mut() {
            if *existing >= weight {
                *existing += 1;
            }
        }
        if self.current_weight >= weight {
            self.current_weight += 1;
        }
        self.last_weight += 1;

        match self.weights.iter_mut().find(|(p, _)| p == path) {
            Some(entry) => entry.1 = weight,
            None => self.weights.push((path.to_string(), weight)),
        }
        self.place_deferred(path, weight);
    }

    /// Weights every column that waited for `path`.
    fn place_deferred(&mut self, path: &str, mut weight: i64) {
        for side in Side::BOTH {
            let Some(waiting) = self.deferred[side as usize].remove(path) else {
                continue;
            };
            for column in waiting {
                match side {
                    Side::Before => {
                        self.process_weight(&column, weight);
                        weight += 1;
                    }
                    Side::After => {
                        weight += 1;
                        self.process_weight(&column, weight);
                    }
                }
            }
        }
    }

    fn defer(&mut self, path: &str, target: &str, side: Side) -> Result<()> {
        self.deferred[side as usize]
            .entry(target.to_string())
            .or_default()
            .push(path.to_string());

        self.detect_circular(path, side, &mut Vec::new())?;

        let reverse = &self.deferred[side.reverse() as usize];
        if reverse.get(path).is_some_and(|waiting| waiting.iter().any(|p| p == target)) {
            return Err(DatagridError::SymmetricOrdering {
                a: path.to_string(),
                b: target.to_string(),
            });
        }
        Ok(())
    }

    fn detect_circular(&self, name: &str, side: Side, stack: &mut Vec<String>) -> Result<()> {
        let Some(waiting) = self.deferred[side as usize].get(name) else {
            return Ok(());
        };
        stack.push(name.to_string());
        for column in waiting {
            if *column == stack[0] {
                let mut path = stack.clone();
                path.push(stack[0].clone());
                return Err(DatagridError::CircularOrdering {
                    position: side.as_str().to_string(),
                    path,
                });
            }
            self.detect_circular(column, side, stack)?;
        }
        stack.pop();
        Ok(())
    }
}
