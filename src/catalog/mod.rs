// src/catalog/mod.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::{fs::File, path::Path};

use crate::series::DateRange;

const BUILTIN_CATALOG: &str = include_str!("../../assets/catalog.yaml");

/// A balance-sheet row the dashboard knows how to present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    /// Exact row label in the source table.
    pub row: String,
    /// Friendly title.
    pub name: String,
    #[serde(default)]
    pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub desc: String,
}

/// Everything the dashboard says about the data, besides the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricCatalog {
    pub title: String,
    #[serde(default)]
    pub intro: Vec<String>,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub total_assets: Metric,
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub glossary: Vec<GlossaryEntry>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub conclusions: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

fn default_unit() -> String {
    "Millones de euros".into()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Case-insensitive substring.
    #[default]
    Plain,
    /// Case-insensitive regular expression.
    Regex,
}

impl MetricCatalog {
    /// The catalogue compiled into the binary.
    pub fn builtin() -> Result<Self> {
        serde_yaml::from_str(BUILTIN_CATALOG).context("parsing built-in metric catalog")
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(&path)
            .with_context(|| format!("opening catalog {}", path.as_ref().display()))?;
        serde_yaml::from_reader(f)
            .with_context(|| format!("parsing catalog {}", path.as_ref().display()))
    }

    /// Metrics whose row label, friendly name or description match `query`,
    /// in catalogue order. The total-assets entry is searched too and comes
    /// first when it matches.
    pub fn search(&self, query: &str, mode: SearchMode) -> Result<Vec<&Metric>> {
        let candidates = std::iter::once(&self.total_assets).chain(self.metrics.iter());
        let hits: Vec<&Metric> = match mode {
            SearchMode::Plain => {
                let needle = query.trim().to_lowercase();
                candidates
                    .filter(|m| {
                        [&m.row, &m.name, &m.desc]
                            .iter()
                            .any(|field| field.to_lowercase().contains(&needle))
                    })
                    .collect()
            }
            SearchMode::Regex => {
                let re = RegexBuilder::new(query)
                    .case_insensitive(true)
                    .build()
                    .with_context(|| format!("invalid search pattern {:?}", query))?;
                candidates
                    .filter(|m| re.is_match(&m.row) || re.is_match(&m.name) || re.is_match(&m.desc))
                    .collect()
            }
        };
        Ok(hits)
    }

    /// Events inside `range`, ordered by date.
    pub fn events_in(&self, range: &DateRange) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().filter(|e| range.contains(e.date)).collect();
        events.sort_by_key(|e| e.date);
        events
    }

    /// Friendly name for a row label, if catalogued.
    pub fn friendly_name(&self, row: &str) -> Option<&str> {
        std::iter::once(&self.total_assets)
            .chain(self.metrics.iter())
            .find(|m| m.row == row.trim())
            .map(|m| m.name.as_str())
    }
}
