//! Header-style record of what a pipeline run did to an image.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Banner written as the first history line
pub const TOOL_BANNER: &str = concat!(
    "areia ",
    env!("CARGO_PKG_VERSION"),
    ": Artificial Redshift Effects for Image Analysis"
);

/// One header keyword and its rendered value.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCard {
    pub keyword: &'static str,
    pub value: String,
}

/// Factors applied by a run, keyed the way image headers record them.
///
/// Factors are present only for stages that ran.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(rename = "REBIN", skip_serializing_if = "Option::is_none", default)]
    pub rebin: Option<f64>,
    #[serde(rename = "DIM_FACT", skip_serializing_if = "Option::is_none", default)]
    pub dimming_factor: Option<f64>,
    #[serde(rename = "EVO_FACT", skip_serializing_if = "Option::is_none", default)]
    pub evolution_factor: Option<f64>,
    #[serde(rename = "EV_ALPHA", skip_serializing_if = "Option::is_none", default)]
    pub evolution_alpha: Option<f64>,
    #[serde(rename = "HISTORY", default)]
    pub history: Vec<String>,
}

impl Provenance {
    /// Empty record starting with the tool banner.
    pub fn new() -> Self {
        Self {
            history: vec![TOOL_BANNER.to_string()],
            ..Default::default()
        }
    }

    pub fn add_history(&mut self, line: impl Into<String>) {
        self.history.push(line.into());
    }

    /// Ordered cards: factors first, then one `HISTORY` card per line.
    pub fn cards(&self) -> Vec<HeaderCard> {
        let factors = [
            ("REBIN", self.rebin),
            ("DIM_FACT", self.dimming_factor),
            ("EVO_FACT", self.evolution_factor),
            ("EV_ALPHA", self.evolution_alpha),
        ];

        factors
            .into_iter()
            .filter_map(|(keyword, value)| {
                value.map(|v| HeaderCard {
                    keyword,
                    value: format!("{v:.8e}"),
                })
            })
            .chain(self.history.iter().map(|line| HeaderCard {
                keyword: "HISTORY",
                value: line.clone(),
            }))
            .collect()
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        log::info!("Wrote provenance to {}", path.display());
        Ok(())
    }
}
