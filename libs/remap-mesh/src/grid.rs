//! # Grid Families
//!
//! Known grid families and the names of their variables in grid data files.

use std::fmt;
use std::str::FromStr;

use config::constants::POLE_FIX_GRID;

use crate::error::RemapError;

/// A named grid family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GridFamily {
    Bggd,
    Icoh,
    Icos,
    Nogt,
    Sse7,
    Ssea,
    Torc,
}

impl GridFamily {
    /// Every known family.
    pub const ALL: [GridFamily; 7] = [
        GridFamily::Bggd,
        GridFamily::Icoh,
        GridFamily::Icos,
        GridFamily::Nogt,
        GridFamily::Sse7,
        GridFamily::Ssea,
        GridFamily::Torc,
    ];

    /// Lower-case family id as used in variable names.
    pub fn name(self) -> &'static str {
        match self {
            GridFamily::Bggd => "bggd",
            GridFamily::Icoh => "icoh",
            GridFamily::Icos => "icos",
            GridFamily::Nogt => "nogt",
            GridFamily::Sse7 => "sse7",
            GridFamily::Ssea => "ssea",
            GridFamily::Torc => "torc",
        }
    }

    /// True for the family whose corner mesh needs the pole repair.
    pub fn needs_pole_fix(self) -> bool {
        self.name() == POLE_FIX_GRID
    }

    /// Variable names of this family.
    pub fn variables(self) -> GridVariables {
        GridVariables::new(self.name())
    }
}

impl fmt::Display for GridFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GridFamily {
    type Err = RemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GridFamily::ALL
            .into_iter()
            .find(|family| family.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RemapError::UnknownGrid(s.to_string()))
    }
}

/// Variable names `{grid}.lon`, `{grid}.lat`, `{grid}.clo`, `{grid}.cla`
/// and `{grid}.msk` of one grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridVariables {
    grid: String,
}

impl GridVariables {
    pub fn new(grid: impl Into<String>) -> Self {
        Self { grid: grid.into() }
    }

    pub fn grid(&self) -> &str {
        &self.grid
    }

    fn var(&self, suffix: &str) -> String {
        format!("{}.{suffix}", self.grid)
    }

    /// Center longitudes.
    pub fn lon(&self) -> String {
        self.var("lon")
    }

    /// Center latitudes.
    pub fn lat(&self) -> String {
        self.var("lat")
    }

    /// Corner longitudes.
    pub fn clo(&self) -> String {
        self.var("clo")
    }

    /// Corner latitudes.
    pub fn cla(&self) -> String {
        self.var("cla")
    }

    /// Cell mask.
    pub fn msk(&self) -> String {
        self.var("msk")
    }
}
