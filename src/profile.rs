use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{RegistryErr, Result};

/// A named snapshot of the model catalog.
///
/// `Base` is the initial, untuned search space. `Best` is the space that
/// came out of tuning: the tree models gain leaf constraints, every model runs
/// on a fraction of the data and naive Bayes joins as a baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    Base,
    #[default]
    Best,
}

impl Profile {
    pub const ALL: [Profile; 2] = [Profile::Base, Profile::Best];

    pub fn name(self) -> &'static str {
        match self {
            Profile::Base => "base",
            Profile::Best => "best",
        }
    }

    /// Only tuned catalogs sample the data and constrain tree leaves.
    pub fn is_tuned(self) -> bool {
        self == Profile::Best
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = RegistryErr;

    fn from_str(s: &str) -> Result<Self> {
        Profile::ALL
            .into_iter()
            .find(|profile| profile.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RegistryErr::UnknownProfile(s.to_string()))
    }
}
