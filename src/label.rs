use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when parsing a label string such as `plant_foot_good`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelParseError {
    #[error("label {0:?} has no phase/quality separator")]
    MissingSeparator(String),
    #[error("unknown phase {0:?}")]
    UnknownPhase(String),
    #[error("unknown quality {0:?}")]
    UnknownQuality(String),
}

/// One of the three phases of a free kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Stance,
    PlantFoot,
    KickLeg,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Stance, Phase::PlantFoot, Phase::KickLeg];

    /// Identifier used in label strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Stance => "stance",
            Phase::PlantFoot => "plant_foot",
            Phase::KickLeg => "kick_leg",
        }
    }

    /// Human-readable name, lower case.
    pub fn title(&self) -> &'static str {
        match self {
            Phase::Stance => "stance",
            Phase::PlantFoot => "plant foot",
            Phase::KickLeg => "kick leg",
        }
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == s)
            .ok_or_else(|| LabelParseError::UnknownPhase(s.to_string()))
    }
}

/// Whether a captured pose is an example of good or bad form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Good,
    Bad,
}

impl Quality {
    pub const ALL: [Quality; 2] = [Quality::Good, Quality::Bad];

    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Good => "good",
            Quality::Bad => "bad",
        }
    }
}

impl Display for Quality {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "good" => Ok(Quality::Good),
            "bad" => Ok(Quality::Bad),
            other => Err(LabelParseError::UnknownQuality(other.to_string())),
        }
    }
}

/// A classification label: a phase paired with a quality.
///
/// The pair is carried as two fields everywhere; the `<phase>_<quality>`
/// string form only exists at the persistence and display boundaries.
/// Because `plant_foot` and `kick_leg` contain the separator themselves,
/// parsing splits at the *last* underscore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Label {
    pub phase: Phase,
    pub quality: Quality,
}

impl Label {
    pub const fn new(phase: Phase, quality: Quality) -> Self {
        Self { phase, quality }
    }

    /// Every label, phase-major: `stance_good`, `stance_bad`, `plant_foot_good`, ...
    pub fn all() -> impl Iterator<Item = Label> {
        Phase::ALL.into_iter().flat_map(|phase| {
            Quality::ALL
                .into_iter()
                .map(move |quality| Label::new(phase, quality))
        })
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}_{}", self.phase, self.quality)
    }
}

impl FromStr for Label {
    type Err = LabelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (phase, quality) = s
            .rsplit_once('_')
            .ok_or_else(|| LabelParseError::MissingSeparator(s.to_string()))?;
        Ok(Label::new(phase.parse()?, quality.parse()?))
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for Label {
    type Error = LabelParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
