use std::fmt::{Display, Formatter};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

use crate::label::{Label, LabelParseError, Phase, Quality};

struct PhaseTips {
    good_tips: &'static [&'static str],
    bad_signs: &'static [&'static str],
}

const STANCE: PhaseTips = PhaseTips {
    good_tips: &[
        "Straight back",
        "Relaxed shoulders",
        "Feet shoulder-width apart",
        "Slight bend in the knees",
    ],
    bad_signs: &[
        "Rounded back",
        "Tense shoulders",
        "Feet too close together",
        "Stiff knees",
    ],
};

const PLANT_FOOT: PhaseTips = PhaseTips {
    good_tips: &[
        "Foot next to the ball",
        "Toes pointing at the target",
        "Stable placement",
        "Slight bend in the knee",
    ],
    bad_signs: &[
        "Foot too far from the ball",
        "Toes pointing the wrong way",
        "Unstable stance",
        "Leg too straight",
    ],
};

const KICK_LEG: PhaseTips = PhaseTips {
    good_tips: &[
        "Full backswing",
        "Locked ankle",
        "Knee over the ball",
        "Follow through after contact",
    ],
    bad_signs: &[
        "Short backswing",
        "Loose ankle",
        "Knee not over the ball",
        "No follow-through",
    ],
};

fn phase_tips(phase: Phase) -> &'static PhaseTips {
    match phase {
        Phase::Stance => &STANCE,
        Phase::PlantFoot => &PLANT_FOOT,
        Phase::KickLeg => &KICK_LEG,
    }
}

/// A rendered piece of coaching feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tip {
    pub label: Label,
    pub headline: String,
    pub advice: &'static str,
}

impl Display for Tip {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.headline, self.advice)
    }
}

/// Maps labels to tips, picking one entry from a fixed per-phase list.
///
/// Random picks come from a seedable generator, so a policy built with
/// [`with_seed`](Self::with_seed) is reproducible.
#[derive(Debug, Clone)]
pub struct FeedbackPolicy {
    rng: Xoshiro256PlusPlus,
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackPolicy {
    /// A policy seeded from the thread-local generator.
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_rng(&mut rand::rng()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// The fixed list a tip for `label` is drawn from: good tips for `good`,
    /// warning signs for `bad`.
    pub fn tips(label: &Label) -> &'static [&'static str] {
        let tips = phase_tips(label.phase);
        match label.quality {
            Quality::Good => tips.good_tips,
            Quality::Bad => tips.bad_signs,
        }
    }

    /// Picks a tip uniformly at random.
    pub fn render_tip(&mut self, label: &Label) -> Tip {
        let index = self.rng.random_range(0..Self::tips(label).len());
        self.render_tip_at(label, index)
    }

    /// Picks the tip at `index`, wrapping around the list.
    pub fn render_tip_at(&self, label: &Label, index: usize) -> Tip {
        let tips = Self::tips(label);
        let headline = match label.quality {
            Quality::Good => format!("Excellent {}!", label.phase.title()),
            Quality::Bad => format!("Improve your {}:", label.phase.title()),
        };
        Tip {
            label: *label,
            headline,
            advice: tips[index % tips.len()],
        }
    }

    /// Parses `label` first. A known phase with any quality other than
    /// `good` gets the warning signs; an unknown phase gets no tip.
    pub fn render_tip_str(&mut self, label: &str) -> Option<Tip> {
        match label.parse::<Label>() {
            Ok(label) => Some(self.render_tip(&label)),
            Err(LabelParseError::UnknownQuality(quality)) => {
                let (phase, _) = label.rsplit_once('_')?;
                let phase: Phase = phase.parse().ok()?;
                debug!(%quality, "unknown quality, using warning signs");
                Some(self.render_tip(&Label::new(phase, Quality::Bad)))
            }
            Err(err) => {
                debug!(%err, "no tip for label");
                None
            }
        }
    }
}
