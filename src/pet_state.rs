//! Pet wellbeing state machine.
//!
//! Two entry points drive every state change a pet can go through:
//!
//! - [`apply_action`]: deterministic transition for a care action.
//! - [`apply_query_drift`]: randomised transition applied when the state is read. The
//!   random value is a parameter so callers decide where it comes from (see [`DriftSource`]).
//!
//! Only the six canonical states are ever persisted. Post-action feedback such as
//! `alimentada` or `bañada` is carried in [`Transition::display`] and never stored.
use rand::Rng;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum PetState {
    #[default]
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "enferma")]
    Sick,
    #[serde(rename = "deprimida")]
    Depressed,
    #[serde(rename = "feliz")]
    Happy,
    #[serde(rename = "hambriento")]
    Hungry,
    #[serde(rename = "aburrido")]
    Bored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CareAction {
    Feed,
    Bathe,
    Walk,
    Play,
    Heal,
}

/// Result of a care action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Canonical state to persist.
    pub state: PetState,
    /// Immediate feedback value shown to the caller.
    pub display: &'static str,
    pub message: &'static str,
}

/// Result of a state query after drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryReport {
    pub state: PetState,
    pub description: &'static str,
}

pub const FED_DISPLAY: &str = "alimentada";
pub const BATHED_DISPLAY: &str = "bañada";

// cumulative upper bounds for drift out of `normal`
const DRIFT_FROM_NORMAL: [(f64, PetState); 5] = [
    (0.25, PetState::Sick),
    (0.35, PetState::Depressed),
    (0.43, PetState::Happy),
    (0.55, PetState::Hungry),
    (0.65, PetState::Bored),
];
const HAPPY_FADE_CHANCE: f64 = 0.5;

impl PetState {
    pub const ALL: [PetState; 6] = [
        PetState::Normal,
        PetState::Sick,
        PetState::Depressed,
        PetState::Happy,
        PetState::Hungry,
        PetState::Bored,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PetState::Normal => "normal",
            PetState::Sick => "enferma",
            PetState::Depressed => "deprimida",
            PetState::Happy => "feliz",
            PetState::Hungry => "hambriento",
            PetState::Bored => "aburrido",
        }
    }

    /// Parse a stored or legacy value. Anything that is not canonical becomes `normal`.
    pub fn normalize(value: &str) -> PetState {
        PetState::ALL
            .into_iter()
            .find(|state| state.as_str() == value.trim())
            .unwrap_or(PetState::Normal)
    }

    pub fn description(self) -> &'static str {
        match self {
            PetState::Normal => "The pet is calm.",
            PetState::Sick => "The pet is sick.",
            PetState::Depressed => "The pet is depressed.",
            PetState::Happy => "The pet is happy!",
            PetState::Hungry => "The pet is hungry.",
            PetState::Bored => "The pet is bored.",
        }
    }
}

impl fmt::Display for PetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CareAction {
    pub const ALL: [CareAction; 5] = [
        CareAction::Feed,
        CareAction::Bathe,
        CareAction::Walk,
        CareAction::Play,
        CareAction::Heal,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CareAction::Feed => "feed",
            CareAction::Bathe => "bathe",
            CareAction::Walk => "walk",
            CareAction::Play => "play",
            CareAction::Heal => "heal",
        }
    }
}

impl fmt::Display for CareAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Transition {
    fn to(state: PetState, message: &'static str) -> Self {
        Self {
            state,
            display: state.as_str(),
            message,
        }
    }
    fn with_display(mut self, display: &'static str) -> Self {
        self.display = display;
        self
    }
}

/// Deterministic care transition. A sick pet ignores everything except `heal`.
pub fn apply_action(current: PetState, action: CareAction) -> Transition {
    use CareAction::*;
    use PetState::*;

    match (action, current) {
        (Feed | Bathe | Walk | Play, Sick) => {
            Transition::to(Sick, "The pet is sick and ignores you. Heal it first.")
        }
        (Feed, Depressed) => Transition::to(Depressed, "The pet is too depressed to eat."),
        (Feed, Hungry) => Transition::to(Normal, "The pet ate and is no longer hungry."),
        (Feed, state) => Transition::to(state, "The pet has been fed.").with_display(FED_DISPLAY),
        // bañada is not canonical, so the stored state settles on normal
        (Bathe, _) => Transition::to(Normal, "The pet has been bathed.").with_display(BATHED_DISPLAY),
        (Walk, _) => Transition::to(Happy, "The pet enjoyed the walk."),
        (Play, _) => Transition::to(Happy, "The pet had fun playing."),
        (Heal, Sick) => Transition::to(Normal, "The pet has been healed."),
        (Heal, state) => Transition::to(state, "The pet is not sick."),
    }
}

/// Randomised drift applied on a state read. `draw` is a uniform value in `[0, 1)`.
pub fn apply_query_drift(current: PetState, draw: f64) -> QueryReport {
    let state = match current {
        PetState::Normal => DRIFT_FROM_NORMAL
            .iter()
            .find(|(bound, _)| draw < *bound)
            .map(|(_, state)| *state)
            .unwrap_or(PetState::Normal),
        PetState::Happy if draw < HAPPY_FADE_CHANCE => PetState::Normal,
        other => other,
    };

    QueryReport {
        state,
        description: state.description(),
    }
}

/// Source of uniform draws in `[0, 1)` for [`apply_query_drift`].
pub trait DriftSource: Send + Sync {
    fn draw(&self) -> f64;
}

/// Draws from the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSource;

impl DriftSource for ThreadRngSource {
    fn draw(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Always returns the same value. Used to pin drift in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDraw(pub f64);

impl DriftSource for FixedDraw {
    fn draw(&self) -> f64 {
        self.0
    }
}

// Stored as the canonical string so legacy values can be normalised on read.
impl<C> minicbor::Encode<C> for PetState {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(self.as_str())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for PetState {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(PetState::normalize(d.str()?))
    }
}
