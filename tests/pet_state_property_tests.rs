//! Property-based tests for the pet state machine
//!
//! Care transitions are total over (state, action) and drift is a function of a
//! single uniform draw, so both are checked across every state and the whole
//! `[0, 1)` draw range rather than a handful of hand-picked cases.

use pet_care::pet_state::{
    BATHED_DISPLAY, CareAction, FED_DISPLAY, PetState, apply_action, apply_query_drift,
};
use proptest::prelude::*;

// PROPERTY TEST STRATEGIES

fn state_strategy() -> impl Strategy<Value = PetState> {
    prop::sample::select(PetState::ALL.to_vec())
}

fn action_strategy() -> impl Strategy<Value = CareAction> {
    prop::sample::select(CareAction::ALL.to_vec())
}

fn draw_strategy() -> impl Strategy<Value = f64> {
    0.0f64..1.0
}

// Reference chain for drift out of normal, written out independently of the table.
fn expected_drift_from_normal(draw: f64) -> PetState {
    if draw < 0.25 {
        PetState::Sick
    } else if draw < 0.35 {
        PetState::Depressed
    } else if draw < 0.43 {
        PetState::Happy
    } else if draw < 0.55 {
        PetState::Hungry
    } else if draw < 0.65 {
        PetState::Bored
    } else {
        PetState::Normal
    }
}

proptest! {
    #[test]
    fn care_transitions_are_deterministic(
        state in state_strategy(),
        action in action_strategy(),
    ) {
        prop_assert_eq!(apply_action(state, action), apply_action(state, action));
    }

    #[test]
    fn care_results_are_always_canonical(
        state in state_strategy(),
        action in action_strategy(),
    ) {
        let transition = apply_action(state, action);
        prop_assert_eq!(PetState::normalize(transition.state.as_str()), transition.state);
        prop_assert!(PetState::ALL.contains(&transition.state));
    }

    #[test]
    fn sick_pets_ignore_everything_but_heal(action in action_strategy()) {
        let transition = apply_action(PetState::Sick, action);
        if action == CareAction::Heal {
            prop_assert_eq!(transition.state, PetState::Normal);
        } else {
            prop_assert_eq!(transition.state, PetState::Sick);
            prop_assert!(transition.message.contains("sick"));
        }
    }

    #[test]
    fn heal_only_changes_sick_pets(state in state_strategy()) {
        let transition = apply_action(state, CareAction::Heal);
        if state == PetState::Sick {
            prop_assert_eq!(transition.state, PetState::Normal);
        } else {
            prop_assert_eq!(transition.state, state);
            prop_assert_eq!(transition.message, "The pet is not sick.");
        }
    }

    #[test]
    fn walks_and_play_make_pets_happy(
        state in state_strategy(),
        action in prop::sample::select(vec![CareAction::Walk, CareAction::Play]),
    ) {
        let expected = if state == PetState::Sick { PetState::Sick } else { PetState::Happy };
        prop_assert_eq!(apply_action(state, action).state, expected);
    }

    #[test]
    fn transient_displays_never_become_state(
        state in state_strategy(),
        action in action_strategy(),
    ) {
        let transition = apply_action(state, action);
        prop_assert_ne!(transition.state.as_str(), FED_DISPLAY);
        prop_assert_ne!(transition.state.as_str(), BATHED_DISPLAY);
        if transition.display != FED_DISPLAY && transition.display != BATHED_DISPLAY {
            prop_assert_eq!(transition.display, transition.state.as_str());
        }
    }

    #[test]
    fn normal_pets_drift_along_the_threshold_chain(draw in draw_strategy()) {
        let report = apply_query_drift(PetState::Normal, draw);
        prop_assert_eq!(report.state, expected_drift_from_normal(draw));
    }

    #[test]
    fn happy_pets_fade_on_low_draws(draw in draw_strategy()) {
        let expected = if draw < 0.5 { PetState::Normal } else { PetState::Happy };
        prop_assert_eq!(apply_query_drift(PetState::Happy, draw).state, expected);
    }

    #[test]
    fn other_states_never_drift(
        state in prop::sample::select(vec![
            PetState::Sick,
            PetState::Depressed,
            PetState::Hungry,
            PetState::Bored,
        ]),
        draw in draw_strategy(),
    ) {
        prop_assert_eq!(apply_query_drift(state, draw).state, state);
    }

    #[test]
    fn drift_reports_describe_the_resulting_state(
        state in state_strategy(),
        draw in draw_strategy(),
    ) {
        let report = apply_query_drift(state, draw);
        prop_assert_eq!(report.description, report.state.description());
    }

    #[test]
    fn unknown_stored_values_normalise_to_normal(value in "[a-z]{1,12}") {
        let state = PetState::normalize(&value);
        if PetState::ALL.iter().all(|s| s.as_str() != value) {
            prop_assert_eq!(state, PetState::Normal);
        } else {
            prop_assert_eq!(state.as_str(), value.as_str());
        }
    }
}

#[test]
fn repeated_healing_keeps_a_pet_normal() {
    let mut state = PetState::Sick;
    for _ in 0..5 {
        state = apply_action(state, CareAction::Heal).state;
        assert_eq!(state, PetState::Normal);
    }
}
