/// MatchState: the complete state of a running party-game match.
///
/// Two teams take alternating turns acting out a hidden phrase. Mutations
/// happen only through the action methods below; each scoring action
/// re-selects the phrase and hides it again. Events are returned for the
/// presentation layer (sound feedback) to consume.
///
/// Nothing here persists; a relaunch or force-reload starts from zero.

use rand::Rng;

use crate::domain::catalog::{CatalogError, Category, Language, PhraseCatalog};

// ── Teams ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Team {
    A,
    B,
}

impl Team {
    pub fn other(self) -> Self {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Team::A => "Team A",
            Team::B => "Team B",
        }
    }

    fn index(self) -> usize {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }
}

// ── Events ──

/// Emitted by match actions; the UI layer maps these to sound effects.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchEvent {
    /// A team scored (the team that just guessed correctly).
    Point { team: Team },
    /// The active team skipped its phrase.
    Skipped,
    /// The phrase card was flipped; `shown` is the new visibility.
    RevealToggled { shown: bool },
}

// ── Match state ──

pub struct MatchState {
    scores: [u32; 2],
    pub active: Team,
    pub phrase: &'static str,
    pub revealed: bool,
    pub language: Language,
    pub category: Category,
}

impl MatchState {
    /// Fresh match: zero scores, Team A up, a phrase already selected
    /// (hidden) from the default language/category.
    pub fn new(catalog: &PhraseCatalog, rng: &mut impl Rng) -> Result<Self, CatalogError> {
        let language = Language::English;
        let category = Category::General;
        let phrase = catalog.pick(language, category, rng)?;
        Ok(MatchState {
            scores: [0, 0],
            active: Team::A,
            phrase,
            revealed: false,
            language,
            category,
        })
    }

    pub fn score(&self, team: Team) -> u32 {
        self.scores[team.index()]
    }

    /// The active team guessed the phrase: +1 point, turn passes,
    /// new hidden phrase.
    pub fn guess_correct(
        &mut self,
        catalog: &PhraseCatalog,
        rng: &mut impl Rng,
    ) -> Result<MatchEvent, CatalogError> {
        let team = self.active;
        self.scores[team.index()] += 1;
        self.active = team.other();
        self.reselect(catalog, rng)?;
        Ok(MatchEvent::Point { team })
    }

    /// The active team gives up on this phrase: turn passes, new hidden
    /// phrase, scores untouched.
    pub fn skip(
        &mut self,
        catalog: &PhraseCatalog,
        rng: &mut impl Rng,
    ) -> Result<MatchEvent, CatalogError> {
        self.active = self.active.other();
        self.reselect(catalog, rng)?;
        Ok(MatchEvent::Skipped)
    }

    /// Flip phrase visibility. No other side effect.
    pub fn toggle_reveal(&mut self) -> MatchEvent {
        self.revealed = !self.revealed;
        MatchEvent::RevealToggled { shown: self.revealed }
    }

    /// Switch language; immediately re-selects (and hides) the phrase.
    pub fn set_language(
        &mut self,
        language: Language,
        catalog: &PhraseCatalog,
        rng: &mut impl Rng,
    ) -> Result<(), CatalogError> {
        self.language = language;
        self.reselect(catalog, rng)
    }

    /// Switch category; immediately re-selects (and hides) the phrase.
    pub fn set_category(
        &mut self,
        category: Category,
        catalog: &PhraseCatalog,
        rng: &mut impl Rng,
    ) -> Result<(), CatalogError> {
        self.category = category;
        self.reselect(catalog, rng)
    }

    fn reselect(&mut self, catalog: &PhraseCatalog, rng: &mut impl Rng) -> Result<(), CatalogError> {
        self.phrase = catalog.pick(self.language, self.category, rng)?;
        self.revealed = false;
        Ok(())
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (PhraseCatalog, StdRng, MatchState) {
        let catalog = PhraseCatalog::embedded();
        let mut rng = StdRng::seed_from_u64(42);
        let state = MatchState::new(&catalog, &mut rng).unwrap();
        (catalog, rng, state)
    }

    #[test]
    fn starts_hidden_with_zero_scores() {
        let (catalog, _, state) = setup();
        assert_eq!(state.score(Team::A), 0);
        assert_eq!(state.score(Team::B), 0);
        assert_eq!(state.active, Team::A);
        assert!(!state.revealed);
        assert!(catalog
            .phrases(state.language, state.category)
            .contains(&state.phrase));
    }

    #[test]
    fn guess_scores_the_guessing_team_and_passes_turn() {
        let (catalog, mut rng, mut state) = setup();
        let ev = state.guess_correct(&catalog, &mut rng).unwrap();
        assert_eq!(ev, MatchEvent::Point { team: Team::A });
        assert_eq!(state.score(Team::A), 1);
        assert_eq!(state.score(Team::B), 0);
        assert_eq!(state.active, Team::B);
    }

    #[test]
    fn skip_passes_turn_without_scoring() {
        let (catalog, mut rng, mut state) = setup();
        let ev = state.skip(&catalog, &mut rng).unwrap();
        assert_eq!(ev, MatchEvent::Skipped);
        assert_eq!(state.score(Team::A), 0);
        assert_eq!(state.score(Team::B), 0);
        assert_eq!(state.active, Team::B);
    }

    // Property: score sum == guess count, for any guess/skip sequence.
    #[test]
    fn score_sum_equals_guess_count() {
        let (catalog, mut rng, mut state) = setup();
        let mut guesses = 0;
        for i in 0..200 {
            if i % 3 == 0 {
                state.skip(&catalog, &mut rng).unwrap();
            } else {
                state.guess_correct(&catalog, &mut rng).unwrap();
                guesses += 1;
            }
        }
        assert_eq!(state.score(Team::A) + state.score(Team::B), guesses);
    }

    // Property: active team strictly alternates across scoring actions.
    #[test]
    fn turn_strictly_alternates() {
        let (catalog, mut rng, mut state) = setup();
        let mut prev = state.active;
        for i in 0..50 {
            if i % 2 == 0 {
                state.guess_correct(&catalog, &mut rng).unwrap();
            } else {
                state.skip(&catalog, &mut rng).unwrap();
            }
            assert_eq!(state.active, prev.other());
            prev = state.active;
        }
    }

    // Property: after every scoring action the phrase is hidden and drawn
    // from the currently selected list.
    #[test]
    fn scoring_reselects_and_hides() {
        let (catalog, mut rng, mut state) = setup();
        state.toggle_reveal();
        assert!(state.revealed);
        state.guess_correct(&catalog, &mut rng).unwrap();
        assert!(!state.revealed);
        assert!(catalog
            .phrases(state.language, state.category)
            .contains(&state.phrase));

        state.toggle_reveal();
        state.skip(&catalog, &mut rng).unwrap();
        assert!(!state.revealed);
    }

    #[test]
    fn reveal_toggle_has_no_other_side_effect() {
        let (_, _, mut state) = setup();
        let phrase = state.phrase;
        let ev = state.toggle_reveal();
        assert_eq!(ev, MatchEvent::RevealToggled { shown: true });
        assert_eq!(state.phrase, phrase);
        assert_eq!(state.active, Team::A);
        assert_eq!(state.score(Team::A) + state.score(Team::B), 0);
        let ev = state.toggle_reveal();
        assert_eq!(ev, MatchEvent::RevealToggled { shown: false });
    }

    #[test]
    fn language_switch_hides_and_redraws_from_new_list() {
        let (catalog, mut rng, mut state) = setup();
        state.toggle_reveal();
        state.set_language(Language::Hindi, &catalog, &mut rng).unwrap();
        assert!(!state.revealed);
        assert!(catalog
            .phrases(Language::Hindi, state.category)
            .contains(&state.phrase));
    }

    #[test]
    fn category_switch_hides_and_redraws_from_new_list() {
        let (catalog, mut rng, mut state) = setup();
        state.toggle_reveal();
        state.set_category(Category::Movies, &catalog, &mut rng).unwrap();
        assert!(!state.revealed);
        assert!(catalog
            .phrases(state.language, Category::Movies)
            .contains(&state.phrase));
    }
}
