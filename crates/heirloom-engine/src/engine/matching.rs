use crate::core::{Card, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum CardState {
    Hidden,
    Revealed,
    Matched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardCard {
    pub card: Card,
    pub state: CardState,
}

/// What turning a card over did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum FlipOutcome {
    /// Out of range, already face up, or already matched. Nothing changed.
    Rejected,
    /// First card of a move is now face up.
    Revealed { index: usize },
    /// Second card completed a pair; both stay face up.
    Matched {
        first: usize,
        second: usize,
        pair: usize,
    },
    /// Second card did not match; both are hidden again.
    Mismatched { first: usize, second: usize },
}

/// Card layout of a matching round.
///
/// A move is two flips. The second flip is judged immediately with
/// [`Validator::PairEquality`]: a mismatch hides both cards again within the
/// same call, so the board never holds more than one unresolved card.
#[derive(Debug, Clone)]
pub struct MatchingBoard {
    cards: Vec<BoardCard>,
    revealed: Option<usize>,
    moves: u32,
    matched_pairs: usize,
}

impl MatchingBoard {
    #[must_use]
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards: cards
                .into_iter()
                .map(|card| BoardCard {
                    card,
                    state: CardState::Hidden,
                })
                .collect(),
            revealed: None,
            moves: 0,
            matched_pairs: 0,
        }
    }

    #[must_use]
    pub fn cards(&self) -> &[BoardCard] {
        &self.cards
    }

    /// Completed moves (pairs of flips), matched or not.
    #[must_use]
    pub const fn moves(&self) -> u32 {
        self.moves
    }

    #[must_use]
    pub const fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.matched_pairs == self.pair_count()
    }

    /// Index of the card waiting for its partner, if any.
    #[must_use]
    pub const fn revealed(&self) -> Option<usize> {
        self.revealed
    }

    /// Pair indices that have not been matched, ascending.
    #[must_use]
    pub fn unmatched_pairs(&self) -> Vec<usize> {
        let mut pairs: Vec<_> = self
            .cards
            .iter()
            .filter(|card| !card.state.is_matched())
            .map(|card| card.card.pair)
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    pub fn flip(&mut self, index: usize) -> FlipOutcome {
        if !self
            .cards
            .get(index)
            .is_some_and(|card| card.state.is_hidden())
        {
            return FlipOutcome::Rejected;
        }

        let Some(first) = self.revealed.take() else {
            self.cards[index].state = CardState::Revealed;
            self.revealed = Some(index);
            return FlipOutcome::Revealed { index };
        };

        self.moves += 1;
        let second = index;
        if Validator::PairEquality.cards_match(&self.cards[first].card, &self.cards[second].card) {
            self.cards[first].state = CardState::Matched;
            self.cards[second].state = CardState::Matched;
            self.matched_pairs += 1;
            FlipOutcome::Matched {
                first,
                second,
                pair: self.cards[first].card.pair,
            }
        } else {
            self.cards[first].state = CardState::Hidden;
            self.cards[second].state = CardState::Hidden;
            FlipOutcome::Mismatched { first, second }
        }
    }
}
