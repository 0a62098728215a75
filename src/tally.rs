use std::collections::HashMap;
use std::ops::{Add, Sub};

use crate::model::entity::{Id, Score};

/// Running sum and count of the scores given to one kombucha.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RatingTally {
    pub sum: Score,
    pub count: usize,
}

impl RatingTally {
    pub fn of(score: Score) -> RatingTally {
        RatingTally { sum: score, count: 1 }
    }

    pub fn average(&self) -> Option<Score> {
        (self.count > 0).then(|| self.sum / self.count as Score)
    }
}

impl Add for RatingTally {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        RatingTally { sum: self.sum + rhs.sum, count: self.count + rhs.count }
    }
}

impl Sub for RatingTally {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        let count = self.count.saturating_sub(rhs.count);
        // an emptied tally must not carry float residue into the next average
        let sum = if count == 0 { 0.0 } else { self.sum - rhs.sum };
        RatingTally { sum, count }
    }
}

/// Per-kombucha tallies, adjusted as ratings are written.
#[derive(Debug, Clone, Default)]
pub struct RatingBoard(HashMap<Id, RatingTally>);

impl RatingBoard {
    pub fn record(&mut self, kombucha_id: Id, score: Score) {
        let tally = self.0.entry(kombucha_id).or_default();
        *tally = *tally + RatingTally::of(score);
    }

    pub fn retract(&mut self, kombucha_id: Id, score: Score) {
        if let Some(tally) = self.0.get_mut(&kombucha_id) {
            *tally = *tally - RatingTally::of(score);
            if tally.count == 0 {
                self.0.remove(&kombucha_id);
            }
        }
    }

    pub fn average(&self, kombucha_id: Id) -> Option<Score> {
        self.0.get(&kombucha_id).and_then(RatingTally::average)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_follows_records_and_retractions() {
        let mut board = RatingBoard::default();
        assert_eq!(board.average(1), None);

        board.record(1, 4.5);
        board.record(1, 3.5);
        board.record(2, 1.0);
        assert_eq!(board.average(1), Some(4.0));
        assert_eq!(board.average(2), Some(1.0));

        board.retract(1, 4.5);
        assert_eq!(board.average(1), Some(3.5));

        board.retract(1, 3.5);
        assert_eq!(board.average(1), None);
    }

    #[test]
    fn retracting_from_unknown_kombucha_is_a_no_op() {
        let mut board = RatingBoard::default();
        board.retract(9, 2.0);
        assert_eq!(board.average(9), None);
    }

    #[test]
    fn tallies_add_and_subtract() {
        let tally = RatingTally::of(2.0) + RatingTally::of(4.0);
        assert_eq!(tally, RatingTally { sum: 6.0, count: 2 });
        assert_eq!((tally - RatingTally::of(2.0)).average(), Some(4.0));
    }
}
