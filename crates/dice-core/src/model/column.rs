use crate::model::die::DieValue;
use serde::{Deserialize, Serialize};

pub const COLUMN_HEIGHT: usize = 3;

/// One vertical triple of slots, filled bottom to top.
///
/// A slot only holds a die when every slot below it does. Removal compacts the
/// survivors downward so that invariant is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Column {
    slots: [Option<DieValue>; COLUMN_HEIGHT],
}

impl Column {
    pub const EMPTY: Column = Column {
        slots: [None; COLUMN_HEIGHT],
    };

    /// Builds a column from bottom-first values. Returns `None` when more than
    /// three dice are given.
    pub fn from_dice(dice: &[DieValue]) -> Option<Self> {
        if dice.len() > COLUMN_HEIGHT {
            return None;
        }
        let mut column = Column::EMPTY;
        for (slot, die) in column.slots.iter_mut().zip(dice) {
            *slot = Some(*die);
        }
        Some(column)
    }

    #[cfg(test)]
    pub(crate) fn from_slots(slots: [Option<DieValue>; COLUMN_HEIGHT]) -> Self {
        Column { slots }
    }

    pub fn slots(&self) -> &[Option<DieValue>; COLUMN_HEIGHT] {
        &self.slots
    }

    pub fn dice(&self) -> impl Iterator<Item = DieValue> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots[0].is_none()
    }

    pub fn is_full(&self) -> bool {
        self.slots[COLUMN_HEIGHT - 1].is_some()
    }

    pub fn empty_slots(&self) -> usize {
        COLUMN_HEIGHT - self.len()
    }

    pub fn count_of(&self, die: DieValue) -> u32 {
        self.dice().filter(|d| *d == die).count() as u32
    }

    pub fn contains(&self, die: DieValue) -> bool {
        self.dice().any(|d| d == die)
    }

    /// True when no filled slot sits above an empty one.
    pub fn is_compact(&self) -> bool {
        self.slots.windows(2).all(|pair| pair[0].is_some() || pair[1].is_none())
    }

    /// Places into the lowest empty slot and returns the row used.
    pub fn place(&mut self, die: DieValue) -> Option<usize> {
        let row = self.slots.iter().position(Option::is_none)?;
        self.slots[row] = Some(die);
        Some(row)
    }

    /// Removes every die showing `die` and shifts the rest down. Returns the
    /// number of dice removed.
    pub fn remove_value(&mut self, die: DieValue) -> u8 {
        let mut kept = [None; COLUMN_HEIGHT];
        let mut idx = 0;
        let mut removed = 0u8;
        for value in self.dice() {
            if value == die {
                removed += 1;
            } else {
                kept[idx] = Some(value);
                idx += 1;
            }
        }
        self.slots = kept;
        removed
    }

    /// Sum over distinct faces `v` of `v * c^2`, `c` being how often `v` appears.
    pub fn score(&self) -> u32 {
        let mut counts = [0u32; 7];
        for die in self.dice() {
            counts[die.get() as usize] += 1;
        }
        counts
            .iter()
            .enumerate()
            .map(|(value, &count)| value as u32 * count * count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::Column;
    use crate::model::die::DieValue;

    fn d(value: u8) -> DieValue {
        DieValue::new(value).unwrap()
    }

    #[test]
    fn equal_dice_score_value_times_count_squared() {
        for value in 1..=6u8 {
            for count in 1..=3usize {
                let dice = vec![d(value); count];
                let column = Column::from_dice(&dice).unwrap();
                let c = count as u32;
                assert_eq!(column.score(), value as u32 * c * c, "v={value} c={count}");
            }
        }
    }

    #[test]
    fn mixed_column_scores_each_face_separately() {
        let column = Column::from_dice(&[d(3), d(5), d(3)]).unwrap();
        assert_eq!(column.score(), 3 * 4 + 5);
    }

    #[test]
    fn place_fills_bottom_first_until_full() {
        let mut column = Column::EMPTY;
        assert_eq!(column.place(d(2)), Some(0));
        assert_eq!(column.place(d(4)), Some(1));
        assert_eq!(column.place(d(6)), Some(2));
        assert!(column.is_full());
        assert_eq!(column.place(d(1)), None);
    }

    #[test]
    fn removal_compacts_survivors_in_order() {
        let mut column = Column::from_dice(&[d(5), d(2), d(5)]).unwrap();
        assert_eq!(column.remove_value(d(5)), 2);
        assert_eq!(column.slots(), &[Some(d(2)), None, None]);
        assert!(column.is_compact());

        let mut column = Column::from_dice(&[d(1), d(4), d(6)]).unwrap();
        assert_eq!(column.remove_value(d(4)), 1);
        assert_eq!(column.slots(), &[Some(d(1)), Some(d(6)), None]);
    }

    #[test]
    fn removing_absent_value_is_noop() {
        let mut column = Column::from_dice(&[d(1), d(2)]).unwrap();
        assert_eq!(column.remove_value(d(6)), 0);
        assert_eq!(column.len(), 2);
    }

    #[test]
    fn gaps_are_detected() {
        let column = Column::from_slots([None, Some(d(3)), None]);
        assert!(!column.is_compact());
        assert!(Column::EMPTY.is_compact());
    }
}
