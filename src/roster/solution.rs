//! Candidate roster.
//!
//! A [`Roster`] is an ordered list of placements plus a cached objective
//! score. Every mutation drops the cache, so a roster can never be
//! compared using a score that no longer matches its placements.

/// One employee placed on one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placement {
    /// Employee position in the problem.
    pub employee: usize,
    /// Slot position in the problem.
    pub slot: usize,
}

impl Placement {
    /// Creates a placement.
    #[inline]
    pub fn new(employee: usize, slot: usize) -> Self {
        Self { employee, slot }
    }
}

/// A candidate solution.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    placements: Vec<Placement>,
    score: Option<f64>,
}

impl PartialEq for Roster {
    /// Rosters are equal when they hold the same placements in the same order.
    fn eq(&self, other: &Self) -> bool {
        self.placements == other.placements
    }
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a roster from placements.
    pub fn from_placements(placements: Vec<Placement>) -> Self {
        Self {
            placements,
            score: None,
        }
    }

    /// Placements in order.
    #[inline]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Number of placements.
    #[inline]
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether the roster has no placements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Whether the roster holds a placement.
    pub fn contains(&self, placement: Placement) -> bool {
        self.placements.contains(&placement)
    }

    /// Cached score, if still valid.
    #[inline]
    pub fn cached_score(&self) -> Option<f64> {
        self.score
    }

    /// Stores a freshly computed score.
    pub(crate) fn cache_score(&mut self, score: f64) {
        self.score = Some(score);
    }

    /// Appends a placement.
    pub fn add(&mut self, placement: Placement) {
        self.placements.push(placement);
        self.score = None;
    }

    /// Removes the first occurrence of a placement.
    pub fn remove(&mut self, placement: Placement) -> bool {
        match self.placements.iter().position(|&p| p == placement) {
            Some(i) => {
                self.placements.remove(i);
                self.score = None;
                true
            }
            None => false,
        }
    }

    /// Removes the placement at `index`.
    pub fn remove_at(&mut self, index: usize) -> Placement {
        self.score = None;
        self.placements.remove(index)
    }

    /// Replaces the placement at `index`, returning the old one.
    pub fn replace(&mut self, index: usize, placement: Placement) -> Placement {
        self.score = None;
        std::mem::replace(&mut self.placements[index], placement)
    }

    /// Removes every placement.
    pub fn clear(&mut self) {
        self.placements.clear();
        self.score = None;
    }

    /// Placements of one employee.
    pub fn of_employee(&self, employee: usize) -> impl Iterator<Item = &Placement> {
        self.placements.iter().filter(move |p| p.employee == employee)
    }
}
