//! Rostering GA problem definition.
//!
//! Bridges a [`RosterProblem`] to the gene encoding: per-gene domains,
//! random and greedy-seeded individuals, and fitness from the shared
//! objective scorer.

use rand::Rng;
use rayon::prelude::*;

use super::chromosome::RosterChromosome;
use crate::control::RunControl;
use crate::evaluation::ObjectiveScorer;
use crate::greedy::GreedyConstructor;
use crate::roster::{Roster, RosterProblem};

/// GA view of a rostering problem.
#[derive(Debug, Clone)]
pub struct RosterGaProblem<'a> {
    problem: &'a RosterProblem,
    scorer: ObjectiveScorer<'a>,
    /// Eligible shifts per gene.
    domains: Vec<Vec<usize>>,
    /// Probability that a random gene is a working day.
    work_rate: f64,
}

impl<'a> RosterGaProblem<'a> {
    /// Creates the GA view.
    ///
    /// The random work rate is the required headcount spread evenly over
    /// all (employee, day) genes.
    pub fn new(scorer: ObjectiveScorer<'a>) -> Self {
        let problem = scorer.problem();
        let mut domains = Vec::with_capacity(problem.num_employees() * problem.days);
        for e in 0..problem.num_employees() {
            for d in 0..problem.days {
                let domain = problem
                    .slots_on(d)
                    .iter()
                    .filter(|&&slot| problem.is_eligible(e, slot))
                    .map(|&slot| problem.slots[slot].shift)
                    .collect();
                domains.push(domain);
            }
        }
        let genes = domains.len().max(1);
        let work_rate = (problem.total_required() as f64 / genes as f64).clamp(0.0, 1.0);
        Self {
            problem,
            scorer,
            domains,
            work_rate,
        }
    }

    /// The underlying problem.
    pub fn problem(&self) -> &'a RosterProblem {
        self.problem
    }

    /// Number of genes per chromosome.
    pub fn gene_count(&self) -> usize {
        self.domains.len()
    }

    /// Eligible shifts for every gene.
    pub fn domains(&self) -> &[Vec<usize>] {
        &self.domains
    }

    /// Probability that a random gene works.
    pub fn work_rate(&self) -> f64 {
        self.work_rate
    }

    /// Random individual.
    pub fn random_individual<R: Rng>(&self, rng: &mut R) -> RosterChromosome {
        RosterChromosome::random(&self.domains, self.work_rate, rng)
    }

    /// Greedy-constructed individual. `None` when the run is interrupted.
    pub fn greedy_individual<R: Rng>(
        &self,
        control: &RunControl,
        rng: &mut R,
    ) -> Option<RosterChromosome> {
        GreedyConstructor::new(self.problem)
            .construct_within(control, rng)
            .map(|roster| RosterChromosome::from_roster(self.problem, &roster))
    }

    /// Individual encoding an existing roster.
    pub fn encode(&self, roster: &Roster) -> RosterChromosome {
        RosterChromosome::from_roster(self.problem, roster)
    }

    /// Decodes an individual.
    pub fn decode(&self, chromosome: &RosterChromosome) -> Roster {
        chromosome.to_roster(self.problem)
    }

    /// Scores one individual and stores its fitness.
    pub fn evaluate(&self, chromosome: &mut RosterChromosome) {
        chromosome.fitness = self.scorer.score(&self.decode(chromosome));
    }

    /// Scores a batch, in parallel when asked to.
    pub fn evaluate_all(&self, population: &mut [RosterChromosome], parallel: bool) {
        if parallel {
            population.par_iter_mut().for_each(|c| self.evaluate(c));
        } else {
            population.iter_mut().for_each(|c| self.evaluate(c));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, ObjectiveWeights, RuleSet, Shift};
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn problem() -> RosterProblem {
        RosterProblem::new(
            vec![
                Employee::new("E1").with_day_off(date(2)),
                Employee::new("E2").with_skill("x", 1.0),
            ],
            vec![
                Shift::from_hours("DAY", 8, 16),
                Shift::from_hours("SKILLED", 16, 23).with_required_skill("x"),
            ],
            date(1),
            date(2),
            RuleSet::default(),
        )
    }

    #[test]
    fn test_domains_follow_eligibility() {
        let p = problem();
        let ga = RosterGaProblem::new(ObjectiveScorer::new(&p, ObjectiveWeights::default()));
        assert_eq!(ga.gene_count(), 4);
        // E1: day 1 DAY only (no skill), day 2 off.
        assert_eq!(ga.domains()[0], vec![0]);
        assert!(ga.domains()[1].is_empty());
        // E2: both shifts on both days.
        assert_eq!(ga.domains()[2], vec![0, 1]);
        assert_eq!(ga.domains()[3], vec![0, 1]);
        assert!((ga.work_rate() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_and_serial_evaluation_agree() {
        let p = problem();
        let scorer = ObjectiveScorer::new(&p, ObjectiveWeights::default());
        let ga = RosterGaProblem::new(scorer);
        let mut rng = SmallRng::seed_from_u64(42);
        let mut a: Vec<RosterChromosome> = (0..8).map(|_| ga.random_individual(&mut rng)).collect();
        let mut b = a.clone();
        ga.evaluate_all(&mut a, true);
        ga.evaluate_all(&mut b, false);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.fitness, y.fitness);
            assert_eq!(x.fitness, scorer.score(&ga.decode(x)));
        }
    }

    #[test]
    fn test_greedy_individual_decodes_feasible() {
        let p = problem();
        let scorer = ObjectiveScorer::new(&p, ObjectiveWeights::default());
        let ga = RosterGaProblem::new(scorer);
        let mut rng = SmallRng::seed_from_u64(42);
        let ch = ga.greedy_individual(&RunControl::unlimited(), &mut rng).unwrap();
        let (_, hard) = scorer.score_with_hard(&ga.decode(&ch));
        assert_eq!(hard, 0);
    }
}
