//! Configurable genetic operators for rostering.
//!
//! Bundles parent selection, crossover and mutation settings so the
//! optimizer can be driven from [`SolverParams`].
//!
//! # Usage
//!
//! ```
//! use u_roster::ga::operators::GeneticOperators;
//! use u_roster::models::{SelectionMethod, SolverParams};
//!
//! let ops = GeneticOperators::from_params(&SolverParams::default());
//! assert_eq!(ops.selection, SelectionMethod::Tournament);
//! assert_eq!(ops.tournament_size, 5);
//! ```

use rand::Rng;

use super::chromosome::{reassign_mutation, single_point_crossover, RosterChromosome};
use crate::models::{SelectionMethod, SolverParams};

/// Runtime-selectable genetic operators.
///
/// Fitness is maximized. Tournament selection copes with negative
/// fitness; roulette shifts every fitness above the population minimum,
/// and degenerates to uniform choice when all fitness values are equal.
#[derive(Debug, Clone)]
pub struct GeneticOperators {
    /// Parent selection scheme.
    pub selection: SelectionMethod,
    /// Individuals sampled per tournament.
    pub tournament_size: usize,
    /// Probability that a parent pair is recombined.
    pub crossover_rate: f64,
    /// Per-gene mutation probability.
    pub mutation_rate: f64,
}

impl Default for GeneticOperators {
    fn default() -> Self {
        Self::from_params(&SolverParams::default())
    }
}

impl GeneticOperators {
    /// Reads operator settings from solver parameters.
    pub fn from_params(params: &SolverParams) -> Self {
        Self {
            selection: params.selection,
            tournament_size: params.tournament_size.max(1),
            crossover_rate: params.crossover_rate.clamp(0.0, 1.0),
            mutation_rate: params.mutation_rate.clamp(0.0, 1.0),
        }
    }

    /// Picks one parent index. The population must not be empty.
    pub fn select<R: Rng>(&self, population: &[RosterChromosome], rng: &mut R) -> usize {
        match self.selection {
            SelectionMethod::Tournament => tournament(population, self.tournament_size, rng),
            SelectionMethod::Roulette => roulette(population, rng),
        }
    }

    /// Recombines two parents with probability `crossover_rate`, otherwise
    /// copies them.
    pub fn crossover<R: Rng>(
        &self,
        p1: &RosterChromosome,
        p2: &RosterChromosome,
        rng: &mut R,
    ) -> (RosterChromosome, RosterChromosome) {
        if rng.random_bool(self.crossover_rate) {
            single_point_crossover(p1, p2, rng)
        } else {
            (p1.clone(), p2.clone())
        }
    }

    /// Mutates genes in place.
    pub fn mutate<R: Rng>(&self, chromosome: &mut RosterChromosome, domains: &[Vec<usize>], rng: &mut R) {
        reassign_mutation(chromosome, domains, self.mutation_rate, rng);
    }
}

fn tournament<R: Rng>(population: &[RosterChromosome], size: usize, rng: &mut R) -> usize {
    let mut best = rng.random_range(0..population.len());
    for _ in 1..size {
        let challenger = rng.random_range(0..population.len());
        if population[challenger].fitness > population[best].fitness {
            best = challenger;
        }
    }
    best
}

fn roulette<R: Rng>(population: &[RosterChromosome], rng: &mut R) -> usize {
    let min = population
        .iter()
        .map(|c| c.fitness)
        .filter(|f| f.is_finite())
        .fold(f64::INFINITY, f64::min);
    let weights: Vec<f64> = population
        .iter()
        .map(|c| {
            if c.fitness.is_finite() && min.is_finite() {
                c.fitness - min + 1e-9
            } else {
                1e-9
            }
        })
        .collect();
    let total: f64 = weights.iter().sum();
    let mut pick = rng.random_range(0.0..total);
    for (i, w) in weights.iter().enumerate() {
        if pick < *w {
            return i;
        }
        pick -= w;
    }
    population.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn population(fitness: &[f64]) -> Vec<RosterChromosome> {
        fitness
            .iter()
            .map(|&f| {
                let mut c = RosterChromosome::new(vec![None; 4]);
                c.fitness = f;
                c
            })
            .collect()
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let pop = population(&[-30.0, -20.0, 0.5, -10.0]);
        let ops = GeneticOperators {
            tournament_size: 4,
            ..GeneticOperators::default()
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let mut wins = 0;
        for _ in 0..200 {
            if ops.select(&pop, &mut rng) == 2 {
                wins += 1;
            }
        }
        // P(best sampled in 4 draws of 4) = 1 - (3/4)^4 ≈ 0.68.
        assert!(wins > 100, "wins = {wins}");
    }

    #[test]
    fn test_roulette_handles_negative_fitness() {
        let pop = population(&[-50.0, -10.0, -49.0]);
        let ops = GeneticOperators {
            selection: SelectionMethod::Roulette,
            ..GeneticOperators::default()
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for _ in 0..500 {
            counts[ops.select(&pop, &mut rng)] += 1;
        }
        assert!(counts[1] > counts[0] + counts[2]);
    }

    #[test]
    fn test_roulette_uniform_when_equal() {
        let pop = population(&[1.0, 1.0, 1.0]);
        let ops = GeneticOperators {
            selection: SelectionMethod::Roulette,
            ..GeneticOperators::default()
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for _ in 0..300 {
            counts[ops.select(&pop, &mut rng)] += 1;
        }
        assert!(counts.iter().all(|&c| c > 50));
    }

    #[test]
    fn test_crossover_rate_zero_copies_parents() {
        let a = RosterChromosome::new(vec![Some(0); 6]);
        let b = RosterChromosome::new(vec![None; 6]);
        let ops = GeneticOperators {
            crossover_rate: 0.0,
            ..GeneticOperators::default()
        };
        let mut rng = SmallRng::seed_from_u64(42);
        let (c1, c2) = ops.crossover(&a, &b, &mut rng);
        assert_eq!(c1.genes, a.genes);
        assert_eq!(c2.genes, b.genes);
    }
}
