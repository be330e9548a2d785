//! Generational GA runner with elitism.
//!
//! ```text
//! INIT → EVALUATE → (SELECT → CROSSOVER → MUTATE → EVALUATE → REPLACE)* → DONE
//! ```
//!
//! Replacement keeps the top `elite_rate` share of the combined
//! parent+offspring pool, then fills with offspring. The best individual
//! of the pool always survives, so best-of-generation fitness never
//! decreases. The outcome history holds that best-of-generation fitness,
//! starting with the initial population.

use log::{debug, info};
use rand::Rng;

use super::chromosome::RosterChromosome;
use super::operators::GeneticOperators;
use super::problem::RosterGaProblem;
use crate::control::{RunControl, SearchOutcome, Termination};
use crate::models::SolverParams;
use crate::roster::Roster;

/// Genetic optimizer over [`RosterGaProblem`].
#[derive(Debug)]
pub struct GeneticOptimizer<'a> {
    ga: RosterGaProblem<'a>,
    operators: GeneticOperators,
    params: &'a SolverParams,
    control: &'a RunControl,
    initial: Option<Roster>,
}

impl<'a> GeneticOptimizer<'a> {
    pub fn new(ga: RosterGaProblem<'a>, params: &'a SolverParams, control: &'a RunControl) -> Self {
        Self {
            ga,
            operators: GeneticOperators::from_params(params),
            params,
            control,
            initial: None,
        }
    }

    /// Adds an existing roster to the initial population.
    pub fn with_initial(mut self, roster: Roster) -> Self {
        self.initial = Some(roster);
        self
    }

    /// Replaces the operators derived from the parameters.
    pub fn with_operators(mut self, operators: GeneticOperators) -> Self {
        self.operators = operators;
        self
    }

    /// Number of elites carried from a pool of `pool` individuals.
    pub fn elite_count(&self, pool: usize) -> usize {
        let count = (self.params.elite_rate * pool as f64).ceil() as usize;
        count.clamp(1, self.params.population_size.max(1))
    }

    /// Runs the generation loop.
    pub fn run<R: Rng>(&self, rng: &mut R) -> SearchOutcome {
        let size = self.params.population_size.max(2);
        self.control.report(0.0, "initializing population");

        let (mut population, interrupted) = self.initial_population(size, rng);
        if population.is_empty() {
            return SearchOutcome::empty(interrupted.unwrap_or(Termination::Completed));
        }
        self.ga
            .evaluate_all(&mut population, self.params.parallel_evaluation);
        let mut evaluations = population.len() as u64;
        let mut best = fittest(&population).clone();
        let mut history = vec![best.fitness];

        if let Some(termination) = interrupted {
            return self.finish(best, termination, 0, evaluations, history);
        }

        let mut stagnant = 0usize;
        let mut generation = 0u64;
        let termination = loop {
            if generation >= self.params.max_generations as u64 {
                break Termination::Completed;
            }
            if let Some(t) = self.control.checkpoint().termination() {
                break t;
            }

            let mut offspring = self.breed(&population, size, rng);
            self.ga
                .evaluate_all(&mut offspring, self.params.parallel_evaluation);
            evaluations += offspring.len() as u64;
            population = self.replace(population, offspring, size);
            generation += 1;

            let leader = fittest(&population);
            history.push(leader.fitness);
            if leader.fitness > best.fitness {
                best = leader.clone();
                stagnant = 0;
                debug!("generation {generation}: best {:.4}", best.fitness);
            } else {
                stagnant += 1;
            }
            self.control.report(
                generation as f64 / self.params.max_generations.max(1) as f64,
                &format!("generation {generation}"),
            );

            if stagnant >= self.params.stagnation_generations {
                debug!("stagnated after {generation} generations");
                break Termination::Completed;
            }
        };

        self.finish(best, termination, generation, evaluations, history)
    }

    fn finish(
        &self,
        best: RosterChromosome,
        termination: Termination,
        generations: u64,
        evaluations: u64,
        history: Vec<f64>,
    ) -> SearchOutcome {
        info!(
            "genetic: best {:.4} after {generations} generations ({:?})",
            best.fitness, termination
        );
        SearchOutcome::finished(self.ga.decode(&best), termination)
            .with_generations(generations)
            .with_iterations(evaluations)
            .with_history(history)
    }

    /// Seeds half the population greedily (plus the initial roster, if
    /// any) and the rest at random. Passes a control checkpoint per
    /// individual and returns the termination reason when one ends the run.
    fn initial_population<R: Rng>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> (Vec<RosterChromosome>, Option<Termination>) {
        let mut population = Vec::with_capacity(size);
        if let Some(roster) = &self.initial {
            population.push(self.ga.encode(roster));
        }
        let greedy = size / 2;
        while population.len() < size {
            if let Some(t) = self.control.checkpoint().termination() {
                return (population, Some(t));
            }
            let individual = if population.len() < greedy {
                match self.ga.greedy_individual(self.control, rng) {
                    Some(c) => c,
                    None => continue,
                }
            } else {
                self.ga.random_individual(rng)
            };
            population.push(individual);
        }
        (population, None)
    }

    fn breed<R: Rng>(
        &self,
        population: &[RosterChromosome],
        size: usize,
        rng: &mut R,
    ) -> Vec<RosterChromosome> {
        let domains = self.ga.domains();
        let mut offspring = Vec::with_capacity(size + 1);
        while offspring.len() < size {
            let a = self.operators.select(population, rng);
            let b = self.operators.select(population, rng);
            let (mut c1, mut c2) = self.operators.crossover(&population[a], &population[b], rng);
            self.operators.mutate(&mut c1, domains, rng);
            self.operators.mutate(&mut c2, domains, rng);
            offspring.push(c1);
            if offspring.len() < size {
                offspring.push(c2);
            }
        }
        offspring
    }

    /// Elites from the combined pool, then the remaining offspring in
    /// order.
    fn replace(
        &self,
        parents: Vec<RosterChromosome>,
        offspring: Vec<RosterChromosome>,
        size: usize,
    ) -> Vec<RosterChromosome> {
        let parent_count = parents.len();
        let mut pool: Vec<RosterChromosome> = parents;
        pool.extend(offspring);

        let mut ranked: Vec<usize> = (0..pool.len()).collect();
        ranked.sort_by(|&a, &b| pool[b].fitness.total_cmp(&pool[a].fitness));
        let elites = self.elite_count(pool.len()).min(size);

        let mut chosen = vec![false; pool.len()];
        let mut kept = 0;
        for &i in &ranked[..elites] {
            chosen[i] = true;
            kept += 1;
        }
        // Remaining offspring in order, then (for small pools) the ranking.
        let fill = (parent_count..pool.len()).chain(ranked.iter().copied());
        for i in fill {
            if kept >= size {
                break;
            }
            if !chosen[i] {
                chosen[i] = true;
                kept += 1;
            }
        }

        pool.into_iter()
            .zip(chosen)
            .filter_map(|(c, keep)| keep.then_some(c))
            .collect()
    }
}

fn fittest(population: &[RosterChromosome]) -> &RosterChromosome {
    let mut best = &population[0];
    for c in &population[1..] {
        if c.fitness > best.fitness {
            best = c;
        }
    }
    best
}
