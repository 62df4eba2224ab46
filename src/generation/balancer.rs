use super::{DistributionBalance, GenerationOptions};
use crate::config::DistributionOrder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Résultat d'une affectation sur un créneau.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment<K> {
    pub chosen: Vec<K>,
    /// Candidats dont la série de créneaux consécutifs vient de dépasser le seuil.
    pub fatigued: Vec<K>,
}

/// Répartit les candidats sur les créneaux, pour une seule génération.
///
/// Les compteurs vivent dans l'instance : une instance neuve par appel de
/// prévisualisation, jamais d'état partagé entre générations.
#[derive(Debug)]
pub struct Balancer<K> {
    order: DistributionOrder,
    declared: Vec<K>,
    index: HashMap<K, usize>,
    counts: Vec<usize>,
    streaks: Vec<u32>,
    cursor: usize,
    rng: StdRng,
    max_consecutive: u32,
}

impl<K: Clone + Eq + Hash> Balancer<K> {
    /// `declared` fixe l'ordre de rotation et l'univers pris en compte dans le verdict.
    pub fn new(order: DistributionOrder, declared: Vec<K>, opts: GenerationOptions) -> Self {
        let mut balancer = Self {
            order,
            declared: Vec::with_capacity(declared.len()),
            index: HashMap::with_capacity(declared.len()),
            counts: Vec::with_capacity(declared.len()),
            streaks: Vec::with_capacity(declared.len()),
            cursor: 0,
            rng: StdRng::seed_from_u64(opts.seed),
            max_consecutive: opts.max_consecutive_slots,
        };
        for key in declared {
            balancer.register(&key);
        }
        balancer
    }

    fn register(&mut self, key: &K) -> usize {
        if let Some(idx) = self.index.get(key) {
            return *idx;
        }
        let idx = self.declared.len();
        self.declared.push(key.clone());
        self.index.insert(key.clone(), idx);
        self.counts.push(0);
        self.streaks.push(0);
        idx
    }

    /// Choisit jusqu'à `wanted` candidats dans `pool` et met à jour les compteurs.
    pub fn assign(&mut self, pool: &[K], wanted: usize) -> Assignment<K> {
        for key in pool {
            self.register(key);
        }
        let chosen = self.pick(pool, wanted);
        let fatigued = self.record(&chosen);
        Assignment { chosen, fatigued }
    }

    fn pick(&mut self, pool: &[K], wanted: usize) -> Vec<K> {
        if wanted == 0 || pool.is_empty() {
            return Vec::new();
        }
        match self.order {
            DistributionOrder::Balanced => {
                let mut ranked: Vec<(usize, usize, &K)> = pool
                    .iter()
                    .enumerate()
                    .map(|(pos, key)| (self.counts[self.index[key]], pos, key))
                    .collect();
                ranked.sort_by_key(|(count, pos, _)| (*count, *pos));
                ranked.truncate(wanted);
                // restitue l'ordre du vivier
                ranked.sort_by_key(|(_, pos, _)| *pos);
                ranked.into_iter().map(|(_, _, key)| key.clone()).collect()
            }
            DistributionOrder::Sequential => {
                let available: HashSet<&K> = pool.iter().collect();
                let total = self.declared.len();
                let mut out = Vec::with_capacity(wanted.min(pool.len()));
                let mut pos = self.cursor;
                for _ in 0..total {
                    let key = &self.declared[pos % total];
                    pos = (pos + 1) % total;
                    if available.contains(key) {
                        out.push(key.clone());
                        self.cursor = pos;
                        if out.len() == wanted {
                            break;
                        }
                    }
                }
                out
            }
            DistributionOrder::Random => {
                let mut shuffled = pool.to_vec();
                shuffled.shuffle(&mut self.rng);
                shuffled.truncate(wanted);
                shuffled
            }
        }
    }

    fn record(&mut self, chosen: &[K]) -> Vec<K> {
        let picked: HashSet<usize> = chosen.iter().map(|k| self.index[k]).collect();
        let mut fatigued = Vec::new();
        for idx in 0..self.declared.len() {
            if picked.contains(&idx) {
                self.counts[idx] += 1;
                let previous = self.streaks[idx];
                self.streaks[idx] = previous.saturating_add(1);
                if self.streaks[idx] > self.max_consecutive && previous <= self.max_consecutive {
                    fatigued.push(self.declared[idx].clone());
                }
            } else {
                self.streaks[idx] = 0;
            }
        }
        fatigued
    }

    pub fn count(&self, key: &K) -> usize {
        self.index.get(key).map_or(0, |idx| self.counts[*idx])
    }

    pub fn counts(&self) -> impl Iterator<Item = (&K, usize)> + '_ {
        self.declared.iter().zip(self.counts.iter().copied())
    }

    /// Écart max - min entre candidats déclarés.
    pub fn spread(&self) -> usize {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        let min = self.counts.iter().copied().min().unwrap_or(0);
        max - min
    }

    pub fn verdict(&self) -> DistributionBalance {
        DistributionBalance::from_spread(self.spread())
    }
}
