//! The population arena.
//!
//! Every live classifier is owned by a slot of [`Population`] and addressed by
//! a [`ClassifierId`]. Match and action sets hold ids only.
//!
//! Removing a classifier (deletion reaching zero numerosity, subsumption)
//! moves it out of its slot into the kill set. The slot index is not handed
//! out again until [`Population::end_trial`], so an id held by a set built
//! earlier in the same trial resolves to `None` instead of to an unrelated
//! classifier.

use std::{fmt, thread};

use rand::Rng;

use crate::{classifier::Classifier, error::LcsError, param::ClassifierParams};

/// Handle to a population slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassifierId(usize);

impl ClassifierId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassifierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Population {
    slots: Vec<Option<Classifier>>,
    /// Slots free for reuse.
    free: Vec<usize>,
    /// Classifiers removed during the current trial.
    kill_set: Vec<(ClassifierId, Classifier)>,
    size: usize,
    numerosity: u64,
}

impl Population {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of macro-classifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Total numerosity (micro-classifiers).
    #[must_use]
    pub fn numerosity(&self) -> u64 {
        self.numerosity
    }

    #[must_use]
    pub fn get(&self, id: ClassifierId) -> Option<&Classifier> {
        self.slots.get(id.0)?.as_ref()
    }

    #[must_use]
    pub fn get_mut(&mut self, id: ClassifierId) -> Option<&mut Classifier> {
        self.slots.get_mut(id.0)?.as_mut()
    }

    #[must_use]
    pub fn contains(&self, id: ClassifierId) -> bool {
        self.get(id).is_some()
    }

    /// Live classifiers in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassifierId, &Classifier)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| Some((ClassifierId(i), slot.as_ref()?)))
    }

    /// Classifiers removed since the last [`Population::end_trial`].
    pub fn kill_set(&self) -> impl Iterator<Item = (ClassifierId, &Classifier)> {
        self.kill_set.iter().map(|(id, cl)| (*id, cl))
    }

    #[must_use]
    pub fn total_fitness(&self) -> f64 {
        self.iter().map(|(_, cl)| cl.fitness).sum()
    }

    /// Total fitness per micro-classifier.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn mean_fitness(&self) -> f64 {
        if self.numerosity == 0 {
            return 0.0;
        }
        self.total_fitness() / self.numerosity as f64
    }

    pub fn insert(&mut self, cl: Classifier) -> ClassifierId {
        self.size += 1;
        self.numerosity += u64::from(cl.numerosity);
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(cl);
            return ClassifierId(index);
        }
        self.slots.push(Some(cl));
        ClassifierId(self.slots.len() - 1)
    }

    /// Adds `n` copies to an existing classifier. Returns `false` if `id` is gone.
    pub fn add_numerosity(&mut self, id: ClassifierId, n: u32) -> bool {
        let Some(cl) = self.slots.get_mut(id.0).and_then(Option::as_mut) else {
            return false;
        };
        cl.numerosity += n;
        self.numerosity += u64::from(n);
        true
    }

    /// Moves a classifier to the kill set. Returns its numerosity.
    pub fn remove(&mut self, id: ClassifierId) -> Option<u32> {
        let cl = self.slots.get_mut(id.0)?.take()?;
        let num = cl.numerosity;
        self.size -= 1;
        self.numerosity -= u64::from(num);
        self.kill_set.push((id, cl));
        Some(num)
    }

    /// `subsumer` takes over the numerosity of `subsumed`, which goes to the
    /// kill set. Total numerosity is unchanged.
    pub fn absorb(&mut self, subsumer: ClassifierId, subsumed: ClassifierId) -> bool {
        if subsumer == subsumed || !self.contains(subsumer) {
            return false;
        }
        let Some(num) = self.remove(subsumed) else {
            return false;
        };
        self.add_numerosity(subsumer, num)
    }

    /// Deletes one micro-classifier chosen by roulette over deletion votes.
    ///
    /// Returns the id of the classifier that lost a unit.
    pub fn delete_one<R>(
        &mut self,
        params: &ClassifierParams,
        rng: &mut R,
    ) -> Result<ClassifierId, LcsError>
    where
        R: Rng,
    {
        if self.numerosity == 0 {
            return Err(LcsError::EmptyPopulation);
        }
        let mean_fitness = self.mean_fitness();
        let mut votes: Vec<(ClassifierId, f64)> = self
            .iter()
            .map(|(id, cl)| (id, cl.deletion_vote(mean_fitness, params)))
            .collect();
        let mut total: f64 = votes.iter().map(|(_, v)| v).sum();
        if !(total.is_finite() && total > 0.0) {
            for (id, vote) in &mut votes {
                *vote = self.get(*id).map_or(0.0, |cl| f64::from(cl.numerosity));
            }
            total = votes.iter().map(|(_, v)| v).sum();
        }

        let Some(&(last, _)) = votes.last() else {
            return Err(LcsError::EmptyPopulation);
        };
        let mut chosen = last;
        let mut point = rng.random::<f64>() * total;
        for (id, vote) in votes {
            if point < vote {
                chosen = id;
                break;
            }
            point -= vote;
        }

        let cl = self.get_mut(chosen).ok_or(LcsError::EmptyPopulation)?;
        if cl.numerosity > 1 {
            cl.numerosity -= 1;
            self.numerosity -= 1;
        } else {
            self.remove(chosen);
        }
        Ok(chosen)
    }

    /// Deletes micro-classifiers until total numerosity is at most `limit`.
    ///
    /// Returns the number of units deleted.
    pub fn enforce_limit<R>(
        &mut self,
        limit: u64,
        params: &ClassifierParams,
        rng: &mut R,
    ) -> Result<u64, LcsError>
    where
        R: Rng,
    {
        let mut deleted = 0;
        while self.numerosity > limit {
            self.delete_one(params, rng)?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Drops the kill set and releases its slots for reuse.
    pub fn end_trial(&mut self) -> usize {
        let killed = self.kill_set.len();
        self.free
            .extend(self.kill_set.drain(..).map(|(id, _)| id.0));
        killed
    }

    /// Ids of the classifiers whose condition matches `x`, in slot order.
    ///
    /// With more than one thread the slots are split into contiguous chunks
    /// evaluated concurrently.
    #[must_use]
    pub fn matching_ids(&self, x: &[f64], n_threads: usize) -> Vec<ClassifierId> {
        let matches_in = |offset: usize, slots: &[Option<Classifier>]| {
            slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| slot.as_ref().is_some_and(|cl| cl.matches(x)))
                .map(|(i, _)| ClassifierId(offset + i))
                .collect::<Vec<_>>()
        };
        if n_threads <= 1 || self.slots.len() < 2 * n_threads {
            return matches_in(0, &self.slots);
        }

        let chunk_size = self.slots.len().div_ceil(n_threads);
        thread::scope(|s| {
            let handles: Vec<_> = self
                .slots
                .chunks(chunk_size)
                .enumerate()
                .map(|(n, chunk)| s.spawn(move || matches_in(n * chunk_size, chunk)))
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(ids) => ids,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    /// Applies `f` to each listed classifier, spreading the work over
    /// `n_threads` scoped threads. Ids that are gone are skipped.
    pub fn for_each_mut<F>(&mut self, ids: &[ClassifierId], n_threads: usize, f: F)
    where
        F: Fn(&mut Classifier) + Sync,
    {
        let mut wanted = vec![false; self.slots.len()];
        for id in ids {
            if let Some(w) = wanted.get_mut(id.0) {
                *w = true;
            }
        }
        let mut members: Vec<&mut Classifier> = self
            .slots
            .iter_mut()
            .zip(wanted)
            .filter(|(_, wanted)| *wanted)
            .filter_map(|(slot, _)| slot.as_mut())
            .collect();

        if n_threads <= 1 || members.len() < 2 * n_threads {
            members.into_iter().for_each(f);
            return;
        }
        let chunk_size = members.len().div_ceil(n_threads);
        let f = &f;
        thread::scope(|s| {
            for chunk in members.chunks_mut(chunk_size) {
                s.spawn(move || {
                    for cl in chunk {
                        f(cl);
                    }
                });
            }
        });
    }

    /// Recounts size and numerosity from the slots.
    ///
    /// Returns the recounted `(size, numerosity)` when they disagree with the
    /// tracked values.
    #[must_use]
    pub fn recount(&self) -> Option<(usize, u64)> {
        let size = self.iter().count();
        let numerosity = self
            .iter()
            .map(|(_, cl)| u64::from(cl.numerosity))
            .sum();
        (size != self.size || numerosity != self.numerosity).then_some((size, numerosity))
    }
}
