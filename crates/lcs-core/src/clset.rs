//! Match and action sets.
//!
//! A [`ClassifierSet`] is a list of [`ClassifierId`]s into a [`Population`];
//! it owns no classifiers. Sets are rebuilt every trial, and any id whose
//! classifier was removed in the meantime is skipped by every accessor and
//! dropped by [`ClassifierSet::validate`].

use crate::{
    classifier::Classifier,
    param::Params,
    population::{ClassifierId, Population},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierSet {
    ids: Vec<ClassifierId>,
}

impl ClassifierSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_ids(ids: Vec<ClassifierId>) -> Self {
        Self { ids }
    }

    pub fn push(&mut self, id: ClassifierId) {
        self.ids.push(id);
    }

    #[must_use]
    pub fn ids(&self) -> &[ClassifierId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Live members with their ids.
    pub fn members<'a>(
        &'a self,
        pop: &'a Population,
    ) -> impl Iterator<Item = (ClassifierId, &'a Classifier)> + 'a {
        self.ids
            .iter()
            .filter_map(|id| pop.get(*id).map(|cl| (*id, cl)))
    }

    /// Drops ids whose classifier is no longer in the population.
    pub fn validate(&mut self, pop: &Population) {
        self.ids.retain(|id| pop.contains(*id));
    }

    #[must_use]
    pub fn numerosity(&self, pop: &Population) -> u64 {
        self.members(pop)
            .map(|(_, cl)| u64::from(cl.numerosity))
            .sum()
    }

    /// Numerosity-weighted mean of the members' EA time stamps.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn mean_time_stamp(&self, pop: &Population) -> f64 {
        let (sum, num) = self.members(pop).fold((0.0, 0u64), |(sum, num), (_, cl)| {
            (
                sum + cl.time_stamp as f64 * f64::from(cl.numerosity),
                num + u64::from(cl.numerosity),
            )
        });
        if num == 0 { 0.0 } else { sum / num as f64 }
    }

    pub fn set_time_stamps(&self, pop: &mut Population, time: u64) {
        for id in &self.ids {
            if let Some(cl) = pop.get_mut(*id) {
                cl.time_stamp = time;
            }
        }
    }

    /// Members advocating `action`.
    #[must_use]
    pub fn action_set(&self, pop: &Population, action: usize) -> Self {
        Self::from_ids(
            self.members(pop)
                .filter(|(_, cl)| cl.action == action)
                .map(|(id, _)| id)
                .collect(),
        )
    }

    /// Flags per action telling whether some member advocates it.
    #[must_use]
    pub fn represented_actions(&self, pop: &Population, n_actions: usize) -> Vec<bool> {
        let mut present = vec![false; n_actions];
        for (_, cl) in self.members(pop) {
            if let Some(p) = present.get_mut(cl.action) {
                *p = true;
            }
        }
        present
    }

    /// Set subsumption.
    ///
    /// The most general member able to subsume (ties broken by experience)
    /// absorbs every other member it is more general than. Returns the number
    /// of classifiers absorbed.
    pub fn subsume(&mut self, pop: &mut Population, params: &Params) -> usize {
        let mut subsumer: Option<(ClassifierId, &Classifier)> = None;
        for (id, cl) in self.members(pop) {
            if !cl.could_subsume(params) {
                continue;
            }
            let better = match subsumer {
                None => true,
                Some((_, best)) => {
                    cl.is_more_general(best)
                        && (!best.is_more_general(cl) || cl.experience > best.experience)
                }
            };
            if better {
                subsumer = Some((id, cl));
            }
        }
        let Some((subsumer, best)) = subsumer else {
            return 0;
        };

        let victims: Vec<ClassifierId> = self
            .members(pop)
            .filter(|(id, cl)| *id != subsumer && best.is_more_general(cl))
            .map(|(id, _)| id)
            .collect();
        let mut absorbed = 0;
        for victim in victims {
            if pop.absorb(subsumer, victim) {
                absorbed += 1;
            }
        }
        self.validate(pop);
        absorbed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::interval;

    fn experienced(mut cl: Classifier, experience: u64) -> Classifier {
        cl.experience = experience;
        cl.error = 0.0;
        cl
    }

    #[test]
    fn test_validate_drops_removed() {
        let mut pop = Population::new();
        let a = pop.insert(interval(0.5, 0.1, 0));
        let b = pop.insert(interval(0.5, 0.1, 0));
        let mut set = ClassifierSet::from_ids(vec![a, b]);
        pop.remove(a);
        assert_eq!(set.members(&pop).count(), 1);
        set.validate(&pop);
        assert_eq!(set.ids(), &[b]);
    }

    #[test]
    fn test_action_set_and_represented_actions() {
        let mut pop = Population::new();
        let ids = vec![
            pop.insert(interval(0.5, 0.1, 0)),
            pop.insert(interval(0.5, 0.1, 2)),
            pop.insert(interval(0.5, 0.1, 2)),
        ];
        let set = ClassifierSet::from_ids(ids.clone());
        assert_eq!(set.represented_actions(&pop, 3), vec![true, false, true]);
        assert_eq!(set.action_set(&pop, 2).ids(), &ids[1..]);
        assert!(set.action_set(&pop, 1).is_empty());
    }

    #[test]
    fn test_mean_time_stamp_is_numerosity_weighted() {
        let mut pop = Population::new();
        let mut a = interval(0.5, 0.1, 0);
        a.time_stamp = 10;
        a.numerosity = 3;
        let mut b = interval(0.5, 0.1, 0);
        b.time_stamp = 20;
        let set = ClassifierSet::from_ids(vec![pop.insert(a), pop.insert(b)]);
        assert!((set.mean_time_stamp(&pop) - 12.5).abs() < 1e-12);
        set.set_time_stamps(&mut pop, 30);
        assert!((set.mean_time_stamp(&pop) - 30.0).abs() < 1e-12);
        assert_eq!(ClassifierSet::new().mean_time_stamp(&pop), 0.0);
    }

    #[test]
    fn test_subsume_absorbs_specific_members() {
        let params = Params::default();
        let theta = params.subsumption.theta_sub;
        let mut pop = Population::new();
        let general = pop.insert(experienced(interval(0.5, 0.4, 0), theta + 1));
        let narrow = pop.insert(experienced(interval(0.5, 0.1, 0), theta + 5));
        let outside = pop.insert(experienced(interval(0.95, 0.1, 0), theta + 5));
        let mut set = ClassifierSet::from_ids(vec![narrow, general, outside]);
        let before = pop.numerosity();

        assert_eq!(set.subsume(&mut pop, &params), 1);
        assert_eq!(pop.numerosity(), before);
        assert_eq!(pop.get(general).map(Classifier::numerosity), Some(2));
        assert!(!pop.contains(narrow));
        assert_eq!(set.ids(), &[general, outside]);
    }

    #[test]
    fn test_subsume_requires_capable_subsumer() {
        let params = Params::default();
        let mut pop = Population::new();
        let general = pop.insert(interval(0.5, 0.4, 0));
        let narrow = pop.insert(interval(0.5, 0.1, 0));
        let mut set = ClassifierSet::from_ids(vec![general, narrow]);
        assert_eq!(set.subsume(&mut pop, &params), 0);
        assert_eq!(set.len(), 2);
    }
}
