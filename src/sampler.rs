use crate::dataset::Category;
use crate::error::{StudyError, StudyResult};
use rand::seq::{index, IndexedRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The items chosen for one presentation round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialPlan {
    pub category: String,
    pub reference: PathBuf,
    pub candidates: Vec<PathBuf>,
}

/// Draws `k` distinct items from `pool`, uniformly without replacement.
pub fn sample<T: Clone, R: Rng + ?Sized>(pool: &[T], k: usize, rng: &mut R) -> StudyResult<Vec<T>> {
    if pool.len() < k {
        return Err(StudyError::InsufficientPool {
            requested: k,
            available: pool.len(),
        });
    }

    Ok(index::sample(rng, pool.len(), k)
        .into_iter()
        .map(|i| pool[i].clone())
        .collect())
}

/// Picks one category uniformly
pub fn choose_category<'a, R: Rng + ?Sized>(
    categories: &'a [Category],
    rng: &mut R,
) -> StudyResult<&'a Category> {
    categories.choose(rng).ok_or(StudyError::InsufficientPool {
        requested: 1,
        available: 0,
    })
}

/// Picks a random category, then `k` candidates from its pool
pub fn draw_trial<R: Rng + ?Sized>(
    categories: &[Category],
    k: usize,
    rng: &mut R,
) -> StudyResult<TrialPlan> {
    let category = choose_category(categories, rng)?;
    let candidates = sample(&category.pool, k, rng)?;

    Ok(TrialPlan {
        category: category.name.clone(),
        reference: category.reference.clone(),
        candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn category(name: &str, size: usize) -> Category {
        Category {
            name: name.to_string(),
            reference: PathBuf::from(format!("{}/groundtruth.png", name)),
            pool: (0..size)
                .map(|i| PathBuf::from(format!("{}/{},35,600.png", name, i)))
                .collect(),
        }
    }

    #[test]
    fn test_sample_returns_distinct_members() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool: Vec<u32> = (0..20).collect();

        for k in 0..=pool.len() {
            let picked = sample(&pool, k, &mut rng).unwrap();
            assert_eq!(picked.len(), k);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), k);
            assert!(picked.iter().all(|p| pool.contains(p)));
        }
    }

    #[test]
    fn test_sample_fails_on_small_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = sample(&["a", "b", "c"], 4, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            StudyError::InsufficientPool {
                requested: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn test_sample_is_reproducible_with_seed() {
        let pool: Vec<u32> = (0..50).collect();
        let a = sample(&pool, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = sample(&pool, 5, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_draw_trial_uses_category_reference() {
        let mut rng = StdRng::seed_from_u64(3);
        let categories = vec![category("bigben", 6), category("einstein", 6)];

        let plan = draw_trial(&categories, 2, &mut rng).unwrap();
        assert_eq!(plan.candidates.len(), 2);
        assert!(plan.reference.starts_with(&plan.category));
        assert!(plan
            .candidates
            .iter()
            .all(|c| c.starts_with(&plan.category)));
    }

    #[test]
    fn test_draw_trial_without_categories() {
        let mut rng = StdRng::seed_from_u64(3);
        let err = draw_trial(&[], 2, &mut rng).unwrap_err();
        assert!(matches!(err, StudyError::InsufficientPool { available: 0, .. }));
    }

    #[test]
    fn test_every_category_gets_picked() {
        let mut rng = StdRng::seed_from_u64(11);
        let categories = vec![category("a", 2), category("b", 2), category("c", 2)];
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(choose_category(&categories, &mut rng).unwrap().name.clone());
        }
        assert_eq!(seen.len(), 3);
    }
}
