//! Seeded train/test and k-fold partitioning
//!
//! Every split is driven by an explicit seed threaded through the call, so
//! independent runs are individually reproducible with no process-wide
//! random state.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FloranetError, Result};

/// K-fold partitioning strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CvStrategy {
    /// Plain k-fold over shuffled (or sequential) indices
    KFold { n_splits: usize, shuffle: bool },
    /// K-fold keeping fold class proportions close to the overall
    /// label distribution
    StratifiedKFold { n_splits: usize, shuffle: bool },
}

impl Default for CvStrategy {
    fn default() -> Self {
        CvStrategy::KFold {
            n_splits: 5,
            shuffle: true,
        }
    }
}

impl CvStrategy {
    pub fn n_splits(&self) -> usize {
        match self {
            CvStrategy::KFold { n_splits, .. } => *n_splits,
            CvStrategy::StratifiedKFold { n_splits, .. } => *n_splits,
        }
    }
}

/// A single fold: held-out evaluation indices and the complementary
/// training indices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// A single train/test partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldoutSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Deterministically sample `floor(train_fraction * n)` training indices
/// without replacement; the remaining indices form the test set.
pub fn train_test_split(n: usize, train_fraction: f64, seed: u64) -> Result<HoldoutSplit> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(FloranetError::InvalidParameter {
            name: "train_fraction".to_string(),
            value: train_fraction.to_string(),
            reason: "must lie in (0, 1)".to_string(),
        });
    }

    let train_size = (train_fraction * n as f64).floor() as usize;
    if train_size == 0 || train_size == n {
        return Err(FloranetError::InvalidParameter {
            name: "train_fraction".to_string(),
            value: train_fraction.to_string(),
            reason: format!("leaves an empty partition for {} rows", n),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices.split_off(train_size);
    Ok(HoldoutSplit {
        train_indices: indices,
        test_indices,
    })
}

/// K-fold splitter
pub struct Splitter {
    strategy: CvStrategy,
    random_state: Option<u64>,
}

impl Splitter {
    pub fn new(strategy: CvStrategy) -> Self {
        Self {
            strategy,
            random_state: None,
        }
    }

    /// Set the seed for reproducible fold assignment
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Partition `n_samples` row indices into folds. Stratified splitting
    /// needs the per-row class indices produced at encoding time.
    pub fn split(&self, n_samples: usize, class_indices: Option<&[usize]>) -> Result<Vec<CvSplit>> {
        match &self.strategy {
            CvStrategy::KFold { n_splits, shuffle } => {
                self.k_fold(n_samples, *n_splits, *shuffle)
            }
            CvStrategy::StratifiedKFold { n_splits, shuffle } => {
                let classes = class_indices.ok_or_else(|| {
                    FloranetError::Data("stratified split needs per-row class indices".to_string())
                })?;
                if classes.len() != n_samples {
                    return Err(FloranetError::ShapeMismatch {
                        expected: format!("{} class indices", n_samples),
                        actual: format!("{} class indices", classes.len()),
                    });
                }
                self.stratified_k_fold(n_samples, classes, *n_splits, *shuffle)
            }
        }
    }

    fn check_fold_count(&self, n_samples: usize, n_splits: usize) -> Result<()> {
        if n_splits < 2 || n_splits > n_samples {
            return Err(FloranetError::InvalidFoldCount {
                k: n_splits,
                n: n_samples,
            });
        }
        Ok(())
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    fn k_fold(&self, n_samples: usize, n_splits: usize, shuffle: bool) -> Result<Vec<CvSplit>> {
        self.check_fold_count(n_samples, n_splits)?;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        if shuffle {
            indices.shuffle(&mut self.rng());
        }

        // earlier folds absorb the remainder
        let fold_sizes: Vec<usize> = (0..n_splits)
            .map(|i| {
                let base = n_samples / n_splits;
                if i < n_samples % n_splits {
                    base + 1
                } else {
                    base
                }
            })
            .collect();

        let mut splits = Vec::with_capacity(n_splits);
        let mut current = 0;

        for (fold_idx, &fold_size) in fold_sizes.iter().enumerate() {
            let test_indices: Vec<usize> = indices[current..current + fold_size].to_vec();
            let train_indices: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + fold_size..].iter())
                .copied()
                .collect();

            splits.push(CvSplit {
                train_indices,
                test_indices,
                fold_idx,
            });

            current += fold_size;
        }

        Ok(splits)
    }

    fn stratified_k_fold(
        &self,
        n_samples: usize,
        class_indices: &[usize],
        n_splits: usize,
        shuffle: bool,
    ) -> Result<Vec<CvSplit>> {
        self.check_fold_count(n_samples, n_splits)?;

        // group rows by class, preserving row order within each class
        let mut by_class: HashMap<usize, Vec<usize>> = HashMap::new();
        for (row, &class) in class_indices.iter().enumerate() {
            by_class.entry(class).or_default().push(row);
        }

        let mut rng = self.rng();
        // iterate classes in a fixed order so the assignment is reproducible
        let mut classes: Vec<usize> = by_class.keys().copied().collect();
        classes.sort_unstable();

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
        for class in classes {
            let rows = by_class.get_mut(&class).expect("class key present");
            if shuffle {
                rows.shuffle(&mut rng);
            }
            for (i, &row) in rows.iter().enumerate() {
                folds[i % n_splits].push(row);
            }
        }

        let splits = (0..n_splits)
            .map(|fold_idx| {
                let test_indices = folds[fold_idx].clone();
                let train_indices: Vec<usize> = folds
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != fold_idx)
                    .flat_map(|(_, f)| f.iter().copied())
                    .collect();
                CvSplit {
                    train_indices,
                    test_indices,
                    fold_idx,
                }
            })
            .collect();

        Ok(splits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_test_split_partitions() {
        let split = train_test_split(20, 0.75, 42).unwrap();

        assert_eq!(split.train_indices.len(), 15);
        assert_eq!(split.test_indices.len(), 5);

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_train_test_split_is_seeded() {
        let a = train_test_split(50, 0.6, 9).unwrap();
        let b = train_test_split(50, 0.6, 9).unwrap();
        let c = train_test_split(50, 0.6, 10).unwrap();

        assert_eq!(a.train_indices, b.train_indices);
        assert_ne!(a.train_indices, c.train_indices);
    }

    #[test]
    fn test_train_test_split_rejects_bad_fraction() {
        assert!(train_test_split(10, 0.0, 1).is_err());
        assert!(train_test_split(10, 1.0, 1).is_err());
        assert!(train_test_split(10, 1.5, 1).is_err());
        // fraction valid but a partition would be empty
        assert!(train_test_split(2, 0.1, 1).is_err());
    }

    #[test]
    fn test_k_fold_covers_every_index_once() {
        let splitter = Splitter::new(CvStrategy::KFold {
            n_splits: 5,
            shuffle: false,
        });
        let splits = splitter.split(103, None).unwrap();

        assert_eq!(splits.len(), 5);
        let sizes: Vec<usize> = splits.iter().map(|s| s.test_indices.len()).collect();
        assert_eq!(sizes.iter().sum::<usize>(), 103);
        // remainder spread over the earliest folds
        assert_eq!(sizes, vec![21, 21, 21, 20, 20]);

        let mut all_test: Vec<usize> = splits
            .iter()
            .flat_map(|s| s.test_indices.iter().copied())
            .collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..103).collect::<Vec<_>>());

        for split in &splits {
            assert_eq!(split.train_indices.len() + split.test_indices.len(), 103);
            for idx in &split.test_indices {
                assert!(!split.train_indices.contains(idx));
            }
        }
    }

    #[test]
    fn test_k_fold_is_seeded() {
        let make = |seed| {
            Splitter::new(CvStrategy::KFold {
                n_splits: 2,
                shuffle: true,
            })
            .with_random_state(seed)
            .split(10, None)
            .unwrap()
        };

        let a = make(3);
        let b = make(3);
        let c = make(4);

        for (fa, fb) in a.iter().zip(b.iter()) {
            assert_eq!(fa.test_indices, fb.test_indices);
        }
        assert!(a
            .iter()
            .zip(c.iter())
            .any(|(fa, fc)| fa.test_indices != fc.test_indices));
    }

    #[test]
    fn test_invalid_fold_counts() {
        let splitter = Splitter::new(CvStrategy::KFold {
            n_splits: 1,
            shuffle: false,
        });
        assert!(matches!(
            splitter.split(10, None),
            Err(FloranetError::InvalidFoldCount { k: 1, n: 10 })
        ));

        let splitter = Splitter::new(CvStrategy::KFold {
            n_splits: 11,
            shuffle: false,
        });
        assert!(matches!(
            splitter.split(10, None),
            Err(FloranetError::InvalidFoldCount { k: 11, n: 10 })
        ));
    }

    #[test]
    fn test_stratified_folds_balance_classes() {
        // 6 rows of class 0, 6 rows of class 1
        let classes: Vec<usize> = (0..12).map(|i| i % 2).collect();
        let splitter = Splitter::new(CvStrategy::StratifiedKFold {
            n_splits: 3,
            shuffle: false,
        });

        let splits = splitter.split(12, Some(&classes)).unwrap();
        assert_eq!(splits.len(), 3);

        for split in &splits {
            assert_eq!(split.test_indices.len(), 4);
            let class_one = split
                .test_indices
                .iter()
                .filter(|&&i| classes[i] == 1)
                .count();
            assert_eq!(class_one, 2);
        }
    }

    #[test]
    fn test_stratified_requires_class_indices() {
        let splitter = Splitter::new(CvStrategy::StratifiedKFold {
            n_splits: 2,
            shuffle: false,
        });
        assert!(splitter.split(10, None).is_err());
    }
}
