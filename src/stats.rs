//! Selectivity estimation over integer columns.

/// Comparison predicate a selectivity estimate is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Fixed-width equi-width histogram over a known `[min, max]` value range.
///
/// Within a bucket values are assumed uniformly distributed, so a point
/// predicate costs `height / width / ntups` and a range predicate sums the
/// fraction of the boundary bucket plus every bucket fully on one side.
#[derive(Debug)]
pub struct IntHistogram {
    min: i32,
    width: i32,
    max: i32,
    buckets: Vec<u64>,
    ntups: u64,
}

impl IntHistogram {
    pub fn new(num_buckets: usize, min: i32, max: i32) -> Self {
        debug_assert!(num_buckets > 0 && min <= max);
        let width = (max - min) / num_buckets as i32 + 1;
        Self {
            min,
            max,
            width,
            buckets: vec![0; num_buckets],
            ntups: 0,
        }
    }

    fn bucket_of(&self, value: i32) -> usize {
        ((value - self.min) / self.width) as usize
    }

    /// Records one value; it must lie within `[min, max]`.
    pub fn add_value(&mut self, value: i32) {
        debug_assert!(value >= self.min && value <= self.max);
        let bucket = self.bucket_of(value);
        self.buckets[bucket] += 1;
        self.ntups += 1;
    }

    /// Estimated fraction of recorded values satisfying `pred value`.
    pub fn estimate_selectivity(&self, pred: Predicate, value: i32) -> f64 {
        if self.ntups == 0 {
            return 0.0;
        }
        match pred {
            Predicate::Eq => self.equal_selectivity(value),
            Predicate::Ne => 1.0 - self.equal_selectivity(value),
            Predicate::Gt => self.greater_selectivity(value),
            Predicate::Ge => self.greater_selectivity(value) + self.equal_selectivity(value),
            Predicate::Le => 1.0 - self.greater_selectivity(value),
            Predicate::Lt => {
                1.0 - self.greater_selectivity(value) - self.equal_selectivity(value)
            }
        }
    }

    fn equal_selectivity(&self, value: i32) -> f64 {
        if value < self.min || value > self.max {
            return 0.0;
        }
        let height = self.buckets[self.bucket_of(value)] as f64;
        height / self.width as f64 / self.ntups as f64
    }

    fn greater_selectivity(&self, value: i32) -> f64 {
        if value < self.min {
            return 1.0;
        }
        if value >= self.max {
            return 0.0;
        }
        let b = self.bucket_of(value);
        // Fraction of the boundary bucket strictly to the right of `value`.
        let right_edge = self.min + (b as i32 + 1) * self.width - 1;
        let height = self.buckets[b] as f64;
        let partial = (right_edge - value) as f64 / self.width as f64 * height;
        let rest: u64 = self.buckets[b + 1..].iter().sum();
        (partial + rest as f64) / self.ntups as f64
    }
}
