//! Hash-based aggregation operator.

use crate::access::schema::TupleDesc;
use crate::access::tuple::Tuple;
use crate::access::value::{DataType, Value};
use crate::executor::Executor;
use crate::storage::error::{StorageError, StorageResult};
use std::collections::{HashMap, VecDeque};

/// Aggregate operations. Over an `Int` field all five are available;
/// over a `Varchar` field only `Count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

#[derive(Debug, Default)]
struct Accumulator {
    min: Option<i32>,
    max: Option<i32>,
    sum: i64,
    count: i64,
}

impl Accumulator {
    fn merge(&mut self, value: &Value) {
        self.count += 1;
        if let Value::Int(v) = value {
            self.min = Some(self.min.map_or(*v, |m| m.min(*v)));
            self.max = Some(self.max.map_or(*v, |m| m.max(*v)));
            self.sum += *v as i64;
        }
    }

    fn result(&self, op: AggregateOp) -> i32 {
        match op {
            AggregateOp::Min => self.min.unwrap_or(0),
            AggregateOp::Max => self.max.unwrap_or(0),
            AggregateOp::Sum => self.sum as i32,
            AggregateOp::Avg => (self.sum / self.count.max(1)) as i32,
            AggregateOp::Count => self.count as i32,
        }
    }
}

/// Computes one aggregate over the child's stream, optionally grouped by
/// one field. Output tuples are `(aggregate)` without grouping and
/// `(group value, aggregate)` with it.
pub struct AggregateExecutor {
    child: Box<dyn Executor>,
    group_by: Option<usize>,
    agg_field: usize,
    op: AggregateOp,
    schema: TupleDesc,
    results: Option<VecDeque<Tuple>>,
}

impl AggregateExecutor {
    pub fn new(
        child: Box<dyn Executor>,
        group_by: Option<usize>,
        agg_field: usize,
        op: AggregateOp,
    ) -> StorageResult<Self> {
        let child_schema = child.schema();
        if child_schema.field_type(agg_field) == DataType::Varchar && op != AggregateOp::Count {
            return Err(StorageError::SchemaMismatch(format!(
                "{:?} is not defined over a string field",
                op
            )));
        }
        let schema = match group_by {
            Some(field) => {
                TupleDesc::from_types(&[child_schema.field_type(field), DataType::Int])
            }
            None => TupleDesc::from_types(&[DataType::Int]),
        };
        Ok(Self {
            child,
            group_by,
            agg_field,
            op,
            schema,
            results: None,
        })
    }

    /// Drains the child and materializes one output tuple per group.
    fn compute(&mut self) -> StorageResult<VecDeque<Tuple>> {
        let mut groups: HashMap<Option<Value>, Accumulator> = HashMap::new();
        while let Some(tuple) = self.child.next()? {
            let key = self.group_by.map(|field| tuple.value(field).clone());
            groups
                .entry(key)
                .or_default()
                .merge(tuple.value(self.agg_field));
        }

        let mut results = VecDeque::new();
        for (key, acc) in groups {
            let agg = Value::Int(acc.result(self.op));
            let values = match key {
                Some(group) => vec![group, agg],
                None => vec![agg],
            };
            results.push_back(Tuple::new(self.schema.clone(), values)?);
        }
        Ok(results)
    }
}

impl Executor for AggregateExecutor {
    fn open(&mut self) -> StorageResult<()> {
        self.child.open()?;
        let results = self.compute()?;
        self.results = Some(results);
        Ok(())
    }

    fn next(&mut self) -> StorageResult<Option<Tuple>> {
        match self.results.as_mut() {
            Some(results) => Ok(results.pop_front()),
            None => Err(StorageError::NoSuchElement),
        }
    }

    fn rewind(&mut self) -> StorageResult<()> {
        self.child.rewind()?;
        let results = self.compute()?;
        self.results = Some(results);
        Ok(())
    }

    fn close(&mut self) {
        self.results = None;
        self.child.close();
    }

    fn schema(&self) -> &TupleDesc {
        &self.schema
    }
}
