//! Composite builder - horizontal concatenation of several builders

use chrono::NaiveDateTime;
use ndarray::{concatenate, Axis};

use crate::logic::error::{AnalysisError, Result};
use super::builder::{FeatureBuilder, FeatureMatrix};

/// Concatenates the outputs of its inner builders column-wise, in order.
///
/// Values and timestamps are forwarded unchanged to every inner builder.
#[derive(Debug)]
pub struct Composite {
    builders: Vec<Box<dyn FeatureBuilder>>,
    dimensions: usize,
}

impl Composite {
    /// Fails with `EmptyComposite` when `builders` is empty
    pub fn new(builders: Vec<Box<dyn FeatureBuilder>>) -> Result<Self> {
        if builders.is_empty() {
            return Err(AnalysisError::EmptyComposite);
        }
        let dimensions = builders.iter().map(|b| b.dimensions()).sum();
        Ok(Self { builders, dimensions })
    }

    pub fn builders(&self) -> &[Box<dyn FeatureBuilder>] {
        &self.builders
    }

    /// Column names, one per output column
    pub fn column_names(&self) -> Vec<String> {
        self.builders
            .iter()
            .flat_map(|b| {
                let d = b.dimensions();
                (0..d).map(move |i| {
                    if d == 1 {
                        b.name().to_string()
                    } else {
                        format!("{}[{}]", b.name(), i)
                    }
                })
            })
            .collect()
    }
}

impl FeatureBuilder for Composite {
    fn name(&self) -> &str {
        "composite"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn compute(&self, values: &[f64], timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix> {
        let parts = self
            .builders
            .iter()
            .map(|b| b.build(values, timestamps))
            .collect::<Result<Vec<_>>>()?;

        let views: Vec<_> = parts.iter().map(|m| m.view()).collect();
        concatenate(Axis(1), &views).map_err(|_| AnalysisError::InvalidFeatureShape {
            builder: self.name().to_string(),
            expected_rows: values.len(),
            expected_cols: self.dimensions,
            rows: parts.iter().map(|m| m.nrows()).max().unwrap_or(0),
            cols: parts.iter().map(|m| m.ncols()).sum(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use parking_lot::Mutex;

    use crate::logic::features::builder::column;
    use crate::logic::features::{Diff, RawWorkTime};

    /// Records the timestamps it receives
    #[derive(Debug, Default)]
    struct Probe {
        seen: Mutex<Vec<Option<Vec<NaiveDateTime>>>>,
    }

    impl FeatureBuilder for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn dimensions(&self) -> usize {
            1
        }

        fn compute(&self, values: &[f64], timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix> {
            self.seen.lock().push(timestamps.map(|t| t.to_vec()));
            Ok(column(values.to_vec()))
        }
    }

    #[test]
    fn test_hstack_two_builders() {
        let composite = Composite::new(vec![Box::new(RawWorkTime), Box::new(RawWorkTime)]).unwrap();
        let m = composite.build(&[10.0, 20.0, 30.0], None).unwrap();
        assert_eq!(m.dim(), (3, 2));
        assert_eq!(m.column(0).to_vec(), vec![10.0, 20.0, 30.0]);
        assert_eq!(m.column(1).to_vec(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_column_order_follows_builder_order() {
        let composite = Composite::new(vec![Box::new(Diff), Box::new(RawWorkTime)]).unwrap();
        let m = composite.build(&[10.0, 20.0, 35.0], None).unwrap();
        assert_eq!(m.column(0).to_vec(), vec![0.0, 10.0, 15.0]);
        assert_eq!(m.column(1).to_vec(), vec![10.0, 20.0, 35.0]);
        assert_eq!(composite.column_names(), vec!["diff", "raw_work_time"]);
    }

    #[test]
    fn test_empty_builders_rejected() {
        assert!(matches!(Composite::new(Vec::new()), Err(AnalysisError::EmptyComposite)));
    }

    #[test]
    fn test_empty_input_shape() {
        let composite = Composite::new(vec![Box::new(RawWorkTime), Box::new(Diff)]).unwrap();
        assert_eq!(composite.build(&[], None).unwrap().dim(), (0, 2));
    }

    #[test]
    fn test_single_builder() {
        let composite = Composite::new(vec![Box::new(RawWorkTime)]).unwrap();
        assert_eq!(composite.build(&[10.0, 20.0], None).unwrap().dim(), (2, 1));
    }

    #[test]
    fn test_timestamps_forwarded_to_inner_builders() {
        let ts = vec![
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        ];
        let probe = std::sync::Arc::new(Probe::default());

        #[derive(Debug)]
        struct Shared(std::sync::Arc<Probe>);

        impl FeatureBuilder for Shared {
            fn name(&self) -> &str {
                self.0.name()
            }

            fn dimensions(&self) -> usize {
                self.0.dimensions()
            }

            fn compute(&self, values: &[f64], timestamps: Option<&[NaiveDateTime]>) -> Result<FeatureMatrix> {
                self.0.compute(values, timestamps)
            }
        }

        let composite = Composite::new(vec![Box::new(Shared(probe.clone()))]).unwrap();
        composite.build(&[10.0, 20.0], Some(&ts)).unwrap();

        let seen = probe.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].as_deref(), Some(ts.as_slice()));
    }
}
