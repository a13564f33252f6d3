//! Statistical helpers for the learning classifier system workspace.
//!
//! This crate provides the small amount of statistics the engine and the CLI
//! need to report on a running system:
//!
//! - **Descriptive statistics**: min, max, mean, median and spread of a dataset
//!   (used to summarise fitness, error and experience across a population)
//! - **Running means**: Widrow-Hoff style exponential averages (system error,
//!   mean match-set size) and fixed-window totals (periodic performance reports)
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`running`]: Incrementally updated averages
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use lcs_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Tracking a running average
//!
//! ```
//! use lcs_stats::running::RunningMean;
//!
//! let mut error = RunningMean::new(0.5);
//! error.push(1.0);
//! error.push(1.0);
//! assert_eq!(error.value(), 0.75);
//! ```

pub mod descriptive;
pub mod running;
