use std::{fmt, ops::ControlFlow};

use fdverify_core::Observer;
use ndarray::Array1;
use tracing::warn;

use crate::EvalPath;

/// The check that produced a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    ParameterDerivative,
    InputDerivative,
    JointDerivatives,
    BatchEval,
    DerivativeTable,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ParameterDerivative => "weighted parameter derivative",
            Self::InputDerivative => "weighted input derivative",
            Self::JointDerivatives => "joint weighted derivatives",
            Self::BatchEval => "batch evaluation",
            Self::DerivativeTable => "derivative table",
        };
        f.write_str(name)
    }
}

/// What a single comparison looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Parameter derivative isolated to one output coordinate.
    OutputColumn { output: usize },
    /// Weighted input derivative of a single point.
    InputGradient,
    /// Parameter derivative of a whole batch.
    ParameterVector,
    /// Input derivative of a whole batch.
    InputMatrix,
    /// One element of a batch evaluated along one path.
    BatchElement { index: usize, path: EvalPath },
    /// One entry of a derivative table.
    TableEntry { index: usize },
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputColumn { output } => write!(f, "output {output}"),
            Self::InputGradient => f.write_str("input gradient"),
            Self::ParameterVector => f.write_str("parameter vector"),
            Self::InputMatrix => f.write_str("input matrix"),
            Self::BatchElement { index, path } => write!(f, "element {index} ({path})"),
            Self::TableEntry { index } => write!(f, "entry {index}"),
        }
    }
}

/// A single error-versus-tolerance comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub check: Check,
    /// Trial index within a randomized run, `0` for single checks.
    pub trial: usize,
    pub location: Location,
    pub error: f64,
    pub tolerance: f64,
}

impl Comparison {
    /// Returns `true` if the error is within tolerance.
    ///
    /// A NaN error never passes.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error <= self.tolerance
    }
}

/// Inputs and results attached to a failed comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub point: Array1<f64>,
    pub coefficients: Array1<f64>,
    pub actual: Array1<f64>,
    pub expected: Array1<f64>,
}

/// A comparison that exceeded its tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub comparison: Comparison,
    pub diagnostic: Option<Diagnostic>,
}

/// Event emitted after every comparison.
#[derive(Debug, Clone, Copy)]
pub enum Event<'a> {
    Passed(&'a Comparison),
    Failed(&'a Failure),
}

impl Event<'_> {
    /// Returns the comparison behind the event.
    #[must_use]
    pub fn comparison(&self) -> &Comparison {
        match self {
            Self::Passed(comparison) => comparison,
            Self::Failed(failure) => &failure.comparison,
        }
    }
}

/// Actions an observer can take during a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the check and return the report gathered so far.
    StopEarly,
}

/// Indicates whether a check ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every planned comparison was made.
    Completed,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The outcome of a check that was not aborted by an [`Error`](crate::Error).
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub check: Check,
    pub status: Status,
    /// Number of comparisons made.
    pub comparisons: usize,
    /// Comparisons that exceeded their tolerance, in the order they were made.
    pub failures: Vec<Failure>,
}

impl Report {
    fn new(check: Check) -> Self {
        Self {
            check,
            status: Status::Completed,
            comparisons: 0,
            failures: Vec::new(),
        }
    }

    /// Returns `true` if no comparison failed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Returns the failure with the largest error, if any.
    ///
    /// Failures with a NaN error rank above all others.
    #[must_use]
    pub fn worst(&self) -> Option<&Failure> {
        self.failures.iter().max_by(|a, b| {
            let (a, b) = (a.comparison.error, b.comparison.error);
            match (a.is_nan(), b.is_nan()) {
                (true, true) => std::cmp::Ordering::Equal,
                (true, false) => std::cmp::Ordering::Greater,
                (false, true) => std::cmp::Ordering::Less,
                (false, false) => a.total_cmp(&b),
            }
        })
    }

    /// Appends another report's comparisons and failures to this one.
    ///
    /// The merged status is [`Status::StoppedByObserver`] if either was stopped.
    pub fn merge(&mut self, other: Report) {
        self.comparisons += other.comparisons;
        self.failures.extend(other.failures);
        if other.status == Status::StoppedByObserver {
            self.status = Status::StoppedByObserver;
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} comparisons failed",
            self.check,
            self.failures.len(),
            self.comparisons
        )?;
        if let Some(worst) = self.worst() {
            let c = &worst.comparison;
            write!(
                f,
                " (worst: trial {}, {}, error {:e} > {:e})",
                c.trial, c.location, c.error, c.tolerance
            )?;
        }
        if self.status == Status::StoppedByObserver {
            f.write_str(", stopped early")?;
        }
        Ok(())
    }
}

/// Collects comparisons into a [`Report`] and forwards them to an observer.
pub(crate) struct Recorder<'o, Obs> {
    report: Report,
    observer: &'o mut Obs,
    trial: usize,
}

impl<'o, Obs> Recorder<'o, Obs>
where
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    pub(crate) fn new(check: Check, observer: &'o mut Obs) -> Self {
        Self {
            report: Report::new(check),
            observer,
            trial: 0,
        }
    }

    pub(crate) fn set_trial(&mut self, trial: usize) {
        self.trial = trial;
    }

    /// Records one comparison.
    ///
    /// `diagnostic` is only called if the comparison fails.
    pub(crate) fn record(
        &mut self,
        location: Location,
        error: f64,
        tolerance: f64,
        diagnostic: impl FnOnce() -> Option<Diagnostic>,
    ) -> ControlFlow<()> {
        let comparison = Comparison {
            check: self.report.check,
            trial: self.trial,
            location,
            error,
            tolerance,
        };
        self.report.comparisons += 1;

        let action = if comparison.passed() {
            self.observer.observe(&Event::Passed(&comparison))
        } else {
            let diagnostic = diagnostic();
            match &diagnostic {
                Some(d) => warn!(
                    check = %comparison.check,
                    trial = comparison.trial,
                    %location,
                    error,
                    tolerance,
                    point = %d.point,
                    coefficients = %d.coefficients,
                    actual = %d.actual,
                    expected = %d.expected,
                    "comparison exceeded tolerance"
                ),
                None => warn!(
                    check = %comparison.check,
                    trial = comparison.trial,
                    %location,
                    error,
                    tolerance,
                    "comparison exceeded tolerance"
                ),
            }
            self.report.failures.push(Failure {
                comparison,
                diagnostic,
            });
            let failure = &self.report.failures[self.report.failures.len() - 1];
            self.observer.observe(&Event::Failed(failure))
        };

        match action {
            Some(Action::StopEarly) => ControlFlow::Break(()),
            None => ControlFlow::Continue(()),
        }
    }

    /// Consumes the recorder, marking the report as stopped if `flow` broke.
    pub(crate) fn finish(self, flow: ControlFlow<()>) -> Report {
        let mut report = self.report;
        if flow.is_break() {
            report.status = Status::StoppedByObserver;
        }
        report
    }
}
