//! Estimate session: the explicit Input -> Analyzing -> Result | Error
//! state machine, and the workspace a result screen renders from.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::aggregate::{recompute, Aggregates};
use crate::duration::DurationSummary;
use crate::error::{EstimateError, Result};
use crate::ingest::{Ingested, QuarantinedRole};
use crate::rates::{RateEntry, RateStore};
use crate::timeline::{anchor_for, Timeline};
use crate::types::{EstimateDocument, ValueRange};

// ---------------------------------------------------------------------------
// Workspace
// ---------------------------------------------------------------------------

/// An ingested estimate together with the rate store layered over it.
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    ingested: Ingested,
    rates: RateStore,
}

impl Workspace {
    pub fn new(ingested: Ingested) -> Self {
        let rates = RateStore::from_document(&ingested.document);
        Self { ingested, rates }
    }

    pub fn document(&self) -> &EstimateDocument {
        &self.ingested.document
    }

    pub fn quarantined(&self) -> &[QuarantinedRole] {
        &self.ingested.quarantined
    }

    pub fn rates(&self) -> &RateStore {
        &self.rates
    }

    pub fn set_rate(&mut self, role: &str, raw: &str) -> Result<RateEntry> {
        self.rates.set(role, raw)
    }

    pub fn revert_rate(&mut self, role: &str) {
        self.rates.revert(role)
    }

    pub fn aggregates(&self) -> Aggregates {
        recompute(self.document(), &self.rates)
    }

    /// Everything the result screen shows, derived fresh. `today` fixes the
    /// timeline anchor to the first of the following month.
    pub fn report(&self, today: NaiveDate) -> EstimateReport {
        let doc = self.document();
        let aggregates = self.aggregates();
        let duration =
            DurationSummary::compute(&doc.roadmap, doc.duration_weeks, aggregates.total_hours);
        let timeline = Timeline::build(anchor_for(today), duration.grid_weeks, &doc.roadmap);
        let rates = self
            .rates
            .iter()
            .map(|(_, slot)| RateView {
                role: slot.label.clone(),
                entry: slot.entry,
            })
            .collect();

        EstimateReport {
            project_name: doc.project_name.clone(),
            currency: doc.currency.clone(),
            advisory_cost: doc.total_cost,
            advisory_hours: doc.total_hours,
            aggregates,
            duration,
            timeline,
            rates,
            quarantined: self.quarantined().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateView {
    pub role: String,
    pub entry: RateEntry,
}

/// Derived view of a workspace. Never stored; rebuilt after every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateReport {
    pub project_name: String,
    pub currency: String,
    pub advisory_cost: ValueRange,
    pub advisory_hours: ValueRange,
    pub aggregates: Aggregates,
    pub duration: DurationSummary,
    pub timeline: Timeline,
    pub rates: Vec<RateView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub quarantined: Vec<QuarantinedRole>,
}

// ---------------------------------------------------------------------------
// Session state machine
// ---------------------------------------------------------------------------

/// Identifies one in-flight analysis. A completion carrying any other
/// ticket is stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Ticket(Uuid);

impl Ticket {
    fn new() -> Self {
        Ticket(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Input,
    Analyzing {
        ticket: Ticket,
        previous: Option<Box<Workspace>>,
    },
    Result(Box<Workspace>),
    Error {
        message: String,
        previous: Option<Box<Workspace>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Input,
    Analyzing,
    Result,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The ticket was superseded by a reset or a newer analysis.
    Stale,
}

#[derive(Debug)]
pub struct Session {
    state: SessionState,
    revision: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Input,
            revision: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Input => SessionStatus::Input,
            SessionState::Analyzing { .. } => SessionStatus::Analyzing,
            SessionState::Result(_) => SessionStatus::Result,
            SessionState::Error { .. } => SessionStatus::Error,
        }
    }

    /// Bumped on every observable change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// The workspace the result screen renders, if in the Result state.
    pub fn workspace(&self) -> Option<&Workspace> {
        match &self.state {
            SessionState::Result(ws) => Some(ws.as_ref()),
            _ => None,
        }
    }

    /// Last good workspace in any state, including one kept across a failed
    /// or in-flight refresh.
    pub fn last_workspace(&self) -> Option<&Workspace> {
        match &self.state {
            SessionState::Input => None,
            SessionState::Result(ws) => Some(ws.as_ref()),
            SessionState::Analyzing { previous, .. } | SessionState::Error { previous, .. } => {
                previous.as_deref()
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SessionState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Enter Analyzing. Only one analysis may be in flight.
    pub fn begin_analysis(&mut self) -> Result<Ticket> {
        let previous = match std::mem::replace(&mut self.state, SessionState::Input) {
            analyzing @ SessionState::Analyzing { .. } => {
                self.state = analyzing;
                return Err(EstimateError::AnalysisInProgress);
            }
            SessionState::Input => None,
            SessionState::Result(ws) => Some(ws),
            SessionState::Error { previous, .. } => previous,
        };
        let ticket = Ticket::new();
        self.state = SessionState::Analyzing { ticket, previous };
        self.bump();
        tracing::debug!(?ticket, "analysis started");
        Ok(ticket)
    }

    /// Deliver the outcome of the analysis identified by `ticket`.
    ///
    /// Success replaces the workspace (and its rate store) wholesale.
    /// Failure keeps the previous workspace untouched.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: std::result::Result<Ingested, String>,
    ) -> Completion {
        let previous = match std::mem::replace(&mut self.state, SessionState::Input) {
            SessionState::Analyzing {
                ticket: current,
                previous,
            } if current == ticket => previous,
            other => {
                self.state = other;
                tracing::info!(?ticket, "discarding stale analysis result");
                return Completion::Stale;
            }
        };

        self.state = match outcome {
            Ok(ingested) => SessionState::Result(Box::new(Workspace::new(ingested))),
            Err(message) => {
                tracing::warn!(%message, "analysis failed");
                SessionState::Error { message, previous }
            }
        };
        self.bump();
        Completion::Applied
    }

    /// Back to Input; any in-flight analysis becomes stale.
    pub fn reset(&mut self) {
        self.state = SessionState::Input;
        self.bump();
    }

    /// Leave the Error state, returning to the previous result if one exists.
    pub fn dismiss_error(&mut self) {
        if !matches!(self.state, SessionState::Error { .. }) {
            return;
        }
        if let SessionState::Error {
            previous: Some(ws), ..
        } = std::mem::replace(&mut self.state, SessionState::Input)
        {
            self.state = SessionState::Result(ws);
        }
        self.bump();
    }

    pub fn edit_rate(&mut self, role: &str, raw: &str) -> Result<RateEntry> {
        let entry = self.workspace_mut()?.set_rate(role, raw)?;
        self.bump();
        Ok(entry)
    }

    pub fn revert_rate(&mut self, role: &str) -> Result<()> {
        self.workspace_mut()?.revert_rate(role);
        self.bump();
        Ok(())
    }

    pub fn report(&self, today: NaiveDate) -> Option<EstimateReport> {
        self.workspace().map(|ws| ws.report(today))
    }

    fn workspace_mut(&mut self) -> Result<&mut Workspace> {
        match &mut self.state {
            SessionState::Result(ws) => Ok(ws.as_mut()),
            _ => Err(EstimateError::NoEstimate),
        }
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
