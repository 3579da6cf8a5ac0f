use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::extract::candidate::{ActionCandidate, ActionKind};
use crate::extract::extractor::extract;
use crate::safety::filter::{FilterOutcome, SafetyFilter};
use crate::session::config::SessionConfig;
use crate::session::error::SessionError;
use crate::session::session::AutomationSession;
use crate::snapshot::matcher::{MatchedAction, match_all};
use crate::snapshot::snapshot_model::StructuralSnapshot;
use crate::trace::{logger::TraceLogger, trace::TraceEvent};
use crate::validate::report::{ValidationOutcome, ValidationReport};

/// The two interactions validation issues against a live page.
#[async_trait]
pub trait ActionSession: Send + Sync {
    async fn click(&self, element_ref: &str) -> Result<Value, SessionError>;
    async fn fill(&self, element_ref: &str, value: &str) -> Result<Value, SessionError>;
}

/// Where the structural snapshot for a launched validation comes from.
#[derive(Debug, Clone)]
pub enum SnapshotSource {
    /// Use a snapshot captured earlier by the caller.
    Provided(StructuralSnapshot),
    /// Ask the server for the page it currently shows.
    Current,
    /// Navigate first, then ask for a snapshot.
    Navigate(String),
}

/// Candidates that survived extraction and filtering, before any page is involved.
#[derive(Debug, Clone, Default)]
pub struct ValidationPlan {
    pub candidates_found: usize,
    pub filtered: FilterOutcome,
}

impl ValidationPlan {
    pub fn has_work(&self) -> bool {
        !self.filtered.accepted.is_empty()
    }

    fn into_report(self, outcomes: Vec<ValidationOutcome>, unmatched: Vec<ActionCandidate>) -> ValidationReport {
        ValidationReport::from_outcomes(outcomes)
            .with_candidates_found(self.candidates_found)
            .with_rejections(self.filtered.rejected)
            .with_warnings(self.filtered.warnings)
            .with_unmatched(unmatched)
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Runs advisory text through extraction, safety filtering, matching and
/// execution, and folds the results into a [`ValidationReport`].
///
/// Actions are issued strictly one after another in ranked order.
pub struct Validator {
    filter: SafetyFilter,
    tracer: Option<TraceLogger>,
    cancel: Option<CancellationToken>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(SafetyFilter::default())
    }
}

impl Validator {
    pub fn new(filter: SafetyFilter) -> Self {
        Self {
            filter,
            tracer: None,
            cancel: None,
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Cancelling `token` stops a launched pass: the in-flight call returns
    /// `Cancelled`, later actions are not issued, and the session is closed.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    fn finish(&self, report: ValidationReport) -> ValidationReport {
        self.trace(TraceEvent::summary(&report));
        report
    }

    fn trace(&self, event: TraceEvent) {
        if let Some(tracer) = &self.tracer {
            tracer.log(&event);
        }
    }

    /// Extract and filter without touching any page.
    pub fn plan(&self, advice: &str) -> ValidationPlan {
        let candidates = extract(advice);
        for candidate in &candidates {
            self.trace(TraceEvent::extracted(candidate));
        }

        let filtered = self.filter.filter(&candidates);
        for rejection in &filtered.rejected {
            self.trace(TraceEvent::rejected(rejection));
        }
        for warning in &filtered.warnings {
            warn!("{}", warning);
        }

        debug!(
            found = candidates.len(),
            accepted = filtered.accepted.len(),
            rejected = filtered.rejected.len(),
            "validation plan ready"
        );

        ValidationPlan {
            candidates_found: candidates.len(),
            filtered,
        }
    }

    /// Validate advisory text against a snapshot through an already running session.
    pub async fn validate(
        &self,
        advice: &str,
        snapshot: &StructuralSnapshot,
        session: &dyn ActionSession,
    ) -> ValidationReport {
        let plan = self.plan(advice);
        self.run_plan(plan, snapshot, session).await
    }

    pub async fn run_plan(
        &self,
        plan: ValidationPlan,
        snapshot: &StructuralSnapshot,
        session: &dyn ActionSession,
    ) -> ValidationReport {
        if !plan.has_work() {
            info!("no actionable candidates in advisory text");
            return self.finish(plan.into_report(vec![], vec![]));
        }

        let (matched, unmatched) = match_all(&plan.filtered.accepted, snapshot);
        for candidate in &unmatched {
            self.trace(TraceEvent::unmatched(candidate));
        }

        let mut outcomes = Vec::with_capacity(matched.len());
        for action in matched {
            let outcome = if self.is_cancelled() {
                ValidationOutcome::failure(action, SessionError::Cancelled)
            } else {
                execute(action, session).await
            };
            self.trace(TraceEvent::outcome(&outcome));
            outcomes.push(outcome);
        }

        let report = plan.into_report(outcomes, unmatched);
        info!(
            total = report.total_actions,
            successful = report.successful_actions,
            "validation complete"
        );
        self.finish(report)
    }

    /// Launch a session, validate, and always release the session.
    ///
    /// A session that cannot be created yields an empty report carrying the
    /// failure as `skipped_reason`; it never surfaces as an error.
    pub async fn validate_with_launch(
        &self,
        advice: &str,
        source: SnapshotSource,
        config: SessionConfig,
    ) -> ValidationReport {
        let plan = self.plan(advice);
        if !plan.has_work() {
            info!("nothing to validate, not launching automation server");
            return self.finish(plan.into_report(vec![], vec![]));
        }
        if self.is_cancelled() {
            warn!("validation cancelled before launch");
            self.trace(TraceEvent::skipped(SessionError::Cancelled));
            return self.finish(plan.into_report(vec![], vec![]).with_skipped(SessionError::Cancelled));
        }

        let mut session = AutomationSession::new(config);
        if let Some(token) = &self.cancel {
            session = session.with_cancellation(token.clone());
        }
        if let Err(e) = session.start().await {
            warn!("action validation skipped: {}", e);
            self.trace(TraceEvent::skipped(&e));
            session.close().await;
            return self.finish(plan.into_report(vec![], vec![]).with_skipped(e));
        }

        let snapshot = match resolve_snapshot(&session, source).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("could not obtain page snapshot: {}", e);
                self.trace(TraceEvent::skipped(&e));
                session.close().await;
                return self.finish(plan.into_report(vec![], vec![]).with_skipped(e));
            }
        };

        let report = self.run_plan(plan, &snapshot, &session).await;
        session.close().await;
        report
    }
}

async fn resolve_snapshot(
    session: &AutomationSession,
    source: SnapshotSource,
) -> Result<StructuralSnapshot, SessionError> {
    match source {
        SnapshotSource::Provided(snapshot) => Ok(snapshot),
        SnapshotSource::Current => session.snapshot().await,
        SnapshotSource::Navigate(url) => {
            session.navigate(&url).await?;
            session.snapshot().await
        }
    }
}

/// Issue one matched action and record its result.
pub async fn execute(action: MatchedAction, session: &dyn ActionSession) -> ValidationOutcome {
    let result = match action.candidate.kind {
        ActionKind::Click => session.click(&action.element_ref).await,
        ActionKind::Fill => {
            let Some(value) = action.candidate.value_hint.clone() else {
                return ValidationOutcome::failure(action, "fill action has no value");
            };
            session.fill(&action.element_ref, &value).await
        }
        ActionKind::WaitFor => {
            return ValidationOutcome::failure(action, "unsupported action kind: waitFor");
        }
    };

    match result {
        Ok(value) => {
            debug!(action = %action.candidate.describe(), "action succeeded");
            ValidationOutcome::success(action, value)
        }
        Err(e) => {
            warn!(action = %action.candidate.describe(), "action failed: {}", e);
            ValidationOutcome::failure(action, e)
        }
    }
}

/// Validate with default safety settings and no trace output.
pub async fn validate(
    advice: &str,
    snapshot: &StructuralSnapshot,
    session: &dyn ActionSession,
) -> ValidationReport {
    Validator::default().validate(advice, snapshot, session).await
}
