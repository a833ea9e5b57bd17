use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::json;

use super::cache::ResultCache;
use super::http::{Calculator, TransportError};
use super::session::Session;
use crate::core::{
    CanonicalProjection, ProjectionRequest, ScenarioForm, ScenarioParameters, ValidationErrors,
    normalize, preview, validate,
};

/// Hands out increasing sequence numbers so that only the newest in-flight
/// submission is allowed to land.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Ticket(u64);

impl Ticket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

impl RequestSequencer {
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// The service answered with a recognisable projection.
    Remote(CanonicalProjection),
    /// The service could not be reached or refused; this is the local preview.
    Fallback {
        projection: CanonicalProjection,
        warning: String,
    },
    /// The service answered but nothing in the reply looks like a projection.
    Empty,
    /// A newer submission was issued while this one was in flight.
    Stale { sequence: u64 },
}

impl SubmissionOutcome {
    pub fn projection(&self) -> Option<&CanonicalProjection> {
        match self {
            SubmissionOutcome::Remote(projection)
            | SubmissionOutcome::Fallback { projection, .. } => Some(projection),
            SubmissionOutcome::Empty | SubmissionOutcome::Stale { .. } => None,
        }
    }
}

pub struct Submitter<C> {
    calculator: C,
    session: Session,
    sequencer: RequestSequencer,
    cache: ResultCache,
}

impl<C: Calculator> Submitter<C> {
    pub fn new(calculator: C, session: Session) -> Self {
        Self {
            calculator,
            session,
            sequencer: RequestSequencer::default(),
            cache: ResultCache::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Validates the form, asks the calculator, and falls back to the local
    /// preview if the call fails. Invalid forms never reach the network.
    pub async fn submit(&self, form: &ScenarioForm) -> Result<SubmissionOutcome, ValidationErrors> {
        validate(form).into_result()?;

        let params = ScenarioParameters::from_form(form);
        let request = ProjectionRequest::from(&params);
        let ticket = self.sequencer.issue();
        tracing::info!(sequence = ticket.sequence(), years = params.years, "submitting projection");

        let reply = self.calculator.project(&self.session, &request).await;
        if matches!(reply, Err(TransportError::Unauthorized)) {
            self.session.invalidate();
        }

        if !self.sequencer.is_latest(ticket) {
            tracing::debug!(sequence = ticket.sequence(), "discarding superseded response");
            return Ok(SubmissionOutcome::Stale {
                sequence: ticket.sequence(),
            });
        }

        let outcome = match reply {
            Ok(payload) => match normalize(&payload) {
                Some(projection) => SubmissionOutcome::Remote(projection),
                None => {
                    tracing::warn!(sequence = ticket.sequence(), "unrecognised projection payload");
                    SubmissionOutcome::Empty
                }
            },
            Err(err) => self.fallback(form, &err),
        };

        if let Some(projection) = outcome.projection() {
            if let Err(err) = self.cache.store(&projection.raw, form) {
                tracing::warn!(error = %err, "could not cache projection");
            }
        }
        Ok(outcome)
    }

    fn fallback(&self, form: &ScenarioForm, err: &TransportError) -> SubmissionOutcome {
        tracing::warn!(error = %err, "calculation service unavailable; using local preview");

        let payload = json!({
            "projection": preview(form),
            "allocations": [],
            "transactions": [],
        });
        match normalize(&payload) {
            Some(projection) => SubmissionOutcome::Fallback {
                projection,
                warning: format!("API call failed, using local preview. ({err})"),
            },
            None => SubmissionOutcome::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project_report;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    enum Reply {
        Report,
        Payload(Value),
        Unauthorized,
        Down,
    }

    struct FakeCalculator {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeCalculator {
        fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Calculator for FakeCalculator {
        async fn project(
            &self,
            _session: &Session,
            request: &ProjectionRequest,
        ) -> Result<Value, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Report => {
                    let params = ScenarioParameters::from(request);
                    Ok(serde_json::to_value(project_report(&params)).expect("serialize"))
                }
                Reply::Payload(value) => Ok(value.clone()),
                Reply::Unauthorized => Err(TransportError::Unauthorized),
                Reply::Down => Err(TransportError::Status {
                    status: 503,
                    body: "maintenance".to_string(),
                }),
            }
        }
    }

    /// First call parks until the second call has answered.
    struct RacingCalculator {
        calls: AtomicUsize,
        second_done: Arc<Notify>,
        first_unauthorized: bool,
    }

    impl RacingCalculator {
        fn new(first_unauthorized: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                second_done: Arc::new(Notify::new()),
                first_unauthorized,
            }
        }
    }

    impl Calculator for RacingCalculator {
        async fn project(
            &self,
            _session: &Session,
            _request: &ProjectionRequest,
        ) -> Result<Value, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                self.second_done.notified().await;
                if self.first_unauthorized {
                    return Err(TransportError::Unauthorized);
                }
                Ok(json!([{ "year": 1, "balance": "1.00" }]))
            } else {
                self.second_done.notify_one();
                Ok(json!([{ "year": 1, "balance": "2.00" }]))
            }
        }
    }

    fn short_form() -> ScenarioForm {
        ScenarioForm {
            years: "3".to_string(),
            ..ScenarioForm::default()
        }
    }

    #[test]
    fn sequencer_only_honours_latest_ticket() {
        let sequencer = RequestSequencer::default();
        let first = sequencer.issue();
        assert!(sequencer.is_latest(first));
        let second = sequencer.issue();
        assert!(second > first);
        assert!(!sequencer.is_latest(first));
        assert!(sequencer.is_latest(second));
    }

    #[tokio::test]
    async fn remote_reply_is_normalized_and_cached() {
        let submitter = Submitter::new(FakeCalculator::new(Reply::Report), Session::anonymous());
        let outcome = submitter.submit(&short_form()).await.expect("valid form");

        let SubmissionOutcome::Remote(projection) = &outcome else {
            panic!("expected remote outcome, got {outcome:?}");
        };
        assert_eq!(projection.initial_balance, dec!(1000.00));
        assert_eq!(projection.final_balance, dec!(18193.35));

        let (cached, form) = submitter.cache().restore().expect("cached");
        assert_eq!(cached.annual_balances, projection.annual_balances);
        assert_eq!(form, Some(short_form()));
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_calculator() {
        let submitter = Submitter::new(FakeCalculator::new(Reply::Report), Session::anonymous());
        let form = ScenarioForm {
            years: "0".to_string(),
            ..ScenarioForm::default()
        };
        let errors = submitter.submit(&form).await.expect_err("invalid");
        assert!(errors.get(crate::core::Field::Years).is_some());
        assert_eq!(submitter.calculator.calls.load(Ordering::SeqCst), 0);
        assert!(submitter.cache().restore().is_none());
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_preview() {
        let submitter = Submitter::new(FakeCalculator::new(Reply::Down), Session::anonymous());
        let form = short_form();
        let outcome = submitter.submit(&form).await.expect("valid form");

        let SubmissionOutcome::Fallback {
            projection,
            warning,
        } = &outcome
        else {
            panic!("expected fallback, got {outcome:?}");
        };
        assert!(warning.contains("503"));

        let preview_rows = preview(&form);
        assert_eq!(projection.annual_balances.len(), preview_rows.len());
        for (row, expected) in projection.annual_balances.iter().zip(&preview_rows) {
            assert_eq!(row.year, i64::from(expected.index));
            assert_eq!(row.salary, expected.salary);
            assert_eq!(row.contribution, expected.contribution);
            assert_eq!(row.growth, expected.growth);
            assert_eq!(row.balance, expected.balance);
        }
        assert_eq!(projection.raw["allocations"], json!([]));
        assert!(submitter.cache().restore().is_some());
    }

    #[tokio::test]
    async fn fallback_and_remote_agree_for_same_form() {
        let form = short_form();
        let remote = Submitter::new(FakeCalculator::new(Reply::Report), Session::anonymous())
            .submit(&form)
            .await
            .expect("valid form");
        let local = Submitter::new(FakeCalculator::new(Reply::Down), Session::anonymous())
            .submit(&form)
            .await
            .expect("valid form");
        assert_eq!(
            remote.projection().map(|p| &p.annual_balances),
            local.projection().map(|p| &p.annual_balances)
        );
    }

    #[tokio::test]
    async fn unauthorized_reply_invalidates_session() {
        let submitter = Submitter::new(
            FakeCalculator::new(Reply::Unauthorized),
            Session::with_token("abc.def.ghi"),
        );
        let outcome = submitter.submit(&short_form()).await.expect("valid form");
        assert!(matches!(outcome, SubmissionOutcome::Fallback { .. }));
        assert!(!submitter.session().is_authenticated());
    }

    #[tokio::test]
    async fn horizon_over_cap_is_blocked_locally() {
        let submitter = Submitter::new(FakeCalculator::new(Reply::Report), Session::anonymous());
        for years in ["1001", "1e12"] {
            let form = ScenarioForm {
                years: years.to_string(),
                ..ScenarioForm::default()
            };
            let errors = submitter.submit(&form).await.expect_err("over cap");
            assert_eq!(
                errors.get(crate::core::Field::Years),
                Some(crate::core::YEARS_LIMIT_MESSAGE)
            );
        }
        assert_eq!(submitter.calculator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn superseded_unauthorized_reply_still_invalidates_session() {
        let submitter = Submitter::new(RacingCalculator::new(true), Session::with_token("abc.def"));
        let form = short_form();
        let (first, second) = tokio::join!(submitter.submit(&form), submitter.submit(&form));

        assert_eq!(
            first.expect("valid form"),
            SubmissionOutcome::Stale { sequence: 1 }
        );
        assert!(matches!(second.expect("valid form"), SubmissionOutcome::Remote(_)));
        assert!(!submitter.session().is_authenticated());
    }

    #[tokio::test]
    async fn unrecognised_reply_is_empty_and_not_cached() {
        let submitter = Submitter::new(
            FakeCalculator::new(Reply::Payload(json!({ "foo": 1 }))),
            Session::anonymous(),
        );
        let outcome = submitter.submit(&short_form()).await.expect("valid form");
        assert_eq!(outcome, SubmissionOutcome::Empty);
        assert!(submitter.cache().restore().is_none());
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let submitter = Submitter::new(RacingCalculator::new(false), Session::anonymous());
        let form = short_form();
        let (first, second) = tokio::join!(submitter.submit(&form), submitter.submit(&form));

        assert_eq!(
            first.expect("valid form"),
            SubmissionOutcome::Stale { sequence: 1 }
        );
        let second = second.expect("valid form");
        let projection = second.projection().expect("latest lands");
        assert_eq!(projection.final_balance, dec!(2.00));

        let (cached, _) = submitter.cache().restore().expect("cached");
        assert_eq!(cached.final_balance, dec!(2.00));
    }
}
