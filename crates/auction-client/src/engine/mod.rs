//! Keeps a local snapshot of the auction in sync with the ledger and drives
//! bids and withdrawals through submission and confirmation.

mod errors;
mod state;

pub use {
    errors::{ConnectionError, ReadError, SubmissionError},
    state::{Field, Phase, Snapshot, State},
};
use {
    crate::traits::{
        AuctionGateway,
        Confirmations,
        EventKind,
        GatewayError,
        HighestBid,
        IdentityProvider,
        Ledger,
    },
    alloy::primitives::{Address, TxHash, U256},
    anyhow::anyhow,
    futures::StreamExt,
    prometheus::IntCounterVec,
    state::{Requests, Ticket},
    std::{
        future::Future,
        sync::{
            Arc,
            Mutex,
            Weak,
            atomic::{AtomicBool, Ordering},
        },
    },
    tokio::sync::watch,
    tracing::Instrument,
};

/// Handle to the synchronization engine. Cloning is cheap and all clones
/// share the same session.
#[derive(Clone)]
pub struct Engine(Arc<Inner>);

struct Inner {
    identity: Arc<dyn IdentityProvider>,
    ledger: Arc<dyn Ledger>,
    state: watch::Sender<State>,
    /// Only locked for synchronous bookkeeping, never across an await point.
    /// Always acquired before writing `state`.
    requests: Mutex<Requests>,
    listening_for_identity_changes: AtomicBool,
    metrics: &'static Metrics,
}

impl Engine {
    pub fn new(identity: Arc<dyn IdentityProvider>, ledger: Arc<dyn Ledger>) -> Self {
        let (state, _) = watch::channel(State::default());
        Self(Arc::new(Inner {
            identity,
            ledger,
            state,
            requests: Default::default(),
            listening_for_identity_changes: AtomicBool::new(false),
            metrics: Metrics::get(),
        }))
    }

    /// Current session state.
    pub fn state(&self) -> State {
        self.0.state.borrow().clone()
    }

    /// Receiver that gets notified about every state change.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.0.state.subscribe()
    }

    /// Asks the identity provider for the active account and loads the
    /// auction state for it.
    ///
    /// Connecting again with the same account keeps the session and only
    /// refreshes the snapshot.
    pub async fn connect(&self) -> Result<Address, ConnectionError> {
        let accounts = self
            .0
            .identity
            .request_accounts()
            .await
            .map_err(ConnectionError::Unavailable)?;
        let account = accounts
            .first()
            .copied()
            .ok_or(ConnectionError::NoAccounts)?;

        if self.switch_account(account) {
            tracing::info!(?account, "connected");
        }
        self.listen_for_identity_changes();
        self.refresh_all().await;
        Ok(account)
    }

    /// Runs all refreshes concurrently. Failures are logged and leave the
    /// affected fields untouched.
    pub async fn refresh_all(&self) {
        let (highest_bid, my_bid, ownership) = futures::join!(
            self.refresh_highest_bid(),
            self.refresh_my_bid(),
            self.refresh_ownership(),
        );
        log_failures([highest_bid.err(), my_bid.err(), ownership.err()]);
    }

    /// Reads the highest bid and its bidder and stores both in one update.
    pub async fn refresh_highest_bid(&self) -> Result<HighestBid, ReadError> {
        let (ticket, _) = self.issue(Field::HighestBid);
        let highest_bid = self
            .read(ticket.field, |gateway| async move {
                gateway.highest_bid().await
            })
            .await?;
        self.commit(ticket, |_, state| {
            let modified = state.snapshot.highest_bid != highest_bid;
            state.snapshot.highest_bid = highest_bid;
            modified
        });
        Ok(highest_bid)
    }

    /// Reads the amount the contract has on record for the connected account.
    pub async fn refresh_my_bid(&self) -> Result<U256, ReadError> {
        let (ticket, account) = self.issue(Field::MyBid);
        let account = account.ok_or(ReadError::NotConnected)?;
        let my_bid = self
            .read(ticket.field, |gateway| async move {
                gateway.bid_of(account).await
            })
            .await?;
        self.commit(ticket, |_, state| {
            let modified = state.snapshot.my_bid != my_bid;
            state.snapshot.my_bid = my_bid;
            modified
        });
        Ok(my_bid)
    }

    /// Determines whether the connected account owns the auction.
    ///
    /// Only the first successful read of an account session is stored, later
    /// reads return what the ledger reported without changing the snapshot.
    pub async fn refresh_ownership(&self) -> Result<bool, ReadError> {
        let (ticket, account) = self.issue(Field::Ownership);
        let account = account.ok_or(ReadError::NotConnected)?;
        let owner = self
            .read(ticket.field, |gateway| async move { gateway.owner().await })
            .await?;
        // Parsed addresses compare bytes so checksum casing doesn't matter.
        let is_owner = owner == account;
        self.commit(ticket, |requests, state| {
            if requests.ownership_resolved {
                return false;
            }
            requests.ownership_resolved = true;
            let modified = state.snapshot.is_owner != is_owner;
            state.snapshot.is_owner = is_owner;
            modified
        });
        Ok(is_owner)
    }

    /// Places a bid of `amount` ether.
    ///
    /// Returns as soon as the node accepted the transaction. The snapshot is
    /// only updated once the ledger confirms the bid.
    pub async fn submit_bid(&self, amount: &str) -> Result<TxHash, SubmissionError> {
        let result = match parse_bid(amount) {
            Ok(value) => {
                self.submit(EventKind::Bid, move |gateway| async move {
                    gateway.make_bid(value).await
                })
                .await
            }
            Err(err) => Err(err),
        };
        self.observe_submission(EventKind::Bid, &result);
        result
    }

    /// Withdraws the auction proceeds. Only the owner may do that.
    pub async fn withdraw(&self) -> Result<TxHash, SubmissionError> {
        let result = self
            .submit(EventKind::Withdrawal, |gateway| async move {
                gateway.withdraw().await
            })
            .await;
        self.observe_submission(EventKind::Withdrawal, &result);
        result
    }

    /// Starts a new session if `account` differs from the current one.
    /// Returns whether that happened.
    fn switch_account(&self, account: Address) -> bool {
        let mut requests = self.0.requests.lock().unwrap();
        self.0.state.send_if_modified(|state| {
            if state.account == Some(account) {
                return false;
            }
            requests.new_session();
            *state = State::connected(account);
            true
        })
    }

    fn listen_for_identity_changes(&self) {
        if self
            .0
            .listening_for_identity_changes
            .swap(true, Ordering::SeqCst)
        {
            return;
        }
        let mut changes = self.0.identity.account_changes();
        let engine = Arc::downgrade(&self.0);
        tokio::spawn(
            async move {
                while let Some(account) = changes.next().await {
                    let Some(engine) = Weak::upgrade(&engine).map(Engine) else {
                        break;
                    };
                    if engine.switch_account(account) {
                        tracing::info!(?account, "active account changed");
                        engine.refresh_all().await;
                    }
                }
                tracing::debug!("stopped listening for account changes");
            }
            .instrument(tracing::info_span!("account_changes")),
        );
    }

    /// Registers a new read of `field` and returns it together with the
    /// account of the session it belongs to.
    fn issue(&self, field: Field) -> (Ticket, Option<Address>) {
        let mut requests = self.0.requests.lock().unwrap();
        let ticket = requests.issue(field);
        (ticket, self.0.state.borrow().account)
    }

    async fn read<T, F, Fut>(&self, field: Field, read: F) -> Result<T, ReadError>
    where
        F: FnOnce(Arc<dyn AuctionGateway>) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let result = match self.0.ledger.gateway() {
            Ok(gateway) => read(gateway)
                .await
                .map_err(|source| ReadError::Gateway { field, source }),
            Err(source) => Err(ReadError::Ledger { field, source }),
        };
        let label: &'static str = field.into();
        let outcome = if result.is_ok() { "success" } else { "failure" };
        self.0
            .metrics
            .reads
            .with_label_values(&[label, outcome])
            .inc();
        result
    }

    /// Applies the result of a read unless a newer read of the same field or
    /// a new session superseded it.
    fn commit(&self, ticket: Ticket, update: impl FnOnce(&mut Requests, &mut State) -> bool) {
        let mut requests = self.0.requests.lock().unwrap();
        if !requests.is_current(&ticket) {
            tracing::debug!(field = ?ticket.field, "dropping superseded read");
            let label: &'static str = ticket.field.into();
            self.0
                .metrics
                .superseded_reads
                .with_label_values(&[label])
                .inc();
            return;
        }
        self.0
            .state
            .send_if_modified(|state| update(&mut *requests, state));
    }

    async fn submit<F, Fut>(&self, kind: EventKind, send: F) -> Result<TxHash, SubmissionError>
    where
        F: FnOnce(Arc<dyn AuctionGateway>) -> Fut,
        Fut: Future<Output = Result<TxHash, GatewayError>>,
    {
        let session = self.begin(kind)?;
        let (transaction, confirmations) = match self.send(kind, send).await {
            Ok(sent) => sent,
            Err(err) => {
                self.transition(session, Phase::Submitting(kind), Phase::Idle);
                return Err(err);
            }
        };

        let awaiting = Phase::AwaitingConfirmation { kind, transaction };
        if self.transition(session, Phase::Submitting(kind), awaiting) {
            let label: &'static str = kind.into();
            tokio::spawn(
                self.clone()
                    .reconcile(session, awaiting, confirmations)
                    .instrument(tracing::info_span!("reconcile", kind = label, ?transaction)),
            );
        }
        Ok(transaction)
    }

    /// Moves the phase to `Submitting` if a submission of `kind` is allowed
    /// right now. Returns the session the submission belongs to.
    fn begin(&self, kind: EventKind) -> Result<u64, SubmissionError> {
        let requests = self.0.requests.lock().unwrap();
        let mut outcome = Ok(());
        self.0.state.send_if_modified(|state| {
            outcome = ensure_submittable(state, kind);
            if outcome.is_ok() {
                state.phase = Phase::Submitting(kind);
            }
            outcome.is_ok()
        });
        outcome.map(|()| requests.session())
    }

    /// Subscribes to confirmations and then sends the request. The
    /// subscription gets dropped together with the error if sending fails.
    async fn send<F, Fut>(
        &self,
        kind: EventKind,
        send: F,
    ) -> Result<(TxHash, Confirmations), SubmissionError>
    where
        F: FnOnce(Arc<dyn AuctionGateway>) -> Fut,
        Fut: Future<Output = Result<TxHash, GatewayError>>,
    {
        let gateway = self.0.ledger.gateway().map_err(SubmissionError::Ledger)?;
        let confirmations = gateway
            .confirmations(kind)
            .await
            .map_err(SubmissionError::Subscription)?;
        let transaction = send(gateway).await.map_err(SubmissionError::Rejected)?;
        Ok((transaction, confirmations))
    }

    /// Refreshes the snapshot for every confirmation of the awaited kind
    /// until the one for our own transaction arrives.
    async fn reconcile(self, session: u64, awaiting: Phase, mut confirmations: Confirmations) {
        let Phase::AwaitingConfirmation { kind, transaction } = awaiting else {
            return;
        };
        while let Some(confirmation) = confirmations.next().await {
            if !self.is_in(session, awaiting) {
                tracing::debug!("session moved on, no longer waiting");
                return;
            }
            let confirmation = match confirmation {
                Ok(confirmation) => confirmation,
                Err(err) => {
                    tracing::warn!(?err, "failed to receive confirmation");
                    continue;
                }
            };
            if confirmation.event.kind() != kind {
                continue;
            }

            tracing::debug!(event = ?confirmation.event, "received confirmation");
            let label: &'static str = kind.into();
            self.0
                .metrics
                .confirmations
                .with_label_values(&[label])
                .inc();
            let (my_bid, highest_bid) =
                futures::join!(self.refresh_my_bid(), self.refresh_highest_bid());
            log_failures([my_bid.err(), highest_bid.err()]);

            if confirmation
                .transaction
                .is_none_or(|confirmed| confirmed == transaction)
            {
                tracing::info!("submission confirmed");
                self.transition(session, awaiting, Phase::Idle);
                return;
            }
            tracing::debug!(
                other = ?confirmation.transaction,
                "confirmation belongs to another transaction"
            );
        }
        tracing::warn!("confirmation stream ended before the submission was confirmed");
        self.transition(session, awaiting, Phase::Idle);
    }

    /// Whether the account session `session` is still active and in `phase`.
    fn is_in(&self, session: u64, phase: Phase) -> bool {
        let requests = self.0.requests.lock().unwrap();
        requests.session() == session && self.0.state.borrow().phase == phase
    }

    /// Sets the phase to `to` if session `session` is still active and its
    /// phase is `from`. A submission never touches the phase of a session
    /// started after it.
    fn transition(&self, session: u64, from: Phase, to: Phase) -> bool {
        let requests = self.0.requests.lock().unwrap();
        if requests.session() != session {
            tracing::debug!(?to, "session changed, dropping phase transition");
            return false;
        }
        self.0.state.send_if_modified(|state| {
            if state.phase != from {
                return false;
            }
            state.phase = to;
            true
        })
    }

    fn observe_submission(&self, kind: EventKind, result: &Result<TxHash, SubmissionError>) {
        let label: &'static str = kind.into();
        let outcome = match result {
            Ok(transaction) => {
                tracing::info!(kind = label, ?transaction, "submitted");
                "success"
            }
            Err(err) => {
                tracing::warn!(kind = label, ?err, "submission failed");
                err.label()
            }
        };
        self.0
            .metrics
            .submissions
            .with_label_values(&[label, outcome])
            .inc();
    }
}

fn parse_bid(amount: &str) -> Result<U256, SubmissionError> {
    let value = number::conversions::parse_ether(amount).map_err(SubmissionError::InvalidAmount)?;
    if value.is_zero() {
        return Err(SubmissionError::InvalidAmount(anyhow!(
            "bid amount must be positive"
        )));
    }
    Ok(value)
}

fn ensure_submittable(state: &State, kind: EventKind) -> Result<(), SubmissionError> {
    if !state.is_connected() {
        return Err(SubmissionError::NotConnected);
    }
    if kind == EventKind::Withdrawal && !state.snapshot.is_owner {
        return Err(SubmissionError::NotOwner);
    }
    if state.phase != Phase::Idle {
        return Err(SubmissionError::Busy);
    }
    Ok(())
}

fn log_failures<const N: usize>(errors: [Option<ReadError>; N]) {
    for err in errors.into_iter().flatten() {
        tracing::warn!(?err, "failed to refresh auction state");
    }
}

#[derive(prometheus_metric_storage::MetricStorage)]
#[metric(subsystem = "engine")]
struct Metrics {
    /// Contract reads by snapshot field and result.
    #[metric(labels("field", "result"))]
    reads: IntCounterVec,

    /// Reads whose result got dropped because a newer read was issued.
    #[metric(labels("field"))]
    superseded_reads: IntCounterVec,

    /// Submissions by kind and result.
    #[metric(labels("kind", "result"))]
    submissions: IntCounterVec,

    /// Confirmation events received for outstanding submissions.
    #[metric(labels("kind"))]
    confirmations: IntCounterVec,
}

impl Metrics {
    fn get() -> &'static Self {
        Self::instance(observe::metrics::get_storage_registry()).unwrap()
    }
}
