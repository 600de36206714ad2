//! Auction gateway backed by an Ethereum node.

use {
    crate::{
        identity::LocalIdentity,
        traits::{
            AuctionEvent,
            AuctionGateway,
            Confirmation,
            Confirmations,
            EventKind,
            GatewayError,
            HighestBid,
            Ledger,
        },
    },
    alloy::{
        contract::Error as ContractError,
        primitives::{Address, TxHash, U256},
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::{
            client::ClientBuilder,
            types::{Filter, Log},
        },
        sol_types::SolEvent,
        transports::RpcError,
    },
    contracts::alloy::Auction,
    futures::{StreamExt, stream::BoxStream},
    std::{collections::VecDeque, sync::Arc, time::Duration},
    tokio::time::interval,
    url::Url,
};

pub struct ContractGateway {
    instance: Auction::Instance,
}

impl ContractGateway {
    pub fn new(instance: Auction::Instance) -> Self {
        Self { instance }
    }
}

#[async_trait::async_trait]
impl AuctionGateway for ContractGateway {
    async fn owner(&self) -> Result<Address, GatewayError> {
        Ok(self.instance.getOwner().call().await?)
    }

    async fn highest_bid(&self) -> Result<HighestBid, GatewayError> {
        let highest = self.instance.fetchHighestBid().call().await?;
        Ok(HighestBid {
            amount: highest.bidAmount,
            bidder: highest.bidder,
        })
    }

    async fn bid_of(&self, bidder: Address) -> Result<U256, GatewayError> {
        Ok(self.instance.bids(bidder).call().await?)
    }

    async fn make_bid(&self, value: U256) -> Result<TxHash, GatewayError> {
        let pending = self.instance.makeBid().value(value).send().await?;
        Ok(*pending.tx_hash())
    }

    async fn withdraw(&self) -> Result<TxHash, GatewayError> {
        let pending = self.instance.withdraw().send().await?;
        Ok(*pending.tx_hash())
    }

    async fn confirmations(&self, kind: EventKind) -> Result<Confirmations, GatewayError> {
        let confirmations = match kind {
            EventKind::Bid => self
                .watch::<Auction::Auction::LogBid>()
                .await?
                .map(|log| -> Result<Confirmation, GatewayError> {
                    let (event, transaction) = log?;
                    Ok(Confirmation {
                        event: AuctionEvent::Bid {
                            bidder: event.bidder,
                            amount: event.amount,
                        },
                        transaction,
                    })
                })
                .boxed(),
            EventKind::Withdrawal => self
                .watch::<Auction::Auction::LogWithdrawal>()
                .await?
                .map(|log| -> Result<Confirmation, GatewayError> {
                    let (event, transaction) = log?;
                    Ok(Confirmation {
                        event: AuctionEvent::Withdrawal {
                            beneficiary: event.beneficiary,
                            amount: event.amount,
                        },
                        transaction,
                    })
                })
                .boxed(),
        };
        Ok(confirmations)
    }
}

impl ContractGateway {
    /// Installs a log filter for `E` emitted by the auction and polls it.
    /// The filter is uninstalled once the stream is dropped.
    async fn watch<E: SolEvent + Send + 'static>(
        &self,
    ) -> Result<BoxStream<'static, Result<(E, Option<TxHash>), GatewayError>>, GatewayError> {
        let filter = Filter::new()
            .address(*self.instance.address())
            .event_signature(E::SIGNATURE_HASH);
        let provider = self.instance.provider().clone();
        let id = provider
            .new_filter(&filter)
            .await
            .map_err(|err| GatewayError::Node(err.into()))?;
        let installed = InstalledFilter { provider, id };
        let polling = (installed, interval(FILTER_POLL_INTERVAL), VecDeque::new());
        let logs = futures::stream::unfold(polling, |(installed, mut interval, mut logs)| {
            async move {
                loop {
                    if let Some(log) = logs.pop_front() {
                        return Some((log, (installed, interval, logs)));
                    }
                    interval.tick().await;
                    match installed.changes().await {
                        Ok(changes) => logs.extend(changes.into_iter().map(Ok)),
                        Err(err) => return Some((Err(err), (installed, interval, logs))),
                    }
                }
            }
        });
        Ok(logs
            .map(|log: Result<Log, GatewayError>| -> Result<(E, Option<TxHash>), GatewayError> {
                let log = log?;
                let decoded = log
                    .log_decode::<E>()
                    .map_err(|err| GatewayError::Contract(err.into()))?;
                Ok((decoded.inner.data, log.transaction_hash))
            })
            .boxed())
    }
}

const FILTER_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Log filter installed on the node. Dropping it uninstalls the filter in the
/// background.
struct InstalledFilter {
    provider: DynProvider,
    id: U256,
}

impl InstalledFilter {
    async fn changes(&self) -> Result<Vec<Log>, GatewayError> {
        self.provider
            .get_filter_changes::<Log>(self.id)
            .await
            .map_err(|err| GatewayError::Node(err.into()))
    }
}

impl Drop for InstalledFilter {
    fn drop(&mut self) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(id = ?self.id, "no runtime left to uninstall log filter");
            return;
        };
        let provider = self.provider.clone();
        let id = self.id;
        runtime.spawn(async move {
            if let Err(err) = provider.uninstall_filter(id).await {
                tracing::debug!(?id, ?err, "failed to uninstall log filter");
            }
        });
    }
}

trait ContractErrorExt {
    /// Returns whether the node failed to process the request as opposed to
    /// the contract reverting.
    fn is_node_error(&self) -> bool;
}

impl ContractErrorExt for ContractError {
    fn is_node_error(&self) -> bool {
        // Reverts surface as RPC error responses carrying revert data, so only
        // responses without revert data are attributed to the node.
        match self {
            ContractError::TransportError(RpcError::ErrorResp(err)) => {
                let no_revert_data = err.as_revert_data().is_none();
                tracing::debug!(?err, %no_revert_data, "transport rpc error");
                no_revert_data
            }
            ContractError::TransportError(_) => true,
            _ => false,
        }
    }
}

impl From<ContractError> for GatewayError {
    fn from(err: ContractError) -> Self {
        if err.is_node_error() {
            Self::Node(err.into())
        } else {
            Self::Contract(err.into())
        }
    }
}

/// Connects to the auction through a node, signing with whatever key the
/// identity currently holds.
pub struct NodeLedger {
    node_url: Url,
    auction: Address,
    identity: Arc<LocalIdentity>,
}

impl NodeLedger {
    pub fn new(node_url: Url, auction: Address, identity: Arc<LocalIdentity>) -> Self {
        Self {
            node_url,
            auction,
            identity,
        }
    }
}

impl Ledger for NodeLedger {
    fn gateway(&self) -> Result<Arc<dyn AuctionGateway>, GatewayError> {
        let rpc = ClientBuilder::default().http(self.node_url.clone());
        let provider = ProviderBuilder::new()
            .wallet(self.identity.wallet())
            .connect_client(rpc)
            .erased();
        Ok(Arc::new(ContractGateway::new(Auction::Instance::new(
            self.auction,
            provider,
        ))))
    }
}
