use {
    crate::traits::IdentityProvider,
    alloy::{network::EthereumWallet, primitives::Address, signers::local::PrivateKeySigner},
    futures::{StreamExt, stream::BoxStream},
};

/// Identity backed by a single local private key.
///
/// The key is fixed for the lifetime of the process, so the account never
/// changes.
pub struct LocalIdentity {
    signer: PrivateKeySigner,
}

impl LocalIdentity {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Wallet signing with the local key.
    pub fn wallet(&self) -> EthereumWallet {
        EthereumWallet::new(self.signer.clone())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for LocalIdentity {
    async fn request_accounts(&self) -> anyhow::Result<Vec<Address>> {
        Ok(vec![self.address()])
    }

    fn account_changes(&self) -> BoxStream<'static, Address> {
        futures::stream::pending().boxed()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{network::TxSigner, primitives::address},
        futures::FutureExt,
    };

    #[tokio::test]
    async fn exposes_the_key_account() {
        let identity = LocalIdentity::new(
            "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
                .parse()
                .unwrap(),
        );
        let account = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

        assert_eq!(identity.request_accounts().await.unwrap(), vec![account]);
        assert_eq!(identity.wallet().default_signer().address(), account);
        assert!(identity.account_changes().next().now_or_never().is_none());
    }
}
