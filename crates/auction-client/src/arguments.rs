use {
    alloy::{primitives::Address, signers::local::PrivateKeySigner},
    clap::{Parser, Subcommand},
    std::fmt::{Display, Formatter},
    tracing::level_filters::LevelFilter,
    url::Url,
};

#[derive(Parser)]
pub struct Arguments {
    #[clap(long, env, default_value = "warn,auction_client=debug")]
    pub log_filter: String,

    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Output log events as JSON.
    #[clap(long, env)]
    pub use_json_logs: bool,

    /// The Ethereum node URL to connect to.
    #[clap(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Address of the auction contract.
    #[clap(
        long,
        env,
        default_value = "0x50997157f4aff72b1dCE8D26D63bba2eA656694B"
    )]
    pub auction_address: Address,

    /// Private key of the account the client acts for.
    #[clap(long, env)]
    pub private_key: PrivateKeySigner,

    /// Number of significant digits amounts are displayed with.
    #[clap(long, env, default_value_t = crate::view::DEFAULT_PRECISION)]
    pub display_precision: u64,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Show the current state of the auction.
    Status,
    /// Bid the given amount of ether and wait for the confirmation.
    Bid { amount: String },
    /// Withdraw the proceeds of the auction. Only available to the owner.
    Withdraw,
}

impl Display for Arguments {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self {
            log_filter,
            log_stderr_threshold,
            use_json_logs,
            node_url,
            auction_address,
            private_key,
            display_precision,
            command,
        } = self;

        writeln!(f, "log_filter: {log_filter}")?;
        writeln!(f, "log_stderr_threshold: {log_stderr_threshold}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        writeln!(f, "node_url: {node_url}")?;
        writeln!(f, "auction_address: {auction_address}")?;
        writeln!(f, "private_key: SECRET ({})", private_key.address())?;
        writeln!(f, "display_precision: {display_precision}")?;
        writeln!(f, "command: {command:?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn parses_defaults_and_masks_key() {
        let args =
            Arguments::try_parse_from(["auction-client", "--private-key", KEY, "bid", "1.5"])
                .unwrap();

        assert_eq!(args.node_url.as_str(), "http://localhost:8545/");
        assert_eq!(args.display_precision, crate::view::DEFAULT_PRECISION);
        assert!(matches!(args.command, Command::Bid { ref amount } if amount == "1.5"));

        let displayed = args.to_string();
        assert!(!displayed.contains(&KEY[2..]));
        assert!(displayed.contains("SECRET"));
    }

    #[test]
    fn requires_private_key() {
        assert!(Arguments::try_parse_from(["auction-client", "status"]).is_err());
    }
}
