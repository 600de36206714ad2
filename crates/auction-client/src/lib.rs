pub mod arguments;
pub mod engine;
pub mod gateway;
pub mod identity;
pub mod traits;
pub mod view;

use {
    anyhow::{Context, Result},
    arguments::{Arguments, Command},
    engine::Engine,
    gateway::NodeLedger,
    identity::LocalIdentity,
    std::sync::Arc,
    view::View,
};

pub async fn run(args: Arguments) -> Result<()> {
    let identity = Arc::new(LocalIdentity::new(args.private_key));
    let ledger = NodeLedger::new(args.node_url, args.auction_address, identity.clone());
    let engine = Engine::new(identity, Arc::new(ledger));

    let account = engine.connect().await.context("failed to connect")?;
    tracing::debug!(?account, state = ?engine.state(), "loaded auction state");

    match args.command {
        Command::Status => (),
        Command::Bid { amount } => {
            let transaction = engine.submit_bid(&amount).await?;
            println!("Bid submitted in {transaction}, waiting for confirmation...");
            wait_until_settled(&engine).await?;
        }
        Command::Withdraw => {
            let transaction = engine.withdraw().await?;
            println!("Withdrawal submitted in {transaction}, waiting for confirmation...");
            wait_until_settled(&engine).await?;
        }
    }

    println!("{}", View::new(&engine.state(), args.display_precision));
    tracing::debug!(
        "metrics:\n{}",
        observe::metrics::encode(observe::metrics::get_registry())
    );
    Ok(())
}

async fn wait_until_settled(engine: &Engine) -> Result<()> {
    engine
        .subscribe()
        .wait_for(|state| !state.phase.is_busy())
        .await
        .context("engine stopped")?;
    Ok(())
}
