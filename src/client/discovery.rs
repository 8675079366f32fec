//! Watch-target discovery from the autocrat program.
//!
//! Each pending proposal points at two OpenBook-TWAP wrappers, one per
//! branch. A wrapper points at its OpenBook v2 market, and the market holds
//! the bids and asks book sides. Following that chain yields four
//! [`WatchTarget`]s per pending proposal.
//!
//! # Example
//!
//! ```rust,no_run
//! use futarchy_ladder::client::{discover_watches, RpcClient};
//! use futarchy_ladder::config::DEFAULT_AUTOCRAT_PROGRAM;
//! use futarchy_ladder::Config;
//!
//! # async fn example() -> futarchy_ladder::Result<()> {
//! let rpc = RpcClient::new(&Config::default())?;
//! let program = DEFAULT_AUTOCRAT_PROGRAM.parse()?;
//! for target in discover_watches(&rpc, &program).await? {
//!     println!("{}", target);
//! }
//! # Ok(())
//! # }
//! ```

use tracing::{debug, info, warn};

use super::RpcClient;
use crate::error::Error;
use crate::layout::{account_discriminator, decode_anchor_account, decode_layout};
use crate::layout::{MarketAccount, Proposal, TwapMarket};
use crate::types::messages::{KeyedAccount, RpcFilter};
use crate::types::{AccountAddress, Branch, ProposalId, Side, WatchKey, WatchTarget};

/// Find the book sides of every pending proposal of `program`
///
/// Proposals whose markets cannot be resolved are logged and skipped. The
/// result is sorted by watch key.
///
/// # Errors
///
/// Returns an error only if the proposal listing itself fails.
pub async fn discover_watches(
    rpc: &RpcClient,
    program: &AccountAddress,
) -> Result<Vec<WatchTarget>, Error> {
    let filter = RpcFilter::memcmp(0, &account_discriminator("Proposal"));
    let accounts = rpc.get_program_accounts(program, vec![filter]).await?;
    let proposals = pending_proposals(&accounts);
    info!(%program, listed = accounts.len(), pending = proposals.len(), "proposals discovered");

    let mut targets = Vec::with_capacity(proposals.len() * 4);
    for proposal in &proposals {
        match proposal_targets(rpc, proposal).await {
            Ok(found) => targets.extend(found),
            Err(e) => warn!(proposal = proposal.number, error = %e, "skipping proposal"),
        }
    }

    targets.sort_by_key(|t| t.key);
    targets.dedup();
    Ok(targets)
}

/// Decode listed proposal accounts, keeping the pending ones
pub fn pending_proposals(accounts: &[KeyedAccount]) -> Vec<Proposal> {
    accounts
        .iter()
        .filter_map(|keyed| {
            let decoded = keyed.account.decode_data().and_then(|data| {
                decode_anchor_account::<Proposal>("Proposal", &data).map_err(Error::from)
            });
            match decoded {
                Ok(proposal) if proposal.is_pending() => Some(proposal),
                Ok(proposal) => {
                    debug!(proposal = proposal.number, state = ?proposal.state, "proposal not pending");
                    None
                }
                Err(e) => {
                    warn!(account = %keyed.pubkey, error = %e, "undecodable proposal account");
                    None
                }
            }
        })
        .collect()
}

/// Watch targets for both book sides of a branch market
pub fn market_targets(
    proposal_id: ProposalId,
    branch: Branch,
    market: &MarketAccount,
) -> [WatchTarget; 2] {
    [
        WatchTarget::new(WatchKey::new(proposal_id, branch, Side::Bid), market.bids()),
        WatchTarget::new(WatchKey::new(proposal_id, branch, Side::Ask), market.asks()),
    ]
}

async fn proposal_targets(rpc: &RpcClient, proposal: &Proposal) -> Result<Vec<WatchTarget>, Error> {
    let mut targets = Vec::with_capacity(4);
    for (branch, twap_address) in [
        (Branch::Pass, proposal.twap_pass_market()),
        (Branch::Fail, proposal.twap_fail_market()),
    ] {
        let twap_data = rpc.get_account_info(&twap_address).await?.data;
        let twap: TwapMarket = decode_anchor_account("TWAPMarket", &twap_data)?;

        let market_data = rpc.get_account_info(&twap.market()).await?.data;
        let market: MarketAccount = decode_layout(&market_data)?;
        debug!(
            proposal = proposal.number,
            %branch,
            market = %twap.market(),
            name = %market.name(),
            "branch market resolved"
        );

        targets.extend(market_targets(proposal.number, branch, &market));
    }
    Ok(targets)
}
