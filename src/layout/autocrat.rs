//! Autocrat and OpenBook-TWAP accounts used to discover watch targets.
//!
//! These are ordinary Anchor accounts: an 8-byte discriminator followed by a
//! borsh encoding. Only the leading fields needed to find a proposal's
//! conditional markets are declared; the rest of the account is ignored.

use borsh::BorshDeserialize;

use super::check_discriminator;
use crate::error::DecodeError;
use crate::types::{AccountAddress, ProposalId};

/// Lifecycle of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshDeserialize)]
pub enum ProposalState {
    /// Markets are trading
    Pending,
    /// Finalized in favor
    Passed,
    /// Finalized against
    Failed,
}

/// Account meta of the instruction a proposal would execute
#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
pub struct ProposalAccountMeta {
    /// Account key
    pub pubkey: [u8; 32],
    /// Whether the account signs
    pub is_signer: bool,
    /// Whether the account is written
    pub is_writable: bool,
}

/// Instruction executed if the proposal passes
#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
pub struct ProposalInstruction {
    /// Target program
    pub program_id: [u8; 32],
    /// Instruction accounts
    pub accounts: Vec<ProposalAccountMeta>,
    /// Instruction data
    pub data: Vec<u8>,
}

/// Leading fields of an autocrat `Proposal` account
#[derive(Debug, Clone, PartialEq, Eq, BorshDeserialize)]
pub struct Proposal {
    /// Sequential proposal number within the DAO
    pub number: ProposalId,
    /// Proposer wallet
    pub proposer: [u8; 32],
    /// Link to the proposal text
    pub description_url: String,
    /// Slot the proposal was created at
    pub slot_enqueued: u64,
    /// Current state
    pub state: ProposalState,
    /// Instruction to execute on pass
    pub instruction: ProposalInstruction,
    /// TWAP wrapper of the pass market
    pub openbook_twap_pass_market: [u8; 32],
    /// TWAP wrapper of the fail market
    pub openbook_twap_fail_market: [u8; 32],
}

impl Proposal {
    /// Check if the proposal's markets are live
    pub fn is_pending(&self) -> bool {
        self.state == ProposalState::Pending
    }

    /// TWAP market of the pass branch
    pub fn twap_pass_market(&self) -> AccountAddress {
        AccountAddress::new(self.openbook_twap_pass_market)
    }

    /// TWAP market of the fail branch
    pub fn twap_fail_market(&self) -> AccountAddress {
        AccountAddress::new(self.openbook_twap_fail_market)
    }
}

/// Leading field of an OpenBook-TWAP `TWAPMarket` account
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshDeserialize)]
pub struct TwapMarket {
    /// The wrapped OpenBook v2 market
    pub market: [u8; 32],
}

impl TwapMarket {
    /// Address of the wrapped OpenBook v2 market
    pub fn market(&self) -> AccountAddress {
        AccountAddress::new(self.market)
    }
}

/// Decode an Anchor account named `name`, ignoring bytes past the fields of `T`
///
/// # Errors
///
/// [`DecodeError::SchemaMismatch`] on a discriminator mismatch or truncated
/// borsh data.
pub fn decode_anchor_account<T: BorshDeserialize>(
    name: &'static str,
    data: &[u8],
) -> Result<T, DecodeError> {
    let (discriminator, mut body) = data.split_at(data.len().min(8));
    check_discriminator(name, discriminator)?;
    T::deserialize(&mut body).map_err(|e| DecodeError::schema(name, e.to_string()))
}
