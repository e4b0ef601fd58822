/*
 * Copyright 2025 by Ideal Labs, LLC
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Mock collaborators for testing runtimes that include the relay pallets.
//!
//! * [`pallet_mock_transport`] - a pallet whose only purpose is to declare a transport origin
//!   carrying the verified source [`Endpoint`] of a delivery
//! * [`EnsureTransport`] - the matching `EnsureOrigin`
//! * [`MockTransport`] - records every sent message instead of delivering it
//! * [`MockExecutor`] - a gas limited executor over a registry of fake contracts
//! * [`MockOracle`] - a randomness coordinator that records requests and hands out sequential ids

use crate::{
	gas::{ExecutionOutcome, GasLimitedExecutor},
	Endpoint, MessageId, MessageTransport, OracleRequestId, RandomnessCoordinator,
};
use codec::{Decode, Encode};
use frame_support::{parameter_types, traits::EnsureOrigin};
use sp_core::{H256, U256};
use sp_runtime::{AccountId32, DispatchError};
use sp_weights::Weight;
use std::collections::BTreeMap;

pub use pallet_mock_transport::Origin as TransportOrigin;

#[frame_support::pallet]
pub mod pallet_mock_transport {
	use crate::Endpoint;
	use sp_runtime::AccountId32;

	#[pallet::config]
	pub trait Config: frame_system::Config {}

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	/// A delivery by the transport, carrying the verified source of the message.
	#[pallet::origin]
	pub type Origin = Endpoint<AccountId32>;
}

/// Accepts only origins produced by [`pallet_mock_transport`].
pub struct EnsureTransport;

impl<O> EnsureOrigin<O> for EnsureTransport
where
	O: Into<Result<TransportOrigin, O>> + From<TransportOrigin>,
{
	type Success = Endpoint<AccountId32>;

	fn try_origin(o: O) -> Result<Self::Success, O> {
		o.into()
	}

	#[cfg(feature = "runtime-benchmarks")]
	fn try_successful_origin() -> Result<O, ()> {
		Ok(O::from(Endpoint::new(0, AccountId32::new([0u8; 32]))))
	}
}

/// A message handed to the [`MockTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
	pub destination: Endpoint<AccountId32>,
	pub fee: u128,
	pub required_gas: Weight,
	pub payload: Vec<u8>,
}

impl SentMessage {
	/// Decodes the payload as a wire record.
	pub fn decode<R: Decode>(&self) -> Option<R> {
		crate::decode_payload(&self.payload)
	}
}

parameter_types! {
	pub static Outbox: Vec<SentMessage> = Vec::new();
	pub static TransportFails: bool = false;
	pub static SentCount: u64 = 0;
}

/// A transport which keeps every message in [`Outbox`].
pub struct MockTransport;

impl MessageTransport<AccountId32> for MockTransport {
	type Fee = u128;

	fn send(
		destination: &Endpoint<AccountId32>,
		fee: u128,
		required_gas: Weight,
		payload: Vec<u8>,
	) -> Result<MessageId, DispatchError> {
		if TransportFails::get() {
			return Err(DispatchError::Other("transport unavailable"));
		}
		let nonce = SentCount::mutate(|n| {
			*n += 1;
			*n
		});
		let id = sp_io::hashing::blake2_256(&(nonce, &payload).encode());
		Outbox::mutate(|o| {
			o.push(SentMessage { destination: destination.clone(), fee, required_gas, payload })
		});
		Ok(id)
	}
}

/// Drains the messages sent so far.
pub fn take_outbox() -> Vec<SentMessage> {
	Outbox::mutate(core::mem::take)
}

/// A fake contract known to the [`MockExecutor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockContract {
	/// Gas the contract needs to complete. Given less, it runs out of gas.
	pub gas_needed: Weight,
	/// Whether the contract reverts after spending `gas_needed`.
	pub reverts: bool,
}

/// A call made through the [`MockExecutor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutedCall {
	pub target: AccountId32,
	pub gas_limit: Weight,
	pub input: Vec<u8>,
}

parameter_types! {
	pub static Contracts: BTreeMap<AccountId32, MockContract> = BTreeMap::new();
	pub static ExecutedCalls: Vec<ExecutedCall> = Vec::new();
}

/// Registers a fake contract at `address`.
pub fn deploy_contract(address: AccountId32, gas_needed: Weight, reverts: bool) {
	Contracts::mutate(|c| c.insert(address, MockContract { gas_needed, reverts }));
}

/// Drains the calls executed so far.
pub fn take_executed_calls() -> Vec<ExecutedCall> {
	ExecutedCalls::mutate(core::mem::take)
}

/// Executes calls against [`Contracts`].
pub struct MockExecutor;

impl GasLimitedExecutor<AccountId32> for MockExecutor {
	fn has_code(target: &AccountId32) -> bool {
		Contracts::get().contains_key(target)
	}

	fn execute(target: &AccountId32, gas_limit: Weight, input: Vec<u8>) -> ExecutionOutcome {
		ExecutedCalls::mutate(|c| {
			c.push(ExecutedCall { target: target.clone(), gas_limit, input })
		});
		match Contracts::get().get(target) {
			Some(contract) if contract.gas_needed.any_gt(gas_limit) =>
				ExecutionOutcome { gas_used: gas_limit, success: false },
			Some(contract) =>
				ExecutionOutcome { gas_used: contract.gas_needed, success: !contract.reverts },
			None => ExecutionOutcome { gas_used: Weight::zero(), success: false },
		}
	}
}

/// A request received by the [`MockOracle`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleRequest {
	pub requester: AccountId32,
	pub key_hash: H256,
	pub sub_id: u64,
	pub min_confirmations: u16,
	pub callback_gas_limit: Weight,
	pub num_words: u32,
}

parameter_types! {
	pub static SubmittedOracleRequests: Vec<OracleRequest> = Vec::new();
	pub static NextOracleRequestId: OracleRequestId = U256::one();
	pub static OracleFails: bool = false;
}

/// Drains the requests the oracle received so far.
pub fn take_oracle_requests() -> Vec<OracleRequest> {
	SubmittedOracleRequests::mutate(core::mem::take)
}

/// A randomness coordinator handing out [`NextOracleRequestId`] and counting up.
pub struct MockOracle;

impl RandomnessCoordinator<AccountId32, OracleRequestId> for MockOracle {
	fn request_random_words(
		requester: &AccountId32,
		key_hash: H256,
		sub_id: u64,
		min_confirmations: u16,
		callback_gas_limit: Weight,
		num_words: u32,
	) -> Result<OracleRequestId, DispatchError> {
		if OracleFails::get() {
			return Err(DispatchError::Other("subscription not funded"));
		}
		SubmittedOracleRequests::mutate(|r| {
			r.push(OracleRequest {
				requester: requester.clone(),
				key_hash,
				sub_id,
				min_confirmations,
				callback_gas_limit,
				num_words,
			})
		});
		Ok(NextOracleRequestId::mutate(|id| {
			let assigned = *id;
			*id = id.saturating_add(U256::one());
			assigned
		}))
	}
}
