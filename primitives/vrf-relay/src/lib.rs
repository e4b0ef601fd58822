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

//! # VRF Relay Primitives
//!
//! Types and interfaces shared by both halves of the cross-chain VRF relay.
//!
//! A chain without native verifiable randomness (the *subnet*) runs the relay proxy pallet. A
//! chain with a randomness oracle (the *source chain*) runs the relay provider pallet. The two
//! pallets only talk to each other through an authenticated messaging channel, exchanging the
//! two wire records defined here: [`RelayRequest`] and [`RelayResponse`].
//!
//! ## Modules
//!
//! * [`gas`] - The gas bounded caller used to deliver fulfillments to consumers
//! * [`guard`] - A storage backed reentrancy guard
//! * [`xcm`] - XCM based implementations of the transport interfaces
//!
//! ## Collaborator interfaces
//!
//! * [`MessageTransport`] - sends an opaque payload to an [`Endpoint`] on another chain
//! * [`RandomnessCoordinator`] - the randomness oracle's request entry point

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod gas;
pub mod guard;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod xcm;

use alloc::vec::Vec;
use codec::{Decode, DecodeAll, DecodeWithMemTracking, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
use sp_core::{H256, U256};
use sp_runtime::DispatchError;
use sp_weights::Weight;

pub use gas::{ExecutionOutcome, GasBoundedCaller, GasCallError, GasLimitedExecutor};

/// Identifier of a chain reachable through the messaging transport.
pub type ChainId = u32;

/// Identifier assigned by the relay proxy to every randomness request. `0` is never assigned.
pub type RequestId = u64;

/// Opaque identifier assigned by the randomness oracle.
pub type OracleRequestId = U256;

/// A single random word produced by the oracle.
pub type RandomWord = U256;

/// Identifier of a message handed to the transport.
pub type MessageId = [u8; 32];

/// The `(pallet index, call index)` pair of a remote dispatchable.
pub type CallIndex = [u8; 2];

/// One side of a messaging channel.
#[derive(
	Encode,
	Decode,
	DecodeWithMemTracking,
	Clone,
	PartialEq,
	Eq,
	Debug,
	TypeInfo,
	MaxEncodedLen,
)]
pub struct Endpoint<AccountId> {
	/// The chain the endpoint lives on.
	pub chain: ChainId,
	/// The account on that chain.
	pub address: AccountId,
}

impl<AccountId> Endpoint<AccountId> {
	/// The endpoint of `address` on `chain`.
	pub fn new(chain: ChainId, address: AccountId) -> Self {
		Self { chain, address }
	}
}

/// A randomness request travelling from the proxy to the provider.
#[derive(Encode, Decode, DecodeWithMemTracking, Clone, PartialEq, Eq, Debug, TypeInfo)]
pub struct RelayRequest {
	/// Proxy assigned identifier.
	pub request_id: RequestId,
	/// Selects the oracle's proving key.
	pub key_hash: H256,
	/// The oracle subscription paying for the request.
	pub sub_id: u64,
	/// Confirmations the oracle waits for before fulfilling.
	pub min_confirmations: u16,
	/// Gas the requester wants for its own fulfillment callback.
	pub callback_gas_limit: Weight,
	/// Number of random words requested.
	pub num_words: u32,
}

/// The oracle's result travelling from the provider back to the proxy.
#[derive(Encode, Decode, DecodeWithMemTracking, Clone, PartialEq, Eq, Debug, TypeInfo)]
pub struct RelayResponse {
	/// The proxy assigned identifier of the request being fulfilled.
	pub request_id: RequestId,
	/// The random words.
	pub random_words: Vec<RandomWord>,
	/// The requester's callback gas limit, echoed back unchanged.
	pub callback_gas_limit: Weight,
}

/// Decodes a wire record, rejecting payloads with trailing bytes.
pub fn decode_payload<R: Decode>(payload: &[u8]) -> Option<R> {
	R::decode_all(&mut &payload[..]).ok()
}

/// Sends opaque payloads to an [`Endpoint`] on another chain.
///
/// The receiving side is expected to dispatch the payload to its relay pallet's
/// `receive_message` call under an origin which identifies this chain and the sending account.
pub trait MessageTransport<AccountId> {
	/// The fee paid for delivery.
	type Fee;

	/// Sends `payload` to `destination`, reserving `required_gas` for the remote handler.
	fn send(
		destination: &Endpoint<AccountId>,
		fee: Self::Fee,
		required_gas: Weight,
		payload: Vec<u8>,
	) -> Result<MessageId, DispatchError>;
}

/// The request side of a randomness oracle.
///
/// `Id` is the identifier the oracle hands back, later used to correlate the fulfillment.
pub trait RandomnessCoordinator<AccountId, Id> {
	/// Requests `num_words` random words on behalf of `requester`.
	fn request_random_words(
		requester: &AccountId,
		key_hash: H256,
		sub_id: u64,
		min_confirmations: u16,
		callback_gas_limit: Weight,
		num_words: u32,
	) -> Result<Id, DispatchError>;
}
