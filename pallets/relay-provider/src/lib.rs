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

//! # Relay Provider Pallet
//!
//! The source chain half of the VRF relay. It accepts randomness requests forwarded by exactly
//! one relay proxy, submits them to the local randomness oracle on its own behalf, and relays
//! the oracle's random words back to the proxy.
//!
//! ## Overview
//!
//! 1. The proxy's [`RelayRequest`] arrives through [`Pallet::receive_message`]. The source is
//!    checked against [`Config::Counterparty`] before the payload is even decoded.
//! 2. The request is submitted to [`Config::Oracle`] with a callback gas limit covering this
//!    pallet's [`Pallet::fulfill_random_words`], computed as
//!    `OracleCallbackBaseGas + OracleCallbackGasPerWord * num_words`.
//! 3. The oracle calls [`Pallet::fulfill_random_words`]. The correlation is consumed and a
//!    [`RelayResponse`] is sent back, reserving the requester's callback gas limit plus
//!    [`Config::ReceiveOverheadGas`] for the proxy's handler.
//!
//! A request is tracked by exactly one [`OracleCorrelation`] between steps 2 and 3. Requests the
//! oracle never fulfills stay tracked, there is no timeout.

#![cfg_attr(not(feature = "std"), no_std)]


#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;

use codec::{Codec, Decode, DecodeWithMemTracking, Encode, MaxEncodedLen};
use frame_support::{
	dispatch::DispatchResultWithPostInfo,
	pallet_prelude::{
		ensure, Blake2_128Concat, DispatchError, EnsureOrigin, Get, IsType, OptionQuery, Pays,
		StorageMap, StorageValue, ValueQuery, Weight,
	},
	sp_runtime::traits::AccountIdConversion,
	PalletId,
};
use frame_system::pallet_prelude::OriginFor;
use scale_info::TypeInfo;
use sp_std::vec::Vec;
use sp_vrf_relay::{
	decode_payload, guard, Endpoint, MessageId, MessageTransport, OracleRequestId, RandomWord,
	RandomnessCoordinator, RelayRequest, RelayResponse, RequestId,
};

pub use pallet::*;
pub use weights::WeightInfo;

const LOG_TARGET: &str = "pallet-relay-provider";

/// The fee type of the configured transport.
pub type TransportFeeOf<T> = <<T as Config>::Transport as MessageTransport<
	<T as frame_system::Config>::AccountId,
>>::Fee;

/// Links an oracle request back to the proxy request it serves.
#[derive(
	Encode,
	Decode,
	DecodeWithMemTracking,
	Clone,
	Copy,
	PartialEq,
	Eq,
	Debug,
	TypeInfo,
	MaxEncodedLen,
)]
pub struct OracleCorrelation {
	/// The id the relay proxy assigned to the request.
	pub proxy_request_id: RequestId,
	/// The requester's callback gas limit, returned with the random words.
	pub callback_gas_limit: Weight,
}

/// Hooks for setting up benchmarks in a concrete runtime.
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, Origin> {
	/// An origin [`Config::TransportOrigin`] resolves to `source`.
	fn transport_origin(source: Endpoint<AccountId>) -> Origin;
}

#[frame_support::pallet]
pub mod pallet {
	use super::*;

	#[pallet::config]
	pub trait Config: frame_system::Config {
		/// The overarching event type
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// The origin of inbound messages, resolving to the verified source of the message.
		type TransportOrigin: EnsureOrigin<Self::RuntimeOrigin, Success = Endpoint<Self::AccountId>>;

		/// Sends responses to the relay proxy.
		type Transport: MessageTransport<Self::AccountId>;

		/// The fee paid to the transport for every response.
		type TransportFee: Get<TransportFeeOf<Self>>;

		/// The relay proxy this provider serves. Requests from anywhere else are rejected.
		#[pallet::constant]
		type Counterparty: Get<Endpoint<Self::AccountId>>;

		/// The local randomness oracle.
		type Oracle: RandomnessCoordinator<Self::AccountId, OracleRequestId>;

		/// The origin the oracle fulfills requests with.
		type OracleOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		/// The pallet id, used to derive the account requesting randomness from the oracle.
		#[pallet::constant]
		type PalletId: Get<PalletId>;

		/// Gas the oracle gives [`Pallet::fulfill_random_words`] regardless of the number of
		/// words.
		#[pallet::constant]
		type OracleCallbackBaseGas: Get<Weight>;

		/// Additional gas the oracle gives [`Pallet::fulfill_random_words`] per random word.
		#[pallet::constant]
		type OracleCallbackGasPerWord: Get<Weight>;

		/// Gas the proxy's `receive_message` needs on top of the requester's callback gas limit.
		#[pallet::constant]
		type ReceiveOverheadGas: Get<Weight>;

		// The weight information for this pallet.
		type WeightInfo: WeightInfo;

		#[cfg(feature = "runtime-benchmarks")]
		type BenchmarkHelper: BenchmarkHelper<Self::AccountId, Self::RuntimeOrigin>;
	}

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	/// Oracle requests awaiting fulfillment.
	#[pallet::storage]
	pub(crate) type OracleRequests<T: Config> =
		StorageMap<_, Blake2_128Concat, OracleRequestId, OracleCorrelation, OptionQuery>;

	/// Set while the oracle is being called into.
	#[pallet::storage]
	pub(crate) type OracleCallLock<T: Config> = StorageValue<_, bool, ValueQuery>;

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		/// A relayed request was submitted to the oracle.
		RandomWordsRequestReceived { request_id: RequestId, oracle_request_id: OracleRequestId },
		/// The oracle fulfilled a request and the words were sent back to the proxy.
		RandomWordsFulfilled {
			request_id: RequestId,
			oracle_request_id: OracleRequestId,
			message_id: MessageId,
		},
	}

	#[pallet::error]
	#[derive(PartialEq)]
	pub enum Error<T> {
		/// The message did not come from the relay proxy's chain.
		InvalidSourceChain,
		/// The message did not come from the relay proxy's account.
		InvalidSourceAddress,
		/// The message payload is not a valid request.
		InvalidPayload,
		/// Request id `0` is never assigned by the proxy.
		InvalidRequestID,
		/// The gas available to the message cannot cover its handling.
		InsufficientGas,
		/// The oracle refused the request.
		OracleRequestFailed,
		/// The oracle returned an id that is already being tracked.
		DuplicateOracleRequest,
		/// No request is tracked under this oracle request id.
		UnknownOracleRequest,
		/// The oracle called back while a request was being submitted to it.
		Reentrancy,
		/// The transport refused the response.
		TransportSendFailed,
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Inbound delivery of a [`RelayRequest`] from the relay proxy.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::receive_message())]
		#[allow(clippy::useless_conversion)]
		pub fn receive_message(
			origin: OriginFor<T>,
			payload: Vec<u8>,
			gas_limit: Weight,
		) -> DispatchResultWithPostInfo {
			let source = T::TransportOrigin::ensure_origin(origin)?;
			log::trace!(target: LOG_TARGET, "Message received from {:?}", source);

			Self::ensure_counterparty(&source)?;
			ensure!(
				gas_limit.all_gte(T::WeightInfo::receive_message()),
				Error::<T>::InsufficientGas
			);

			let request =
				decode_payload::<RelayRequest>(&payload).ok_or(Error::<T>::InvalidPayload)?;
			ensure!(request.request_id != 0, Error::<T>::InvalidRequestID);

			let oracle_request_id = Self::submit_to_oracle(&request)?;
			ensure!(
				!OracleRequests::<T>::contains_key(oracle_request_id),
				Error::<T>::DuplicateOracleRequest
			);

			OracleRequests::<T>::insert(
				oracle_request_id,
				OracleCorrelation {
					proxy_request_id: request.request_id,
					callback_gas_limit: request.callback_gas_limit,
				},
			);

			Self::deposit_event(Event::RandomWordsRequestReceived {
				request_id: request.request_id,
				oracle_request_id,
			});

			Ok(Pays::No.into())
		}

		/// Fulfillment of an oracle request, relayed back to the proxy.
		///
		/// Each oracle request can only be fulfilled once.
		#[pallet::call_index(1)]
		#[pallet::weight(T::WeightInfo::fulfill_random_words(random_words.len() as u32))]
		pub fn fulfill_random_words(
			origin: OriginFor<T>,
			oracle_request_id: OracleRequestId,
			random_words: Vec<RandomWord>,
		) -> DispatchResultWithPostInfo {
			T::OracleOrigin::ensure_origin(origin)?;
			log::trace!(target: LOG_TARGET, "Oracle fulfilled request {:?}", oracle_request_id);

			ensure!(!guard::is_locked::<OracleCallLock<T>>(), Error::<T>::Reentrancy);

			let OracleCorrelation { proxy_request_id, callback_gas_limit } =
				OracleRequests::<T>::take(oracle_request_id)
					.ok_or(Error::<T>::UnknownOracleRequest)?;
			ensure!(proxy_request_id != 0, Error::<T>::UnknownOracleRequest);

			let response =
				RelayResponse { request_id: proxy_request_id, random_words, callback_gas_limit };
			let required_gas = callback_gas_limit.saturating_add(T::ReceiveOverheadGas::get());

			let message_id = T::Transport::send(
				&T::Counterparty::get(),
				T::TransportFee::get(),
				required_gas,
				response.encode(),
			)
			.map_err(|e| {
				log::warn!(
					target: LOG_TARGET,
					"Failed to send response to request {}: {:?}",
					proxy_request_id,
					e
				);
				Error::<T>::TransportSendFailed
			})?;

			Self::deposit_event(Event::RandomWordsFulfilled {
				request_id: proxy_request_id,
				oracle_request_id,
				message_id,
			});

			Ok(Pays::No.into())
		}
	}
}

impl<T: Config> Pallet<T> {
	/// The account requesting randomness from the oracle.
	pub fn account_id() -> T::AccountId {
		T::PalletId::get().into_account_truncating()
	}

	/// The correlation tracked for an oracle request.
	pub fn oracle_correlation(oracle_request_id: OracleRequestId) -> Option<OracleCorrelation> {
		OracleRequests::<T>::get(oracle_request_id)
	}

	/// The callback gas limit given to the oracle for a request of `num_words` words.
	pub fn oracle_callback_gas(num_words: u32) -> Weight {
		T::OracleCallbackGasPerWord::get()
			.saturating_mul(num_words.into())
			.saturating_add(T::OracleCallbackBaseGas::get())
	}

	fn submit_to_oracle(request: &RelayRequest) -> Result<OracleRequestId, DispatchError> {
		guard::non_reentrant::<OracleCallLock<T>, _, _>(Error::<T>::Reentrancy.into(), || {
			T::Oracle::request_random_words(
				&Self::account_id(),
				request.key_hash,
				request.sub_id,
				request.min_confirmations,
				Self::oracle_callback_gas(request.num_words),
				request.num_words,
			)
			.map_err(|e| {
				log::warn!(
					target: LOG_TARGET,
					"Oracle refused request {}: {:?}",
					request.request_id,
					e
				);
				Error::<T>::OracleRequestFailed.into()
			})
		})
	}

	fn ensure_counterparty(source: &Endpoint<T::AccountId>) -> Result<(), Error<T>> {
		let counterparty = T::Counterparty::get();
		ensure!(source.chain == counterparty.chain, Error::<T>::InvalidSourceChain);
		ensure!(source.address == counterparty.address, Error::<T>::InvalidSourceAddress);
		Ok(())
	}
}

sp_api::decl_runtime_apis! {
	#[api_version(1)]
	pub trait RelayProviderApi<AccountId> where
		AccountId: Codec
	{
		/// The correlation tracked for an oracle request
		///
		/// See [`crate::Pallet::oracle_correlation`]
		fn oracle_correlation(oracle_request_id: OracleRequestId) -> Option<OracleCorrelation>;

		/// The account the provider requests randomness with
		///
		/// See [`crate::Pallet::account_id`]
		fn account_id() -> AccountId;
	}
}
