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

//! # Relay Proxy Pallet
//!
//! Gives a chain without native verifiable randomness access to a randomness oracle living on
//! another chain. Local consumers request random words from this pallet; the request is
//! forwarded to the relay provider pallet on the source chain, and once the oracle fulfills it
//! the random words come back and are delivered to the original requester.
//!
//! ## Request Lifecycle
#![doc = simple_mermaid::mermaid!("../docs/mermaid/request_lifecycle.mmd")]
//!
//! ### Consumers
//!
//! Only accounts in the consumer allowlist may request randomness. The allowlist is managed by
//! [`Config::AdminOrigin`] and can be seeded at genesis.
//!
//! ### Delivery
//!
//! Responses are only accepted from the configured [`Config::Counterparty`], as verified by
//! [`Config::TransportOrigin`]. The requester is called through
//! [`GasBoundedCaller`](sp_vrf_relay::GasBoundedCaller) with exactly the callback gas limit it
//! asked for. A failing consumer does not abort the delivery: the request is considered
//! delivered and the failure is reported in [`Event::RandomWordsFulfilled`].
//!
//! Consumers receive the call data built by [`sp_vrf_relay::gas::fulfill_call_data`], i.e. a
//! `fulfill_random_words(request_id: u64, random_words: Vec<U256>)` message.
//!
//! ### Storage Items
//!
//! - `Nonce`: the last assigned request id.
//! - `Requests`: outstanding requests, keyed by request id.
//! - `Consumers`: the consumer allowlist.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(test)]
mod tests;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;

pub mod weights;

use codec::{Codec, Encode};
use frame_support::{
	dispatch::DispatchResultWithPostInfo,
	pallet_prelude::{
		ensure, Blake2_128Concat, BuildGenesisConfig, DispatchError, DispatchResult, EnsureOrigin,
		Get, IsType, OptionQuery, Pays, StorageMap, StorageValue, Twox64Concat, ValueQuery, Weight,
	},
	storage::with_storage_layer,
	weights::WeightMeter,
};
use frame_system::{ensure_signed, pallet_prelude::OriginFor};
use sp_core::H256;
use sp_runtime::ArithmeticError;
use sp_std::vec::Vec;
use sp_vrf_relay::{
	decode_payload,
	gas::{fulfill_call_data, GasBoundedCaller, GasCallError, GasLimitedExecutor},
	Endpoint, MessageId, MessageTransport, RandomnessCoordinator, RelayRequest, RelayResponse,
	RequestId,
};

pub use pallet::*;
pub use weights::WeightInfo;

const LOG_TARGET: &str = "pallet-relay-proxy";

/// The fee type of the configured transport.
pub type TransportFeeOf<T> = <<T as Config>::Transport as MessageTransport<
	<T as frame_system::Config>::AccountId,
>>::Fee;

/// Hooks for setting up benchmarks in a concrete runtime.
#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AccountId, Origin> {
	/// An origin [`Config::TransportOrigin`] resolves to `source`.
	fn transport_origin(source: Endpoint<AccountId>) -> Origin;
	/// An account able to receive fulfillment calls.
	fn callback_target() -> AccountId;
}

#[frame_support::pallet]
pub mod pallet {
	use super::*;

	#[pallet::config]
	pub trait Config: frame_system::Config {
		/// The overarching event type
		type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

		/// The origin allowed to manage the consumer allowlist.
		type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

		/// The origin of inbound messages, resolving to the verified source of the message.
		///
		/// **Example definition**
		/// ```nocompile
		/// type TransportOrigin = sp_vrf_relay::xcm::EnsureXcmEndpoint<AccountId>;
		/// ```
		type TransportOrigin: EnsureOrigin<Self::RuntimeOrigin, Success = Endpoint<Self::AccountId>>;

		/// Sends requests to the relay provider.
		type Transport: MessageTransport<Self::AccountId>;

		/// The fee paid to the transport for every forwarded request.
		type TransportFee: Get<TransportFeeOf<Self>>;

		/// The relay provider this proxy talks to. Responses from anywhere else are rejected.
		///
		/// **Example definition**
		/// ```nocompile
		/// parameter_types! {
		/// 	pub RelayProvider: Endpoint<AccountId> = Endpoint::new(SOURCE_CHAIN_ID, PROVIDER_ACCOUNT);
		/// }
		/// ```
		#[pallet::constant]
		type Counterparty: Get<Endpoint<Self::AccountId>>;

		/// Gas reserved for the provider's request handler. It does not depend on the
		/// requester's callback gas limit.
		#[pallet::constant]
		type RequestForwardingGas: Get<Weight>;

		/// The largest callback gas limit a request may ask for.
		///
		/// A delivery only carries the provider's `ReceiveOverheadGas` on top of the callback gas
		/// limit, so this must not exceed
		/// `max_callback_gas(ReceiveOverheadGas - WeightInfo::receive_message())`
		/// ([`sp_vrf_relay::gas::max_callback_gas`]). Larger limits could never be delivered.
		///
		/// **Example definition**
		/// ```nocompile
		/// parameter_types! {
		/// 	pub MaxCallbackGasLimit: Weight = max_callback_gas(
		/// 		RECEIVE_OVERHEAD_GAS.saturating_sub(<RelayProxyWeights as WeightInfo>::receive_message()),
		/// 	);
		/// }
		/// ```
		#[pallet::constant]
		type MaxCallbackGasLimit: Get<Weight>;

		/// Executes the fulfillment callbacks of consumers.
		type CallbackExecutor: GasLimitedExecutor<Self::AccountId>;

		// The weight information for this pallet.
		type WeightInfo: WeightInfo;

		#[cfg(feature = "runtime-benchmarks")]
		type BenchmarkHelper: BenchmarkHelper<Self::AccountId, Self::RuntimeOrigin>;
	}

	#[pallet::pallet]
	pub struct Pallet<T>(_);

	/// The last assigned request id. The first request gets id `1`.
	#[pallet::storage]
	pub(crate) type Nonce<T: Config> = StorageValue<_, RequestId, ValueQuery>;

	/// Outstanding requests and the accounts that made them.
	#[pallet::storage]
	pub(crate) type Requests<T: Config> =
		StorageMap<_, Twox64Concat, RequestId, T::AccountId, OptionQuery>;

	/// Accounts allowed to request randomness.
	#[pallet::storage]
	pub(crate) type Consumers<T: Config> =
		StorageMap<_, Blake2_128Concat, T::AccountId, (), OptionQuery>;

	#[pallet::genesis_config]
	#[derive(frame_support::DefaultNoBound)]
	pub struct GenesisConfig<T: Config> {
		/// Accounts allowed to request randomness from genesis on.
		pub initial_consumers: Vec<T::AccountId>,
	}

	#[pallet::genesis_build]
	impl<T: Config> BuildGenesisConfig for GenesisConfig<T> {
		fn build(&self) {
			for consumer in &self.initial_consumers {
				Consumers::<T>::insert(consumer, ());
			}
		}
	}

	#[pallet::event]
	#[pallet::generate_deposit(pub(super) fn deposit_event)]
	pub enum Event<T: Config> {
		/// An account was added to the consumer allowlist.
		ConsumerAdded { consumer: T::AccountId },
		/// An account was removed from the consumer allowlist.
		ConsumerRemoved { consumer: T::AccountId },
		/// A request was assigned an id and forwarded to the relay provider.
		RandomWordsRequested {
			request_id: RequestId,
			requester: T::AccountId,
			message_id: MessageId,
		},
		/// Random words were delivered to the requester. `success` is false if the requester's
		/// callback failed.
		RandomWordsFulfilled { request_id: RequestId, requester: T::AccountId, success: bool },
	}

	#[pallet::error]
	#[derive(PartialEq)]
	pub enum Error<T> {
		/// The caller is not in the consumer allowlist.
		Unauthorized,
		/// The account is not in the consumer allowlist.
		ConsumerNotFound,
		/// The message did not come from the relay provider's chain.
		InvalidSourceChain,
		/// The message did not come from the relay provider's account.
		InvalidSourceAddress,
		/// The message payload is not a valid response.
		InvalidPayload,
		/// No outstanding request has this id.
		UnknownRequest,
		/// The gas available to the delivery cannot cover the requester's callback.
		InsufficientGas,
		/// The requester holds no code to call back into.
		CallbackTargetHasNoCode,
		/// The transport refused the request.
		TransportSendFailed,
		/// The callback gas limit exceeds [`Config::MaxCallbackGasLimit`].
		CallbackGasLimitTooHigh,
	}

	#[pallet::call]
	impl<T: Config> Pallet<T> {
		/// Allows `consumer` to request randomness.
		///
		/// Adding an account that is already allowed is a no-op.
		#[pallet::call_index(0)]
		#[pallet::weight(T::WeightInfo::add_consumer())]
		pub fn add_consumer(origin: OriginFor<T>, consumer: T::AccountId) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;

			if Consumers::<T>::contains_key(&consumer) {
				return Ok(());
			}

			Consumers::<T>::insert(&consumer, ());
			Self::deposit_event(Event::ConsumerAdded { consumer });

			Ok(())
		}

		/// Revokes `consumer`'s permission to request randomness.
		///
		/// Requests the consumer already made are still delivered.
		#[pallet::call_index(1)]
		#[pallet::weight(T::WeightInfo::remove_consumer())]
		pub fn remove_consumer(origin: OriginFor<T>, consumer: T::AccountId) -> DispatchResult {
			T::AdminOrigin::ensure_origin(origin)?;

			ensure!(Consumers::<T>::contains_key(&consumer), Error::<T>::ConsumerNotFound);

			Consumers::<T>::remove(&consumer);
			Self::deposit_event(Event::ConsumerRemoved { consumer });

			Ok(())
		}

		/// Requests `num_words` random words from the remote oracle.
		///
		/// * `key_hash`: the oracle proving key to use
		/// * `sub_id`: the oracle subscription paying for the request
		/// * `min_confirmations`: confirmations the oracle waits for
		/// * `callback_gas_limit`: gas the caller is given when the words are delivered
		/// * `num_words`: number of random words
		#[pallet::call_index(2)]
		#[pallet::weight(T::WeightInfo::request_random_words())]
		pub fn request_random_words(
			origin: OriginFor<T>,
			key_hash: H256,
			sub_id: u64,
			min_confirmations: u16,
			callback_gas_limit: Weight,
			num_words: u32,
		) -> DispatchResult {
			let requester = ensure_signed(origin)?;

			Self::do_request_random_words(
				&requester,
				key_hash,
				sub_id,
				min_confirmations,
				callback_gas_limit,
				num_words,
			)?;

			Ok(())
		}

		/// Inbound delivery of a [`RelayResponse`] from the relay provider.
		///
		/// `gas_limit` is the gas the transport made available to this call. It has to cover the
		/// pallet's own bookkeeping plus the requester's callback gas limit.
		#[pallet::call_index(3)]
		#[pallet::weight(T::WeightInfo::receive_message().max(*gas_limit))]
		#[allow(clippy::useless_conversion)]
		pub fn receive_message(
			origin: OriginFor<T>,
			payload: Vec<u8>,
			gas_limit: Weight,
		) -> DispatchResultWithPostInfo {
			let source = T::TransportOrigin::ensure_origin(origin)?;
			log::trace!(target: LOG_TARGET, "Message received from {:?}", source);

			Self::ensure_counterparty(&source)?;

			let mut meter = WeightMeter::with_limit(gas_limit);
			meter
				.try_consume(T::WeightInfo::receive_message())
				.map_err(|_| Error::<T>::InsufficientGas)?;

			let RelayResponse { request_id, random_words, callback_gas_limit } =
				decode_payload::<RelayResponse>(&payload).ok_or(Error::<T>::InvalidPayload)?;

			let requester = Requests::<T>::take(request_id).ok_or(Error::<T>::UnknownRequest)?;

			let success = GasBoundedCaller::<T::CallbackExecutor>::call(
				&mut meter,
				callback_gas_limit,
				&requester,
				fulfill_call_data(request_id, &random_words),
			)
			.map_err(Error::<T>::from)?;

			if !success {
				log::debug!(
					target: LOG_TARGET,
					"Fulfillment callback of request {} failed in {:?}",
					request_id,
					requester
				);
			}

			Self::deposit_event(Event::RandomWordsFulfilled { request_id, requester, success });

			Ok((Some(meter.consumed()), Pays::No).into())
		}
	}
}

impl<T: Config> Pallet<T> {
	/// Assigns a request id and forwards the request to the relay provider.
	///
	/// All storage changes are reverted if forwarding fails, so this can be called from outside
	/// a dispatchable.
	pub fn do_request_random_words(
		requester: &T::AccountId,
		key_hash: H256,
		sub_id: u64,
		min_confirmations: u16,
		callback_gas_limit: Weight,
		num_words: u32,
	) -> Result<RequestId, DispatchError> {
		with_storage_layer(|| {
			ensure!(Self::is_consumer(requester), Error::<T>::Unauthorized);
			ensure!(
				T::MaxCallbackGasLimit::get().all_gte(callback_gas_limit),
				Error::<T>::CallbackGasLimitTooHigh
			);

			let request_id = Nonce::<T>::try_mutate(|nonce| -> Result<RequestId, DispatchError> {
				*nonce = nonce.checked_add(1).ok_or(ArithmeticError::Overflow)?;
				Ok(*nonce)
			})?;
			Requests::<T>::insert(request_id, requester);

			let request = RelayRequest {
				request_id,
				key_hash,
				sub_id,
				min_confirmations,
				callback_gas_limit,
				num_words,
			};
			log::trace!(target: LOG_TARGET, "Forwarding request: {:?}", request);

			let message_id = T::Transport::send(
				&T::Counterparty::get(),
				T::TransportFee::get(),
				T::RequestForwardingGas::get(),
				request.encode(),
			)
			.map_err(|e| {
				log::warn!(target: LOG_TARGET, "Failed to forward request {}: {:?}", request_id, e);
				Error::<T>::TransportSendFailed
			})?;

			Self::deposit_event(Event::RandomWordsRequested {
				request_id,
				requester: requester.clone(),
				message_id,
			});

			Ok(request_id)
		})
	}

	/// The requester of an outstanding request.
	pub fn pending_request(request_id: RequestId) -> Option<T::AccountId> {
		Requests::<T>::get(request_id)
	}

	/// Whether `who` may request randomness.
	pub fn is_consumer(who: &T::AccountId) -> bool {
		Consumers::<T>::contains_key(who)
	}

	/// The id assigned to the most recent request, `0` if there was none.
	pub fn last_request_id() -> RequestId {
		Nonce::<T>::get()
	}

	fn ensure_counterparty(source: &Endpoint<T::AccountId>) -> Result<(), Error<T>> {
		let counterparty = T::Counterparty::get();
		ensure!(source.chain == counterparty.chain, Error::<T>::InvalidSourceChain);
		ensure!(source.address == counterparty.address, Error::<T>::InvalidSourceAddress);
		Ok(())
	}
}

impl<T> From<GasCallError> for Error<T> {
	fn from(err: GasCallError) -> Self {
		match err {
			GasCallError::InsufficientGas => Error::InsufficientGas,
			GasCallError::NoCode => Error::CallbackTargetHasNoCode,
		}
	}
}

/// Pallets on this chain can request randomness from the proxy exactly as they would from a
/// local oracle.
impl<T: Config> RandomnessCoordinator<T::AccountId, RequestId> for Pallet<T> {
	fn request_random_words(
		requester: &T::AccountId,
		key_hash: H256,
		sub_id: u64,
		min_confirmations: u16,
		callback_gas_limit: Weight,
		num_words: u32,
	) -> Result<RequestId, DispatchError> {
		Self::do_request_random_words(
			requester,
			key_hash,
			sub_id,
			min_confirmations,
			callback_gas_limit,
			num_words,
		)
	}
}

sp_api::decl_runtime_apis! {
	#[api_version(1)]
	pub trait RelayProxyApi<AccountId> where
		AccountId: Codec
	{
		/// The requester of an outstanding request
		///
		/// See [`crate::Pallet::pending_request`]
		fn pending_request(request_id: RequestId) -> Option<AccountId>;

		/// Whether an account may request randomness
		///
		/// See [`crate::Pallet::is_consumer`]
		fn is_consumer(who: AccountId) -> bool;

		/// The most recently assigned request id
		///
		/// See [`crate::Pallet::last_request_id`]
		fn last_request_id() -> RequestId;
	}
}
