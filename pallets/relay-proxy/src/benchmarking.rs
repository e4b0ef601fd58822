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

//! Benchmarking setup for pallet-relay-proxy

use super::*;
use crate::pallet::Pallet as RelayProxy;
use frame_benchmarking::v2::*;
use frame_system::RawOrigin;
use sp_core::U256;
use sp_std::vec;

#[benchmarks]
mod benchmarks {
	use super::*;

	#[benchmark]
	fn add_consumer() -> Result<(), BenchmarkError> {
		let origin =
			T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
		let consumer: T::AccountId = account("consumer", 0, 0);

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, consumer.clone());

		assert!(Consumers::<T>::contains_key(&consumer));
		Ok(())
	}

	#[benchmark]
	fn remove_consumer() -> Result<(), BenchmarkError> {
		let origin =
			T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
		let consumer: T::AccountId = account("consumer", 0, 0);
		Consumers::<T>::insert(&consumer, ());

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, consumer.clone());

		assert!(!Consumers::<T>::contains_key(&consumer));
		Ok(())
	}

	#[benchmark]
	fn request_random_words() {
		let requester: T::AccountId = whitelisted_caller();
		Consumers::<T>::insert(&requester, ());

		#[extrinsic_call]
		_(
			RawOrigin::Signed(requester.clone()),
			H256::repeat_byte(1),
			1,
			3,
			Weight::from_parts(100_000, 0),
			1,
		);

		assert_eq!(Requests::<T>::get(1), Some(requester));
	}

	#[benchmark]
	fn receive_message() {
		let requester = T::BenchmarkHelper::callback_target();
		Requests::<T>::insert(1, &requester);
		let origin = T::BenchmarkHelper::transport_origin(T::Counterparty::get());
		// the callback itself is paid for by the requester's gas limit
		let payload = RelayResponse {
			request_id: 1,
			random_words: vec![U256::MAX; 10],
			callback_gas_limit: Weight::zero(),
		}
		.encode();

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, payload, Weight::MAX);

		assert_eq!(Requests::<T>::get(1), None);
	}

	impl_benchmark_test_suite!(
		RelayProxy,
		crate::tests::mock::ExtBuilder::build(),
		crate::tests::mock::Test
	);
}
