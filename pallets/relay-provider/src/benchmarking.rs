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

//! Benchmarking setup for pallet-relay-provider

use super::*;
use crate::pallet::Pallet as RelayProvider;
use frame_benchmarking::v2::*;
use sp_core::{H256, U256};
use sp_std::vec;

#[benchmarks]
mod benchmarks {
	use super::*;

	#[benchmark]
	fn receive_message() {
		let origin = T::BenchmarkHelper::transport_origin(T::Counterparty::get());
		let payload = RelayRequest {
			request_id: 1,
			key_hash: H256::repeat_byte(1),
			sub_id: 1,
			min_confirmations: 3,
			callback_gas_limit: Weight::from_parts(100_000, 0),
			num_words: 1,
		}
		.encode();

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, payload, Weight::MAX);

		assert!(!OracleCallLock::<T>::get());
	}

	#[benchmark]
	fn fulfill_random_words(n: Linear<1, 500>) -> Result<(), BenchmarkError> {
		let origin =
			T::OracleOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
		let oracle_request_id = U256::from(42u32);
		OracleRequests::<T>::insert(
			oracle_request_id,
			OracleCorrelation {
				proxy_request_id: 1,
				callback_gas_limit: Weight::from_parts(100_000, 0),
			},
		);
		let random_words = vec![U256::MAX; n as usize];

		#[extrinsic_call]
		_(origin as T::RuntimeOrigin, oracle_request_id, random_words);

		assert!(OracleRequests::<T>::get(oracle_request_id).is_none());
		Ok(())
	}

	impl_benchmark_test_suite!(
		RelayProvider,
		crate::tests::mock::ExtBuilder::build(),
		crate::tests::mock::Test
	);
}
