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


//! A runtime hosting both ends of the relay. It does not contain any tests.

use frame_support::{
	construct_runtime, derive_impl, dispatch::DispatchResultWithPostInfo, ord_parameter_types,
	parameter_types, weights::Weight, PalletId,
};
use frame_system::{EnsureRoot, EnsureSignedBy};
use sp_runtime::{traits::IdentityLookup, AccountId32, BuildStorage};
use sp_vrf_relay::{
	test_utils::{
		deploy_contract, pallet_mock_transport, take_outbox, EnsureTransport, MockExecutor,
		MockOracle, MockTransport,
	},
	gas::max_callback_gas,
	ChainId, Endpoint, RandomWord,
};

type Block = frame_system::mocking::MockBlock<Test>;

construct_runtime!(
	pub enum Test
	{
		System: frame_system,
		Transport: pallet_mock_transport,
		RelayProxy: pallet_relay_proxy,
		RelayProvider: pallet_relay_provider,
	}
);

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Test {
	type Block = Block;
	type AccountId = AccountId32;
	type Lookup = IdentityLookup<Self::AccountId>;
}

impl pallet_mock_transport::Config for Test {}

pub const SUBNET: ChainId = 3000;
pub const SOURCE_CHAIN: ChainId = 2000;

/// The account the proxy sends from on the subnet.
pub const PROXY_ACCOUNT: AccountId32 = AccountId32::new([0xbb; 32]);
/// The account the provider sends from on the source chain.
pub const PROVIDER_ACCOUNT: AccountId32 = AccountId32::new([0xaa; 32]);
pub const ORACLE: AccountId32 = AccountId32::new([0xcc; 32]);

/// A consumer contract which completes with [`CONSUMER_GAS`].
pub const CONSUMER: AccountId32 = AccountId32::new([1u8; 32]);
/// A consumer contract which always reverts.
pub const REVERTING_CONSUMER: AccountId32 = AccountId32::new([2u8; 32]);

pub const CONSUMER_GAS: Weight = Weight::from_parts(60_000, 0);

parameter_types! {
	pub RelayProviderEndpoint: Endpoint<AccountId32> =
		Endpoint::new(SOURCE_CHAIN, PROVIDER_ACCOUNT);
	pub RelayProxyEndpoint: Endpoint<AccountId32> = Endpoint::new(SUBNET, PROXY_ACCOUNT);
	pub const RequestForwardingGas: Weight = Weight::from_parts(500_000_000, 32_768);
	pub const ReceiveOverheadGas: Weight = Weight::from_parts(50_000_000, 10_000);
	/// The largest callback gas limit the provider's delivery overhead can carry.
	pub MaxCallbackGasLimit: Weight = max_callback_gas(
		ReceiveOverheadGas::get()
			.saturating_sub(<() as pallet_relay_proxy::WeightInfo>::receive_message()),
	);
	pub const OracleCallbackBaseGas: Weight = Weight::from_parts(40_000_000, 4_096);
	pub const OracleCallbackGasPerWord: Weight = Weight::from_parts(50_000, 0);
	pub const RelayProviderPalletId: PalletId = PalletId(*b"vrf/rlay");
	pub const SubnetFee: u128 = 1_000;
	pub const SourceChainFee: u128 = 2_500;
}

ord_parameter_types! {
	pub const Oracle: AccountId32 = ORACLE;
}

impl pallet_relay_proxy::Config for Test {
	type RuntimeEvent = RuntimeEvent;
	type AdminOrigin = EnsureRoot<AccountId32>;
	type TransportOrigin = EnsureTransport;
	type Transport = MockTransport;
	type TransportFee = SubnetFee;
	type Counterparty = RelayProviderEndpoint;
	type RequestForwardingGas = RequestForwardingGas;
	type MaxCallbackGasLimit = MaxCallbackGasLimit;
	type CallbackExecutor = MockExecutor;
	type WeightInfo = ();
	#[cfg(feature = "runtime-benchmarks")]
	type BenchmarkHelper = BenchmarkHelper;
}

impl pallet_relay_provider::Config for Test {
	type RuntimeEvent = RuntimeEvent;
	type TransportOrigin = EnsureTransport;
	type Transport = MockTransport;
	type TransportFee = SourceChainFee;
	type Counterparty = RelayProxyEndpoint;
	type Oracle = MockOracle;
	type OracleOrigin = EnsureSignedBy<Oracle, AccountId32>;
	type PalletId = RelayProviderPalletId;
	type OracleCallbackBaseGas = OracleCallbackBaseGas;
	type OracleCallbackGasPerWord = OracleCallbackGasPerWord;
	type ReceiveOverheadGas = ReceiveOverheadGas;
	type WeightInfo = ();
	#[cfg(feature = "runtime-benchmarks")]
	type BenchmarkHelper = BenchmarkHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct BenchmarkHelper;

#[cfg(feature = "runtime-benchmarks")]
impl pallet_relay_proxy::BenchmarkHelper<AccountId32, RuntimeOrigin> for BenchmarkHelper {
	fn transport_origin(source: Endpoint<AccountId32>) -> RuntimeOrigin {
		source.into()
	}

	fn callback_target() -> AccountId32 {
		deploy_contract(CONSUMER, CONSUMER_GAS, false);
		CONSUMER
	}
}

#[cfg(feature = "runtime-benchmarks")]
impl pallet_relay_provider::BenchmarkHelper<AccountId32, RuntimeOrigin> for BenchmarkHelper {
	fn transport_origin(source: Endpoint<AccountId32>) -> RuntimeOrigin {
		source.into()
	}
}

/// Delivers every message sent so far to the pallet on its destination chain.
///
/// Returns the outcome of each delivery in sending order.
pub fn relay_messages() -> Vec<DispatchResultWithPostInfo> {
	take_outbox()
		.into_iter()
		.map(|message| match message.destination.chain {
			SOURCE_CHAIN => RelayProvider::receive_message(
				Endpoint::new(SUBNET, PROXY_ACCOUNT).into(),
				message.payload,
				message.required_gas,
			),
			_ => RelayProxy::receive_message(
				Endpoint::new(SOURCE_CHAIN, PROVIDER_ACCOUNT).into(),
				message.payload,
				message.required_gas,
			),
		})
		.collect()
}

/// The oracle fulfilling one of its requests.
pub fn oracle_fulfills(
	oracle_request_id: u32,
	random_words: Vec<RandomWord>,
) -> DispatchResultWithPostInfo {
	RelayProvider::fulfill_random_words(
		RuntimeOrigin::signed(ORACLE),
		oracle_request_id.into(),
		random_words,
	)
}

pub struct ExtBuilder;

impl ExtBuilder {
	pub fn build() -> sp_io::TestExternalities {
		let mut storage = frame_system::GenesisConfig::<Test>::default().build_storage().unwrap();
		pallet_relay_proxy::GenesisConfig::<Test> {
			initial_consumers: vec![CONSUMER, REVERTING_CONSUMER],
		}
		.assimilate_storage(&mut storage)
		.unwrap();

		deploy_contract(CONSUMER, CONSUMER_GAS, false);
		deploy_contract(REVERTING_CONSUMER, CONSUMER_GAS, true);

		let mut ext = sp_io::TestExternalities::new(storage);
		ext.execute_with(|| System::set_block_number(1));
		ext
	}
}
