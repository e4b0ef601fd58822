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

//! XCM backed messaging between sibling chains.
//!
//! [`XcmTransport`] delivers relay payloads as a `Transact` into the counterparty's
//! `receive_message` call, and [`EnsureXcmEndpoint`] authenticates such deliveries on the
//! receiving side.

use crate::{CallIndex, Endpoint, MessageId, MessageTransport};
use alloc::{boxed::Box, vec, vec::Vec};
use codec::Encode;
use core::marker::PhantomData;
use frame_support::traits::{EnsureOrigin, Get, OriginTrait};
use frame_system::RawOrigin;
use sp_runtime::DispatchError;
use sp_weights::Weight;
use ::xcm::{
	v5::{
		prelude::{BuyExecution, OriginKind, Transact, WithdrawAsset, Xcm},
		Asset, Junction, Location,
		WeightLimit::Unlimited,
	},
	VersionedLocation, VersionedXcm,
};
use xcm_builder::SendController;

const LOG_TARGET: &str = "vrf-relay::xcm";

/// The sibling location of `chain`.
pub fn sibling_location(chain: u32) -> Location {
	Location::new(1, [Junction::Parachain(chain)])
}

/// Converts a sibling account location `(1, [Parachain(id), AccountId32 { .. }])` into an
/// [`Endpoint`].
pub fn endpoint_from_location<AccountId: From<[u8; 32]>>(
	location: &Location,
) -> Option<Endpoint<AccountId>> {
	match location.unpack() {
		(1, [Junction::Parachain(chain), Junction::AccountId32 { id, .. }]) =>
			Some(Endpoint::new(*chain, (*id).into())),
		_ => None,
	}
}

/// A [`MessageTransport`] that sends relay payloads over XCM.
///
/// The message withdraws and buys execution with `fee` units of the relay chain asset, then
/// transacts `(RemoteCallIndex, payload, required_gas)` on the destination chain with an
/// [`OriginKind::Xcm`] origin, which the destination resolves to the sending `Sender` account.
///
/// **Example definition**
/// ```nocompile
/// parameter_types! {
/// 	pub ProviderReceiveCall: CallIndex = [RELAY_PROVIDER_PALLET_INDEX, 0];
/// }
/// type Transport = XcmTransport<RuntimeOrigin, PolkadotXcm, RelayProxyAccount, ProviderReceiveCall>;
/// ```
pub struct XcmTransport<Origin, Controller, Sender, RemoteCallIndex>(
	PhantomData<(Origin, Controller, Sender, RemoteCallIndex)>,
);

impl<AccountId, Origin, Controller, Sender, RemoteCallIndex> MessageTransport<AccountId>
	for XcmTransport<Origin, Controller, Sender, RemoteCallIndex>
where
	Origin: From<RawOrigin<AccountId>>,
	Controller: SendController<Origin>,
	Sender: Get<AccountId>,
	RemoteCallIndex: Get<CallIndex>,
{
	type Fee = u128;

	fn send(
		destination: &Endpoint<AccountId>,
		fee: u128,
		required_gas: Weight,
		payload: Vec<u8>,
	) -> Result<MessageId, DispatchError> {
		let fee_asset: Asset = (Location::parent(), fee).into();
		let call = (RemoteCallIndex::get(), payload, required_gas).encode();

		let message: Xcm<()> = Xcm(vec![
			WithdrawAsset(fee_asset.clone().into()),
			BuyExecution { fees: fee_asset, weight_limit: Unlimited },
			Transact {
				origin_kind: OriginKind::Xcm,
				fallback_max_weight: Some(required_gas),
				call: call.into(),
			},
		]);

		let versioned_target: Box<VersionedLocation> =
			Box::new(VersionedLocation::V5(sibling_location(destination.chain)));
		let versioned_msg: Box<VersionedXcm<()>> = Box::new(VersionedXcm::V5(message));

		Controller::send(RawOrigin::Signed(Sender::get()).into(), versioned_target, versioned_msg)
			.inspect_err(|e| {
				log::warn!(target: LOG_TARGET, "Failed to send relay message: {:?}", e);
			})
	}
}

/// Ensures an origin is a `pallet_xcm` origin from a sibling account and yields it as an
/// [`Endpoint`].
///
/// **Example definition**
/// ```nocompile
/// type TransportOrigin = EnsureXcmEndpoint<AccountId>;
/// ```
pub struct EnsureXcmEndpoint<AccountId>(PhantomData<AccountId>);

impl<O, AccountId> EnsureOrigin<O> for EnsureXcmEndpoint<AccountId>
where
	O: OriginTrait,
	for<'a> &'a O::PalletsOrigin: TryInto<&'a pallet_xcm::Origin>,
	AccountId: From<[u8; 32]>,
{
	type Success = Endpoint<AccountId>;

	fn try_origin(outer: O) -> Result<Self::Success, O> {
		let endpoint = match outer.caller().try_into() {
			Ok(pallet_xcm::Origin::Xcm(location)) => endpoint_from_location(location),
			_ => None,
		};
		endpoint.ok_or(outer)
	}

	#[cfg(feature = "runtime-benchmarks")]
	fn try_successful_origin() -> Result<O, ()> {
		Err(())
	}
}
