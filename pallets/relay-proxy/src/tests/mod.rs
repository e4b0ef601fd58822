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


use crate::{Consumers, Error, Event, Nonce, Requests};
use codec::Encode;
use frame_support::{assert_noop, assert_ok, weights::Weight};
use mock::*;
use sp_core::{H256, U256};
use sp_runtime::{traits::BadOrigin, ArithmeticError};
use sp_vrf_relay::{
	gas::{fulfill_call_data, CALL_EXACT_CHECK_OVERHEAD},
	test_utils::{take_executed_calls, take_outbox, ExecutedCall, TransportFails},
	RandomnessCoordinator, RelayRequest, RelayResponse, RequestId,
};

const KEY_HASH: H256 = H256::repeat_byte(0x11);
const SUB_ID: u64 = 7;
const MIN_CONFIRMATIONS: u16 = 3;
const CALLBACK_GAS: Weight = Weight::from_parts(100_000, 0);
/// Enough for the bookkeeping, the check overhead and any callback used below.
const DELIVERY_GAS: Weight = Weight::from_parts(50_000_000, 10_000);

fn request_from(who: sp_runtime::AccountId32) -> Result<(), sp_runtime::DispatchError> {
	RelayProxy::request_random_words(
		RuntimeOrigin::signed(who),
		KEY_HASH,
		SUB_ID,
		MIN_CONFIRMATIONS,
		CALLBACK_GAS,
		1,
	)
}

fn response(request_id: RequestId, words: &[u32], callback_gas_limit: Weight) -> Vec<u8> {
	RelayResponse {
		request_id,
		random_words: words.iter().map(|w| U256::from(*w)).collect(),
		callback_gas_limit,
	}
	.encode()
}

#[test]
fn add_consumer_requires_admin() {
	ExtBuilder::build().execute_with(|| {
		assert_noop!(RelayProxy::add_consumer(RuntimeOrigin::signed(ALICE), BOB), BadOrigin);
		assert!(!RelayProxy::is_consumer(&BOB));
	});
}

#[test]
fn add_consumer_emits_event_once() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(RelayProxy::add_consumer(RuntimeOrigin::root(), BOB));
		assert!(RelayProxy::is_consumer(&BOB));
		System::assert_last_event(Event::<Test>::ConsumerAdded { consumer: BOB }.into());
		let events = System::events().len();

		// adding twice is a no-op
		assert_ok!(RelayProxy::add_consumer(RuntimeOrigin::root(), BOB));
		assert!(RelayProxy::is_consumer(&BOB));
		assert_eq!(System::events().len(), events);
	});
}

#[test]
fn remove_consumer_works() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(RelayProxy::remove_consumer(RuntimeOrigin::root(), ALICE));
		assert!(!Consumers::<Test>::contains_key(ALICE));
		System::assert_last_event(Event::<Test>::ConsumerRemoved { consumer: ALICE }.into());
	});
}

#[test]
fn remove_unknown_consumer_fails() {
	ExtBuilder::build().execute_with(|| {
		assert_noop!(
			RelayProxy::remove_consumer(RuntimeOrigin::root(), BOB),
			Error::<Test>::ConsumerNotFound
		);
		assert_noop!(RelayProxy::remove_consumer(RuntimeOrigin::signed(ALICE), ALICE), BadOrigin);
	});
}

#[test]
fn genesis_seeds_the_allowlist() {
	ExtBuilder::build_with_consumers(vec![BOB]).execute_with(|| {
		assert!(RelayProxy::is_consumer(&BOB));
		assert!(!RelayProxy::is_consumer(&ALICE));
	});
}

#[test]
fn request_requires_allowlisted_caller() {
	ExtBuilder::build().execute_with(|| {
		assert_noop!(request_from(BOB), Error::<Test>::Unauthorized);

		assert_ok!(RelayProxy::add_consumer(RuntimeOrigin::root(), BOB));
		assert_ok!(request_from(BOB));

		assert_ok!(RelayProxy::remove_consumer(RuntimeOrigin::root(), BOB));
		assert_noop!(request_from(BOB), Error::<Test>::Unauthorized);
	});
}

#[test]
fn callback_gas_limit_is_capped() {
	ExtBuilder::build().execute_with(|| {
		let request_with = |callback_gas_limit| {
			RelayProxy::request_random_words(
				RuntimeOrigin::signed(ALICE),
				KEY_HASH,
				SUB_ID,
				MIN_CONFIRMATIONS,
				callback_gas_limit,
				1,
			)
		};

		assert_noop!(
			request_with(MAX_CALLBACK_GAS.saturating_add(Weight::from_parts(1, 0))),
			Error::<Test>::CallbackGasLimitTooHigh
		);
		assert_noop!(
			request_with(MAX_CALLBACK_GAS.saturating_add(Weight::from_parts(0, 1))),
			Error::<Test>::CallbackGasLimitTooHigh
		);
		assert!(take_outbox().is_empty());

		assert_ok!(request_with(MAX_CALLBACK_GAS));
		assert_eq!(
			take_outbox().pop().and_then(|m| m.decode::<RelayRequest>()).map(|r| r.callback_gas_limit),
			Some(MAX_CALLBACK_GAS)
		);
	});
}

#[test]
fn request_ids_are_sequential_from_one() {
	ExtBuilder::build().execute_with(|| {
		assert_eq!(RelayProxy::last_request_id(), 0);
		for expected in 1..=5u64 {
			assert_ok!(request_from(ALICE));
			assert_eq!(RelayProxy::last_request_id(), expected);
			assert_eq!(RelayProxy::pending_request(expected), Some(ALICE));
		}
		assert_eq!(take_outbox().len(), 5);
	});
}

#[test]
fn request_is_forwarded_to_the_provider() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(RelayProxy::request_random_words(
			RuntimeOrigin::signed(ALICE),
			KEY_HASH,
			SUB_ID,
			MIN_CONFIRMATIONS,
			CALLBACK_GAS,
			4,
		));

		let sent = take_outbox();
		assert_eq!(sent.len(), 1);
		let message = &sent[0];
		assert_eq!(message.destination, RelayProvider::get());
		assert_eq!(message.fee, TRANSPORT_FEE);
		// forwarding gas does not depend on the callback gas limit
		assert_eq!(message.required_gas, RequestForwardingGas::get());
		assert_eq!(
			message.decode::<RelayRequest>(),
			Some(RelayRequest {
				request_id: 1,
				key_hash: KEY_HASH,
				sub_id: SUB_ID,
				min_confirmations: MIN_CONFIRMATIONS,
				callback_gas_limit: CALLBACK_GAS,
				num_words: 4,
			})
		);

		let message_id = match System::events().last().map(|r| r.event.clone()) {
			Some(RuntimeEvent::RelayProxy(Event::RandomWordsRequested {
				request_id: 1,
				requester,
				message_id,
			})) if requester == ALICE => message_id,
			other => panic!("unexpected event: {:?}", other),
		};
		assert_ne!(message_id, [0u8; 32]);
	});
}

#[test]
fn failed_forwarding_leaves_no_trace() {
	ExtBuilder::build().execute_with(|| {
		TransportFails::set(true);
		assert_noop!(request_from(ALICE), Error::<Test>::TransportSendFailed);
		assert_eq!(RelayProxy::last_request_id(), 0);

		TransportFails::set(false);
		assert_ok!(request_from(ALICE));
		assert_eq!(RelayProxy::last_request_id(), 1);
	});
}

#[test]
fn nonce_overflow_is_rejected() {
	ExtBuilder::build().execute_with(|| {
		Nonce::<Test>::put(u64::MAX);
		assert_noop!(request_from(ALICE), ArithmeticError::Overflow);
	});
}

#[test]
fn other_pallets_can_request_through_the_coordinator_interface() {
	ExtBuilder::build().execute_with(|| {
		let id = <RelayProxy as RandomnessCoordinator<_, RequestId>>::request_random_words(
			&ALICE,
			KEY_HASH,
			SUB_ID,
			MIN_CONFIRMATIONS,
			CALLBACK_GAS,
			2,
		);
		assert_eq!(id, Ok(1));
		assert_eq!(Requests::<Test>::get(1), Some(ALICE));

		// no dispatchable around it, the failure still rolls everything back
		TransportFails::set(true);
		let id = <RelayProxy as RandomnessCoordinator<_, RequestId>>::request_random_words(
			&ALICE,
			KEY_HASH,
			SUB_ID,
			MIN_CONFIRMATIONS,
			CALLBACK_GAS,
			2,
		);
		assert_eq!(id, Err(Error::<Test>::TransportSendFailed.into()));
		assert_eq!(RelayProxy::last_request_id(), 1);
		assert_eq!(Requests::<Test>::get(2), None);
	});
}

#[test]
fn delivery_calls_the_requester_with_exact_gas() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(ALICE));

		assert_ok!(RelayProxy::receive_message(
			provider_delivery(),
			response(1, &[7777], CALLBACK_GAS),
			DELIVERY_GAS
		));

		assert_eq!(
			take_executed_calls(),
			vec![ExecutedCall {
				target: ALICE,
				gas_limit: CALLBACK_GAS,
				input: fulfill_call_data(1, &[U256::from(7777u32)]),
			}]
		);
		assert_eq!(RelayProxy::pending_request(1), None);
		System::assert_last_event(
			Event::<Test>::RandomWordsFulfilled { request_id: 1, requester: ALICE, success: true }
				.into(),
		);
	});
}

#[test]
fn delivery_reports_actual_gas() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(ALICE));

		let post_info = RelayProxy::receive_message(
			provider_delivery(),
			response(1, &[1, 2], CALLBACK_GAS),
			DELIVERY_GAS,
		)
		.unwrap();

		let expected = <() as crate::WeightInfo>::receive_message()
			.saturating_add(CALL_EXACT_CHECK_OVERHEAD)
			.saturating_add(CONSUMER_GAS);
		assert_eq!(post_info.actual_weight, Some(expected));
	});
}

#[test]
fn failing_callback_still_completes_delivery() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(DAVE));

		assert_ok!(RelayProxy::receive_message(
			provider_delivery(),
			response(1, &[42], CALLBACK_GAS),
			DELIVERY_GAS
		));

		assert_eq!(RelayProxy::pending_request(1), None);
		System::assert_last_event(
			Event::<Test>::RandomWordsFulfilled { request_id: 1, requester: DAVE, success: false }
				.into(),
		);
	});
}

#[test]
fn callback_needing_more_gas_than_allowed_fails_softly() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(ALICE));
		let tight = Weight::from_parts(CONSUMER_GAS.ref_time() - 1, 0);

		assert_ok!(RelayProxy::receive_message(
			provider_delivery(),
			response(1, &[42], tight),
			DELIVERY_GAS
		));

		// the consumer got exactly what it asked for, and ran out of it
		let calls = take_executed_calls();
		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0].gas_limit, tight);
		System::assert_last_event(
			Event::<Test>::RandomWordsFulfilled { request_id: 1, requester: ALICE, success: false }
				.into(),
		);
	});
}

#[test]
fn replayed_delivery_is_rejected() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(ALICE));
		let payload = response(1, &[7777], CALLBACK_GAS);

		assert_ok!(RelayProxy::receive_message(provider_delivery(), payload.clone(), DELIVERY_GAS));
		assert_noop!(
			RelayProxy::receive_message(provider_delivery(), payload, DELIVERY_GAS),
			Error::<Test>::UnknownRequest
		);
		assert_eq!(take_executed_calls().len(), 1);
	});
}

#[test]
fn delivery_for_unknown_request_is_rejected() {
	ExtBuilder::build().execute_with(|| {
		assert_noop!(
			RelayProxy::receive_message(
				provider_delivery(),
				response(0, &[1], CALLBACK_GAS),
				DELIVERY_GAS
			),
			Error::<Test>::UnknownRequest
		);
		assert_noop!(
			RelayProxy::receive_message(
				provider_delivery(),
				response(9, &[1], CALLBACK_GAS),
				DELIVERY_GAS
			),
			Error::<Test>::UnknownRequest
		);
	});
}

#[test]
fn delivery_is_authenticated() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(ALICE));
		let payload = response(1, &[7777], CALLBACK_GAS);

		assert_noop!(
			RelayProxy::receive_message(
				RuntimeOrigin::signed(PROVIDER),
				payload.clone(),
				DELIVERY_GAS
			),
			BadOrigin
		);
		assert_noop!(
			RelayProxy::receive_message(
				delivery_from(PROVIDER_CHAIN + 1, PROVIDER),
				payload.clone(),
				DELIVERY_GAS
			),
			Error::<Test>::InvalidSourceChain
		);
		assert_noop!(
			RelayProxy::receive_message(
				delivery_from(PROVIDER_CHAIN, BOB),
				payload.clone(),
				DELIVERY_GAS
			),
			Error::<Test>::InvalidSourceAddress
		);
		// an unauthenticated payload is never looked at
		assert_noop!(
			RelayProxy::receive_message(delivery_from(PROVIDER_CHAIN, BOB), vec![], DELIVERY_GAS),
			Error::<Test>::InvalidSourceAddress
		);

		assert!(take_executed_calls().is_empty());
		assert_eq!(RelayProxy::pending_request(1), Some(ALICE));
	});
}

#[test]
fn malformed_payload_is_rejected() {
	ExtBuilder::build().execute_with(|| {
		assert_noop!(
			RelayProxy::receive_message(provider_delivery(), vec![1, 2, 3], DELIVERY_GAS),
			Error::<Test>::InvalidPayload
		);
	});
}

#[test]
fn insufficient_gas_aborts_delivery() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(ALICE));
		let bookkeeping = <() as crate::WeightInfo>::receive_message();

		// not even enough for the pallet's own bookkeeping
		assert_noop!(
			RelayProxy::receive_message(
				provider_delivery(),
				response(1, &[1], CALLBACK_GAS),
				Weight::zero()
			),
			Error::<Test>::InsufficientGas
		);

		// enough for the callback, but not for the check overhead on top of it
		let gas_limit = bookkeeping.saturating_add(CALLBACK_GAS);
		assert_noop!(
			RelayProxy::receive_message(
				provider_delivery(),
				response(1, &[1], CALLBACK_GAS),
				gas_limit
			),
			Error::<Test>::InsufficientGas
		);

		// the consumer was never reached and the request is still outstanding
		assert!(take_executed_calls().is_empty());
		assert_eq!(RelayProxy::pending_request(1), Some(ALICE));
	});
}

#[test]
fn requester_without_code_aborts_delivery() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(CHARLIE));

		assert_noop!(
			RelayProxy::receive_message(
				provider_delivery(),
				response(1, &[1], CALLBACK_GAS),
				DELIVERY_GAS
			),
			Error::<Test>::CallbackTargetHasNoCode
		);
		assert_eq!(RelayProxy::pending_request(1), Some(CHARLIE));
	});
}

#[test]
fn removed_consumer_still_receives_pending_words() {
	ExtBuilder::build().execute_with(|| {
		assert_ok!(request_from(ALICE));
		assert_ok!(RelayProxy::remove_consumer(RuntimeOrigin::root(), ALICE));

		assert_ok!(RelayProxy::receive_message(
			provider_delivery(),
			response(1, &[5], CALLBACK_GAS),
			DELIVERY_GAS
		));
		System::assert_last_event(
			Event::<Test>::RandomWordsFulfilled { request_id: 1, requester: ALICE, success: true }
				.into(),
		);
	});
}
