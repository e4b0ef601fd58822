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

//! Gas bounded calls into arbitrary accounts.
//!
//! [`GasBoundedCaller`] gives a callee exactly the requested amount of gas, never more, and
//! detects when the caller itself does not hold enough gas to make that promise. Gas is modelled
//! as [`Weight`] and the caller's remaining gas is tracked by a [`WeightMeter`].

use crate::{RandomWord, RequestId};
use alloc::vec::Vec;
use codec::Encode;
use core::marker::PhantomData;
use sp_weights::{Weight, WeightMeter};

/// Gas charged for the checks performed before the call itself.
pub const CALL_EXACT_CHECK_OVERHEAD: Weight = Weight::from_parts(5_000, 0);

/// A sub-call can be given at most `63/64` of the gas remaining at the call site.
pub const GAS_RETENTION_DIVISOR: u64 = 64;

/// Name of the fulfillment entry point consumers expose.
pub const FULFILL_ENTRY_POINT: &[u8] = b"fulfill_random_words";

/// The outcome of executing a call on behalf of a [`GasBoundedCaller`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
	/// Gas spent by the callee.
	pub gas_used: Weight,
	/// Whether the callee completed without reverting.
	pub success: bool,
}

/// Executes calls into accounts that may hold code.
///
/// Implementations must never let the callee spend more than `gas_limit`. A callee running out
/// of gas is reported as an unsuccessful outcome that used the whole limit.
pub trait GasLimitedExecutor<AccountId> {
	/// Whether `target` holds executable code.
	fn has_code(target: &AccountId) -> bool;

	/// Calls `target` with `input`, limited to `gas_limit`.
	fn execute(target: &AccountId, gas_limit: Weight, input: Vec<u8>) -> ExecutionOutcome;
}

/// Reasons a [`GasBoundedCaller`] refuses to make a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GasCallError {
	/// The remaining gas cannot cover the checks plus the requested amount.
	InsufficientGas,
	/// The target holds no code.
	NoCode,
}

/// Calls a target with an exact gas allowance.
///
/// Failures of the callee are not propagated: they are returned as `Ok(false)`. Only the two
/// conditions in [`GasCallError`] abort the caller.
pub struct GasBoundedCaller<Executor>(PhantomData<Executor>);

impl<Executor> GasBoundedCaller<Executor> {
	/// Calls `target` with exactly `gas_amount` gas, charging `meter` for the checks and for
	/// whatever the callee spent.
	pub fn call<AccountId>(
		meter: &mut WeightMeter,
		gas_amount: Weight,
		target: &AccountId,
		payload: Vec<u8>,
	) -> Result<bool, GasCallError>
	where
		Executor: GasLimitedExecutor<AccountId>,
	{
		meter
			.try_consume(CALL_EXACT_CHECK_OVERHEAD)
			.map_err(|_| GasCallError::InsufficientGas)?;

		if !forwardable(meter.remaining()).all_gte(gas_amount) {
			return Err(GasCallError::InsufficientGas);
		}

		if !Executor::has_code(target) {
			return Err(GasCallError::NoCode);
		}

		let outcome = Executor::execute(target, gas_amount, payload);
		meter.consume(outcome.gas_used.min(gas_amount));

		Ok(outcome.success)
	}
}

/// The largest allowance a sub-call can receive out of `remaining`.
pub fn forwardable(remaining: Weight) -> Weight {
	let retained = Weight::from_parts(
		remaining.ref_time() / GAS_RETENTION_DIVISOR,
		remaining.proof_size() / GAS_RETENTION_DIVISOR,
	);
	remaining.saturating_sub(retained)
}

/// The largest `gas_amount` a [`GasBoundedCaller`] can forward when the meter holds
/// `gas_amount + headroom`.
///
/// Of the headroom, [`CALL_EXACT_CHECK_OVERHEAD`] pays for the checks and the rest has to cover
/// the `1/64` retained from the remaining gas, which grows with `gas_amount`. Zero if the headroom
/// does not even cover the checks.
pub fn max_callback_gas(headroom: Weight) -> Weight {
	if !headroom.all_gte(CALL_EXACT_CHECK_OVERHEAD) {
		return Weight::zero();
	}
	let spare = headroom.saturating_sub(CALL_EXACT_CHECK_OVERHEAD);
	let retained = GAS_RETENTION_DIVISOR - 1;
	Weight::from_parts(
		spare.ref_time().saturating_add(1).saturating_mul(retained),
		spare.proof_size().saturating_add(1).saturating_mul(retained),
	)
}

/// The 4 byte selector of the consumer fulfillment entry point.
pub fn fulfill_selector() -> [u8; 4] {
	let hash = sp_io::hashing::blake2_256(FULFILL_ENTRY_POINT);
	[hash[0], hash[1], hash[2], hash[3]]
}

/// Builds the input of a consumer fulfillment call: the selector followed by the encoded
/// request id and random words.
pub fn fulfill_call_data(request_id: RequestId, random_words: &[RandomWord]) -> Vec<u8> {
	(fulfill_selector(), request_id, random_words).encode()
}
