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

//! A reentrancy guard backed by a boolean storage value.

use frame_support::storage::StorageValue;

/// Whether the guard `Lock` is currently held.
pub fn is_locked<Lock>() -> bool
where
	Lock: StorageValue<bool, Query = bool>,
{
	Lock::get()
}

/// Runs `f` while holding `Lock`, failing with `reentered` if the lock is already held.
///
/// The lock is released whatever `f` returns.
pub fn non_reentrant<Lock, R, E>(reentered: E, f: impl FnOnce() -> Result<R, E>) -> Result<R, E>
where
	Lock: StorageValue<bool, Query = bool>,
{
	if Lock::get() {
		return Err(reentered);
	}
	Lock::put(true);
	let result = f();
	Lock::kill();
	result
}
