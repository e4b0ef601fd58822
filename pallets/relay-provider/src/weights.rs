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

use frame_support::weights::Weight;

pub trait WeightInfo {
	fn receive_message() -> Weight;
	fn fulfill_random_words(n: u32) -> Weight;
}

impl WeightInfo for () {
	fn receive_message() -> Weight {
		Weight::from_parts(38_240_000, 3_541)
	}
	fn fulfill_random_words(n: u32) -> Weight {
		Weight::from_parts(27_180_000, 3_541)
			.saturating_add(Weight::from_parts(41_000, 0).saturating_mul(n.into()))
	}
}
