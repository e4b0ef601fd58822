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
	fn add_consumer() -> Weight;
	fn remove_consumer() -> Weight;
	fn request_random_words() -> Weight;
	/// Bookkeeping of a response delivery, excluding the consumer callback.
	fn receive_message() -> Weight;
}

impl WeightInfo for () {
	fn add_consumer() -> Weight {
		Weight::from_parts(9_420_000, 3_507)
	}
	fn remove_consumer() -> Weight {
		Weight::from_parts(9_870_000, 3_507)
	}
	fn request_random_words() -> Weight {
		Weight::from_parts(24_310_000, 3_507)
	}
	fn receive_message() -> Weight {
		Weight::from_parts(21_650_000, 3_529)
	}
}
