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


//! End to end tests of the VRF relay.
//!
//! Both relay pallets live in a single test runtime. Messages the proxy and the provider hand to
//! the transport are shuttled to the other pallet by [`mock::relay_messages`], with the origin
//! and gas the real transport would deliver them under.

#![cfg(test)]

mod mock;
