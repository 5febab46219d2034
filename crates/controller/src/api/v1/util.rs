// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use serde::{Deserialize, Deserializer};

/// Helper function to deserialize Option<Option<T>>
///
/// A missing field stays `None`, an explicit `null` becomes `Some(None)`.
/// See <https://github.com/serde-rs/serde/issues/984>
pub(super) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
