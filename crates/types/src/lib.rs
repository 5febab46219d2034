// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Data types for Gathr.
//!
//! This crate contains the identifier types that are shared between the
//! storage layer and the web API. Every identifier is a newtype around a
//! [`uuid::Uuid`] with diesel, serde and [`std::str::FromStr`] support, so it can be
//! used as a path segment, a JSON value and a database column alike.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    missing_debug_implementations,
    missing_docs,
    no_mangle_generic_items,
    non_shorthand_field_patterns,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_extern_crates,
    unused_import_braces,
    unused_parens,
    unused_results,
    while_true
)]

mod macros;

pub mod core;
