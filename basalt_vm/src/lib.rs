// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Basalt VM
//!
//! Module subsystem of the Basalt engine. This crate implements synthetic
//! module records: module units whose exported bindings are installed
//! programmatically by the embedder (JSON modules, WebAssembly exports,
//! host-provided objects) instead of being parsed from source text, together
//! with the abstract module-record seam a polymorphic module graph drives
//! every module variant through.

pub mod ecmascript;
pub mod heap;
