// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pretty-printing and scene dumps for proscenium diagnostics.
//!
//! - [`pretty::PrettyPrintSink`]: a [`TraceSink`](proscenium_core::trace::TraceSink)
//!   writing one human-readable line per event.
//! - [`dump::dump_tree`]: an indented listing of every node with its path
//!   key, placement and appearance.

pub mod dump;
pub mod pretty;
