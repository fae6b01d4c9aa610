// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral specifications for haven.
//!
//! The spec files live under `cli/` and `client/` and are compiled as
//! integration tests of the crates they exercise.
