#[cfg(test)]
// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod fixtures;
pub mod signature_tests;
pub mod reaction_tests;
pub mod envelope_tests;
pub mod sequence_tests;
