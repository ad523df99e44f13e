// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod history;
pub mod keygen;
pub mod post;
pub mod react;
pub mod watch;
