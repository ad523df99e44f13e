// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Read-your-write verification.
//!
//! The topic key is shared, so the storage layer cannot stop two writers from
//! targeting the same slot. After every write the slot is read back:
//! - nothing there -> the upload did not land (`WriteNotVisible`)
//! - a different `(id, timestamp)` -> another writer won (`Collision`)
//!
//! There is no automatic retry at `index + 1`; the caller resyncs and decides.

use graffiti_kernel::envelope::EntryPayload;
use graffiti_kernel::identity::StreamId;
use graffiti_kernel::Stamp;

use crate::errors::{EngineError, EngineResult};
use crate::store::SharedStore;
use crate::telemetry;

pub struct WriteVerifier {
    store: SharedStore,
}

impl WriteVerifier {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn verify(&self, stream: &StreamId, index: u64, expected: &Stamp) -> EngineResult<EntryPayload> {
        let Some(entry) = self.store.read_entry(stream, index).await? else {
            tracing::warn!("Write to {} at {} not visible on read-back", stream, index);
            return Err(EngineError::WriteNotVisible { index });
        };

        let payload = EntryPayload::decode(&entry.payload).ok();
        let found = payload.as_ref().and_then(|p| p.stamp());
        match payload {
            Some(p) if found.as_ref() == Some(expected) => Ok(p),
            _ => {
                metrics::increment_counter!(telemetry::COLLISIONS);
                tracing::warn!(
                    "Collision on {} at {}: wrote {:?}, slot holds {:?}",
                    stream,
                    index,
                    expected,
                    found
                );
                Err(EngineError::Collision {
                    index,
                    expected: expected.clone(),
                    found,
                })
            }
        }
    }
}
