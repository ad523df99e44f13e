// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Reaction snapshots.
//!
//! The reaction stream never stores deltas. Every slot holds the complete set of
//! active reactions as of that slot, so the snapshot at `n` supersedes the one
//! at `n - 1` and a reader only ever needs the latest slot.
//!
//! # Merge
//! Reactions toggle on `(author, target, body)`: merging a reaction whose key is
//! already present removes it, otherwise it is added.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};
use crate::types::enums::MessageKind;
use crate::types::id::{Address, MessageId};
use crate::types::message::{Message, Stamp};
use crate::verify::is_authentic;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSnapshot {
    pub reactions: Vec<Message>,
    /// The reaction whose merge produced this snapshot.
    pub stamp: Option<Stamp>,
}

type ToggleKey<'a> = (&'a Address, Option<&'a MessageId>, &'a str);

fn toggle_key(m: &Message) -> ToggleKey<'_> {
    (&m.author, m.target_message_id.as_ref(), m.body.as_str())
}

impl ReactionSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Fold one reaction into a copy of this snapshot.
    pub fn merge(&self, reaction: &Message) -> KernelResult<ReactionSnapshot> {
        if reaction.kind != MessageKind::Reaction {
            return Err(KernelError::InvalidOperation("only reactions merge into a snapshot"));
        }
        reaction.validate_shape()?;

        let key = toggle_key(reaction);
        let mut reactions: Vec<Message> = Vec::with_capacity(self.reactions.len() + 1);
        let mut toggled_off = false;
        for existing in &self.reactions {
            if toggle_key(existing) == key {
                toggled_off = true;
            } else {
                reactions.push(existing.clone());
            }
        }
        if !toggled_off {
            reactions.push(reaction.clone());
        }

        Ok(ReactionSnapshot {
            reactions,
            stamp: Some(reaction.stamp()),
        })
    }

    /// Drops entries that fail signature validation and duplicate toggle keys.
    /// Returns the number of dropped entries.
    pub fn retain_authentic(&mut self) -> usize {
        let before = self.reactions.len();
        let mut seen: FxHashSet<(Address, Option<MessageId>, String)> = FxHashSet::default();
        self.reactions.retain(|m| {
            m.kind == MessageKind::Reaction
                && is_authentic(m)
                && seen.insert((m.author.clone(), m.target_message_id.clone(), m.body.clone()))
        });
        before - self.reactions.len()
    }

    pub fn reactions_for<'a>(&'a self, target: &'a MessageId) -> impl Iterator<Item = &'a Message> + 'a {
        self.reactions
            .iter()
            .filter(move |m| m.target_message_id.as_ref() == Some(target))
    }

    /// Reaction body -> number of authors, for one target.
    pub fn counts_for(&self, target: &MessageId) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for m in self.reactions_for(target) {
            *counts.entry(m.body.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn contains(&self, stamp: &Stamp) -> bool {
        self.reactions
            .iter()
            .any(|m| m.id == stamp.id && m.timestamp == stamp.timestamp)
    }
}
