//! Request correlation for the rendering engine
//!
//! Last request wins: a response applies only when it answers the newest
//! request of its channel and the context it was asked in is still current.

use super::protocol::{Channel, RequestTag};
use crate::error::{SyncError, SyncResult};
use crate::models::BreakPolicy;
use std::collections::BTreeMap;

/// Context a response has to match
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestContext {
    pub markup_version: u64,
    pub page: u32,
    pub policy: BreakPolicy,
}

#[derive(Clone, Debug, Default)]
pub struct RequestTracker {
    next_generation: u64,
    latest: BTreeMap<Channel, u64>,
    busy: bool,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a new request; it supersedes everything before it on `channel`
    pub fn issue(&mut self, channel: Channel, context: RequestContext) -> RequestTag {
        self.next_generation += 1;
        self.latest.insert(channel, self.next_generation);
        if channel == Channel::Render {
            self.busy = true;
        }
        RequestTag {
            generation: self.next_generation,
            markup_version: context.markup_version,
            page: context.page,
            policy: context.policy,
        }
    }

    /// Accept or reject a response
    ///
    /// Render responses must match markup version, page and policy; the other
    /// channels only the markup version.
    pub fn accept(&mut self, channel: Channel, tag: &RequestTag, current: RequestContext) -> SyncResult<()> {
        let stale = SyncError::StaleResponse {
            channel: channel.name(),
            generation: tag.generation,
        };
        if self.latest.get(&channel) != Some(&tag.generation) {
            return Err(stale);
        }
        if channel == Channel::Render {
            self.busy = false;
        }
        let matches = match channel {
            Channel::Render => {
                tag.markup_version == current.markup_version
                    && tag.page == current.page
                    && tag.policy == current.policy
            }
            Channel::ElementPage | Channel::Timemap => tag.markup_version == current.markup_version,
        };
        if matches {
            Ok(())
        } else {
            Err(stale)
        }
    }

    /// A render request is outstanding
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Forget all outstanding requests
    pub fn reset(&mut self) {
        self.latest.clear();
        self.busy = false;
    }
}
