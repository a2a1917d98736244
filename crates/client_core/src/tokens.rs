use std::sync::atomic::{AtomicU64, Ordering};

use shared::domain::{OutputRegion, RequestToken};

/// Per-region monotonic counters. A response may only write a region while
/// the token it was issued is still the newest one for that region.
#[derive(Debug, Default)]
pub struct RequestTokens {
    text: AtomicU64,
    preview: AtomicU64,
    chat: AtomicU64,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, region: OutputRegion) -> &AtomicU64 {
        match region {
            OutputRegion::Text => &self.text,
            OutputRegion::Preview => &self.preview,
            OutputRegion::Chat => &self.chat,
        }
    }

    pub fn issue(&self, region: OutputRegion) -> RequestToken {
        RequestToken(self.counter(region).fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self, region: OutputRegion) -> RequestToken {
        RequestToken(self.counter(region).load(Ordering::SeqCst))
    }

    pub fn is_current(&self, region: OutputRegion, token: RequestToken) -> bool {
        self.current(region) == token
    }
}
