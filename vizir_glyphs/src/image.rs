// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Asynchronous image loading for URL-addressed image glyphs.
//!
//! Loading is driven by the host: the loader queues [`ImageRequest`]s, the host fetches them
//! however it likes (respecting `delay_ms` and `timeout_ms`) and reports each outcome with
//! [`ImageLoader::resolve`]. Every request carries a [`LoadToken`]; results whose token belongs
//! to an older generation are ignored, which is how stale loads are cancelled.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// A decoded image owned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageData {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Opaque host handle passed back to [`crate::Context2d::image`].
    pub handle: u64,
}

/// Why an image could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLoadError {
    /// The fetch failed.
    Network(String),
    /// The attempt did not finish within its timeout.
    Timeout,
    /// The payload could not be decoded.
    Decode(String),
}

impl fmt::Display for ImageLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "image fetch failed: {msg}"),
            Self::Timeout => f.write_str("image fetch timed out"),
            Self::Decode(msg) => write!(f, "image decode failed: {msg}"),
        }
    }
}

impl core::error::Error for ImageLoadError {}

/// Identifies one record's load within one generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadToken {
    /// The loader generation the request was issued in.
    pub generation: u64,
    /// The record the image belongs to.
    pub index: usize,
    /// The renderer layer whose loader issued the request; zero outside renderers.
    pub layer: u8,
}

/// One fetch the host should perform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRequest {
    /// What to fetch.
    pub url: String,
    /// Token to pass back to [`ImageLoader::resolve`].
    pub token: LoadToken,
    /// Zero for the first attempt, then one more per retry.
    pub attempt: u32,
    /// How long to wait before starting the attempt.
    pub delay_ms: u64,
    /// How long the attempt may take before it counts as failed; zero for no limit.
    pub timeout_ms: u64,
}

/// Per-record load state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageStatus {
    /// A request is queued or in flight.
    #[default]
    Pending,
    /// The image is available.
    Loaded(ImageData),
    /// Every attempt failed, or there was nothing to load.
    Failed,
}

/// Retry and timeout policy for image loads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the first failed attempt.
    pub attempts: u32,
    /// Delay before each retry, in milliseconds.
    pub delay_ms: u64,
    /// Per-attempt timeout in milliseconds; zero for no limit.
    pub timeout_ms: u64,
}

/// Tracks the image loads of one glyph.
#[derive(Clone, Debug, Default)]
pub struct ImageLoader {
    policy: RetryPolicy,
    generation: u64,
    urls: Vec<String>,
    attempts: Vec<u32>,
    status: Vec<ImageStatus>,
    queue: Vec<ImageRequest>,
    mirrored: bool,
}

impl ImageLoader {
    /// Creates an idle loader.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The current generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a new generation loading `urls`, one per record.
    ///
    /// Outstanding requests of earlier generations become stale. Empty URLs fail immediately.
    pub fn load(&mut self, urls: Vec<String>) {
        self.generation = self.generation.wrapping_add(1);
        self.mirrored = false;
        self.queue.clear();
        self.attempts = alloc::vec![0; urls.len()];
        self.status = urls
            .iter()
            .map(|u| {
                if u.is_empty() {
                    ImageStatus::Failed
                } else {
                    ImageStatus::Pending
                }
            })
            .collect();
        for (index, url) in urls.iter().enumerate() {
            if !url.is_empty() {
                self.enqueue(index, url.clone(), 0);
            }
        }
        log::debug!(
            "image generation {}: {} requests",
            self.generation,
            self.queue.len()
        );
        self.urls = urls;
    }

    fn enqueue(&mut self, index: usize, url: String, attempt: u32) {
        self.queue.push(ImageRequest {
            url,
            token: LoadToken {
                generation: self.generation,
                index,
                layer: 0,
            },
            attempt,
            delay_ms: if attempt == 0 { 0 } else { self.policy.delay_ms },
            timeout_ms: self.policy.timeout_ms,
        });
    }

    /// Removes and returns the queued requests.
    pub fn take_requests(&mut self) -> Vec<ImageRequest> {
        core::mem::take(&mut self.queue)
    }

    /// Reports the outcome of a request.
    ///
    /// Returns the record's new status, or `None` if the token is stale or unknown. A failed
    /// attempt queues a retry while the retry budget lasts.
    pub fn resolve(
        &mut self,
        token: LoadToken,
        result: Result<ImageData, ImageLoadError>,
    ) -> Option<ImageStatus> {
        if token.generation != self.generation {
            log::debug!(
                "ignoring stale image result for record {} (generation {} != {})",
                token.index,
                token.generation,
                self.generation
            );
            return None;
        }
        let i = token.index;
        if self.status.get(i) != Some(&ImageStatus::Pending) || i >= self.urls.len() {
            return None;
        }
        let status = match result {
            Ok(image) => ImageStatus::Loaded(image),
            Err(err) if self.attempts[i] < self.policy.attempts => {
                self.attempts[i] += 1;
                log::debug!(
                    "image {} failed ({err}), retry {} of {}",
                    self.urls[i],
                    self.attempts[i],
                    self.policy.attempts
                );
                let url = self.urls[i].clone();
                let attempt = self.attempts[i];
                self.enqueue(i, url, attempt);
                ImageStatus::Pending
            }
            Err(err) => {
                log::warn!("image {} failed permanently: {err}", self.urls[i]);
                ImageStatus::Failed
            }
        };
        self.status[i] = status;
        Some(status)
    }

    /// Load state of record `i`; records past the end count as failed.
    pub fn status(&self, i: usize) -> ImageStatus {
        self.status.get(i).copied().unwrap_or(ImageStatus::Failed)
    }

    /// The loaded image of record `i`.
    pub fn image(&self, i: usize) -> Option<ImageData> {
        match self.status(i) {
            ImageStatus::Loaded(image) => Some(image),
            _ => None,
        }
    }

    /// Returns `true` once no record is pending.
    pub fn has_finished(&self) -> bool {
        !self.status.contains(&ImageStatus::Pending)
    }

    /// Returns `true` if this loader only reflects the state of another one.
    pub fn is_mirror(&self) -> bool {
        self.mirrored
    }

    /// Numbers this loader's generations after those of `previous`, the loader it replaces, so
    /// results still in flight for `previous` are recognized as stale.
    ///
    /// Mirroring loaders keep the numbering of the loader they mirror.
    pub fn follow(&mut self, previous: &Self) {
        if self.urls.is_empty() {
            return;
        }
        self.generation = self.generation.wrapping_add(previous.generation);
        for request in &mut self.queue {
            request.token.generation = self.generation;
        }
    }

    /// Copies every record's state from `other`, keeping this loader idle.
    pub fn mirror(&mut self, other: &Self) {
        self.mirrored = true;
        self.generation = other.generation;
        self.status.clone_from(&other.status);
        self.urls.clear();
        self.attempts.clear();
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    fn image(handle: u64) -> ImageData {
        ImageData {
            width: 4,
            height: 4,
            handle,
        }
    }

    #[test]
    fn retries_until_the_budget_is_spent() {
        let mut loader = ImageLoader::new(RetryPolicy {
            attempts: 2,
            delay_ms: 50,
            timeout_ms: 1000,
        });
        loader.load(vec!["a.png".to_string()]);
        for attempt in 0..=2 {
            let requests = loader.take_requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(requests[0].attempt, attempt);
            assert_eq!(requests[0].delay_ms, if attempt == 0 { 0 } else { 50 });
            assert!(!loader.has_finished());
            loader.resolve(requests[0].token, Err(ImageLoadError::Timeout));
        }
        assert!(loader.take_requests().is_empty());
        assert_eq!(loader.status(0), ImageStatus::Failed);
        assert!(loader.has_finished());
    }

    #[test]
    fn stale_results_are_ignored() {
        let mut loader = ImageLoader::default();
        loader.load(vec!["a.png".to_string()]);
        let old = loader.take_requests();
        loader.load(vec!["b.png".to_string()]);
        assert_eq!(loader.resolve(old[0].token, Ok(image(1))), None);
        assert_eq!(loader.status(0), ImageStatus::Pending);
        let new = loader.take_requests();
        assert_eq!(new[0].url, "b.png");
        loader.resolve(new[0].token, Ok(image(2)));
        assert_eq!(loader.image(0), Some(image(2)));
    }

    #[test]
    fn replacement_loaders_outnumber_the_ones_they_replace() {
        let mut old = ImageLoader::default();
        old.load(vec!["a.png".to_string()]);
        let stale = old.take_requests();
        let mut new = ImageLoader::default();
        new.load(vec!["a.png".to_string()]);
        new.follow(&old);
        assert_eq!(new.resolve(stale[0].token, Ok(image(1))), None);
        let fresh = new.take_requests();
        assert_eq!(fresh[0].token.generation, 2);
        assert!(new.resolve(fresh[0].token, Ok(image(2))).is_some());
    }

    #[test]
    fn empty_urls_fail_immediately() {
        let mut loader = ImageLoader::default();
        loader.load(vec![String::new()]);
        assert!(loader.take_requests().is_empty());
        assert!(loader.has_finished());
    }
}
