use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};

use fancy_regex::Regex;
use once_cell::sync::Lazy;

static GROUP_CHAPTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/group/[^/?]+/chapters").expect("valid regex"));
static CHAPTER_PAGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"/chapter2/").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointClass {
    GroupChapters,
    ChapterPages,
}

/// Bucket a request URL is throttled by, if any.
pub fn classify(url: &str) -> Option<EndpointClass> {
    if GROUP_CHAPTERS.is_match(url).unwrap_or(false) {
        Some(EndpointClass::GroupChapters)
    } else if CHAPTER_PAGES.is_match(url).unwrap_or(false) {
        Some(EndpointClass::ChapterPages)
    } else {
        None
    }
}

/// Sliding-window limiter: at most `permits` grants in any `window`.
///
/// Callers block while holding the lock, so concurrent acquirers are served in turn.
#[derive(Debug)]
pub struct RateLimiter {
    permits: usize,
    window: Duration,
    grants: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(permits: u32, window: Duration) -> Self {
        let permits = permits.max(1) as usize;
        Self {
            permits,
            window,
            grants: Mutex::new(VecDeque::with_capacity(permits)),
        }
    }

    /// Blocks until a permit is free and returns how long it waited.
    pub fn acquire(&self) -> Duration {
        let started = Instant::now();
        let mut grants = self.grants.lock().unwrap_or_else(PoisonError::into_inner);

        loop {
            let now = Instant::now();
            while grants
                .front()
                .is_some_and(|granted| now.duration_since(*granted) >= self.window)
            {
                grants.pop_front();
            }

            if grants.len() < self.permits {
                grants.push_back(now);
                return now.duration_since(started);
            }

            if let Some(oldest) = grants.front() {
                let wait = (*oldest + self.window).saturating_duration_since(now);
                thread::sleep(wait);
            }
        }
    }
}

/// One limiter per throttled endpoint class.
#[derive(Debug)]
pub struct Throttle {
    group_chapters: RateLimiter,
    chapter_pages: RateLimiter,
}

impl Throttle {
    pub fn new(group_rate: u32, chapter_rate: u32, window: Duration) -> Self {
        Self {
            group_chapters: RateLimiter::new(group_rate, window),
            chapter_pages: RateLimiter::new(chapter_rate, window),
        }
    }

    /// Waits for the bucket `url` belongs to. Unclassified URLs pass immediately.
    pub fn wait(&self, url: &str) -> Duration {
        let limiter = match classify(url) {
            Some(EndpointClass::GroupChapters) => &self.group_chapters,
            Some(EndpointClass::ChapterPages) => &self.chapter_pages,
            None => return Duration::ZERO,
        };
        let waited = limiter.acquire();
        if !waited.is_zero() {
            debug!("throttled {} for {:?}", url, waited);
        }
        waited
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    const GROUP_URL: &str =
        "https://api.mangacopy.com/api/v3/comic/yaoshenji/group/default/chapters?limit=500";
    const PAGES_URL: &str = "https://api.mangacopy.com/api/v3/comic/yaoshenji/chapter2/abc";

    #[test]
    fn test_classify() {
        assert_eq!(classify(GROUP_URL), Some(EndpointClass::GroupChapters));
        assert_eq!(classify(PAGES_URL), Some(EndpointClass::ChapterPages));
        assert_eq!(
            classify("https://api.mangacopy.com/api/v3/comic2/yaoshenji?platform=3"),
            None
        );
    }

    #[test]
    fn test_extra_acquire_waits_for_window() {
        let window = Duration::from_millis(300);
        let limiter = RateLimiter::new(3, window);

        let started = Instant::now();
        for _ in 0..3 {
            assert!(limiter.acquire() < Duration::from_millis(50));
        }
        limiter.acquire();

        assert!(started.elapsed() >= window);
    }

    #[test]
    fn test_other_class_is_not_delayed() {
        let window = Duration::from_millis(500);
        let throttle = Throttle::new(2, 2, window);

        throttle.wait(GROUP_URL);
        throttle.wait(GROUP_URL);

        let started = Instant::now();
        throttle.wait(PAGES_URL);
        throttle.wait("https://api.mangacopy.com/api/v3/comics?limit=20");
        assert!(started.elapsed() < Duration::from_millis(100));

        throttle.wait(GROUP_URL);
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[test]
    fn test_concurrent_acquirers_share_window() {
        let window = Duration::from_millis(300);
        let limiter = Arc::new(RateLimiter::new(2, window));
        let started = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                thread::spawn(move || limiter.acquire())
            })
            .collect();
        let waited: Vec<Duration> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(
            waited.iter().filter(|w| **w >= Duration::from_millis(200)).count(),
            1
        );
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
