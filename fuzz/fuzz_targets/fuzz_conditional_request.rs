#![no_main]

use arbitrary::Arbitrary;
use cachelab_core::{CachingResourceService, Clock, ManualClock, ServiceConfig};
use chrono::DateTime;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Arbitrary)]
enum Step {
    Advance(u16),
    Rewind(u16),
    Update(Option<String>),
    IfNoneMatch(String),
    IfModifiedSince(String),
    ReplayEtag,
    ReplayLastModified,
}

fuzz_target!(|steps: Vec<Step>| {
    let start = DateTime::from_timestamp(1_700_000_000, 0).expect("valid start");
    let clock = Arc::new(ManualClock::new(start));
    let service = CachingResourceService::with_clock(ServiceConfig::default(), clock.clone());

    for step in steps.into_iter().take(64) {
        match step {
            Step::Advance(secs) => clock.advance(Duration::from_secs(u64::from(secs))),
            Step::Rewind(secs) => {
                let now = clock.now() - chrono::Duration::seconds(i64::from(secs));
                clock.set(now);
            }
            Step::Update(content) => {
                let before = service.snapshot();
                let next = service.update(content);
                assert_eq!(next.version, before.version + 1);
                assert!(next.last_modified >= before.last_modified);
            }
            Step::IfNoneMatch(tag) => {
                // 304 only for the exact current tag.
                let current = service.snapshot().etag();
                let decision = service.get_with_etag(Some(&tag));
                assert_eq!(decision.is_not_modified(), current.matches(&tag));
            }
            Step::IfModifiedSince(date) => {
                let decision = service.get_with_last_modified(Some(&date));
                assert!(decision.last_modified().is_some());
            }
            Step::ReplayEtag => {
                let tag = service.snapshot().etag().to_string();
                assert!(service.get_with_etag(Some(&tag)).is_not_modified());
            }
            Step::ReplayLastModified => {
                let held = service.snapshot().last_modified.to_http_string();
                assert!(service.get_with_last_modified(Some(&held)).is_not_modified());
            }
        }
    }
});
