#![no_main]

use cachelab_core::HttpDate;
use libfuzzer_sys::fuzz_target;
use std::time::Duration;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    // Anything that parses must survive a format/parse cycle unchanged.
    if let Ok(date) = HttpDate::parse(s) {
        let formatted = date.to_http_string();
        let reparsed = HttpDate::parse(&formatted).expect("formatted date must parse");
        assert_eq!(reparsed, date);

        let minute = date.truncate(Duration::from_secs(60));
        assert!(minute <= date);
        assert_eq!(minute.unix_secs().rem_euclid(60), 0);
    }
});
