#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(msg) = aop_process::Message::from_slice(data) else {
        return;
    };
    let action = msg.action();
    if msg.tags.as_ref().map_or(true, |t| t.is_empty()) {
        assert_eq!(action, "Default");
    }
});
